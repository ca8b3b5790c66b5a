//! Particle collision sandbox library
//!
//! Thousands of small circular particles bounce around a fixed viewport.  A
//! uniform spatial hash grid keeps the narrow-phase collision pass close to
//! linear in the particle count, and a frame-rate profiler records how the
//! frame time scales as particles are added or removed at runtime.

pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod particle;
pub mod profiler;
pub mod rendering;
pub mod simulation;
pub mod spatial_partition;
