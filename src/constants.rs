//! Centralised simulation and presentation constants.
//!
//! All tuneable values live here so they can be found and modified in one
//! place.  [`crate::config::SimConfig::default`] mirrors these, and
//! `assets/settings.toml` can override any of them at startup.

// ── Window ────────────────────────────────────────────────────────────────────

/// Window title shown by the OS.
pub const PROGRAM_TITLE: &str = "Particle Simulation";

/// Viewport width in logical pixels.  Also fixes the spatial grid's column count.
pub const WINDOW_WIDTH: u32 = 1280;

/// Viewport height in logical pixels.  Also fixes the spatial grid's row count.
pub const WINDOW_HEIGHT: u32 = 720;

// ── Particles ─────────────────────────────────────────────────────────────────

/// Number of particles spawned at startup.
pub const PARTICLE_COUNT: usize = 5_000;

/// Particles added or removed per ArrowUp / ArrowDown press.
pub const PARTICLE_STEP: usize = 1_000;

/// Radius of spawned particles (px).
///
/// Keep well below [`CELL_SIZE`]: a bounding box wider than one cell spans
/// more than four cells and corner hashing would miss the middle ones.
pub const PARTICLE_RADIUS: f32 = 1.0;

/// Per-axis velocity cap above which acceleration stops applying (px/s).
pub const VELOCITY_MAX: f32 = 500.0;

/// Spawned velocity components are drawn uniformly from `-SPAWN_SPEED..=SPAWN_SPEED` (px/s).
pub const SPAWN_SPEED: i32 = 50;

/// Lowest value of each spawned colour channel; channels are drawn from `SPAWN_COLOUR_MIN..=255`.
pub const SPAWN_COLOUR_MIN: u8 = 200;

/// Fewest particles the simulation may hold after a removal request.
pub const MIN_PARTICLES: usize = 1;

// ── Particle defaults ─────────────────────────────────────────────────────────

/// Colour of a [`crate::particle::Particle`] built with `Default`.
pub const DEFAULT_PARTICLE_COLOUR: (u8, u8, u8) = (255, 0, 0);

/// Velocity cap of a default-constructed particle (px/s).
pub const DEFAULT_VELOCITY_MAX: f32 = 50.0;

/// Radius of a default-constructed particle (px).
pub const DEFAULT_RADIUS: f32 = 2.0;

// ── Spatial Grid ──────────────────────────────────────────────────────────────

/// Edge length of one spatial-hash cell (px).
///
/// Smaller cells mean fewer candidates per query but more buckets to clear
/// each frame.  32 px keeps the bucket table under ~1k entries at 1280×720.
pub const CELL_SIZE: u32 = 32;

// ── Profiler ──────────────────────────────────────────────────────────────────

/// Number of recent frame times averaged into the current FPS reading.
pub const MAX_FRAME_TIMES: usize = 10;

/// Runtime (s) before max/min FPS start being tracked; the first second is
/// dominated by startup hitches.
pub const PROFILER_WARMUP_SECS: f32 = 1.0;

/// Output path prefix for the exported FPS profile.
pub const PROFILE_OUTPUT: &str = "FPS_Profile/profile";

/// Column width of the exported profile table.
pub const PROFILE_COLUMN_WIDTH: usize = 20;

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Background clear colour (sRGB bytes).
pub const CLEAR_COLOUR: (u8, u8, u8) = (25, 25, 25);

/// Debug grid-line colour (sRGB bytes).
pub const GRID_LINE_COLOUR: (u8, u8, u8) = (43, 206, 239);

/// HUD text size (px).
pub const HUD_FONT_SIZE: f32 = 16.0;

/// Whether the grid-line overlay is on at startup.
pub const SHOW_GRID_LINES: bool = false;

/// Whether the HUD is visible at startup.
pub const SHOW_HUD: bool = true;
