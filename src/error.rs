//! Simulation-specific error types.
//!
//! The per-frame core never fails: degenerate geometry is clamped or skipped
//! in place.  Errors only come from construction-time validation (grid
//! geometry, settings) and from writing the FPS profile to disk.
//!
//! ## Usage
//!
//! ```rust
//! use particlesim::error::{validate_cell_size, SimResult};
//!
//! fn build() -> SimResult<()> {
//!     validate_cell_size(32)?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Top-level error enum for the particle simulation.
#[derive(Debug)]
pub enum SimError {
    /// Grid or viewport geometry that cannot produce at least one cell.
    InvalidGeometry {
        /// Which dimension was rejected.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A settings value is outside its usable range.
    InvalidConfig {
        /// Settings key (matches the `assets/settings.toml` name).
        key: &'static str,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// Writing the FPS profile failed.
    ProfileExport {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidGeometry { name, value } => {
                write!(f, "invalid grid geometry: {} = {} (must be > 0)", name, value)
            }
            SimError::InvalidConfig { key, expected } => {
                write!(f, "invalid setting '{}': expected {}", key, expected)
            }
            SimError::ProfileExport { path, source } => write!(
                f,
                "failed to export FPS profile to {}: {}",
                path.display(),
                source
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::ProfileExport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `cell_size` is zero.
pub fn validate_cell_size(cell_size: u32) -> SimResult<()> {
    if cell_size == 0 {
        Err(SimError::InvalidGeometry {
            name: "cell_size",
            value: 0.0,
        })
    } else {
        Ok(())
    }
}

/// Returns an error if a viewport dimension is not strictly positive and finite.
pub fn validate_extent(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidGeometry { name, value })
    }
}
