//! Runtime settings loaded from `assets/settings.toml`.
//!
//! [`SimConfig`] is a Bevy [`Resource`] that mirrors the values in
//! [`crate::constants`].  Unlike most resources it is read *before* the app is
//! built, because the window size and the spatial grid geometry both depend on
//! it.  Missing keys fall back to the compile-time defaults, so a minimal TOML
//! can override just the values you care about.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `SimConfig::default()`.

use crate::constants::*;
use crate::error::{validate_cell_size, validate_extent, SimError, SimResult};
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

/// Default settings location, relative to the working directory.
pub const SETTINGS_PATH: &str = "assets/settings.toml";

/// Runtime-tunable simulation settings.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // ── Window ───────────────────────────────────────────────────────────────
    pub program_title: String,
    pub window_width: u32,
    pub window_height: u32,

    // ── Particles ────────────────────────────────────────────────────────────
    pub particle_count: usize,
    pub particle_step: usize,
    pub particle_radius: f32,
    pub velocity_max: f32,
    pub spawn_speed: i32,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,

    // ── Spatial Grid ─────────────────────────────────────────────────────────
    pub cell_size: u32,

    // ── Profiler ─────────────────────────────────────────────────────────────
    pub profile_output: String,

    // ── Overlays ─────────────────────────────────────────────────────────────
    pub show_grid_lines: bool,
    pub show_hud: bool,
    pub hud_font_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Window
            program_title: PROGRAM_TITLE.to_string(),
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            // Particles
            particle_count: PARTICLE_COUNT,
            particle_step: PARTICLE_STEP,
            particle_radius: PARTICLE_RADIUS,
            velocity_max: VELOCITY_MAX,
            spawn_speed: SPAWN_SPEED,
            seed: None,
            // Spatial Grid
            cell_size: CELL_SIZE,
            // Profiler
            profile_output: PROFILE_OUTPUT.to_string(),
            // Overlays
            show_grid_lines: SHOW_GRID_LINES,
            show_hud: SHOW_HUD,
            hud_font_size: HUD_FONT_SIZE,
        }
    }
}

impl SimConfig {
    /// Parse settings from TOML text and validate them.
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let config = toml::from_str::<SimConfig>(contents).map_err(|e| e.to_string())?;
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        validate_extent("window_width", self.window_width as f32)?;
        validate_extent("window_height", self.window_height as f32)?;
        validate_cell_size(self.cell_size)?;
        if self.particle_count < MIN_PARTICLES {
            return Err(SimError::InvalidConfig {
                key: "particle_count",
                expected: "at least 1",
            });
        }
        if self.particle_step == 0 {
            return Err(SimError::InvalidConfig {
                key: "particle_step",
                expected: "at least 1",
            });
        }
        if !(self.particle_radius.is_finite() && self.particle_radius > 0.0) {
            return Err(SimError::InvalidConfig {
                key: "particle_radius",
                expected: "a finite value > 0",
            });
        }
        if self.particle_radius * 2.0 >= self.cell_size as f32 {
            return Err(SimError::InvalidConfig {
                key: "particle_radius",
                expected: "a diameter smaller than cell_size",
            });
        }
        if self.spawn_speed < 0 {
            return Err(SimError::InvalidConfig {
                key: "spawn_speed",
                expected: "a value >= 0",
            });
        }
        if !(self.hud_font_size.is_finite() && self.hud_font_size > 0.0) {
            return Err(SimError::InvalidConfig {
                key: "hud_font_size",
                expected: "a finite value > 0",
            });
        }
        Ok(())
    }

    /// Load settings from `path`, falling back to defaults.
    ///
    /// Runs before the Bevy log plugin exists, so outcomes go straight to
    /// stdout/stderr.  A missing file is not an error; a malformed or invalid
    /// one is reported and ignored.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(loaded) => {
                    println!("✓ Loaded settings from {}", path.display());
                    loaded
                }
                Err(e) => {
                    eprintln!("⚠ Failed to load {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                println!("ℹ No {} found; using compiled defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_constants_and_validate() {
        let config = SimConfig::default();
        assert_eq!(config.window_width, WINDOW_WIDTH);
        assert_eq!(config.cell_size, CELL_SIZE);
        assert_eq!(config.particle_count, PARTICLE_COUNT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SimConfig::from_toml_str("particle_count = 42\nseed = 7\n").unwrap();
        assert_eq!(config.particle_count, 42);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.window_height, WINDOW_HEIGHT);
        assert_eq!(config.program_title, PROGRAM_TITLE);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for bad in [
            "cell_size = 0",
            "particle_count = 0",
            "particle_step = 0",
            "window_width = 0",
            "particle_radius = 0.0",
            "particle_radius = 16.0",
            "spawn_speed = -1",
        ] {
            assert!(SimConfig::from_toml_str(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = SimConfig::from_toml_str("particle_count = \"lots\"").unwrap_err();
        assert!(err.contains("particle_count"), "got: {err}");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SimConfig::load_or_default("does/not/exist/settings.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn shipped_settings_file_parses() {
        let shipped = include_str!("../assets/settings.toml");
        let config = SimConfig::from_toml_str(shipped).unwrap();
        assert_eq!(config.cell_size, 32);
    }
}
