//! Frame-rate profiler keyed by particle count.
//!
//! [`FpsProfiler`] keeps a rolling average over the last
//! [`MAX_FRAME_TIMES`] frames, tracks the best and worst averages seen at the
//! current particle count, and remembers the latest reading for every count
//! the run has visited.  It also tallies narrow-phase collision checks.  At
//! exit the whole table is written to `<profile_output>-<unix secs>.txt`.

use crate::collision::CollisionTelemetry;
use crate::constants::{MAX_FRAME_TIMES, PROFILER_WARMUP_SECS, PROFILE_COLUMN_WIDTH};
use crate::error::{SimError, SimResult};
use bevy::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One FPS reading.  `max`/`min` stay `None` until the warm-up has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsPacket {
    pub average: f32,
    pub max: Option<f32>,
    pub min: Option<f32>,
}

#[derive(Resource, Debug, Clone)]
pub struct FpsProfiler {
    output_prefix: PathBuf,
    /// Recent frame times in milliseconds (ring buffer).
    frame_times: [f32; MAX_FRAME_TIMES],
    frame_count: u64,
    current: FpsPacket,
    by_particle_count: BTreeMap<usize, FpsPacket>,
    last_particle_count: Option<usize>,
    collision_checks: u64,
    elapsed_secs: f32,
}

impl FpsProfiler {
    pub fn new(output_prefix: impl Into<PathBuf>) -> Self {
        Self {
            output_prefix: output_prefix.into(),
            frame_times: [0.0; MAX_FRAME_TIMES],
            frame_count: 0,
            current: FpsPacket::default(),
            by_particle_count: BTreeMap::new(),
            last_particle_count: None,
            collision_checks: 0,
            elapsed_secs: 0.0,
        }
    }

    /// Record one frame that took `frame_secs` while `particle_count` particles were live.
    ///
    /// `elapsed_secs` is the runtime since startup; extremes are not tracked
    /// during the first [`PROFILER_WARMUP_SECS`].
    pub fn run(&mut self, particle_count: usize, frame_secs: f32, elapsed_secs: f32) {
        if self.last_particle_count != Some(particle_count) {
            self.last_particle_count = Some(particle_count);
            self.current = FpsPacket::default();
        }
        self.elapsed_secs = elapsed_secs;

        let slot = (self.frame_count % MAX_FRAME_TIMES as u64) as usize;
        self.frame_times[slot] = frame_secs * 1000.0;
        self.frame_count += 1;

        let stored = (self.frame_count as usize).min(MAX_FRAME_TIMES);
        let mean_ms = self.frame_times[..stored].iter().sum::<f32>() / stored as f32;
        if mean_ms <= 0.0 || !mean_ms.is_finite() {
            // Zero-length frames (first tick, paused clock) carry no rate.
            return;
        }
        let fps = 1000.0 / mean_ms;
        self.current.average = fps;

        if elapsed_secs > PROFILER_WARMUP_SECS {
            if self.current.max.is_none_or(|max| fps > max) {
                self.current.max = Some(fps);
            }
            if fps >= 0.0 && self.current.min.is_none_or(|min| fps < min) {
                self.current.min = Some(fps);
            }
        }

        self.by_particle_count.insert(particle_count, self.current);
    }

    pub fn current(&self) -> FpsPacket {
        self.current
    }

    pub fn collision_checks(&self) -> u64 {
        self.collision_checks
    }

    /// Latest reading for each particle count visited, ascending by count.
    pub fn history(&self) -> &BTreeMap<usize, FpsPacket> {
        &self.by_particle_count
    }

    /// Render the profile as a fixed-width text table.
    pub fn report(&self, timestamp_secs: u64) -> String {
        let w = PROFILE_COLUMN_WIDTH;
        let mut out = String::new();
        let _ = writeln!(out, "== FPS Profile -- {timestamp_secs} ==");
        let _ = writeln!(out, "Total Runtime: {:.3} seconds", self.elapsed_secs);
        let _ = writeln!(out, "Total Collision Calculations: {}\n", self.collision_checks);
        let _ = writeln!(
            out,
            "{:<w$}{:<w$}{:<w$}{:<w$}",
            "Particle Count", "Average FPS", "Maximum FPS", "Minimum FPS"
        );
        for (count, packet) in &self.by_particle_count {
            let _ = writeln!(
                out,
                "{:<w$}{:<w$}{:<w$}{:<w$}",
                count,
                format!("{:.0}", packet.average),
                fmt_extreme(packet.max),
                fmt_extreme(packet.min),
            );
        }
        out
    }

    /// Destination for an export at `timestamp_secs`.
    pub fn output_path(&self, timestamp_secs: u64) -> PathBuf {
        let mut name = self.output_prefix.clone().into_os_string();
        name.push(format!("-{timestamp_secs}.txt"));
        PathBuf::from(name)
    }

    /// Write [`Self::report`] to disk, creating the output directory if needed.
    pub fn export(&self) -> SimResult<PathBuf> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = self.output_path(timestamp);
        write_report(&path, &self.report(timestamp))?;
        Ok(path)
    }
}

impl Default for FpsProfiler {
    fn default() -> Self {
        Self::new(crate::constants::PROFILE_OUTPUT)
    }
}

impl CollisionTelemetry for FpsProfiler {
    fn record_check(&mut self) {
        self.collision_checks = self.collision_checks.saturating_add(1);
    }
}

fn fmt_extreme(value: Option<f32>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.0}"))
}

fn write_report(path: &Path, report: &str) -> SimResult<()> {
    let wrap = |source| SimError::ProfileExport {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(wrap)?;
    }
    std::fs::write(path, report).map_err(wrap)
}
