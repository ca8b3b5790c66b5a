//! Uniform-grid spatial hash for broad-phase neighbour queries.
//!
//! The viewport is split into square cells of `cell_size` pixels laid out
//! row-major in a flat bucket table.  Each frame the table is cleared and
//! refilled with particle indices, so membership never outlives the frame it
//! was built in.
//!
//! ## Cell membership
//!
//! A particle is inserted into every cell its bounding box touches, found by
//! hashing the box's four corners.  This only covers the box completely while
//! the diameter stays below `cell_size` (at most 2×2 cells); keep
//! [`crate::constants::PARTICLE_RADIUS`] well under half a cell.
//!
//! ## Sentinel
//!
//! [`SpatialHashGrid::hash`] returns `None` for any position outside the
//! viewport.  Every grid operation drops `None` instead of indexing with it.

use crate::error::{validate_cell_size, validate_extent, SimResult};
use crate::particle::Particle;
use bevy::prelude::*;

/// Flat index into the bucket table (`column + row * columns`).
pub type CellIndex = usize;

/// Index of a particle in the owning collection.
pub type ParticleIndex = usize;

/// Viewport extent in pixels.  Positions are valid in `[0, width) × [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, position: Vec2) -> bool {
        (0.0..self.width).contains(&position.x) && (0.0..self.height).contains(&position.y)
    }
}

/// Deduplicated cells touched by one bounding box (1–4 entries, possibly 0
/// when the box lies entirely off-screen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellIndices {
    cells: [CellIndex; 4],
    len: usize,
}

impl CellIndices {
    fn push_unique(&mut self, cell: CellIndex) {
        if !self.as_slice().contains(&cell) {
            self.cells[self.len] = cell;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[CellIndex] {
        &self.cells[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.as_slice().iter().copied()
    }
}

/// Fixed-geometry spatial hash keyed by screen-space cell.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    viewport: Viewport,
    cell_size: u32,
    columns: usize,
    rows: usize,
    buckets: Vec<Vec<ParticleIndex>>,
}

impl SpatialHashGrid {
    /// Build an empty grid covering `viewport`.
    ///
    /// Column and row counts round up so a partial cell at the right or
    /// bottom edge still gets its own bucket.
    pub fn new(viewport: Viewport, cell_size: u32) -> SimResult<Self> {
        validate_cell_size(cell_size)?;
        validate_extent("width", viewport.width)?;
        validate_extent("height", viewport.height)?;

        let cell = cell_size as f32;
        let columns = (viewport.width / cell).ceil() as usize;
        let rows = (viewport.height / cell).ceil() as usize;

        Ok(Self {
            viewport,
            cell_size,
            columns,
            rows,
            buckets: vec![Vec::new(); columns * rows],
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn total_cells(&self) -> usize {
        self.buckets.len()
    }

    /// Total references stored across all buckets (a particle spanning
    /// several cells counts once per cell).
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Contents of one bucket, or `None` for an out-of-range index.
    pub fn bucket(&self, cell: CellIndex) -> Option<&[ParticleIndex]> {
        self.buckets.get(cell).map(Vec::as_slice)
    }

    /// Cell containing `position`, or `None` off-viewport.
    pub fn hash(&self, position: Vec2) -> Option<CellIndex> {
        if !self.viewport.contains(position) {
            return None;
        }
        let cell = self.cell_size as f32;
        // Float rounding right at the far edge can land one past the last cell.
        let column = ((position.x / cell).floor() as usize).min(self.columns - 1);
        let row = ((position.y / cell).floor() as usize).min(self.rows - 1);
        Some(column + row * self.columns)
    }

    /// Cells touched by `particle`'s bounding box, via its four corners.
    pub fn cell_indices_for(&self, particle: &Particle) -> CellIndices {
        let (min, max) = particle.bounding_box();
        let corners = [
            min,
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, max.y),
            max,
        ];

        let mut cells = CellIndices::default();
        for cell in corners.into_iter().filter_map(|c| self.hash(c)) {
            cells.push_unique(cell);
        }
        cells
    }

    /// Empty every bucket.  Call once per frame before repopulating.
    pub fn clear(&mut self) {
        // Retain allocations; bucket sizes are similar frame to frame.
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Reference `index` from every cell `particle` touches.
    pub fn insert(&mut self, index: ParticleIndex, particle: &Particle) {
        for cell in self.cell_indices_for(particle).iter() {
            self.buckets[cell].push(index);
        }
    }

    /// Indices of every particle sharing a cell with `particle`.
    ///
    /// Sorted and free of duplicates.  May include the querying particle's own
    /// index; callers skip it.  This is a conservative over-approximation:
    /// callers still run the exact circle test.
    pub fn query_neighbors(&self, particle: &Particle) -> Vec<ParticleIndex> {
        let mut neighbors = Vec::new();
        for cell in self.cell_indices_for(particle).iter() {
            neighbors.extend_from_slice(&self.buckets[cell]);
        }
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Interior cell boundaries as viewport-space segments, columns first.
    pub fn cell_lines(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let cell = self.cell_size as f32;
        let Viewport { width, height } = self.viewport;
        let verticals = (1..self.columns).map(move |c| {
            let x = c as f32 * cell;
            (Vec2::new(x, 0.0), Vec2::new(x, height))
        });
        let horizontals = (1..self.rows).map(move |r| {
            let y = r as f32 * cell;
            (Vec2::new(0.0, y), Vec2::new(width, y))
        });
        verticals.chain(horizontals)
    }
}
