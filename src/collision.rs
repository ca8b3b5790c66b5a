//! Narrow-phase collision resolution against grid neighbours.
//!
//! [`update_particle`] is the per-particle step of the frame: it integrates
//! one particle, resolving overlaps with whatever the grid currently holds
//! near it.  Viewport bounds and the telemetry sink are passed in by the
//! caller; nothing here reaches for global state.

use crate::particle::Particle;
use crate::spatial_partition::{ParticleIndex, SpatialHashGrid, Viewport};

/// Receives one tick per candidate pair examined by the narrow phase.
///
/// Counts checks, not hits: a neighbour that turns out not to overlap still
/// counts.
pub trait CollisionTelemetry {
    fn record_check(&mut self);
}

/// Plain counter sink.
impl CollisionTelemetry for u64 {
    fn record_check(&mut self) {
        *self = self.saturating_add(1);
    }
}

/// Mutable references to two distinct particles.
///
/// Returns `None` when `a == b` or either index is out of range.
pub fn pair_mut(
    particles: &mut [Particle],
    a: ParticleIndex,
    b: ParticleIndex,
) -> Option<(&mut Particle, &mut Particle)> {
    if a == b || a >= particles.len() || b >= particles.len() {
        return None;
    }
    if a < b {
        let (low, high) = particles.split_at_mut(b);
        Some((&mut low[a], &mut high[0]))
    } else {
        let (low, high) = particles.split_at_mut(a);
        Some((&mut high[0], &mut low[b]))
    }
}

/// Run the collision check of `index` against each of `neighbors`.
///
/// Self-matches are skipped.  Returns how many pairs actually overlapped.
pub fn resolve_neighbors(
    particles: &mut [Particle],
    index: ParticleIndex,
    neighbors: &[ParticleIndex],
    telemetry: &mut impl CollisionTelemetry,
) -> usize {
    let mut hits = 0;
    for &other in neighbors {
        let Some((this, that)) = pair_mut(particles, index, other) else {
            continue;
        };
        telemetry.record_check();
        if this.check_collision(that) {
            hits += 1;
        }
    }
    hits
}

/// Advance particle `index` by `dt`: accelerate, collide with grid
/// neighbours, reflect off the viewport edges, then move.
///
/// The grid is queried before the particle moves, so it sees the cells of the
/// position the particle held at the start of this step.
pub fn update_particle(
    particles: &mut [Particle],
    index: ParticleIndex,
    grid: &SpatialHashGrid,
    bounds: Viewport,
    dt: f32,
    telemetry: &mut impl CollisionTelemetry,
) -> usize {
    let Some(particle) = particles.get_mut(index) else {
        return 0;
    };
    particle.apply_acceleration(dt);

    let neighbors = grid.query_neighbors(&particles[index]);
    let hits = resolve_neighbors(particles, index, &neighbors, telemetry);

    let particle = &mut particles[index];
    particle.reflect_off_bounds(bounds);
    particle.integrate(dt);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::Vec2;

    fn ball(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            radius: 5.0,
            ..Default::default()
        }
    }

    fn grid(width: f32, height: f32) -> SpatialHashGrid {
        SpatialHashGrid::new(Viewport::new(width, height), 32).unwrap()
    }

    #[test]
    fn pair_mut_rejects_aliasing_and_out_of_range() {
        let mut ps = vec![ball(0.0, 0.0, 0.0, 0.0), ball(1.0, 0.0, 0.0, 0.0)];
        assert!(pair_mut(&mut ps, 0, 0).is_none());
        assert!(pair_mut(&mut ps, 0, 2).is_none());
        let (a, b) = pair_mut(&mut ps, 1, 0).unwrap();
        assert_eq!(a.position.x, 1.0);
        assert_eq!(b.position.x, 0.0);
    }

    #[test]
    fn resolve_skips_self_and_counts_every_check() {
        let mut ps = vec![
            ball(100.0, 100.0, 0.0, 0.0),
            ball(103.0, 100.0, 0.0, 0.0),
            ball(200.0, 100.0, 0.0, 0.0),
        ];
        let mut checks = 0u64;
        let hits = resolve_neighbors(&mut ps, 0, &[0, 1, 2], &mut checks);
        assert_eq!(hits, 1);
        assert_eq!(checks, 2, "self is skipped, misses still count");
    }

    #[test]
    fn update_resolves_against_grid_neighbours() {
        let mut ps = vec![ball(100.0, 100.0, 10.0, 0.0), ball(103.0, 100.0, -10.0, 0.0)];
        let mut g = grid(640.0, 480.0);
        g.insert(0, &ps[0]);
        let mut checks = 0u64;
        let hits = update_particle(&mut ps, 1, &g, g.viewport(), 0.0, &mut checks);
        assert_eq!((hits, checks), (1, 1));
        assert!(((ps[0].position - ps[1].position).length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn update_reflects_off_far_edge() {
        let g = grid(640.0, 480.0);
        let mut ps = vec![ball(645.0, 100.0, 30.0, 0.0)];
        let mut checks = 0u64;
        update_particle(&mut ps, 0, &g, g.viewport(), 0.0, &mut checks);
        assert_eq!(ps[0].position.x, 639.0);
        assert_eq!(ps[0].velocity.x, -30.0);
        assert_eq!(checks, 0);
    }

    #[test]
    fn update_integrates_after_reflection() {
        let g = grid(640.0, 480.0);
        let mut ps = vec![ball(645.0, 100.0, 30.0, 0.0)];
        let mut checks = 0u64;
        update_particle(&mut ps, 0, &g, g.viewport(), 0.5, &mut checks);
        assert_eq!(ps[0].position.x, 639.0 - 15.0);
    }

    #[test]
    fn update_out_of_range_index_is_a_no_op() {
        let g = grid(640.0, 480.0);
        let mut ps: Vec<Particle> = Vec::new();
        let mut checks = 0u64;
        assert_eq!(update_particle(&mut ps, 3, &g, g.viewport(), 0.1, &mut checks), 0);
    }
}
