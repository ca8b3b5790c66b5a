//! Particle state, per-step kinematics, and circle-vs-circle collision math.
//!
//! A [`Particle`] is plain data owned by [`crate::simulation::Simulation`].
//! The integration helpers here are called in order by the per-frame update
//! (see [`crate::collision::update_particle`]):
//!
//! 1. [`Particle::apply_acceleration`]
//! 2. neighbour collisions via [`Particle::check_collision`]
//! 3. [`Particle::reflect_off_bounds`]
//! 4. [`Particle::integrate`]

use crate::constants::{DEFAULT_PARTICLE_COLOUR, DEFAULT_RADIUS, DEFAULT_VELOCITY_MAX};
use crate::spatial_partition::Viewport;
use bevy::prelude::*;

/// 8-bit sRGB render colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to a Bevy colour for gizmo drawing.
    pub fn to_color(self) -> Color {
        Color::srgb_u8(self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// A circular particle moving in viewport space (x right, y down, px).
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Current centre.
    pub position: Vec2,
    /// Signed velocity (px/s).
    pub velocity: Vec2,
    /// Constant per-axis drift added to `velocity` while below `velocity_max`.
    pub acceleration: Vec2,
    /// Per-axis cap on acceleration-driven growth.
    ///
    /// Only positive growth is capped: a component already below `-velocity_max`
    /// keeps accelerating.
    pub velocity_max: f32,
    /// Collision and draw radius.
    pub radius: f32,
    /// Render colour.
    pub colour: Rgb,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            velocity_max: DEFAULT_VELOCITY_MAX,
            radius: DEFAULT_RADIUS,
            colour: DEFAULT_PARTICLE_COLOUR.into(),
        }
    }
}

/// Geometry of an overlapping pair, measured from `a` towards `a - b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// `a.position - b.position`.
    pub diff: Vec2,
    /// `|diff|`.
    pub distance: f32,
    /// `a.radius + b.radius`.
    pub combined_radii: f32,
}

impl Contact {
    /// Overlap depth; always positive for a contact returned by [`Particle::contact`].
    #[inline]
    pub fn penetration(&self) -> f32 {
        self.combined_radii - self.distance
    }

    /// Unit separation direction from `b` to `a`.
    ///
    /// Coincident centres have no direction; they are split along +X.
    #[inline]
    pub fn normal(&self) -> Vec2 {
        if self.distance > 0.0 {
            self.diff / self.distance
        } else {
            Vec2::X
        }
    }
}

impl Particle {
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        acceleration: Vec2,
        colour: Rgb,
        velocity_max: f32,
        radius: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            acceleration,
            velocity_max,
            radius,
            colour,
        }
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    #[inline]
    pub fn bounding_box(&self) -> (Vec2, Vec2) {
        let r = Vec2::splat(self.radius);
        (self.position - r, self.position + r)
    }

    /// Add `acceleration * dt` to each velocity component still below the cap.
    pub fn apply_acceleration(&mut self, dt: f32) {
        if self.velocity.x < self.velocity_max {
            self.velocity.x += self.acceleration.x * dt;
        }
        if self.velocity.y < self.velocity_max {
            self.velocity.y += self.acceleration.y * dt;
        }
    }

    /// Reflect off the viewport edges, pulling the centre one pixel back inside.
    ///
    /// Speed is preserved; only the offending component's sign flips.
    pub fn reflect_off_bounds(&mut self, bounds: Viewport) {
        if self.position.x > bounds.width {
            self.velocity.x = -self.velocity.x;
            self.position.x = bounds.width - 1.0;
        } else if self.position.x < 0.0 {
            self.velocity.x = -self.velocity.x;
            self.position.x = 1.0;
        }

        if self.position.y > bounds.height {
            self.velocity.y = -self.velocity.y;
            self.position.y = bounds.height - 1.0;
        } else if self.position.y < 0.0 {
            self.velocity.y = -self.velocity.y;
            self.position.y = 1.0;
        }
    }

    /// Advance the position by one step of the current velocity.
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Circle-overlap test.  Symmetric up to the sign of `diff`.
    pub fn contact(&self, other: &Particle) -> Option<Contact> {
        let combined_radii = self.radius + other.radius;
        let diff = self.position - other.position;
        let distance = diff.length();
        (distance < combined_radii).then_some(Contact {
            diff,
            distance,
            combined_radii,
        })
    }

    /// Test against `other` and resolve the overlap in place if there is one.
    pub fn check_collision(&mut self, other: &mut Particle) -> bool {
        match self.contact(other) {
            Some(contact) => {
                self.handle_collision(contact, other);
                true
            }
            None => false,
        }
    }

    /// Push the pair apart along the contact normal and invert the dominant axes.
    ///
    /// The push is split evenly, so the centres end up exactly
    /// `combined_radii` apart.  An axis is inverted on both particles when the
    /// centres are at least half the combined radii apart along it.
    fn handle_collision(&mut self, contact: Contact, other: &mut Particle) {
        let correction = contact.normal() * (contact.penetration() * 0.5);
        self.position += correction;
        other.position -= correction;

        let threshold = contact.combined_radii / 2.0;
        if contact.diff.x.abs() >= threshold {
            self.velocity.x = -self.velocity.x;
            other.velocity.x = -other.velocity.x;
        }
        if contact.diff.y.abs() >= threshold {
            self.velocity.y = -self.velocity.y;
            other.velocity.y = -other.velocity.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            radius,
            ..Default::default()
        }
    }

    const VIEW: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn default_particle_matches_documented_defaults() {
        let p = Particle::default();
        assert_eq!(p.colour, Rgb::new(255, 0, 0));
        assert_eq!(p.velocity_max, 50.0);
        assert_eq!(p.radius, 2.0);
        assert_eq!(p.position, Vec2::ZERO);
    }

    #[test]
    fn acceleration_stops_at_positive_cap() {
        let mut p = ball(0.0, 0.0, 49.0, 60.0, 1.0);
        p.acceleration = Vec2::new(10.0, 10.0);
        p.apply_acceleration(1.0);
        // x was below the cap and crosses it; y was already above.
        assert_eq!(p.velocity, Vec2::new(59.0, 60.0));
        p.apply_acceleration(1.0);
        assert_eq!(p.velocity, Vec2::new(59.0, 60.0));
    }

    #[test]
    fn acceleration_cap_is_one_sided() {
        let mut p = ball(0.0, 0.0, -80.0, 0.0, 1.0);
        p.acceleration = Vec2::new(-10.0, 0.0);
        p.apply_acceleration(1.0);
        assert_eq!(p.velocity.x, -90.0, "negative speeds are never capped");
    }

    #[test]
    fn reflection_past_far_edge_clamps_and_flips() {
        let mut p = ball(VIEW.width + 5.0, 300.0, 40.0, 0.0, 1.0);
        p.reflect_off_bounds(VIEW);
        assert_eq!(p.position.x, VIEW.width - 1.0);
        assert_eq!(p.velocity.x, -40.0);
    }

    #[test]
    fn reflection_past_near_edges_clamps_to_one() {
        let mut p = ball(-3.0, -2.0, -7.0, -9.0, 1.0);
        p.reflect_off_bounds(VIEW);
        assert_eq!(p.position, Vec2::new(1.0, 1.0));
        assert_eq!(p.velocity, Vec2::new(7.0, 9.0));
    }

    #[test]
    fn reflection_leaves_interior_particles_alone() {
        let mut p = ball(VIEW.width, 0.0, 3.0, -3.0, 1.0);
        let before = p.clone();
        p.reflect_off_bounds(VIEW);
        assert_eq!(p, before, "edges themselves are inside");
    }

    #[test]
    fn contact_is_symmetric() {
        let a = ball(10.0, 10.0, 0.0, 0.0, 3.0);
        let b = ball(13.0, 14.0, 0.0, 0.0, 3.0);
        let ab = a.contact(&b).expect("overlapping");
        let ba = b.contact(&a).expect("overlapping");
        assert_eq!(ab.distance, ba.distance);
        assert_eq!(ab.combined_radii, ba.combined_radii);
        assert_eq!(ab.diff, -ba.diff);
    }

    #[test]
    fn touching_circles_do_not_collide() {
        let a = ball(0.0, 0.0, 0.0, 0.0, 2.0);
        let b = ball(4.0, 0.0, 0.0, 0.0, 2.0);
        assert!(a.contact(&b).is_none());
    }

    #[test]
    fn head_on_scenario_keeps_velocities_below_threshold() {
        let mut a = ball(100.0, 100.0, 10.0, 0.0, 5.0);
        let mut b = ball(103.0, 100.0, -10.0, 0.0, 5.0);
        assert!(a.check_collision(&mut b));
        // |diff.x| = 3 < 10 / 2, so the >= rule leaves x alone.
        assert_eq!(a.velocity, Vec2::new(10.0, 0.0));
        assert_eq!(b.velocity, Vec2::new(-10.0, 0.0));
        assert!(((a.position - b.position).length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn dominant_axis_is_inverted_on_both() {
        // |diff.x| = 6 >= 5, |diff.y| = 1 < 5
        let mut a = ball(106.0, 101.0, 4.0, 2.0, 5.0);
        let mut b = ball(100.0, 100.0, -4.0, -2.0, 5.0);
        assert!(a.check_collision(&mut b));
        assert_eq!(a.velocity, Vec2::new(-4.0, 2.0));
        assert_eq!(b.velocity, Vec2::new(4.0, -2.0));
    }

    #[test]
    fn threshold_is_inclusive() {
        // |diff.x| == combined / 2 exactly.
        let mut a = ball(5.0, 0.0, 1.0, 0.0, 5.0);
        let mut b = ball(0.0, 0.0, -1.0, 0.0, 5.0);
        assert!(a.check_collision(&mut b));
        assert_eq!(a.velocity.x, -1.0);
        assert_eq!(b.velocity.x, 1.0);
    }

    #[test]
    fn correction_leaves_exactly_combined_radii() {
        let mut a = ball(50.0, 50.0, 0.0, 0.0, 4.0);
        let mut b = ball(53.0, 52.0, 0.0, 0.0, 2.5);
        let before_mid = (a.position + b.position) * 0.5;
        assert!(a.check_collision(&mut b));
        let dist = (a.position - b.position).length();
        assert!((dist - 6.5).abs() < 1e-4, "distance after correction: {dist}");
        // Equal split keeps the midpoint fixed.
        assert!(((a.position + b.position) * 0.5 - before_mid).length() < 1e-4);
        // A second pass finds nothing left to resolve.
        assert!(!a.check_collision(&mut b));
    }

    #[test]
    fn coincident_centres_split_along_x() {
        let mut a = ball(20.0, 20.0, 1.0, 1.0, 1.0);
        let mut b = ball(20.0, 20.0, -1.0, -1.0, 1.0);
        assert!(a.check_collision(&mut b));
        assert!(a.position.is_finite() && b.position.is_finite());
        assert_eq!(a.position, Vec2::new(21.0, 20.0));
        assert_eq!(b.position, Vec2::new(19.0, 20.0));
        // diff was zero on both axes, so no axis reaches the threshold.
        assert_eq!(a.velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn bounding_box_spans_radius() {
        let p = ball(10.0, 20.0, 0.0, 0.0, 3.0);
        assert_eq!(p.bounding_box(), (Vec2::new(7.0, 17.0), Vec2::new(13.0, 23.0)));
    }
}
