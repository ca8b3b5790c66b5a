use crate::spatial_partition::Viewport;
use bevy::prelude::*;

/// Setup camera for 2D rendering
pub fn setup_camera(mut commands: Commands) {
    // Default Camera2d maps one world unit to one logical pixel, centred on the origin.
    commands.spawn(Camera2d);
    info!("[SETUP] Camera spawned");
}

/// Map viewport coordinates (origin top-left, y down) to camera world space
/// (origin centre, y up).
#[inline]
pub fn viewport_to_world(position: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        position.x - viewport.width / 2.0,
        viewport.height / 2.0 - position.y,
    )
}
