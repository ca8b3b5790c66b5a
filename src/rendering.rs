//! Rendering systems: particle gizmos, debug grid lines, and the FPS HUD.
//!
//! ## System Responsibilities
//!
//! | System                          | Schedule | Purpose                                   |
//! |---------------------------------|----------|-------------------------------------------|
//! | `setup_hud`                     | Startup  | Spawn the stats block and help footer     |
//! | `overlay_toggle_system`         | Update   | F1 grid lines, F2 HUD                     |
//! | `sync_hud_visibility_system`    | Update   | Show/hide HUD when the toggle changes     |
//! | `hud_display_system`            | Update   | Refresh FPS and particle-count text       |
//! | `particle_rendering_system`     | Update   | One gizmo circle per particle             |
//! | `grid_lines_system`             | Update   | Spatial-hash cell boundaries (F1)         |
//!
//! Everything here runs after [`SimulationSet::Step`], so a frame always shows
//! fully-updated positions.

use crate::config::SimConfig;
use crate::constants::GRID_LINE_COLOUR;
use crate::graphics::viewport_to_world;
use crate::particle::Rgb;
use crate::profiler::{FpsPacket, FpsProfiler};
use crate::simulation::{Simulation, SimulationSet};
use bevy::prelude::*;

/// Gizmo circle segment count; particles are a few pixels wide.
const PARTICLE_CIRCLE_RESOLUTION: u32 = 8;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud).add_systems(
            Update,
            (
                overlay_toggle_system,
                sync_hud_visibility_system,
                hud_display_system,
                particle_rendering_system,
                grid_lines_system,
            )
                .chain()
                .after(SimulationSet::Step)
                .run_if(resource_exists::<Simulation>),
        );
    }
}

// ── Overlay state resource ────────────────────────────────────────────────────

/// Which debug layers are drawn.  Seeded from [`SimConfig`], flipped by F1/F2.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct OverlayState {
    /// Draw spatial-hash cell boundaries.
    pub show_grid_lines: bool,
    /// Show the FPS / particle-count HUD.
    pub show_hud: bool,
}

impl From<&SimConfig> for OverlayState {
    fn from(config: &SimConfig) -> Self {
        Self {
            show_grid_lines: config.show_grid_lines,
            show_hud: config.show_hud,
        }
    }
}

// ── Component markers ─────────────────────────────────────────────────────────

/// Marker for every HUD root node (stats block and footer).
#[derive(Component)]
pub struct HudRoot;

/// Marker for the stats block whose text is refreshed every frame.
#[derive(Component)]
pub struct HudStatsDisplay;

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn the top-left stats block and the bottom help footer.
pub fn setup_hud(mut commands: Commands, config: Res<SimConfig>) {
    commands.insert_resource(OverlayState::from(&*config));
    let visibility = if config.show_hud {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    let font = TextFont {
        font_size: config.hud_font_size,
        ..default()
    };

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            HudRoot,
            HudStatsDisplay,
            visibility,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(hud_text(FpsPacket::default(), 0)),
                font.clone(),
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                Text::new(
                    "Press 'F2' to hide/unhide the UI. \
                     Press 'F1' to show gridlines of our spatial hash table.",
                ),
                font.clone(),
                TextColor(Color::srgb_u8(200, 200, 255)),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                bottom: Val::Px(10.0),
                ..default()
            },
            HudRoot,
            visibility,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(
                    "Press 'Up Arrow' to increase particles. \
                     Press 'Down Arrow' to decrease particles. Press 'Esc' to quit.",
                ),
                font,
                TextColor(Color::srgb_u8(200, 200, 255)),
            ));
        });
}

// ── Update: toggles ───────────────────────────────────────────────────────────

/// F1 flips the grid-line overlay, F2 the HUD.
pub fn overlay_toggle_system(keys: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<OverlayState>) {
    if keys.just_pressed(KeyCode::F1) {
        overlay.show_grid_lines = !overlay.show_grid_lines;
    }
    if keys.just_pressed(KeyCode::F2) {
        overlay.show_hud = !overlay.show_hud;
    }
}

/// Show or hide the HUD when [`OverlayState`] changes.
pub fn sync_hud_visibility_system(
    overlay: Res<OverlayState>,
    mut query: Query<&mut Visibility, With<HudRoot>>,
) {
    if !overlay.is_changed() {
        return;
    }
    let vis = if overlay.show_hud {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut v in query.iter_mut() {
        *v = vis;
    }
}

// ── Update: HUD text ──────────────────────────────────────────────────────────

/// HUD stats block: average/max/min FPS and the live particle count.
pub fn hud_text(fps: FpsPacket, particle_count: usize) -> String {
    let extreme = |v: Option<f32>| v.map_or_else(|| "--".to_string(), |v| format!("{v:.0}"));
    format!(
        "Avg. FPS: {:.0}\nMax FPS: {}\nMin FPS: {}\nParticle Count: {}",
        fps.average,
        extreme(fps.max),
        extreme(fps.min),
        particle_count
    )
}

/// Refresh the stats block each frame while it is visible.
pub fn hud_display_system(
    overlay: Res<OverlayState>,
    sim: Res<Simulation>,
    profiler: Res<FpsProfiler>,
    parent_query: Query<&Children, With<HudStatsDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    if !overlay.show_hud {
        return;
    }
    let content = hud_text(profiler.current(), sim.particle_count());
    for children in parent_query.iter() {
        // First child is the stats text; the rest are static.
        if let Some(child) = children.iter().next() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(content.clone());
            }
        }
    }
}

// ── Update: gizmos ────────────────────────────────────────────────────────────

/// Draw every particle as a small filled-colour circle outline.
pub fn particle_rendering_system(mut gizmos: Gizmos, sim: Res<Simulation>) {
    let viewport = sim.viewport();
    sim.draw(|position, radius, colour| {
        gizmos
            .circle_2d(viewport_to_world(position, viewport), radius, colour.to_color())
            .resolution(PARTICLE_CIRCLE_RESOLUTION);
    });
}

/// Draw the spatial-hash cell boundaries when enabled.
pub fn grid_lines_system(mut gizmos: Gizmos, sim: Res<Simulation>, overlay: Res<OverlayState>) {
    if !overlay.show_grid_lines {
        return;
    }
    let viewport = sim.viewport();
    let colour = Rgb::from(GRID_LINE_COLOUR).to_color();
    for (from, to) in sim.grid().cell_lines() {
        gizmos.line_2d(
            viewport_to_world(from, viewport),
            viewport_to_world(to, viewport),
            colour,
        );
    }
}
