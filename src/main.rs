use bevy::prelude::*;
use bevy::window::WindowResolution;

use particlesim::config::{SimConfig, SETTINGS_PATH};
use particlesim::constants::CLEAR_COLOUR;
use particlesim::graphics;
use particlesim::particle::Rgb;
use particlesim::rendering::RenderingPlugin;
use particlesim::simulation::SimulationPlugin;

fn main() {
    // Window geometry comes from the settings file, so load it before the app exists.
    let config = SimConfig::load_or_default(SETTINGS_PATH);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config.program_title.clone(),
                resolution: WindowResolution::new(config.window_width, config.window_height),
                resizable: false,
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Rgb::from(CLEAR_COLOUR).to_color()))
        .insert_resource(config)
        .add_plugins((SimulationPlugin, RenderingPlugin))
        .add_systems(Startup, graphics::setup_camera)
        .run();
}
