use bevy::prelude::*;
use bevy::window::WindowResolution;
use std::env;

use koi_pond::config::{self, PondConfig};
use koi_pond::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use koi_pond::graphics;
use koi_pond::input::PointerInputPlugin;
use koi_pond::rendering::PondRenderingPlugin;
use koi_pond::scene;
use koi_pond::simulation::SimulationPlugin;
use koi_pond::testing::{self, TEST_ENV};

fn main() {
    // Check for test mode
    let test_mode = env::var(TEST_ENV).ok();

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Koi Pond".into(),
            resolution: WindowResolution::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.04, 0.16, 0.2)))
    // Insert PondConfig with compiled defaults; load_pond_config will
    // overwrite it from assets/pond.toml (if present) in the Startup schedule.
    .insert_resource(PondConfig::default())
    .add_plugins((SimulationPlugin, PointerInputPlugin, PondRenderingPlugin))
    .add_systems(
        Startup,
        (
            // Load config first so every other startup system sees the final values.
            config::load_pond_config,
            config::apply_seed_override.after(config::load_pond_config),
            graphics::setup_camera.after(config::apply_seed_override),
        ),
    );

    if let Some(test_name) = test_mode {
        testing::configure_test_mode(&mut app, &test_name);
    } else {
        app.add_systems(
            Startup,
            scene::spawn_initial_pond
                .after(config::apply_seed_override)
                .after(graphics::setup_camera),
        );
    }

    app.run();
}
