use bevy::prelude::*;

/// Setup camera for 2D rendering
pub fn setup_camera(mut commands: Commands) {
    // Default Camera2d maps one world unit to one pixel, centred on the window,
    // which is what `rendering::canvas_to_world` assumes.
    commands.spawn(Camera2d);
    eprintln!("[SETUP] Camera spawned");
}
