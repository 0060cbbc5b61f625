//! Koi pond simulation library
//!
//! An animated pond of steering koi, drifting lily pads and flowers, falling
//! feed and reflecting ripples.  The simulation core is plain Rust over an
//! explicitly passed [`pond::Pond`]; [`simulation::SimulationPlugin`] runs it
//! inside a Bevy app.

pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod feed;
pub mod floating;
pub mod graphics;
pub mod input;
pub mod math;
pub mod pond;
pub mod rendering;
pub mod ripple;
pub mod scene;
pub mod simulation;
pub mod spatial_partition;
pub mod steering;
pub mod surface;
pub mod testing;
