//! Integration tests for whole frames of the pond simulation.
//!
//! Two flavours:
//! - the pure [`advance_frame`] API, stepped at a fixed 60 Hz;
//! - a headless Bevy app built from [`MinimalPlugins`] plus the
//!   [`SimulationPlugin`], with a manual time step so frames are reproducible.
//!
//! No window or renderer is created.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use koi_pond::config::PondConfig;
use koi_pond::entity::EntityType;
use koi_pond::pond::Pond;
use koi_pond::scene::{populate, spawn_fish, spawn_lily_pad};
use koi_pond::simulation::{advance_frame, PondStats, SimulationPlugin};
use koi_pond::spatial_partition::SpatialGrid;

const DT: f32 = 1.0 / 60.0;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn quiet_config() -> PondConfig {
    let mut config = PondConfig::default();
    config.world.seed = Some(5);
    config.sparkle.enabled = false;
    config
}

/// Step `frames` frames starting after `start` seconds; returns the new time.
fn run_frames(
    pond: &mut Pond,
    grid: &mut SpatialGrid,
    config: &PondConfig,
    start: f32,
    frames: u32,
) -> (f32, PondStats) {
    let mut stats = PondStats::default();
    let mut now = start;
    for _ in 0..frames {
        now += DT;
        stats.begin_frame();
        stats.record(advance_frame(pond, grid, config, now, DT));
    }
    (now, stats)
}

/// Headless app stepping exactly 1/60 s per update.
fn headless_app(pond: Pond, config: PondConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(DT)))
        .insert_resource(config)
        .insert_resource(pond)
        .add_plugins(SimulationPlugin);
    app
}

// ── Tests: advance_frame ──────────────────────────────────────────────────────

/// A pellet dropped into an empty pond splashes exactly once and ends up on
/// the floor.
#[test]
fn dropped_pellet_splashes_once_then_rests_on_the_floor() {
    let config = quiet_config();
    let mut pond = Pond::from_config(&config);
    let mut grid = SpatialGrid::default();
    let pellet = pond.spawn_feed(Vec2::new(400.0, 300.0), &config).id;

    let (_, stats) = run_frames(&mut pond, &mut grid, &config, 0.0, 300);
    assert_eq!(stats.totals.ripples_spawned, 1, "one splash per pellet");
    assert_eq!(stats.totals.reflections, 0);
    let entity = pond.get(pellet).expect("uneaten pellet persists");
    assert_eq!(entity.z, config.water.floor_z);
}

/// A fish sitting on a sunk pellet eats it in the next frame.
#[test]
fn fish_eats_pellet_below_the_attraction_depth() {
    let config = quiet_config();
    let mut pond = Pond::from_config(&config);
    let mut grid = SpatialGrid::default();
    let spot = Vec2::new(600.0, 300.0);
    spawn_fish(&mut pond, spot, 0.0, 1.0, 50.0, &config);
    let pellet = pond.spawn_feed(spot, &config).id;
    pond.get_mut(pellet).expect("pellet").z = config.feed.attraction_z_threshold - 10.0;

    let report = advance_frame(&mut pond, &mut grid, &config, DT, DT);
    assert_eq!(report.feed_eaten, 1);
    assert!(pond.get(pellet).is_none());
    assert_eq!(pond.count_of(EntityType::Fish), 1);
}

/// A primary ripple among many pads reflects at most `max_reflections` times
/// and reflections never spawn reflections of their own.
#[test]
fn ripple_reflections_respect_the_budget_over_a_full_lifetime() {
    let config = quiet_config();
    let mut pond = Pond::new(1600.0, 1200.0, Some(9));
    let mut grid = SpatialGrid::default();
    let center = Vec2::new(800.0, 600.0);
    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::TAU / 8.0;
        let at = center + Vec2::new(angle.cos(), angle.sin()) * 200.0;
        spawn_lily_pad(&mut pond, at, 40.0, &config);
    }
    pond.spawn_ripple(center, &config.ripple);

    let frames = (config.ripple.duration / DT) as u32 + 30;
    let (_, stats) = run_frames(&mut pond, &mut grid, &config, 0.0, frames);
    assert_eq!(stats.totals.reflections, config.ripple.max_reflections);
    assert_eq!(
        pond.count_of(EntityType::Ripple),
        0,
        "all ripples expire after their duration"
    );
    assert_eq!(stats.totals.ripples_expired, 1 + config.ripple.max_reflections);
}

/// The dragged pad holds its anchor while pushing an overlapping neighbour
/// away.
#[test]
fn dragged_pad_pushes_but_is_not_pushed() {
    let config = quiet_config();
    let mut pond = Pond::new(1200.0, 800.0, Some(3));
    let mut grid = SpatialGrid::default();
    let held = spawn_lily_pad(&mut pond, Vec2::new(600.0, 400.0), 60.0, &config);
    let free = spawn_lily_pad(&mut pond, Vec2::new(660.0, 400.0), 60.0, &config);
    pond.begin_drag_of(held, Vec2::new(600.0, 400.0)).expect("grab");

    run_frames(&mut pond, &mut grid, &config, 0.0, 120);
    let base = |id| pond.get(id).and_then(|e| e.floating()).map(|b| b.base).expect("pad");
    assert_eq!(base(held), Vec2::new(600.0, 400.0));
    assert!(base(free).x > 660.0, "free pad moved to {:?}", base(free));
}

/// A multi-second stall is simulated as `max_frame_dt`, so fish cannot jump.
#[test]
fn stalled_frame_is_capped() {
    let config = quiet_config();
    let mut pond = Pond::from_config(&config);
    let mut grid = SpatialGrid::default();
    let start = Vec2::new(640.0, 360.0);
    let fish = spawn_fish(&mut pond, start, 0.0, 1.0, 50.0, &config);

    advance_frame(&mut pond, &mut grid, &config, 5.0, 5.0);
    let moved = pond.get(fish).expect("fish").pos.distance(start);
    let limit = config.fish.speed * config.fish.feed_speed_boost * config.world.max_frame_dt;
    assert!(moved <= limit + 1e-3, "fish moved {moved} px in one capped frame");
}

/// An out-of-range curvature limit from a config file keeps the frame loop
/// running with bounded steering.
#[test]
fn negative_curvature_limit_does_not_stop_the_frame_loop() {
    let mut config = quiet_config();
    config.fish.max_curvature = -1.0;
    assert!(config.validate().is_err());
    let mut pond = Pond::from_config(&config);
    let mut grid = SpatialGrid::default();
    let fish = spawn_fish(&mut pond, Vec2::new(640.0, 360.0), 0.0, 1.0, 50.0, &config);

    run_frames(&mut pond, &mut grid, &config, 0.0, 60);
    let entity = pond.get(fish).expect("fish");
    assert!(entity.pos.is_finite());
    let data = entity.as_fish().expect("fish data");
    assert!(data.curvature.abs() <= 1.0, "curvature {}", data.curvature);
}

/// A seeded pond evolves identically on every run.
#[test]
fn seeded_ponds_are_reproducible() {
    let config = quiet_config();
    let run = || {
        let mut pond = Pond::from_config(&config);
        let mut grid = SpatialGrid::default();
        populate(&mut pond, &config);
        pond.spawn_feed(Vec2::new(300.0, 300.0), &config);
        run_frames(&mut pond, &mut grid, &config, 0.0, 240);
        pond.entities().iter().map(|e| (e.id, e.pos)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

// ── Tests: SimulationPlugin ───────────────────────────────────────────────────

/// The plugin registers its resources and counts frames.
#[test]
fn plugin_registers_resources_and_counts_frames() {
    let config = quiet_config();
    let mut app = headless_app(Pond::from_config(&config), config);
    for _ in 0..3 {
        app.update();
    }
    assert!(app.world().contains_resource::<SpatialGrid>());
    assert_eq!(app.world().resource::<PondStats>().frames, 3);
}

/// Without a pond the plugin creates an empty one from the config.
#[test]
fn plugin_creates_a_pond_when_none_is_given() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin);
    app.update();
    let pond = app.world().resource::<Pond>();
    let config = app.world().resource::<PondConfig>();
    assert!(pond.is_empty());
    assert_eq!(pond.width(), config.world.width);
}

/// Feed dropped into the app-driven pond splashes through the Bevy systems.
#[test]
fn plugin_runs_the_feed_lifecycle() {
    let config = quiet_config();
    let mut pond = Pond::from_config(&config);
    pond.spawn_feed(Vec2::new(500.0, 200.0), &config);
    let mut app = headless_app(pond, config);
    for _ in 0..90 {
        app.update();
    }
    let stats = app.world().resource::<PondStats>();
    assert_eq!(stats.totals.ripples_spawned, 1);
    let pond = app.world().resource::<Pond>();
    assert_eq!(pond.count_of(EntityType::Ripple), 1);
    assert_eq!(pond.count_of(EntityType::Feed), 1);
}

/// Lily pads spawned overlapping are pushed apart by the plugin's systems.
#[test]
fn plugin_separates_overlapping_pads() {
    let config = quiet_config();
    let mut pond = Pond::from_config(&config);
    let a = spawn_lily_pad(&mut pond, Vec2::new(600.0, 360.0), 60.0, &config);
    let b = spawn_lily_pad(&mut pond, Vec2::new(640.0, 360.0), 60.0, &config);
    let mut app = headless_app(pond, config);
    for _ in 0..300 {
        app.update();
    }
    let pond = app.world().resource::<Pond>();
    let base = |id| pond.get(id).and_then(|e| e.floating()).map(|b| b.base).expect("pad");
    assert!(
        base(a).distance(base(b)) > 100.0,
        "pads still overlap: {:?} {:?}",
        base(a),
        base(b)
    );
}
