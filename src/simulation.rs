//! Frame orchestration and the Bevy plugin.
//!
//! One frame runs the phases in a fixed order:
//!
//! 1. rebuild the spatial grid from last frame's final positions,
//! 2. floating-object physics,
//! 3. fish steering,
//! 4. ripple update (may spawn reflections),
//! 5. feed update (may spawn ripples, removes eaten pellets),
//! 6. surface decoration (sparkles, caustics).
//!
//! [`advance_frame`] runs that sequence on plain values and is what headless
//! callers and tests drive.  [`SimulationPlugin`] runs the same phase
//! functions as chained Bevy systems over the [`Pond`] resource.

use bevy::prelude::*;
use std::ops::AddAssign;

use crate::config::PondConfig;
use crate::feed::update_feed;
use crate::floating::step_floating;
use crate::pond::Pond;
use crate::ripple::update_ripples;
use crate::spatial_partition::{rebuild_spatial_grid_system, SpatialGrid};
use crate::steering::step_fish;
use crate::surface::update_surface;

/// Counts of notable events, per frame or accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub floating_contacts: usize,
    pub fish_updated: usize,
    pub corner_turns: usize,
    pub ripples_spawned: usize,
    pub reflections: usize,
    pub ripples_expired: usize,
    pub feed_spawned: usize,
    pub feed_evicted: usize,
    pub feed_eaten: usize,
    pub feed_settled: usize,
    pub sparkles_spawned: usize,
    pub sparkles_expired: usize,
}

impl FrameReport {
    /// Entities removed for reaching the end of their life (not eaten or
    /// evicted).
    pub fn entities_expired(&self) -> usize {
        self.ripples_expired + self.feed_settled + self.sparkles_expired
    }
}

impl AddAssign for FrameReport {
    fn add_assign(&mut self, other: Self) {
        self.floating_contacts += other.floating_contacts;
        self.fish_updated += other.fish_updated;
        self.corner_turns += other.corner_turns;
        self.ripples_spawned += other.ripples_spawned;
        self.reflections += other.reflections;
        self.ripples_expired += other.ripples_expired;
        self.feed_spawned += other.feed_spawned;
        self.feed_evicted += other.feed_evicted;
        self.feed_eaten += other.feed_eaten;
        self.feed_settled += other.feed_settled;
        self.sparkles_spawned += other.sparkles_spawned;
        self.sparkles_expired += other.sparkles_expired;
    }
}

/// Rolling statistics kept by the app.
#[derive(Resource, Debug, Clone, Default)]
pub struct PondStats {
    pub frames: u64,
    /// Events of the most recent frame.
    pub last: FrameReport,
    pub totals: FrameReport,
}

impl PondStats {
    pub fn begin_frame(&mut self) {
        self.frames += 1;
        self.last = FrameReport::default();
    }

    pub fn record(&mut self, partial: FrameReport) {
        self.last += partial;
        self.totals += partial;
    }
}

/// Clamp a host-supplied step: non-finite or negative steps become zero and
/// stalls are capped at `max_frame_dt`.
pub fn effective_dt(dt: f32, config: &PondConfig) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, config.world.max_frame_dt.max(0.0))
    } else {
        0.0
    }
}

// ── Phases ────────────────────────────────────────────────────────────────────

fn physics_phase(pond: &mut Pond, grid: &SpatialGrid, config: &PondConfig, now: f32, dt: f32) -> FrameReport {
    FrameReport {
        floating_contacts: step_floating(pond, grid, config, now, dt),
        ..Default::default()
    }
}

fn steering_phase(pond: &mut Pond, grid: &SpatialGrid, config: &PondConfig, dt: f32) -> FrameReport {
    let report = step_fish(pond, grid, config, dt);
    FrameReport {
        fish_updated: report.fish_updated,
        corner_turns: report.corner_turns_started,
        ..Default::default()
    }
}

fn ripple_phase(pond: &mut Pond, config: &PondConfig, now: f32) -> FrameReport {
    let report = update_ripples(pond, &config.ripple, now);
    FrameReport {
        ripples_spawned: report.reflections,
        reflections: report.reflections,
        ripples_expired: report.expired,
        ..Default::default()
    }
}

fn feed_phase(pond: &mut Pond, config: &PondConfig, now: f32, dt: f32) -> FrameReport {
    let report = update_feed(pond, config, now, dt);
    FrameReport {
        ripples_spawned: report.splashes,
        feed_eaten: report.eaten,
        feed_settled: report.settled_expired,
        ..Default::default()
    }
}

fn surface_phase(pond: &mut Pond, config: &PondConfig, now: f32, dt: f32) -> FrameReport {
    let report = update_surface(pond, config, now, dt);
    FrameReport {
        sparkles_spawned: report.sparkles_spawned,
        sparkles_expired: report.sparkles_expired,
        ..Default::default()
    }
}

/// Run one complete frame at simulation time `now` (seconds) with step `dt`.
pub fn advance_frame(
    pond: &mut Pond,
    grid: &mut SpatialGrid,
    config: &PondConfig,
    now: f32,
    dt: f32,
) -> FrameReport {
    let dt = effective_dt(dt, config);
    pond.set_now(now);

    grid.set_cell_size(config.world.grid_cell_size);
    grid.rebuild(pond);

    let mut report = physics_phase(pond, grid, config, now, dt);
    report += steering_phase(pond, grid, config, dt);
    report += ripple_phase(pond, config, now);
    report += feed_phase(pond, config, now, dt);
    report += surface_phase(pond, config, now, dt);
    report
}

// ── Bevy plugin ───────────────────────────────────────────────────────────────

/// Frame stages, configured to run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PondSet {
    BeginFrame,
    Input,
    Simulate,
    Draw,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<PondConfig>() {
            app.insert_resource(PondConfig::default());
        }
        if !app.world().contains_resource::<Pond>() {
            let pond = Pond::from_config(app.world().resource::<PondConfig>());
            app.insert_resource(pond);
        }
        app.init_resource::<SpatialGrid>()
            .init_resource::<PondStats>()
            .configure_sets(
                Update,
                (PondSet::BeginFrame, PondSet::Input, PondSet::Simulate, PondSet::Draw).chain(),
            )
            .add_systems(Update, begin_frame_system.in_set(PondSet::BeginFrame))
            .add_systems(
                Update,
                (
                    rebuild_spatial_grid_system, // FIRST phase: grid from last frame's positions
                    floating_physics_system,
                    fish_steering_system,
                    ripple_system,
                    feed_system,
                    surface_system,
                )
                    .chain()
                    .in_set(PondSet::Simulate),
            );
    }
}

fn frame_clock(time: &Time, config: &PondConfig) -> (f32, f32) {
    (time.elapsed_secs(), effective_dt(time.delta_secs(), config))
}

pub fn begin_frame_system(time: Res<Time>, mut pond: ResMut<Pond>, mut stats: ResMut<PondStats>) {
    pond.set_now(time.elapsed_secs());
    stats.begin_frame();
}

pub fn floating_physics_system(
    time: Res<Time>,
    mut pond: ResMut<Pond>,
    grid: Res<SpatialGrid>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let (now, dt) = frame_clock(&time, &config);
    stats.record(physics_phase(&mut pond, &grid, &config, now, dt));
}

pub fn fish_steering_system(
    time: Res<Time>,
    mut pond: ResMut<Pond>,
    grid: Res<SpatialGrid>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let (_, dt) = frame_clock(&time, &config);
    stats.record(steering_phase(&mut pond, &grid, &config, dt));
}

pub fn ripple_system(
    time: Res<Time>,
    mut pond: ResMut<Pond>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let (now, _) = frame_clock(&time, &config);
    stats.record(ripple_phase(&mut pond, &config, now));
}

pub fn feed_system(
    time: Res<Time>,
    mut pond: ResMut<Pond>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let (now, dt) = frame_clock(&time, &config);
    stats.record(feed_phase(&mut pond, &config, now, dt));
}

pub fn surface_system(
    time: Res<Time>,
    mut pond: ResMut<Pond>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let (now, dt) = frame_clock(&time, &config);
    stats.record(surface_phase(&mut pond, &config, now, dt));
}
