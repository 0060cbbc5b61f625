//! Centralised pond simulation constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::PondConfig::default`] is built from these values, and
//! `assets/pond.toml` can override any of them at startup.
//!
//! Coordinates are canvas pixels: origin at the top-left, `y` grows downward.
//! Depth `z` is 0 at the pond floor and grows toward (and above) the surface.

use std::f32::consts::PI;

// ── World ─────────────────────────────────────────────────────────────────────

/// Initial canvas width before the first window resize is observed.
pub const CANVAS_WIDTH: f32 = 1280.0;

/// Initial canvas height before the first window resize is observed.
pub const CANVAS_HEIGHT: f32 = 720.0;

/// World-space size of each spatial grid cell.
///
/// The widest query is the fish sensing radius (`ATTRACTION_DISTANCE` = 450),
/// which covers at most 7×7 cells at this size.
pub const GRID_CELL_SIZE: f32 = 150.0;

/// Largest simulated step (s).  A stalled host (minimised window, debugger)
/// would otherwise hand the simulation a multi-second `dt`.
pub const MAX_FRAME_DT: f32 = 0.1;

// ── Fish ──────────────────────────────────────────────────────────────────────

/// Master size control for all fish parts.
pub const FISH_BASE_SIZE: f32 = 50.0;

/// Number of fish created by the initial scene.
pub const NUM_FISH: usize = 15;

/// Cruising speed (px/s) before the per-fish multiplier.
pub const FISH_SPEED: f32 = 50.0;

/// Per-fish speed multiplier range.
pub const FISH_SPEED_MULTIPLIER_MIN: f32 = 0.7;
pub const FISH_SPEED_MULTIPLIER_MAX: f32 = 1.3;

/// Depth range fish swim at.
pub const FISH_Z_MIN: f32 = 35.0;
pub const FISH_Z_MAX: f32 = 65.0;

/// Speed multiplier while food is in sight.
pub const FEED_SPEED_BOOST: f32 = 2.0;

/// Per-frame smoothing factor pulling current speed toward target speed.
///
/// Applied once per frame regardless of `dt`.
pub const SPEED_SMOOTHING: f32 = 0.1;

/// Sharpest turn a fish can make.  Lower values = wider turns.
pub const MAX_CURVATURE: f32 = 1.5;

/// Heading change (rad/s) at unit curvature.
pub const TURN_RATE: f32 = PI;

/// Lookahead distance from a canvas corner that triggers a corner turn.
pub const CORNER_AVOID_DISTANCE: f32 = 125.0;

/// Duration (s) of the latched full-curvature corner turn.
pub const CORNER_TURN_DURATION: f32 = 0.05;

/// Lookahead distance from a wall where wall avoidance starts.
pub const WALL_AVOID_DISTANCE: f32 = 100.0;
pub const WALL_AVOID_STRENGTH: f32 = 1.0;

/// Radius around a fish where other fish repel it.
pub const AVOID_DISTANCE: f32 = 100.0;
pub const AVOID_STRENGTH: f32 = 1.0;

/// How far ahead of the head walls and corners are probed.
pub const LOOKAHEAD_DISTANCE: f32 = 10.0;

/// Per-frame smoothing of actual toward desired curvature.  Lower is smoother.
pub const CURVATURE_SMOOTHING: f32 = 0.1;

/// How far a fish can "see" food.
pub const ATTRACTION_DISTANCE: f32 = 450.0;
pub const ATTRACTION_STRENGTH: f32 = 1.0;

/// Repulsion wins outright when it is this many times stronger than attraction.
pub const REPULSION_DOMINANCE: f32 = 1.5;

/// Blend factor toward attraction when neither force dominates.
pub const ATTRACTION_BLEND: f32 = 0.6;

/// Arclength of the trailing path (body + tail).
pub const TAIL_LENGTH: f32 = FISH_BASE_SIZE * 3.0;

/// Radius of the fish head; also the eating reach base.
pub const HEAD_RADIUS: f32 = FISH_BASE_SIZE * 0.48;

/// Feed within `EAT_REACH * radius` of a fish centre is eaten.
pub const EAT_REACH: f32 = 1.5;

// ── Floating-object physics ───────────────────────────────────────────────────

/// Impulse per unit of overlap between two floating objects.
pub const REPULSION_STRENGTH: f32 = 0.04;

/// Extra padding kept between floating objects.
pub const REPULSION_BUFFER: f32 = 2.0;

/// Per-frame velocity retention.  Closer to 1 is less water friction.
pub const DAMPING: f32 = 0.985;

/// Fastest a floating object can move when pushed (px/frame).
pub const MAX_PUSH_SPEED: f32 = 3.5;

/// Rejection-sampling attempts when placing a floating object.
pub const PLACEMENT_ATTEMPTS: usize = 100;

// ── Lily pads ─────────────────────────────────────────────────────────────────

pub const NUM_PADS: usize = 7;
pub const PAD_MIN_RADIUS: f32 = 60.0;
pub const PAD_MAX_RADIUS: f32 = 140.0;
pub const PAD_SWAY_ANGLE: f32 = 0.05;
pub const PAD_SWAY_SPEED: f32 = 0.15;
pub const PAD_DRIFT_RADIUS_MIN: f32 = 1.0;
pub const PAD_DRIFT_RADIUS_MAX: f32 = 3.0;
pub const PAD_DRIFT_SPEED_MIN: f32 = 0.1;
pub const PAD_DRIFT_SPEED_MAX: f32 = 0.3;

/// Number of outline points of a pad; the notch spans two of them.
pub const PAD_OUTLINE_POINTS: usize = 65;

pub const MAX_DROPLETS_PER_PAD: usize = 7;
pub const DROPLET_MIN_RADIUS: f32 = 1.0;
pub const DROPLET_MAX_RADIUS: f32 = 3.0;

// ── Lily flowers ──────────────────────────────────────────────────────────────

pub const NUM_FLOWERS: usize = 4;
pub const FLOWER_MIN_RADIUS: f32 = 20.0;
pub const FLOWER_MAX_RADIUS: f32 = 40.0;
pub const FLOWER_SWAY_ANGLE: f32 = 0.05;
pub const FLOWER_SWAY_SPEED: f32 = 0.3;
pub const FLOWER_DRIFT_RADIUS_MIN: f32 = 0.5;
pub const FLOWER_DRIFT_RADIUS_MAX: f32 = 1.5;
pub const FLOWER_DRIFT_SPEED_MIN: f32 = 0.05;
pub const FLOWER_DRIFT_SPEED_MAX: f32 = 0.15;

/// Petal count ranges per layer, outermost first.
pub const PETAL_LAYERS: [(u32, u32); 4] = [(12, 14), (14, 16), (15, 17), (16, 18)];

// ── Water ─────────────────────────────────────────────────────────────────────

/// z-level of the water surface.
pub const WATER_SURFACE_Z: f32 = 100.0;

/// z-level of the pond floor.
pub const FLOOR_Z: f32 = 0.0;

/// Depth assigned to floating objects (they sit on the surface).
pub const FLOATING_Z: f32 = 100.0;
pub const RIPPLE_Z: f32 = 99.0;
pub const SPARKLE_Z: f32 = 98.0;

// ── Feed ──────────────────────────────────────────────────────────────────────

/// Fall speed from the "sky" (px/s of z).
pub const FEED_FALL_SPEED: f32 = 200.0;

/// Sink speed once in the water.
pub const FEED_SINK_SPEED: f32 = 50.0;

/// Feed below this z is visible (and edible) to fish.
pub const ATTRACTION_Z_THRESHOLD: f32 = 50.0;
pub const FEED_RADIUS: f32 = 8.0;
pub const MAX_FEEDS: usize = 20;
pub const FEED_START_Z: f32 = 200.0;

/// Spawns food uniformly in this radius around the pointer.
pub const FEED_BRUSH_RADIUS: f32 = 20.0;

/// Seconds between feed spawns while the pointer is held.
pub const FEED_SPAWN_INTERVAL: f32 = 0.15;

/// Horizontal drift while falling: x in ±, y in [min, max].
pub const FEED_FALL_OFFSET_X: f32 = 25.0;
pub const FEED_FALL_OFFSET_Y_MIN: f32 = 25.0;
pub const FEED_FALL_OFFSET_Y_MAX: f32 = 50.0;

/// Drift target offset (±) chosen on water impact.
pub const FEED_SINK_DRIFT: f32 = 15.0;

pub const FEED_FLUTTER_SPEED_MIN: f32 = 1.5;
pub const FEED_FLUTTER_SPEED_MAX: f32 = 2.5;
pub const FEED_FLUTTER_RADIUS_MIN: f32 = 2.0;
pub const FEED_FLUTTER_RADIUS_MAX: f32 = 4.0;

// ── Ripples ───────────────────────────────────────────────────────────────────

/// How long a primary ripple lasts (s).  Reflections last `duration * damping`.
pub const RIPPLE_DURATION: f32 = 7.0;
pub const RIPPLE_START_RADIUS: f32 = 5.0;
pub const RIPPLE_MAX_RADIUS: f32 = 300.0;
pub const RIPPLE_START_OPACITY: f32 = 0.2;
pub const RIPPLE_START_LINE_WIDTH: f32 = 2.0;
pub const RIPPLE_END_LINE_WIDTH: f32 = 0.0;

/// Reflection budget per primary ripple.
pub const MAX_REFLECTIONS: usize = 5;

/// Intensity of a reflection spawned by a fresh wave.
pub const REFLECTION_DAMPING: f32 = 0.5;

// ── Sparkles ──────────────────────────────────────────────────────────────────

pub const SPARKLES_ENABLED: bool = true;
pub const MAX_SPARKLES: usize = 100;
pub const SPARKLE_SPAWN_INTERVAL: f32 = 0.1;
pub const SPARKLE_MIN_DURATION: f32 = 1.5;
pub const SPARKLE_MAX_DURATION: f32 = 3.0;
pub const SPARKLE_MIN_SIZE: f32 = 1.0;
pub const SPARKLE_MAX_SIZE: f32 = 2.0;

// ── Caustics ──────────────────────────────────────────────────────────────────

pub const CAUSTICS_ENABLED: bool = true;

/// Side length of the tileable caustics texture (px).
pub const CAUSTICS_TILE_SIZE: f32 = 512.0;

/// Scroll velocity of the slow, broad layer (px/s).
pub const CAUSTICS_LAYER1_VELOCITY: [f32; 2] = [3.0, 3.0];

/// Scroll velocity of the faster, detailed layer (px/s).
pub const CAUSTICS_LAYER2_VELOCITY: [f32; 2] = [-5.0, 5.0];
pub const CAUSTICS_LAYER_OPACITY: f32 = 0.1;
