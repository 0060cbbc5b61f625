//! Runtime pond configuration loaded from `assets/pond.toml`.
//!
//! [`PondConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`], grouped into one table per simulation component.  At
//! startup, [`load_pond_config`] reads `assets/pond.toml` and overwrites the
//! defaults with any values present in the file.  Missing keys fall back to the
//! compile-time defaults, so a minimal TOML can override just the constants you
//! care about:
//!
//! ```toml
//! [fish]
//! count = 25
//! max_curvature = 2.0
//!
//! [ripple]
//! max_reflections = 3
//! ```
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `PondConfig::default()`.

use crate::constants::*;
use crate::error::{PondError, PondResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/pond.toml";

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV: &str = "POND_SEED";

/// Runtime-tunable pond configuration.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PondConfig {
    pub world: WorldConfig,
    pub fish: FishConfig,
    pub physics: FloatPhysicsConfig,
    #[serde(deserialize_with = "lily_pad_table")]
    pub lily_pad: FloatingKindConfig,
    #[serde(deserialize_with = "flower_table")]
    pub flower: FloatingKindConfig,
    pub water: WaterConfig,
    pub feed: FeedConfig,
    pub ripple: RippleConfig,
    pub sparkle: SparkleConfig,
    pub caustics: CausticsConfig,
}

impl Default for PondConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            fish: FishConfig::default(),
            physics: FloatPhysicsConfig::default(),
            lily_pad: FloatingKindConfig::lily_pad(),
            flower: FloatingKindConfig::flower(),
            water: WaterConfig::default(),
            feed: FeedConfig::default(),
            ripple: RippleConfig::default(),
            sparkle: SparkleConfig::default(),
            caustics: CausticsConfig::default(),
        }
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub grid_cell_size: f32,
    pub max_frame_dt: f32,
    /// Seed for the simulation RNG; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            grid_cell_size: GRID_CELL_SIZE,
            max_frame_dt: MAX_FRAME_DT,
            seed: None,
        }
    }
}

// ── Fish ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FishConfig {
    pub count: usize,
    pub speed: f32,
    pub speed_multiplier_min: f32,
    pub speed_multiplier_max: f32,
    pub z_min: f32,
    pub z_max: f32,
    pub feed_speed_boost: f32,
    pub speed_smoothing: f32,
    pub max_curvature: f32,
    pub turn_rate: f32,
    pub corner_avoid_distance: f32,
    pub corner_turn_duration: f32,
    pub wall_avoid_distance: f32,
    pub wall_avoid_strength: f32,
    pub avoid_distance: f32,
    pub avoid_strength: f32,
    pub lookahead_distance: f32,
    pub curvature_smoothing: f32,
    pub attraction_distance: f32,
    pub attraction_strength: f32,
    pub repulsion_dominance: f32,
    pub attraction_blend: f32,
    pub tail_length: f32,
    pub head_radius: f32,
    pub eat_reach: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            count: NUM_FISH,
            speed: FISH_SPEED,
            speed_multiplier_min: FISH_SPEED_MULTIPLIER_MIN,
            speed_multiplier_max: FISH_SPEED_MULTIPLIER_MAX,
            z_min: FISH_Z_MIN,
            z_max: FISH_Z_MAX,
            feed_speed_boost: FEED_SPEED_BOOST,
            speed_smoothing: SPEED_SMOOTHING,
            max_curvature: MAX_CURVATURE,
            turn_rate: TURN_RATE,
            corner_avoid_distance: CORNER_AVOID_DISTANCE,
            corner_turn_duration: CORNER_TURN_DURATION,
            wall_avoid_distance: WALL_AVOID_DISTANCE,
            wall_avoid_strength: WALL_AVOID_STRENGTH,
            avoid_distance: AVOID_DISTANCE,
            avoid_strength: AVOID_STRENGTH,
            lookahead_distance: LOOKAHEAD_DISTANCE,
            curvature_smoothing: CURVATURE_SMOOTHING,
            attraction_distance: ATTRACTION_DISTANCE,
            attraction_strength: ATTRACTION_STRENGTH,
            repulsion_dominance: REPULSION_DOMINANCE,
            attraction_blend: ATTRACTION_BLEND,
            tail_length: TAIL_LENGTH,
            head_radius: HEAD_RADIUS,
            eat_reach: EAT_REACH,
        }
    }
}

// ── Floating objects ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FloatPhysicsConfig {
    pub repulsion_strength: f32,
    pub repulsion_buffer: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub placement_attempts: usize,
}

impl Default for FloatPhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: REPULSION_STRENGTH,
            repulsion_buffer: REPULSION_BUFFER,
            damping: DAMPING,
            max_speed: MAX_PUSH_SPEED,
            placement_attempts: PLACEMENT_ATTEMPTS,
        }
    }
}

/// Shared shape of the `[lily_pad]` and `[flower]` tables.
///
/// The two tables have different defaults, so each is deserialized through
/// a partial table and layered over its own defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingKindConfig {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub sway_angle: f32,
    pub sway_speed: f32,
    pub drift_radius_min: f32,
    pub drift_radius_max: f32,
    pub drift_speed_min: f32,
    pub drift_speed_max: f32,
}

impl FloatingKindConfig {
    pub fn lily_pad() -> Self {
        Self {
            count: NUM_PADS,
            min_radius: PAD_MIN_RADIUS,
            max_radius: PAD_MAX_RADIUS,
            sway_angle: PAD_SWAY_ANGLE,
            sway_speed: PAD_SWAY_SPEED,
            drift_radius_min: PAD_DRIFT_RADIUS_MIN,
            drift_radius_max: PAD_DRIFT_RADIUS_MAX,
            drift_speed_min: PAD_DRIFT_SPEED_MIN,
            drift_speed_max: PAD_DRIFT_SPEED_MAX,
        }
    }

    pub fn flower() -> Self {
        Self {
            count: NUM_FLOWERS,
            min_radius: FLOWER_MIN_RADIUS,
            max_radius: FLOWER_MAX_RADIUS,
            sway_angle: FLOWER_SWAY_ANGLE,
            sway_speed: FLOWER_SWAY_SPEED,
            drift_radius_min: FLOWER_DRIFT_RADIUS_MIN,
            drift_radius_max: FLOWER_DRIFT_RADIUS_MAX,
            drift_speed_min: FLOWER_DRIFT_SPEED_MIN,
            drift_speed_max: FLOWER_DRIFT_SPEED_MAX,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialFloatingKind {
    count: Option<usize>,
    min_radius: Option<f32>,
    max_radius: Option<f32>,
    sway_angle: Option<f32>,
    sway_speed: Option<f32>,
    drift_radius_min: Option<f32>,
    drift_radius_max: Option<f32>,
    drift_speed_min: Option<f32>,
    drift_speed_max: Option<f32>,
}

impl PartialFloatingKind {
    fn layer_over(self, base: FloatingKindConfig) -> FloatingKindConfig {
        FloatingKindConfig {
            count: self.count.unwrap_or(base.count),
            min_radius: self.min_radius.unwrap_or(base.min_radius),
            max_radius: self.max_radius.unwrap_or(base.max_radius),
            sway_angle: self.sway_angle.unwrap_or(base.sway_angle),
            sway_speed: self.sway_speed.unwrap_or(base.sway_speed),
            drift_radius_min: self.drift_radius_min.unwrap_or(base.drift_radius_min),
            drift_radius_max: self.drift_radius_max.unwrap_or(base.drift_radius_max),
            drift_speed_min: self.drift_speed_min.unwrap_or(base.drift_speed_min),
            drift_speed_max: self.drift_speed_max.unwrap_or(base.drift_speed_max),
        }
    }
}

fn lily_pad_table<'de, D>(deserializer: D) -> Result<FloatingKindConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    PartialFloatingKind::deserialize(deserializer)
        .map(|partial| partial.layer_over(FloatingKindConfig::lily_pad()))
}

fn flower_table<'de, D>(deserializer: D) -> Result<FloatingKindConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    PartialFloatingKind::deserialize(deserializer)
        .map(|partial| partial.layer_over(FloatingKindConfig::flower()))
}

// ── Water / feed / ripples ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub surface_z: f32,
    pub floor_z: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            surface_z: WATER_SURFACE_Z,
            floor_z: FLOOR_Z,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub fall_speed: f32,
    pub sink_speed: f32,
    pub attraction_z_threshold: f32,
    pub radius: f32,
    pub max_feeds: usize,
    pub start_z: f32,
    pub brush_radius: f32,
    pub spawn_interval: f32,
    pub fall_offset_x: f32,
    pub fall_offset_y_min: f32,
    pub fall_offset_y_max: f32,
    pub sink_drift: f32,
    /// Seconds a pellet may rest on the floor before it is removed.
    /// `None` keeps settled pellets until eaten or evicted.
    pub settled_lifetime: Option<f32>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            fall_speed: FEED_FALL_SPEED,
            sink_speed: FEED_SINK_SPEED,
            attraction_z_threshold: ATTRACTION_Z_THRESHOLD,
            radius: FEED_RADIUS,
            max_feeds: MAX_FEEDS,
            start_z: FEED_START_Z,
            brush_radius: FEED_BRUSH_RADIUS,
            spawn_interval: FEED_SPAWN_INTERVAL,
            fall_offset_x: FEED_FALL_OFFSET_X,
            fall_offset_y_min: FEED_FALL_OFFSET_Y_MIN,
            fall_offset_y_max: FEED_FALL_OFFSET_Y_MAX,
            sink_drift: FEED_SINK_DRIFT,
            settled_lifetime: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    pub duration: f32,
    pub start_radius: f32,
    pub max_radius: f32,
    pub start_opacity: f32,
    pub start_line_width: f32,
    pub end_line_width: f32,
    pub max_reflections: usize,
    pub reflection_damping: f32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            duration: RIPPLE_DURATION,
            start_radius: RIPPLE_START_RADIUS,
            max_radius: RIPPLE_MAX_RADIUS,
            start_opacity: RIPPLE_START_OPACITY,
            start_line_width: RIPPLE_START_LINE_WIDTH,
            end_line_width: RIPPLE_END_LINE_WIDTH,
            max_reflections: MAX_REFLECTIONS,
            reflection_damping: REFLECTION_DAMPING,
        }
    }
}

// ── Surface effects ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SparkleConfig {
    pub enabled: bool,
    pub max_sparkles: usize,
    pub spawn_interval: f32,
    pub min_duration: f32,
    pub max_duration: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for SparkleConfig {
    fn default() -> Self {
        Self {
            enabled: SPARKLES_ENABLED,
            max_sparkles: MAX_SPARKLES,
            spawn_interval: SPARKLE_SPAWN_INTERVAL,
            min_duration: SPARKLE_MIN_DURATION,
            max_duration: SPARKLE_MAX_DURATION,
            min_size: SPARKLE_MIN_SIZE,
            max_size: SPARKLE_MAX_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CausticsConfig {
    pub enabled: bool,
    pub tile_size: f32,
    pub layer1_velocity: [f32; 2],
    pub layer2_velocity: [f32; 2],
    pub layer_opacity: f32,
}

impl Default for CausticsConfig {
    fn default() -> Self {
        Self {
            enabled: CAUSTICS_ENABLED,
            tile_size: CAUSTICS_TILE_SIZE,
            layer1_velocity: CAUSTICS_LAYER1_VELOCITY,
            layer2_velocity: CAUSTICS_LAYER2_VELOCITY,
            layer_opacity: CAUSTICS_LAYER_OPACITY,
        }
    }
}

// ── Loading & validation ──────────────────────────────────────────────────────

impl PondConfig {
    /// Parse a TOML document on top of the compiled defaults.
    pub fn from_toml_str(contents: &str) -> PondResult<Self> {
        toml::from_str(contents).map_err(|e| PondError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Check caller-contract values.  Returns the first violation found.
    ///
    /// Violations are advisory: the frame loop tolerates them without
    /// crashing, but behaviour is unspecified.
    pub fn validate(&self) -> PondResult<()> {
        positive("world.grid_cell_size", self.world.grid_cell_size)?;
        positive("world.max_frame_dt", self.world.max_frame_dt)?;
        positive("fish.head_radius", self.fish.head_radius)?;
        positive("fish.tail_length", self.fish.tail_length)?;
        positive("fish.turn_rate", self.fish.turn_rate)?;
        positive("fish.max_curvature", self.fish.max_curvature)?;
        positive("fish.avoid_distance", self.fish.avoid_distance)?;
        positive("fish.wall_avoid_distance", self.fish.wall_avoid_distance)?;
        positive("fish.attraction_distance", self.fish.attraction_distance)?;
        positive("physics.max_speed", self.physics.max_speed)?;
        if !(self.physics.damping > 0.0 && self.physics.damping <= 1.0) {
            return Err(PondError::InvalidConfig {
                key: "physics.damping",
                value: self.physics.damping,
                expected: "(0.0, 1.0]",
            });
        }
        for (key, kind) in [("lily_pad", &self.lily_pad), ("flower", &self.flower)] {
            if kind.min_radius <= 0.0 || kind.max_radius < kind.min_radius {
                return Err(PondError::InvalidConfig {
                    key: if key == "lily_pad" {
                        "lily_pad.min_radius"
                    } else {
                        "flower.min_radius"
                    },
                    value: kind.min_radius,
                    expected: "0 < min_radius <= max_radius",
                });
            }
        }
        positive("feed.radius", self.feed.radius)?;
        positive("feed.start_z", self.feed.start_z)?;
        if self.feed.max_feeds == 0 {
            return Err(PondError::InvalidConfig {
                key: "feed.max_feeds",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if self.water.surface_z <= self.water.floor_z {
            return Err(PondError::InvalidConfig {
                key: "water.surface_z",
                value: self.water.surface_z,
                expected: "> water.floor_z",
            });
        }
        positive("ripple.duration", self.ripple.duration)?;
        positive("ripple.max_radius", self.ripple.max_radius)?;
        positive("sparkle.spawn_interval", self.sparkle.spawn_interval)?;
        positive("caustics.tile_size", self.caustics.tile_size)?;
        Ok(())
    }
}

fn positive(key: &'static str, value: f32) -> PondResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PondError::InvalidConfig {
            key,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Startup system: attempt to load `assets/pond.toml` and overwrite the
/// `PondConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are logged
/// but do not abort the simulation.  A missing file is silently ignored
/// (defaults are already in place from `insert_resource`).
pub fn load_pond_config(mut config: ResMut<PondConfig>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match PondConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                if let Err(e) = loaded.validate() {
                    warn!("{CONFIG_PATH}: {e}; continuing with the value as given");
                }
                *config = loaded;
                info!("Loaded pond config from {CONFIG_PATH}");
            }
            Err(e) => {
                warn!("Failed to parse {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {CONFIG_PATH} found; using compiled defaults");
        }
    }
}

/// Parse a `POND_SEED` value.  Surrounding whitespace is ignored.
pub fn parse_seed(raw: &str) -> PondResult<u64> {
    raw.trim().parse().map_err(|_| PondError::ConfigParse {
        message: format!("{SEED_ENV}={raw:?} is not an unsigned integer"),
    })
}

/// Startup system (after [`load_pond_config`]): `POND_SEED` wins over the
/// file's `world.seed`.
pub fn apply_seed_override(mut config: ResMut<PondConfig>) {
    let Ok(raw) = std::env::var(SEED_ENV) else {
        return;
    };
    match parse_seed(&raw) {
        Ok(seed) => {
            config.world.seed = Some(seed);
            info!("Using {SEED_ENV}={seed}");
        }
        Err(e) => warn!("{e}; ignoring"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_values_parse_and_garbage_is_rejected() {
        assert_eq!(parse_seed(" 42\n").ok(), Some(42));
        assert!(parse_seed("-1").is_err());
        assert!(parse_seed("koi").is_err());
    }

    #[test]
    fn defaults_validate() {
        assert!(PondConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = PondConfig::from_toml_str("").expect("empty TOML parses");
        assert_eq!(config.fish.count, NUM_FISH);
        assert_eq!(config.lily_pad.min_radius, PAD_MIN_RADIUS);
        assert_eq!(config.flower.min_radius, FLOWER_MIN_RADIUS);
        assert_eq!(config.feed.settled_lifetime, None);
    }

    #[test]
    fn partial_tables_override_only_given_keys() {
        let config = PondConfig::from_toml_str(
            "[fish]\ncount = 3\n\n[ripple]\nmax_reflections = 2\n\n[flower]\ncount = 9\n",
        )
        .expect("valid TOML");
        assert_eq!(config.fish.count, 3);
        assert_eq!(config.fish.speed, FISH_SPEED);
        assert_eq!(config.ripple.max_reflections, 2);
        assert_eq!(config.flower.count, 9);
        assert_eq!(
            config.flower.max_radius, FLOWER_MAX_RADIUS,
            "unset flower keys must fall back to flower defaults, not pad defaults"
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = PondConfig::from_toml_str("[fish\ncount = ").unwrap_err();
        assert!(matches!(err, PondError::ConfigParse { .. }));
    }

    #[test]
    fn damping_above_one_is_rejected() {
        let mut config = PondConfig::default();
        config.physics.damping = 1.2;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            PondError::InvalidConfig {
                key: "physics.damping",
                ..
            }
        ));
    }

    #[test]
    fn negative_max_curvature_is_rejected() {
        let mut config = PondConfig::default();
        config.fish.max_curvature = -1.0;
        assert!(matches!(
            config.validate(),
            Err(PondError::InvalidConfig {
                key: "fish.max_curvature",
                ..
            })
        ));
    }

    #[test]
    fn zero_max_feeds_is_rejected() {
        let mut config = PondConfig::default();
        config.feed.max_feeds = 0;
        assert!(config.validate().is_err());
    }
}
