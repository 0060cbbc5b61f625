//! Water-surface decoration: sparkles and scrolling caustics.
//!
//! Neither takes part in physics or steering.  Sparkles are registry entities
//! (so renderers see them in depth order); caustics are just two scrolling
//! texture offsets kept on the [`Pond`].

use bevy::math::Vec2;
use bevy::prelude::*;
use std::f32::consts::PI;

use crate::config::{CausticsConfig, PondConfig, SparkleConfig};
use crate::constants::SPARKLE_Z;
use crate::entity::{EntityId, EntityKind, EntityType, Sparkle};
use crate::math::random_range;
use crate::pond::Pond;

/// Per-pond surface bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    /// Seconds accumulated towards the next sparkle spawn.
    pub sparkle_timer: f32,
    pub caustics: Caustics,
}

/// Scroll offsets of the two caustic texture layers, each in `[0, tile)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Caustics {
    pub layers: [Vec2; 2],
}

impl Caustics {
    pub fn advance(&mut self, config: &CausticsConfig, dt: f32) {
        if !config.enabled || config.tile_size <= 0.0 {
            return;
        }
        let velocities = [
            Vec2::from_array(config.layer1_velocity),
            Vec2::from_array(config.layer2_velocity),
        ];
        for (offset, velocity) in self.layers.iter_mut().zip(velocities) {
            let moved = *offset + velocity * dt;
            *offset = Vec2::new(
                moved.x.rem_euclid(config.tile_size),
                moved.y.rem_euclid(config.tile_size),
            );
        }
    }
}

impl Sparkle {
    pub fn age(&self, now: f32) -> f32 {
        now - self.creation_time
    }

    /// Intensity over the lifetime: 0 at birth, 1 half-way, 0 at expiry.
    pub fn twinkle(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let t = (self.age(now) / self.duration).clamp(0.0, 1.0);
        (t * PI).sin()
    }
}

impl Pond {
    /// Add one sparkle at a random canvas point, unless the cap is reached.
    pub fn spawn_sparkle(&mut self, config: &SparkleConfig) -> Option<EntityId> {
        if self.count_of(EntityType::Sparkle) >= config.max_sparkles {
            return None;
        }
        let now = self.now();
        let (width, height) = (self.width(), self.height());
        let rng = self.rng();
        let pos = Vec2::new(random_range(rng, 0.0, width), random_range(rng, 0.0, height));
        let sparkle = Sparkle {
            creation_time: now,
            duration: random_range(rng, config.min_duration, config.max_duration),
            max_size: random_range(rng, config.min_size, config.max_size),
        };
        Some(self.insert(pos, SPARKLE_Z, 0.0, EntityKind::Sparkle(sparkle)))
    }
}

/// Outcome of one surface update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceReport {
    pub sparkles_spawned: usize,
    pub sparkles_expired: usize,
}

/// Expire old sparkles, spawn new ones on the interval timer and scroll the
/// caustic layers.
pub fn update_surface(pond: &mut Pond, config: &PondConfig, now: f32, dt: f32) -> SurfaceReport {
    let mut report = SurfaceReport {
        sparkles_expired: pond.retain(|e| match e.as_sparkle() {
            Some(sparkle) => sparkle.age(now) <= sparkle.duration,
            None => true,
        }),
        ..Default::default()
    };

    let sparkle = &config.sparkle;
    if sparkle.enabled && sparkle.spawn_interval > 0.0 {
        pond.surface.sparkle_timer += dt;
        while pond.surface.sparkle_timer >= sparkle.spawn_interval {
            pond.surface.sparkle_timer -= sparkle.spawn_interval;
            if pond.spawn_sparkle(sparkle).is_some() {
                report.sparkles_spawned += 1;
            }
        }
    }

    pond.surface.caustics.advance(&config.caustics, dt);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pond() -> Pond {
        Pond::new(800.0, 600.0, Some(11))
    }

    #[test]
    fn sparkles_spawn_on_interval_within_canvas() {
        let config = PondConfig::default();
        let mut pond = pond();
        // 0.35 s at 0.1 s per sparkle.
        let report = update_surface(&mut pond, &config, 0.35, 0.35);
        assert_eq!(report.sparkles_spawned, 3);
        for sparkle in pond.of_type(EntityType::Sparkle) {
            assert!(sparkle.pos.x >= 0.0 && sparkle.pos.x <= 800.0);
            assert!(sparkle.pos.y >= 0.0 && sparkle.pos.y <= 600.0);
            assert_eq!(sparkle.z, SPARKLE_Z);
        }
    }

    #[test]
    fn sparkle_count_is_capped() {
        let mut config = PondConfig::default();
        config.sparkle.max_sparkles = 4;
        let mut pond = pond();
        for _ in 0..20 {
            pond.spawn_sparkle(&config.sparkle);
        }
        assert_eq!(pond.count_of(EntityType::Sparkle), 4);
    }

    #[test]
    fn sparkles_expire_after_their_lifetime() {
        let mut config = PondConfig::default();
        config.sparkle.enabled = false;
        let mut pond = pond();
        pond.spawn_sparkle(&config.sparkle).expect("below cap");
        let report = update_surface(&mut pond, &config, config.sparkle.max_duration + 0.01, 0.016);
        assert_eq!(report.sparkles_expired, 1);
        assert_eq!(pond.count_of(EntityType::Sparkle), 0);
    }

    #[test]
    fn disabled_sparkles_never_spawn() {
        let mut config = PondConfig::default();
        config.sparkle.enabled = false;
        let mut pond = pond();
        let report = update_surface(&mut pond, &config, 5.0, 5.0);
        assert_eq!(report.sparkles_spawned, 0);
    }

    #[test]
    fn twinkle_peaks_mid_life() {
        let sparkle = Sparkle {
            creation_time: 1.0,
            duration: 2.0,
            max_size: 1.5,
        };
        assert!(sparkle.twinkle(1.0).abs() < 1e-6);
        assert!((sparkle.twinkle(2.0) - 1.0).abs() < 1e-6);
        assert!(sparkle.twinkle(3.0).abs() < 1e-5);
    }

    #[test]
    fn caustic_offsets_wrap_into_tile() {
        let config = CausticsConfig::default();
        let mut caustics = Caustics::default();
        for _ in 0..1000 {
            caustics.advance(&config, 1.0);
        }
        for layer in caustics.layers {
            assert!(layer.x >= 0.0 && layer.x < config.tile_size, "{layer:?}");
            assert!(layer.y >= 0.0 && layer.y < config.tile_size, "{layer:?}");
        }
        // Layer 2 scrolls left: 1000 * -5 wraps to 512 - (5000 mod 512).
        let expected_x = (-5000.0_f32).rem_euclid(config.tile_size);
        assert!((caustics.layers[1].x - expected_x).abs() < 1e-2);
    }
}
