//! Feed pellets: fall, splash, sink, get eaten.
//!
//! A pellet is dropped above the water at `start_z` and falls at `fall_speed`,
//! sliding toward a random `fall_offset`.  Crossing the water surface latches
//! `has_hit_water` (once), spawns a ripple and picks a nearby drift target; the
//! pellet then sinks at `sink_speed` toward that target with a small flutter
//! until it rests on the floor.
//!
//! Once below `attraction_z_threshold` a pellet is visible to fish and is eaten
//! by the first fish whose centre comes within `eat_reach * fish.radius`.
//! Eating is checked before movement each frame.
//!
//! At most `max_feeds` pellets exist; spawning one more evicts the oldest.

use bevy::math::Vec2;
use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::config::{PondConfig, WaterConfig};
use crate::constants::{
    FEED_FLUTTER_RADIUS_MAX, FEED_FLUTTER_RADIUS_MIN, FEED_FLUTTER_SPEED_MAX, FEED_FLUTTER_SPEED_MIN,
};
use crate::entity::{Drift, EntityId, EntityKind, EntityType, Feed, FeedPhase};
use crate::math::{lerp, random_range};
use crate::pond::Pond;

impl Feed {
    pub fn phase(&self, z: f32, water: &WaterConfig) -> FeedPhase {
        if !self.has_hit_water {
            FeedPhase::Falling
        } else if z <= water.floor_z {
            FeedPhase::Settled
        } else {
            FeedPhase::Sinking
        }
    }
}

/// Result of a feed spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSpawn {
    pub id: EntityId,
    /// Oldest pellet removed to stay within `max_feeds`.
    pub evicted: Option<EntityId>,
}

impl Pond {
    /// Drop a pellet at `pos`, evicting the oldest one if the pond is full.
    pub fn spawn_feed(&mut self, pos: Vec2, config: &PondConfig) -> FeedSpawn {
        let feed_cfg = &config.feed;
        let mut evicted = None;
        if self.count_of(EntityType::Feed) >= feed_cfg.max_feeds {
            let oldest = self.of_type(EntityType::Feed).map(|e| e.id).next();
            if let Some(oldest) = oldest {
                if self.remove(oldest).is_ok() {
                    debug!("feed {oldest} evicted (max {})", feed_cfg.max_feeds);
                    evicted = Some(oldest);
                }
            }
        }

        let rng = self.rng();
        let fall_offset = Vec2::new(
            random_range(rng, -feed_cfg.fall_offset_x, feed_cfg.fall_offset_x),
            random_range(rng, feed_cfg.fall_offset_y_min, feed_cfg.fall_offset_y_max),
        );
        let flutter = Drift {
            phase: random_range(rng, 0.0, TAU),
            speed: random_range(rng, FEED_FLUTTER_SPEED_MIN, FEED_FLUTTER_SPEED_MAX),
            radius: random_range(rng, FEED_FLUTTER_RADIUS_MIN, FEED_FLUTTER_RADIUS_MAX),
        };
        let feed = Feed {
            spawn: pos,
            fall_offset,
            drift_base: pos,
            drift_target: pos,
            has_hit_water: false,
            flutter,
            settled_at: None,
        };
        let id = self.insert(pos, feed_cfg.start_z, feed_cfg.radius, EntityKind::Feed(feed));
        FeedSpawn { id, evicted }
    }

    /// Feed brush: drop one pellet at a random point within `brush_radius` of
    /// `point`.  Nothing is dropped while the pointer is over a floating
    /// object.
    pub fn spawn_feed_at_cursor(&mut self, point: Vec2, config: &PondConfig) -> Option<FeedSpawn> {
        if self.floating().any(|e| e.pos.distance(point) < e.radius) {
            return None;
        }
        let rng = self.rng();
        let angle = random_range(rng, 0.0, TAU);
        let radius = random_range(rng, 0.0, config.feed.brush_radius);
        let pos = point + Vec2::new(angle.cos(), angle.sin()) * radius;
        Some(self.spawn_feed(pos, config))
    }
}

/// Outcome of one feed update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub eaten: usize,
    pub splashes: usize,
    pub settled_expired: usize,
}

/// Eat, move, splash and retire feed pellets.
pub fn update_feed(pond: &mut Pond, config: &PondConfig, now: f32, dt: f32) -> FeedReport {
    let feed_cfg = &config.feed;
    let water = &config.water;
    let reach = config.fish.eat_reach;

    let fish: Vec<(Vec2, f32)> = pond
        .of_type(EntityType::Fish)
        .filter(|e| e.is_well_formed())
        .map(|e| (e.pos, e.radius))
        .collect();

    let mut eaten = Vec::new();
    let mut expired = Vec::new();
    let mut splashed = Vec::new();

    for (slot, entity) in pond.entities_mut().iter_mut().enumerate().rev() {
        let EntityKind::Feed(feed) = &mut entity.kind else {
            continue;
        };
        if !entity.pos.is_finite() || !entity.z.is_finite() {
            warn!("skipping feed {} with non-finite state", entity.id);
            continue;
        }

        if entity.z < feed_cfg.attraction_z_threshold
            && fish
                .iter()
                .any(|(pos, radius)| pos.distance(entity.pos) < radius * reach)
        {
            eaten.push(entity.id);
            continue;
        }

        if entity.z > water.floor_z {
            let was_above = entity.z > water.surface_z;
            if feed.has_hit_water {
                entity.z -= feed_cfg.sink_speed * dt;
                let depth = water.surface_z - water.floor_z;
                let progress = if depth > 0.0 {
                    (water.surface_z - entity.z) / depth
                } else {
                    1.0
                };
                entity.pos = feed.drift_base.lerp(feed.drift_target, progress)
                    + feed.flutter.offset(now);
            } else {
                entity.z -= feed_cfg.fall_speed * dt;
                let progress = if feed_cfg.start_z > 0.0 {
                    1.0 - entity.z.max(0.0) / feed_cfg.start_z
                } else {
                    1.0
                };
                entity.pos = Vec2::new(
                    lerp(feed.spawn.x, feed.spawn.x + feed.fall_offset.x, progress),
                    lerp(feed.spawn.y, feed.spawn.y + feed.fall_offset.y, progress),
                );
            }
            entity.z = entity.z.max(water.floor_z);

            if was_above && entity.z <= water.surface_z && !feed.has_hit_water {
                feed.has_hit_water = true;
                feed.drift_base = entity.pos;
                splashed.push((slot, entity.pos));
            }
        }

        if entity.z <= water.floor_z && feed.settled_at.is_none() {
            feed.settled_at = Some(now);
        }
        if let (Some(lifetime), Some(settled_at)) = (feed_cfg.settled_lifetime, feed.settled_at) {
            if now - settled_at >= lifetime {
                expired.push(entity.id);
            }
        }
    }

    // Drift targets and splashes need the RNG and the registry, so they are
    // applied after the walk.  Slots are still valid: nothing was removed yet.
    for &(slot, pos) in &splashed {
        let rng = pond.rng();
        let target = pos
            + Vec2::new(
                random_range(rng, -feed_cfg.sink_drift, feed_cfg.sink_drift),
                random_range(rng, -feed_cfg.sink_drift, feed_cfg.sink_drift),
            );
        if let EntityKind::Feed(feed) = &mut pond.entities_mut()[slot].kind {
            feed.drift_target = target;
        }
    }
    for &(_, pos) in &splashed {
        pond.insert_ripple(pos, 1.0, None, now, &config.ripple);
    }

    for id in &eaten {
        debug!("feed {id} eaten");
    }
    let removed: Vec<EntityId> = eaten.iter().chain(expired.iter()).copied().collect();
    pond.retain(|e| !removed.contains(&e.id));

    FeedReport {
        eaten: eaten.len(),
        splashes: splashed.len(),
        settled_expired: expired.len(),
    }
}
