//! Initial pond population: fish, lily pads and flowers.

use bevy::math::Vec2;
use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::config::{FloatingKindConfig, PondConfig};
use crate::constants::{
    DROPLET_MAX_RADIUS, DROPLET_MIN_RADIUS, FLOATING_Z, MAX_DROPLETS_PER_PAD, PAD_OUTLINE_POINTS,
    PETAL_LAYERS,
};
use crate::entity::{Drift, Droplet, EntityId, EntityKind, Fish, FloatingBody, Flower, LilyPad, Sway};
use crate::math::random_range;
use crate::pond::Pond;
use rand::Rng;

/// How many of each kind `populate` created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub fish: usize,
    pub lily_pads: usize,
    pub flowers: usize,
}

/// Fill an empty pond: fish first, then lily pads, then flowers.
pub fn populate(pond: &mut Pond, config: &PondConfig) -> SceneSummary {
    let fish_cfg = &config.fish;
    let inset = fish_cfg.corner_avoid_distance;
    for _ in 0..fish_cfg.count {
        let (width, height) = (pond.width(), pond.height());
        let rng = pond.rng();
        let multiplier = random_range(rng, fish_cfg.speed_multiplier_min, fish_cfg.speed_multiplier_max);
        let z = random_range(rng, fish_cfg.z_min, fish_cfg.z_max);
        let pos = Vec2::new(
            random_range(rng, inset, width - inset),
            random_range(rng, inset, height - inset),
        );
        let angle = random_range(rng, 0.0, TAU);
        spawn_fish(pond, pos, angle, multiplier, z, config);
    }

    for _ in 0..config.lily_pad.count {
        let radius = random_radius(pond, &config.lily_pad);
        let base = place_without_overlap(pond, radius, config);
        spawn_lily_pad(pond, base, radius, config);
    }
    for _ in 0..config.flower.count {
        let radius = random_radius(pond, &config.flower);
        let base = place_without_overlap(pond, radius, config);
        spawn_flower(pond, base, radius, config);
    }

    let summary = SceneSummary {
        fish: fish_cfg.count,
        lily_pads: config.lily_pad.count,
        flowers: config.flower.count,
    };
    info!(
        "pond populated: {} fish, {} lily pads, {} flowers",
        summary.fish, summary.lily_pads, summary.flowers
    );
    summary
}

/// Startup system: rebuild the pond from the loaded config and populate it.
pub fn spawn_initial_pond(mut pond: ResMut<Pond>, config: Res<PondConfig>) {
    *pond = Pond::from_config(&config);
    populate(&mut pond, &config);
}

fn random_radius(pond: &mut Pond, kind: &FloatingKindConfig) -> f32 {
    random_range(pond.rng(), kind.min_radius, kind.max_radius)
}

/// Rejection-sample an anchor inside the canvas that keeps `radius` (plus the
/// repulsion buffer) clear of every existing floating object.  After
/// `placement_attempts` tries the last candidate is used anyway and physics
/// pushes it apart.
pub fn place_without_overlap(pond: &mut Pond, radius: f32, config: &PondConfig) -> Vec2 {
    let buffer = config.physics.repulsion_buffer;
    let attempts = config.physics.placement_attempts.max(1);
    let existing: Vec<(Vec2, f32)> = pond.floating().map(|e| (e.pos, e.radius)).collect();
    let (width, height) = (pond.width(), pond.height());

    let mut candidate = Vec2::ZERO;
    for _ in 0..attempts {
        let rng = pond.rng();
        candidate = Vec2::new(
            random_range(rng, radius, width - radius),
            random_range(rng, radius, height - radius),
        );
        let clear = existing
            .iter()
            .all(|(pos, r)| candidate.distance(*pos) >= radius + r + buffer);
        if clear {
            return candidate;
        }
    }
    debug!("no free spot for radius {radius} after {attempts} attempts");
    candidate
}

pub fn spawn_fish(
    pond: &mut Pond,
    pos: Vec2,
    angle: f32,
    speed_multiplier: f32,
    z: f32,
    config: &PondConfig,
) -> EntityId {
    let base_speed = config.fish.speed * speed_multiplier;
    pond.insert(
        pos,
        z,
        config.fish.head_radius,
        EntityKind::Fish(Fish::new(pos, angle, base_speed, speed_multiplier)),
    )
}

fn random_motion(pond: &mut Pond, kind: &FloatingKindConfig) -> (Drift, Sway) {
    let rng = pond.rng();
    let drift = Drift {
        phase: random_range(rng, 0.0, TAU),
        radius: random_range(rng, kind.drift_radius_min, kind.drift_radius_max),
        speed: random_range(rng, kind.drift_speed_min, kind.drift_speed_max),
    };
    let sway = Sway {
        phase: random_range(rng, 0.0, TAU),
        speed: random_range(rng, kind.sway_speed * 0.8, kind.sway_speed * 1.2),
    };
    (drift, sway)
}

/// Lily pad with random drift, sway and a few droplets kept out of the notch.
pub fn spawn_lily_pad(pond: &mut Pond, base: Vec2, radius: f32, config: &PondConfig) -> EntityId {
    let (drift, sway) = random_motion(pond, &config.lily_pad);
    let rng = pond.rng();
    let angle = random_range(rng, 0.0, TAU);

    let notch = 2.0 * TAU / PAD_OUTLINE_POINTS as f32;
    let count = random_range(rng, 0.0, MAX_DROPLETS_PER_PAD as f32).floor() as usize;
    let droplets = (0..count)
        .map(|_| {
            let theta = random_range(rng, notch, TAU);
            let distance = rng.gen::<f32>().powf(1.5) * radius * 0.95;
            Droplet {
                offset: Vec2::new(theta.cos(), theta.sin()) * distance,
                radius: random_range(rng, DROPLET_MIN_RADIUS, DROPLET_MAX_RADIUS),
            }
        })
        .collect();

    pond.insert(
        base,
        FLOATING_Z,
        radius,
        EntityKind::LilyPad(LilyPad {
            body: FloatingBody::at_rest(base, drift, sway),
            angle,
            droplets,
        }),
    )
}

/// Flower with random drift, sway and petal counts per layer.
pub fn spawn_flower(pond: &mut Pond, base: Vec2, radius: f32, config: &PondConfig) -> EntityId {
    let (drift, sway) = random_motion(pond, &config.flower);
    let rng = pond.rng();
    let rotation = random_range(rng, 0.0, TAU);
    let petals = PETAL_LAYERS.map(|(min, max)| random_range(rng, min as f32, max as f32).floor() as u32);

    pond.insert(
        base,
        FLOATING_Z,
        radius,
        EntityKind::Flower(Flower {
            body: FloatingBody::at_rest(base, drift, sway),
            rotation,
            petals,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn populate_creates_configured_counts() {
        let config = PondConfig::default();
        let mut pond = Pond::from_config(&config);
        let summary = populate(&mut pond, &config);
        assert_eq!(pond.count_of(EntityType::Fish), summary.fish);
        assert_eq!(pond.count_of(EntityType::LilyPad), summary.lily_pads);
        assert_eq!(pond.count_of(EntityType::Flower), summary.flowers);
        assert_eq!(pond.floating_ids().len(), summary.lily_pads + summary.flowers);
    }

    #[test]
    fn fish_start_inside_the_corner_inset() {
        let config = PondConfig::default();
        let mut pond = Pond::from_config(&config);
        populate(&mut pond, &config);
        let inset = config.fish.corner_avoid_distance;
        for fish in pond.of_type(EntityType::Fish) {
            assert!(fish.pos.x >= inset && fish.pos.x <= pond.width() - inset);
            assert!(fish.pos.y >= inset && fish.pos.y <= pond.height() - inset);
            assert!(fish.z >= config.fish.z_min && fish.z <= config.fish.z_max);
            let data = fish.as_fish().expect("fish");
            assert_eq!(data.path.len(), 1);
            assert!((data.base_speed - config.fish.speed * data.speed_multiplier).abs() < 1e-4);
        }
    }

    #[test]
    fn placement_avoids_existing_floating_objects_when_there_is_room() {
        let config = PondConfig::default();
        let mut pond = Pond::new(2000.0, 2000.0, Some(8));
        let first = place_without_overlap(&mut pond, 50.0, &config);
        spawn_lily_pad(&mut pond, first, 50.0, &config);
        for _ in 0..10 {
            let p = place_without_overlap(&mut pond, 50.0, &config);
            assert!(p.distance(first) >= 102.0, "overlapping placement at {p:?}");
        }
    }

    #[test]
    fn droplets_and_petals_stay_in_range() {
        let config = PondConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(8));
        for _ in 0..20 {
            let pad = spawn_lily_pad(&mut pond, Vec2::new(400.0, 300.0), 100.0, &config);
            let entity = pond.get(pad).expect("pad");
            let EntityKind::LilyPad(data) = &entity.kind else {
                panic!("expected a lily pad");
            };
            assert!(data.droplets.len() < MAX_DROPLETS_PER_PAD);
            for droplet in &data.droplets {
                assert!(droplet.offset.length() <= 95.0 + 1e-3);
            }
        }
        let flower = spawn_flower(&mut pond, Vec2::new(100.0, 100.0), 30.0, &config);
        let EntityKind::Flower(data) = &pond.get(flower).expect("flower").kind else {
            panic!("expected a flower");
        };
        for (count, (min, max)) in data.petals.iter().zip(PETAL_LAYERS) {
            assert!(*count >= min && *count < max);
        }
    }
}
