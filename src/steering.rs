//! Fish steering model.
//!
//! Fish are driven by a single control variable, *curvature*: the heading
//! changes by `curvature * turn_rate * dt` each frame and the body always moves
//! forward.  Each frame a fish:
//!
//! 1. smooths its speed toward `base_speed` (or `base_speed * feed_speed_boost`
//!    when sinking feed is within sensing range);
//! 2. checks whether its lookahead point is close to a canvas corner and, if so,
//!    latches a short full-curvature turn that overrides everything else;
//! 3. otherwise computes a desired curvature from wall avoidance, peer
//!    repulsion and food attraction;
//! 4. smooths and clamps curvature, integrates heading and position;
//! 5. records its new position at the head of its trailing path and trims the
//!    path to `tail_length` of arclength.
//!
//! Fish are updated one after another, and each reads its neighbours' live
//! positions, so a fish sees the peers updated before it this frame at their
//! new positions.

use bevy::math::Vec2;
use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::config::{FishConfig, PondConfig};
use crate::entity::{CornerTurn, EntityKind, EntityType, Fish, PathPoint};
use crate::math::{heading, lerp, sign_or_positive, wrap_angle};
use crate::pond::Pond;
use crate::spatial_partition::SpatialGrid;

/// Something a fish can sense in its neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sensed {
    Fish { pos: Vec2 },
    /// Feed pellet below the attraction depth.
    Feed { pos: Vec2 },
}

/// Outcome of one steering phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteeringReport {
    pub fish_updated: usize,
    pub corner_turns_started: usize,
}

/// Advance every fish by `dt` seconds.
pub fn step_fish(pond: &mut Pond, grid: &SpatialGrid, config: &PondConfig, dt: f32) -> SteeringReport {
    let fish_cfg = &config.fish;
    let bounds = pond.bounds();
    let threshold = config.feed.attraction_z_threshold;
    let sensing_radius = fish_cfg.avoid_distance.max(fish_cfg.attraction_distance);

    // Feed does not move during this phase.
    let attractive_feed: Vec<Vec2> = pond
        .of_type(EntityType::Feed)
        .filter(|e| e.z < threshold && e.pos.is_finite())
        .map(|e| e.pos)
        .collect();

    let fish_slots: Vec<usize> = pond
        .entities()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.entity_type() == EntityType::Fish)
        .map(|(slot, _)| slot)
        .collect();

    let mut report = SteeringReport::default();
    for slot in fish_slots {
        let entity = &pond.entities()[slot];
        let Some(fish) = entity.as_fish() else {
            continue;
        };
        if !entity.is_well_formed() || !fish.angle.is_finite() {
            warn!("skipping fish {} with non-finite state", entity.id);
            continue;
        }
        let pos = entity.pos;

        let attracted = attractive_feed
            .iter()
            .any(|feed| feed.distance(pos) < fish_cfg.attraction_distance);

        // Only sensed when not already committed to a corner turn.
        let neighbours = if fish.is_corner_turning() {
            Vec::new()
        } else {
            sense(pond, grid, slot, pos, sensing_radius, threshold)
        };

        let entity = &mut pond.entities_mut()[slot];
        let EntityKind::Fish(fish) = &mut entity.kind else {
            continue;
        };
        let started = update_fish(
            fish,
            &mut entity.pos,
            attracted,
            &neighbours,
            bounds,
            fish_cfg,
            dt,
        );
        report.fish_updated += 1;
        if started {
            report.corner_turns_started += 1;
        }
    }
    report
}

/// Live positions of peers and attractive feed around `pos`.
fn sense(
    pond: &Pond,
    grid: &SpatialGrid,
    own_slot: usize,
    pos: Vec2,
    radius: f32,
    feed_threshold: f32,
) -> Vec<Sensed> {
    grid.query_excluding(own_slot, pos, radius)
        .into_iter()
        .filter_map(|slot| {
            let other = pond.entities().get(slot)?;
            match other.entity_type() {
                EntityType::Fish => Some(Sensed::Fish { pos: other.pos }),
                EntityType::Feed if other.z < feed_threshold => Some(Sensed::Feed { pos: other.pos }),
                _ => None,
            }
        })
        .collect()
}

/// One fish, one frame.  Returns true when a corner turn was latched.
pub fn update_fish(
    fish: &mut Fish,
    pos: &mut Vec2,
    attracted: bool,
    neighbours: &[Sensed],
    bounds: Vec2,
    config: &FishConfig,
    dt: f32,
) -> bool {
    // ── Speed ───────────────────────────────────────────────────────────────
    let target_speed = if attracted {
        fish.base_speed * config.feed_speed_boost
    } else {
        fish.base_speed
    };
    fish.current_speed = lerp(fish.current_speed, target_speed, config.speed_smoothing);

    // ── Steering ────────────────────────────────────────────────────────────
    let mut started_turn = false;
    if let Some(turn) = fish.corner_turn.as_mut() {
        turn.timer += dt;
        fish.desired_curvature = turn.curvature;
        if turn.timer >= config.corner_turn_duration {
            fish.corner_turn = None;
        }
    } else if let Some(turn) = corner_turn(*pos, fish.angle, bounds, config) {
        fish.desired_curvature = turn.curvature;
        fish.corner_turn = Some(turn);
        started_turn = true;
    } else {
        fish.desired_curvature = steering_curvature(*pos, fish.angle, neighbours, bounds, config);
    }

    // ── Integration ─────────────────────────────────────────────────────────
    fish.curvature = smooth_curvature(fish.curvature, fish.desired_curvature, config);
    fish.angle += fish.curvature * config.turn_rate * dt;
    *pos += heading(fish.angle) * fish.current_speed * dt;
    *pos = pos.clamp(Vec2::ZERO, bounds.max(Vec2::ZERO));

    // ── Path trail ──────────────────────────────────────────────────────────
    fish.path.push_front(PathPoint {
        pos: *pos,
        angle: fish.angle,
    });
    trim_path(fish, config.tail_length);

    started_turn
}

/// Exponential smoothing toward `desired`, then clamp to `±|max_curvature|`.
/// A NaN limit straightens the fish.
pub fn smooth_curvature(current: f32, desired: f32, config: &FishConfig) -> f32 {
    let next = current + (desired - current) * config.curvature_smoothing;
    let limit = config.max_curvature.abs();
    if next.is_finite() && !limit.is_nan() {
        next.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// Drop every path point past the first one at which the cumulative length
/// exceeds `tail_length`.
fn trim_path(fish: &mut Fish, tail_length: f32) {
    let mut total = 0.0;
    let cut = fish
        .path
        .iter()
        .zip(fish.path.iter().skip(1))
        .position(|(a, b)| {
            total += a.pos.distance(b.pos);
            total > tail_length
        });
    if let Some(index) = cut {
        fish.path.truncate(index + 1);
    }
}

/// Latch a turn if the lookahead point is near a canvas corner.
fn corner_turn(pos: Vec2, angle: f32, bounds: Vec2, config: &FishConfig) -> Option<CornerTurn> {
    let look = pos + heading(angle) * config.lookahead_distance;
    let corners = [
        Vec2::ZERO,
        Vec2::new(bounds.x, 0.0),
        Vec2::new(0.0, bounds.y),
        bounds,
    ];
    let corner = corners
        .into_iter()
        .find(|c| look.distance(*c) < config.corner_avoid_distance)?;
    let away = (look - corner).to_angle();
    let diff = wrap_angle(away - angle);
    Some(CornerTurn {
        timer: 0.0,
        curvature: sign_or_positive(diff) * config.max_curvature.abs(),
    })
}

/// Desired curvature from walls, peers and food.
pub fn steering_curvature(
    pos: Vec2,
    angle: f32,
    neighbours: &[Sensed],
    bounds: Vec2,
    config: &FishConfig,
) -> f32 {
    let look = pos + heading(angle) * config.lookahead_distance;
    let repulsion = wall_curvature(look, angle, bounds, config) + peer_curvature(pos, angle, neighbours, config);
    let attraction = food_curvature(pos, angle, neighbours, config);
    combine(repulsion, attraction, config)
}

/// Avoidance dominates outright when it is much stronger than attraction;
/// otherwise the two are blended, leaning toward the food.
pub fn combine(repulsion: f32, attraction: f32, config: &FishConfig) -> f32 {
    if repulsion.abs() > attraction.abs() * config.repulsion_dominance {
        repulsion
    } else {
        lerp(repulsion, attraction, config.attraction_blend)
    }
}

fn wall_curvature(look: Vec2, angle: f32, bounds: Vec2, config: &FishConfig) -> f32 {
    let reach = config.wall_avoid_distance;
    if reach <= 0.0 {
        return 0.0;
    }
    // (penetration into the avoidance band, heading pointing away from the wall)
    let walls = [
        (reach - look.x, 0.0),
        (look.x - (bounds.x - reach), PI),
        (reach - look.y, FRAC_PI_2),
        (look.y - (bounds.y - reach), -FRAC_PI_2),
    ];
    walls
        .into_iter()
        .filter(|(depth, _)| *depth > 0.0)
        .map(|(depth, away)| {
            let diff = wrap_angle(away - angle);
            let turn = if diff == 0.0 { 0.0 } else { diff.signum() } / config.turn_rate;
            turn * (depth / reach).powi(2) * config.wall_avoid_strength
        })
        .sum()
}

fn peer_curvature(pos: Vec2, angle: f32, neighbours: &[Sensed], config: &FishConfig) -> f32 {
    let reach = config.avoid_distance;
    let mut sum = 0.0;
    let mut total_weight = 0.0;
    for sensed in neighbours {
        let Sensed::Fish { pos: other } = *sensed else {
            continue;
        };
        let distance = pos.distance(other);
        if distance < reach && distance > 0.0 {
            let away = (pos - other).to_angle();
            let diff = wrap_angle(away - angle);
            let weight = ((reach - distance) / reach).powi(2);
            sum += diff / config.turn_rate * weight * config.avoid_strength;
            total_weight += weight;
        }
    }
    if total_weight > 0.0 {
        sum / total_weight
    } else {
        0.0
    }
}

fn food_curvature(pos: Vec2, angle: f32, neighbours: &[Sensed], config: &FishConfig) -> f32 {
    let reach = config.attraction_distance;
    let nearest = neighbours
        .iter()
        .filter_map(|sensed| match *sensed {
            Sensed::Feed { pos: feed } => Some((feed, pos.distance(feed))),
            Sensed::Fish { .. } => None,
        })
        .filter(|(_, distance)| *distance < reach)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((feed, distance)) = nearest else {
        return 0.0;
    };
    let diff = wrap_angle((feed - pos).to_angle() - angle);
    let weight = ((reach - distance) / reach).sqrt();
    diff / config.turn_rate * weight * config.attraction_strength
}
