//! Floating-object physics: soft-body repulsion between lily pads and flowers.
//!
//! Each frame, every floating object looks up its neighbours in the spatial
//! grid and pushes away from any it overlaps (with `repulsion_buffer` of
//! padding).  The push is an impulse proportional to penetration depth; the
//! resulting velocity is clamped, integrated into the anchor (`base`), damped
//! and reflected off the canvas edges.
//!
//! Velocities are in px/frame and damping is per frame, matching the rest of
//! the per-frame smoothing in the simulation.
//!
//! Independently, the rendered position is `base + drift(time)` and each
//! object accumulates a sinusoidal sway rotation.  Drift and sway are pure
//! decoration: collisions are resolved on `base` alone.
//!
//! Fish and feed never push or get pushed.  The object under the pointer
//! (if any) is immovable: it pushes others but ignores every force.

use bevy::math::Vec2;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::{FloatPhysicsConfig, FloatingKindConfig, PondConfig};
use crate::entity::{EntityId, EntityKind};
use crate::pond::Pond;
use crate::spatial_partition::SpatialGrid;

/// Anchor snapshot taken before forces are accumulated.
#[derive(Debug, Clone, Copy)]
struct BodySnapshot {
    slot: usize,
    id: EntityId,
    base: Vec2,
    radius: f32,
}

/// Advance floating-object physics by one frame.
///
/// Returns the number of overlapping (ordered) pairs that exchanged impulses.
pub fn step_floating(
    pond: &mut Pond,
    grid: &SpatialGrid,
    config: &PondConfig,
    time: f32,
    dt: f32,
) -> usize {
    let physics = &config.physics;
    let dragged = pond.dragged();

    let bodies: Vec<BodySnapshot> = pond
        .entities()
        .iter()
        .enumerate()
        .filter_map(|(slot, e)| {
            let body = e.floating()?;
            (body.base.is_finite() && e.radius.is_finite()).then_some(BodySnapshot {
                slot,
                id: e.id,
                base: body.base,
                radius: e.radius,
            })
        })
        .collect();

    let impulses = accumulate_repulsion(&bodies, grid, physics, dragged);
    let contacts = impulses.contacts;

    let bounds = pond.bounds();
    for (snapshot, impulse) in bodies.iter().zip(impulses.per_body) {
        let entity = &mut pond.entities_mut()[snapshot.slot];
        let radius = entity.radius;
        let Some(body) = entity.floating_mut() else {
            continue;
        };

        if Some(snapshot.id) == dragged {
            body.push_velocity = Vec2::ZERO;
        } else {
            body.push_velocity += impulse;
            integrate(
                &mut body.base,
                &mut body.push_velocity,
                radius,
                bounds,
                physics,
            );
        }
    }

    apply_drift_and_sway(pond, config, time, dt);
    contacts
}

struct Impulses {
    per_body: Vec<Vec2>,
    contacts: usize,
}

/// Pairwise repulsion.  Each overlapping pair is visited from both sides, so
/// both members receive the impulse once per visit.
fn accumulate_repulsion(
    bodies: &[BodySnapshot],
    grid: &SpatialGrid,
    physics: &FloatPhysicsConfig,
    dragged: Option<EntityId>,
) -> Impulses {
    let by_slot: HashMap<usize, usize> = bodies
        .iter()
        .enumerate()
        .map(|(i, b)| (b.slot, i))
        .collect();
    // Bodies are bucketed by anchor, so reaching the largest radius covers
    // every neighbour whose anchor overlaps `a`.
    let largest = bodies.iter().map(|b| b.radius).fold(0.0_f32, f32::max);

    let mut per_body = vec![Vec2::ZERO; bodies.len()];
    let mut contacts = 0;

    for (ia, a) in bodies.iter().enumerate() {
        let reach = a.radius + physics.repulsion_buffer + largest;
        for slot in grid.query_excluding(a.slot, a.base, reach) {
            let Some(&ib) = by_slot.get(&slot) else {
                // Fish, feed, or a malformed body.
                continue;
            };
            let b = &bodies[ib];
            let delta = b.base - a.base;
            let distance = delta.length();
            let min_distance = a.radius + b.radius + physics.repulsion_buffer;
            if distance < min_distance && distance > 0.0 {
                let force = (min_distance - distance) * physics.repulsion_strength;
                let push = delta / distance * force;
                if Some(a.id) != dragged {
                    per_body[ia] -= push;
                }
                if Some(b.id) != dragged {
                    per_body[ib] += push;
                }
                contacts += 1;
            }
        }
    }

    Impulses { per_body, contacts }
}

/// Clamp, integrate, damp and bounce one anchor.
fn integrate(
    base: &mut Vec2,
    velocity: &mut Vec2,
    radius: f32,
    bounds: Vec2,
    physics: &FloatPhysicsConfig,
) {
    *velocity = velocity.clamp_length_max(physics.max_speed);
    *base += *velocity;
    *velocity *= physics.damping;

    if base.x - radius < 0.0 {
        base.x = radius;
        velocity.x = -velocity.x;
    }
    if base.x + radius > bounds.x {
        base.x = bounds.x - radius;
        velocity.x = -velocity.x;
    }
    if base.y - radius < 0.0 {
        base.y = radius;
        velocity.y = -velocity.y;
    }
    if base.y + radius > bounds.y {
        base.y = bounds.y - radius;
        velocity.y = -velocity.y;
    }
}

/// Rendered position and sway rotation.  Never feeds back into collisions.
fn apply_drift_and_sway(pond: &mut Pond, config: &PondConfig, time: f32, dt: f32) {
    for entity in pond.entities_mut() {
        let (body, rotation, kind): (_, &mut f32, &FloatingKindConfig) = match &mut entity.kind {
            EntityKind::LilyPad(pad) => (&pad.body, &mut pad.angle, &config.lily_pad),
            EntityKind::Flower(flower) => (&flower.body, &mut flower.rotation, &config.flower),
            _ => continue,
        };
        let rendered = body.rendered_position(time);
        if !rendered.is_finite() {
            warn!("skipping floating object {} with non-finite anchor", entity.id);
            continue;
        }
        let sway = (time * body.sway.speed + body.sway.phase).sin();
        *rotation += sway * kind.sway_angle * dt;
        entity.pos = rendered;
    }
}
