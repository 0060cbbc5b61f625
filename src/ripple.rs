//! Ripple wave system.
//!
//! A ripple is an expanding circular wavefront.  Its radius follows an
//! ease-out curve from `start_radius` to `max_radius` over `duration` seconds,
//! after which it is removed.  While a *primary* ripple expands it reflects off
//! floating objects: the first time its wavefront reaches an object it spawns a
//! weaker *reflection* ripple on that object's near edge.  Reflections never
//! reflect again, and a primary ripple reflects at most `max_reflections` times
//! and at most once per object.
//!
//! Renderers draw primary ripples as the arcs of the wavefront that are not
//! shadowed by floating objects ([`visible_arcs`]) and reflections as the arc
//! facing away from the object they bounced off ([`Ripple::reflection_arc`]).

use bevy::math::Vec2;
use bevy::prelude::*;
use std::collections::HashSet;
use std::f32::consts::TAU;

use crate::config::RippleConfig;
use crate::constants::RIPPLE_Z;
use crate::entity::{EntityId, EntityKind, ReflectionSource, Ripple};
use crate::math::{ease_out_quad, lerp, normalize_angle};
use crate::pond::Pond;

/// An angular interval `[start, end]` in radians, `start <= end`, measured in
/// canvas space (y down).  `end` may exceed `2π` for arcs that wrap past 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub start: f32,
    pub end: f32,
}

impl Arc {
    pub const FULL: Arc = Arc {
        start: 0.0,
        end: TAU,
    };

    pub fn sweep(&self) -> f32 {
        self.end - self.start
    }

    pub fn is_full(&self) -> bool {
        self.sweep() >= TAU
    }
}

// ── Ripple geometry ───────────────────────────────────────────────────────────

impl Ripple {
    pub fn age(&self, now: f32) -> f32 {
        now - self.creation_time
    }

    pub fn is_reflection(&self) -> bool {
        self.reflection.is_some()
    }

    pub fn radius_at(&self, progress: f32) -> f32 {
        lerp(
            self.start_radius,
            self.max_radius,
            ease_out_quad(progress.clamp(0.0, 1.0)),
        )
    }

    pub fn current_radius(&self) -> f32 {
        self.radius_at(self.progress)
    }

    /// Linear fade from `start_opacity` to transparent.
    pub fn opacity_at(&self, progress: f32) -> f32 {
        self.start_opacity * (1.0 - progress.clamp(0.0, 1.0))
    }

    pub fn line_width_at(&self, progress: f32) -> f32 {
        lerp(
            self.start_line_width,
            self.end_line_width,
            progress.clamp(0.0, 1.0),
        )
    }

    /// Arc of a reflection ripple: everything except the cone subtended by the
    /// object as seen from the parent ripple's origin.
    ///
    /// Primary ripples, and reflections whose snapshot is degenerate (parent
    /// origin inside the object), are drawn as a full circle.
    pub fn reflection_arc(&self) -> Arc {
        let Some(source) = self.reflection else {
            return Arc::FULL;
        };
        let toward = source.object_center - source.parent_origin;
        let distance = toward.length();
        if !distance.is_finite() || distance <= source.object_radius || distance == 0.0 {
            return Arc::FULL;
        }
        let angle = toward.y.atan2(toward.x);
        let half_cone = (source.object_radius / distance).asin();
        Arc {
            start: angle + half_cone,
            end: angle - half_cone + TAU,
        }
    }
}

/// Angular interval(s) of a circle of `radius` around `origin` hidden inside a
/// disk at `center`.  Intervals are in `[0, 2π]`; one that wraps past 0 is
/// split in two.  `None` when the circle and the disk boundary do not cross.
pub fn blocked_angles(origin: Vec2, radius: f32, center: Vec2, body_radius: f32) -> Option<Vec<Arc>> {
    let delta = center - origin;
    let distance = delta.length();
    if distance <= 0.0
        || radius <= 0.0
        || distance < (radius - body_radius).abs()
        || distance > radius + body_radius
    {
        return None;
    }
    let angle = delta.y.atan2(delta.x);
    let cos = (radius * radius + distance * distance - body_radius * body_radius)
        / (2.0 * radius * distance);
    let half = cos.clamp(-1.0, 1.0).acos();

    let start = normalize_angle(angle - half);
    let end = normalize_angle(angle + half);
    if start > end {
        Some(vec![
            Arc { start, end: TAU },
            Arc {
                start: 0.0,
                end,
            },
        ])
    } else {
        Some(vec![Arc { start, end }])
    }
}

/// Sort and merge overlapping intervals.
fn merge(mut arcs: Vec<Arc>) -> Vec<Arc> {
    arcs.sort_by(|a, b| a.start.total_cmp(&b.start));
    let mut merged: Vec<Arc> = Vec::with_capacity(arcs.len());
    for arc in arcs {
        match merged.last_mut() {
            Some(last) if arc.start <= last.end => last.end = last.end.max(arc.end),
            _ => merged.push(arc),
        }
    }
    merged
}

/// Arcs of the wavefront of a primary ripple that are not shadowed by any of
/// `bodies` (`(center, radius)` pairs).
///
/// With nothing in the way this is a single full circle; when the wavefront
/// lies entirely inside one body the result is empty.
pub fn visible_arcs<I>(origin: Vec2, radius: f32, bodies: I) -> Vec<Arc>
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    let blocked: Vec<Arc> = bodies
        .into_iter()
        .filter_map(|(center, r)| blocked_angles(origin, radius, center, r))
        .flatten()
        .collect();
    if blocked.is_empty() {
        return vec![Arc::FULL];
    }

    let blocked = merge(blocked);
    let mut gaps = Vec::with_capacity(blocked.len() + 1);
    let mut cursor = 0.0;
    for block in &blocked {
        if block.start > cursor {
            gaps.push(Arc {
                start: cursor,
                end: block.start,
            });
        }
        cursor = cursor.max(block.end);
    }
    if cursor < TAU {
        gaps.push(Arc {
            start: cursor,
            end: TAU,
        });
    }

    // Join the gap ending at 2π with the one starting at 0.
    if gaps.len() > 1 {
        let first = gaps[0];
        let last = gaps[gaps.len() - 1];
        if first.start == 0.0 && last.end == TAU {
            gaps.pop();
            gaps[0] = Arc {
                start: last.start,
                end: first.end + TAU,
            };
        }
    }
    gaps
}

// ── Spawning ──────────────────────────────────────────────────────────────────

impl Pond {
    /// Spawn a full-strength primary ripple at `pos`.
    pub fn spawn_ripple(&mut self, pos: Vec2, config: &RippleConfig) -> EntityId {
        self.insert_ripple(pos, 1.0, None, self.now(), config)
    }

    /// Spawn a reflection ripple.  `damping` scales duration, opacity and
    /// maximum radius.
    pub fn spawn_reflection(
        &mut self,
        pos: Vec2,
        damping: f32,
        source: ReflectionSource,
        config: &RippleConfig,
    ) -> EntityId {
        self.insert_ripple(pos, damping, Some(source), self.now(), config)
    }

    pub(crate) fn insert_ripple(
        &mut self,
        pos: Vec2,
        damping: f32,
        reflection: Option<ReflectionSource>,
        creation_time: f32,
        config: &RippleConfig,
    ) -> EntityId {
        let max_radius = if reflection.is_some() {
            config.max_radius * damping
        } else {
            config.max_radius
        };
        let ripple = Ripple {
            creation_time,
            duration: config.duration * damping,
            start_radius: config.start_radius,
            max_radius,
            start_opacity: config.start_opacity * damping,
            start_line_width: config.start_line_width,
            end_line_width: config.end_line_width,
            progress: 0.0,
            reflection,
            reflected_from: HashSet::new(),
        };
        self.insert(pos, RIPPLE_Z, config.start_radius, EntityKind::Ripple(ripple))
    }
}

// ── Update ────────────────────────────────────────────────────────────────────

/// Outcome of one ripple update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RippleReport {
    pub expired: usize,
    pub reflections: usize,
}

struct PendingReflection {
    pos: Vec2,
    damping: f32,
    source: ReflectionSource,
}

/// Retire expired ripples, advance the rest and spawn reflections.
pub fn update_ripples(pond: &mut Pond, config: &RippleConfig, now: f32) -> RippleReport {
    let expired = pond.retain(|e| match e.as_ripple() {
        Some(ripple) => ripple.age(now) <= ripple.duration,
        None => true,
    });

    let floating: Vec<(EntityId, Vec2, f32)> = pond
        .floating()
        .filter(|e| e.is_well_formed())
        .map(|e| (e.id, e.pos, e.radius))
        .collect();

    let mut pending = Vec::new();
    for entity in pond.entities_mut() {
        let origin = entity.pos;
        let EntityKind::Ripple(ripple) = &mut entity.kind else {
            continue;
        };
        ripple.progress = if ripple.duration > 0.0 {
            ripple.age(now) / ripple.duration
        } else {
            1.0
        };
        let radius = ripple.current_radius();
        entity.radius = radius;

        if ripple.is_reflection() || ripple.reflected_from.len() >= config.max_reflections {
            continue;
        }
        for &(id, center, body_radius) in &floating {
            if ripple.reflected_from.contains(&id) {
                continue;
            }
            let delta = center - origin;
            let distance = delta.length();
            if distance < radius + body_radius && distance > 0.0 {
                pending.push(PendingReflection {
                    pos: center - delta / distance * body_radius,
                    damping: config.reflection_damping * (1.0 - ripple.progress),
                    source: ReflectionSource {
                        object: id,
                        object_center: center,
                        object_radius: body_radius,
                        parent_origin: origin,
                    },
                });
                ripple.reflected_from.insert(id);
                if ripple.reflected_from.len() >= config.max_reflections {
                    break;
                }
            }
        }
    }

    let reflections = pending.len();
    for reflection in pending {
        let id = pond.insert_ripple(
            reflection.pos,
            reflection.damping,
            Some(reflection.source),
            now,
            config,
        );
        debug!(
            "ripple reflected off {} as {id}",
            reflection.source.object
        );
    }

    RippleReport {
        expired,
        reflections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Drift, EntityType, FloatingBody, LilyPad, Sway};
    use std::f32::consts::PI;

    fn add_pad(pond: &mut Pond, pos: Vec2, radius: f32) -> EntityId {
        let still = Drift {
            phase: 0.0,
            radius: 0.0,
            speed: 0.0,
        };
        let sway = Sway {
            phase: 0.0,
            speed: 0.0,
        };
        pond.insert(
            pos,
            100.0,
            radius,
            EntityKind::LilyPad(LilyPad {
                body: FloatingBody::at_rest(pos, still, sway),
                angle: 0.0,
                droplets: Vec::new(),
            }),
        )
    }

    fn reflections(pond: &Pond) -> Vec<ReflectionSource> {
        pond.of_type(EntityType::Ripple)
            .filter_map(|e| e.as_ripple()?.reflection)
            .collect()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    #[test]
    fn ripple_expires_just_after_its_duration() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        pond.spawn_ripple(Vec2::new(400.0, 300.0), &config);

        update_ripples(&mut pond, &config, config.duration);
        assert_eq!(pond.count_of(EntityType::Ripple), 1, "alive at exactly its duration");

        let report = update_ripples(&mut pond, &config, config.duration + 0.001);
        assert_eq!(report.expired, 1);
        assert_eq!(pond.count_of(EntityType::Ripple), 0);
    }

    #[test]
    fn radius_eases_out_between_bounds() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        pond.spawn_ripple(Vec2::new(400.0, 300.0), &config);
        let ripple = pond.entities()[0].as_ripple().expect("ripple").clone();
        assert_eq!(ripple.radius_at(0.0), config.start_radius);
        assert_eq!(ripple.radius_at(1.0), config.max_radius);
        // Ease-out: more than half the growth in the first half.
        let mid = ripple.radius_at(0.5);
        assert!(mid > (config.start_radius + config.max_radius) / 2.0);
        assert_eq!(ripple.opacity_at(1.0), 0.0);
        assert_eq!(ripple.line_width_at(0.0), config.start_line_width);
    }

    // ── Reflections ─────────────────────────────────────────────────────────

    #[test]
    fn reflects_once_per_object_from_its_near_edge() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        let origin = Vec2::new(200.0, 300.0);
        let pad = add_pad(&mut pond, Vec2::new(300.0, 300.0), 40.0);
        pond.spawn_ripple(origin, &config);

        // Long enough to pass the pad, short enough that nothing expires.
        let mut t = 0.0;
        while t < 3.0 {
            t += 0.05;
            update_ripples(&mut pond, &config, t);
        }

        let from_pad: Vec<_> = reflections(&pond)
            .into_iter()
            .filter(|r| r.object == pad && r.parent_origin == origin)
            .collect();
        assert_eq!(from_pad.len(), 1, "exactly one reflection per (ripple, object)");
        let reflection = pond
            .of_type(EntityType::Ripple)
            .find(|e| e.as_ripple().is_some_and(Ripple::is_reflection))
            .expect("reflection exists");
        assert!((reflection.pos - Vec2::new(260.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn reflection_strength_decays_with_parent_progress() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        add_pad(&mut pond, Vec2::new(300.0, 300.0), 40.0);
        pond.spawn_ripple(Vec2::new(200.0, 300.0), &config);

        // Radius 5 + 295 * ease(p) reaches 60 at p ≈ 0.1; step past it.
        let now = 0.1 * config.duration;
        update_ripples(&mut pond, &config, now);
        let reflection = pond
            .of_type(EntityType::Ripple)
            .filter_map(|e| e.as_ripple())
            .find(|r| r.is_reflection())
            .expect("wavefront reached the pad")
            .clone();
        let damping = config.reflection_damping * (1.0 - 0.1);
        assert!((reflection.duration - config.duration * damping).abs() < 1e-3);
        assert!((reflection.max_radius - config.max_radius * damping).abs() < 1e-2);
        assert_eq!(reflection.creation_time, now);
    }

    #[test]
    fn reflection_budget_is_respected() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(1000.0, 1000.0, Some(2));
        let origin = Vec2::new(500.0, 500.0);
        for i in 0..8 {
            let angle = i as f32 / 8.0 * TAU;
            add_pad(&mut pond, origin + Vec2::new(angle.cos(), angle.sin()) * 100.0, 20.0);
        }
        pond.spawn_ripple(origin, &config);
        let report = update_ripples(&mut pond, &config, config.duration * 0.5);
        assert_eq!(report.reflections, config.max_reflections);
        let more = update_ripples(&mut pond, &config, config.duration * 0.6);
        assert_eq!(more.reflections, 0, "budget spent, and reflections never reflect");
    }

    #[test]
    fn reflections_do_not_chain() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        add_pad(&mut pond, Vec2::new(300.0, 300.0), 40.0);
        add_pad(&mut pond, Vec2::new(300.0, 200.0), 40.0);
        let source = ReflectionSource {
            object: EntityId(0),
            object_center: Vec2::new(300.0, 300.0),
            object_radius: 40.0,
            parent_origin: Vec2::new(200.0, 300.0),
        };
        pond.spawn_reflection(Vec2::new(260.0, 300.0), 0.5, source, &config);
        for step in 1..40 {
            let report = update_ripples(&mut pond, &config, step as f32 * 0.05);
            assert_eq!(report.reflections, 0);
        }
    }

    // ── Arc geometry ────────────────────────────────────────────────────────

    #[test]
    fn unobstructed_wavefront_is_a_full_circle() {
        let arcs = visible_arcs(Vec2::ZERO, 50.0, [(Vec2::new(500.0, 0.0), 10.0)]);
        assert_eq!(arcs, vec![Arc::FULL]);
    }

    #[test]
    fn body_on_the_right_blocks_a_symmetric_cone() {
        // Circle R = 100 crossing a disk at (100, 0) with r = 100: ±60°.
        let arcs = visible_arcs(Vec2::ZERO, 100.0, [(Vec2::new(100.0, 0.0), 100.0)]);
        assert_eq!(arcs.len(), 1, "{arcs:?}");
        let third = PI / 3.0;
        assert!((arcs[0].start - third).abs() < 1e-4, "{arcs:?}");
        assert!((arcs[0].end - (TAU - third)).abs() < 1e-4, "{arcs:?}");
    }

    #[test]
    fn gap_across_zero_is_joined() {
        // Body straight down (canvas +y) leaves one arc that wraps through 0.
        let arcs = visible_arcs(Vec2::ZERO, 100.0, [(Vec2::new(0.0, 100.0), 100.0)]);
        assert_eq!(arcs.len(), 1, "{arcs:?}");
        let arc = arcs[0];
        assert!(arc.start > PI / 2.0 && arc.end > TAU, "{arc:?}");
        assert!((arc.sweep() - (TAU - 2.0 * PI / 3.0)).abs() < 1e-4);
    }

    #[test]
    fn two_bodies_leave_two_gaps() {
        let arcs = visible_arcs(
            Vec2::ZERO,
            100.0,
            [(Vec2::new(100.0, 0.0), 30.0), (Vec2::new(-100.0, 0.0), 30.0)],
        );
        assert_eq!(arcs.len(), 2, "{arcs:?}");
    }

    #[test]
    fn body_inside_the_wavefront_casts_no_shadow() {
        assert!(blocked_angles(Vec2::ZERO, 100.0, Vec2::new(20.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn reflection_arc_faces_away_from_the_object() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        let source = ReflectionSource {
            object: EntityId(9),
            object_center: Vec2::new(100.0, 0.0),
            object_radius: 50.0,
            parent_origin: Vec2::ZERO,
        };
        pond.spawn_reflection(Vec2::new(50.0, 0.0), 0.5, source, &config);
        let arc = pond.entities()[0].as_ripple().expect("ripple").reflection_arc();
        // asin(50 / 100) = 30°; the 60° cone toward +x is left out.
        assert!((arc.start - PI / 6.0).abs() < 1e-4);
        assert!((arc.end - (TAU - PI / 6.0)).abs() < 1e-4);
    }

    #[test]
    fn degenerate_reflection_snapshot_draws_full_circle() {
        let config = RippleConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        let source = ReflectionSource {
            object: EntityId(9),
            object_center: Vec2::new(10.0, 0.0),
            object_radius: 50.0,
            parent_origin: Vec2::ZERO,
        };
        pond.spawn_reflection(Vec2::ZERO, 0.5, source, &config);
        let arc = pond.entities()[0].as_ripple().expect("ripple").reflection_arc();
        assert!(arc.is_full());
    }
}
