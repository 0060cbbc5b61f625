//! Entity data model: every drawable thing in the pond.
//!
//! An entity is a [`PondEntity`] header (id, position, depth, radius) plus an
//! [`EntityKind`] payload.  The header fields are shared by every variant so the
//! spatial grid and renderers can treat entities uniformly; per-kind state lives
//! in the payload.
//!
//! Behaviour for each kind lives in its phase module (`steering`, `floating`,
//! `ripple`, `feed`, `surface`); this module only defines the data.

use bevy::math::Vec2;
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::math::{heading, orbit_offset};

/// Unique, monotonically assigned entity id.  Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of an entity, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Fish,
    LilyPad,
    Flower,
    Ripple,
    Feed,
    Sparkle,
}

impl EntityType {
    /// Lily pads and flowers take part in floating-object physics.
    pub fn is_floating(self) -> bool {
        matches!(self, EntityType::LilyPad | EntityType::Flower)
    }
}

/// A single entity owned by the [`crate::pond::Pond`] registry.
#[derive(Debug, Clone)]
pub struct PondEntity {
    pub id: EntityId,
    /// Rendered canvas position.
    pub pos: Vec2,
    /// Depth: 0 is the pond floor, higher is shallower / above the water.
    pub z: f32,
    /// Collision / visibility radius (zero for kinds without one).
    pub radius: f32,
    pub kind: EntityKind,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Fish(Fish),
    LilyPad(LilyPad),
    Flower(Flower),
    Ripple(Ripple),
    Feed(Feed),
    Sparkle(Sparkle),
}

impl PondEntity {
    pub fn entity_type(&self) -> EntityType {
        match self.kind {
            EntityKind::Fish(_) => EntityType::Fish,
            EntityKind::LilyPad(_) => EntityType::LilyPad,
            EntityKind::Flower(_) => EntityType::Flower,
            EntityKind::Ripple(_) => EntityType::Ripple,
            EntityKind::Feed(_) => EntityType::Feed,
            EntityKind::Sparkle(_) => EntityType::Sparkle,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.entity_type().is_floating()
    }

    /// Physics state of a lily pad or flower.
    pub fn floating(&self) -> Option<&FloatingBody> {
        match &self.kind {
            EntityKind::LilyPad(pad) => Some(&pad.body),
            EntityKind::Flower(flower) => Some(&flower.body),
            _ => None,
        }
    }

    pub fn floating_mut(&mut self) -> Option<&mut FloatingBody> {
        match &mut self.kind {
            EntityKind::LilyPad(pad) => Some(&mut pad.body),
            EntityKind::Flower(flower) => Some(&mut flower.body),
            _ => None,
        }
    }

    pub fn as_fish(&self) -> Option<&Fish> {
        match &self.kind {
            EntityKind::Fish(fish) => Some(fish),
            _ => None,
        }
    }

    pub fn as_ripple(&self) -> Option<&Ripple> {
        match &self.kind {
            EntityKind::Ripple(ripple) => Some(ripple),
            _ => None,
        }
    }

    pub fn as_feed(&self) -> Option<&Feed> {
        match &self.kind {
            EntityKind::Feed(feed) => Some(feed),
            _ => None,
        }
    }

    pub fn as_sparkle(&self) -> Option<&Sparkle> {
        match &self.kind {
            EntityKind::Sparkle(sparkle) => Some(sparkle),
            _ => None,
        }
    }

    /// Position and radius are finite.  Phases skip entities that fail this.
    pub fn is_well_formed(&self) -> bool {
        self.pos.is_finite() && self.z.is_finite() && self.radius.is_finite()
    }
}

// ── Fish ──────────────────────────────────────────────────────────────────────

/// One sample of a fish's trailing path, newest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub pos: Vec2,
    pub angle: f32,
}

/// Latched full-curvature turn away from a canvas corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerTurn {
    /// Seconds spent in the turn so far.
    pub timer: f32,
    /// Curvature held for the whole turn (`±max_curvature`).
    pub curvature: f32,
}

#[derive(Debug, Clone)]
pub struct Fish {
    /// Heading in radians, stored unwrapped.
    pub angle: f32,
    /// Current steering state, within `±max_curvature` after integration.
    pub curvature: f32,
    /// Steering target, recomputed each frame unless corner-turning.
    pub desired_curvature: f32,
    pub corner_turn: Option<CornerTurn>,
    /// Recent samples, newest first; `path[0]` is the current position.
    pub path: VecDeque<PathPoint>,
    pub speed_multiplier: f32,
    pub base_speed: f32,
    pub current_speed: f32,
}

impl Fish {
    pub fn new(pos: Vec2, angle: f32, base_speed: f32, speed_multiplier: f32) -> Self {
        let mut path = VecDeque::new();
        path.push_front(PathPoint { pos, angle });
        Self {
            angle,
            curvature: 0.0,
            desired_curvature: 0.0,
            corner_turn: None,
            path,
            speed_multiplier,
            base_speed,
            current_speed: base_speed,
        }
    }

    pub fn is_corner_turning(&self) -> bool {
        self.corner_turn.is_some()
    }

    /// Unit vector along the current heading.
    pub fn heading(&self) -> Vec2 {
        heading(self.angle)
    }

    /// Cumulative arclength of the trailing path.
    pub fn path_length(&self) -> f32 {
        self.path
            .iter()
            .zip(self.path.iter().skip(1))
            .map(|(a, b)| a.pos.distance(b.pos))
            .sum()
    }
}

// ── Floating objects ──────────────────────────────────────────────────────────

/// Slow circular drift of the rendered position around the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub phase: f32,
    pub radius: f32,
    pub speed: f32,
}

impl Drift {
    pub fn offset(&self, time: f32) -> Vec2 {
        orbit_offset(time, self.speed, self.phase, self.radius)
    }
}

/// Phase state of the sinusoidal rotational sway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sway {
    pub phase: f32,
    pub speed: f32,
}

/// Physics state shared by lily pads and flowers.
///
/// Rendered position = `base` + [`Drift::offset`]; `base` only changes through
/// physics resolution or an explicit drag.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingBody {
    pub base: Vec2,
    /// Repulsion velocity (px/frame), damped every frame.
    pub push_velocity: Vec2,
    pub drift: Drift,
    pub sway: Sway,
}

impl FloatingBody {
    pub fn at_rest(base: Vec2, drift: Drift, sway: Sway) -> Self {
        Self {
            base,
            push_velocity: Vec2::ZERO,
            drift,
            sway,
        }
    }

    pub fn rendered_position(&self, time: f32) -> Vec2 {
        self.base + self.drift.offset(time)
    }
}

/// A bead of water resting on a lily pad, relative to the pad centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Droplet {
    pub offset: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct LilyPad {
    pub body: FloatingBody,
    /// Accumulated sway rotation.
    pub angle: f32,
    pub droplets: Vec<Droplet>,
}

#[derive(Debug, Clone)]
pub struct Flower {
    pub body: FloatingBody,
    /// Accumulated sway rotation.
    pub rotation: f32,
    /// Petal count per layer, outermost first.
    pub petals: [u32; 4],
}

// ── Ripples ───────────────────────────────────────────────────────────────────

/// Geometry captured when a reflection ripple is spawned.
///
/// `object` is a non-owning reference that may dangle once the object is
/// removed; the snapshot keeps the reflection drawable regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionSource {
    pub object: EntityId,
    pub object_center: Vec2,
    pub object_radius: f32,
    /// Centre of the primary ripple that hit the object.
    pub parent_origin: Vec2,
}

#[derive(Debug, Clone)]
pub struct Ripple {
    pub creation_time: f32,
    pub duration: f32,
    pub start_radius: f32,
    pub max_radius: f32,
    pub start_opacity: f32,
    pub start_line_width: f32,
    pub end_line_width: f32,
    /// Fraction of `duration` elapsed as of the last update.
    pub progress: f32,
    /// Set on reflection ripples only.
    pub reflection: Option<ReflectionSource>,
    /// Floating objects this ripple has already reflected off.
    pub reflected_from: HashSet<EntityId>,
}

// ── Feed ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Feed {
    pub spawn: Vec2,
    /// Horizontal travel while falling, reached at the water surface.
    pub fall_offset: Vec2,
    /// Impact point; start of the sinking drift.
    pub drift_base: Vec2,
    /// End of the sinking drift on the floor.
    pub drift_target: Vec2,
    /// One-way latch: set exactly once, on crossing the surface.
    pub has_hit_water: bool,
    pub flutter: Drift,
    /// Time the pellet came to rest on the floor.
    pub settled_at: Option<f32>,
}

/// Where a pellet is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Falling,
    Sinking,
    Settled,
}

// ── Sparkles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sparkle {
    pub creation_time: f32,
    pub duration: f32,
    pub max_size: f32,
}
