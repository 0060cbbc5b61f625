//! The entity registry: single source of truth for a frame.
//!
//! [`Pond`] owns every entity in insertion order (`drawables`) plus a
//! non-owning index of the floating ones (lily pads and flowers).  Phase
//! functions receive `&mut Pond` explicitly; nothing in the simulation reaches
//! for process-wide state.  Only the registry inserts and removes entities;
//! phases mutate payloads in place and ask the registry to add or retire.
//!
//! Insertion order matters: the oldest feed pellet is the first one found
//! when walking `drawables`, which is what FIFO eviction relies on.

use bevy::math::Vec2;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::PondConfig;
use crate::entity::{EntityId, EntityKind, EntityType, PondEntity};
use crate::error::{PondError, PondResult};
use crate::surface::SurfaceState;

/// Pointer grab on a floating object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub id: EntityId,
    /// Anchor minus pointer at grab time, so the object does not jump.
    pub grab_offset: Vec2,
}

#[derive(Resource, Debug)]
pub struct Pond {
    drawables: Vec<PondEntity>,
    floating: Vec<EntityId>,
    next_id: u64,
    width: f32,
    height: f32,
    /// Latest simulation time (s) handed to `advance_frame`.
    now: f32,
    drag: Option<Drag>,
    rng: StdRng,
    pub surface: SurfaceState,
}

impl Pond {
    /// Empty pond of the given canvas size.  `seed` makes every random choice
    /// (placement, drift targets, sparkles) reproducible.
    pub fn new(width: f32, height: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            drawables: Vec::new(),
            floating: Vec::new(),
            next_id: 0,
            width,
            height,
            now: 0.0,
            drag: None,
            rng,
            surface: SurfaceState::default(),
        }
    }

    pub fn from_config(config: &PondConfig) -> Self {
        Self::new(config.world.width, config.world.height, config.world.seed)
    }

    // ── Bounds & clock ────────────────────────────────────────────────────────

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Viewport changed.  Entities outside the new bounds are pulled back in by
    /// their own phases on the next frame.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 && (width != self.width || height != self.height) {
            debug!("pond resized to {width}x{height}");
            self.width = width;
            self.height = height;
        }
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: f32) {
        self.now = now;
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // ── Insertion & removal ───────────────────────────────────────────────────

    /// Add an entity; floating kinds are also added to the floating index.
    pub fn insert(&mut self, pos: Vec2, z: f32, radius: f32, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let entity = PondEntity {
            id,
            pos,
            z,
            radius,
            kind,
        };
        if entity.is_floating() {
            self.floating.push(id);
        }
        self.drawables.push(entity);
        id
    }

    pub fn remove(&mut self, id: EntityId) -> PondResult<PondEntity> {
        let index = self.index_of(id).ok_or(PondError::EntityNotFound {
            id,
            context: "remove",
        })?;
        let entity = self.drawables.remove(index);
        self.forget(id);
        Ok(entity)
    }

    /// Keep only entities for which `keep` returns true.  Returns how many
    /// were removed.
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&PondEntity) -> bool,
    {
        let mut removed = Vec::new();
        self.drawables.retain(|e| {
            let kept = keep(e);
            if !kept {
                removed.push(e.id);
            }
            kept
        });
        for id in &removed {
            self.forget(*id);
        }
        removed.len()
    }

    /// Drop index and drag references to a removed entity.
    fn forget(&mut self, id: EntityId) {
        self.floating.retain(|f| *f != id);
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
    }

    // ── Lookup & iteration ────────────────────────────────────────────────────

    /// All entities in insertion order.
    pub fn entities(&self) -> &[PondEntity] {
        &self.drawables
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [PondEntity] {
        &mut self.drawables
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.drawables.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&PondEntity> {
        self.drawables.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut PondEntity> {
        self.drawables.iter_mut().find(|e| e.id == id)
    }

    /// Ids of lily pads and flowers, in insertion order.
    pub fn floating_ids(&self) -> &[EntityId] {
        &self.floating
    }

    pub fn floating(&self) -> impl Iterator<Item = &PondEntity> {
        self.drawables.iter().filter(|e| e.is_floating())
    }

    pub fn of_type(&self, ty: EntityType) -> impl Iterator<Item = &PondEntity> {
        self.drawables.iter().filter(move |e| e.entity_type() == ty)
    }

    pub fn count_of(&self, ty: EntityType) -> usize {
        self.of_type(ty).count()
    }

    /// Ids sorted back-to-front by depth; ties keep insertion order.
    pub fn draw_order(&self) -> Vec<EntityId> {
        let mut order: Vec<(f32, EntityId)> =
            self.drawables.iter().map(|e| (e.z, e.id)).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        order.into_iter().map(|(_, id)| id).collect()
    }

    // ── Dragging ──────────────────────────────────────────────────────────────

    pub fn dragged(&self) -> Option<EntityId> {
        self.drag.map(|d| d.id)
    }

    /// Grab the top-most floating object under `point`, if any.
    pub fn begin_drag(&mut self, point: Vec2) -> Option<EntityId> {
        let id = self
            .drawables
            .iter()
            .rev()
            .filter(|e| e.is_floating())
            .find(|e| e.pos.distance(point) < e.radius)
            .map(|e| e.id)?;
        self.begin_drag_of(id, point).ok()?;
        Some(id)
    }

    /// Grab a specific floating object with the pointer at `point`.
    pub fn begin_drag_of(&mut self, id: EntityId, point: Vec2) -> PondResult<()> {
        let entity = self.get(id).ok_or(PondError::EntityNotFound {
            id,
            context: "begin_drag",
        })?;
        let body = entity.floating().ok_or(PondError::NotFloating { id })?;
        self.drag = Some(Drag {
            id,
            grab_offset: body.base - point,
        });
        debug!("drag started on {id}");
        Ok(())
    }

    /// Move the dragged object's anchor to follow the pointer.
    pub fn drag_to(&mut self, point: Vec2) -> PondResult<()> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        let entity = self.get_mut(drag.id).ok_or(PondError::EntityNotFound {
            id: drag.id,
            context: "drag_to",
        })?;
        let body = entity
            .floating_mut()
            .ok_or(PondError::NotFloating { id: drag.id })?;
        body.base = point + drag.grab_offset;
        body.push_velocity = Vec2::ZERO;
        Ok(())
    }

    pub fn end_drag(&mut self) -> Option<EntityId> {
        let released = self.drag.take().map(|d| d.id);
        if let Some(id) = released {
            debug!("drag released on {id}");
        }
        released
    }
}
