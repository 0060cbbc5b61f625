//! Debug view: gizmo drawing of the pond state plus a stats overlay.
//!
//! ## Layer Model
//!
//! | Layer           | Technology | Default | Toggle |
//! |-----------------|------------|---------|--------|
//! | Caustic grid    | Gizmos     | ON      | `C`    |
//! | Floating bodies | Gizmos     | always  | —      |
//! | Fish + trails   | Gizmos     | always  | —      |
//! | Feed            | Gizmos     | always  | —      |
//! | Ripple arcs     | Gizmos     | always  | —      |
//! | Sparkles        | Gizmos     | always  | —      |
//! | Spatial grid    | Gizmos     | OFF     | `G`    |
//! | Stats overlay   | Bevy UI    | OFF     | `S`    |
//!
//! Everything is drawn from [`Pond::draw_order`], so deeper entities are
//! drawn first.  Core state is in canvas coordinates (origin top-left, y
//! down); [`canvas_to_world`] maps it onto the centred Bevy camera.

use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::config::PondConfig;
use crate::entity::{EntityKind, EntityType, FeedPhase, PondEntity, Ripple};
use crate::pond::Pond;
use crate::ripple::{visible_arcs, Arc};
use crate::simulation::{PondSet, PondStats};

/// Segments used for a full ripple circle; partial arcs use proportionally
/// fewer.
const ARC_SEGMENTS: usize = 96;

// ── Overlay state resource ────────────────────────────────────────────────────

#[derive(Resource, Clone, Debug)]
pub struct OverlayState {
    pub show_caustics: bool,
    /// Draw the spatial grid cell lines.
    pub show_grid: bool,
    pub show_stats: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            show_caustics: true,
            show_grid: false,
            show_stats: false,
        }
    }
}

/// Marker for the stats text root node.
#[derive(Component)]
pub struct StatsTextDisplay;

// ── Coordinates ───────────────────────────────────────────────────────────────

/// Canvas point (origin top-left, y down) to Bevy world point (origin at the
/// window centre, y up).
pub fn canvas_to_world(point: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(point.x - width / 2.0, height / 2.0 - point.y)
}

/// Sample an arc of the circle `(center, radius)` into canvas points.
pub fn arc_points(center: Vec2, radius: f32, arc: Arc) -> Vec<Vec2> {
    let fraction = (arc.sweep() / TAU).clamp(0.0, 1.0);
    let segments = ((ARC_SEGMENTS as f32 * fraction).ceil() as usize).max(2);
    (0..=segments)
        .map(|i| {
            let angle = arc.start + arc.sweep() * i as f32 / segments as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Pellets darken as they sink; pellets on the floor are dimmed by the water.
pub fn feed_color(phase: FeedPhase) -> Color {
    match phase {
        FeedPhase::Falling => Color::srgb(0.75, 0.5, 0.25),
        FeedPhase::Sinking => Color::srgb(0.6, 0.4, 0.2),
        FeedPhase::Settled => Color::srgba(0.45, 0.32, 0.18, 0.7),
    }
}

// ── Startup: stats overlay text ───────────────────────────────────────────────

/// Spawn the toggleable stats overlay (starts hidden; `S` shows it).
pub fn setup_stats_text(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            StatsTextDisplay,
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Fish: 0 | Feed: 0 | Ripples: 0"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.95, 1.0)),
            ));
        });
}

// ── Update: keyboard toggles ──────────────────────────────────────────────────

pub fn overlay_toggle_system(keys: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<OverlayState>) {
    if keys.just_pressed(KeyCode::KeyC) {
        overlay.show_caustics = !overlay.show_caustics;
    }
    if keys.just_pressed(KeyCode::KeyG) {
        overlay.show_grid = !overlay.show_grid;
    }
    if keys.just_pressed(KeyCode::KeyS) {
        overlay.show_stats = !overlay.show_stats;
    }
}

/// Only re-runs when `OverlayState` changes.
pub fn sync_stats_overlay_visibility_system(
    overlay: Res<OverlayState>,
    mut query: Query<&mut Visibility, With<StatsTextDisplay>>,
) {
    if !overlay.is_changed() {
        return;
    }
    let vis = if overlay.show_stats {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut v in query.iter_mut() {
        *v = vis;
    }
}

// ── Update: stats text ────────────────────────────────────────────────────────

pub fn stats_display_system(
    stats: Res<PondStats>,
    pond: Res<Pond>,
    parent_query: Query<&Children, With<StatsTextDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(format!(
                    "Fish: {} | Feed: {} | Ripples: {} | Eaten: {} | Reflections: {} | Expired: {}",
                    pond.count_of(EntityType::Fish),
                    pond.count_of(EntityType::Feed),
                    pond.count_of(EntityType::Ripple),
                    stats.totals.feed_eaten,
                    stats.totals.reflections,
                    stats.totals.entities_expired(),
                ));
            }
        }
    }
}

// ── Update: gizmo rendering ───────────────────────────────────────────────────

/// Draw the pond in depth order.
pub fn pond_gizmo_system(
    mut gizmos: Gizmos,
    pond: Res<Pond>,
    config: Res<PondConfig>,
    overlay: Res<OverlayState>,
) {
    let (width, height) = (pond.width(), pond.height());
    let to_world = |p: Vec2| canvas_to_world(p, width, height);

    if overlay.show_caustics && config.caustics.enabled {
        draw_caustics(&mut gizmos, &pond, &config, to_world);
    }

    let bodies: Vec<(Vec2, f32)> = pond.floating().map(|e| (e.pos, e.radius)).collect();
    let now = pond.now();

    for id in pond.draw_order() {
        let Some(entity) = pond.get(id) else {
            continue;
        };
        if !entity.is_well_formed() {
            continue;
        }
        match &entity.kind {
            EntityKind::LilyPad(pad) => {
                let color = Color::srgb(0.25, 0.6, 0.3);
                gizmos.circle_2d(to_world(entity.pos), entity.radius, color);
                // Notch edge at the pad's current angle.
                let edge = entity.pos + Vec2::new(pad.angle.cos(), pad.angle.sin()) * entity.radius;
                gizmos.line_2d(to_world(entity.pos), to_world(edge), color);
                let spin = Vec2::from_angle(pad.angle);
                for droplet in &pad.droplets {
                    gizmos.circle_2d(
                        to_world(entity.pos + spin.rotate(droplet.offset)),
                        droplet.radius,
                        Color::srgba(0.8, 0.95, 1.0, 0.8),
                    );
                }
            }
            EntityKind::Flower(flower) => {
                let color = Color::srgb(0.95, 0.6, 0.75);
                gizmos.circle_2d(to_world(entity.pos), entity.radius, color);
                let petals = flower.petals.first().copied().unwrap_or(0).max(1);
                for i in 0..petals {
                    let angle = flower.rotation + TAU * i as f32 / petals as f32;
                    let tip = entity.pos + Vec2::new(angle.cos(), angle.sin()) * entity.radius;
                    gizmos.line_2d(to_world(entity.pos), to_world(tip), color);
                }
            }
            EntityKind::Fish(fish) => {
                let color = Color::srgb(0.95, 0.45, 0.15);
                if fish.path.len() >= 2 {
                    gizmos.linestrip_2d(fish.path.iter().map(|p| to_world(p.pos)), color);
                }
                gizmos.circle_2d(to_world(entity.pos), entity.radius, color);
            }
            EntityKind::Feed(feed) => {
                gizmos.circle_2d(
                    to_world(entity.pos),
                    entity.radius * 0.5,
                    feed_color(feed.phase(entity.z, &config.water)),
                );
            }
            EntityKind::Ripple(ripple) => {
                draw_ripple(&mut gizmos, entity, ripple, &bodies, to_world);
            }
            EntityKind::Sparkle(sparkle) => {
                let intensity = sparkle.twinkle(now);
                if intensity > 0.0 {
                    gizmos.circle_2d(
                        to_world(entity.pos),
                        sparkle.max_size * intensity,
                        Color::srgba(1.0, 1.0, 1.0, intensity),
                    );
                }
            }
        }
    }

    if overlay.show_grid {
        let cell = config.world.grid_cell_size.max(1.0);
        let grid_color = Color::srgba(1.0, 1.0, 0.0, 0.15);
        let mut x = 0.0;
        while x <= width {
            gizmos.line_2d(to_world(Vec2::new(x, 0.0)), to_world(Vec2::new(x, height)), grid_color);
            x += cell;
        }
        let mut y = 0.0;
        while y <= height {
            gizmos.line_2d(to_world(Vec2::new(0.0, y)), to_world(Vec2::new(width, y)), grid_color);
            y += cell;
        }
    }
}

fn draw_ripple(
    gizmos: &mut Gizmos,
    entity: &PondEntity,
    ripple: &Ripple,
    bodies: &[(Vec2, f32)],
    to_world: impl Fn(Vec2) -> Vec2,
) {
    let radius = ripple.current_radius();
    let opacity = ripple.opacity_at(ripple.progress);
    if opacity <= 0.0 || radius <= 0.0 {
        return;
    }
    let color = Color::srgba(0.9, 0.95, 1.0, opacity);
    let arcs = if ripple.is_reflection() {
        vec![ripple.reflection_arc()]
    } else {
        visible_arcs(entity.pos, radius, bodies.iter().copied())
    };
    for arc in arcs {
        let points = arc_points(entity.pos, radius, arc);
        gizmos.linestrip_2d(points.into_iter().map(&to_world), color);
    }
}

/// Two scrolling tile grids, one per caustic layer.
fn draw_caustics(
    gizmos: &mut Gizmos,
    pond: &Pond,
    config: &PondConfig,
    to_world: impl Fn(Vec2) -> Vec2,
) {
    let tile = config.caustics.tile_size;
    if tile <= 1.0 {
        return;
    }
    let (width, height) = (pond.width(), pond.height());
    let color = Color::srgba(0.6, 0.85, 1.0, config.caustics.layer_opacity * 0.3);
    for offset in pond.surface.caustics.layers {
        let mut x = offset.x - tile;
        while x <= width {
            gizmos.line_2d(to_world(Vec2::new(x, 0.0)), to_world(Vec2::new(x, height)), color);
            x += tile;
        }
        let mut y = offset.y - tile;
        while y <= height {
            gizmos.line_2d(to_world(Vec2::new(0.0, y)), to_world(Vec2::new(width, y)), color);
            y += tile;
        }
    }
}

pub struct PondRenderingPlugin;

impl Plugin for PondRenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayState>()
            .add_systems(Startup, setup_stats_text)
            .add_systems(
                Update,
                (
                    overlay_toggle_system,
                    sync_stats_overlay_visibility_system,
                    stats_display_system,
                    pond_gizmo_system,
                )
                    .chain()
                    .in_set(PondSet::Draw),
            );
    }
}
