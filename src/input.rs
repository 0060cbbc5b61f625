//! Pointer handling: drag floating objects, paint feed, tap ripples.
//!
//! Window cursor positions are already canvas coordinates (origin top-left,
//! y down), so they go to the pond unchanged.
//!
//! | Gesture                         | Effect                                  |
//! |---------------------------------|-----------------------------------------|
//! | Left press on a pad or flower   | grab it; it follows the pointer         |
//! | Left press/hold on open water   | feed brush, one pellet per interval     |
//! | Left release                    | drop the grabbed object, stop painting  |
//! | Right click                     | ripple at the pointer                   |

use bevy::prelude::*;

use crate::config::PondConfig;
use crate::pond::Pond;
use crate::simulation::{FrameReport, PondSet, PondStats};

/// Feed brush state between frames.
#[derive(Resource, Debug, Clone, Default)]
pub struct FeedBrush {
    pub painting: bool,
    /// Seconds until the next pellet.
    pub cooldown: f32,
}

/// One frame of pointer state, decoupled from Bevy's input resources.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSample {
    /// Canvas position, `None` when the cursor is outside the window.
    pub position: Option<Vec2>,
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
    pub tapped: bool,
}

/// Apply one frame of pointer input to the pond.
pub fn apply_pointer(
    pond: &mut Pond,
    brush: &mut FeedBrush,
    config: &PondConfig,
    pointer: PointerSample,
    dt: f32,
) -> FrameReport {
    let mut report = FrameReport::default();

    if pointer.released {
        pond.end_drag();
        brush.painting = false;
    }
    let Some(point) = pointer.position else {
        return report;
    };

    if pointer.pressed && pond.begin_drag(point).is_none() {
        brush.painting = true;
        brush.cooldown = 0.0;
    }

    if pointer.held {
        if pond.dragged().is_some() {
            if let Err(err) = pond.drag_to(point) {
                warn!("drag lost: {err}");
                pond.end_drag();
            }
        } else if brush.painting {
            brush.cooldown -= dt;
            if brush.cooldown <= 0.0 {
                brush.cooldown = config.feed.spawn_interval;
                if let Some(spawn) = pond.spawn_feed_at_cursor(point, config) {
                    report.feed_spawned += 1;
                    if spawn.evicted.is_some() {
                        report.feed_evicted += 1;
                    }
                }
            }
        }
    }

    if pointer.tapped {
        pond.spawn_ripple(point, &config.ripple);
        report.ripples_spawned += 1;
    }
    report
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Read the mouse and feed it to [`apply_pointer`].
pub fn pointer_input_system(
    time: Res<Time>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut pond: ResMut<Pond>,
    mut brush: ResMut<FeedBrush>,
    config: Res<PondConfig>,
    mut stats: ResMut<PondStats>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let pointer = PointerSample {
        position: window.cursor_position(),
        pressed: buttons.just_pressed(MouseButton::Left),
        held: buttons.pressed(MouseButton::Left),
        released: buttons.just_released(MouseButton::Left),
        tapped: buttons.just_pressed(MouseButton::Right),
    };
    let report = apply_pointer(&mut pond, &mut brush, &config, pointer, time.delta_secs());
    stats.record(report);
}

/// Keep the pond bounds equal to the window size.
pub fn sync_pond_size_system(windows: Query<&Window>, mut pond: ResMut<Pond>) {
    let Ok(window) = windows.single() else {
        return;
    };
    pond.resize(window.width(), window.height());
}

pub struct PointerInputPlugin;

impl Plugin for PointerInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FeedBrush>().add_systems(
            Update,
            (sync_pond_size_system, pointer_input_system)
                .chain()
                .in_set(PondSet::Input),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::scene::spawn_lily_pad;

    fn press(at: Vec2) -> PointerSample {
        PointerSample {
            position: Some(at),
            pressed: true,
            held: true,
            ..Default::default()
        }
    }

    fn hold(at: Vec2) -> PointerSample {
        PointerSample {
            position: Some(at),
            held: true,
            ..Default::default()
        }
    }

    fn release() -> PointerSample {
        PointerSample {
            released: true,
            ..Default::default()
        }
    }

    #[test]
    fn pressing_a_pad_grabs_and_drags_it() {
        let config = PondConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(1));
        let mut brush = FeedBrush::default();
        let pad = spawn_lily_pad(&mut pond, Vec2::new(400.0, 300.0), 60.0, &config);

        apply_pointer(&mut pond, &mut brush, &config, press(Vec2::new(410.0, 300.0)), 0.016);
        assert_eq!(pond.dragged(), Some(pad));
        assert!(!brush.painting);

        apply_pointer(&mut pond, &mut brush, &config, hold(Vec2::new(510.0, 250.0)), 0.016);
        let body = pond.get(pad).and_then(|e| e.floating()).expect("pad body");
        assert!(body.base.distance(Vec2::new(500.0, 250.0)) < 1e-3);
        assert_eq!(pond.count_of(EntityType::Feed), 0);

        apply_pointer(&mut pond, &mut brush, &config, release(), 0.016);
        assert_eq!(pond.dragged(), None);
    }

    #[test]
    fn holding_on_open_water_paints_at_the_spawn_interval() {
        let config = PondConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(2));
        let mut brush = FeedBrush::default();
        let at = Vec2::new(200.0, 200.0);

        let first = apply_pointer(&mut pond, &mut brush, &config, press(at), 0.06);
        assert_eq!(first.feed_spawned, 1);
        // 0.15 s interval: frames at 0.06 s spawn again on the third hold.
        let mut spawned = 0;
        for _ in 0..3 {
            spawned += apply_pointer(&mut pond, &mut brush, &config, hold(at), 0.06).feed_spawned;
        }
        assert_eq!(spawned, 1);
        assert_eq!(pond.count_of(EntityType::Feed), 2);

        apply_pointer(&mut pond, &mut brush, &config, release(), 0.06);
        apply_pointer(&mut pond, &mut brush, &config, hold(at), 0.5);
        assert_eq!(pond.count_of(EntityType::Feed), 2, "brush stops on release");
    }

    #[test]
    fn right_click_drops_a_ripple() {
        let config = PondConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(3));
        let mut brush = FeedBrush::default();
        let tap = PointerSample {
            position: Some(Vec2::new(100.0, 120.0)),
            tapped: true,
            ..Default::default()
        };
        let report = apply_pointer(&mut pond, &mut brush, &config, tap, 0.016);
        assert_eq!(report.ripples_spawned, 1);
        let ripple = pond.of_type(EntityType::Ripple).next().expect("ripple");
        assert_eq!(ripple.pos, Vec2::new(100.0, 120.0));
    }

    #[test]
    fn cursor_outside_the_window_only_releases() {
        let config = PondConfig::default();
        let mut pond = Pond::new(800.0, 600.0, Some(4));
        let mut brush = FeedBrush {
            painting: true,
            cooldown: 0.0,
        };
        let outside = PointerSample {
            held: true,
            released: true,
            ..Default::default()
        };
        let report = apply_pointer(&mut pond, &mut brush, &config, outside, 0.016);
        assert_eq!(report, FrameReport::default());
        assert!(!brush.painting);
        assert!(pond.is_empty());
    }
}
