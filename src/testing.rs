//! Scripted scenarios, selected with `POND_TEST=<name>`.
//!
//! Each scenario builds a small fixed scene instead of the random pond, runs
//! the normal simulation for a fixed number of frames, logs what it sees and
//! exits with a PASS/FAIL line.
//!
//! | Name             | Scene                                   | Pass when                          |
//! |------------------|-----------------------------------------|------------------------------------|
//! | `wall_turn`      | one fish swimming at the left wall      | it never touches the wall and turns|
//! | `feed_splash`    | one pellet dropped mid-pond             | exactly one splash, pellet sinks   |
//! | `pad_separation` | two overlapping lily pads               | anchors end up apart               |
//! | `reflection`     | a ripple next to one lily pad           | exactly one reflection             |
//! | `full_pond`      | the normal random pond                  | nothing lost, nothing non-finite   |

use bevy::prelude::*;
use std::f32::consts::PI;
use std::io::Write;

use crate::config::{self, PondConfig};
use crate::entity::{EntityId, EntityType};
use crate::math::wrap_angle;
use crate::pond::Pond;
use crate::scene::{populate, spawn_fish, spawn_lily_pad};
use crate::simulation::{PondSet, PondStats};

/// Environment variable naming the scenario to run.
pub const TEST_ENV: &str = "POND_TEST";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    WallTurn,
    FeedSplash,
    PadSeparation,
    Reflection,
    FullPond,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::WallTurn,
        Scenario::FeedSplash,
        Scenario::PadSeparation,
        Scenario::Reflection,
        Scenario::FullPond,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::WallTurn => "wall_turn",
            Scenario::FeedSplash => "feed_splash",
            Scenario::PadSeparation => "pad_separation",
            Scenario::Reflection => "reflection",
            Scenario::FullPond => "full_pond",
        }
    }

    pub fn frame_limit(self) -> u32 {
        match self {
            Scenario::WallTurn => 240,
            Scenario::FeedSplash => 240,
            Scenario::PadSeparation => 300,
            Scenario::Reflection => 300,
            Scenario::FullPond => 600,
        }
    }

    /// Build the scene; returns the ids the scenario tracks.
    pub fn setup(self, pond: &mut Pond, config: &PondConfig) -> Vec<EntityId> {
        let center = pond.bounds() / 2.0;
        match self {
            Scenario::WallTurn => {
                let pos = Vec2::new(120.0, center.y);
                vec![spawn_fish(pond, pos, PI, 1.0, 50.0, config)]
            }
            Scenario::FeedSplash => vec![pond.spawn_feed(center, config).id],
            Scenario::PadSeparation => vec![
                spawn_lily_pad(pond, center - Vec2::new(20.0, 0.0), 60.0, config),
                spawn_lily_pad(pond, center + Vec2::new(20.0, 0.0), 60.0, config),
            ],
            Scenario::Reflection => {
                let pad = spawn_lily_pad(pond, center + Vec2::new(150.0, 0.0), 80.0, config);
                let ripple = pond.spawn_ripple(center - Vec2::new(50.0, 0.0), &config.ripple);
                vec![pad, ripple]
            }
            Scenario::FullPond => {
                populate(pond, config);
                pond.entities().iter().map(|e| e.id).collect()
            }
        }
    }
}

/// Test configuration
#[derive(Resource, Debug, Clone)]
pub struct TestConfig {
    pub enabled: bool,
    pub scenario: Option<Scenario>,
    pub test_name: String,
    pub frame_limit: u32,
    pub frame_count: u32,
    pub tracked: Vec<EntityId>,
    pub initial_entities: usize,
    /// Closest any tracked fish came to a canvas edge.
    pub min_wall_distance: f32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scenario: None,
            test_name: String::new(),
            frame_limit: 100,
            frame_count: 0,
            tracked: Vec::new(),
            initial_entities: 0,
            min_wall_distance: f32::INFINITY,
        }
    }
}

/// Wire test mode into the app.  Unknown names fall back to `wall_turn`.
pub fn configure_test_mode(app: &mut App, test_name: &str) {
    let scenario = Scenario::from_name(test_name).unwrap_or_else(|| {
        println!("Unknown test {test_name:?}; running wall_turn");
        Scenario::WallTurn
    });
    app.insert_resource(TestConfig {
        enabled: true,
        scenario: Some(scenario),
        test_name: scenario.name().to_string(),
        frame_limit: scenario.frame_limit(),
        ..Default::default()
    });
    app.add_systems(
        Startup,
        spawn_test_scenario
            .after(config::load_pond_config)
            .after(config::apply_seed_override),
    );
    app.add_systems(
        Update,
        (test_logging_system, test_verification_system)
            .chain()
            .after(PondSet::Simulate),
    );
    println!("Running test: {}", scenario.name());
}

/// Startup system: replace the pond with the scenario's scene.
pub fn spawn_test_scenario(
    mut test_config: ResMut<TestConfig>,
    mut pond: ResMut<Pond>,
    config: Res<PondConfig>,
) {
    let Some(scenario) = test_config.scenario else {
        return;
    };
    *pond = Pond::from_config(&config);
    test_config.tracked = scenario.setup(&mut pond, &config);
    test_config.initial_entities = pond.len();
    println!(
        "✓ Spawned test: {} ({} entities)",
        scenario.name(),
        test_config.initial_entities
    );
}

/// Track per-frame observations and print a summary every 60 frames.
pub fn test_logging_system(
    mut test_config: ResMut<TestConfig>,
    pond: Res<Pond>,
    stats: Res<PondStats>,
) {
    if !test_config.enabled {
        return;
    }
    test_config.frame_count += 1;
    observe(&mut test_config, &pond);

    let frame = test_config.frame_count;
    if frame == 1 {
        println!(
            "[Frame 1] Test: {} | entities: {}",
            test_config.test_name,
            pond.len()
        );
        for id in &test_config.tracked {
            if let Some(entity) = pond.get(*id) {
                println!(
                    "  {} {:?} at ({:.1}, {:.1}) z={:.1}",
                    id,
                    entity.entity_type(),
                    entity.pos.x,
                    entity.pos.y,
                    entity.z
                );
            }
        }
    } else if frame.is_multiple_of(60) || frame == test_config.frame_limit {
        println!(
            "[Frame {}] entities: {} | ripples: {} | reflections: {} | eaten: {} | expired: {}",
            frame,
            pond.len(),
            pond.count_of(EntityType::Ripple),
            stats.totals.reflections,
            stats.totals.feed_eaten,
            stats.totals.entities_expired(),
        );
    }
}

/// Fold the current frame into the running observations.
pub fn observe(test_config: &mut TestConfig, pond: &Pond) {
    let bounds = pond.bounds();
    for id in &test_config.tracked {
        let Some(entity) = pond.get(*id) else {
            continue;
        };
        if entity.entity_type() == EntityType::Fish {
            let p = entity.pos;
            let nearest = p.x.min(p.y).min(bounds.x - p.x).min(bounds.y - p.y);
            test_config.min_wall_distance = test_config.min_wall_distance.min(nearest);
        }
    }
}

/// Verify test results at the end
pub fn test_verification_system(
    test_config: Res<TestConfig>,
    pond: Res<Pond>,
    stats: Res<PondStats>,
    config: Res<PondConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    if !test_config.enabled || test_config.frame_count != test_config.frame_limit {
        return;
    }

    println!("\n╔════════════════════════════════════════════╗");
    println!("║           TEST COMPLETE                    ║");
    println!("╚════════════════════════════════════════════╝");
    println!("Test: {}", test_config.test_name);
    println!("Frames: {}", test_config.frame_count);
    println!("Initial entities: {}", test_config.initial_entities);
    println!("Final entities:   {}", pond.len());

    let (passed, message) = verify_test_result(&test_config, &pond, &stats, &config);
    if passed {
        println!("✓ PASS: {message}\n");
    } else {
        println!("✗ FAIL: {message}\n");
    }
    let _ = std::io::stdout().flush();

    exit.write(if passed {
        AppExit::Success
    } else {
        AppExit::from_code(1)
    });
}

/// Decide the scenario outcome: `(passed, explanation)`.
pub fn verify_test_result(
    test_config: &TestConfig,
    pond: &Pond,
    stats: &PondStats,
    config: &PondConfig,
) -> (bool, String) {
    let Some(scenario) = test_config.scenario else {
        return (false, "no scenario configured".to_string());
    };
    let tracked = |i: usize| test_config.tracked.get(i).and_then(|id| pond.get(*id));

    match scenario {
        Scenario::WallTurn => {
            let Some(fish) = tracked(0).and_then(|e| e.as_fish()) else {
                return (false, "tracked fish disappeared".to_string());
            };
            let turned = wrap_angle(fish.angle - PI).abs();
            let clear = test_config.min_wall_distance > 0.0;
            (
                clear && turned > 0.3,
                format!(
                    "closest wall distance {:.1}, heading turned {:.2} rad",
                    test_config.min_wall_distance, turned
                ),
            )
        }
        Scenario::FeedSplash => {
            let splashes = stats.totals.ripples_spawned - stats.totals.reflections;
            let below = tracked(0).map(|e| e.z < config.water.surface_z);
            (
                splashes == 1 && below == Some(true),
                format!("{splashes} splash ripple(s), pellet below surface: {below:?}"),
            )
        }
        Scenario::PadSeparation => {
            let bases: Vec<(Vec2, f32)> = (0..2)
                .filter_map(|i| tracked(i).and_then(|e| e.floating().map(|b| (b.base, e.radius))))
                .collect();
            let [(a, ra), (b, rb)] = bases[..] else {
                return (false, "tracked pads disappeared".to_string());
            };
            let gap = a.distance(b) - (ra + rb);
            (gap >= -1.0, format!("anchor gap {gap:.2} px"))
        }
        Scenario::Reflection => {
            let reflections = stats.totals.reflections;
            (
                reflections == 1,
                format!("{reflections} reflection(s) from one pad"),
            )
        }
        Scenario::FullPond => {
            let fish = pond.count_of(EntityType::Fish);
            let pads = pond.count_of(EntityType::LilyPad);
            let flowers = pond.count_of(EntityType::Flower);
            let finite = pond.entities().iter().all(|e| e.is_well_formed());
            let counts_kept = fish == config.fish.count
                && pads == config.lily_pad.count
                && flowers == config.flower.count;
            (
                finite && counts_kept,
                format!("{fish} fish, {pads} pads, {flowers} flowers, all finite: {finite}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::advance_frame;
    use crate::spatial_partition::SpatialGrid;

    /// Drive a scenario headlessly at a fixed 60 Hz step.
    fn run(scenario: Scenario) -> (bool, String) {
        let mut config = PondConfig::default();
        config.world.seed = Some(11);
        config.sparkle.enabled = false;
        let mut pond = Pond::from_config(&config);
        let mut grid = SpatialGrid::default();
        let mut stats = PondStats::default();
        let mut test_config = TestConfig {
            enabled: true,
            scenario: Some(scenario),
            test_name: scenario.name().to_string(),
            frame_limit: scenario.frame_limit(),
            ..Default::default()
        };
        test_config.tracked = scenario.setup(&mut pond, &config);

        let dt = 1.0 / 60.0;
        for frame in 1..=scenario.frame_limit() {
            stats.begin_frame();
            stats.record(advance_frame(&mut pond, &mut grid, &config, frame as f32 * dt, dt));
            test_config.frame_count = frame;
            observe(&mut test_config, &pond);
        }
        verify_test_result(&test_config, &pond, &stats, &config)
    }

    #[test]
    fn scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::from_name("two_triangles"), None);
    }

    #[test]
    fn feed_splash_scenario_passes() {
        let (passed, message) = run(Scenario::FeedSplash);
        assert!(passed, "{message}");
    }

    #[test]
    fn pad_separation_scenario_passes() {
        let (passed, message) = run(Scenario::PadSeparation);
        assert!(passed, "{message}");
    }

    #[test]
    fn reflection_scenario_passes() {
        let (passed, message) = run(Scenario::Reflection);
        assert!(passed, "{message}");
    }

    #[test]
    fn full_pond_scenario_passes() {
        let (passed, message) = run(Scenario::FullPond);
        assert!(passed, "{message}");
    }
}
