//! Test fixtures and helpers.
//!
//! Pre-built arenas and entity layouts for consistent testing. Fixtures
//! panic on setup failure; they are only meant for tests and benches.

use arena_core::components::{EntityId, PlayerId};
use arena_core::config::SimConfig;
use arena_core::geometry::ArenaBounds;
use arena_core::math::Vec2Fixed;
use arena_core::simulation::Simulation;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer position shorthand.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// A 1000x700 arena centered on the origin with room for ten units each.
///
/// Centering keeps small hand-placed scenarios near `(0, 0)` clear of the
/// arena clamp.
#[must_use]
pub fn open_arena_config() -> SimConfig {
    SimConfig {
        arena: ArenaBounds::centered(1000, 700),
        supply_cap: 10,
        ..SimConfig::default()
    }
}

/// Empty simulation on [`open_arena_config`].
#[must_use]
pub fn open_arena() -> Simulation {
    Simulation::with_config(open_arena_config()).expect("open arena config is valid")
}

/// Two idle units facing each other.
#[derive(Debug, Clone)]
pub struct Duel {
    /// The simulation holding both units.
    pub sim: Simulation,
    /// Player one's unit.
    pub left: EntityId,
    /// Player two's unit.
    pub right: EntityId,
}

/// Player one's unit at `left`, player two's at `right`, on an open arena.
#[must_use]
pub fn duel(left: Vec2Fixed, right: Vec2Fixed) -> Duel {
    let mut sim = open_arena();
    let left = sim
        .spawn_unit(PlayerId::ONE, left)
        .expect("duel unit fits supply");
    let right = sim
        .spawn_unit(PlayerId::TWO, right)
        .expect("duel unit fits supply");
    Duel { sim, left, right }
}

/// The standard four-corner skirmish with a given seed.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    let config = SimConfig {
        seed,
        ..SimConfig::default()
    };
    Simulation::skirmish(config).expect("default skirmish config is valid")
}

/// Two squads of `per_side` units on opposite sides, attack-moving into
/// each other. Used for heavier collision and combat load.
#[must_use]
pub fn clash(per_side: u32, seed: u64) -> Simulation {
    let config = SimConfig {
        seed,
        supply_cap: per_side,
        ..open_arena_config()
    };
    let mut sim = Simulation::with_config(config).expect("clash config is valid");

    for row in 0..per_side as i32 {
        let y = -200 + (row % 10) * 40;
        let column = row / 10;
        for (player, x, goal) in [
            (PlayerId::ONE, -400 + column * 40, 400),
            (PlayerId::TWO, 400 - column * 40, -400),
        ] {
            let id = sim
                .spawn_unit(player, pos(x, y))
                .expect("clash unit fits supply");
            sim.issue_attack_move(player, &[id], pos(goal, y));
        }
    }

    sim
}
