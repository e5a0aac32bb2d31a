//! Bunker production decisions.
//!
//! A bunker tries to spawn one unit every `spawn_cooldown`. Once the
//! cooldown has elapsed the attempt is consumed whatever the outcome: a
//! capped or blocked attempt is not retried until the next full cooldown.

use crate::components::{Entity, EntityId, SimTime};
use crate::config::BunkerStats;
use crate::economy::PlayerState;
use crate::math::{Fixed, Vec2Fixed};

/// Outcome of one production check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    /// Bunker is dead or not a bunker.
    Inactive,
    /// Cooldown has not elapsed yet. Nothing changes.
    CoolingDown,
    /// Owner has no supply headroom. The cooldown restarts.
    SupplyCapped,
    /// Something stands on the spawn point. The cooldown restarts.
    Blocked {
        /// First live entity found on the spawn point.
        by: EntityId,
    },
    /// Spawn a unit here. The cooldown restarts.
    Spawn {
        /// Center of the new unit.
        position: Vec2Fixed,
    },
}

impl SpawnDecision {
    /// Whether this outcome consumes the spawn attempt.
    #[must_use]
    pub const fn resets_cooldown(&self) -> bool {
        matches!(
            self,
            Self::SupplyCapped | Self::Blocked { .. } | Self::Spawn { .. }
        )
    }
}

/// Point just right of the bunker where new units appear.
#[must_use]
pub fn spawn_point(bunker: &Entity, stats: &BunkerStats) -> Vec2Fixed {
    Vec2Fixed::new(
        bunker.position.x + bunker.half_size() + stats.spawn_gap,
        bunker.position.y,
    )
}

/// First live entity whose clearance circle (half-size plus `margin`)
/// contains `point`.
#[must_use]
pub fn find_obstruction(point: Vec2Fixed, population: &[Entity], margin: Fixed) -> Option<EntityId> {
    population
        .iter()
        .filter(|entity| entity.is_alive())
        .find(|entity| {
            let clearance = entity.half_size() + margin;
            entity.position.distance_squared(point) < clearance.saturating_mul(clearance)
        })
        .map(|entity| entity.id)
}

/// Decide what `bunker` does this tick.
#[must_use]
pub fn decide_spawn(
    bunker: &Entity,
    supply: &PlayerState,
    unit_cost: u32,
    population: &[Entity],
    stats: &BunkerStats,
    now: SimTime,
) -> SpawnDecision {
    let Some(production) = bunker.as_bunker() else {
        return SpawnDecision::Inactive;
    };
    if !bunker.is_alive() {
        return SpawnDecision::Inactive;
    }

    if now.saturating_sub(production.last_spawn_time) < production.spawn_cooldown {
        return SpawnDecision::CoolingDown;
    }

    if !supply.can_afford(unit_cost) {
        return SpawnDecision::SupplyCapped;
    }

    let position = spawn_point(bunker, stats);
    match find_obstruction(position, population, stats.obstruction_margin) {
        Some(by) => SpawnDecision::Blocked { by },
        None => SpawnDecision::Spawn { position },
    }
}
