//! Tunable simulation constants.
//!
//! Every number the simulation uses lives in [`SimConfig`]. The defaults are
//! the standard four-player arena. Configs load from RON with fixed-point
//! fields written as plain decimals.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     seed: 42,
//!     supply_cap: 8,
//!     unit: UnitStats(
//!         size: 30.0,
//!         speed: 2.5,
//!         max_health: 100,
//!         attack_damage: 12,
//!         attack_range: 100.0,
//!         attack_cooldown_ms: 900,
//!         acquisition_factor: 1.5,
//!         supply_cost: 1,
//!     ),
//! )
//! ```
//!
//! Omitted fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::components::SimTime;
use crate::error::{GameError, Result};
use crate::geometry::ArenaBounds;
use crate::math::{fixed_decimal_serde, Fixed};

/// Largest arena width or height. Squared distances across the arena stay
/// inside `Fixed`'s range.
pub const MAX_ARENA_EXTENT: i32 = 32_768;

/// Stats given to every unit a bunker produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Edge length of the bounding square.
    #[serde(with = "fixed_decimal_serde")]
    pub size: Fixed,
    /// Distance traveled per tick.
    #[serde(with = "fixed_decimal_serde")]
    pub speed: Fixed,
    /// Starting and maximum health.
    pub max_health: u32,
    /// Damage per shot.
    pub attack_damage: u32,
    /// Edge-to-edge firing range.
    #[serde(with = "fixed_decimal_serde")]
    pub attack_range: Fixed,
    /// Minimum time between shots.
    pub attack_cooldown_ms: SimTime,
    /// Acquisition range as a multiple of the attack range.
    #[serde(with = "fixed_decimal_serde")]
    pub acquisition_factor: Fixed,
    /// Supply held while alive.
    pub supply_cost: u32,
}

impl UnitStats {
    /// Range at which attack-moving units pick targets.
    #[must_use]
    pub fn acquisition_range(&self) -> Fixed {
        self.attack_range * self.acquisition_factor
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            size: Fixed::from_num(30),
            speed: Fixed::from_num(2),
            max_health: 100,
            attack_damage: 10,
            attack_range: Fixed::from_num(100),
            attack_cooldown_ms: 1000,
            acquisition_factor: Fixed::from_num(1.5),
            supply_cost: 1,
        }
    }
}

/// Stats for production structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BunkerStats {
    /// Edge length of the bounding square.
    #[serde(with = "fixed_decimal_serde")]
    pub size: Fixed,
    /// Starting and maximum health.
    pub max_health: u32,
    /// Minimum time between spawn attempts.
    pub spawn_cooldown_ms: SimTime,
    /// Gap between the bunker's right edge and the spawn point.
    #[serde(with = "fixed_decimal_serde")]
    pub spawn_gap: Fixed,
    /// Clearance added to each body's half-size when checking the spawn point.
    #[serde(with = "fixed_decimal_serde")]
    pub obstruction_margin: Fixed,
}

impl Default for BunkerStats {
    fn default() -> Self {
        Self {
            size: Fixed::from_num(80),
            max_health: 500,
            spawn_cooldown_ms: 1500,
            spawn_gap: Fixed::from_num(20),
            obstruction_margin: Fixed::from_num(15),
        }
    }
}

/// Push weights for overlap resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Weight of a unit.
    #[serde(with = "fixed_decimal_serde")]
    pub unit_weight: Fixed,
    /// Weight of a bunker.
    #[serde(with = "fixed_decimal_serde")]
    pub bunker_weight: Fixed,
    /// Maximum jitter applied per axis when two centers coincide.
    #[serde(with = "fixed_decimal_serde")]
    pub jitter: Fixed,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            unit_weight: Fixed::from_num(0.5),
            bunker_weight: Fixed::from_num(0.1),
            jitter: Fixed::from_num(0.1),
        }
    }
}

/// How long transient effects stay in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectLifetimes {
    /// Attack line.
    pub laser_ms: SimTime,
    /// Impact burst.
    pub burst_ms: SimTime,
    /// Command marker.
    pub marker_ms: SimTime,
}

impl Default for EffectLifetimes {
    fn default() -> Self {
        Self {
            laser_ms: 100,
            burst_ms: 150,
            marker_ms: 750,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the collision jitter generator.
    pub seed: u64,
    /// Playfield rectangle.
    pub arena: ArenaBounds,
    /// Time advanced by [`crate::simulation::Simulation::tick`].
    pub tick_duration_ms: SimTime,
    /// Supply cap every player starts with.
    pub supply_cap: u32,
    /// Inset of skirmish bunkers from the arena corners.
    #[serde(with = "fixed_decimal_serde")]
    pub corner_padding: Fixed,
    /// Produced unit stats.
    pub unit: UnitStats,
    /// Bunker stats.
    pub bunker: BunkerStats,
    /// Overlap resolution tuning.
    pub collision: CollisionTuning,
    /// Effect and marker lifetimes.
    pub effects: EffectLifetimes,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            arena: ArenaBounds::from_size(1000, 700),
            tick_duration_ms: 16,
            supply_cap: 5,
            corner_padding: Fixed::from_num(80),
            unit: UnitStats::default(),
            bunker: BunkerStats::default(),
            collision: CollisionTuning::default(),
            effects: EffectLifetimes::default(),
        }
    }
}

impl SimConfig {
    /// Parse a RON config and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.arena.width() <= Fixed::ZERO || self.arena.height() <= Fixed::ZERO {
            return Err(invalid("arena must have positive width and height"));
        }
        let limit = Fixed::from_num(MAX_ARENA_EXTENT);
        if self.arena.width() > limit || self.arena.height() > limit {
            return Err(invalid("arena width and height must not exceed 32768"));
        }
        if self.tick_duration_ms == 0 {
            return Err(invalid("tick_duration_ms must be positive"));
        }
        if self.unit.size <= Fixed::ZERO || self.bunker.size <= Fixed::ZERO {
            return Err(invalid("entity sizes must be positive"));
        }
        if self.unit.speed <= Fixed::ZERO {
            return Err(invalid("unit speed must be positive"));
        }
        if self.unit.max_health == 0 || self.bunker.max_health == 0 {
            return Err(invalid("max health must be positive"));
        }
        if self.unit.attack_range < Fixed::ZERO {
            return Err(invalid("attack range cannot be negative"));
        }
        if self.unit.acquisition_factor < Fixed::ONE {
            return Err(invalid("acquisition factor must be at least 1"));
        }
        if self.collision.unit_weight <= Fixed::ZERO || self.collision.bunker_weight <= Fixed::ZERO
        {
            return Err(invalid("collision weights must be positive"));
        }
        if self.collision.jitter < Fixed::ZERO {
            return Err(invalid("collision jitter cannot be negative"));
        }
        if self.bunker.spawn_gap < Fixed::ZERO || self.bunker.obstruction_margin < Fixed::ZERO {
            return Err(invalid("spawn gap and obstruction margin cannot be negative"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> GameError {
    GameError::InvalidConfig(reason.to_string())
}
