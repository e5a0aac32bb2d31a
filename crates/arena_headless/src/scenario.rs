//! Scenario loading and configuration.
//!
//! Scenarios define the starting arena for headless runs: the simulation
//! config, whether the four corner bunkers are placed, extra bunkers and
//! units, and per-player supply caps.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Crowded center",
//!     config: SimConfig(seed: 7, supply_cap: 8),
//!     units: [
//!         UnitPlacement(player: 1, x: 480.0, y: 350.0, count: 3),
//!         UnitPlacement(player: 2, x: 520.0, y: 350.0, attack_move_to: Some((80.0, 80.0))),
//!     ],
//!     supply_caps: [(4, 2)],
//! )
//! ```

use std::path::Path;

use arena_core::components::{EntityId, PlayerId};
use arena_core::config::SimConfig;
use arena_core::error::GameError;
use arena_core::math::{Fixed, Vec2Fixed};
use arena_core::orders::Command;
use arena_core::simulation::Simulation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Values the arena cannot be built from.
    #[error("Invalid scenario data: {0}")]
    InvalidData(String),
    /// The simulation rejected a placement or the config.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// An extra bunker placed at setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunkerPlacement {
    /// Owning player (1..=4).
    pub player: u8,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Rally point; the arena center when omitted.
    #[serde(default)]
    pub rally: Option<(f64, f64)>,
}

/// One or more units placed at setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Owning player (1..=4).
    pub player: u8,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// How many units to stack at this point.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Initial attack-move order.
    #[serde(default)]
    pub attack_move_to: Option<(f64, f64)>,
}

fn default_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Simulation constants.
    #[serde(default)]
    pub config: SimConfig,
    /// Place the standard four corner bunkers.
    #[serde(default = "default_true")]
    pub corner_bunkers: bool,
    /// Additional bunkers.
    #[serde(default)]
    pub bunkers: Vec<BunkerPlacement>,
    /// Starting units. They count against supply.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Per-player supply caps overriding `config.supply_cap`, as `(player, cap)`.
    #[serde(default)]
    pub supply_caps: Vec<(u8, u32)>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Load `path` if given, otherwise the standard skirmish.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ScenarioError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::skirmish()),
        }
    }

    /// The standard four-corner skirmish with default constants.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Four-corner skirmish".to_string(),
            description: "One bunker per player, all rallying to the center".to_string(),
            config: SimConfig::default(),
            corner_bunkers: true,
            bunkers: Vec::new(),
            units: Vec::new(),
            supply_caps: Vec::new(),
        }
    }

    /// Same scenario with a different jitter seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build the starting simulation.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let config = self.config.clone();
        let mut sim = if self.corner_bunkers {
            Simulation::skirmish(config)?
        } else {
            Simulation::with_config(config)?
        };

        for &(raw, cap) in &self.supply_caps {
            let player = PlayerId::try_from(raw)?;
            if !sim.set_supply_cap(player, cap) {
                return Err(ScenarioError::InvalidData(format!(
                    "supply cap {cap} for player {player} is below its starting supply"
                )));
            }
        }

        for bunker in &self.bunkers {
            let player = PlayerId::try_from(bunker.player)?;
            let id = sim.spawn_bunker(player, point(bunker.x, bunker.y)?);
            if let Some((x, y)) = bunker.rally {
                sim.apply_command(id, Command::SetRally(point(x, y)?))?;
            }
        }

        for placement in &self.units {
            let player = PlayerId::try_from(placement.player)?;
            let position = point(placement.x, placement.y)?;
            let order = placement
                .attack_move_to
                .map(|(x, y)| point(x, y))
                .transpose()?;

            for _ in 0..placement.count {
                let id: EntityId = sim.spawn_unit(player, position)?;
                if let Some(destination) = order {
                    sim.apply_command(id, Command::AttackMove(destination))?;
                }
            }
        }

        tracing::info!(
            scenario = %self.name,
            entities = sim.entities().len(),
            seed = self.config.seed,
            "Scenario built"
        );
        Ok(sim)
    }
}

/// Convert protocol or scenario coordinates to a fixed-point position.
pub fn point(x: f64, y: f64) -> Result<Vec2Fixed, ScenarioError> {
    match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
        (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
        _ => Err(ScenarioError::InvalidData(format!(
            "coordinates ({x}, {y}) are out of range"
        ))),
    }
}
