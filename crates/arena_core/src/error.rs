//! Error types for the arena simulation.

use thiserror::Error;

use crate::components::{EntityId, PlayerId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all arena simulation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Player id outside 1..=4.
    #[error("Invalid player ID: {0}")]
    InvalidPlayer(u8),

    /// A unit-only operation was addressed to something else.
    #[error("Entity {0} is not a unit")]
    NotAUnit(EntityId),

    /// A bunker-only operation was addressed to something else.
    #[error("Entity {0} is not a bunker")]
    NotABunker(EntityId),

    /// Attack order against itself or a friendly entity.
    #[error("Entity {attacker} cannot target entity {target}")]
    InvalidTarget {
        /// The unit receiving the order.
        attacker: EntityId,
        /// The rejected target.
        target: EntityId,
    },

    /// Spawning would push the owner past its supply cap.
    #[error("Player {player} is supply capped ({current}/{cap})")]
    SupplyCapped {
        /// Owning player.
        player: PlayerId,
        /// Supply in use.
        current: u32,
        /// Supply cap.
        cap: u32,
    },

    /// Config values that the simulation cannot run with.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Config text that failed to parse.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}
