//! # Arena Core
//!
//! Deterministic combat simulation for a four-player top-down arena.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (collision jitter uses a seeded generator)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and batch verification
//! - Determinism testing via state hashes
//! - Any presentation layer on top of [`snapshot`]
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point math utilities
//! - [`geometry`] - Bounding squares, arena bounds, nearest-enemy search
//! - [`components`] - Units, bunkers and players
//! - [`combat`] - Per-unit command state machine
//! - [`production`] - Bunker spawning decisions
//! - [`collision`] - Overlap resolution
//! - [`simulation`] - Tick orchestration
//! - [`orders`] - Player commands and selection
//! - [`snapshot`] - Read-only render view

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod collision;
pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod math;
pub mod orders;
pub mod production;
pub mod simulation;
pub mod snapshot;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::DamageEvent;
    pub use crate::components::*;
    pub use crate::config::{BunkerStats, CollisionTuning, EffectLifetimes, SimConfig, UnitStats};
    pub use crate::economy::{PlayerRoster, PlayerState};
    pub use crate::effects::{Effect, EffectKind, EffectLog, Marker};
    pub use crate::error::{GameError, Result};
    pub use crate::geometry::ArenaBounds;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::orders::{Command, OrderOutcome, Selection};
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::snapshot::ArenaSnapshot;
}
