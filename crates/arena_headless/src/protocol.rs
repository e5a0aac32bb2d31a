//! JSON protocol for headless arena sessions.
//!
//! The interactive runner communicates via JSON lines (one JSON object per
//! line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Snapshots and responses
//!
//! Orders are issued as the active player, through the same facade a mouse
//! would use: entities the player cannot command are skipped silently and
//! the ack reports how many took the order.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"scenario":"Four-corner skirmish"}
//! -> {"cmd":"tick","count":120}
//! <- {"type":"state","hash":1234,"tick":120,"time":1920,"entities":[...],...}
//! -> {"cmd":"move","units":[5],"x":200,"y":200}
//! <- {"type":"ack","cmd":"move","accepted":1}
//! -> {"cmd":"switch_player","player":2}
//! <- {"type":"ack","cmd":"switch_player","accepted":1}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use arena_core::components::{EntityId, SimTime};
use arena_core::snapshot::{ArenaSnapshot, PlayerSnapshot};
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1) and report state.
    Tick {
        /// Number of ticks.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Report current state without advancing time.
    Query,

    /// Report the state hash only.
    Hash,

    /// Plain move for the listed units.
    Move {
        /// Units to move.
        units: Vec<EntityId>,
        /// Destination x.
        x: f64,
        /// Destination y.
        y: f64,
    },

    /// Attack-move for the listed units.
    AttackMove {
        /// Units to order.
        units: Vec<EntityId>,
        /// Destination x.
        x: f64,
        /// Destination y.
        y: f64,
    },

    /// Order the listed units to attack an enemy entity.
    Attack {
        /// Units to order.
        units: Vec<EntityId>,
        /// Enemy to attack.
        target: EntityId,
    },

    /// Move the rally point of the listed bunkers.
    Rally {
        /// Bunkers to re-rally.
        bunkers: Vec<EntityId>,
        /// Rally x.
        x: f64,
        /// Rally y.
        y: f64,
    },

    /// Drag-select the active player's entities in a rectangle.
    SelectRect {
        /// First corner x.
        x1: f64,
        /// First corner y.
        y1: f64,
        /// Opposite corner x.
        x2: f64,
        /// Opposite corner y.
        y2: f64,
    },

    /// Right click with the current selection.
    Order {
        /// Clicked x.
        x: f64,
        /// Clicked y.
        y: f64,
    },

    /// Hand control to another player (1..=4).
    SwitchPlayer {
        /// Player number.
        player: u8,
    },

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Starting tick.
        tick: u64,
        /// Loaded scenario name.
        scenario: String,
    },

    /// A command was applied.
    Ack {
        /// Command name.
        cmd: String,
        /// Entities that took the order.
        accepted: usize,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if the line parsed.
        #[serde(skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Full arena state.
    State {
        /// State hash at this tick.
        hash: u64,
        /// The snapshot.
        #[serde(flatten)]
        snapshot: ArenaSnapshot,
    },

    /// State hash for determinism checks.
    StateHash {
        /// Tick number.
        tick: u64,
        /// Hash value.
        hash: u64,
    },

    /// End-of-run summary.
    Summary {
        /// Final tick.
        tick: u64,
        /// Final simulation time.
        time: SimTime,
        /// Final state hash.
        hash: u64,
        /// Live units per player, players 1..=4.
        units: Vec<usize>,
        /// Supply readout per player.
        players: Vec<PlayerSnapshot>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64, scenario: &str) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
            scenario: scenario.to_string(),
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, accepted: usize) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            accepted,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Move { .. } => "move",
            Self::AttackMove { .. } => "attack_move",
            Self::Attack { .. } => "attack",
            Self::Rally { .. } => "rally",
            Self::SelectRect { .. } => "select_rect",
            Self::Order { .. } => "order",
            Self::SwitchPlayer { .. } => "switch_player",
            Self::Quit => "quit",
        }
    }
}
