//! Headless arena runner for scripted play and CI verification.
//!
//! This crate drives the arena simulation without graphics. It can be
//! controlled via JSON commands on stdin, with arena state on stdout. This
//! enables:
//!
//! - **Scripted play**: a bot or test harness issues orders as any player
//! - **CI verification**: run scenarios and check they replay identically
//! - **Benchmarks**: time long skirmishes without a renderer
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, move, attack, ...)
//! - **stdout**: Snapshots and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p arena_headless -- interactive
//!
//! # Run a scenario
//! cargo run -p arena_headless -- run --scenario scenarios/skirmish.ron --ticks 3600
//!
//! # Verify determinism
//! cargo run -p arena_headless -- verify --runs 8
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{verify_determinism, VerifyReport};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
