//! Headless runner implementation.
//!
//! [`HeadlessRunner`] owns one [`Simulation`] and drives it either from a
//! JSON-line command stream or for a fixed number of ticks.

use std::io::{self, BufRead, Write};

use arena_core::components::PlayerId;
use arena_core::orders::OrderOutcome;
use arena_core::simulation::Simulation;

use crate::protocol::{Command, Response};
use crate::scenario::{point, Scenario, ScenarioError};

/// Headless runner for scripted play.
pub struct HeadlessRunner {
    sim: Simulation,
    scenario_name: String,
}

impl HeadlessRunner {
    /// Build the scenario's starting arena.
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        Ok(Self {
            sim: scenario.build()?,
            scenario_name: scenario.name.clone(),
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Current state as a protocol response.
    #[must_use]
    pub fn state(&self) -> Response {
        Response::State {
            hash: self.sim.state_hash(),
            snapshot: self.sim.snapshot(),
        }
    }

    /// End-of-run summary.
    #[must_use]
    pub fn summary(&self) -> Response {
        let snapshot = self.sim.snapshot();
        Response::Summary {
            tick: snapshot.tick,
            time: snapshot.time,
            hash: self.sim.state_hash(),
            units: PlayerId::all()
                .map(|player| snapshot.unit_count(player.get()))
                .collect(),
            players: snapshot.players,
        }
    }

    /// Apply one parsed command.
    pub fn handle(&mut self, cmd: Command) -> Response {
        let name = cmd.name();
        match self.apply(cmd) {
            Ok(response) => response,
            Err(message) => {
                tracing::debug!(cmd = name, %message, "Command failed");
                Response::error(message, Some(name))
            }
        }
    }

    fn apply(&mut self, cmd: Command) -> Result<Response, String> {
        let name = cmd.name();
        let player = self.sim.selection().active_player();

        let response = match cmd {
            Command::Tick { count } => {
                for _ in 0..count {
                    self.sim.tick();
                }
                self.state()
            }
            Command::Query => self.state(),
            Command::Hash => Response::StateHash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            },
            Command::Move { units, x, y } => {
                let destination = point(x, y).map_err(|e| e.to_string())?;
                Response::ack(name, self.sim.issue_move(player, &units, destination))
            }
            Command::AttackMove { units, x, y } => {
                let destination = point(x, y).map_err(|e| e.to_string())?;
                Response::ack(name, self.sim.issue_attack_move(player, &units, destination))
            }
            Command::Attack { units, target } => {
                let enemy = self
                    .sim
                    .get_entity(target)
                    .filter(|entity| entity.is_alive() && entity.owner != player)
                    .ok_or_else(|| format!("Entity {target} is not an enemy of player {player}"))?;
                let at = enemy.position;
                match self
                    .sim
                    .issue_attack_or_move(player, &units, &[], at, Some(target))
                {
                    OrderOutcome::Attack { units, .. } => Response::ack(name, units),
                    OrderOutcome::Move { .. } => Response::ack(name, 0),
                }
            }
            Command::Rally { bunkers, x, y } => {
                let rally = point(x, y).map_err(|e| e.to_string())?;
                match self.sim.issue_attack_or_move(player, &[], &bunkers, rally, None) {
                    OrderOutcome::Move { rallies, .. } => Response::ack(name, rallies),
                    OrderOutcome::Attack { .. } => Response::ack(name, 0),
                }
            }
            Command::SelectRect { x1, y1, x2, y2 } => {
                let a = point(x1, y1).map_err(|e| e.to_string())?;
                let b = point(x2, y2).map_err(|e| e.to_string())?;
                Response::ack(name, self.sim.select_in_rect(a, b))
            }
            Command::Order { x, y } => {
                let at = point(x, y).map_err(|e| e.to_string())?;
                let accepted = match self.sim.order_selection_to(at) {
                    Some(OrderOutcome::Attack { units, .. }) => units,
                    Some(OrderOutcome::Move { units, rallies }) => units + rallies,
                    None => 0,
                };
                Response::ack(name, accepted)
            }
            Command::SwitchPlayer { player } => {
                if !self.sim.switch_active_player(player) {
                    return Err(format!("Invalid player ID: {player}"));
                }
                Response::ack(name, 1)
            }
            Command::Quit => Response::Bye,
        };

        Ok(response)
    }

    /// Parse and apply one input line. Blank lines produce no response.
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        Some(match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => Response::error(format!("Parse error: {e}"), None),
        })
    }

    /// Serve a JSON-line session until `quit` or end of input.
    pub fn run_interactive<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write!(
            output,
            "{}",
            Response::ready(self.sim.get_tick(), &self.scenario_name).to_json_line()
        )?;
        output.flush()?;

        for line in input.lines() {
            let Some(response) = self.handle_line(&line?) else {
                continue;
            };
            let done = response == Response::Bye;
            write!(output, "{}", response.to_json_line())?;
            output.flush()?;
            if done {
                tracing::info!(tick = self.sim.get_tick(), "Session closed");
                return Ok(());
            }
        }

        tracing::info!(tick = self.sim.get_tick(), "Input ended");
        Ok(())
    }

    /// Run `ticks` ticks, writing a state line every `every` ticks (0 = never)
    /// and a summary line at the end.
    pub fn run_for<W: Write>(&mut self, ticks: u64, every: u64, mut output: W) -> io::Result<()> {
        for _ in 0..ticks {
            let events = self.sim.tick();
            for id in &events.deaths {
                tracing::debug!(tick = self.sim.get_tick(), entity = id, "Entity died");
            }

            if every > 0 && self.sim.get_tick() % every == 0 {
                write!(output, "{}", self.state().to_json_line())?;
            }
        }

        write!(output, "{}", self.summary().to_json_line())?;
        output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::components::CommandState;
    use arena_core::math::Vec2Fixed;
    use arena_core::snapshot::ArenaSnapshot;
    use std::io::Cursor;

    fn duel_runner() -> HeadlessRunner {
        let scenario = Scenario::from_ron_str(
            r#"Scenario(
                name: "Duel",
                corner_bunkers: false,
                units: [
                    UnitPlacement(player: 1, x: 300.0, y: 350.0),
                    UnitPlacement(player: 2, x: 700.0, y: 350.0),
                ],
            )"#,
        )
        .unwrap();
        HeadlessRunner::new(&scenario).unwrap()
    }

    fn lines(output: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_tick_reports_state() {
        let mut runner = duel_runner();
        let (snapshot, hash) = match runner.handle(Command::Tick { count: 10 }) {
            Response::State { snapshot, hash } => (snapshot, hash),
            other => panic!("expected state, got {other:?}"),
        };
        assert_eq!(snapshot.tick, 10);
        assert_eq!(snapshot.time, 160);
        assert_eq!(hash, runner.simulation().state_hash());
    }

    #[test]
    fn test_move_skips_foreign_units() {
        let mut runner = duel_runner();
        let response = runner.handle(Command::Move {
            units: vec![1, 2],
            x: 300.0,
            y: 100.0,
        });
        assert_eq!(response, Response::ack("move", 1));
        let unit = runner.simulation().get_entity(1).unwrap().as_unit().unwrap();
        assert_eq!(unit.command_state, CommandState::Moving);
        assert_eq!(unit.move_target, Vec2Fixed::from_ints(300, 100));
    }

    #[test]
    fn test_attack_requires_enemy_target() {
        let mut runner = duel_runner();
        let response = runner.handle(Command::Attack {
            units: vec![1],
            target: 1,
        });
        assert!(matches!(response, Response::Error { .. }));

        let response = runner.handle(Command::Attack {
            units: vec![1],
            target: 2,
        });
        assert_eq!(response, Response::ack("attack", 1));
        assert!(runner.simulation().effects().markers().is_empty());
    }

    #[test]
    fn test_switch_player_validates() {
        let mut runner = duel_runner();
        assert!(matches!(
            runner.handle(Command::SwitchPlayer { player: 0 }),
            Response::Error { .. }
        ));
        assert_eq!(
            runner.handle(Command::SwitchPlayer { player: 2 }),
            Response::ack("switch_player", 1)
        );
        let response = runner.handle(Command::AttackMove {
            units: vec![2],
            x: 300.0,
            y: 350.0,
        });
        assert_eq!(response, Response::ack("attack_move", 1));
    }

    #[test]
    fn test_select_then_order() {
        let mut runner = duel_runner();
        assert_eq!(
            runner.handle(Command::SelectRect {
                x1: 0.0,
                y1: 0.0,
                x2: 1000.0,
                y2: 700.0
            }),
            Response::ack("select_rect", 1)
        );
        assert_eq!(
            runner.handle(Command::Order { x: 700.0, y: 350.0 }),
            Response::ack("order", 1)
        );
        let unit = runner.simulation().get_entity(1).unwrap().as_unit().unwrap();
        assert_eq!(unit.target, Some(2));
    }

    #[test]
    fn test_interactive_session() {
        let mut runner = duel_runner();
        let input = Cursor::new(
            "{\"cmd\":\"tick\",\"count\":2}\n\n not json\n{\"cmd\":\"hash\"}\n{\"cmd\":\"quit\"}\n{\"cmd\":\"tick\"}\n",
        );
        let mut output = Vec::new();
        runner.run_interactive(input, &mut output).unwrap();

        let responses = lines(&output);
        let kinds: Vec<&str> = responses
            .iter()
            .map(|value| value["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["ready", "state", "error", "state_hash", "bye"]);
        assert_eq!(responses[1]["tick"], 2);
        assert_eq!(runner.simulation().get_tick(), 2);
    }

    #[test]
    fn test_state_line_parses_back() {
        let runner = duel_runner();
        let line = runner.state().to_json_line();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let snapshot: ArenaSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.entities.len(), 2);
    }

    #[test]
    fn test_run_for_emits_states_and_summary() {
        let mut runner = HeadlessRunner::new(&Scenario::skirmish()).unwrap();
        let mut output = Vec::new();
        runner.run_for(200, 100, &mut output).unwrap();

        let responses = lines(&output);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["type"], "state");
        assert_eq!(responses[1]["tick"], 200);
        assert_eq!(responses[2]["type"], "summary");
        assert_eq!(responses[2]["units"].as_array().unwrap().len(), 4);
    }
}
