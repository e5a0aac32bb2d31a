//! Read-only view of the arena for renderers and tooling.
//!
//! Everything is exported as plain numbers (`f64` coordinates, CSS color
//! strings) so a snapshot serializes to JSON without any fixed-point
//! knowledge on the consumer side.

use serde::{Deserialize, Serialize};

use crate::components::{CommandState, Entity, EntityId, EntityKind, SimTime};
use crate::effects::{Effect, EffectKind, Marker};
use crate::simulation::Simulation;

/// Entity kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKindTag {
    /// Mobile unit.
    Unit,
    /// Production structure.
    Bunker,
}

/// One entity as seen by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Unit or bunker.
    pub kind: EntityKindTag,
    /// Owning player number.
    pub owner: u8,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Edge length.
    pub size: f64,
    /// Owner color as CSS.
    pub color: String,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// State machine state (units only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_state: Option<CommandState>,
    /// Rally point (bunkers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rally_point: Option<(f64, f64)>,
    /// Whether the entity is in the current selection.
    pub selected: bool,
}

impl EntitySnapshot {
    fn capture(entity: &Entity, selected: bool) -> Self {
        let (x, y) = entity.position.to_f64();
        let (kind, command_state, rally_point) = match &entity.kind {
            EntityKind::Unit(unit) => (EntityKindTag::Unit, Some(unit.command_state), None),
            EntityKind::Bunker(bunker) => (
                EntityKindTag::Bunker,
                None,
                Some(bunker.rally_point.to_f64()),
            ),
        };

        Self {
            id: entity.id,
            kind,
            owner: entity.owner.get(),
            x,
            y,
            size: entity.size.to_num(),
            color: entity.color().to_string(),
            health: entity.health.current,
            max_health: entity.health.max,
            command_state,
            rally_point,
            selected,
        }
    }
}

/// Supply readout for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player number.
    pub id: u8,
    /// Supply in use.
    pub supply: u32,
    /// Supply cap.
    pub supply_cap: u32,
    /// Player color as CSS.
    pub color: String,
}

/// A combat effect with float coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSnapshot {
    /// Attack line.
    Laser {
        /// Start point.
        from: (f64, f64),
        /// End point.
        to: (f64, f64),
        /// CSS color.
        color: String,
        /// Creation time.
        created_at: SimTime,
    },
    /// Impact burst.
    Burst {
        /// Center.
        at: (f64, f64),
        /// CSS color.
        color: String,
        /// Creation time.
        created_at: SimTime,
    },
}

impl From<&Effect> for EffectSnapshot {
    fn from(effect: &Effect) -> Self {
        let color = effect.color.to_string();
        match effect.kind {
            EffectKind::Laser { from, to } => Self::Laser {
                from: from.to_f64(),
                to: to.to_f64(),
                color,
                created_at: effect.created_at,
            },
            EffectKind::Burst { at } => Self::Burst {
                at: at.to_f64(),
                color,
                created_at: effect.created_at,
            },
        }
    }
}

/// A command marker with float coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSnapshot {
    /// Marker x.
    pub x: f64,
    /// Marker y.
    pub y: f64,
    /// Issuing player.
    pub owner: u8,
    /// Attack-move marker.
    pub attack_move: bool,
    /// Creation time.
    pub created_at: SimTime,
}

impl From<&Marker> for MarkerSnapshot {
    fn from(marker: &Marker) -> Self {
        let (x, y) = marker.position.to_f64();
        Self {
            x,
            y,
            owner: marker.owner.get(),
            attack_move: marker.attack_move,
            created_at: marker.created_at,
        }
    }
}

/// Full read-only arena view for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    /// Tick number.
    pub tick: u64,
    /// Simulation time.
    pub time: SimTime,
    /// Player in control of the view.
    pub active_player: u8,
    /// Entities in id order.
    pub entities: Vec<EntitySnapshot>,
    /// Supply for players 1..=4.
    pub players: Vec<PlayerSnapshot>,
    /// Pending combat effects.
    pub effects: Vec<EffectSnapshot>,
    /// Pending command markers.
    pub markers: Vec<MarkerSnapshot>,
    /// Selected entity ids.
    pub selection: Vec<EntityId>,
}

impl ArenaSnapshot {
    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    /// Count of live units owned by a player.
    #[must_use]
    pub fn unit_count(&self, owner: u8) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.owner == owner && entity.kind == EntityKindTag::Unit)
            .count()
    }
}

impl Simulation {
    /// Capture the current state for presentation.
    #[must_use]
    pub fn snapshot(&self) -> ArenaSnapshot {
        let selection = self.selection();

        ArenaSnapshot {
            tick: self.get_tick(),
            time: self.time(),
            active_player: selection.active_player().get(),
            entities: self
                .entities()
                .iter()
                .map(|entity| EntitySnapshot::capture(entity, selection.contains(entity.id)))
                .collect(),
            players: self
                .players()
                .iter()
                .map(|(player, state)| PlayerSnapshot {
                    id: player.get(),
                    supply: state.current_supply,
                    supply_cap: state.supply_cap,
                    color: player.color().to_string(),
                })
                .collect(),
            effects: self.effects().effects().iter().map(EffectSnapshot::from).collect(),
            markers: self.effects().markers().iter().map(MarkerSnapshot::from).collect(),
            selection: selection.ids().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::config::SimConfig;
    use crate::math::Vec2Fixed;

    #[test]
    fn test_snapshot_of_skirmish() {
        let sim = Simulation::skirmish(SimConfig::default()).unwrap();
        let snapshot = sim.snapshot();

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.active_player, 1);
        assert_eq!(snapshot.entities.len(), 4);
        assert_eq!(snapshot.players.len(), 4);

        let first = &snapshot.entities[0];
        assert_eq!(first.kind, EntityKindTag::Bunker);
        assert_eq!((first.x, first.y), (80.0, 80.0));
        assert_eq!(first.size, 80.0);
        assert_eq!(first.rally_point, Some((500.0, 350.0)));
        assert_eq!(first.command_state, None);
        assert_eq!(first.color, "hsl(170, 50%, 50%)");
        assert!(!first.selected);
    }

    #[test]
    fn test_snapshot_marks_selection_and_units() {
        let mut sim = Simulation::new();
        let unit = sim
            .spawn_unit(PlayerId::ONE, Vec2Fixed::from_ints(100, 100))
            .unwrap();
        sim.select_at_point(Vec2Fixed::from_ints(100, 100));

        let snapshot = sim.snapshot();
        let entity = snapshot.entity(unit).unwrap();
        assert!(entity.selected);
        assert_eq!(entity.command_state, Some(CommandState::Idle));
        assert_eq!(snapshot.selection, vec![unit]);
        assert_eq!(snapshot.unit_count(1), 1);
        assert_eq!(snapshot.players[0].supply, 1);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let sim = Simulation::skirmish(SimConfig::default()).unwrap();
        let json = serde_json::to_string(&sim.snapshot()).unwrap();
        assert!(json.contains("\"kind\":\"bunker\""));
        assert!(json.contains("\"rally_point\":[500.0,350.0]"));
        assert!(!json.contains("command_state"));
    }
}
