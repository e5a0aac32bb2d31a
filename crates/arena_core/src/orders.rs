//! Player command entry points and the selection context.
//!
//! Low-level orders go through [`Simulation::apply_command`], which reports
//! errors. The `issue_*` methods here are the player-facing facade: they
//! silently skip entities the player cannot command (dead, foreign, wrong
//! kind) and return how many entities actually took the order.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId};
use crate::geometry::overlaps_rect;
use crate::math::Vec2Fixed;
use crate::simulation::Simulation;

/// Order for a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Move to a position, ignoring enemies.
    MoveTo(Vec2Fixed),
    /// Move to a position, engaging enemies on the way.
    AttackMove(Vec2Fixed),
    /// Attack a specific entity.
    Attack(EntityId),
    /// Set a bunker's rally point.
    SetRally(Vec2Fixed),
}

/// View-layer selection: which player is in control and what they picked.
///
/// Ids may go stale between sweeps; every command re-validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    active_player: PlayerId,
    selected: Vec<EntityId>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    /// Player 1 in control, nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active_player: PlayerId::ONE,
            selected: Vec::new(),
        }
    }

    /// Player currently in control.
    #[must_use]
    pub const fn active_player(&self) -> PlayerId {
        self.active_player
    }

    /// Hand control to another player and clear the selection.
    pub fn set_active_player(&mut self, player: PlayerId) {
        self.active_player = player;
        self.selected.clear();
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.selected
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.selected.binary_search(&id).is_ok()
    }

    /// Replace the selection.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.selected = ids.into_iter().collect();
        self.selected.sort_unstable();
        self.selected.dedup();
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids that no longer exist. `removed` must be sorted.
    pub fn remove_all(&mut self, removed: &[EntityId]) {
        self.selected
            .retain(|id| removed.binary_search(id).is_err());
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// What a context order (right click) turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// Units were told to attack an enemy under the cursor.
    Attack {
        /// The enemy.
        target: EntityId,
        /// Units that took the order.
        units: usize,
    },
    /// Units moved and/or bunkers re-rallied to the clicked ground.
    Move {
        /// Units that took the move.
        units: usize,
        /// Bunkers whose rally point changed.
        rallies: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Unit,
    Bunker,
}

impl Simulation {
    fn is_commandable(&self, player: PlayerId, id: EntityId, kind: Kind) -> bool {
        self.get_entity(id).is_some_and(|entity| {
            entity.is_alive()
                && entity.owner == player
                && match kind {
                    Kind::Unit => entity.is_unit(),
                    Kind::Bunker => entity.is_bunker(),
                }
        })
    }

    fn command_each(
        &mut self,
        player: PlayerId,
        ids: &[EntityId],
        kind: Kind,
        command: Command,
    ) -> usize {
        let mut accepted = 0;
        for &id in ids {
            if !self.is_commandable(player, id, kind) {
                tracing::debug!(entity = id, player = %player, "Skipping non-commandable entity");
                continue;
            }
            match self.apply_command(id, command) {
                Ok(()) => accepted += 1,
                Err(err) => tracing::debug!(entity = id, error = %err, "Command rejected"),
            }
        }
        accepted
    }

    /// Plain move for every commandable unit in `units`.
    ///
    /// Leaves a move marker if anything moved.
    pub fn issue_move(&mut self, player: PlayerId, units: &[EntityId], destination: Vec2Fixed) -> usize {
        let moved = self.command_each(player, units, Kind::Unit, Command::MoveTo(destination));
        if moved > 0 {
            let now = self.time();
            self.effects.push_marker(destination, player, false, now);
        }
        moved
    }

    /// Attack-move for every commandable unit in `units`.
    ///
    /// Leaves an attack-move marker if anything was ordered.
    pub fn issue_attack_move(
        &mut self,
        player: PlayerId,
        units: &[EntityId],
        destination: Vec2Fixed,
    ) -> usize {
        let ordered = self.command_each(player, units, Kind::Unit, Command::AttackMove(destination));
        if ordered > 0 {
            let now = self.time();
            self.effects.push_marker(destination, player, true, now);
        }
        ordered
    }

    /// Context order at `point`.
    ///
    /// With a live enemy under the point the units attack it and bunkers are
    /// left alone. Otherwise units move there and bunkers rally there; a move
    /// marker appears only if units moved and no rally point changed.
    pub fn issue_attack_or_move(
        &mut self,
        player: PlayerId,
        units: &[EntityId],
        bunkers: &[EntityId],
        point: Vec2Fixed,
        enemy: Option<EntityId>,
    ) -> OrderOutcome {
        let enemy = enemy.filter(|&id| {
            self.get_entity(id)
                .is_some_and(|entity| entity.is_alive() && entity.owner != player)
        });

        if let Some(target) = enemy {
            let units = self.command_each(player, units, Kind::Unit, Command::Attack(target));
            return OrderOutcome::Attack { target, units };
        }

        let moved = self.command_each(player, units, Kind::Unit, Command::MoveTo(point));
        let rallies = self.command_each(player, bunkers, Kind::Bunker, Command::SetRally(point));
        if moved > 0 && rallies == 0 {
            let now = self.time();
            self.effects.push_marker(point, player, false, now);
        }

        OrderOutcome::Move {
            units: moved,
            rallies,
        }
    }

    /// Topmost live entity under `point` not owned by `player`.
    #[must_use]
    pub fn enemy_at_point(&self, player: PlayerId, point: Vec2Fixed) -> Option<EntityId> {
        self.entities()
            .iter()
            .rev()
            .find(|entity| entity.is_alive() && entity.owner != player && entity.is_under_point(point))
            .map(|entity| entity.id)
    }

    /// Switch the controlling player (1..=4). Invalid ids are ignored.
    pub fn switch_active_player(&mut self, raw: u8) -> bool {
        let Some(player) = PlayerId::new(raw) else {
            tracing::debug!(player = raw, "Ignoring invalid player switch");
            return false;
        };
        self.selection.set_active_player(player);
        true
    }

    /// Click selection: the topmost live entity of the active player under
    /// `point`, or nothing.
    pub fn select_at_point(&mut self, point: Vec2Fixed) -> Option<EntityId> {
        let player = self.selection.active_player();
        let picked = self
            .entities()
            .iter()
            .rev()
            .find(|entity| entity.is_alive() && entity.owner == player && entity.is_under_point(point))
            .map(|entity| entity.id);

        self.selection.replace(picked);
        picked
    }

    /// Drag selection: every live entity of the active player overlapping
    /// the rectangle spanned by `corner_a` and `corner_b`.
    pub fn select_in_rect(&mut self, corner_a: Vec2Fixed, corner_b: Vec2Fixed) -> usize {
        let player = self.selection.active_player();
        let picked: Vec<EntityId> = self
            .entities()
            .iter()
            .filter(|entity| {
                entity.is_alive()
                    && entity.owner == player
                    && overlaps_rect(&entity.bounding_box(), corner_a, corner_b)
            })
            .map(|entity| entity.id)
            .collect();

        let count = picked.len();
        self.selection.replace(picked);
        count
    }

    /// Selected units the active player can command.
    #[must_use]
    pub fn command_units(&self) -> Vec<EntityId> {
        self.selected_of_kind(Kind::Unit)
    }

    /// Selected bunkers the active player can command.
    #[must_use]
    pub fn command_bunkers(&self) -> Vec<EntityId> {
        self.selected_of_kind(Kind::Bunker)
    }

    fn selected_of_kind(&self, kind: Kind) -> Vec<EntityId> {
        let player = self.selection.active_player();
        self.selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.is_commandable(player, id, kind))
            .collect()
    }

    /// Right click with the current selection.
    ///
    /// Returns `None` when the selection holds nothing commandable.
    pub fn order_selection_to(&mut self, point: Vec2Fixed) -> Option<OrderOutcome> {
        let player = self.selection.active_player();
        let units = self.command_units();
        let bunkers = self.command_bunkers();
        if units.is_empty() && bunkers.is_empty() {
            return None;
        }

        let enemy = self.enemy_at_point(player, point);
        Some(self.issue_attack_or_move(player, &units, &bunkers, point, enemy))
    }

    /// Attack-move the selected units.
    pub fn attack_move_selection_to(&mut self, point: Vec2Fixed) -> usize {
        let player = self.selection.active_player();
        let units = self.command_units();
        self.issue_attack_move(player, &units, point)
    }
}
