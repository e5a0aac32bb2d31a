//! Supply accounting.
//!
//! Each player has a supply pool that caps how many units it can field at
//! once. Supply is charged exactly when a unit is created and released
//! exactly once when the death sweep removes it.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;

/// Per-player supply pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerState {
    /// Maximum supply the player may have in use.
    pub supply_cap: u32,
    /// Supply held by the player's live units.
    pub current_supply: u32,
}

impl PlayerState {
    /// Create an empty pool with the given cap.
    #[must_use]
    pub const fn new(supply_cap: u32) -> Self {
        Self {
            supply_cap,
            current_supply: 0,
        }
    }

    /// Remaining headroom below the cap.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.supply_cap.saturating_sub(self.current_supply)
    }

    /// Check if a unit of the given cost fits under the cap.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        cost <= self.available()
    }

    /// Charge supply if it fits.
    ///
    /// Returns true if the charge succeeded.
    pub fn charge(&mut self, cost: u32) -> bool {
        if self.can_afford(cost) {
            self.current_supply += cost;
            true
        } else {
            false
        }
    }

    /// Return supply to the pool, flooring at zero.
    pub fn release(&mut self, cost: u32) {
        self.current_supply = self.current_supply.saturating_sub(cost);
    }
}

/// Supply pools for all four players.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRoster {
    players: [PlayerState; PlayerId::COUNT],
}

impl PlayerRoster {
    /// Every player starts empty with the same cap.
    #[must_use]
    pub const fn new(supply_cap: u32) -> Self {
        Self {
            players: [PlayerState::new(supply_cap); PlayerId::COUNT],
        }
    }

    /// Pool for a validated player.
    #[must_use]
    pub const fn get(&self, player: PlayerId) -> &PlayerState {
        &self.players[player.index()]
    }

    /// Mutable pool for a validated player.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player.index()]
    }

    /// Pool for a raw player number; `None` outside 1..=4.
    #[must_use]
    pub fn lookup(&self, raw: u8) -> Option<&PlayerState> {
        PlayerId::new(raw).map(|player| self.get(player))
    }

    /// Change a player's cap.
    ///
    /// Refused (returns false) if the new cap is below supply already in use.
    pub fn set_supply_cap(&mut self, player: PlayerId, cap: u32) -> bool {
        let state = self.get_mut(player);
        if cap < state.current_supply {
            return false;
        }
        state.supply_cap = cap;
        true
    }

    /// Iterate pools in player order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerState)> {
        PlayerId::all().zip(self.players.iter())
    }
}

impl Default for PlayerRoster {
    fn default() -> Self {
        Self::new(0)
    }
}
