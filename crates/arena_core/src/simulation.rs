//! Core simulation loop.
//!
//! [`Simulation`] owns the whole arena: entities, player supply, the effect
//! feed, the selection context and the seeded jitter generator. Each tick
//! runs to completion in a fixed order:
//!
//! 1. **Updates** - every bunker runs production and every unit runs its
//!    command state machine, in id order. Units spawned during this phase
//!    are appended but not updated or targeted until the next tick.
//! 2. **Collision** - overlapping pairs are pushed apart.
//! 3. **Re-clamp** - every unit is pulled back inside the arena.
//! 4. **Death sweep** - dead entities release their supply, leave the
//!    selection, are dropped as targets, and are removed.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`](crate::math::Fixed))
//! - Collision jitter comes from a `ChaCha8Rng` seeded by the config
//! - Consistent iteration order (ascending entity ids)
//!
//! # Example
//!
//! ```
//! use arena_core::components::{CommandState, PlayerId};
//! use arena_core::config::SimConfig;
//! use arena_core::geometry::ArenaBounds;
//! use arena_core::math::Vec2Fixed;
//! use arena_core::orders::Command;
//! use arena_core::simulation::Simulation;
//!
//! let config = SimConfig {
//!     arena: ArenaBounds::centered(1000, 700),
//!     ..SimConfig::default()
//! };
//! let mut sim = Simulation::with_config(config).unwrap();
//!
//! let unit = sim.spawn_unit(PlayerId::ONE, Vec2Fixed::ZERO).unwrap();
//! sim.apply_command(unit, Command::MoveTo(Vec2Fixed::from_ints(10, 0))).unwrap();
//!
//! for _ in 0..5 {
//!     sim.tick();
//! }
//!
//! let entity = sim.get_entity(unit).unwrap();
//! assert_eq!(entity.position, Vec2Fixed::from_ints(10, 0));
//! assert_eq!(entity.as_unit().unwrap().command_state, CommandState::Idle);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::collision;
use crate::combat::{self, DamageEvent, TickContext};
use crate::components::{Bunker, Entity, EntityId, EntityKind, PlayerId, SimTime, Unit};
use crate::config::{SimConfig, UnitStats};
use crate::economy::{PlayerRoster, PlayerState};
use crate::effects::EffectLog;
use crate::error::{GameError, Result};
use crate::math::Vec2Fixed;
use crate::orders::{Command, Selection};
use crate::production::{self, SpawnDecision};

/// Storage for all entities in the simulation.
///
/// A vector kept in ascending id order. Ids are assigned monotonically and
/// never reused, so appending preserves the order and lookups are binary
/// searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStorage {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl Default for EntityStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Build an entity with a fresh id and append it.
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        let mut entity = build(id);
        entity.id = id;
        self.entities.push(entity);
        id
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|index| &self.entities[index])
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(|index| &mut self.entities[index])
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// All entities as a slice, in ascending id order.
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Entity) -> bool) {
        self.entities.retain(keep);
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        crate::components::index_of(&self.entities, id)
    }
}

/// Events generated during a simulation tick.
///
/// These events can be used by a presentation layer to trigger effects,
/// sounds, animations, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Shots fired this tick.
    pub damage_events: Vec<DamageEvent>,
    /// Units produced by bunkers this tick.
    pub spawned: Vec<EntityId>,
    /// Bunkers whose spawn point was obstructed this tick.
    pub blocked_spawns: Vec<EntityId>,
    /// Entities removed by the death sweep.
    pub deaths: Vec<EntityId>,
}

/// The arena simulation.
///
/// This struct owns all game state and provides methods to advance the
/// simulation deterministically. See the [module docs](self) for the
/// order of work inside a tick.
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    time: SimTime,
    config: SimConfig,
    entities: EntityStorage,
    players: PlayerRoster,
    pub(crate) effects: EffectLog,
    pub(crate) selection: Selection,
    rng: ChaCha8Rng,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create an empty simulation with the default config.
    ///
    /// # Example
    ///
    /// ```
    /// use arena_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new();
    /// assert_eq!(sim.get_tick(), 0);
    /// assert!(sim.entities().is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::build(SimConfig::default())
    }

    /// Create an empty simulation after validating `config`.
    pub fn with_config(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// The standard four-player match: one bunker per player, inset from
    /// the arena corners, all rallying to the center.
    pub fn skirmish(config: SimConfig) -> Result<Self> {
        let mut sim = Self::with_config(config)?;
        let arena = sim.config.arena;
        let pad = sim.config.corner_padding;
        let (left, right) = (arena.min.x + pad, arena.max.x - pad);
        let (top, bottom) = (arena.min.y + pad, arena.max.y - pad);

        for (player, x, y) in [
            (PlayerId::ONE, left, top),
            (PlayerId::TWO, right, top),
            (PlayerId::THREE, left, bottom),
            (PlayerId::FOUR, right, bottom),
        ] {
            sim.spawn_bunker(player, Vec2Fixed::new(x, y));
        }

        tracing::info!(
            seed = sim.config.seed,
            supply_cap = sim.config.supply_cap,
            "Skirmish ready"
        );
        Ok(sim)
    }

    fn build(config: SimConfig) -> Self {
        Self {
            tick: 0,
            time: 0,
            players: PlayerRoster::new(config.supply_cap),
            effects: EffectLog::new(config.effects),
            selection: Selection::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            entities: EntityStorage::new(),
            config,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Current simulation time in milliseconds.
    #[must_use]
    pub const fn time(&self) -> SimTime {
        self.time
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get a reference to the entity storage.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Supply pools of all players.
    #[must_use]
    pub const fn players(&self) -> &PlayerRoster {
        &self.players
    }

    /// Supply pool of a raw player number; `None` outside 1..=4.
    #[must_use]
    pub fn player(&self, raw: u8) -> Option<&PlayerState> {
        self.players.lookup(raw)
    }

    /// Change a player's supply cap. Refused below current usage.
    pub fn set_supply_cap(&mut self, player: PlayerId, cap: u32) -> bool {
        self.players.set_supply_cap(player, cap)
    }

    /// Pending effects and markers.
    #[must_use]
    pub const fn effects(&self) -> &EffectLog {
        &self.effects
    }

    /// Mutable effect feed, for consumers that drain it.
    pub fn effects_mut(&mut self) -> &mut EffectLog {
        &mut self.effects
    }

    /// Selection context.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Place a bunker rallying to the arena center.
    pub fn spawn_bunker(&mut self, owner: PlayerId, position: Vec2Fixed) -> EntityId {
        let rally = self.config.arena.center();
        let stats = &self.config.bunker;
        let id = self
            .entities
            .insert_with(|id| Entity::bunker(id, owner, position, rally, stats));
        tracing::debug!(entity = id, player = %owner, "Bunker placed");
        id
    }

    /// Place an idle unit with the configured stats, charging its supply.
    pub fn spawn_unit(&mut self, owner: PlayerId, position: Vec2Fixed) -> Result<EntityId> {
        let stats = self.config.unit.clone();
        self.spawn_unit_with_stats(owner, position, &stats)
    }

    /// Place an idle unit with custom stats, charging its supply.
    pub fn spawn_unit_with_stats(
        &mut self,
        owner: PlayerId,
        position: Vec2Fixed,
        stats: &UnitStats,
    ) -> Result<EntityId> {
        let supply = self.players.get_mut(owner);
        if !supply.charge(stats.supply_cost) {
            return Err(GameError::SupplyCapped {
                player: owner,
                current: supply.current_supply,
                cap: supply.supply_cap,
            });
        }

        let id = self
            .entities
            .insert_with(|id| Entity::unit(id, owner, position, stats));
        tracing::debug!(entity = id, player = %owner, "Unit placed");
        Ok(id)
    }

    /// Apply damage through the normal clamped intake. Returns damage taken.
    ///
    /// The entity stays in place until the next death sweep.
    pub fn damage_entity(&mut self, id: EntityId, amount: u32) -> Result<u32> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?;
        Ok(entity.take_damage(amount))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply a command to an entity.
    ///
    /// Takes effect on the next update pass.
    ///
    /// # Errors
    ///
    /// - [`GameError::EntityNotFound`] if the entity (or attack target) does not exist
    /// - [`GameError::NotAUnit`] / [`GameError::NotABunker`] if the command does not fit the entity
    /// - [`GameError::InvalidTarget`] for attacks on itself, a friendly or a dead entity
    pub fn apply_command(&mut self, entity: EntityId, command: Command) -> Result<()> {
        match command {
            Command::MoveTo(destination) => self.unit_mut(entity)?.move_to(destination),
            Command::AttackMove(destination) => {
                self.unit_mut(entity)?.attack_move_to(destination);
            }
            Command::Attack(target) => {
                let attacker_owner = self
                    .entities
                    .get(entity)
                    .ok_or(GameError::EntityNotFound(entity))?
                    .owner;
                let victim = self
                    .entities
                    .get(target)
                    .ok_or(GameError::EntityNotFound(target))?;
                if target == entity || victim.owner == attacker_owner || !victim.is_alive() {
                    return Err(GameError::InvalidTarget {
                        attacker: entity,
                        target,
                    });
                }
                self.unit_mut(entity)?.attack_unit(target);
            }
            Command::SetRally(point) => self.bunker_mut(entity)?.rally_point = point,
        }
        Ok(())
    }

    fn unit_mut(&mut self, id: EntityId) -> Result<&mut Unit> {
        self.entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?
            .as_unit_mut()
            .ok_or(GameError::NotAUnit(id))
    }

    fn bunker_mut(&mut self, id: EntityId) -> Result<&mut Bunker> {
        self.entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?
            .as_bunker_mut()
            .ok_or(GameError::NotABunker(id))
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the clock by the configured tick duration and run one tick.
    ///
    /// # Example
    ///
    /// ```
    /// use arena_core::simulation::Simulation;
    ///
    /// let mut sim = Simulation::new();
    /// sim.tick();
    /// assert_eq!(sim.get_tick(), 1);
    /// assert_eq!(sim.time(), sim.config().tick_duration_ms);
    /// ```
    pub fn tick(&mut self) -> TickEvents {
        let now = self.time + self.config.tick_duration_ms;
        self.tick_at(now)
    }

    /// Run one tick at an externally supplied time.
    ///
    /// A time earlier than the current clock is treated as the current clock.
    pub fn tick_at(&mut self, now: SimTime) -> TickEvents {
        let now = now.max(self.time);
        self.time = now;
        self.effects.prune(now);

        let mut events = TickEvents::default();

        // 1. Bunker production and unit state machines
        let targeting_len = self.entities.len();
        for index in 0..targeting_len {
            if self.entities.as_slice()[index].is_bunker() {
                self.run_production(index, now, &mut events);
                continue;
            }

            let mut ctx = TickContext {
                now,
                bounds: &self.config.arena,
                targeting_len,
                effects: &mut self.effects,
            };
            if let Some(event) = combat::update_unit(self.entities.as_mut_slice(), index, &mut ctx)
            {
                events.damage_events.push(event);
            }
        }

        // 2. Collision resolution over everyone, including fresh spawns
        collision::resolve_collisions(
            self.entities.as_mut_slice(),
            &self.config.collision,
            &mut self.rng,
        );

        // 3. Keep units inside the arena
        collision::clamp_units(self.entities.as_mut_slice(), &self.config.arena);

        // 4. Death sweep
        events.deaths = self.sweep_dead();

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        #[cfg(feature = "debug-validation")]
        self.assert_invariants();

        events
    }

    fn run_production(&mut self, index: usize, now: SimTime, events: &mut TickEvents) {
        let population = self.entities.as_slice();
        let bunker = &population[index];
        let (bunker_id, owner) = (bunker.id, bunker.owner);
        let Some(rally) = bunker.as_bunker().map(|b| b.rally_point) else {
            return;
        };

        let stats = &self.config.unit;
        let decision = production::decide_spawn(
            bunker,
            self.players.get(owner),
            stats.supply_cost,
            population,
            &self.config.bunker,
            now,
        );

        if decision.resets_cooldown() {
            if let Some(production) = self.entities.as_mut_slice()[index].as_bunker_mut() {
                production.last_spawn_time = now;
            }
        }

        match decision {
            SpawnDecision::Spawn { position } => {
                if !self.players.get_mut(owner).charge(stats.supply_cost) {
                    return;
                }
                let id = self.entities.insert_with(|id| {
                    let mut entity = Entity::unit(id, owner, position, stats);
                    if let Some(unit) = entity.as_unit_mut() {
                        unit.attack_move_to(rally);
                    }
                    entity
                });
                tracing::debug!(bunker = bunker_id, unit = id, player = %owner, "Unit spawned");
                events.spawned.push(id);
            }
            SpawnDecision::Blocked { by } => {
                tracing::trace!(bunker = bunker_id, blocker = by, "Spawn point blocked");
                events.blocked_spawns.push(bunker_id);
            }
            SpawnDecision::SupplyCapped => {
                tracing::trace!(bunker = bunker_id, player = %owner, "Supply capped");
            }
            SpawnDecision::CoolingDown | SpawnDecision::Inactive => {}
        }
    }

    /// Remove dead entities, release their supply and drop references to them.
    ///
    /// Runs at the end of every tick. Calling it again before anything else
    /// dies is a no-op, so supply is never released twice.
    pub fn sweep_dead(&mut self) -> Vec<EntityId> {
        let mut dead = Vec::new();
        for entity in self.entities.iter().filter(|entity| !entity.is_alive()) {
            if let EntityKind::Unit(unit) = &entity.kind {
                self.players.get_mut(entity.owner).release(unit.supply_cost);
            }
            tracing::debug!(entity = entity.id, player = %entity.owner, "Entity removed");
            dead.push(entity.id);
        }

        if dead.is_empty() {
            return dead;
        }

        self.selection.remove_all(&dead);
        self.entities.retain(Entity::is_alive);

        for entity in self.entities.as_mut_slice() {
            let Some(unit) = entity.as_unit_mut() else {
                continue;
            };
            if unit
                .target
                .is_some_and(|target| dead.binary_search(&target).is_ok())
            {
                unit.drop_target();
            }
        }

        dead
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    /// Presentation state (effects, selection) is not included.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.time.hash(&mut hasher);
        self.entities.len().hash(&mut hasher);

        for entity in self.entities.iter() {
            entity.id.hash(&mut hasher);
            entity.owner.hash(&mut hasher);
            entity.position.x.to_bits().hash(&mut hasher);
            entity.position.y.to_bits().hash(&mut hasher);
            entity.size.to_bits().hash(&mut hasher);
            entity.health.hash(&mut hasher);

            match &entity.kind {
                EntityKind::Unit(unit) => {
                    0u8.hash(&mut hasher);
                    unit.command_state.hash(&mut hasher);
                    unit.target.hash(&mut hasher);
                    unit.move_target.hash(&mut hasher);
                    unit.attack_move_target.hash(&mut hasher);
                    unit.last_attack_time.hash(&mut hasher);
                }
                EntityKind::Bunker(bunker) => {
                    1u8.hash(&mut hasher);
                    bunker.rally_point.hash(&mut hasher);
                    bunker.last_spawn_time.hash(&mut hasher);
                }
            }
        }

        for (_, state) in self.players.iter() {
            state.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Supply actually held by a player's live units.
    #[must_use]
    pub fn supply_in_use(&self, player: PlayerId) -> u32 {
        self.entities
            .iter()
            .filter(|entity| entity.owner == player && entity.is_alive())
            .filter_map(|entity| entity.as_unit())
            .map(|unit| unit.supply_cost)
            .sum()
    }

    #[cfg(feature = "debug-validation")]
    fn assert_invariants(&self) {
        for (player, state) in self.players.iter() {
            assert!(
                state.current_supply <= state.supply_cap,
                "player {player} over supply cap"
            );
            assert_eq!(
                state.current_supply,
                self.supply_in_use(player),
                "player {player} supply out of sync"
            );
        }
        for entity in self.entities.iter() {
            assert!(entity.is_alive(), "dead entity {} survived the sweep", entity.id);
            assert!(entity.health.current <= entity.health.max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CommandState;
    use crate::geometry::ArenaBounds;
    use crate::math::Fixed;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_simulation_new() {
        let sim = Simulation::new();
        assert_eq!(sim.get_tick(), 0);
        assert_eq!(sim.time(), 0);
        assert!(sim.entities().is_empty());
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut sim = Simulation::new();
        let a = sim.spawn_unit(PlayerId::ONE, pos(100, 100)).unwrap();
        let b = sim.spawn_unit(PlayerId::ONE, pos(300, 100)).unwrap();
        assert_eq!((a, b), (1, 2));

        sim.damage_entity(b, 1_000).unwrap();
        sim.tick();
        let c = sim.spawn_unit(PlayerId::ONE, pos(300, 100)).unwrap();
        assert_eq!(c, 3);
        assert!(!sim.entities().contains(b));
    }

    #[test]
    fn test_spawn_unit_charges_supply() {
        let config = SimConfig {
            supply_cap: 2,
            ..SimConfig::default()
        };
        let mut sim = Simulation::with_config(config).unwrap();
        sim.spawn_unit(PlayerId::THREE, pos(100, 100)).unwrap();
        sim.spawn_unit(PlayerId::THREE, pos(200, 100)).unwrap();

        let err = sim.spawn_unit(PlayerId::THREE, pos(300, 100)).unwrap_err();
        assert_eq!(
            err,
            GameError::SupplyCapped {
                player: PlayerId::THREE,
                current: 2,
                cap: 2
            }
        );
        assert_eq!(sim.player(3).unwrap().current_supply, 2);
        assert!(sim.player(0).is_none());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let mut config = SimConfig::default();
        config.unit.speed = Fixed::ZERO;
        assert!(matches!(
            Simulation::with_config(config),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_skirmish_places_corner_bunkers() {
        let sim = Simulation::skirmish(SimConfig::default()).unwrap();
        let bunkers: Vec<_> = sim
            .entities()
            .iter()
            .map(|entity| (entity.owner, entity.position))
            .collect();

        assert_eq!(
            bunkers,
            vec![
                (PlayerId::ONE, pos(80, 80)),
                (PlayerId::TWO, pos(920, 80)),
                (PlayerId::THREE, pos(80, 620)),
                (PlayerId::FOUR, pos(920, 620)),
            ]
        );
        for entity in sim.entities().iter() {
            assert_eq!(entity.as_bunker().unwrap().rally_point, pos(500, 350));
        }
        for (_, state) in sim.players().iter() {
            assert_eq!(state.current_supply, 0);
        }
    }

    #[test]
    fn test_apply_command_errors() {
        let mut sim = Simulation::new();
        let unit = sim.spawn_unit(PlayerId::ONE, pos(100, 100)).unwrap();
        let friend = sim.spawn_unit(PlayerId::ONE, pos(200, 100)).unwrap();
        let bunker = sim.spawn_bunker(PlayerId::TWO, pos(500, 500));

        assert_eq!(
            sim.apply_command(99, Command::MoveTo(pos(0, 0))),
            Err(GameError::EntityNotFound(99))
        );
        assert_eq!(
            sim.apply_command(bunker, Command::MoveTo(pos(0, 0))),
            Err(GameError::NotAUnit(bunker))
        );
        assert_eq!(
            sim.apply_command(unit, Command::SetRally(pos(0, 0))),
            Err(GameError::NotABunker(unit))
        );
        assert_eq!(
            sim.apply_command(unit, Command::Attack(friend)),
            Err(GameError::InvalidTarget {
                attacker: unit,
                target: friend
            })
        );
        assert_eq!(
            sim.apply_command(unit, Command::Attack(unit)),
            Err(GameError::InvalidTarget {
                attacker: unit,
                target: unit
            })
        );
        assert!(sim.apply_command(unit, Command::Attack(bunker)).is_ok());
        assert!(sim
            .apply_command(bunker, Command::SetRally(pos(10, 10)))
            .is_ok());
    }

    #[test]
    fn test_tick_at_never_goes_backwards() {
        let mut sim = Simulation::new();
        sim.tick_at(1000);
        sim.tick_at(500);
        assert_eq!(sim.time(), 1000);
        assert_eq!(sim.get_tick(), 2);
    }

    #[test]
    fn test_bunker_spawns_and_charges_supply() {
        let mut sim = Simulation::new();
        let bunker = sim.spawn_bunker(PlayerId::ONE, pos(200, 200));

        let events = sim.tick_at(1499);
        assert!(events.spawned.is_empty());

        let events = sim.tick_at(1500);
        assert_eq!(events.spawned.len(), 1);
        let unit = sim.get_entity(events.spawned[0]).unwrap();
        assert_eq!(unit.owner, PlayerId::ONE);
        assert_eq!(unit.position, pos(260, 200));
        let payload = unit.as_unit().unwrap();
        assert_eq!(payload.command_state, CommandState::AttackMoving);
        assert_eq!(payload.attack_move_target, pos(500, 350));
        assert_eq!(sim.player(1).unwrap().current_supply, 1);
        assert_eq!(
            sim.get_entity(bunker).unwrap().as_bunker().unwrap().last_spawn_time,
            1500
        );
    }

    #[test]
    fn test_supply_capped_bunker_restarts_cooldown() {
        let config = SimConfig {
            supply_cap: 0,
            ..SimConfig::default()
        };
        let mut sim = Simulation::with_config(config).unwrap();
        let bunker = sim.spawn_bunker(PlayerId::TWO, pos(200, 200));

        let events = sim.tick_at(2000);
        assert!(events.spawned.is_empty());
        assert_eq!(
            sim.get_entity(bunker).unwrap().as_bunker().unwrap().last_spawn_time,
            2000
        );
    }

    #[test]
    fn test_blocked_spawn_restarts_cooldown() {
        let mut sim = Simulation::new();
        let bunker = sim.spawn_bunker(PlayerId::ONE, pos(200, 200));
        sim.spawn_unit(PlayerId::TWO, pos(262, 200)).unwrap();

        let events = sim.tick_at(1500);
        assert!(events.spawned.is_empty());
        assert_eq!(events.blocked_spawns, vec![bunker]);
        assert_eq!(
            sim.get_entity(bunker).unwrap().as_bunker().unwrap().last_spawn_time,
            1500
        );
        assert_eq!(sim.player(1).unwrap().current_supply, 0);
    }

    #[test]
    fn test_death_sweep_releases_supply_once() {
        let mut sim = Simulation::new();
        let unit = sim.spawn_unit(PlayerId::FOUR, pos(300, 300)).unwrap();
        sim.spawn_unit(PlayerId::FOUR, pos(600, 300)).unwrap();
        assert_eq!(sim.player(4).unwrap().current_supply, 2);

        sim.damage_entity(unit, 500).unwrap();
        assert_eq!(sim.sweep_dead(), vec![unit]);
        assert_eq!(sim.player(4).unwrap().current_supply, 1);

        assert!(sim.sweep_dead().is_empty());
        assert_eq!(sim.player(4).unwrap().current_supply, 1);
        assert!(sim.get_entity(unit).is_none());
    }

    #[test]
    fn test_death_sweep_clears_targets_and_selection() {
        let mut sim = Simulation::new();
        let hunter = sim.spawn_unit(PlayerId::ONE, pos(100, 300)).unwrap();
        let prey = sim.spawn_unit(PlayerId::TWO, pos(600, 300)).unwrap();
        sim.apply_command(hunter, Command::Attack(prey)).unwrap();
        sim.switch_active_player(2);
        sim.select_at_point(pos(600, 300));
        assert!(sim.selection().contains(prey));

        sim.damage_entity(prey, 1_000).unwrap();
        let events = sim.tick();

        assert_eq!(events.deaths, vec![prey]);
        assert!(sim.selection().is_empty());
        let unit = sim.get_entity(hunter).unwrap().as_unit().unwrap();
        assert_eq!(unit.target, None);
        assert_eq!(unit.command_state, CommandState::Idle);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = Simulation::skirmish(SimConfig::default()).unwrap();
        let mut b = Simulation::skirmish(SimConfig::default()).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());

        a.tick();
        assert_ne!(a.state_hash(), b.state_hash());
        b.tick();
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_units_are_clamped_after_collision() {
        let config = SimConfig {
            arena: ArenaBounds::from_size(200, 200),
            ..SimConfig::default()
        };
        let mut sim = Simulation::with_config(config).unwrap();
        let a = sim.spawn_unit(PlayerId::ONE, pos(15, 100)).unwrap();
        sim.spawn_unit(PlayerId::ONE, pos(25, 100)).unwrap();

        sim.tick();
        assert_eq!(sim.get_entity(a).unwrap().position.x, Fixed::from_num(15));
    }
}
