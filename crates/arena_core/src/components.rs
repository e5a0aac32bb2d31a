//! Entity model shared by units and bunkers.
//!
//! Components are plain data. Per-tick behavior lives in [`crate::combat`],
//! [`crate::production`] and [`crate::collision`]; the only methods here are
//! state mutations that every caller must perform the same way (damage
//! intake, command entry points, target bookkeeping).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{BunkerStats, UnitStats};
use crate::error::GameError;
use crate::geometry::{self, SquareBox};
use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for entities. Assigned monotonically, never reused.
pub type EntityId = u64;

/// Simulation timestamp in milliseconds.
pub type SimTime = u64;

// ============================================================================
// Players
// ============================================================================

/// One of the four arena players (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// Number of player slots in an arena.
    pub const COUNT: usize = 4;

    /// Player 1 (top-left corner in a skirmish).
    pub const ONE: Self = Self(1);
    /// Player 2 (top-right corner in a skirmish).
    pub const TWO: Self = Self(2);
    /// Player 3 (bottom-left corner in a skirmish).
    pub const THREE: Self = Self(3);
    /// Player 4 (bottom-right corner in a skirmish).
    pub const FOUR: Self = Self(4);

    /// Validate a raw player number.
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= 1 && raw as usize <= Self::COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// The raw player number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// All players in id order.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::ONE, Self::TWO, Self::THREE, Self::FOUR].into_iter()
    }

    /// Presentation color for this player.
    #[must_use]
    pub const fn color(self) -> Hsl {
        match self.0 {
            1 => Hsl::new(170, 50, 50),
            2 => Hsl::new(30, 60, 55),
            3 => Hsl::new(260, 45, 60),
            _ => Hsl::new(330, 50, 60),
        }
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = GameError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(GameError::InvalidPlayer(raw))
    }
}

impl From<PlayerId> for u8 {
    fn from(player: PlayerId) -> Self {
        player.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HSL color, presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees.
    pub hue: u16,
    /// Saturation percent.
    pub saturation: u8,
    /// Lightness percent.
    pub lightness: u8,
}

impl Hsl {
    /// Create a color.
    #[must_use]
    pub const fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Pure white.
    pub const WHITE: Self = Self::new(0, 0, 100);
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }
}

// ============================================================================
// Units
// ============================================================================

/// What a unit is currently trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Resting. Does nothing until commanded.
    #[default]
    Idle,
    /// Walking to the movement target, ignoring enemies.
    Moving,
    /// Chasing and shooting a specific target.
    Attacking,
    /// Walking to the attack-move target, engaging anything in acquisition range.
    AttackMoving,
}

/// Mobile combat unit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Current movement destination.
    pub move_target: Vec2Fixed,
    /// Destination to resume after an attack-move engagement.
    pub attack_move_target: Vec2Fixed,
    /// Maximum distance traveled per tick.
    #[serde(with = "crate::math::fixed_decimal_serde")]
    pub speed: Fixed,
    /// Damage per shot.
    pub attack_damage: u32,
    /// Edge-to-edge firing range.
    #[serde(with = "crate::math::fixed_decimal_serde")]
    pub attack_range: Fixed,
    /// Edge-to-edge range at which attack-moving units pick targets.
    #[serde(with = "crate::math::fixed_decimal_serde")]
    pub acquisition_range: Fixed,
    /// Minimum time between shots.
    pub attack_cooldown: SimTime,
    /// Time of the last shot.
    pub last_attack_time: SimTime,
    /// State machine state.
    pub command_state: CommandState,
    /// Current target. Only meaningful while that entity is alive.
    pub target: Option<EntityId>,
    /// Supply charged to the owner while alive.
    pub supply_cost: u32,
}

impl Unit {
    /// Create an idle unit standing at `position`.
    #[must_use]
    pub fn from_stats(position: Vec2Fixed, stats: &UnitStats) -> Self {
        Self {
            move_target: position,
            attack_move_target: position,
            speed: stats.speed,
            attack_damage: stats.attack_damage,
            attack_range: stats.attack_range,
            acquisition_range: stats.acquisition_range(),
            attack_cooldown: stats.attack_cooldown_ms,
            last_attack_time: 0,
            command_state: CommandState::Idle,
            target: None,
            supply_cost: stats.supply_cost,
        }
    }

    /// Plain move: walk to `destination` and ignore enemies.
    pub fn move_to(&mut self, destination: Vec2Fixed) {
        self.command_state = CommandState::Moving;
        self.target = None;
        self.move_target = destination;
        self.attack_move_target = destination;
    }

    /// Attack-move: walk to `destination`, engaging enemies found on the way.
    pub fn attack_move_to(&mut self, destination: Vec2Fixed) {
        self.command_state = CommandState::AttackMoving;
        self.target = None;
        self.attack_move_target = destination;
        self.move_target = destination;
    }

    /// Focus a specific entity.
    pub fn attack_unit(&mut self, target: EntityId) {
        self.command_state = CommandState::Attacking;
        self.target = Some(target);
    }

    /// Forget the current target; a unit that only existed to attack it goes idle.
    pub fn drop_target(&mut self) {
        self.target = None;
        if self.command_state == CommandState::Attacking {
            self.command_state = CommandState::Idle;
        }
    }
}

// ============================================================================
// Bunkers
// ============================================================================

/// Stationary production structure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bunker {
    /// Where freshly produced units attack-move to.
    pub rally_point: Vec2Fixed,
    /// Minimum time between spawn attempts.
    pub spawn_cooldown: SimTime,
    /// Time of the last spawn attempt that passed the cooldown.
    pub last_spawn_time: SimTime,
}

impl Bunker {
    /// Create a bunker that rallies to `rally_point`.
    #[must_use]
    pub fn from_stats(rally_point: Vec2Fixed, stats: &BunkerStats) -> Self {
        Self {
            rally_point,
            spawn_cooldown: stats.spawn_cooldown_ms,
            last_spawn_time: 0,
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Kind-specific payload of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    /// Mobile combat unit.
    Unit(Unit),
    /// Stationary production structure.
    Bunker(Bunker),
}

/// A simulated body: a square of edge `size` centered on `position`.
///
/// Dead entities (health 0) stay in the population until the end-of-tick
/// death sweep so that every update in a tick sees the same membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Center of the bounding square.
    pub position: Vec2Fixed,
    /// Edge length of the bounding square.
    #[serde(with = "crate::math::fixed_decimal_serde")]
    pub size: Fixed,
    /// Hit points.
    pub health: Health,
    /// Unit or bunker payload.
    pub kind: EntityKind,
}

impl Entity {
    /// Build a unit entity.
    #[must_use]
    pub fn unit(id: EntityId, owner: PlayerId, position: Vec2Fixed, stats: &UnitStats) -> Self {
        Self {
            id,
            owner,
            position,
            size: stats.size,
            health: Health::new(stats.max_health),
            kind: EntityKind::Unit(Unit::from_stats(position, stats)),
        }
    }

    /// Build a bunker entity.
    #[must_use]
    pub fn bunker(
        id: EntityId,
        owner: PlayerId,
        position: Vec2Fixed,
        rally_point: Vec2Fixed,
        stats: &BunkerStats,
    ) -> Self {
        Self {
            id,
            owner,
            position,
            size: stats.size,
            health: Health::new(stats.max_health),
            kind: EntityKind::Bunker(Bunker::from_stats(rally_point, stats)),
        }
    }

    /// Alive means health above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Half of the edge length.
    #[must_use]
    pub fn half_size(&self) -> Fixed {
        self.size / Fixed::from_num(2)
    }

    /// Axis-aligned bounding square.
    #[must_use]
    pub fn bounding_box(&self) -> SquareBox {
        SquareBox::new(self.position, self.size)
    }

    /// Whether `point` lies inside this entity's square (edges included).
    #[must_use]
    pub fn is_under_point(&self, point: Vec2Fixed) -> bool {
        geometry::is_under_point(&self.bounding_box(), point)
    }

    /// Apply damage, clamping health at zero. Returns damage actually taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health.apply_damage(amount)
    }

    /// Presentation color derived from the owner.
    #[must_use]
    pub const fn color(&self) -> Hsl {
        self.owner.color()
    }

    /// Whether this is a unit.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self.kind, EntityKind::Unit(_))
    }

    /// Whether this is a bunker.
    #[must_use]
    pub const fn is_bunker(&self) -> bool {
        matches!(self.kind, EntityKind::Bunker(_))
    }

    /// Unit payload, if any.
    #[must_use]
    pub const fn as_unit(&self) -> Option<&Unit> {
        match &self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Bunker(_) => None,
        }
    }

    /// Mutable unit payload, if any.
    pub fn as_unit_mut(&mut self) -> Option<&mut Unit> {
        match &mut self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Bunker(_) => None,
        }
    }

    /// Bunker payload, if any.
    #[must_use]
    pub const fn as_bunker(&self) -> Option<&Bunker> {
        match &self.kind {
            EntityKind::Bunker(bunker) => Some(bunker),
            EntityKind::Unit(_) => None,
        }
    }

    /// Mutable bunker payload, if any.
    pub fn as_bunker_mut(&mut self) -> Option<&mut Bunker> {
        match &mut self.kind {
            EntityKind::Bunker(bunker) => Some(bunker),
            EntityKind::Unit(_) => None,
        }
    }

    /// Current attack target of a unit.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.as_unit().and_then(|unit| unit.target)
    }
}

/// Index of `id` in a population slice ordered by id.
#[must_use]
pub fn index_of(population: &[Entity], id: EntityId) -> Option<usize> {
    population.binary_search_by_key(&id, |entity| entity.id).ok()
}

/// Index of `id` if that entity is present and alive.
#[must_use]
pub fn live_index_of(population: &[Entity], id: EntityId) -> Option<usize> {
    index_of(population, id).filter(|&index| population[index].is_alive())
}
