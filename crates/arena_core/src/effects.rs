//! Transient effect and marker feed for presentation layers.
//!
//! Combat pushes a laser and a burst per shot. Commands push ground markers.
//! Nothing in the feed influences the simulation; entries expire by
//! comparing their creation time against a fixed lifetime.

use serde::{Deserialize, Serialize};

use crate::components::{Hsl, PlayerId, SimTime};
use crate::config::EffectLifetimes;
use crate::math::Vec2Fixed;

/// Shape of a combat effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Line from attacker to target.
    Laser {
        /// Attacker center.
        from: Vec2Fixed,
        /// Target center.
        to: Vec2Fixed,
    },
    /// Impact spark at the target.
    Burst {
        /// Target center.
        at: Vec2Fixed,
    },
}

/// A combat effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Shape.
    #[serde(flatten)]
    pub kind: EffectKind,
    /// Draw color.
    pub color: Hsl,
    /// Creation time.
    pub created_at: SimTime,
}

impl Effect {
    /// Lifetime of this effect's kind.
    #[must_use]
    pub const fn lifetime(&self, lifetimes: &EffectLifetimes) -> SimTime {
        match self.kind {
            EffectKind::Laser { .. } => lifetimes.laser_ms,
            EffectKind::Burst { .. } => lifetimes.burst_ms,
        }
    }

    /// Expired once strictly older than its lifetime.
    #[must_use]
    pub const fn is_expired(&self, now: SimTime, lifetimes: &EffectLifetimes) -> bool {
        now.saturating_sub(self.created_at) > self.lifetime(lifetimes)
    }
}

/// Ground marker left by a move or attack-move command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Commanded destination.
    pub position: Vec2Fixed,
    /// Player who issued the command.
    pub owner: PlayerId,
    /// Attack-move rather than plain move.
    pub attack_move: bool,
    /// Creation time.
    pub created_at: SimTime,
}

impl Marker {
    /// Expired once its age reaches the lifetime.
    #[must_use]
    pub const fn is_expired(&self, now: SimTime, lifetimes: &EffectLifetimes) -> bool {
        now.saturating_sub(self.created_at) >= lifetimes.marker_ms
    }
}

/// Append-only effect queues, pruned lazily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectLog {
    effects: Vec<Effect>,
    markers: Vec<Marker>,
    lifetimes: EffectLifetimes,
}

impl EffectLog {
    /// Empty log using the given lifetimes.
    #[must_use]
    pub fn new(lifetimes: EffectLifetimes) -> Self {
        Self {
            effects: Vec::new(),
            markers: Vec::new(),
            lifetimes,
        }
    }

    /// Record one shot: a laser in the attacker's color and a white burst.
    pub fn push_attack(&mut self, from: Vec2Fixed, to: Vec2Fixed, color: Hsl, now: SimTime) {
        self.effects.push(Effect {
            kind: EffectKind::Laser { from, to },
            color,
            created_at: now,
        });
        self.effects.push(Effect {
            kind: EffectKind::Burst { at: to },
            color: Hsl::WHITE,
            created_at: now,
        });
    }

    /// Record a command marker.
    pub fn push_marker(&mut self, position: Vec2Fixed, owner: PlayerId, attack_move: bool, now: SimTime) {
        self.markers.push(Marker {
            position,
            owner,
            attack_move,
            created_at: now,
        });
    }

    /// Drop everything that has expired at `now`.
    pub fn prune(&mut self, now: SimTime) {
        let lifetimes = self.lifetimes;
        self.effects.retain(|effect| !effect.is_expired(now, &lifetimes));
        self.markers.retain(|marker| !marker.is_expired(now, &lifetimes));
    }

    /// Take all pending entries, leaving the log empty.
    pub fn drain(&mut self) -> (Vec<Effect>, Vec<Marker>) {
        (
            std::mem::take(&mut self.effects),
            std::mem::take(&mut self.markers),
        )
    }

    /// Pending combat effects, oldest first.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Pending markers, oldest first.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Configured lifetimes.
    #[must_use]
    pub const fn lifetimes(&self) -> &EffectLifetimes {
        &self.lifetimes
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.markers.is_empty()
    }
}
