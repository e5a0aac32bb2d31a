//! Per-unit command state machine: targeting, shooting and movement.
//!
//! [`update_unit`] runs once per unit per tick. It works on the whole
//! population slice by index so that the attacker and its target can be
//! read and written in the same pass without holding overlapping borrows.
//!
//! Ranges are edge-to-edge: a unit with attack range `r` can hit a target
//! whose center is within `r + (own size + target size) / 2`.

use serde::{Deserialize, Serialize};

use crate::components::{live_index_of, CommandState, Entity, EntityId, EntityKind, SimTime};
use crate::effects::EffectLog;
use crate::geometry::{find_nearest_enemy_in_range, ArenaBounds};
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// Damage dealt by one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// The entity that fired.
    pub attacker: EntityId,
    /// The entity that was hit.
    pub target: EntityId,
    /// Health actually removed.
    pub damage: u32,
    /// Whether the shot brought the target to zero health.
    pub killed: bool,
}

/// Shared inputs for one tick's unit updates.
pub struct TickContext<'a> {
    /// Current simulation time.
    pub now: SimTime,
    /// Arena used for movement clamping.
    pub bounds: &'a ArenaBounds,
    /// Entities at indices below this existed before the tick began and are
    /// the only ones considered when acquiring new targets.
    pub targeting_len: usize,
    /// Sink for laser and burst effects.
    pub effects: &'a mut EffectLog,
}

/// Advance the unit at `index` by one tick.
///
/// Bunkers and out-of-range indices are ignored. Returns the shot fired this
/// tick, if any.
pub fn update_unit(
    population: &mut [Entity],
    index: usize,
    ctx: &mut TickContext<'_>,
) -> Option<DamageEvent> {
    let alive = population.get(index)?.is_alive();
    let unit = population[index].as_unit_mut()?;
    if !alive {
        unit.command_state = CommandState::Idle;
        return None;
    }

    let current_target = unit.target;
    let target_index = current_target.and_then(|id| live_index_of(population, id));
    if current_target.is_some() && target_index.is_none() {
        if let Some(unit) = population[index].as_unit_mut() {
            unit.drop_target();
        }
    }

    let state = population[index].as_unit()?.command_state;
    match state {
        CommandState::Idle => None,
        CommandState::Moving => {
            let unit = population[index].as_unit_mut()?;
            unit.target = None;
            let destination = unit.move_target;
            advance(&mut population[index], destination, ctx.bounds);
            None
        }
        CommandState::Attacking => {
            let Some(target_index) = target_index else {
                if let Some(unit) = population[index].as_unit_mut() {
                    unit.command_state = CommandState::Idle;
                }
                return None;
            };
            engage(population, index, target_index, ctx)
        }
        CommandState::AttackMoving => {
            if let Some(target_index) = target_index {
                return engage(population, index, target_index, ctx);
            }

            let seeker = &population[index];
            let range = seeker.as_unit()?.acquisition_range;
            let candidates = &population[..ctx.targeting_len.min(population.len())];
            let found = find_nearest_enemy_in_range(seeker, range, candidates)
                .and_then(|id| live_index_of(population, id));

            if let Some(enemy_index) = found {
                let enemy_id = population[enemy_index].id;
                population[index].as_unit_mut()?.target = Some(enemy_id);
                tracing::trace!(unit = population[index].id, enemy = enemy_id, "Acquired target");
                return engage(population, index, enemy_index, ctx);
            }

            let unit = population[index].as_unit_mut()?;
            let destination = unit.attack_move_target;
            unit.move_target = destination;
            advance(&mut population[index], destination, ctx.bounds);
            None
        }
    }
}

/// Shoot the target if it is in range and the weapon is ready, otherwise chase it.
fn engage(
    population: &mut [Entity],
    attacker_index: usize,
    target_index: usize,
    ctx: &mut TickContext<'_>,
) -> Option<DamageEvent> {
    let target_position = population[target_index].position;
    let target_half = population[target_index].half_size();
    let target_id = population[target_index].id;

    let attacker = &mut population[attacker_index];
    let attacker_id = attacker.id;
    let attacker_position = attacker.position;
    let reach_offset = attacker.half_size() + target_half;
    let color = attacker.color();
    let unit = attacker.as_unit_mut()?;

    let effective_range = unit.attack_range + reach_offset;
    let dist_sq = attacker_position.distance_squared(target_position);

    if dist_sq > effective_range.saturating_mul(effective_range) {
        unit.move_target = target_position;
        move_toward(attacker, target_position, ctx.bounds);
        return None;
    }

    unit.move_target = attacker_position;
    if ctx.now.saturating_sub(unit.last_attack_time) < unit.attack_cooldown {
        return None;
    }

    let damage = unit.attack_damage;
    unit.last_attack_time = ctx.now;

    let target = &mut population[target_index];
    let dealt = target.take_damage(damage);
    let killed = !target.is_alive();
    ctx.effects
        .push_attack(attacker_position, target_position, color, ctx.now);

    if killed {
        tracing::debug!(attacker = attacker_id, target = target_id, "Target destroyed");
    }

    Some(DamageEvent {
        attacker: attacker_id,
        target: target_id,
        damage: dealt,
        killed,
    })
}

/// Step toward `destination`, going idle on exact arrival.
fn advance(entity: &mut Entity, destination: Vec2Fixed, bounds: &ArenaBounds) {
    move_toward(entity, destination, bounds);

    let arrived = entity.position == destination;
    if let Some(unit) = entity.as_unit_mut() {
        if arrived {
            unit.command_state = CommandState::Idle;
        }
    }
}

/// One movement step of a unit toward `target`, then clamp into the arena.
pub fn move_toward(entity: &mut Entity, target: Vec2Fixed, bounds: &ArenaBounds) {
    let half = entity.half_size();
    let Entity { position, kind, .. } = entity;
    let EntityKind::Unit(unit) = kind else {
        return;
    };

    *position = bounds.clamp(movement_step(*position, target, unit.speed), half);
}

/// Position after moving at most `speed` from `from` toward `to`.
///
/// Snaps exactly onto `to` once it is within one step.
#[must_use]
pub fn movement_step(from: Vec2Fixed, to: Vec2Fixed, speed: Fixed) -> Vec2Fixed {
    if from == to {
        return from;
    }

    let delta = to - from;
    let dist_sq = delta.dot(delta);
    if dist_sq <= speed.saturating_mul(speed) {
        return to;
    }

    let dist = fixed_sqrt(dist_sq);
    if dist == Fixed::ZERO {
        return to;
    }

    from + Vec2Fixed::new(delta.x * speed / dist, delta.y * speed / dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::config::{EffectLifetimes, UnitStats};

    fn unit(id: EntityId, owner: PlayerId, x: i32, y: i32) -> Entity {
        Entity::unit(id, owner, Vec2Fixed::from_ints(x, y), &UnitStats::default())
    }

    fn run(population: &mut [Entity], index: usize, now: SimTime) -> (Option<DamageEvent>, EffectLog) {
        let bounds = ArenaBounds::centered(2000, 2000);
        let mut effects = EffectLog::new(EffectLifetimes::default());
        let mut ctx = TickContext {
            now,
            bounds: &bounds,
            targeting_len: population.len(),
            effects: &mut effects,
        };
        let event = update_unit(population, index, &mut ctx);
        (event, effects)
    }

    #[test]
    fn test_movement_step_snaps_within_speed() {
        let step = movement_step(
            Vec2Fixed::from_ints(8, 0),
            Vec2Fixed::from_ints(10, 0),
            Fixed::from_num(2),
        );
        assert_eq!(step, Vec2Fixed::from_ints(10, 0));
    }

    #[test]
    fn test_movement_step_moves_exactly_speed() {
        let step = movement_step(Vec2Fixed::ZERO, Vec2Fixed::from_ints(30, 40), Fixed::from_num(5));
        assert_eq!(step, Vec2Fixed::from_ints(3, 4));
    }

    #[test]
    fn test_moving_unit_goes_idle_on_arrival() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0)];
        population[0]
            .as_unit_mut()
            .unwrap()
            .move_to(Vec2Fixed::from_ints(3, 0));

        run(&mut population, 0, 0);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(2, 0));
        run(&mut population, 0, 16);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(3, 0));
        assert_eq!(population[0].as_unit().unwrap().command_state, CommandState::Idle);
    }

    #[test]
    fn test_moving_unit_is_clamped_to_arena() {
        let mut population = vec![unit(1, PlayerId::ONE, 980, 0)];
        population[0]
            .as_unit_mut()
            .unwrap()
            .move_to(Vec2Fixed::from_ints(1500, 0));

        run(&mut population, 0, 0);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(982, 0));
        for _ in 0..10 {
            run(&mut population, 0, 0);
        }
        assert_eq!(population[0].position, Vec2Fixed::from_ints(985, 0));
        assert_eq!(population[0].as_unit().unwrap().command_state, CommandState::Moving);
    }

    #[test]
    fn test_dead_unit_goes_idle() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0)];
        population[0]
            .as_unit_mut()
            .unwrap()
            .move_to(Vec2Fixed::from_ints(50, 0));
        population[0].take_damage(1_000);

        run(&mut population, 0, 0);
        assert_eq!(population[0].position, Vec2Fixed::ZERO);
        assert_eq!(population[0].as_unit().unwrap().command_state, CommandState::Idle);
    }

    #[test]
    fn test_attacker_fires_when_in_range_and_ready() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0), unit(2, PlayerId::TWO, 120, 0)];
        population[0].as_unit_mut().unwrap().attack_unit(2);

        let (event, effects) = run(&mut population, 0, 999);
        assert!(event.is_none(), "weapon still cooling down");
        assert!(effects.is_empty());

        let (event, effects) = run(&mut population, 0, 1000);
        let event = event.unwrap();
        assert_eq!(event.damage, 10);
        assert!(!event.killed);
        assert_eq!(population[1].health.current, 90);
        assert_eq!(effects.effects().len(), 2);
        assert_eq!(population[0].position, Vec2Fixed::ZERO);
        assert_eq!(population[0].as_unit().unwrap().move_target, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_attacker_chases_out_of_range_target() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0), unit(2, PlayerId::TWO, 200, 0)];
        population[0].as_unit_mut().unwrap().attack_unit(2);

        let (event, _) = run(&mut population, 0, 5000);
        assert!(event.is_none());
        assert_eq!(population[0].position, Vec2Fixed::from_ints(2, 0));
        assert_eq!(
            population[0].as_unit().unwrap().move_target,
            Vec2Fixed::from_ints(200, 0)
        );
    }

    #[test]
    fn test_attacker_with_dead_target_goes_idle() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0), unit(2, PlayerId::TWO, 50, 0)];
        population[0].as_unit_mut().unwrap().attack_unit(2);
        population[1].take_damage(1_000);

        let (event, _) = run(&mut population, 0, 5000);
        assert!(event.is_none());
        let attacker = population[0].as_unit().unwrap();
        assert_eq!(attacker.target, None);
        assert_eq!(attacker.command_state, CommandState::Idle);
    }

    #[test]
    fn test_attack_move_acquires_nearby_enemy() {
        let mut population = vec![
            unit(1, PlayerId::ONE, 0, 0),
            unit(2, PlayerId::TWO, 170, 0),
            unit(3, PlayerId::THREE, 0, 400),
        ];
        population[0]
            .as_unit_mut()
            .unwrap()
            .attack_move_to(Vec2Fixed::from_ints(0, 900));

        // 170 center-to-center is 140 edge-to-edge: inside acquisition (150)
        // but outside firing range (100), so the unit closes in.
        let (event, _) = run(&mut population, 0, 5000);
        assert!(event.is_none());
        let attacker = population[0].as_unit().unwrap();
        assert_eq!(attacker.target, Some(2));
        assert_eq!(attacker.command_state, CommandState::AttackMoving);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(2, 0));
    }

    #[test]
    fn test_attack_move_resumes_after_kill() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0), unit(2, PlayerId::TWO, 60, 0)];
        population[0]
            .as_unit_mut()
            .unwrap()
            .attack_move_to(Vec2Fixed::from_ints(0, 100));
        population[1].health.current = 10;

        let (event, _) = run(&mut population, 0, 5000);
        assert!(event.unwrap().killed);
        assert_eq!(population[0].position, Vec2Fixed::ZERO);

        run(&mut population, 0, 5016);
        let attacker = population[0].as_unit().unwrap();
        assert_eq!(attacker.target, None);
        assert_eq!(attacker.command_state, CommandState::AttackMoving);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(0, 2));
    }

    #[test]
    fn test_attack_move_ignores_units_past_targeting_len() {
        let mut population = vec![unit(1, PlayerId::ONE, 0, 0), unit(2, PlayerId::TWO, 60, 0)];
        population[0]
            .as_unit_mut()
            .unwrap()
            .attack_move_to(Vec2Fixed::from_ints(0, 100));

        let bounds = ArenaBounds::centered(2000, 2000);
        let mut effects = EffectLog::new(EffectLifetimes::default());
        let mut ctx = TickContext {
            now: 5000,
            bounds: &bounds,
            targeting_len: 1,
            effects: &mut effects,
        };
        assert!(update_unit(&mut population, 0, &mut ctx).is_none());
        assert_eq!(population[0].as_unit().unwrap().target, None);
        assert_eq!(population[0].position, Vec2Fixed::from_ints(0, 2));
    }
}
