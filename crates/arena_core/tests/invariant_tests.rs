//! Property tests for the invariants the tick loop must keep.

use arena_core::collision::{overlap_depth, resolve_collisions};
use arena_core::combat::movement_step;
use arena_core::components::{CommandState, Entity, PlayerId};
use arena_core::config::{CollisionTuning, UnitStats};
use arena_core::math::Vec2Fixed;
use arena_core::orders::Command;
use arena_test_utils::determinism::strategies::{
    arb_arena_position, arb_crowd, arb_damage, arb_speed,
};
use arena_test_utils::fixtures::{duel, fixed, open_arena, pos, skirmish};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    /// Health never leaves `0..=max`, however hard or often a unit is hit.
    #[test]
    fn prop_health_stays_in_bounds(hits in proptest::collection::vec(arb_damage(), 1..30)) {
        let mut entity = Entity::unit(1, PlayerId::ONE, Vec2Fixed::ZERO, &UnitStats::default());
        for hit in hits {
            let before = entity.health.current;
            let dealt = entity.take_damage(hit);
            prop_assert!(dealt <= before);
            prop_assert!(entity.health.current <= entity.health.max);
            prop_assert_eq!(entity.health.current, before - dealt);
        }
    }

    /// Supply in use always matches the live units and never tops the cap.
    #[test]
    fn prop_supply_matches_live_units(crowd in arb_crowd(24), kills in proptest::collection::vec(0usize..24, 0..8)) {
        let mut sim = open_arena();
        let mut ids = Vec::new();
        for placement in &crowd {
            if let Ok(id) = sim.spawn_unit(placement.owner, placement.position) {
                if let Some(order) = placement.order {
                    sim.apply_command(id, order).unwrap();
                }
                ids.push(id);
            }
        }
        for index in kills {
            if let Some(&id) = ids.get(index) {
                let _ = sim.damage_entity(id, 1_000);
            }
        }

        for _ in 0..60 {
            sim.tick();
            for player in PlayerId::all() {
                let state = sim.players().get(player);
                prop_assert!(state.current_supply <= state.supply_cap);
                prop_assert_eq!(state.current_supply, sim.supply_in_use(player));
            }
        }
    }

    /// One pass never makes an overlapping pair overlap more.
    #[test]
    fn prop_collision_reduces_overlap(
        a in arb_arena_position(),
        dx in -25i32..25,
        dy in -25i32..25,
        seed in any::<u64>(),
    ) {
        let stats = UnitStats::default();
        let b = a + pos(dx, dy);
        let mut population = vec![
            Entity::unit(1, PlayerId::ONE, a, &stats),
            Entity::unit(2, PlayerId::TWO, b, &stats),
        ];
        let before = overlap_depth(&population[0], &population[1]);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        resolve_collisions(&mut population, &CollisionTuning::default(), &mut rng);

        let after = overlap_depth(&population[0], &population[1]);
        prop_assert!(after <= before);
        if before > fixed(1) {
            prop_assert!(after < before);
        }
    }

    /// A step never overshoots and lands exactly when within reach.
    #[test]
    fn prop_movement_step_never_overshoots(
        from in arb_arena_position(),
        to in arb_arena_position(),
        speed in arb_speed(),
    ) {
        let next = movement_step(from, to, speed);
        let before = from.distance(to);
        let after = next.distance(to);

        prop_assert!(after <= before);
        if before <= speed {
            prop_assert_eq!(next, to);
        }
    }

    /// Arriving units go idle and stay put on later ticks.
    #[test]
    fn prop_arrival_is_idempotent(target in arb_arena_position()) {
        let mut sim = open_arena();
        let unit = sim.spawn_unit(PlayerId::ONE, pos(0, 0)).unwrap();
        sim.apply_command(unit, Command::MoveTo(target)).unwrap();

        for _ in 0..500 {
            sim.tick();
        }
        let entity = sim.get_entity(unit).unwrap();
        prop_assert_eq!(entity.position, target);
        prop_assert_eq!(entity.as_unit().unwrap().command_state, CommandState::Idle);

        sim.tick();
        prop_assert_eq!(sim.get_entity(unit).unwrap().position, target);
    }

    /// Consecutive shots from one attacker are at least a cooldown apart.
    #[test]
    fn prop_shots_respect_cooldown(step_ms in 1u64..400) {
        let mut duel = duel(pos(-60, 0), pos(60, 0));
        duel.sim.apply_command(duel.left, Command::Attack(duel.right)).unwrap();

        let cooldown = duel.sim.config().unit.attack_cooldown_ms;
        let mut last_shot = None;
        let mut now = 0;
        for _ in 0..200 {
            now += step_ms;
            let events = duel.sim.tick_at(now);
            if events.damage_events.iter().any(|e| e.attacker == duel.left) {
                if let Some(previous) = last_shot {
                    prop_assert!(now - previous >= cooldown);
                }
                last_shot = Some(now);
            }
        }
    }
}

#[test]
fn death_sweep_is_idempotent_mid_match() {
    let mut sim = skirmish(4);
    for _ in 0..1_200 {
        sim.tick();
    }

    let victims: Vec<_> = sim
        .entities()
        .iter()
        .filter(|entity| entity.is_unit())
        .map(|entity| entity.id)
        .take(3)
        .collect();
    for &id in &victims {
        sim.damage_entity(id, 1_000).unwrap();
    }

    let supply_before: u32 = PlayerId::all()
        .map(|player| sim.players().get(player).current_supply)
        .sum();
    let removed = sim.sweep_dead();
    assert_eq!(removed, victims);

    let supply_after: u32 = PlayerId::all()
        .map(|player| sim.players().get(player).current_supply)
        .sum();
    assert_eq!(supply_after + victims.len() as u32, supply_before);

    assert!(sim.sweep_dead().is_empty());
    let supply_again: u32 = PlayerId::all()
        .map(|player| sim.players().get(player).current_supply)
        .sum();
    assert_eq!(supply_again, supply_after);
}
