//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, batch verification and side-by-side comparison all assume that
//! a seed plus a command script fully decides the outcome. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: positions and ranges use
//!   [`arena_core::math::Fixed`] throughout.
//!
//! - **Iteration order**: entities are always visited in ascending id order.
//!
//! - **Randomness**: collision jitter draws from a `ChaCha8Rng` seeded by
//!   the config, never from the OS.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full skirmishes are reproducible
//! 4. **Parallel tests**: Running N simulations on separate threads all match

use std::thread;

use arena_core::simulation::Simulation;

/// Final state hashes of several replays of one setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayHashes {
    /// Final hash of each replay, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each replay ran.
    pub ticks: u64,
}

impl ReplayHashes {
    /// True when every replay ended on the same hash.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Distinct final hashes.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// # Panics
    ///
    /// Panics with every hash if the replays disagree.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "replays diverged after {} ticks: {} unique of {:?}",
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

fn run_to_hash(mut sim: Simulation, ticks: u64) -> u64 {
    for _ in 0..ticks {
        sim.tick();
    }
    sim.state_hash()
}

/// Build `runs` simulations from `setup` one after another and tick each
/// `ticks` times.
///
/// ```
/// use arena_test_utils::determinism::replay_hashes;
/// use arena_test_utils::fixtures::skirmish;
///
/// replay_hashes(|| skirmish(7), 3, 200).assert_deterministic();
/// ```
pub fn replay_hashes<F>(setup: F, runs: usize, ticks: u64) -> ReplayHashes
where
    F: Fn() -> Simulation,
{
    ReplayHashes {
        hashes: (0..runs).map(|_| run_to_hash(setup(), ticks)).collect(),
        ticks,
    }
}

/// Two replays of `setup` end on the same hash.
pub fn replays_identically<F>(setup: F, ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    replay_hashes(setup, 2, ticks).is_deterministic()
}

/// Like [`replay_hashes`], but each replay runs on its own scoped thread.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn replay_on_threads<F>(setup: F, threads: usize, ticks: u64) -> ReplayHashes
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| run_to_hash(setup(), ticks)))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ReplayHashes { hashes, ticks }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for arena testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use arena_core::components::PlayerId;
    use arena_core::math::{Fixed, Vec2Fixed};
    use arena_core::orders::Command;
    use proptest::prelude::*;

    /// A coordinate inside the centered 1000x700 test arena, away from the
    /// walls so the clamp does not interfere.
    pub fn arb_arena_position() -> impl Strategy<Value = Vec2Fixed> {
        (-450i32..450, -300i32..300).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Any of the four players.
    pub fn arb_player() -> impl Strategy<Value = PlayerId> {
        (1u8..=4).prop_map(|raw| PlayerId::new(raw).unwrap_or(PlayerId::ONE))
    }

    /// Unit movement speed per tick.
    pub fn arb_speed() -> impl Strategy<Value = Fixed> {
        (1i32..20).prop_map(Fixed::from_num)
    }

    /// Damage values (1-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Ground orders (no entity references).
    pub fn arb_ground_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            arb_arena_position().prop_map(Command::MoveTo),
            arb_arena_position().prop_map(Command::AttackMove),
        ]
    }

    /// Parameters for placing a test unit.
    #[derive(Debug, Clone)]
    pub struct UnitPlacement {
        /// Owner.
        pub owner: PlayerId,
        /// Position.
        pub position: Vec2Fixed,
        /// Optional ground order given right after placement.
        pub order: Option<Command>,
    }

    /// Parameters for one unit.
    pub fn arb_unit_placement() -> impl Strategy<Value = UnitPlacement> {
        (
            arb_player(),
            arb_arena_position(),
            proptest::option::of(arb_ground_command()),
        )
            .prop_map(|(owner, position, order)| UnitPlacement {
                owner,
                position,
                order,
            })
    }

    /// A crowd of up to `max_units` placements.
    pub fn arb_crowd(max_units: usize) -> impl Strategy<Value = Vec<UnitPlacement>> {
        proptest::collection::vec(arb_unit_placement(), 1..max_units)
    }
}
