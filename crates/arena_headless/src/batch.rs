//! Parallel determinism verification.
//!
//! Runs many copies of one scenario with rayon and compares their final
//! state hashes. Any disagreement means the simulation depends on something
//! other than its seed and inputs.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scenario::{Scenario, ScenarioError};

/// Outcome of a verification batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Number of copies run.
    pub runs: u32,
    /// Ticks per copy.
    pub ticks: u64,
    /// Final hash of each copy, in run order.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// True when every copy ended on the same hash.
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
}

/// Run `runs` copies of `scenario` for `ticks` ticks each, in parallel.
///
/// Every copy builds its own simulation from the scenario, so setup is part
/// of what is compared.
pub fn verify_determinism(
    scenario: &Scenario,
    runs: u32,
    ticks: u64,
) -> Result<VerifyReport, ScenarioError> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|run| {
            let mut sim = scenario.build()?;
            for _ in 0..ticks {
                sim.tick();
            }
            let hash = sim.state_hash();
            tracing::debug!(run, hash, "Verification run finished");
            Ok(hash)
        })
        .collect::<Result<Vec<u64>, ScenarioError>>()?;

    let report = VerifyReport {
        runs,
        ticks,
        hashes,
    };
    if report.is_deterministic() {
        tracing::info!(runs, ticks, "All runs matched");
    } else {
        tracing::warn!(
            runs,
            ticks,
            unique = report.unique_hashes().len(),
            "Runs diverged"
        );
    }
    Ok(report)
}
