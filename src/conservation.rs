// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Population Conservation

use serde::{Deserialize, Serialize};

use crate::types::InfectionTotals;

// ---------------------------------------------------------------------------
// Conservation result
// ---------------------------------------------------------------------------

/// Outcome of a single conservation check (one node, one tick).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConservationResult {
    /// Whether the node's compartment sum matched its census exactly.
    pub balanced: bool,
    /// Absolute head-count discrepancy for this check.
    pub error: i64,
    /// Whether the circuit breaker is currently tripped.
    pub circuit_breaker_tripped: bool,
}

// ---------------------------------------------------------------------------
// Population ledger (circuit breaker over compartment accounting)
// ---------------------------------------------------------------------------

/// Verifies that every node's seven compartments always sum to the census
/// it was built with. People move between compartments; nobody is created
/// or destroyed, the dead included. Accumulated discrepancies trip a
/// circuit breaker so a drifting run fails loudly instead of silently.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PopulationLedger {
    /// Census per node, fixed at world-build time.
    expected: Vec<i64>,
    /// Running total of absolute head-count errors across failed checks.
    pub cumulative_error: i64,
    /// Maximum cumulative error before the circuit breaker trips.
    pub circuit_breaker_threshold: i64,
    /// Whether the circuit breaker is currently tripped.
    pub circuit_breaker_tripped: bool,
    /// Number of consecutive checks that found a discrepancy.
    pub consecutive_violations: u32,
}

impl PopulationLedger {
    pub fn new(expected: Vec<i64>, threshold: i64) -> Self {
        Self {
            expected,
            cumulative_error: 0,
            circuit_breaker_threshold: threshold,
            circuit_breaker_tripped: false,
            consecutive_violations: 0,
        }
    }

    /// Ledger that trips on the very first lost or duplicated person.
    pub fn strict(expected: Vec<i64>) -> Self {
        Self::new(expected, 0)
    }

    pub fn expected(&self, node: usize) -> i64 {
        self.expected[node]
    }

    /// Verify one node's totals against its census.
    ///
    /// Invariant: `uninfected + latent + infectious + symptomatic + serious
    /// + dead + recovered == census`.
    pub fn verify_node(&mut self, node: usize, totals: &InfectionTotals) -> ConservationResult {
        let error = (totals.census() - self.expected[node]).abs();
        let balanced = error == 0;

        if balanced {
            self.consecutive_violations = 0;
        } else {
            self.cumulative_error += error;
            self.consecutive_violations += 1;
        }

        if self.cumulative_error > self.circuit_breaker_threshold {
            self.circuit_breaker_tripped = true;
        }

        ConservationResult {
            balanced,
            error,
            circuit_breaker_tripped: self.circuit_breaker_tripped,
        }
    }

    /// Verify every node for the tick; returns the worst single error seen.
    pub fn verify_tick(&mut self, all_totals: &[InfectionTotals]) -> ConservationResult {
        let mut worst = 0;
        for (node, totals) in all_totals.iter().enumerate() {
            let result = self.verify_node(node, totals);
            worst = worst.max(result.error);
        }
        ConservationResult {
            balanced: worst == 0,
            error: worst,
            circuit_breaker_tripped: self.circuit_breaker_tripped,
        }
    }

    /// Reset the circuit breaker and all accumulated error state.
    pub fn reset_circuit_breaker(&mut self) {
        self.cumulative_error = 0;
        self.circuit_breaker_tripped = false;
        self.consecutive_violations = 0;
    }

    /// Returns `true` if the circuit breaker is currently tripped.
    pub fn is_tripped(&self) -> bool {
        self.circuit_breaker_tripped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
