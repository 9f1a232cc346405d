// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Infection Tracking

use serde::{Deserialize, Serialize};

use crate::types::{Compartment, InfectionTotals, GLOBAL};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    #[error("day {day} requested but only {recorded} days recorded")]
    DayOutOfRange { day: usize, recorded: usize },
    #[error("node {node} requested but the world has {count} nodes")]
    NodeOutOfRange { node: usize, count: usize },
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Compartment totals for every node at the end of one simulated day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub day: u32,
    pub totals: Vec<InfectionTotals>,
}

impl DaySnapshot {
    /// Fold the per-node totals into one world-wide aggregate tagged
    /// with the `GLOBAL` location.
    pub fn global(&self) -> InfectionTotals {
        self.totals
            .iter()
            .fold(InfectionTotals::zero(GLOBAL), |acc, t| acc + *t)
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Append-only record of daily snapshots, one per completed tick. Feeds
/// both the analysis surface (per-node and global time series) and the
/// end-of-run reporting in the bench harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfectionHistory {
    node_count: usize,
    days: Vec<DaySnapshot>,
}

impl InfectionHistory {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            days: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn record(&mut self, day: u32, totals: Vec<InfectionTotals>) {
        debug_assert_eq!(totals.len(), self.node_count);
        self.days.push(DaySnapshot { day, totals });
    }

    pub fn day(&self, day: usize) -> Result<&DaySnapshot, TrackingError> {
        self.days.get(day).ok_or(TrackingError::DayOutOfRange {
            day,
            recorded: self.days.len(),
        })
    }

    pub fn latest(&self) -> Option<&DaySnapshot> {
        self.days.last()
    }

    /// Totals for one node on one recorded day.
    pub fn node_on_day(&self, day: usize, node: usize) -> Result<&InfectionTotals, TrackingError> {
        let snapshot = self.day(day)?;
        snapshot.totals.get(node).ok_or(TrackingError::NodeOutOfRange {
            node,
            count: self.node_count,
        })
    }

    /// World-wide aggregate for one recorded day.
    pub fn global_on_day(&self, day: usize) -> Result<InfectionTotals, TrackingError> {
        Ok(self.day(day)?.global())
    }

    /// One compartment's daily counts for a single node, oldest first.
    pub fn node_series(
        &self,
        node: usize,
        compartment: Compartment,
    ) -> Result<Vec<i64>, TrackingError> {
        if node >= self.node_count {
            return Err(TrackingError::NodeOutOfRange {
                node,
                count: self.node_count,
            });
        }
        Ok(self
            .days
            .iter()
            .map(|snapshot| snapshot.totals[node].get(compartment))
            .collect())
    }

    /// One compartment's daily world-wide counts, oldest first.
    pub fn global_series(&self, compartment: Compartment) -> Vec<i64> {
        self.days
            .iter()
            .map(|snapshot| snapshot.global().get(compartment))
            .collect()
    }

    /// Highest single-day world-wide count for a compartment, with the
    /// day it occurred. `None` before the first recorded day.
    pub fn global_peak(&self, compartment: Compartment) -> Option<(u32, i64)> {
        self.days
            .iter()
            .map(|snapshot| (snapshot.day, snapshot.global().get(compartment)))
            .max_by_key(|&(_, count)| count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(location: u32, uninfected: i64, symptomatic: i64) -> InfectionTotals {
        let mut t = InfectionTotals::new(location, uninfected);
        t.symptomatic = symptomatic;
        t
    }

    fn sample_history() -> InfectionHistory {
        let mut history = InfectionHistory::new(2);
        history.record(0, vec![totals(0, 100, 0), totals(1, 200, 0)]);
        history.record(1, vec![totals(0, 95, 5), totals(1, 198, 2)]);
        history.record(2, vec![totals(0, 90, 10), totals(1, 195, 5)]);
        history
    }

    #[test]
    fn test_record_and_lookup() {
        let history = sample_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history.node_on_day(1, 0).unwrap().symptomatic, 5);
        assert_eq!(history.node_on_day(2, 1).unwrap().uninfected, 195);
        assert_eq!(history.latest().unwrap().day, 2);
    }

    #[test]
    fn test_day_out_of_range() {
        let history = sample_history();
        assert_eq!(
            history.day(3).err(),
            Some(TrackingError::DayOutOfRange { day: 3, recorded: 3 })
        );
    }

    #[test]
    fn test_node_out_of_range() {
        let history = sample_history();
        assert_eq!(
            history.node_on_day(0, 5).err(),
            Some(TrackingError::NodeOutOfRange { node: 5, count: 2 })
        );
        assert_eq!(
            history.node_series(2, Compartment::Dead).err(),
            Some(TrackingError::NodeOutOfRange { node: 2, count: 2 })
        );
    }

    #[test]
    fn test_global_fold_tags_global_location() {
        let history = sample_history();
        let global = history.global_on_day(2).unwrap();
        assert_eq!(global.location, GLOBAL);
        assert_eq!(global.uninfected, 285);
        assert_eq!(global.symptomatic, 15);
    }

    #[test]
    fn test_series_oldest_first() {
        let history = sample_history();
        assert_eq!(
            history.node_series(0, Compartment::Symptomatic).unwrap(),
            vec![0, 5, 10]
        );
        assert_eq!(
            history.global_series(Compartment::Symptomatic),
            vec![0, 7, 15]
        );
    }

    #[test]
    fn test_global_peak() {
        let history = sample_history();
        assert_eq!(history.global_peak(Compartment::Symptomatic), Some((2, 15)));
        assert!(InfectionHistory::new(1)
            .global_peak(Compartment::Symptomatic)
            .is_none());
    }
}
