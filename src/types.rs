// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Number of age brackets in every demographic vector.
pub const AGE_BUCKETS: usize = 9;

/// Lower bound (in years) of each age bracket:
/// <5, 5-17, 18-29, 30-39, 40-49, 50-64, 65-74, 75-84, 85+.
pub const AGE_BUCKET_LOWER_BOUNDS: [u32; AGE_BUCKETS] = [0, 5, 18, 30, 40, 50, 65, 75, 85];

/// Location identity used for aggregates spanning more than one node.
pub const GLOBAL: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while validating serialized world-definition data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("demographic bucket {0} is negative ({1})")]
    NegativeShare(usize, f64),
    #[error("virus rate bucket {0} is outside [0,1] ({1})")]
    RateOutOfRange(usize, f64),
    #[error("node population must be non-negative, got {0}")]
    NegativePopulation(i64),
    #[error("edge '{name}' references node {index} but only {count} nodes exist")]
    DanglingEdge {
        name: String,
        index: u32,
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

/// Immutable 9-bucket age-distribution vector. Represents either population
/// shares (summing to 1.0) or a plain per-bucket coefficient container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Demographics([f64; AGE_BUCKETS]);

impl Demographics {
    pub fn new(buckets: [f64; AGE_BUCKETS]) -> Result<Self, DataError> {
        for (i, &share) in buckets.iter().enumerate() {
            if share < 0.0 {
                return Err(DataError::NegativeShare(i, share));
            }
        }
        Ok(Self(buckets))
    }

    /// Uniform distribution across all brackets.
    pub fn uniform() -> Self {
        Self([1.0 / AGE_BUCKETS as f64; AGE_BUCKETS])
    }

    /// Same coefficient in every bracket. Rejects negative values.
    pub fn flat(value: f64) -> Result<Self, DataError> {
        Self::new([value; AGE_BUCKETS])
    }

    pub fn bucket(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn buckets(&self) -> &[f64; AGE_BUCKETS] {
        &self.0
    }

    /// Population-weighted effective rate: the dot product of this
    /// distribution with a per-bucket rate vector.
    pub fn weighted_rate(&self, rates: &Demographics) -> f64 {
        self.0
            .iter()
            .zip(rates.0.iter())
            .map(|(share, rate)| share * rate)
            .sum()
    }

    /// Combined share of brackets that fall entirely below `age` years.
    pub fn share_under(&self, age: u32) -> f64 {
        let mut total = 0.0;
        for i in 0..AGE_BUCKETS {
            let upper = if i + 1 < AGE_BUCKETS {
                AGE_BUCKET_LOWER_BOUNDS[i + 1]
            } else {
                u32::MAX
            };
            if upper <= age {
                total += self.0[i];
            }
        }
        total
    }

    /// Combined share of brackets whose lower bound is at least `age` years.
    pub fn share_at_least(&self, age: u32) -> f64 {
        self.0
            .iter()
            .zip(AGE_BUCKET_LOWER_BOUNDS.iter())
            .filter(|(_, &lower)| lower >= age)
            .map(|(share, _)| share)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// VirusProfile
// ---------------------------------------------------------------------------

/// Per-demographic-bucket rate vectors for the simulated pathogen.
/// Immutable after construction; all components are probabilities in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirusProfile {
    infectivity: Demographics,
    fatality: Demographics,
    reinfectivity: Demographics,
    symptomatic_rate: Demographics,
    serious_rate: Demographics,
}

impl VirusProfile {
    pub fn new(
        infectivity: Demographics,
        fatality: Demographics,
        reinfectivity: Demographics,
        symptomatic_rate: Demographics,
        serious_rate: Demographics,
    ) -> Result<Self, DataError> {
        for vector in [
            &infectivity,
            &fatality,
            &reinfectivity,
            &symptomatic_rate,
            &serious_rate,
        ] {
            for (i, &rate) in vector.buckets().iter().enumerate() {
                if !(0.0..=1.0).contains(&rate) {
                    return Err(DataError::RateOutOfRange(i, rate));
                }
            }
        }
        Ok(Self {
            infectivity,
            fatality,
            reinfectivity,
            symptomatic_rate,
            serious_rate,
        })
    }

    pub fn from_data(data: &VirusData) -> Result<Self, DataError> {
        Self::new(
            data.infectivity,
            data.fatality,
            data.reinfectivity,
            data.symptomatic_rate,
            data.serious_rate,
        )
    }

    pub fn infectivity(&self) -> &Demographics {
        &self.infectivity
    }

    pub fn fatality(&self) -> &Demographics {
        &self.fatality
    }

    pub fn reinfectivity(&self) -> &Demographics {
        &self.reinfectivity
    }

    pub fn symptomatic_rate(&self) -> &Demographics {
        &self.symptomatic_rate
    }

    pub fn serious_rate(&self) -> &Demographics {
        &self.serious_rate
    }
}

// ---------------------------------------------------------------------------
// Compartments
// ---------------------------------------------------------------------------

/// The seven mutually-exclusive infection states a person occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compartment {
    Uninfected,
    AsymptomaticLatent,
    AsymptomaticInfectious,
    Symptomatic,
    Serious,
    Dead,
    Recovered,
}

impl Compartment {
    pub const ALL: [Compartment; 7] = [
        Compartment::Uninfected,
        Compartment::AsymptomaticLatent,
        Compartment::AsymptomaticInfectious,
        Compartment::Symptomatic,
        Compartment::Serious,
        Compartment::Dead,
        Compartment::Recovered,
    ];
}

/// Per-node compartment counters. Owned exclusively by the node; snapshots
/// are cloned into tracking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionTotals {
    pub location: u32,
    pub uninfected: i64,
    pub asymptomatic_latent: i64,
    pub asymptomatic_infectious: i64,
    pub symptomatic: i64,
    pub serious: i64,
    pub dead: i64,
    pub recovered: i64,
}

impl InfectionTotals {
    pub fn new(location: u32, uninfected: i64) -> Self {
        Self {
            location,
            uninfected,
            asymptomatic_latent: 0,
            asymptomatic_infectious: 0,
            symptomatic: 0,
            serious: 0,
            dead: 0,
            recovered: 0,
        }
    }

    pub fn zero(location: u32) -> Self {
        Self::new(location, 0)
    }

    /// Total census across all seven compartments, the dead included.
    pub fn census(&self) -> i64 {
        self.uninfected
            + self.asymptomatic_latent
            + self.asymptomatic_infectious
            + self.symptomatic
            + self.serious
            + self.dead
            + self.recovered
    }

    /// Census minus the dead: everyone still mixing in the population.
    pub fn living(&self) -> i64 {
        self.census() - self.dead
    }

    /// Everyone currently carrying the pathogen, infectious or not.
    pub fn infected(&self) -> i64 {
        self.asymptomatic_latent + self.asymptomatic_infectious + self.symptomatic + self.serious
    }

    /// Everyone able to transmit.
    pub fn infectious(&self) -> i64 {
        self.asymptomatic_infectious + self.symptomatic + self.serious
    }

    pub fn get(&self, compartment: Compartment) -> i64 {
        match compartment {
            Compartment::Uninfected => self.uninfected,
            Compartment::AsymptomaticLatent => self.asymptomatic_latent,
            Compartment::AsymptomaticInfectious => self.asymptomatic_infectious,
            Compartment::Symptomatic => self.symptomatic,
            Compartment::Serious => self.serious,
            Compartment::Dead => self.dead,
            Compartment::Recovered => self.recovered,
        }
    }
}

impl Add for InfectionTotals {
    type Output = InfectionTotals;

    /// Component-wise sum keeping the left operand's location, so folds
    /// seeded with a `GLOBAL` zero produce a global aggregate.
    fn add(self, rhs: InfectionTotals) -> InfectionTotals {
        InfectionTotals {
            location: self.location,
            uninfected: self.uninfected + rhs.uninfected,
            asymptomatic_latent: self.asymptomatic_latent + rhs.asymptomatic_latent,
            asymptomatic_infectious: self.asymptomatic_infectious + rhs.asymptomatic_infectious,
            symptomatic: self.symptomatic + rhs.symptomatic,
            serious: self.serious + rhs.serious,
            dead: self.dead + rhs.dead,
            recovered: self.recovered + rhs.recovered,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialized world definition
// ---------------------------------------------------------------------------

fn default_base_compliance() -> f64 {
    0.8
}

fn default_budget() -> i64 {
    100_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
    pub population: i64,
    pub demographics: Demographics,
    pub interactivity: f64,
    pub gdp: f64,
    pub test_capacity: i64,
    #[serde(default)]
    pub position: (f64, f64),
    #[serde(default = "default_base_compliance")]
    pub base_compliance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub name: String,
    pub left: u32,
    pub right: u32,
    pub population: i64,
    pub interactivity: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirusData {
    pub infectivity: Demographics,
    pub fatality: Demographics,
    pub reinfectivity: Demographics,
    pub symptomatic_rate: Demographics,
    pub serious_rate: Demographics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldData {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
    pub virus: VirusData,
    #[serde(default = "default_budget")]
    pub budget: i64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demographics_rejects_negative() {
        let mut buckets = [0.1; AGE_BUCKETS];
        buckets[3] = -0.2;
        assert_eq!(
            Demographics::new(buckets),
            Err(DataError::NegativeShare(3, -0.2))
        );
    }

    #[test]
    fn test_weighted_rate_is_dot_product() {
        let shares = Demographics::new([0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let rates = Demographics::new([0.2, 0.4, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!((shares.weighted_rate(&rates) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_age_shares() {
        let d = Demographics::new([0.1, 0.2, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1]).unwrap();
        // <5 and 5-17 fall entirely below 18.
        assert!((d.share_under(18) - 0.3).abs() < 1e-12);
        // 65-74, 75-84, 85+.
        assert!((d.share_at_least(65) - 0.3).abs() < 1e-12);
        assert!((d.share_at_least(0) - 1.0).abs() < 1e-12);
        // 85+ alone.
        assert!((d.share_at_least(85) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_virus_profile_rejects_out_of_range() {
        let ok = Demographics::uniform();
        let mut bad_buckets = [0.5; AGE_BUCKETS];
        bad_buckets[0] = 1.5;
        let bad = Demographics::new(bad_buckets).unwrap();
        let result = VirusProfile::new(bad, ok, ok, ok, ok);
        assert_eq!(result.err(), Some(DataError::RateOutOfRange(0, 1.5)));
    }

    #[test]
    fn test_totals_census_and_living() {
        let mut t = InfectionTotals::new(0, 100);
        t.symptomatic = 5;
        t.dead = 2;
        t.recovered = 3;
        assert_eq!(t.census(), 110);
        assert_eq!(t.living(), 108);
        assert_eq!(t.infectious(), 5);
        assert_eq!(t.infected(), 5);
    }

    #[test]
    fn test_totals_add_keeps_left_location() {
        let mut a = InfectionTotals::zero(GLOBAL);
        let b = InfectionTotals::new(3, 50);
        a = a + b;
        assert_eq!(a.location, GLOBAL);
        assert_eq!(a.uninfected, 50);
    }

    #[test]
    fn test_totals_structural_equality_includes_location() {
        let a = InfectionTotals::new(1, 10);
        let b = InfectionTotals::new(2, 10);
        assert_ne!(a, b);
        assert_eq!(a, InfectionTotals::new(1, 10));
    }

    #[test]
    fn test_compartment_accessor_exhaustive() {
        let mut t = InfectionTotals::new(1, 7);
        t.asymptomatic_latent = 1;
        t.asymptomatic_infectious = 2;
        t.symptomatic = 3;
        t.serious = 4;
        t.dead = 5;
        t.recovered = 6;
        let sum: i64 = Compartment::ALL.iter().map(|&c| t.get(c)).sum();
        assert_eq!(sum, t.census());
    }

    #[test]
    fn test_world_data_round_trips_through_json() {
        let data = WorldData {
            nodes: vec![NodeData {
                name: "Meridian".to_string(),
                population: 1000,
                demographics: Demographics::uniform(),
                interactivity: 0.5,
                gdp: 1.0,
                test_capacity: 10,
                position: (1.0, 2.0),
                base_compliance: 0.8,
            }],
            edges: Vec::new(),
            virus: VirusData {
                infectivity: Demographics::uniform(),
                fatality: Demographics::uniform(),
                reinfectivity: Demographics::uniform(),
                symptomatic_rate: Demographics::uniform(),
                serious_rate: Demographics::uniform(),
            },
            budget: 5000,
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: WorldData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes[0].population, 1000);
        assert_eq!(back.budget, 5000);
    }
}
