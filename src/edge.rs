// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Transport Edges

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actions::ActionError;
use crate::node::stochastic_round;
use crate::types::{DataError, EdgeData, InfectionTotals};

/// Fraction of the traveller base that still moves while the edge is
/// closed (essential transit). Kept non-zero so population ratios stay
/// well-defined, but closure zeroes the contact term, so a closed edge
/// still carries exactly no infection.
const CLOSED_POPULATION_RATIO: f64 = 0.1;

/// Contact multiplier on an edge under movement restrictions.
const MOVEMENT_RESTRICTION_FACTOR: f64 = 0.25;

const LOGISTIC_STEEPNESS: f64 = 10.0;
const LOGISTIC_MIDPOINT: f64 = 0.5;

/// Map the infectious share of the origin population to a contact
/// pressure in (0,1). The logistic keeps sparse outbreaks from leaking
/// across borders immediately while saturating once half the origin is
/// infectious.
fn infectious_pressure(share: f64) -> f64 {
    1.0 / (1.0 + (-LOGISTIC_STEEPNESS * (share - LOGISTIC_MIDPOINT)).exp())
}

/// A weighted transport link between two nodes. Edges carry travellers
/// both ways each day and convert the origin side's infectious share into
/// new infections on the destination side.
///
/// Closures and restrictions are counted, not flagged: both endpoint
/// nodes may close their borders independently, and the edge reopens only
/// when every closure has been lifted.
#[derive(Debug, Clone)]
pub struct Edge {
    index: usize,
    name: String,
    left: u32,
    right: u32,
    base_population: i64,
    population: i64,
    interactivity: f64,
    distance_km: f64,
    closures: u32,
    restrictions: u32,
    rng: ChaCha8Rng,
}

impl Edge {
    pub fn from_data(
        index: usize,
        data: &EdgeData,
        node_count: usize,
        world_seed: u64,
    ) -> Result<Self, DataError> {
        for endpoint in [data.left, data.right] {
            if endpoint as usize >= node_count {
                return Err(DataError::DanglingEdge {
                    name: data.name.clone(),
                    index: endpoint,
                    count: node_count,
                });
            }
        }
        if data.population < 0 {
            return Err(DataError::NegativePopulation(data.population));
        }
        let rng = ChaCha8Rng::seed_from_u64(
            world_seed ^ (index as u64 + 1).wrapping_mul(0xD1B5_4A32_D192_ED03),
        );
        Ok(Self {
            index,
            name: data.name.clone(),
            left: data.left,
            right: data.right,
            base_population: data.population,
            population: data.population,
            interactivity: data.interactivity,
            distance_km: data.distance_km,
            closures: 0,
            restrictions: 0,
            rng,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    pub fn population(&self) -> i64 {
        self.population
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn is_closed(&self) -> bool {
        self.closures > 0
    }

    pub fn is_restricted(&self) -> bool {
        self.restrictions > 0
    }

    /// Returns `true` if this edge touches the given node.
    pub fn touches(&self, node: u32) -> bool {
        self.left == node || self.right == node
    }

    fn effective_interactivity(&self) -> f64 {
        if self.closures > 0 {
            return 0.0;
        }
        let mut interactivity = self.interactivity;
        if self.restrictions > 0 {
            interactivity *= MOVEMENT_RESTRICTION_FACTOR;
        }
        interactivity
    }

    // ─── Daily flow ─────────────────────────────────────────────────────────

    /// Compute one day of cross-border infection: new cases to seed into
    /// the (left, right) nodes respectively.
    ///
    /// Transit population splits between the sides in proportion to their
    /// living head-counts. Each side contributes infectious travellers via
    /// the logistic pressure on its infectious share and recovered
    /// travellers linearly; uninfected transit is what remains. The edge's
    /// expected new-case count is then the usual pressure product, rounded
    /// with a single Bernoulli draw and split back by the same transit
    /// proportions.
    pub fn update(
        &mut self,
        left_totals: &InfectionTotals,
        right_totals: &InfectionTotals,
        infectivity: f64,
    ) -> (i64, i64) {
        let left_pop = left_totals.living().max(0);
        let right_pop = right_totals.living().max(0);
        let transit = self.population;
        if left_pop + right_pop == 0 || transit <= 0 {
            return (0, 0);
        }
        // The logistic never reaches zero; a fully healthy pair of nodes
        // must still produce exactly no cases.
        if left_totals.infectious() == 0 && right_totals.infectious() == 0 {
            return (0, 0);
        }

        let left_share = left_pop as f64 / (left_pop + right_pop) as f64;
        let transit_f = transit as f64;
        let transit_left = transit_f * left_share;
        let transit_right = transit_f - transit_left;

        let side = |totals: &InfectionTotals, pop: i64, travellers: f64| -> (f64, f64) {
            if pop <= 0 {
                return (0.0, 0.0);
            }
            let infectious_share = (totals.infectious() as f64 / pop as f64).clamp(0.0, 1.0);
            let recovered_share = (totals.recovered as f64 / pop as f64).clamp(0.0, 1.0);
            (
                travellers * infectious_pressure(infectious_share),
                travellers * recovered_share,
            )
        };
        let (left_infectious, left_recovered) = side(left_totals, left_pop, transit_left);
        let (right_infectious, right_recovered) = side(right_totals, right_pop, transit_right);

        let transit_infectious = left_infectious + right_infectious;
        let transit_recovered = left_recovered + right_recovered;
        let transit_uninfected =
            (transit_f - transit_infectious - transit_recovered).max(0.0);

        let infectiousness = transit_infectious
            * (transit_uninfected / transit_f)
            * self.effective_interactivity()
            * infectivity;
        let new_cases = stochastic_round(infectiousness, &mut self.rng).clamp(0, transit);

        let into_left = ((new_cases as f64 * left_share).round() as i64).clamp(0, new_cases);
        (into_left, new_cases - into_left)
    }

    // ─── Policy levers ──────────────────────────────────────────────────────

    /// Close the edge on behalf of one endpoint. Transit drops to the
    /// essential floor and the contact term goes to zero.
    pub fn close(&mut self) {
        self.closures += 1;
        if self.closures == 1 {
            self.population =
                ((self.base_population as f64 * CLOSED_POPULATION_RATIO).round() as i64).max(1);
        }
    }

    /// Lift one endpoint's closure. The edge reopens only when the last
    /// closure is lifted.
    pub fn open(&mut self) -> Result<(), ActionError> {
        if self.closures == 0 {
            return Err(ActionError::NotActive("CloseBorders"));
        }
        self.closures -= 1;
        if self.closures == 0 {
            self.population = self.base_population;
        }
        Ok(())
    }

    /// Apply movement restrictions if this edge exceeds the permitted
    /// distance. Returns whether the edge was affected.
    pub fn restrict(&mut self, max_distance_km: f64) -> bool {
        if self.distance_km > max_distance_km {
            self.restrictions += 1;
            true
        } else {
            false
        }
    }

    pub fn unrestrict(&mut self, max_distance_km: f64) -> Result<(), ActionError> {
        if self.distance_km <= max_distance_km {
            return Ok(());
        }
        if self.restrictions == 0 {
            return Err(ActionError::NotActive("MovementRestrictions"));
        }
        self.restrictions -= 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_data(population: i64) -> EdgeData {
        EdgeData {
            name: "A-B rail".to_string(),
            left: 0,
            right: 1,
            population,
            interactivity: 0.3,
            distance_km: 120.0,
        }
    }

    fn make_edge(population: i64) -> Edge {
        Edge::from_data(0, &edge_data(population), 2, 99).unwrap()
    }

    fn totals_with_symptomatic(population: i64, symptomatic: i64) -> InfectionTotals {
        let mut t = InfectionTotals::new(0, population);
        t.uninfected -= symptomatic;
        t.symptomatic += symptomatic;
        t
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let mut data = edge_data(100);
        data.right = 7;
        assert!(matches!(
            Edge::from_data(0, &data, 2, 99),
            Err(DataError::DanglingEdge { index: 7, count: 2, .. })
        ));
    }

    #[test]
    fn test_no_infection_no_flow() {
        let mut edge = make_edge(10_000);
        let healthy = InfectionTotals::new(0, 100_000);
        for _ in 0..50 {
            assert_eq!(edge.update(&healthy, &healthy, 0.5), (0, 0));
        }
    }

    #[test]
    fn test_closed_edge_carries_exactly_nothing() {
        let mut edge = make_edge(100_000);
        edge.close();
        // Half of each side infectious: maximum logistic pressure.
        let left = totals_with_symptomatic(100_000, 50_000);
        let right = totals_with_symptomatic(100_000, 50_000);
        for _ in 0..200 {
            assert_eq!(edge.update(&left, &right, 0.5), (0, 0));
        }
    }

    #[test]
    fn test_closed_population_floor() {
        let mut edge = make_edge(5);
        edge.close();
        assert_eq!(edge.population(), 1);
        edge.open().unwrap();
        assert_eq!(edge.population(), 5);

        let mut tiny = make_edge(0);
        tiny.close();
        assert_eq!(tiny.population(), 1);
    }

    #[test]
    fn test_double_closure_needs_double_open() {
        let mut edge = make_edge(1_000);
        edge.close();
        edge.close();
        edge.open().unwrap();
        assert!(edge.is_closed());
        assert_eq!(edge.population(), 100);
        edge.open().unwrap();
        assert!(!edge.is_closed());
        assert_eq!(edge.population(), 1_000);
        assert_eq!(edge.open(), Err(ActionError::NotActive("CloseBorders")));
    }

    #[test]
    fn test_flow_bounded_by_transit_population() {
        let mut edge = make_edge(10);
        let hot = totals_with_symptomatic(1_000, 1_000);
        for _ in 0..100 {
            let (into_left, into_right) = edge.update(&hot, &hot, 1.0);
            assert!(into_left >= 0 && into_right >= 0);
            assert!(into_left + into_right <= 10);
        }
    }

    #[test]
    fn test_split_proportional_to_living_population() {
        let mut edge = make_edge(100);
        // Left side is three times larger, so roughly three quarters of
        // the new cases should land there.
        let left = totals_with_symptomatic(300, 300);
        let right = InfectionTotals::new(1, 100);
        let (mut total_left, mut total_right) = (0, 0);
        for _ in 0..200 {
            let (into_left, into_right) = edge.update(&left, &right, 1.0);
            total_left += into_left;
            total_right += into_right;
        }
        assert!(total_left > 0);
        assert!(total_left > total_right);
    }

    #[test]
    fn test_restriction_only_hits_long_edges() {
        let mut edge = make_edge(1_000);
        assert!(!edge.restrict(500.0));
        assert!(!edge.is_restricted());
        assert!(edge.restrict(50.0));
        assert!(edge.is_restricted());
        edge.unrestrict(50.0).unwrap();
        assert!(!edge.is_restricted());
        // Lifting a restriction that never applied is a no-op.
        edge.unrestrict(500.0).unwrap();
        assert_eq!(
            edge.unrestrict(50.0),
            Err(ActionError::NotActive("MovementRestrictions"))
        );
    }

    #[test]
    fn test_logistic_pressure_shape() {
        assert!(infectious_pressure(0.0) < 0.01);
        assert!((infectious_pressure(0.5) - 0.5).abs() < 1e-12);
        assert!(infectious_pressure(1.0) > 0.99);
        assert!(infectious_pressure(0.2) < infectious_pressure(0.4));
    }
}
