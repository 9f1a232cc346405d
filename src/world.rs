// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - World Orchestration

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actions::{resolve_location, Action, ActionError, Directive, Phase};
use crate::conservation::PopulationLedger;
use crate::edge::Edge;
use crate::node::Node;
use crate::tracking::InfectionHistory;
use crate::types::{DataError, InfectionTotals, VirusProfile, WorldData, GLOBAL};

// ─── Treasury coefficients ──────────────────────────────────────────────────

/// Daily treasury increase per serious-or-dead head in the tracked node.
const BUDGET_INCREASE_PER_CASE: i64 = 10;
/// Daily interest rate on outstanding loans.
const LOAN_DAILY_INTEREST: f64 = 0.001;
/// Daily passive progress toward a deployable vaccine.
const VACCINE_DAILY_PROGRESS: f64 = 1.0 / 300.0;
/// Head-count of the randomly-placed patient-zero outbreak.
const INITIAL_INFECTIONS: i64 = 2;

// ─── Action costs ───────────────────────────────────────────────────────────

const GOOD_TEST_COST: i64 = 3;
const BAD_TEST_COST: i64 = 1;
const STAY_AT_HOME_COST: i64 = 500;
const CLOSE_SCHOOLS_COST: i64 = 300;
const CLOSE_RECREATION_COST: i64 = 200;
const SHIELDING_COST: i64 = 250;
const MOVEMENT_RESTRICTIONS_COST: i64 = 150;
const CLOSE_BORDERS_COST: i64 = 400;
const MASK_MANDATE_COST: i64 = 100;
const HEALTH_DRIVE_COST: i64 = 150;
const SOCIAL_DISTANCING_COST: i64 = 100;
const CURFEW_COST: i64 = 350;
const VACCINE_DOSE_COST: i64 = 2;
/// A press release costs one unit per this many living residents.
const PRESS_RELEASE_COST_DIVISOR: i64 = 100;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("world definition invalid: {0}")]
    Data(#[from] DataError),
    #[error("world definition has no nodes")]
    Empty,
    #[error("node {node} out of range ({count} nodes)")]
    NodeOutOfRange { node: usize, count: usize },
    #[error("population conservation violated on day {day}: {error} heads lost or duplicated")]
    ConservationViolated { day: u32, error: i64 },
}

// ---------------------------------------------------------------------------
// Turn flag
// ---------------------------------------------------------------------------

/// Which side of the command loop acts next. The transport layer polls
/// this to know whether the health authority may still issue directives
/// for the current day or the engine is due to tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// The policy layer may issue directives.
    Authority,
    /// Directives are in; the engine should advance the day.
    Engine,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The whole simulated territory: a graph of nodes joined by transport
/// edges, a shared virus profile, a treasury, and the daily tick that
/// drives them. All randomness flows from the construction seed, so two
/// worlds built from the same data and seed replay identically.
#[derive(Debug, Clone)]
pub struct World {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Edge indices incident to each node.
    adjacency: Vec<Vec<usize>>,
    /// Active movement-restriction distance per node.
    restrictions: Vec<Option<f64>>,
    virus: VirusProfile,

    budget: i64,
    /// Costs and credits accumulated since the last tick, settled once
    /// during the treasury step and then cleared.
    pending_charges: i64,
    outstanding_loans: i64,
    vaccine_progress: f64,

    turn: u32,
    turn_state: TurnState,
    ledger: PopulationLedger,
    history: InfectionHistory,
    rng: ChaCha8Rng,
}

impl World {
    pub fn from_data(data: &WorldData, seed: u64) -> Result<Self, WorldError> {
        if data.nodes.is_empty() {
            return Err(WorldError::Empty);
        }
        let virus = VirusProfile::from_data(&data.virus)?;

        let mut nodes = Vec::with_capacity(data.nodes.len());
        for (i, node_data) in data.nodes.iter().enumerate() {
            nodes.push(Node::from_data(i as u32, node_data, seed)?);
        }

        let mut edges = Vec::with_capacity(data.edges.len());
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (i, edge_data) in data.edges.iter().enumerate() {
            let edge = Edge::from_data(i, edge_data, nodes.len(), seed)?;
            adjacency[edge.left() as usize].push(i);
            adjacency[edge.right() as usize].push(i);
            edges.push(edge);
        }

        let census: Vec<i64> = nodes.iter().map(|n| n.totals().census()).collect();
        let history = InfectionHistory::new(nodes.len());

        log::info!(
            "world built: {} nodes, {} edges, budget {}",
            nodes.len(),
            edges.len(),
            data.budget
        );

        Ok(Self {
            nodes,
            edges,
            adjacency,
            restrictions: vec![None; data.nodes.len()],
            virus,
            budget: data.budget,
            pending_charges: 0,
            outstanding_loans: 0,
            vaccine_progress: 0.0,
            turn: 0,
            turn_state: TurnState::Authority,
            ledger: PopulationLedger::strict(census),
            history,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn day(&self) -> u32 {
        self.turn
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn budget(&self) -> i64 {
        self.budget
    }

    pub fn outstanding_loans(&self) -> i64 {
        self.outstanding_loans
    }

    pub fn vaccine_progress(&self) -> f64 {
        self.vaccine_progress
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn history(&self) -> &InfectionHistory {
        &self.history
    }

    /// World-wide compartment totals, tagged with the `GLOBAL` location.
    pub fn global_totals(&self) -> InfectionTotals {
        self.nodes
            .iter()
            .fold(InfectionTotals::zero(GLOBAL), |acc, n| acc + *n.totals())
    }

    // ─── Seeding ────────────────────────────────────────────────────────────

    /// Place patient zero: infect two people at a randomly chosen node
    /// and record the day-zero snapshot. This draw is the simulation's
    /// only entropy source for outbreak placement. Returns the chosen
    /// node index.
    pub fn start_infection(&mut self) -> usize {
        let node = self.rng.gen_range(0..self.nodes.len());
        self.nodes[node].infect(INITIAL_INFECTIONS);
        let totals: Vec<InfectionTotals> = self.nodes.iter().map(|n| *n.totals()).collect();
        self.history.record(self.turn, totals);
        log::info!("patient zero placed at {}", self.nodes[node].name());
        node
    }

    /// Seed an outbreak at a specific node: move up to `count` people
    /// into the latent compartment. Returns the number actually infected.
    pub fn start_infection_at(&mut self, node: usize, count: i64) -> Result<i64, WorldError> {
        let node_count = self.nodes.len();
        let target = self
            .nodes
            .get_mut(node)
            .ok_or(WorldError::NodeOutOfRange {
                node,
                count: node_count,
            })?;
        let applied = target.infect(count);
        log::info!("seeded {} infections at {}", applied, target.name());
        Ok(applied)
    }

    // ─── Daily tick ─────────────────────────────────────────────────────────

    /// Advance the world one day:
    ///
    /// 1. every edge moves infection between its endpoints, reading the
    ///    previous day's totals and accumulating inbound cases per node,
    /// 2. every node resolves its internal dynamics, absorbs its inbound
    ///    cases, and reports its serious-and-dead count to the treasury,
    /// 3. cohort windows roll forward,
    /// 4. the day's totals are recorded,
    /// 5. the treasury settles income, interest, and pending charges,
    /// 6. vaccine research advances,
    /// 7. the population ledger audits every node.
    pub fn update(&mut self) -> Result<(), WorldError> {
        self.turn += 1;

        let mut inflow = vec![0i64; self.nodes.len()];
        for edge in &mut self.edges {
            let left = *self.nodes[edge.left() as usize].totals();
            let right = *self.nodes[edge.right() as usize].totals();
            let infectivity = (self.nodes[edge.left() as usize]
                .demographics()
                .weighted_rate(self.virus.infectivity())
                + self.nodes[edge.right() as usize]
                    .demographics()
                    .weighted_rate(self.virus.infectivity()))
                / 2.0;
            let (into_left, into_right) = edge.update(&left, &right, infectivity);
            inflow[edge.left() as usize] += into_left;
            inflow[edge.right() as usize] += into_right;
        }

        let mut budget_increase = 0;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.update(&self.virus);
            node.infect(inflow[i]);
            // TODO: accumulate with += here; as written the last node's
            // contribution overwrites the rest. Fixing it re-baselines
            // every recorded scenario balance, so it ships as-is for now.
            budget_increase =
                BUDGET_INCREASE_PER_CASE * (node.totals().serious + node.totals().dead);
        }

        for node in &mut self.nodes {
            node.increment_head();
        }

        let totals: Vec<InfectionTotals> = self.nodes.iter().map(|n| *n.totals()).collect();
        self.history.record(self.turn, totals.clone());

        self.settle_budget(budget_increase);
        self.vaccine_progress = (self.vaccine_progress + VACCINE_DAILY_PROGRESS).min(1.0);

        let result = self.ledger.verify_tick(&totals);
        if !result.balanced {
            log::warn!(
                "day {}: compartment sums off census by {}",
                self.turn,
                result.error
            );
        }
        if result.circuit_breaker_tripped {
            return Err(WorldError::ConservationViolated {
                day: self.turn,
                error: result.error,
            });
        }

        self.turn_state = TurnState::Authority;
        let global = self.global_totals();
        log::debug!(
            "day {}: {} infected, {} dead, budget {}",
            self.turn,
            global.infected(),
            global.dead,
            self.budget
        );
        Ok(())
    }

    fn settle_budget(&mut self, budget_increase: i64) {
        self.budget += budget_increase;
        self.budget -= (self.outstanding_loans as f64 * LOAN_DAILY_INTEREST) as i64;
        self.budget += self.pending_charges;
        self.pending_charges = 0;
    }

    // ─── Policy dispatch ────────────────────────────────────────────────────

    /// Apply a batch of directives and hand the turn to the engine. Each
    /// directive succeeds or fails on its own; one rejected action never
    /// blocks the rest of the batch.
    pub fn apply_actions(&mut self, directives: &[Directive]) -> Vec<Result<(), ActionError>> {
        let results = directives
            .iter()
            .map(|directive| {
                let result = self.apply_directive(directive);
                if let Err(ref error) = result {
                    log::warn!("{} rejected: {}", directive.action.name(), error);
                }
                result
            })
            .collect();
        self.turn_state = TurnState::Engine;
        results
    }

    fn apply_directive(&mut self, directive: &Directive) -> Result<(), ActionError> {
        directive.action.validate()?;
        let node_index = resolve_location(&directive.location, self.nodes.len())?;

        let cost = self.action_cost(directive.phase, &directive.action, node_index);
        let available = self.budget + self.pending_charges;
        if cost > available {
            return Err(ActionError::InsufficientBudget { cost, available });
        }
        self.pending_charges -= cost;

        let result = self.dispatch(directive.phase, &directive.action, node_index);
        if result.is_err() {
            // Refund: a rejected action must not leave a pending charge.
            self.pending_charges += cost;
        }
        result
    }

    /// Cost charged against the treasury at the next settlement. Negative
    /// values are credits (loans).
    fn action_cost(&self, phase: Phase, action: &Action, node_index: usize) -> i64 {
        if phase == Phase::Delete {
            return match *action {
                Action::TakeLoan { amount } => amount,
                _ => 0,
            };
        }
        match *action {
            Action::TestAndIsolate {
                good_tests,
                bad_tests,
                ..
            } => good_tests * GOOD_TEST_COST + bad_tests * BAD_TEST_COST,
            Action::StayAtHomeOrder => STAY_AT_HOME_COST,
            Action::CloseSchools => CLOSE_SCHOOLS_COST,
            Action::CloseRecreationalAreas => CLOSE_RECREATION_COST,
            Action::ShieldingProgram => SHIELDING_COST,
            Action::MovementRestrictions { .. } => MOVEMENT_RESTRICTIONS_COST,
            Action::CloseBorders => CLOSE_BORDERS_COST,
            Action::FurloughScheme { amount } => amount,
            Action::InformationPressRelease => {
                self.nodes[node_index].totals().living() / PRESS_RELEASE_COST_DIVISOR
            }
            Action::MaskMandate { .. } => MASK_MANDATE_COST,
            Action::HealthDrive => HEALTH_DRIVE_COST,
            Action::SocialDistancing { .. } => SOCIAL_DISTANCING_COST,
            Action::InvestInHealthServices { amount } => amount,
            Action::Curfew => CURFEW_COST,
            Action::AdministerVaccine { quantity, .. } => quantity * VACCINE_DOSE_COST,
            Action::TakeLoan { amount } => -amount,
        }
    }

    fn dispatch(
        &mut self,
        phase: Phase,
        action: &Action,
        node_index: usize,
    ) -> Result<(), ActionError> {
        match (phase, action) {
            (
                Phase::Create,
                Action::TestAndIsolate {
                    good_tests,
                    bad_tests,
                    symptomatic_only,
                    quarantine_period,
                },
            ) => self.nodes[node_index].test_and_isolate(
                *good_tests,
                *bad_tests,
                *symptomatic_only,
                *quarantine_period,
            ),
            (Phase::Delete, Action::TestAndIsolate { .. }) => {
                self.nodes[node_index].cancel_test_and_isolate()
            }

            (Phase::Create, Action::StayAtHomeOrder) => {
                self.nodes[node_index].stay_at_home_order()
            }
            (Phase::Delete, Action::StayAtHomeOrder) => {
                self.nodes[node_index].cancel_stay_at_home_order()
            }

            (Phase::Create, Action::CloseSchools) => self.nodes[node_index].close_schools(),
            (Phase::Delete, Action::CloseSchools) => {
                self.nodes[node_index].cancel_close_schools()
            }

            // TODO: wire this arm to close_recreational_areas. It invokes
            // the cancel mutator, matching the legacy dispatch table, so
            // creating the closure reports NotActive instead of closing.
            (Phase::Create, Action::CloseRecreationalAreas) => {
                self.nodes[node_index].cancel_close_recreational_areas()
            }
            (Phase::Delete, Action::CloseRecreationalAreas) => {
                self.nodes[node_index].cancel_close_recreational_areas()
            }

            (Phase::Create, Action::ShieldingProgram) => {
                self.nodes[node_index].shielding_program()
            }
            (Phase::Delete, Action::ShieldingProgram) => {
                self.nodes[node_index].cancel_shielding_program()
            }

            (Phase::Create, Action::MovementRestrictions { max_distance_km }) => {
                if self.restrictions[node_index].is_some() {
                    return Err(ActionError::AlreadyActive("MovementRestrictions"));
                }
                for &edge in &self.adjacency[node_index] {
                    self.edges[edge].restrict(*max_distance_km);
                }
                self.restrictions[node_index] = Some(*max_distance_km);
                Ok(())
            }
            (Phase::Delete, Action::MovementRestrictions { .. }) => {
                let max_distance_km = self.restrictions[node_index]
                    .take()
                    .ok_or(ActionError::NotActive("MovementRestrictions"))?;
                for &edge in &self.adjacency[node_index] {
                    self.edges[edge].unrestrict(max_distance_km)?;
                }
                Ok(())
            }

            (Phase::Create, Action::CloseBorders) => {
                self.nodes[node_index].close_borders()?;
                for &edge in &self.adjacency[node_index] {
                    self.edges[edge].close();
                }
                Ok(())
            }
            (Phase::Delete, Action::CloseBorders) => {
                self.nodes[node_index].cancel_close_borders()?;
                for &edge in &self.adjacency[node_index] {
                    self.edges[edge].open()?;
                }
                Ok(())
            }

            (Phase::Create, Action::FurloughScheme { .. }) => {
                self.nodes[node_index].furlough_scheme()
            }
            (Phase::Delete, Action::FurloughScheme { .. }) => {
                self.nodes[node_index].cancel_furlough_scheme()
            }

            (Phase::Create, Action::InformationPressRelease) => {
                self.nodes[node_index].information_press_release()
            }
            (Phase::Delete, Action::InformationPressRelease) => {
                self.nodes[node_index].cancel_information_press_release()
            }

            (Phase::Create, Action::MaskMandate { level }) => {
                self.nodes[node_index].mask_mandate(*level)
            }
            (Phase::Delete, Action::MaskMandate { .. }) => {
                self.nodes[node_index].cancel_mask_mandate()
            }

            (Phase::Create, Action::HealthDrive) => self.nodes[node_index].health_drive(),
            (Phase::Delete, Action::HealthDrive) => {
                self.nodes[node_index].cancel_health_drive()
            }

            (Phase::Create, Action::SocialDistancing { distance_m }) => {
                self.nodes[node_index].social_distancing(*distance_m)
            }
            (Phase::Delete, Action::SocialDistancing { .. }) => {
                self.nodes[node_index].cancel_social_distancing()
            }

            (Phase::Create, Action::InvestInHealthServices { amount }) => {
                self.nodes[node_index].invest_in_health_services(*amount)
            }
            (Phase::Delete, Action::InvestInHealthServices { .. }) => {
                self.nodes[node_index].cancel_invest_in_health_services()
            }

            (Phase::Create, Action::Curfew) => self.nodes[node_index].curfew(),
            (Phase::Delete, Action::Curfew) => self.nodes[node_index].cancel_curfew(),

            (Phase::Create, Action::AdministerVaccine { quantity, min_age }) => {
                if self.vaccine_progress < 1.0 {
                    return Err(ActionError::VaccineNotReady);
                }
                self.nodes[node_index].administer_vaccine(*quantity, *min_age)
            }
            (Phase::Delete, Action::AdministerVaccine { .. }) => {
                self.nodes[node_index].cancel_administer_vaccine()
            }

            (Phase::Create, Action::TakeLoan { amount }) => {
                self.outstanding_loans += amount;
                Ok(())
            }
            (Phase::Delete, Action::TakeLoan { amount }) => {
                if self.outstanding_loans == 0 {
                    return Err(ActionError::NotActive("TakeLoan"));
                }
                self.outstanding_loans = (self.outstanding_loans - amount).max(0);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Demographics, EdgeData, NodeData, VirusData};

    fn node_data(name: &str, population: i64, gdp: f64) -> NodeData {
        NodeData {
            name: name.to_string(),
            population,
            demographics: Demographics::uniform(),
            interactivity: 0.5,
            gdp,
            test_capacity: 100,
            position: (0.0, 0.0),
            base_compliance: 0.8,
        }
    }

    fn quiet_virus_data() -> VirusData {
        let zero = Demographics::flat(0.0).unwrap();
        VirusData {
            infectivity: zero,
            fatality: zero,
            reinfectivity: zero,
            symptomatic_rate: zero,
            serious_rate: zero,
        }
    }

    fn two_node_world_data() -> WorldData {
        WorldData {
            nodes: vec![
                node_data("Alderton", 10_000, 1.0),
                node_data("Briarfield", 20_000, 2.0),
            ],
            edges: vec![EdgeData {
                name: "Alderton-Briarfield rail".to_string(),
                left: 0,
                right: 1,
                population: 500,
                interactivity: 0.3,
                distance_km: 80.0,
            }],
            virus: quiet_virus_data(),
            budget: 100_000,
        }
    }

    fn quiet_world() -> World {
        World::from_data(&two_node_world_data(), 7).unwrap()
    }

    #[test]
    fn test_empty_world_rejected() {
        let data = WorldData {
            nodes: Vec::new(),
            edges: Vec::new(),
            virus: quiet_virus_data(),
            budget: 0,
        };
        assert_eq!(World::from_data(&data, 7).err(), Some(WorldError::Empty));
    }

    #[test]
    fn test_dangling_edge_rejected_at_build() {
        let mut data = two_node_world_data();
        data.edges[0].right = 9;
        assert!(matches!(
            World::from_data(&data, 7),
            Err(WorldError::Data(DataError::DanglingEdge { .. }))
        ));
    }

    #[test]
    fn test_start_infection_at_bounds() {
        let mut world = quiet_world();
        assert_eq!(world.start_infection_at(0, 50).unwrap(), 50);
        assert_eq!(
            world.start_infection_at(5, 1),
            Err(WorldError::NodeOutOfRange { node: 5, count: 2 })
        );
    }

    #[test]
    fn test_start_infection_places_patient_zero() {
        let mut world = quiet_world();
        let node = world.start_infection();
        assert!(node < 2);
        assert_eq!(world.nodes()[node].totals().asymptomatic_latent, 2);
        assert_eq!(world.global_totals().infected(), 2);
        // The placement snapshot is on record before any tick.
        assert_eq!(world.history().len(), 1);
        assert_eq!(world.history().latest().unwrap().day, 0);
    }

    #[test]
    fn test_turn_alternates_between_authority_and_engine() {
        let mut world = quiet_world();
        assert_eq!(world.turn_state(), TurnState::Authority);
        world.apply_actions(&[Directive::create("N0", Action::Curfew)]);
        assert_eq!(world.turn_state(), TurnState::Engine);
        world.update().unwrap();
        assert_eq!(world.turn_state(), TurnState::Authority);
    }

    #[test]
    fn test_update_conserves_census() {
        let mut data = two_node_world_data();
        let tenth = Demographics::flat(0.1).unwrap();
        data.virus.infectivity = tenth;
        data.virus.symptomatic_rate = tenth;
        data.virus.serious_rate = tenth;
        data.virus.fatality = tenth;
        let mut world = World::from_data(&data, 11).unwrap();
        world.start_infection_at(0, 100).unwrap();
        for _ in 0..60 {
            world.update().unwrap();
        }
        let global = world.global_totals();
        assert_eq!(global.census(), 30_000);
    }

    fn outbreak_world(seed_node: usize) -> World {
        let one = Demographics::flat(1.0).unwrap();
        let zero = Demographics::flat(0.0).unwrap();
        let data = WorldData {
            nodes: vec![
                node_data("Hotspot", 10_000, 1.0),
                node_data("Clearwater", 10_000, 1.0),
            ],
            edges: Vec::new(),
            virus: VirusData {
                infectivity: zero,
                fatality: zero,
                reinfectivity: zero,
                symptomatic_rate: one,
                serious_rate: one,
            },
            budget: 100_000,
        };
        let mut world = World::from_data(&data, 7).unwrap();
        world.start_infection_at(seed_node, 100).unwrap();
        world
    }

    #[test]
    fn test_budget_income_takes_last_node_only() {
        // Income is 10 per serious-or-dead head, but only the final node
        // in the arena is counted (see the TODO in update()).
        let mut infected_first = outbreak_world(0);
        let mut infected_last = outbreak_world(1);
        for _ in 0..11 {
            infected_first.update().unwrap();
            infected_last.update().unwrap();
        }
        assert_eq!(infected_first.nodes()[0].totals().serious, 100);
        assert_eq!(infected_first.budget(), 100_000);
        assert_eq!(infected_last.budget(), 100_000 + 1_000);
    }

    #[test]
    fn test_charges_settle_once_at_tick() {
        let mut world = quiet_world();
        let before = world.budget();
        let results = world.apply_actions(&[Directive::create("N0", Action::StayAtHomeOrder)]);
        assert_eq!(results, vec![Ok(())]);
        // Charged at settlement, not at issue time.
        assert_eq!(world.budget(), before);
        world.update().unwrap();
        assert_eq!(world.budget(), before - 500);
        world.update().unwrap();
        assert_eq!(world.budget(), before - 500);
    }

    #[test]
    fn test_insufficient_budget_rejected() {
        let mut data = two_node_world_data();
        data.budget = 100;
        let mut world = World::from_data(&data, 7).unwrap();
        let results = world.apply_actions(&[Directive::create("N0", Action::StayAtHomeOrder)]);
        assert_eq!(
            results,
            vec![Err(ActionError::InsufficientBudget {
                cost: 500,
                available: 100,
            })]
        );
    }

    #[test]
    fn test_rejected_action_refunds_pending_charge() {
        let mut world = quiet_world();
        let before = world.budget();
        // Cancelling an order that was never issued fails after the charge
        // was staged; the refund must leave the treasury untouched.
        let results = world.apply_actions(&[Directive::delete("N0", Action::Curfew)]);
        assert_eq!(results, vec![Err(ActionError::NotActive("Curfew"))]);
        world.update().unwrap();
        assert_eq!(world.budget(), before);
    }

    #[test]
    fn test_batch_errors_are_isolated() {
        let mut world = quiet_world();
        let results = world.apply_actions(&[
            Directive::create("N9", Action::Curfew),
            Directive::create("N0", Action::Curfew),
            Directive::create("N0", Action::Curfew),
        ]);
        assert_eq!(
            results,
            vec![
                Err(ActionError::UnknownLocation("N9".to_string())),
                Ok(()),
                Err(ActionError::AlreadyActive("Curfew")),
            ]
        );
        assert!(world.nodes()[0].interactivity() < 0.5);
    }

    #[test]
    fn test_close_recreational_create_hits_cancel_path() {
        let mut world = quiet_world();
        let results =
            world.apply_actions(&[Directive::create("N0", Action::CloseRecreationalAreas)]);
        assert_eq!(
            results,
            vec![Err(ActionError::NotActive("CloseRecreationalAreas"))]
        );
    }

    #[test]
    fn test_close_borders_closes_incident_edges() {
        let mut world = quiet_world();
        let results = world.apply_actions(&[Directive::create("N0", Action::CloseBorders)]);
        assert_eq!(results, vec![Ok(())]);
        assert!(world.edges()[0].is_closed());
        assert_eq!(world.edges()[0].population(), 50);

        let results = world.apply_actions(&[Directive::delete("N0", Action::CloseBorders)]);
        assert_eq!(results, vec![Ok(())]);
        assert!(!world.edges()[0].is_closed());
        assert_eq!(world.edges()[0].population(), 500);
    }

    #[test]
    fn test_movement_restrictions_walk_adjacency() {
        let mut world = quiet_world();
        let action = Action::MovementRestrictions {
            max_distance_km: 50.0,
        };
        assert_eq!(
            world.apply_actions(&[Directive::create("N0", action.clone())]),
            vec![Ok(())]
        );
        assert!(world.edges()[0].is_restricted());
        assert_eq!(
            world.apply_actions(&[Directive::create("N0", action.clone())]),
            vec![Err(ActionError::AlreadyActive("MovementRestrictions"))]
        );
        assert_eq!(
            world.apply_actions(&[Directive::delete("N0", action)]),
            vec![Ok(())]
        );
        assert!(!world.edges()[0].is_restricted());
    }

    #[test]
    fn test_vaccine_gated_on_research() {
        let mut world = quiet_world();
        let action = Action::AdministerVaccine {
            quantity: 100,
            min_age: 50,
        };
        assert_eq!(
            world.apply_actions(&[Directive::create("N0", action.clone())]),
            vec![Err(ActionError::VaccineNotReady)]
        );
        for _ in 0..320 {
            world.update().unwrap();
        }
        assert_eq!(world.vaccine_progress(), 1.0);
        assert_eq!(
            world.apply_actions(&[Directive::create("N0", action)]),
            vec![Ok(())]
        );
    }

    #[test]
    fn test_loan_credits_then_accrues_interest() {
        let mut world = quiet_world();
        let before = world.budget();
        let results = world.apply_actions(&[Directive::create(
            "N0",
            Action::TakeLoan { amount: 1_000_000 },
        )]);
        assert_eq!(results, vec![Ok(())]);
        assert_eq!(world.outstanding_loans(), 1_000_000);
        world.update().unwrap();
        // Credited principal, minus one day of interest.
        assert_eq!(world.budget(), before + 1_000_000 - 1_000);
    }

    #[test]
    fn test_history_records_each_day() {
        let mut world = quiet_world();
        for _ in 0..5 {
            world.update().unwrap();
        }
        assert_eq!(world.history().len(), 5);
        assert_eq!(world.history().latest().unwrap().day, 5);
        let global = world.history().global_on_day(4).unwrap();
        assert_eq!(global.census(), 30_000);
    }
}
