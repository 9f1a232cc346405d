// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Node Simulation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actions::{ActionError, MaskLevel};
use crate::lag::{LagBuffer, MAX_LAG_DAYS};
use crate::types::{DataError, Demographics, InfectionTotals, NodeData, VirusProfile};

// ─── Transition lags (days since entering the stage) ─────────────────────────

/// Latent carriers become infectious two days after infection.
const INFECTIOUS_LAG: i64 = -2;
/// A symptomatic-rate share of each cohort develops symptoms at day four.
const SYMPTOM_ONSET_LAG: i64 = -4;
/// A serious-rate share of each symptomatic cohort worsens at day six.
const SERIOUS_ONSET_LAG: i64 = -6;
/// A fatality-rate share of each serious cohort dies at day eight.
const FATALITY_LAG: i64 = -8;

// ─── Testing ────────────────────────────────────────────────────────────────

const GOOD_TEST_EFFICACY: f64 = 0.7;
const BAD_TEST_EFFICACY: f64 = 0.5;

// ─── Policy coefficients ────────────────────────────────────────────────────
//
// Contact cuts are the interactivity fraction removed at full compliance;
// GDP/opinion factors apply unscaled. Cancellation divides the same factors
// back out, using the compliance captured when the policy activated.

const STAY_AT_HOME_CUT: f64 = 0.50;
const STAY_AT_HOME_GDP: f64 = 0.85;
const STAY_AT_HOME_OPINION: f64 = 0.90;

const CLOSE_SCHOOLS_CUT: f64 = 0.60; // scaled by the under-18 share
const CLOSE_SCHOOLS_GDP: f64 = 0.95;
const CLOSE_SCHOOLS_OPINION: f64 = 0.95;

const CLOSE_RECREATION_CUT: f64 = 0.40;
const CLOSE_RECREATION_GDP: f64 = 0.90;
const CLOSE_RECREATION_OPINION: f64 = 0.93;

const SHIELDING_CUT: f64 = 0.80; // scaled by the 65+ share
const SHIELDING_OPINION: f64 = 0.97;

const CLOSE_BORDERS_GDP: f64 = 0.92;
const CLOSE_BORDERS_OPINION: f64 = 0.95;

const FURLOUGH_CUT: f64 = 0.10;
const FURLOUGH_GDP: f64 = 0.97;
const FURLOUGH_OPINION: f64 = 1.05;

const PRESS_RELEASE_OPINION: f64 = 1.02;
const PRESS_RELEASE_COMPLIANCE_BOOST: f64 = 0.03;

const MASK_OPINION: f64 = 0.98;

const HEALTH_DRIVE_OPINION: f64 = 1.05;
const HEALTH_DRIVE_COMPLIANCE_BOOST: f64 = 0.05;

const DISTANCING_CUT_PER_METRE: f64 = 0.10;
const DISTANCING_MAX_CUT: f64 = 0.50;
const DISTANCING_GDP: f64 = 0.96;
const DISTANCING_OPINION: f64 = 0.94;

const CURFEW_CUT: f64 = 0.35;
const CURFEW_GDP: f64 = 0.93;
const CURFEW_OPINION: f64 = 0.88;

/// Spend scale at which health investment halves local lethality.
const HEALTH_INVESTMENT_SCALE: f64 = 50_000.0;

/// Daily drift of the compliance modifier toward public opinion.
const OPINION_DRIFT: f64 = 0.01;

// ─── Stochastic rounding ────────────────────────────────────────────────────

/// Floor plus a single Bernoulli draw on the fractional remainder — the
/// simulation's only use of randomness inside a tick. No draw is consumed
/// when the remainder is zero, so fully-damped paths stay deterministic.
pub(crate) fn stochastic_round<R: Rng>(value: f64, rng: &mut R) -> i64 {
    let floor = value.floor();
    let frac = value - floor;
    let mut n = floor as i64;
    if frac > 0.0 && rng.gen::<f64>() < frac {
        n += 1;
    }
    n
}

// ─── Activation snapshots ───────────────────────────────────────────────────

/// Compliance captured when each policy activated. Compliance drifts while
/// a policy is active, so cancellation must invert with the saved value,
/// not the current one.
#[derive(Debug, Clone, Default)]
struct ActivePolicies {
    stay_at_home: Option<f64>,
    close_schools: Option<f64>,
    close_recreation: Option<f64>,
    shielding: Option<f64>,
    borders: Option<f64>,
    furlough: Option<f64>,
    mask: Option<(MaskLevel, f64)>,
    distancing: Option<(f64, f64)>,
    curfew: Option<f64>,
    /// Saved lethality factor, not compliance: investment is not
    /// compliance-scaled.
    health_investment: Option<f64>,
}

// ─── Node ───────────────────────────────────────────────────────────────────

/// One geographic location: compartment counts, cohort lag buffers, and
/// the policy levers acting on them. Created once at world-build time and
/// never destroyed; a node whose population dies out persists.
#[derive(Debug, Clone)]
pub struct Node {
    index: u32,
    name: String,
    totals: InfectionTotals,
    demographics: Demographics,

    base_interactivity: f64,
    interactivity: f64,
    gdp: f64,
    public_opinion: f64,

    base_compliance: f64,
    compliance_modifier: f64,
    compliance: f64,
    lethality_modifier: f64,

    asymptomatic: LagBuffer,
    symptomatic: LagBuffer,
    serious: LagBuffer,
    isolation_history: LagBuffer,
    false_isolation_history: LagBuffer,
    isolated: i64,
    false_isolated: i64,

    testing_active: bool,
    symptomatic_only: bool,
    quarantine_period: u32,
    test_capacity: i64,
    good_tests: i64,
    bad_tests: i64,

    vaccination: Option<(i64, u32)>,
    press_releases: u32,
    active: ActivePolicies,

    rng: ChaCha8Rng,
}

impl Node {
    pub fn from_data(index: u32, data: &NodeData, world_seed: u64) -> Result<Self, DataError> {
        if data.population < 0 {
            return Err(DataError::NegativePopulation(data.population));
        }
        // Serde's transparent representation bypasses the constructor
        // check, so deserialized world files are re-validated here.
        let demographics = Demographics::new(*data.demographics.buckets())?;
        let rng = ChaCha8Rng::seed_from_u64(
            world_seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        Ok(Self {
            index,
            name: data.name.clone(),
            totals: InfectionTotals::new(index, data.population),
            demographics,
            base_interactivity: data.interactivity,
            interactivity: data.interactivity,
            gdp: data.gdp,
            public_opinion: 1.0,
            base_compliance: data.base_compliance,
            compliance_modifier: 1.0,
            compliance: data.base_compliance,
            lethality_modifier: 1.0,
            asymptomatic: LagBuffer::daily(),
            symptomatic: LagBuffer::daily(),
            serious: LagBuffer::daily(),
            isolation_history: LagBuffer::daily(),
            false_isolation_history: LagBuffer::daily(),
            isolated: 0,
            false_isolated: 0,
            testing_active: false,
            symptomatic_only: false,
            quarantine_period: MAX_LAG_DAYS as u32,
            test_capacity: data.test_capacity,
            good_tests: 0,
            bad_tests: 0,
            vaccination: None,
            press_releases: 0,
            active: ActivePolicies::default(),
            rng,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn totals(&self) -> &InfectionTotals {
        &self.totals
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn interactivity(&self) -> f64 {
        self.interactivity
    }

    pub fn gdp(&self) -> f64 {
        self.gdp
    }

    pub fn public_opinion(&self) -> f64 {
        self.public_opinion.clamp(0.0, 1.0)
    }

    pub fn compliance(&self) -> f64 {
        self.compliance
    }

    pub fn compliance_modifier(&self) -> f64 {
        self.compliance_modifier
    }

    pub fn lethality_modifier(&self) -> f64 {
        self.lethality_modifier
    }

    pub fn isolated(&self) -> i64 {
        self.isolated
    }

    pub fn falsely_isolated(&self) -> i64 {
        self.false_isolated
    }

    pub fn press_releases(&self) -> u32 {
        self.press_releases
    }

    pub fn raw_opinion(&self) -> f64 {
        self.public_opinion
    }

    // ─── Daily update ───────────────────────────────────────────────────────

    /// Resolve one day of internal dynamics: testing and isolation, local
    /// spread, staged compartment transitions, reinfection, and the
    /// compliance recomputation. External edge inflow is applied afterwards
    /// by the world via [`Node::infect`].
    pub fn update(&mut self, virus: &VirusProfile) {
        self.run_testing();
        self.spread_locally(virus);
        self.advance_transitions(virus);
        self.apply_reinfection(virus);
        self.run_vaccination();
        self.recompute_compliance();
    }

    /// Move `count` people uninfected → asymptomatic-latent, clamped so the
    /// uninfected counter never goes negative. The moved count accumulates
    /// into today's asymptomatic bucket rather than pushing a new one:
    /// local spread and every incident edge land in the same day.
    pub fn infect(&mut self, count: i64) -> i64 {
        let applied = count.clamp(0, self.totals.uninfected);
        self.totals.uninfected -= applied;
        self.totals.asymptomatic_latent += applied;
        self.asymptomatic.add_front(applied);
        applied
    }

    /// Open tomorrow's cohort buckets. Called exactly once per day by the
    /// world, strictly after all infection has been distributed; each
    /// eviction releases the survivors of a fully-elapsed 14-day window
    /// into the recovered compartment.
    pub fn increment_head(&mut self) {
        let survivors = self.asymptomatic.push(0);
        self.totals.asymptomatic_infectious -= survivors;
        self.totals.recovered += survivors;

        let survivors = self.symptomatic.push(0);
        self.totals.symptomatic -= survivors;
        self.totals.recovered += survivors;

        let survivors = self.serious.push(0);
        self.totals.serious -= survivors;
        self.totals.recovered += survivors;
    }

    // ─── Update phases ──────────────────────────────────────────────────────

    fn run_testing(&mut self) {
        let (newly_isolated, falsely_isolated) = if self.testing_active && self.test_capacity > 0
        {
            self.run_tests_today()
        } else {
            (0, 0)
        };

        // Cohorts that finished a shortened quarantine leave isolation
        // before the 14-day window would evict them. A cohort pushed q
        // updates ago sits at offset -(q-1) just before today's push.
        if (self.quarantine_period as usize) < MAX_LAG_DAYS {
            let offset = -(self.quarantine_period as i64 - 1);
            self.isolated -= self.isolation_history.take(offset);
            self.false_isolated -= self.false_isolation_history.take(offset);
        }

        let released = self.isolation_history.push(newly_isolated);
        self.isolated = (self.isolated + newly_isolated - released).max(0);
        let released = self.false_isolation_history.push(falsely_isolated);
        self.false_isolated = (self.false_isolated + falsely_isolated - released).max(0);
    }

    fn run_tests_today(&mut self) -> (i64, i64) {
        let living = self.totals.living();
        if living <= 0 {
            return (0, 0);
        }
        let pool = if self.symptomatic_only {
            self.totals.symptomatic
        } else {
            self.totals.infected()
        };

        // Good stock is drawn down first; bad tests fill remaining capacity.
        let good_used = self.good_tests.min(self.test_capacity);
        let bad_used = self.bad_tests.min(self.test_capacity - good_used);
        self.good_tests -= good_used;
        self.bad_tests -= bad_used;

        let infected_share = (pool as f64 / living as f64).clamp(0.0, 1.0);
        let true_hits = (good_used as f64 * GOOD_TEST_EFFICACY
            + bad_used as f64 * BAD_TEST_EFFICACY)
            * infected_share;
        let false_hits = (good_used as f64 * (1.0 - GOOD_TEST_EFFICACY)
            + bad_used as f64 * (1.0 - BAD_TEST_EFFICACY))
            * (1.0 - infected_share);

        let newly = ((true_hits * self.compliance).floor() as i64)
            .clamp(0, (pool - self.isolated).max(0));
        let falsely = ((false_hits * self.compliance).floor() as i64)
            .clamp(0, (self.totals.uninfected - self.false_isolated).max(0));
        (newly, falsely)
    }

    fn spread_locally(&mut self, virus: &VirusProfile) {
        let infectious = (self.totals.infectious() - self.isolated).max(0);
        if infectious == 0 || self.totals.uninfected == 0 {
            return;
        }
        // Falsely isolated people shrink the mixing pool but are still
        // counted susceptible; isolation is not airtight for them.
        let mixing = (self.totals.living() - self.false_isolated).max(1);
        let susceptible_share = self.totals.uninfected as f64 / mixing as f64;
        let rate = self.demographics.weighted_rate(virus.infectivity());
        let pressure = infectious as f64 * susceptible_share * self.interactivity * rate;
        let new_cases = stochastic_round(pressure, &mut self.rng);
        self.infect(new_cases);
    }

    fn advance_transitions(&mut self, virus: &VirusProfile) {
        // Day 2: the whole cohort turns infectious.
        let now_infectious = self.asymptomatic.get(INFECTIOUS_LAG);
        self.totals.asymptomatic_latent -= now_infectious;
        self.totals.asymptomatic_infectious += now_infectious;

        // Day 4: symptom onset for a weighted share; they leave the
        // asymptomatic track so only true survivors recover at eviction.
        let cohort = self.asymptomatic.get(SYMPTOM_ONSET_LAG);
        let rate = self.demographics.weighted_rate(virus.symptomatic_rate());
        let onset = (cohort as f64 * rate).floor() as i64;
        self.asymptomatic.add_at(SYMPTOM_ONSET_LAG, -onset);
        self.totals.asymptomatic_infectious -= onset;
        self.totals.symptomatic += onset;
        self.symptomatic.add_front(onset);

        // Day 6 of symptoms: a weighted share worsens to serious.
        let cohort = self.symptomatic.get(SERIOUS_ONSET_LAG);
        let rate = self.demographics.weighted_rate(virus.serious_rate());
        let worsened = (cohort as f64 * rate).floor() as i64;
        self.symptomatic.add_at(SERIOUS_ONSET_LAG, -worsened);
        self.totals.symptomatic -= worsened;
        self.totals.serious += worsened;
        self.serious.add_front(worsened);

        // Day 8 of serious illness: fatality, scaled by local lethality.
        let cohort = self.serious.get(FATALITY_LAG);
        let rate = (self.demographics.weighted_rate(virus.fatality()) * self.lethality_modifier)
            .clamp(0.0, 1.0);
        let deaths = (cohort as f64 * rate).floor() as i64;
        self.serious.add_at(FATALITY_LAG, -deaths);
        self.totals.serious -= deaths;
        self.totals.dead += deaths;
    }

    fn apply_reinfection(&mut self, virus: &VirusProfile) {
        let rate = self.demographics.weighted_rate(virus.reinfectivity());
        let reinfected = (self.totals.recovered as f64 * rate).floor() as i64;
        self.totals.recovered -= reinfected;
        self.totals.uninfected += reinfected;
    }

    fn run_vaccination(&mut self) {
        if let Some((per_day, min_age)) = self.vaccination {
            let eligible_share = self.demographics.share_at_least(min_age);
            let eligible = (self.totals.uninfected as f64 * eligible_share).floor() as i64;
            let doses = per_day.min(eligible).max(0);
            self.totals.uninfected -= doses;
            self.totals.recovered += doses;
        }
    }

    fn recompute_compliance(&mut self) {
        let opinion = self.public_opinion.clamp(0.0, 1.0);
        self.compliance_modifier += (opinion - self.compliance_modifier) * OPINION_DRIFT;
        self.compliance_modifier = self.compliance_modifier.clamp(0.0, 1.0);
        self.compliance = self.base_compliance * self.compliance_modifier;
    }

    /// Adjust the compliance modifier by `delta`, clamped into [0,1].
    pub fn change_compliance_modifier(&mut self, delta: f64) {
        self.compliance_modifier = (self.compliance_modifier + delta).clamp(0.0, 1.0);
        self.compliance = self.base_compliance * self.compliance_modifier;
    }

    // ─── Policy application helpers ─────────────────────────────────────────

    /// Apply a compliance-scaled contact cut plus fixed GDP/opinion factors.
    /// Returns the compliance value to snapshot for cancellation.
    fn apply_scaled(&mut self, cut: f64, gdp_factor: f64, opinion_factor: f64) -> f64 {
        self.interactivity *= 1.0 - cut * self.compliance;
        self.gdp *= gdp_factor;
        self.public_opinion *= opinion_factor;
        self.compliance
    }

    /// Exactly invert [`Node::apply_scaled`] with the snapshotted
    /// compliance, not the current (drifted) one.
    fn invert_scaled(&mut self, cut: f64, gdp_factor: f64, opinion_factor: f64, saved: f64) {
        self.interactivity /= 1.0 - cut * saved;
        self.gdp /= gdp_factor;
        self.public_opinion /= opinion_factor;
    }

    // ─── Policy mutators ────────────────────────────────────────────────────

    pub fn test_and_isolate(
        &mut self,
        good_tests: i64,
        bad_tests: i64,
        symptomatic_only: bool,
        quarantine_period: u32,
    ) -> Result<(), ActionError> {
        if self.testing_active {
            return Err(ActionError::AlreadyActive("TestAndIsolate"));
        }
        self.testing_active = true;
        self.symptomatic_only = symptomatic_only;
        self.quarantine_period = quarantine_period.min(MAX_LAG_DAYS as u32);
        self.good_tests += good_tests;
        self.bad_tests += bad_tests;
        Ok(())
    }

    pub fn cancel_test_and_isolate(&mut self) -> Result<(), ActionError> {
        if !self.testing_active {
            return Err(ActionError::NotActive("TestAndIsolate"));
        }
        self.testing_active = false;
        Ok(())
    }

    pub fn stay_at_home_order(&mut self) -> Result<(), ActionError> {
        if self.active.stay_at_home.is_some() {
            return Err(ActionError::AlreadyActive("StayAtHomeOrder"));
        }
        let saved = self.apply_scaled(STAY_AT_HOME_CUT, STAY_AT_HOME_GDP, STAY_AT_HOME_OPINION);
        self.active.stay_at_home = Some(saved);
        Ok(())
    }

    pub fn cancel_stay_at_home_order(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .stay_at_home
            .take()
            .ok_or(ActionError::NotActive("StayAtHomeOrder"))?;
        self.invert_scaled(STAY_AT_HOME_CUT, STAY_AT_HOME_GDP, STAY_AT_HOME_OPINION, saved);
        Ok(())
    }

    pub fn close_schools(&mut self) -> Result<(), ActionError> {
        if self.active.close_schools.is_some() {
            return Err(ActionError::AlreadyActive("CloseSchools"));
        }
        let cut = CLOSE_SCHOOLS_CUT * self.demographics.share_under(18);
        let saved = self.apply_scaled(cut, CLOSE_SCHOOLS_GDP, CLOSE_SCHOOLS_OPINION);
        self.active.close_schools = Some(saved);
        Ok(())
    }

    pub fn cancel_close_schools(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .close_schools
            .take()
            .ok_or(ActionError::NotActive("CloseSchools"))?;
        let cut = CLOSE_SCHOOLS_CUT * self.demographics.share_under(18);
        self.invert_scaled(cut, CLOSE_SCHOOLS_GDP, CLOSE_SCHOOLS_OPINION, saved);
        Ok(())
    }

    pub fn close_recreational_areas(&mut self) -> Result<(), ActionError> {
        if self.active.close_recreation.is_some() {
            return Err(ActionError::AlreadyActive("CloseRecreationalAreas"));
        }
        let saved = self.apply_scaled(
            CLOSE_RECREATION_CUT,
            CLOSE_RECREATION_GDP,
            CLOSE_RECREATION_OPINION,
        );
        self.active.close_recreation = Some(saved);
        Ok(())
    }

    pub fn cancel_close_recreational_areas(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .close_recreation
            .take()
            .ok_or(ActionError::NotActive("CloseRecreationalAreas"))?;
        self.invert_scaled(
            CLOSE_RECREATION_CUT,
            CLOSE_RECREATION_GDP,
            CLOSE_RECREATION_OPINION,
            saved,
        );
        Ok(())
    }

    pub fn shielding_program(&mut self) -> Result<(), ActionError> {
        if self.active.shielding.is_some() {
            return Err(ActionError::AlreadyActive("ShieldingProgram"));
        }
        let cut = SHIELDING_CUT * self.demographics.share_at_least(65);
        let saved = self.apply_scaled(cut, 1.0, SHIELDING_OPINION);
        self.active.shielding = Some(saved);
        Ok(())
    }

    pub fn cancel_shielding_program(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .shielding
            .take()
            .ok_or(ActionError::NotActive("ShieldingProgram"))?;
        let cut = SHIELDING_CUT * self.demographics.share_at_least(65);
        self.invert_scaled(cut, 1.0, SHIELDING_OPINION, saved);
        Ok(())
    }

    /// Node-side effects of a border closure; the world closes the actual
    /// edges through the adjacency map.
    pub fn close_borders(&mut self) -> Result<(), ActionError> {
        if self.active.borders.is_some() {
            return Err(ActionError::AlreadyActive("CloseBorders"));
        }
        let saved = self.apply_scaled(0.0, CLOSE_BORDERS_GDP, CLOSE_BORDERS_OPINION);
        self.active.borders = Some(saved);
        Ok(())
    }

    pub fn cancel_close_borders(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .borders
            .take()
            .ok_or(ActionError::NotActive("CloseBorders"))?;
        self.invert_scaled(0.0, CLOSE_BORDERS_GDP, CLOSE_BORDERS_OPINION, saved);
        Ok(())
    }

    pub fn furlough_scheme(&mut self) -> Result<(), ActionError> {
        if self.active.furlough.is_some() {
            return Err(ActionError::AlreadyActive("FurloughScheme"));
        }
        let saved = self.apply_scaled(FURLOUGH_CUT, FURLOUGH_GDP, FURLOUGH_OPINION);
        self.active.furlough = Some(saved);
        Ok(())
    }

    pub fn cancel_furlough_scheme(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .furlough
            .take()
            .ok_or(ActionError::NotActive("FurloughScheme"))?;
        self.invert_scaled(FURLOUGH_CUT, FURLOUGH_GDP, FURLOUGH_OPINION, saved);
        Ok(())
    }

    pub fn information_press_release(&mut self) -> Result<(), ActionError> {
        self.press_releases += 1;
        self.public_opinion *= PRESS_RELEASE_OPINION;
        self.change_compliance_modifier(PRESS_RELEASE_COMPLIANCE_BOOST);
        Ok(())
    }

    pub fn cancel_information_press_release(&mut self) -> Result<(), ActionError> {
        if self.press_releases == 0 {
            return Err(ActionError::NotActive("InformationPressRelease"));
        }
        self.press_releases -= 1;
        self.public_opinion /= PRESS_RELEASE_OPINION;
        self.change_compliance_modifier(-PRESS_RELEASE_COMPLIANCE_BOOST);
        Ok(())
    }

    pub fn mask_mandate(&mut self, level: MaskLevel) -> Result<(), ActionError> {
        if self.active.mask.is_some() {
            return Err(ActionError::AlreadyActive("MaskMandate"));
        }
        let saved = self.apply_scaled(level.contact_cut(), 1.0, MASK_OPINION);
        self.active.mask = Some((level, saved));
        Ok(())
    }

    pub fn cancel_mask_mandate(&mut self) -> Result<(), ActionError> {
        let (level, saved) = self
            .active
            .mask
            .take()
            .ok_or(ActionError::NotActive("MaskMandate"))?;
        self.invert_scaled(level.contact_cut(), 1.0, MASK_OPINION, saved);
        Ok(())
    }

    pub fn health_drive(&mut self) -> Result<(), ActionError> {
        self.public_opinion *= HEALTH_DRIVE_OPINION;
        self.change_compliance_modifier(HEALTH_DRIVE_COMPLIANCE_BOOST);
        Ok(())
    }

    pub fn cancel_health_drive(&mut self) -> Result<(), ActionError> {
        self.public_opinion /= HEALTH_DRIVE_OPINION;
        self.change_compliance_modifier(-HEALTH_DRIVE_COMPLIANCE_BOOST);
        Ok(())
    }

    pub fn social_distancing(&mut self, distance_m: f64) -> Result<(), ActionError> {
        if self.active.distancing.is_some() {
            return Err(ActionError::AlreadyActive("SocialDistancing"));
        }
        let cut = (DISTANCING_CUT_PER_METRE * distance_m).min(DISTANCING_MAX_CUT);
        let saved = self.apply_scaled(cut, DISTANCING_GDP, DISTANCING_OPINION);
        self.active.distancing = Some((cut, saved));
        Ok(())
    }

    pub fn cancel_social_distancing(&mut self) -> Result<(), ActionError> {
        let (cut, saved) = self
            .active
            .distancing
            .take()
            .ok_or(ActionError::NotActive("SocialDistancing"))?;
        self.invert_scaled(cut, DISTANCING_GDP, DISTANCING_OPINION, saved);
        Ok(())
    }

    pub fn invest_in_health_services(&mut self, amount: i64) -> Result<(), ActionError> {
        if self.active.health_investment.is_some() {
            return Err(ActionError::AlreadyActive("InvestInHealthServices"));
        }
        let factor = 1.0 / (1.0 + amount as f64 / HEALTH_INVESTMENT_SCALE);
        self.lethality_modifier *= factor;
        self.active.health_investment = Some(factor);
        Ok(())
    }

    pub fn cancel_invest_in_health_services(&mut self) -> Result<(), ActionError> {
        let factor = self
            .active
            .health_investment
            .take()
            .ok_or(ActionError::NotActive("InvestInHealthServices"))?;
        self.lethality_modifier /= factor;
        Ok(())
    }

    pub fn curfew(&mut self) -> Result<(), ActionError> {
        if self.active.curfew.is_some() {
            return Err(ActionError::AlreadyActive("Curfew"));
        }
        let saved = self.apply_scaled(CURFEW_CUT, CURFEW_GDP, CURFEW_OPINION);
        self.active.curfew = Some(saved);
        Ok(())
    }

    pub fn cancel_curfew(&mut self) -> Result<(), ActionError> {
        let saved = self
            .active
            .curfew
            .take()
            .ok_or(ActionError::NotActive("Curfew"))?;
        self.invert_scaled(CURFEW_CUT, CURFEW_GDP, CURFEW_OPINION, saved);
        Ok(())
    }

    /// Start a rolling vaccination campaign: `quantity` doses per day to
    /// the age-eligible uninfected, moved straight to recovered-immune.
    pub fn administer_vaccine(&mut self, quantity: i64, min_age: u32) -> Result<(), ActionError> {
        if self.vaccination.is_some() {
            return Err(ActionError::AlreadyActive("AdministerVaccine"));
        }
        self.vaccination = Some((quantity, min_age));
        Ok(())
    }

    pub fn cancel_administer_vaccine(&mut self) -> Result<(), ActionError> {
        if self.vaccination.take().is_none() {
            return Err(ActionError::NotActive("AdministerVaccine"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Demographics;

    fn node_data(population: i64) -> NodeData {
        NodeData {
            name: "Testville".to_string(),
            population,
            demographics: Demographics::uniform(),
            interactivity: 0.5,
            gdp: 1.0,
            test_capacity: 100,
            position: (0.0, 0.0),
            base_compliance: 0.8,
        }
    }

    fn quiet_virus() -> VirusProfile {
        // Nothing spreads, nothing progresses: isolates single mechanisms.
        let zero = Demographics::flat(0.0).unwrap();
        VirusProfile::new(zero, zero, zero, zero, zero).unwrap()
    }

    fn staged_virus() -> VirusProfile {
        // No spread, but every cohort progresses fully and half of the
        // serious cases die.
        let zero = Demographics::flat(0.0).unwrap();
        let one = Demographics::flat(1.0).unwrap();
        let half = Demographics::flat(0.5).unwrap();
        VirusProfile::new(zero, half, zero, one, one).unwrap()
    }

    fn make_node(population: i64) -> Node {
        Node::from_data(0, &node_data(population), 42).unwrap()
    }

    #[test]
    fn test_infect_clamps_at_zero_uninfected() {
        let mut node = make_node(100);
        assert_eq!(node.infect(250), 100);
        assert_eq!(node.totals().uninfected, 0);
        assert_eq!(node.totals().asymptomatic_latent, 100);
        // Further infection is a no-op.
        assert_eq!(node.infect(10), 0);
        assert_eq!(node.totals().census(), 100);
    }

    #[test]
    fn test_infect_rejects_negative() {
        let mut node = make_node(100);
        assert_eq!(node.infect(-5), 0);
        assert_eq!(node.totals().uninfected, 100);
    }

    #[test]
    fn test_deserialized_negative_demographics_rejected() {
        // Transparent serde lets a negative bucket through deserialization;
        // construction must still refuse it.
        let bad: Demographics =
            serde_json::from_str("[0.1, 0.1, 0.1, -0.2, 0.1, 0.1, 0.1, 0.1, 0.1]").unwrap();
        let mut data = node_data(1_000);
        data.demographics = bad;
        assert_eq!(
            Node::from_data(0, &data, 42).err(),
            Some(DataError::NegativeShare(3, -0.2))
        );
    }

    #[test]
    fn test_census_conserved_through_staged_outbreak() {
        let virus = staged_virus();
        let mut node = make_node(1_000);
        node.infect(10);
        for _ in 0..40 {
            node.update(&virus);
            node.increment_head();
            assert_eq!(node.totals().census(), 1_000);
        }
        // The outbreak ran its course: nobody is still carrying.
        assert_eq!(node.totals().infected(), 0);
        assert!(node.totals().dead > 0);
        assert!(node.totals().recovered > 0);
    }

    #[test]
    fn test_staged_transition_timeline() {
        let virus = staged_virus();
        let mut node = make_node(1_000);
        node.infect(10);

        // Lag buffers resolve at fixed offsets: the day-0 cohort turns
        // infectious on update 3, symptomatic on update 5, serious on
        // update 11, and one in two dies on update 19.
        for day in 1..=25 {
            node.update(&virus);
            node.increment_head();
            match day {
                2 => assert_eq!(node.totals().asymptomatic_latent, 10),
                3 => {
                    assert_eq!(node.totals().asymptomatic_latent, 0);
                    assert_eq!(node.totals().asymptomatic_infectious, 10);
                }
                5 => assert_eq!(node.totals().symptomatic, 10),
                11 => assert_eq!(node.totals().serious, 10),
                19 => {
                    assert_eq!(node.totals().dead, 5);
                    assert_eq!(node.totals().serious, 5);
                }
                25 => {
                    assert_eq!(node.totals().serious, 0);
                    assert_eq!(node.totals().recovered, 5);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_reinfection_moves_recovered_back() {
        let zero = Demographics::flat(0.0).unwrap();
        let tenth = Demographics::flat(0.1).unwrap();
        let virus = VirusProfile::new(zero, zero, tenth, zero, zero).unwrap();
        let mut node = make_node(1_000);
        node.totals.uninfected -= 100;
        node.totals.recovered += 100;
        node.update(&virus);
        assert_eq!(node.totals().recovered, 90);
        assert_eq!(node.totals().uninfected, 910);
        assert_eq!(node.totals().census(), 1_000);
    }

    #[test]
    fn test_testing_isolates_and_releases() {
        let virus = quiet_virus();
        let mut node = make_node(1_000);
        // Plant a standing symptomatic population outside the lag track.
        node.totals.uninfected -= 500;
        node.totals.symptomatic += 500;
        node.test_and_isolate(200, 0, true, 14).unwrap();

        node.update(&virus);
        // 100 good tests used (capacity), pool share 0.5, efficacy 0.7,
        // compliance 0.8: floor(100 * 0.5 * 0.7 * 0.8) = 28.
        assert_eq!(node.isolated(), 28);
        assert!(node.falsely_isolated() > 0);

        // After 14 daily rolls the cohort leaves isolation.
        for _ in 0..14 {
            node.good_tests = 0;
            node.bad_tests = 0;
            node.update(&virus);
        }
        assert_eq!(node.isolated(), 0);
    }

    #[test]
    fn test_quarantine_period_releases_early() {
        let virus = quiet_virus();
        let mut node = make_node(1_000);
        node.totals.uninfected -= 500;
        node.totals.symptomatic += 500;
        node.test_and_isolate(200, 0, true, 5).unwrap();

        node.update(&virus);
        assert_eq!(node.isolated(), 28);
        node.good_tests = 0;
        for _ in 0..5 {
            node.update(&virus);
        }
        assert_eq!(node.isolated(), 0);
    }

    #[test]
    fn test_isolation_suppresses_spread() {
        let one_tenth = Demographics::flat(0.1).unwrap();
        let zero = Demographics::flat(0.0).unwrap();
        let virus = VirusProfile::new(one_tenth, zero, zero, zero, zero).unwrap();

        let mut open = make_node(10_000);
        open.totals.uninfected -= 1_000;
        open.totals.symptomatic += 1_000;

        let mut tested = open.clone();
        tested.test_and_isolate(10_000, 0, true, 14).unwrap();
        tested.test_capacity = 10_000;

        open.update(&virus);
        tested.update(&virus);
        assert!(
            tested.totals().asymptomatic_latent < open.totals().asymptomatic_latent,
            "isolation should reduce new infections"
        );
    }

    #[test]
    fn test_policy_cancel_restores_state_despite_drift() {
        let virus = quiet_virus();
        let mut node = make_node(1_000);
        let interactivity = node.interactivity();
        let gdp = node.gdp();
        let opinion = node.raw_opinion();

        node.stay_at_home_order().unwrap();
        // Let compliance drift while the order is active.
        for _ in 0..10 {
            node.update(&virus);
        }
        node.cancel_stay_at_home_order().unwrap();

        assert!((node.interactivity() - interactivity).abs() < 1e-9);
        assert!((node.gdp() - gdp).abs() < 1e-9);
        assert!((node.raw_opinion() - opinion).abs() < 1e-9);
    }

    #[test]
    fn test_double_apply_and_cancel_without_apply() {
        let mut node = make_node(1_000);
        node.curfew().unwrap();
        assert_eq!(node.curfew(), Err(ActionError::AlreadyActive("Curfew")));
        node.cancel_curfew().unwrap();
        assert_eq!(node.cancel_curfew(), Err(ActionError::NotActive("Curfew")));
    }

    #[test]
    fn test_compliance_modifier_stays_bounded() {
        let mut node = make_node(1_000);
        for _ in 0..50 {
            node.change_compliance_modifier(10.0);
            assert!(node.compliance_modifier() <= 1.0);
            node.change_compliance_modifier(-25.0);
            assert!(node.compliance_modifier() >= 0.0);
        }
    }

    #[test]
    fn test_health_investment_scales_lethality_and_inverts() {
        let mut node = make_node(1_000);
        node.invest_in_health_services(50_000).unwrap();
        assert!((node.lethality_modifier() - 0.5).abs() < 1e-12);
        node.cancel_invest_in_health_services().unwrap();
        assert!((node.lethality_modifier() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vaccination_respects_age_eligibility() {
        let virus = quiet_virus();
        let mut node = make_node(900);
        // Uniform demographics: three of nine brackets are 65+.
        node.administer_vaccine(1_000, 65).unwrap();
        node.update(&virus);
        assert_eq!(node.totals().recovered, 300);
        assert_eq!(node.totals().uninfected, 600);
        assert_eq!(node.totals().census(), 900);
    }

    #[test]
    fn test_stochastic_round_fraction_free_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(stochastic_round(3.0, &mut rng), 3);
        assert_eq!(stochastic_round(0.0, &mut rng), 0);
    }

    #[test]
    fn test_stochastic_round_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let n = stochastic_round(2.4, &mut rng);
            assert!(n == 2 || n == 3);
        }
    }
}
