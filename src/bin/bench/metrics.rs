// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Benchmark Metrics

use std::time::Instant;

use outbreak_engine::World;

use crate::report::{BenchResult, MonteCarloReport, Stats};
use crate::scenarios::Scenario;

// ─── Outbreak Tracker ───────────────────────────────────────────────────────

/// Per-run epidemic summary, folded up day by day from world totals.
pub struct OutbreakTracker {
    census: i64,
    peak_symptomatic: i64,
    peak_day: u32,
    containment_day: Option<u32>,
}

impl OutbreakTracker {
    pub fn new(world: &World) -> Self {
        Self {
            census: world.global_totals().census(),
            peak_symptomatic: 0,
            peak_day: 0,
            containment_day: None,
        }
    }

    pub fn record_day(&mut self, world: &World) {
        let global = world.global_totals();
        if global.symptomatic > self.peak_symptomatic {
            self.peak_symptomatic = global.symptomatic;
            self.peak_day = world.day();
        }
        if self.containment_day.is_none() && global.infected() == 0 && self.peak_symptomatic > 0 {
            self.containment_day = Some(world.day());
        }
    }
}

// ─── Single run ─────────────────────────────────────────────────────────────

pub fn run_scenario(scenario: &Scenario, seed: u64) -> BenchResult {
    let start = Instant::now();
    let data = (scenario.build)();
    let mut world = World::from_data(&data, seed).expect("scenario world data is valid");
    world
        .start_infection_at(scenario.seed_node, scenario.seed_infections)
        .expect("scenario seed node exists");

    let mut tracker = OutbreakTracker::new(&world);
    let mut conservation_holds = true;

    for day in 1..=scenario.days {
        if let Some(playbook) = scenario.playbook {
            let directives = playbook(day);
            if !directives.is_empty() {
                world.apply_actions(&directives);
            }
        }
        if world.update().is_err() {
            conservation_holds = false;
            break;
        }
        tracker.record_day(&world);
    }

    let global = world.global_totals();
    let census = tracker.census as f64;
    let attack_rate = (global.dead + global.recovered + global.infected()) as f64 / census;
    let fatality_share = global.dead as f64 / census;
    let peak_symptomatic_share = tracker.peak_symptomatic as f64 / census;
    let contained = global.infected() == 0;

    let criteria = &scenario.criteria;
    let pass = conservation_holds
        && criteria
            .max_attack_rate
            .map_or(true, |max| attack_rate <= max)
        && criteria
            .max_fatality_share
            .map_or(true, |max| fatality_share <= max)
        && criteria
            .max_peak_symptomatic_share
            .map_or(true, |max| peak_symptomatic_share <= max)
        && (!criteria.require_containment || contained);

    BenchResult {
        scenario: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        days: world.day(),
        census: tracker.census,
        attack_rate,
        fatality_share,
        peak_symptomatic: tracker.peak_symptomatic,
        peak_symptomatic_share,
        peak_day: tracker.peak_day,
        contained,
        containment_day: tracker.containment_day,
        final_dead: global.dead,
        final_recovered: global.recovered,
        final_budget: world.budget(),
        conservation_holds,
        elapsed_ms: start.elapsed().as_millis(),
    }
}

// ─── Monte Carlo aggregation ────────────────────────────────────────────────

pub fn run_monte_carlo(scenario: &Scenario, runs: usize, base_seed: u64) -> MonteCarloReport {
    let results: Vec<BenchResult> = (0..runs)
        .map(|i| run_scenario(scenario, base_seed.wrapping_add(i as u64)))
        .collect();

    let passed = results.iter().filter(|r| r.pass).count();
    let contained = results.iter().filter(|r| r.contained).count();

    let samples = |f: fn(&BenchResult) -> f64| -> Stats {
        let values: Vec<f64> = results.iter().map(f).collect();
        Stats::from_samples(&values)
    };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: runs,
        pass_rate: passed as f64 / runs.max(1) as f64,
        attack_rate: samples(|r| r.attack_rate),
        fatality_share: samples(|r| r.fatality_share),
        peak_symptomatic_share: samples(|r| r.peak_symptomatic_share),
        peak_day: samples(|r| r.peak_day as f64),
        final_budget: samples(|r| r.final_budget as f64),
        elapsed_ms: samples(|r| r.elapsed_ms as f64),
        containment_rate: contained as f64 / runs.max(1) as f64,
        individual_runs: results,
    }
}
