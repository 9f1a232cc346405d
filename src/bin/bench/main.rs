// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Benchmark Runner
//
// Monte Carlo over seeded runs, per-scenario pass criteria, JSON output.
//
// Usage:
//   cargo run --release --bin bench                 # All scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5     # Quick mode
//   cargo run --release --bin bench -- LOCKDOWN     # Filter by name
//   cargo run --release --bin bench -- --seed 42    # Custom base seed

mod metrics;
mod report;
mod scenarios;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use report::{BenchReport, Summary};
use scenarios::{scenarios, Scenario};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f_lower)
                        || s.label.to_lowercase().contains(&f_lower)
                        || s.category.to_lowercase().contains(&f_lower)
                })
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Outbreak Response Benchmark Runner");
    println!(
        "  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}",
        cli.runs, cli.seed
    );
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!(
        "  {:<34} {:>5} {:>8} {:>8} {:>8} {:>6} {:>7}",
        "Scenario", "Pass%", "Attack%", "Fatal%", "PeakSym%", "Cont%", "Time"
    );
    println!("  {}", "-".repeat(84));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = metrics::run_monte_carlo(scenario, cli.runs, cli.seed);

        let pass_pct = report.pass_rate * 100.0;
        let status = if report.pass_rate >= 0.933 { "PASS" } else { "FAIL" };

        println!(
            "  {:<34} {:>4}% {:>7.1}% {:>7.2}% {:>7.1}% {:>5.0}% {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.attack_rate.mean * 100.0,
            report.fatality_share.mean * 100.0,
            report.peak_symptomatic_share.mean * 100.0,
            report.containment_rate * 100.0,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 0.933).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(84));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total,
        passed,
        failed,
        suite_elapsed.as_secs_f64()
    );

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis();
    let timestamp = format!("{}", ts);

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total.max(1) as f64,
        },
        scenarios: mc_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create benchmark-results/");
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write benchmark file");
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 {
        std::process::exit(1);
    }
}
