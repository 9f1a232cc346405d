// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Benchmark Scenarios
//
// Zero engine changes: all scenario logic is world data plus a playbook of
// dated directives.

use outbreak_engine::{
    Action, Demographics, Directive, EdgeData, MaskLevel, NodeData, VirusData, WorldData,
};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub days: u32,
    /// Node index and head-count of the initial outbreak.
    pub seed_node: usize,
    pub seed_infections: i64,
    pub build: fn() -> WorldData,
    /// Directives to issue before the given day's tick.
    pub playbook: Option<fn(u32) -> Vec<Directive>>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Share of the census ever infected (dead + recovered + carrying).
    pub max_attack_rate: Option<f64>,
    /// Dead as a share of the census.
    pub max_fatality_share: Option<f64>,
    /// Peak simultaneous symptomatic cases as a share of the census.
    pub max_peak_symptomatic_share: Option<f64>,
    /// The outbreak must be over (nobody carrying) by the final day.
    pub require_containment: bool,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_attack_rate: None,
            max_fatality_share: None,
            max_peak_symptomatic_share: None,
            require_containment: false,
        }
    }
}

// ─── World builders ─────────────────────────────────────────────────────────

fn city(name: &str, population: i64, interactivity: f64, gdp: f64) -> NodeData {
    NodeData {
        name: name.to_string(),
        population,
        demographics: Demographics::new([0.06, 0.15, 0.16, 0.14, 0.13, 0.18, 0.10, 0.06, 0.02])
            .expect("static demographics are valid"),
        interactivity,
        gdp,
        test_capacity: population / 100,
        position: (0.0, 0.0),
        base_compliance: 0.8,
    }
}

fn link(name: &str, left: u32, right: u32, population: i64, distance_km: f64) -> EdgeData {
    EdgeData {
        name: name.to_string(),
        left,
        right,
        population,
        interactivity: 0.3,
        distance_km,
    }
}

fn seasonal_flu_like() -> VirusData {
    VirusData {
        infectivity: Demographics::flat(0.45).expect("rate in range"),
        fatality: Demographics::new([0.01, 0.005, 0.005, 0.01, 0.02, 0.05, 0.12, 0.2, 0.3])
            .expect("static rates are valid"),
        reinfectivity: Demographics::flat(0.0).expect("rate in range"),
        symptomatic_rate: Demographics::flat(0.4).expect("rate in range"),
        serious_rate: Demographics::flat(0.15).expect("rate in range"),
    }
}

/// Capital, industrial city, and a remote town, joined in a line.
fn three_city_network() -> WorldData {
    WorldData {
        nodes: vec![
            city("Veridian Capital", 120_000, 0.55, 2.0),
            city("Ironmoor", 60_000, 0.5, 1.2),
            city("Far Hollow", 15_000, 0.4, 0.4),
        ],
        edges: vec![
            link("Capital-Ironmoor rail", 0, 1, 3_000, 90.0),
            link("Ironmoor-Far Hollow road", 1, 2, 400, 260.0),
        ],
        virus: seasonal_flu_like(),
        budget: 2_000_000,
    }
}

fn single_city() -> WorldData {
    WorldData {
        nodes: vec![city("Veridian Capital", 120_000, 0.55, 2.0)],
        edges: Vec::new(),
        virus: seasonal_flu_like(),
        budget: 2_000_000,
    }
}

// ─── Playbooks ──────────────────────────────────────────────────────────────

fn everywhere(action: Action) -> Vec<Directive> {
    (0..3)
        .map(|i| Directive::create(&format!("N{}", i), action.clone()))
        .collect()
}

fn lockdown_playbook(day: u32) -> Vec<Directive> {
    match day {
        10 => {
            let mut directives = everywhere(Action::StayAtHomeOrder);
            directives.extend(everywhere(Action::CloseSchools));
            directives.extend(everywhere(Action::Curfew));
            directives
        }
        80 => {
            let mut directives: Vec<Directive> = (0..3)
                .map(|i| Directive::delete(&format!("N{}", i), Action::StayAtHomeOrder))
                .collect();
            directives.extend(
                (0..3).map(|i| Directive::delete(&format!("N{}", i), Action::Curfew)),
            );
            directives
        }
        _ => Vec::new(),
    }
}

fn test_trace_playbook(day: u32) -> Vec<Directive> {
    match day {
        5 => (0..3)
            .map(|i| {
                Directive::create(
                    &format!("N{}", i),
                    Action::TestAndIsolate {
                        good_tests: 200_000,
                        bad_tests: 50_000,
                        symptomatic_only: false,
                        quarantine_period: 10,
                    },
                )
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn border_seal_playbook(day: u32) -> Vec<Directive> {
    match day {
        3 => vec![
            Directive::create("N1", Action::CloseBorders),
            Directive::create(
                "N1",
                Action::MovementRestrictions {
                    max_distance_km: 50.0,
                },
            ),
        ],
        _ => Vec::new(),
    }
}

fn soft_measures_playbook(day: u32) -> Vec<Directive> {
    match day {
        7 => {
            let mut directives = everywhere(Action::MaskMandate {
                level: MaskLevel::Surgical,
            });
            directives.extend(everywhere(Action::SocialDistancing { distance_m: 2.0 }));
            directives.extend(everywhere(Action::InformationPressRelease));
            directives
        }
        _ => Vec::new(),
    }
}

fn health_surge_playbook(day: u32) -> Vec<Directive> {
    match day {
        1 => vec![Directive::create(
            "N0",
            Action::TakeLoan { amount: 500_000 },
        )],
        5 => everywhere(Action::InvestInHealthServices { amount: 100_000 }),
        _ => Vec::new(),
    }
}

fn vaccine_endgame_playbook(day: u32) -> Vec<Directive> {
    match day {
        10 => everywhere(Action::MaskMandate {
            level: MaskLevel::Respirator,
        }),
        // Research completes around day 300; start the campaign after.
        310 => everywhere(Action::AdministerVaccine {
            quantity: 2_000,
            min_age: 50,
        }),
        _ => Vec::new(),
    }
}

// ─── Scenario table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "BASELINE_UNMITIGATED",
            label: "Baseline: no intervention",
            category: "baseline",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: None,
            criteria: PassCriteria {
                require_containment: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "SINGLE_CITY_WAVE",
            label: "Single city, one wave",
            category: "baseline",
            days: 200,
            seed_node: 0,
            seed_infections: 50,
            build: single_city,
            playbook: None,
            criteria: PassCriteria {
                require_containment: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "LOCKDOWN_DAY_10",
            label: "Full lockdown from day 10",
            category: "suppression",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(lockdown_playbook),
            criteria: PassCriteria {
                max_peak_symptomatic_share: Some(0.12),
                ..Default::default()
            },
        },
        Scenario {
            name: "TEST_TRACE_ISOLATE",
            label: "Mass testing and isolation",
            category: "suppression",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(test_trace_playbook),
            criteria: PassCriteria {
                max_peak_symptomatic_share: Some(0.15),
                ..Default::default()
            },
        },
        Scenario {
            name: "BORDER_SEAL_REMOTE",
            label: "Seal the interior border early",
            category: "containment",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(border_seal_playbook),
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "SOFT_MEASURES",
            label: "Masks, distancing, messaging",
            category: "mitigation",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(soft_measures_playbook),
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "HEALTH_SURGE",
            label: "Loan-funded hospital surge",
            category: "mitigation",
            days: 250,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(health_surge_playbook),
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "VACCINE_ENDGAME",
            label: "Hold out for the vaccine",
            category: "endgame",
            days: 400,
            seed_node: 0,
            seed_infections: 100,
            build: three_city_network,
            playbook: Some(vaccine_endgame_playbook),
            criteria: PassCriteria::default(),
        },
    ]
}
