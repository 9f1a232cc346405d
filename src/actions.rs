// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Policy Actions

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Per-action failure codes. One failing action in a batch never aborts the
/// tick; the caller receives one of these per directive instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("location path is empty")]
    EmptyLocation,
    #[error("location '{0}' is not of the form N<index>")]
    MalformedLocation(String),
    #[error("location '{0}' does not name a known node")]
    UnknownLocation(String),
    #[error("{action}: invalid parameter {parameter} = {value}")]
    InvalidParameter {
        action: &'static str,
        parameter: &'static str,
        value: String,
    },
    #[error("{0} is already active at this location")]
    AlreadyActive(&'static str),
    #[error("{0} is not active at this location")]
    NotActive(&'static str),
    #[error("vaccine research incomplete; cannot administer doses yet")]
    VaccineNotReady,
    #[error("budget exhausted: action costs {cost} but {available} remains")]
    InsufficientBudget { cost: i64, available: i64 },
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Mask quality mandated by a `MaskMandate` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskLevel {
    Cloth,
    Surgical,
    Respirator,
}

impl MaskLevel {
    /// Fraction of transmission-relevant contact removed at full compliance.
    pub fn contact_cut(&self) -> f64 {
        match self {
            MaskLevel::Cloth => 0.20,
            MaskLevel::Surgical => 0.35,
            MaskLevel::Respirator => 0.50,
        }
    }
}

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// The sixteen policy interventions a health authority can issue against a
/// location. Each variant carries only the parameters its kind requires,
/// so a well-typed directive can never be missing a mandatory field;
/// residual validation (ranges, signs) lives in [`Action::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    TestAndIsolate {
        good_tests: i64,
        bad_tests: i64,
        symptomatic_only: bool,
        quarantine_period: u32,
    },
    StayAtHomeOrder,
    CloseSchools,
    CloseRecreationalAreas,
    ShieldingProgram,
    MovementRestrictions { max_distance_km: f64 },
    CloseBorders,
    FurloughScheme { amount: i64 },
    InformationPressRelease,
    MaskMandate { level: MaskLevel },
    HealthDrive,
    SocialDistancing { distance_m: f64 },
    InvestInHealthServices { amount: i64 },
    Curfew,
    AdministerVaccine { quantity: i64, min_age: u32 },
    TakeLoan { amount: i64 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::TestAndIsolate { .. } => "TestAndIsolate",
            Action::StayAtHomeOrder => "StayAtHomeOrder",
            Action::CloseSchools => "CloseSchools",
            Action::CloseRecreationalAreas => "CloseRecreationalAreas",
            Action::ShieldingProgram => "ShieldingProgram",
            Action::MovementRestrictions { .. } => "MovementRestrictions",
            Action::CloseBorders => "CloseBorders",
            Action::FurloughScheme { .. } => "FurloughScheme",
            Action::InformationPressRelease => "InformationPressRelease",
            Action::MaskMandate { .. } => "MaskMandate",
            Action::HealthDrive => "HealthDrive",
            Action::SocialDistancing { .. } => "SocialDistancing",
            Action::InvestInHealthServices { .. } => "InvestInHealthServices",
            Action::Curfew => "Curfew",
            Action::AdministerVaccine { .. } => "AdministerVaccine",
            Action::TakeLoan { .. } => "TakeLoan",
        }
    }

    /// Range and sign checks on variant parameters. The kind/field pairing
    /// itself is enforced by the type.
    pub fn validate(&self) -> Result<(), ActionError> {
        fn bad(
            action: &'static str,
            parameter: &'static str,
            value: impl ToString,
        ) -> ActionError {
            ActionError::InvalidParameter {
                action,
                parameter,
                value: value.to_string(),
            }
        }

        match *self {
            Action::TestAndIsolate {
                good_tests,
                bad_tests,
                quarantine_period,
                ..
            } => {
                if good_tests < 0 {
                    return Err(bad("TestAndIsolate", "good_tests", good_tests));
                }
                if bad_tests < 0 {
                    return Err(bad("TestAndIsolate", "bad_tests", bad_tests));
                }
                if quarantine_period == 0 {
                    return Err(bad("TestAndIsolate", "quarantine_period", quarantine_period));
                }
                Ok(())
            }
            Action::MovementRestrictions { max_distance_km } => {
                if !(max_distance_km > 0.0) {
                    return Err(bad("MovementRestrictions", "max_distance_km", max_distance_km));
                }
                Ok(())
            }
            Action::FurloughScheme { amount } => {
                if amount <= 0 {
                    return Err(bad("FurloughScheme", "amount", amount));
                }
                Ok(())
            }
            Action::SocialDistancing { distance_m } => {
                if !(distance_m > 0.0) {
                    return Err(bad("SocialDistancing", "distance_m", distance_m));
                }
                Ok(())
            }
            Action::InvestInHealthServices { amount } => {
                if amount <= 0 {
                    return Err(bad("InvestInHealthServices", "amount", amount));
                }
                Ok(())
            }
            Action::AdministerVaccine { quantity, .. } => {
                if quantity <= 0 {
                    return Err(bad("AdministerVaccine", "quantity", quantity));
                }
                Ok(())
            }
            Action::TakeLoan { amount } => {
                if amount <= 0 {
                    return Err(bad("TakeLoan", "amount", amount));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// Whether a directive activates or cancels its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Create,
    Delete,
}

/// One policy command from the decision-making layer: an action kind, a
/// create/delete flag, and an ordered location path whose first coordinate
/// addresses a world node (`"N{index}"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub phase: Phase,
    pub location: Vec<String>,
    pub action: Action,
}

impl Directive {
    pub fn create(location: &str, action: Action) -> Self {
        Self {
            phase: Phase::Create,
            location: vec![location.to_string()],
            action,
        }
    }

    pub fn delete(location: &str, action: Action) -> Self {
        Self {
            phase: Phase::Delete,
            location: vec![location.to_string()],
            action,
        }
    }
}

/// Resolve a location path to a node index. The top-level coordinate for a
/// world node is literally `"N{index}"`.
pub fn resolve_location(location: &[String], node_count: usize) -> Result<usize, ActionError> {
    let head = location.first().ok_or(ActionError::EmptyLocation)?;
    let index: usize = head
        .strip_prefix('N')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| ActionError::MalformedLocation(head.clone()))?;
    if index >= node_count {
        return Err(ActionError::UnknownLocation(head.clone()));
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
