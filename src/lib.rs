// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Crate Root

//! Compartmental epidemic simulation over a weighted transport graph.
//!
//! A [`World`] holds a set of population nodes joined by transport edges
//! and advances in daily ticks. Within a node, infection moves through
//! seven compartments (uninfected, latent, infectious, symptomatic,
//! serious, dead, recovered) tracked by fixed-lag cohort buffers rather
//! than rate equations: people infected on the same day stay together and
//! transition together at fixed day offsets. Edges carry travellers both
//! ways each day and convert the origin side's infectious share into new
//! cases at the destination.
//!
//! Sixteen policy [`Action`]s apply and cancel public-health measures per
//! node; their costs settle against a shared treasury once per tick. All
//! randomness derives from the world seed, so identical data and seed
//! replay identically. A [`PopulationLedger`] audits every node every day
//! against the head-count it was built with.

pub mod actions;
pub mod conservation;
pub mod edge;
pub mod lag;
pub mod node;
pub mod tracking;
pub mod types;
pub mod world;

pub use actions::{Action, ActionError, Directive, MaskLevel, Phase};
pub use conservation::{ConservationResult, PopulationLedger};
pub use edge::Edge;
pub use lag::{LagBuffer, LagError, MAX_LAG_DAYS};
pub use node::Node;
pub use tracking::{DaySnapshot, InfectionHistory, TrackingError};
pub use types::{
    Compartment, DataError, Demographics, EdgeData, InfectionTotals, NodeData, VirusData,
    VirusProfile, WorldData, AGE_BUCKETS, GLOBAL,
};
pub use world::{TurnState, World, WorldError};
