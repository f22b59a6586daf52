#![deny(warnings)]

//! Core data model for the launch forecast.
//!
//! This crate defines the serializable types exchanged with the projection
//! engine: the raw scenario a caller submits, the normalized parameters the
//! engine actually runs on, and the month rows, summary and risk flags it
//! returns. It also carries the money rounding rule and validation helpers
//! that pin down the normalized-parameter and result invariants.

pub mod money;
pub mod outcome;
pub mod params;
pub mod validate;

pub use money::{round_cents, round_money};
pub use outcome::{MonthRow, RiskCode, RiskFlag, Severity, SimulationResult, Summary};
pub use params::*;
pub use validate::{validate_parameters, validate_result, ValidationError};
