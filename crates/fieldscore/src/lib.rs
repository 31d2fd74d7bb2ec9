//! Scoring and priority resolution for field sales agents.
//!
//! The heart of the crate is the scorecard workflow: five independent
//! business-objective scorers fan out over an immutable metrics snapshot,
//! their fragments merge at a single join point, and a grading plus
//! conditional-rule pass turns the merged ratios into letter grades and a
//! final priority ordering.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
