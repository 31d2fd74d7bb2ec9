//! The agent scorecard workflow: scoring, grading, and priority resolution.

pub mod config;
pub mod domain;
pub mod engine;
mod grading;
pub mod merge;
pub mod metrics;
mod priority;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;

pub use engine::{ScorecardEngine, ScorecardOutcome};
pub use grading::grade_for;
pub use router::scorecard_router;
pub use service::{AgentScorecard, ScorecardService, ScorecardServiceError};
