use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{BoCode, Grade};
use super::service::AgentScorecard;

/// One objective row, flattened for logging, storage, or display.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveRow {
    pub code: BoCode,
    pub code_label: &'static str,
    pub objective: &'static str,
    pub ratio: f64,
    pub grade: Grade,
    pub grade_label: &'static str,
    pub initial_grade: Grade,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub factors: BTreeMap<String, f64>,
}

/// An objective whose scorer produced nothing this run.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub code: BoCode,
    pub code_label: &'static str,
    pub reason: String,
}

/// Flat projection of a finished scorecard. Objectives are listed in
/// priority order, worst first.
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardView {
    pub agent_id: String,
    pub date: NaiveDate,
    pub priority_order: Vec<&'static str>,
    pub objectives: Vec<ObjectiveRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
}

impl ScorecardView {
    pub fn from_scorecard(scorecard: &AgentScorecard) -> Self {
        let outcome = &scorecard.outcome;
        let objectives = outcome
            .priority_order
            .iter()
            .filter_map(|code| {
                outcome.results.get(code).map(|result| ObjectiveRow {
                    code: *code,
                    code_label: code.label(),
                    objective: code.objective(),
                    ratio: result.ratio,
                    grade: result.grade,
                    grade_label: result.grade.label(),
                    initial_grade: outcome
                        .initial_grades
                        .get(code)
                        .copied()
                        .unwrap_or(result.grade),
                    factors: result.factors.clone(),
                })
            })
            .collect();

        let skipped = outcome
            .skipped
            .iter()
            .map(|entry| SkippedRow {
                code: entry.code,
                code_label: entry.code.label(),
                reason: entry.reason.clone(),
            })
            .collect();

        Self {
            agent_id: scorecard.agent_id.clone(),
            date: scorecard.date,
            priority_order: outcome
                .priority_order
                .iter()
                .map(|code| code.label())
                .collect(),
            objectives,
            skipped,
        }
    }
}

impl AgentScorecard {
    pub fn view(&self) -> ScorecardView {
        ScorecardView::from_scorecard(self)
    }
}
