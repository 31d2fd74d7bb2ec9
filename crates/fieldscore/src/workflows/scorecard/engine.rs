use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;

use super::config::ScorecardConfig;
use super::domain::{BoCode, BoResult, Grade, SkippedObjective};
use super::grading;
use super::merge::ResultMap;
use super::metrics::MetricsSnapshot;
use super::priority;
use super::scoring;

/// Terminal artifact of one scoring run: graded results, the pre-rule grade
/// snapshot, the final ordering, and any objectives that contributed no
/// fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorecardOutcome {
    pub results: BTreeMap<BoCode, BoResult>,
    pub initial_grades: BTreeMap<BoCode, Grade>,
    pub priority_order: Vec<BoCode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedObjective>,
}

/// Evaluation pipeline for one agent snapshot: fan the five scorers out,
/// merge their fragments, grade, and resolve the priority order.
#[derive(Debug, Clone)]
pub struct ScorecardEngine {
    config: Arc<ScorecardConfig>,
}

impl ScorecardEngine {
    pub fn new(config: ScorecardConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ScorecardConfig {
        &self.config
    }

    /// Runs the scorers on the calling thread, in submission order. The
    /// outcome is identical to the parallel path.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> ScorecardOutcome {
        let mut merged = ResultMap::new();
        let mut skipped = Vec::new();
        for code in BoCode::ordered() {
            match scoring::score_objective(code, snapshot, &self.config) {
                Ok(fragment) => merged.merge_fragment(code, fragment),
                Err(error) => skipped.push(note_failure(code, error.to_string())),
            }
        }
        self.finish(merged, skipped)
    }

    /// Runs the scorers as independent tasks over a shared snapshot. The
    /// join loop is the only place fragments are applied, so the union
    /// merge is linearized without a lock, and one failed scorer never
    /// aborts the rest of the run.
    pub async fn evaluate_parallel(&self, snapshot: Arc<MetricsSnapshot>) -> ScorecardOutcome {
        let mut tasks = JoinSet::new();
        let mut codes_by_task = HashMap::new();
        for code in BoCode::ordered() {
            let snapshot = Arc::clone(&snapshot);
            let config = Arc::clone(&self.config);
            let handle = tasks
                .spawn(async move { (code, scoring::score_objective(code, &snapshot, &config)) });
            codes_by_task.insert(handle.id(), code);
        }

        let mut merged = ResultMap::new();
        let mut skipped = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (code, Ok(fragment)))) => merged.merge_fragment(code, fragment),
                Ok((_, (code, Err(error)))) => {
                    skipped.push(note_failure(code, error.to_string()));
                }
                Err(join_error) => match codes_by_task.get(&join_error.id()) {
                    Some(code) => {
                        skipped.push(note_failure(*code, "scorer task panicked".to_string()));
                    }
                    None => warn!(%join_error, "scorer task failed without a registered code"),
                },
            }
        }

        // Completion order varies run to run; report skips stably.
        skipped.sort_by_key(|entry| entry.code);
        self.finish(merged, skipped)
    }

    fn finish(&self, merged: ResultMap, skipped: Vec<SkippedObjective>) -> ScorecardOutcome {
        let (mut results, initial_grades) = grading::grade_results(merged, &self.config);
        let priority_order = priority::resolve(&mut results, &initial_grades, &self.config);
        ScorecardOutcome {
            results,
            initial_grades,
            priority_order,
            skipped,
        }
    }
}

fn note_failure(code: BoCode, reason: String) -> SkippedObjective {
    warn!(bo = code.label(), %reason, "scorer contributed no fragment");
    SkippedObjective { code, reason }
}
