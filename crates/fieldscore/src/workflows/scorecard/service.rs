use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::config::ScorecardConfig;
use super::engine::{ScorecardEngine, ScorecardOutcome};
use super::metrics::{MetricsError, MetricsProvider, MetricsSnapshot};

/// A finished scorecard for one agent on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentScorecard {
    pub agent_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: ScorecardOutcome,
}

/// Service joining the metrics collaborator to the scoring engine.
pub struct ScorecardService<P> {
    provider: Arc<P>,
    engine: ScorecardEngine,
}

impl<P> ScorecardService<P>
where
    P: MetricsProvider + 'static,
{
    pub fn new(provider: Arc<P>, config: ScorecardConfig) -> Self {
        Self {
            provider,
            engine: ScorecardEngine::new(config),
        }
    }

    pub fn engine(&self) -> &ScorecardEngine {
        &self.engine
    }

    /// Fetches the agent's snapshot and evaluates it on the calling thread.
    pub fn score_agent(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<AgentScorecard, ScorecardServiceError> {
        let snapshot = self.provider.fetch(agent_id, date)?;
        Ok(self.assemble(agent_id, date, self.engine.evaluate(&snapshot)))
    }

    /// Fetches the agent's snapshot and fans the scorers out as parallel
    /// tasks before the merge join.
    pub async fn score_agent_parallel(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<AgentScorecard, ScorecardServiceError> {
        let snapshot = Arc::new(self.provider.fetch(agent_id, date)?);
        let outcome = self.engine.evaluate_parallel(snapshot).await;
        Ok(self.assemble(agent_id, date, outcome))
    }

    /// Evaluates a caller-supplied snapshot, bypassing the provider.
    pub async fn score_snapshot(
        &self,
        agent_id: &str,
        date: NaiveDate,
        snapshot: MetricsSnapshot,
    ) -> AgentScorecard {
        let outcome = self.engine.evaluate_parallel(Arc::new(snapshot)).await;
        self.assemble(agent_id, date, outcome)
    }

    fn assemble(&self, agent_id: &str, date: NaiveDate, outcome: ScorecardOutcome) -> AgentScorecard {
        AgentScorecard {
            agent_id: agent_id.to_string(),
            date,
            outcome,
        }
    }
}

/// Error enumeration for scorecard service failures.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardServiceError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}
