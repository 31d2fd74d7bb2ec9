use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four metric groups delivered by the upstream metrics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroupKind {
    Performance,
    DcActivity,
    Outstanding,
    Onboarding,
}

impl MetricGroupKind {
    pub const fn ordered() -> [MetricGroupKind; 4] {
        [
            MetricGroupKind::Performance,
            MetricGroupKind::DcActivity,
            MetricGroupKind::Outstanding,
            MetricGroupKind::Onboarding,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            MetricGroupKind::Performance => "performance",
            MetricGroupKind::DcActivity => "dc_activity",
            MetricGroupKind::Outstanding => "outstanding",
            MetricGroupKind::Onboarding => "onboarding",
        }
    }
}

/// One flat group of named numeric fields. Unknown fields are preserved so
/// snapshots survive collaborator schema drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricGroup(BTreeMap<String, f64>);

impl MetricGroup {
    pub fn insert(&mut self, field: &str, value: f64) {
        self.0.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw metrics for one agent, as delivered for the scoring run.
/// Missing groups deserialize as empty, so partial payloads score with
/// documented defaults instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub performance: MetricGroup,
    #[serde(default)]
    pub dc_activity: MetricGroup,
    #[serde(default)]
    pub outstanding: MetricGroup,
    #[serde(default)]
    pub onboarding: MetricGroup,
}

impl MetricsSnapshot {
    pub fn group(&self, kind: MetricGroupKind) -> &MetricGroup {
        match kind {
            MetricGroupKind::Performance => &self.performance,
            MetricGroupKind::DcActivity => &self.dc_activity,
            MetricGroupKind::Outstanding => &self.outstanding,
            MetricGroupKind::Onboarding => &self.onboarding,
        }
    }

    pub fn group_mut(&mut self, kind: MetricGroupKind) -> &mut MetricGroup {
        match kind {
            MetricGroupKind::Performance => &mut self.performance,
            MetricGroupKind::DcActivity => &mut self.dc_activity,
            MetricGroupKind::Outstanding => &mut self.outstanding,
            MetricGroupKind::Onboarding => &mut self.onboarding,
        }
    }

    /// Reads a field, falling back to `default` when it is absent.
    pub fn value_or(&self, kind: MetricGroupKind, field: &str, default: f64) -> f64 {
        self.group(kind).get(field).unwrap_or(default)
    }

    /// Like [`value_or`](Self::value_or), but a present value that is NaN or
    /// infinite is rejected instead of silently propagating through ratios.
    pub fn finite_value_or(
        &self,
        kind: MetricGroupKind,
        field: &str,
        default: f64,
    ) -> Result<f64, InvalidMetric> {
        match self.group(kind).get(field) {
            Some(value) if value.is_finite() => Ok(value),
            Some(_) => Err(InvalidMetric {
                group: kind.label(),
                field: field.to_string(),
            }),
            None => Ok(default),
        }
    }
}

/// A metric that is present in the snapshot but not a finite number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("metric {group}.{field} is not a finite number")]
pub struct InvalidMetric {
    pub group: &'static str,
    pub field: String,
}

/// Retrieval seam for the metrics collaborator so the scoring service can be
/// exercised without the upstream system.
pub trait MetricsProvider: Send + Sync {
    fn fetch(&self, agent_id: &str, date: NaiveDate) -> Result<MetricsSnapshot, MetricsError>;
}

/// Error enumeration for metrics retrieval failures.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("no metrics recorded for agent {0}")]
    AgentNotFound(String),
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),
}

/// Map-backed provider used by the service bootstrap and tests. Snapshots
/// are keyed by agent; the requested date only tags the resulting scorecard.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsProvider {
    snapshots: Arc<Mutex<HashMap<String, MetricsSnapshot>>>,
}

impl InMemoryMetricsProvider {
    pub fn insert(&self, agent_id: &str, snapshot: MetricsSnapshot) {
        let mut guard = self.snapshots.lock().expect("metrics mutex poisoned");
        guard.insert(agent_id.to_string(), snapshot);
    }
}

impl MetricsProvider for InMemoryMetricsProvider {
    fn fetch(&self, agent_id: &str, _date: NaiveDate) -> Result<MetricsSnapshot, MetricsError> {
        let guard = self.snapshots.lock().expect("metrics mutex poisoned");
        guard
            .get(agent_id)
            .cloned()
            .ok_or_else(|| MetricsError::AgentNotFound(agent_id.to_string()))
    }
}

/// Canned snapshot mirroring a typical mid-month agent, used to seed the
/// in-memory provider and drive the one-shot CLI without an upstream feed.
pub fn sample_snapshot() -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::default();

    let performance = snapshot.group_mut(MetricGroupKind::Performance);
    performance.insert("mtd_sales_value", 30.0);
    performance.insert("last_month_sales", 40.0);
    performance.insert("unique_transacting_dcs_mtd", 5.0);
    performance.insert("last_month_active_dcs", 6.0);
    performance.insert("pl_sales_last_12m", 240.0);

    let dc_activity = snapshot.group_mut(MetricGroupKind::DcActivity);
    dc_activity.insert("unique_dcs_visited", 5.0);
    dc_activity.insert("total_dcs", 20.0);
    dc_activity.insert("check_ins_count", 10.0);
    dc_activity.insert("last_month_unique_dcs", 8.0);
    dc_activity.insert("last_month_checkins", 40.0);

    let outstanding = snapshot.group_mut(MetricGroupKind::Outstanding);
    outstanding.insert("outstanding_amount", 50_000.0);
    outstanding.insert("last_month_ar", 80_000.0);

    let onboarding = snapshot.group_mut(MetricGroupKind::Onboarding);
    onboarding.insert("farmer_meetings_mtd", 6.0);
    onboarding.insert("last_quarter_pl_active_dcs", 10.0);
    onboarding.insert("new_retailers_mtd", 2.0);
    onboarding.insert("new_retailers_last12m", 20.0);

    snapshot
}
