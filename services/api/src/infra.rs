use chrono::NaiveDate;
use fieldscore::workflows::scorecard::metrics::{
    sample_snapshot, InMemoryMetricsProvider, MetricGroupKind,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seeds the in-memory metrics provider with two demo agents: the bundled
/// mid-month sample and a struggling variant of it, so the served endpoints
/// have something to score before a real metrics feed is wired in.
pub(crate) fn seeded_provider() -> InMemoryMetricsProvider {
    let provider = InMemoryMetricsProvider::default();
    provider.insert("FA-1001", sample_snapshot());

    let mut struggling = sample_snapshot();
    let performance = struggling.group_mut(MetricGroupKind::Performance);
    performance.insert("mtd_sales_value", 6.0);
    performance.insert("unique_transacting_dcs_mtd", 1.0);
    let outstanding = struggling.group_mut(MetricGroupKind::Outstanding);
    outstanding.insert("outstanding_amount", 150_000.0);
    provider.insert("FA-2002", struggling);

    provider
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldscore::workflows::scorecard::metrics::MetricsProvider;

    #[test]
    fn parse_date_accepts_iso_dates_and_trims() {
        let parsed = parse_date(" 2025-06-15 ").expect("date parses");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"));

        let err = parse_date("15/06/2025").expect_err("wrong format rejected");
        assert!(err.contains("YYYY-MM-DD"));
    }

    #[test]
    fn seeded_provider_serves_both_demo_agents() {
        let provider = seeded_provider();
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");

        let healthy = provider.fetch("FA-1001", date).expect("sample agent");
        let struggling = provider.fetch("FA-2002", date).expect("struggling agent");
        assert_ne!(healthy, struggling);
    }
}
