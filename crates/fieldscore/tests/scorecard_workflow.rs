//! End-to-end scenarios for the agent scorecard workflow.
//!
//! Everything here goes through the public engine and service surface so the
//! fan-out, merge, grading, and priority resolution are validated together
//! rather than module by module.

use std::sync::Arc;

use chrono::NaiveDate;

use fieldscore::workflows::scorecard::config::ScorecardConfig;
use fieldscore::workflows::scorecard::domain::{BoCode, Grade};
use fieldscore::workflows::scorecard::metrics::{
    sample_snapshot, MetricGroupKind, MetricsSnapshot,
};
use fieldscore::workflows::scorecard::{AgentScorecard, ScorecardEngine};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// A snapshot where every objective bottoms out at ratio 0.0. The receivables
/// book needs its ageing index zeroed, since an empty book otherwise scores
/// the clean-slate quantum.
fn all_zero_snapshot() -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::default();
    snapshot
        .group_mut(MetricGroupKind::Outstanding)
        .insert("ageing_index", 0.0);
    snapshot
}

#[test]
fn all_d_run_applies_the_gated_explicit_override() {
    let config = ScorecardConfig::from_json(
        r#"{
            "priority_overrides": {
                "explicit_order": ["BO5", "BO1"],
                "apply_only_when_all_D": true
            }
        }"#,
    )
    .expect("config parses");

    let engine = ScorecardEngine::new(config);
    let outcome = engine.evaluate(&all_zero_snapshot());

    for (code, result) in &outcome.results {
        assert_eq!(result.grade, Grade::D, "{code} should grade D");
    }
    // Override first, then the remaining codes in default order.
    assert_eq!(
        outcome.priority_order,
        vec![
            BoCode::Bo5,
            BoCode::Bo1,
            BoCode::Bo2,
            BoCode::Bo4,
            BoCode::Bo3
        ]
    );
}

#[test]
fn mixed_grades_hold_the_gated_override_back() {
    let config = ScorecardConfig::from_json(
        r#"{
            "priority_overrides": {
                "explicit_order": ["BO5", "BO1"],
                "apply_only_when_all_D": true
            }
        }"#,
    )
    .expect("config parses");

    let engine = ScorecardEngine::new(config);
    // The sample agent grades well on BO1 and BO3, so the all-D gate fails.
    let outcome = engine.evaluate(&sample_snapshot());

    assert_ne!(outcome.priority_order[..2], [BoCode::Bo5, BoCode::Bo1]);
    assert_eq!(outcome.priority_order.len(), 5);
}

#[test]
fn conditional_rule_promotes_a_b_graded_objective() {
    let config = ScorecardConfig::from_json(
        r#"{
            "priority_rules": {
                "conditional_rules": [
                    {"if": {"bo": "BO2", "grade": "B"},
                     "then": {"set_grade": {"bo": "BO2", "grade": "A"}}}
                ]
            }
        }"#,
    )
    .expect("config parses");

    // coverage 6/8 = 0.75, effort 32/40 = 0.8, combined 0.6: a B.
    let mut snapshot = MetricsSnapshot::default();
    let dc = snapshot.group_mut(MetricGroupKind::DcActivity);
    dc.insert("unique_dcs_visited", 6.0);
    dc.insert("last_month_unique_dcs", 8.0);
    dc.insert("total_dcs", 20.0);
    dc.insert("check_ins_count", 32.0);
    dc.insert("last_month_checkins", 40.0);

    let engine = ScorecardEngine::new(config);
    let outcome = engine.evaluate(&snapshot);

    assert_close(outcome.results[&BoCode::Bo2].ratio, 0.6);
    assert_eq!(outcome.initial_grades[&BoCode::Bo2], Grade::B);
    assert_eq!(outcome.results[&BoCode::Bo2].grade, Grade::A);
}

#[test]
fn receivables_quantum_follows_the_sales_trend() {
    let mut snapshot = MetricsSnapshot::default();
    let outstanding = snapshot.group_mut(MetricGroupKind::Outstanding);
    outstanding.insert("outstanding_amount", 50_000.0);
    outstanding.insert("last_month_ar", 80_000.0);
    let performance = snapshot.group_mut(MetricGroupKind::Performance);
    performance.insert("mtd_sales_value", 30.0);
    performance.insert("last_month_sales", 40.0);

    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let outcome = engine.evaluate(&snapshot);

    // Target 80000 * (30/40) = 60000 against 50000 outstanding, clamped to
    // the default window, times the default ageing index.
    let result = &outcome.results[&BoCode::Bo3];
    assert_close(result.ratio, 1.2);
    assert_close(result.factors["quantum_ratio"], 1.2);
    assert_eq!(result.grade, Grade::A);
}

#[test]
fn failed_scorer_omits_its_objective_and_nothing_else() {
    let mut snapshot = sample_snapshot();
    snapshot
        .group_mut(MetricGroupKind::Performance)
        .insert("unique_transacting_dcs_mtd", f64::NAN);

    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let outcome = engine.evaluate(&snapshot);

    assert_eq!(outcome.results.len(), 4);
    assert!(!outcome.results.contains_key(&BoCode::Bo4));
    assert_eq!(outcome.priority_order.len(), 4);
    assert!(!outcome.priority_order.contains(&BoCode::Bo4));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].code, BoCode::Bo4);
}

#[test]
fn priority_order_is_a_permutation_of_the_scored_codes() {
    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let outcome = engine.evaluate(&sample_snapshot());

    let mut ordered = outcome.priority_order.clone();
    ordered.sort();
    ordered.dedup();
    let scored: Vec<BoCode> = outcome.results.keys().copied().collect();
    assert_eq!(ordered, scored);
}

#[test]
fn repeated_evaluation_is_deterministic() {
    let config = ScorecardConfig::from_json(
        r#"{
            "priority_rules": {
                "conditional_rules": [
                    {"if": {"bo": "BO2", "grade": "D"},
                     "then": {"set_grade": {"bo": "BO2", "grade": "C"}}}
                ]
            }
        }"#,
    )
    .expect("config parses");
    let engine = ScorecardEngine::new(config);

    let first = engine.evaluate(&sample_snapshot());
    let second = engine.evaluate(&sample_snapshot());
    assert_eq!(first, second);
}

#[tokio::test]
async fn parallel_fan_out_matches_the_sequential_path() {
    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let snapshot = sample_snapshot();

    let sequential = engine.evaluate(&snapshot);
    for _ in 0..8 {
        let parallel = engine.evaluate_parallel(Arc::new(snapshot.clone())).await;
        assert_eq!(parallel, sequential);
    }
}

#[tokio::test]
async fn parallel_fan_out_survives_a_failing_scorer() {
    let mut snapshot = sample_snapshot();
    snapshot
        .group_mut(MetricGroupKind::Outstanding)
        .insert("outstanding_amount", f64::INFINITY);

    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let outcome = engine.evaluate_parallel(Arc::new(snapshot)).await;

    assert!(!outcome.results.contains_key(&BoCode::Bo3));
    assert_eq!(outcome.priority_order.len(), 4);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].code, BoCode::Bo3);
}

#[test]
fn scorecard_view_serializes_to_a_flat_record() {
    let engine = ScorecardEngine::new(ScorecardConfig::default());
    let scorecard = AgentScorecard {
        agent_id: "FA-1001".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"),
        outcome: engine.evaluate(&sample_snapshot()),
    };

    let json = serde_json::to_value(scorecard.view()).expect("view serializes");
    assert_eq!(json["agent_id"], "FA-1001");
    assert_eq!(json["date"], "2025-06-15");

    let order = json["priority_order"].as_array().expect("order array");
    assert_eq!(order.len(), 5);
    assert!(order.iter().all(|code| code.is_string()));

    let rows = json["objectives"].as_array().expect("objective rows");
    assert_eq!(rows.len(), 5);
    for row in rows {
        assert!(row["code"].is_string());
        assert!(row["ratio"].is_number());
        assert!(row["grade"].is_string());
        assert!(row["objective"].is_string());
    }
}
