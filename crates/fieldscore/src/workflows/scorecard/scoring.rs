use super::config::{ScorecardConfig, DEFAULT_MULTIPLIER};
use super::domain::{BoCode, BoFragment};
use super::metrics::{InvalidMetric, MetricGroupKind, MetricsSnapshot};

/// Default BO3 quantum clamp window.
const QUANTUM_CLAMP_MIN: f64 = 0.5;
const QUANTUM_CLAMP_MAX: f64 = 1.5;
/// Quantum assigned before clamping when nothing is outstanding.
const CLEAN_SLATE_QUANTUM: f64 = 2.0;
const DEFAULT_AGEING_INDEX: f64 = 1.0;
const DEFAULT_ONBOARDING_FLOOR: f64 = 1.0;
const DEFAULT_MEETING_WEIGHT: f64 = 0.6;
const DEFAULT_ONBOARDING_WEIGHT: f64 = 0.4;

/// Error enumeration for scorer failures.
#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error(transparent)]
    Metric(#[from] InvalidMetric),
}

/// Scores one objective against the snapshot. Pure in its inputs; this is
/// the dispatch point shared by the sequential and parallel evaluation
/// paths. Fragments come back clamped to finite non-negative numbers.
pub fn score_objective(
    code: BoCode,
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let fragment = match code {
        BoCode::Bo1 => private_label_sales(snapshot, config)?,
        BoCode::Bo2 => dc_check_ins(snapshot, config)?,
        BoCode::Bo3 => receivables_control(snapshot, config)?,
        BoCode::Bo4 => overall_sales(snapshot, config)?,
        BoCode::Bo5 => market_development(snapshot, config)?,
    };
    Ok(fragment.sanitized())
}

/// BO1: actual MTD private-label sales against one twelfth of the trailing
/// twelve months, scaled by the configured growth multiplier.
fn private_label_sales(
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let actual =
        snapshot.finite_value_or(MetricGroupKind::Performance, "mtd_sales_value", 0.0)?;
    let baseline =
        snapshot.finite_value_or(MetricGroupKind::Performance, "pl_sales_last_12m", 0.0)?;

    let growth = config.benchmark_param(BoCode::Bo1, "growth_multiplier", DEFAULT_MULTIPLIER);
    let monthly_benchmark = baseline * growth / 12.0;
    let mut ratio = guarded_ratio(actual, monthly_benchmark);
    if let Some(cap) = config.benchmark_param_opt(BoCode::Bo1, "cap") {
        ratio = ratio.min(cap);
    }
    Ok(BoFragment::new(ratio))
}

/// BO2: coverage (unique DCs visited against last month, bounded by the
/// portfolio) times effort (check-ins against last month).
fn dc_check_ins(
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let visited =
        snapshot.finite_value_or(MetricGroupKind::DcActivity, "unique_dcs_visited", 0.0)?;
    let total_dcs = snapshot.finite_value_or(MetricGroupKind::DcActivity, "total_dcs", 0.0)?;
    let check_ins =
        snapshot.finite_value_or(MetricGroupKind::DcActivity, "check_ins_count", 0.0)?;
    let last_month_unique =
        snapshot.finite_value_or(MetricGroupKind::DcActivity, "last_month_unique_dcs", 0.0)?;
    let last_month_checkins =
        snapshot.finite_value_or(MetricGroupKind::DcActivity, "last_month_checkins", 0.0)?;

    let coverage_benchmark =
        (last_month_unique * config.factor_multiplier(BoCode::Bo2, "coverage")).min(total_dcs);
    let coverage = capped_ratio(
        visited,
        coverage_benchmark,
        config.factor_cap(BoCode::Bo2, "coverage"),
    );

    let effort_benchmark = last_month_checkins * config.factor_multiplier(BoCode::Bo2, "effort");
    let effort = capped_ratio(
        check_ins,
        effort_benchmark,
        config.factor_cap(BoCode::Bo2, "effort"),
    );

    Ok(BoFragment::new(coverage * effort)
        .with_factor("coverage", coverage)
        .with_factor("effort", effort))
}

/// BO3: outstanding receivables against a sales-trend-scaled target. A book
/// with nothing outstanding takes the clean-slate quantum, which still
/// passes through the clamp window.
fn receivables_control(
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let outstanding =
        snapshot.finite_value_or(MetricGroupKind::Outstanding, "outstanding_amount", 0.0)?;
    let last_month_ar =
        snapshot.finite_value_or(MetricGroupKind::Outstanding, "last_month_ar", 0.0)?;
    let ageing = snapshot.finite_value_or(
        MetricGroupKind::Outstanding,
        "ageing_index",
        DEFAULT_AGEING_INDEX,
    )?;
    let mtd_sales =
        snapshot.finite_value_or(MetricGroupKind::Performance, "mtd_sales_value", 0.0)?;
    let last_month_sales =
        snapshot.finite_value_or(MetricGroupKind::Performance, "last_month_sales", 0.0)?;

    let sales_trend = guarded_ratio(mtd_sales, last_month_sales);
    let target_ar = last_month_ar * sales_trend;
    let raw_quantum = if outstanding <= 0.0 {
        CLEAN_SLATE_QUANTUM
    } else {
        target_ar / outstanding
    };

    let clamp_min = config.benchmark_param(BoCode::Bo3, "clamp_min", QUANTUM_CLAMP_MIN);
    let clamp_max = config.benchmark_param(BoCode::Bo3, "clamp_max", QUANTUM_CLAMP_MAX);
    let quantum = raw_quantum.max(clamp_min).min(clamp_max);

    Ok(BoFragment::new(quantum * ageing)
        .with_factor("quantum_ratio", quantum)
        .with_factor("ageing_index", ageing))
}

/// BO4: sales velocity against last month times transacting-DC spread
/// against the tighter of portfolio size and last month's active DCs.
fn overall_sales(
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let mtd_sales =
        snapshot.finite_value_or(MetricGroupKind::Performance, "mtd_sales_value", 0.0)?;
    let last_month_sales =
        snapshot.finite_value_or(MetricGroupKind::Performance, "last_month_sales", 0.0)?;
    let transacting = snapshot.finite_value_or(
        MetricGroupKind::Performance,
        "unique_transacting_dcs_mtd",
        0.0,
    )?;
    let last_month_active =
        snapshot.finite_value_or(MetricGroupKind::Performance, "last_month_active_dcs", 0.0)?;
    let total_dcs = snapshot.finite_value_or(MetricGroupKind::DcActivity, "total_dcs", 0.0)?;

    let velocity_benchmark =
        last_month_sales * config.factor_multiplier(BoCode::Bo4, "velocity");
    let velocity = capped_ratio(
        mtd_sales,
        velocity_benchmark,
        config.factor_cap(BoCode::Bo4, "velocity"),
    );

    let spread_benchmark = (total_dcs
        * config.benchmark_param(BoCode::Bo4, "total_multiplier", DEFAULT_MULTIPLIER))
    .min(last_month_active * config.benchmark_param(BoCode::Bo4, "active_multiplier", DEFAULT_MULTIPLIER));
    let spread = capped_ratio(
        transacting,
        spread_benchmark,
        config.factor_cap(BoCode::Bo4, "spread"),
    );

    Ok(BoFragment::new(velocity * spread)
        .with_factor("velocity", velocity)
        .with_factor("spread", spread))
}

/// BO5: weighted sum of farmer-meeting attainment (benchmarked on
/// private-label-active DCs, optionally capped) and retailer onboarding
/// (benchmarked on the floored portfolio size).
fn market_development(
    snapshot: &MetricsSnapshot,
    config: &ScorecardConfig,
) -> Result<BoFragment, ScorerError> {
    let meetings =
        snapshot.finite_value_or(MetricGroupKind::Onboarding, "farmer_meetings_mtd", 0.0)?;
    let pl_active = snapshot.finite_value_or(
        MetricGroupKind::Onboarding,
        "last_quarter_pl_active_dcs",
        0.0,
    )?;
    let new_retailers =
        snapshot.finite_value_or(MetricGroupKind::Onboarding, "new_retailers_mtd", 0.0)?;
    let total_dcs = snapshot.finite_value_or(MetricGroupKind::DcActivity, "total_dcs", 0.0)?;

    let mut meeting_benchmark = pl_active * config.factor_multiplier(BoCode::Bo5, "meetings");
    if let Some(cap) = config.benchmark_param_opt(BoCode::Bo5, "meeting_benchmark_cap") {
        meeting_benchmark = meeting_benchmark.min(cap);
    }
    let meeting_factor = guarded_ratio(meetings, meeting_benchmark);

    let floor =
        config.benchmark_param(BoCode::Bo5, "onboarding_floor", DEFAULT_ONBOARDING_FLOOR);
    let onboarding_benchmark =
        (total_dcs * config.factor_multiplier(BoCode::Bo5, "onboarding")).max(floor);
    let onboarding_factor = guarded_ratio(new_retailers, onboarding_benchmark);

    let ratio = meeting_factor
        * config.combine_weight(BoCode::Bo5, "meetings", DEFAULT_MEETING_WEIGHT)
        + onboarding_factor
            * config.combine_weight(BoCode::Bo5, "onboarding", DEFAULT_ONBOARDING_WEIGHT);

    Ok(BoFragment::new(ratio)
        .with_factor("meetings", meeting_factor)
        .with_factor("onboarding", onboarding_factor))
}

/// actual / benchmark with the division guard: a benchmark at or below zero
/// scores zero rather than raising.
fn guarded_ratio(actual: f64, benchmark: f64) -> f64 {
    if benchmark <= 0.0 {
        0.0
    } else {
        actual / benchmark
    }
}

fn capped_ratio(actual: f64, benchmark: f64, cap: f64) -> f64 {
    guarded_ratio(actual, benchmark).min(cap)
}
