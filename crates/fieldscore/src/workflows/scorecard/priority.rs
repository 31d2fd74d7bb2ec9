use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::config::{RuleCondition, RuleEffect, ScorecardConfig};
use super::domain::{BoCode, BoResult, Grade};

/// Sort position for codes absent from the default ordering.
const UNRANKED: usize = usize::MAX;

/// Applies the conditional rules to the graded results and computes the
/// final ordering. Single pass, deterministic: rule application happens
/// before ordering, explicit-override selection after.
pub(crate) fn resolve(
    results: &mut BTreeMap<BoCode, BoResult>,
    initial_grades: &BTreeMap<BoCode, Grade>,
    config: &ScorecardConfig,
) -> Vec<BoCode> {
    apply_grade_rules(results, config);
    let sorted = default_sorted(results, config);

    if let Some(explicit) = explicit_override(config) {
        let gate_armed = all_d_gate_armed(config);
        if !gate_armed || all_grades_d(results, initial_grades, config) {
            return overridden_order(&explicit, results, sorted);
        }
    }
    sorted
}

/// Runs every grade-mutating rule in config order. Conditions are checked
/// against the grades as mutated so far, so later rules can chain off
/// earlier ones. A rule whose target is not in the results is skipped.
fn apply_grade_rules(results: &mut BTreeMap<BoCode, BoResult>, config: &ScorecardConfig) {
    for rule in config.conditional_rules() {
        let (target, grade) = match rule.then.effect() {
            Some(RuleEffect::SetGrade { bo, grade }) => (bo, grade),
            Some(RuleEffect::CapGrade { bo, grade }) => (bo, grade),
            _ => continue,
        };
        if !condition_matches(&rule.when, results) {
            continue;
        }
        if let Some(result) = results.get_mut(&target) {
            result.grade = grade;
        }
    }
}

fn condition_matches(condition: &RuleCondition, results: &BTreeMap<BoCode, BoResult>) -> bool {
    let (Some(bo), Some(grade)) = (condition.bo, condition.grade) else {
        return false;
    };
    results
        .get(&bo)
        .map(|result| result.grade == grade)
        .unwrap_or(false)
}

/// Ranks grades by ascending threshold, so the worst grade sorts first and
/// surfaces at the top of the remediation list.
fn grade_ranks(config: &ScorecardConfig) -> BTreeMap<Grade, usize> {
    let mut ordered: Vec<(Grade, f64)> = config.grade_thresholds().into_iter().collect();
    ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, (grade, _))| (grade, rank))
        .collect()
}

fn default_sorted(results: &BTreeMap<BoCode, BoResult>, config: &ScorecardConfig) -> Vec<BoCode> {
    let ranks = grade_ranks(config);
    let default_order = config.default_priority_order();
    let position = |code: BoCode| {
        default_order
            .iter()
            .position(|candidate| *candidate == code)
            .unwrap_or(UNRANKED)
    };

    let mut codes: Vec<BoCode> = results.keys().copied().collect();
    codes.sort_by_key(|code| {
        let rank = ranks.get(&results[code].grade).copied().unwrap_or(0);
        (rank, position(*code))
    });
    codes
}

/// Picks the explicit ordering: the first rule clause carrying a non-empty
/// `priority_override` wins, without evaluating that rule's condition, and
/// the clause's raw field is read so a mixed clause still supplies its
/// ordering. `priority_overrides.explicit_order` is the fallback.
fn explicit_override(config: &ScorecardConfig) -> Option<Vec<BoCode>> {
    for rule in config.conditional_rules() {
        if let Some(order) = &rule.then.priority_override {
            if !order.is_empty() {
                return Some(order.clone());
            }
        }
    }
    let fallback = &config.overrides().explicit_order;
    if fallback.is_empty() {
        None
    } else {
        Some(fallback.clone())
    }
}

/// Either spelling arms the gate: a rule conditioned on `all_bos_grade: D`,
/// or the legacy boolean override flag.
fn all_d_gate_armed(config: &ScorecardConfig) -> bool {
    config
        .conditional_rules()
        .iter()
        .any(|rule| rule.when.arms_all_d_gate())
        || config.overrides().apply_only_when_all_d
}

fn all_grades_d(
    results: &BTreeMap<BoCode, BoResult>,
    initial_grades: &BTreeMap<BoCode, Grade>,
    config: &ScorecardConfig,
) -> bool {
    if config.overrides().evaluate_on_initial_grades {
        initial_grades.values().all(|grade| *grade == Grade::D)
    } else {
        results.values().all(|result| result.grade == Grade::D)
    }
}

/// Explicit entries filtered to scored codes (first occurrence wins), then
/// the remaining codes in default-sorted order.
fn overridden_order(
    explicit: &[BoCode],
    results: &BTreeMap<BoCode, BoResult>,
    sorted: Vec<BoCode>,
) -> Vec<BoCode> {
    let mut order: Vec<BoCode> = Vec::with_capacity(results.len());
    for code in explicit {
        if results.contains_key(code) && !order.contains(code) {
            order.push(*code);
        }
    }
    for code in sorted {
        if !order.contains(&code) {
            order.push(code);
        }
    }
    order
}
