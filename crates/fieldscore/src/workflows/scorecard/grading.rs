use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::config::ScorecardConfig;
use super::domain::{BoCode, BoResult, Grade};
use super::merge::ResultMap;

/// Picks the grade for a ratio: cutoffs are evaluated in descending order
/// of minimum ratio and the first one at or below the ratio wins. A ratio
/// under every cutoff takes the lowest configured grade; an empty table
/// bottoms out at D.
pub fn grade_for(ratio: f64, thresholds: &BTreeMap<Grade, f64>) -> Grade {
    let mut ordered: Vec<(Grade, f64)> = thresholds
        .iter()
        .map(|(grade, minimum)| (*grade, *minimum))
        .collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    for (grade, minimum) in &ordered {
        if ratio >= *minimum {
            return *grade;
        }
    }
    ordered.last().map(|(grade, _)| *grade).unwrap_or(Grade::D)
}

/// Grades every merged fragment exactly once, returning the graded map plus
/// the pre-rule grade snapshot the resolver gates on.
pub(crate) fn grade_results(
    merged: ResultMap,
    config: &ScorecardConfig,
) -> (BTreeMap<BoCode, BoResult>, BTreeMap<BoCode, Grade>) {
    let mut results = BTreeMap::new();
    let mut initial_grades = BTreeMap::new();

    for (code, fragment) in merged.into_inner() {
        let grade = grade_for(fragment.ratio, &config.thresholds_for(code));
        initial_grades.insert(code, grade);
        results.insert(
            code,
            BoResult {
                ratio: fragment.ratio,
                grade,
                factors: fragment.factors,
            },
        );
    }

    (results, initial_grades)
}

#[cfg(test)]
mod tests {
    use super::super::config::DEFAULT_GRADE_THRESHOLDS;
    use super::super::domain::BoFragment;
    use super::*;

    fn default_thresholds() -> BTreeMap<Grade, f64> {
        DEFAULT_GRADE_THRESHOLDS.into_iter().collect()
    }

    #[test]
    fn default_bands_cover_the_documented_ranges() {
        let thresholds = default_thresholds();
        let cases = [
            (1.5, Grade::A),
            (1.0, Grade::A),
            (0.99, Grade::B),
            (0.5, Grade::B),
            (0.49, Grade::C),
            (0.25, Grade::C),
            (0.24, Grade::D),
            (0.0, Grade::D),
        ];
        for (ratio, expected) in cases {
            assert_eq!(grade_for(ratio, &thresholds), expected, "ratio {ratio}");
        }
    }

    #[test]
    fn ratio_below_every_cutoff_takes_the_lowest_configured_grade() {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(Grade::A, 2.0);
        thresholds.insert(Grade::B, 1.0);
        assert_eq!(grade_for(0.3, &thresholds), Grade::B);
    }

    #[test]
    fn empty_threshold_table_bottoms_out_at_d() {
        assert_eq!(grade_for(3.0, &BTreeMap::new()), Grade::D);
    }

    #[test]
    fn per_objective_override_grades_only_its_objective() {
        let config = ScorecardConfig::from_json(
            r#"{
                "business_objectives": [
                    {"bo_code": "BO1", "grading": {"thresholds": {"A": 2.0, "D": 0.0}}}
                ]
            }"#,
        )
        .expect("config parses");

        let mut merged = ResultMap::new();
        merged.merge_fragment(BoCode::Bo1, BoFragment::new(1.2));
        merged.merge_fragment(BoCode::Bo2, BoFragment::new(1.2));

        let (results, initial) = grade_results(merged, &config);
        assert_eq!(results[&BoCode::Bo1].grade, Grade::D);
        assert_eq!(results[&BoCode::Bo2].grade, Grade::A);
        assert_eq!(initial[&BoCode::Bo1], Grade::D);
    }

    #[test]
    fn initial_snapshot_matches_the_graded_map() {
        let mut merged = ResultMap::new();
        for (idx, code) in BoCode::ordered().into_iter().enumerate() {
            merged.merge_fragment(code, BoFragment::new(0.3 * idx as f64));
        }
        let (results, initial) = grade_results(merged, &ScorecardConfig::default());
        assert_eq!(results.len(), initial.len());
        for (code, result) in &results {
            assert_eq!(initial[code], result.grade);
        }
    }
}
