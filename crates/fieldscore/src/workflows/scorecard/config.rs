use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::domain::{BoCode, Grade};

/// Grade cutoffs used when the config supplies none.
pub(crate) const DEFAULT_GRADE_THRESHOLDS: [(Grade, f64); 4] = [
    (Grade::A, 1.0),
    (Grade::B, 0.5),
    (Grade::C, 0.25),
    (Grade::D, 0.0),
];

/// Tie-break ordering used when the config supplies none.
pub(crate) const DEFAULT_PRIORITY_ORDER: [BoCode; 5] = [
    BoCode::Bo1,
    BoCode::Bo2,
    BoCode::Bo4,
    BoCode::Bo3,
    BoCode::Bo5,
];

pub(crate) const DEFAULT_MULTIPLIER: f64 = 1.0;
pub(crate) const DEFAULT_FACTOR_CAP: f64 = 1.5;

/// Scorecard configuration as delivered by the config collaborator. Every
/// field is optional; lookups go through the accessor layer below so each
/// documented default lives in exactly one place.
///
/// Deployed config files predate some of the current field names, so the
/// legacy spellings (`bo_code` conditions, `CAP_GRADE` actions, the
/// `apply_only_when_all_D` flag, root-level `default_order`) are accepted
/// alongside the current ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardConfig {
    pub grade_thresholds: Option<BTreeMap<Grade, f64>>,
    pub business_objectives: Vec<ObjectiveConfig>,
    pub priority_rules: PriorityRules,
    pub priority_overrides: PriorityOverrides,
    /// Legacy root-level fallback for `priority_rules.default_priority_order`.
    pub default_order: Option<Vec<BoCode>>,
}

/// Benchmark and factor parameters for one objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    pub bo_code: BoCode,
    #[serde(default)]
    pub benchmark: BTreeMap<String, f64>,
    #[serde(default)]
    pub factors: BTreeMap<String, FactorParams>,
    #[serde(default)]
    pub grading: Option<GradingOverride>,
    #[serde(default)]
    pub combine_logic: Option<CombineLogic>,
}

/// Per-factor benchmark shaping: multiplier on the historical baseline and a
/// cap on the resulting factor ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorParams {
    pub multiplier: Option<f64>,
    pub cap: Option<f64>,
}

/// Per-objective grade cutoffs. A present-but-empty threshold table is
/// honored as written: every ratio then falls to the bottom grade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingOverride {
    pub thresholds: Option<BTreeMap<Grade, f64>>,
}

/// Weights for objectives that combine factors by weighted sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineLogic {
    pub weights: BTreeMap<String, f64>,
}

/// Ordered rule table plus the default tie-break ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityRules {
    pub default_priority_order: Option<Vec<BoCode>>,
    pub conditional_rules: Vec<ConditionalRule>,
}

/// One conditional rule: a grade predicate and the clause applied on match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalRule {
    #[serde(rename = "if")]
    pub when: RuleCondition,
    pub then: RuleAction,
}

/// Rule predicate. Either a single-objective grade check or the all-D form
/// used to arm the explicit-override gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleCondition {
    #[serde(alias = "bo_code")]
    pub bo: Option<BoCode>,
    pub grade: Option<Grade>,
    pub all_bos_grade: Option<Grade>,
}

impl RuleCondition {
    /// True when this is the rule-table spelling of the all-D gate.
    pub(crate) fn arms_all_d_gate(&self) -> bool {
        self.all_bos_grade == Some(Grade::D)
    }
}

/// Raw `then` clause. Kept permissive: clauses written for newer engine
/// versions normalize to no effect instead of failing the whole config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleAction {
    pub set_grade: Option<GradeAssignment>,
    /// Legacy action discriminator; `"CAP_GRADE"` pairs with `target_bo`
    /// and `cap_to`.
    pub action: Option<String>,
    pub target_bo: Option<BoCode>,
    pub cap_to: Option<Grade>,
    pub priority_override: Option<Vec<BoCode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeAssignment {
    pub bo: BoCode,
    pub grade: Grade,
}

/// Normalized interpretation of a `then` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEffect {
    SetGrade { bo: BoCode, grade: Grade },
    CapGrade { bo: BoCode, grade: Grade },
    PriorityOverride(Vec<BoCode>),
}

impl RuleAction {
    /// Normalizes the clause, preferring the current `set_grade` spelling
    /// over the legacy `CAP_GRADE` one. A clause carrying only an ordering
    /// normalizes to `PriorityOverride`; anything else is inert.
    pub fn effect(&self) -> Option<RuleEffect> {
        if let Some(assignment) = &self.set_grade {
            return Some(RuleEffect::SetGrade {
                bo: assignment.bo,
                grade: assignment.grade,
            });
        }
        if self.action.as_deref() == Some("CAP_GRADE") {
            if let (Some(bo), Some(grade)) = (self.target_bo, self.cap_to) {
                return Some(RuleEffect::CapGrade { bo, grade });
            }
        }
        if let Some(order) = &self.priority_override {
            if !order.is_empty() {
                return Some(RuleEffect::PriorityOverride(order.clone()));
            }
        }
        None
    }
}

/// Explicit-ordering overrides and their gating flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityOverrides {
    pub explicit_order: Vec<BoCode>,
    #[serde(alias = "apply_only_when_all_D")]
    pub apply_only_when_all_d: bool,
    pub evaluate_on_initial_grades: bool,
}

impl Default for PriorityOverrides {
    fn default() -> Self {
        Self {
            explicit_order: Vec::new(),
            apply_only_when_all_d: false,
            evaluate_on_initial_grades: true,
        }
    }
}

impl ScorecardConfig {
    /// Parses a config document. Unknown fields are ignored so configs
    /// written for newer engine versions still load.
    pub fn from_json(raw: &str) -> Result<Self, ScorecardConfigError> {
        serde_json::from_str(raw).map_err(ScorecardConfigError::Parse)
    }

    /// Loads a config file. An absent file yields the built-in defaults;
    /// an unreadable or malformed file is surfaced.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScorecardConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ScorecardConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        Self::from_json(&raw)
    }

    pub fn objective(&self, code: BoCode) -> Option<&ObjectiveConfig> {
        self.business_objectives
            .iter()
            .find(|objective| objective.bo_code == code)
    }

    /// Named benchmark parameter for an objective, with its documented
    /// default.
    pub fn benchmark_param(&self, code: BoCode, name: &str, default: f64) -> f64 {
        self.benchmark_param_opt(code, name).unwrap_or(default)
    }

    /// Named benchmark parameter whose absence means "unconstrained".
    pub fn benchmark_param_opt(&self, code: BoCode, name: &str) -> Option<f64> {
        self.objective(code)
            .and_then(|objective| objective.benchmark.get(name))
            .copied()
    }

    pub fn factor_multiplier(&self, code: BoCode, factor: &str) -> f64 {
        self.factor_params(code, factor)
            .and_then(|params| params.multiplier)
            .unwrap_or(DEFAULT_MULTIPLIER)
    }

    pub fn factor_cap(&self, code: BoCode, factor: &str) -> f64 {
        self.factor_params(code, factor)
            .and_then(|params| params.cap)
            .unwrap_or(DEFAULT_FACTOR_CAP)
    }

    pub fn combine_weight(&self, code: BoCode, factor: &str, default: f64) -> f64 {
        self.objective(code)
            .and_then(|objective| objective.combine_logic.as_ref())
            .and_then(|logic| logic.weights.get(factor))
            .copied()
            .unwrap_or(default)
    }

    fn factor_params(&self, code: BoCode, factor: &str) -> Option<&FactorParams> {
        self.objective(code)
            .and_then(|objective| objective.factors.get(factor))
    }

    /// Global grade cutoffs, or the built-in defaults when unset.
    pub fn grade_thresholds(&self) -> BTreeMap<Grade, f64> {
        match &self.grade_thresholds {
            Some(thresholds) => thresholds.clone(),
            None => DEFAULT_GRADE_THRESHOLDS.into_iter().collect(),
        }
    }

    /// Grade cutoffs for one objective: the per-objective override when one
    /// is configured, else the global table.
    pub fn thresholds_for(&self, code: BoCode) -> BTreeMap<Grade, f64> {
        self.objective(code)
            .and_then(|objective| objective.grading.as_ref())
            .and_then(|grading| grading.thresholds.clone())
            .unwrap_or_else(|| self.grade_thresholds())
    }

    /// Tie-break ordering: `priority_rules.default_priority_order`, then the
    /// legacy root `default_order`, then the built-in order.
    pub fn default_priority_order(&self) -> Vec<BoCode> {
        self.priority_rules
            .default_priority_order
            .clone()
            .or_else(|| self.default_order.clone())
            .unwrap_or_else(|| DEFAULT_PRIORITY_ORDER.to_vec())
    }

    pub fn conditional_rules(&self) -> &[ConditionalRule] {
        &self.priority_rules.conditional_rules
    }

    pub fn overrides(&self) -> &PriorityOverrides {
        &self.priority_overrides
    }
}

/// Error enumeration for config loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardConfigError {
    #[error("failed to read scorecard config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scorecard config is not valid JSON")]
    Parse(#[source] serde_json::Error),
}
