use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one of the five business objectives scored for every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoCode {
    #[serde(rename = "BO1")]
    Bo1,
    #[serde(rename = "BO2")]
    Bo2,
    #[serde(rename = "BO3")]
    Bo3,
    #[serde(rename = "BO4")]
    Bo4,
    #[serde(rename = "BO5")]
    Bo5,
}

impl BoCode {
    /// Canonical scoring order, also the fan-out submission order.
    pub const fn ordered() -> [BoCode; 5] {
        [
            BoCode::Bo1,
            BoCode::Bo2,
            BoCode::Bo3,
            BoCode::Bo4,
            BoCode::Bo5,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            BoCode::Bo1 => "BO1",
            BoCode::Bo2 => "BO2",
            BoCode::Bo3 => "BO3",
            BoCode::Bo4 => "BO4",
            BoCode::Bo5 => "BO5",
        }
    }

    /// Human-readable objective name shown in reports.
    pub const fn objective(self) -> &'static str {
        match self {
            BoCode::Bo1 => "Private Label Sales",
            BoCode::Bo2 => "DC Check-ins",
            BoCode::Bo3 => "Receivables Control",
            BoCode::Bo4 => "Overall Sales",
            BoCode::Bo5 => "Market Development",
        }
    }

    pub fn parse(raw: &str) -> Option<BoCode> {
        BoCode::ordered()
            .into_iter()
            .find(|code| code.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for BoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Letter grade assigned to a scored objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn label(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ungraded output of a single scorer: the attainment ratio plus any named
/// sub-ratios that fed into it. Factors serialize flattened next to the
/// ratio, the shape downstream consumers already ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoFragment {
    pub ratio: f64,
    #[serde(flatten)]
    pub factors: BTreeMap<String, f64>,
}

impl BoFragment {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio,
            factors: BTreeMap::new(),
        }
    }

    pub fn with_factor(mut self, name: &str, value: f64) -> Self {
        self.factors.insert(name.to_string(), value);
        self
    }

    /// Clamps the ratio and every factor to finite non-negative numbers.
    pub(crate) fn sanitized(mut self) -> Self {
        self.ratio = sane(self.ratio);
        for value in self.factors.values_mut() {
            *value = sane(*value);
        }
        self
    }
}

fn sane(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// A fragment after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoResult {
    pub ratio: f64,
    pub grade: Grade,
    #[serde(flatten)]
    pub factors: BTreeMap<String, f64>,
}

/// An objective whose scorer produced no fragment this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedObjective {
    pub code: BoCode,
    pub reason: String,
}
