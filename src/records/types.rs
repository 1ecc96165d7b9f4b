use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which scoring discipline a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreKind {
    /// Total heat score (holistic)
    Heat,
    /// Single jump, categorised by move name
    Jump,
    /// Single wave ride (holistic)
    Wave,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 3] = [ScoreKind::Heat, ScoreKind::Jump, ScoreKind::Wave];

    pub fn label(&self) -> &'static str {
        match self {
            ScoreKind::Heat => "Heat",
            ScoreKind::Jump => "Jump",
            ScoreKind::Wave => "Wave",
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bracket a round belongs to.
///
/// Variant order is the display order: single elimination is drawn before
/// double elimination, anything else follows alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EliminationType {
    Single,
    Double,
    Other(String),
}

impl EliminationType {
    pub fn as_str(&self) -> &str {
        match self {
            EliminationType::Single => "Single",
            EliminationType::Double => "Double",
            EliminationType::Other(s) => s,
        }
    }
}

impl From<&str> for EliminationType {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("single") {
            EliminationType::Single
        } else if trimmed.eq_ignore_ascii_case("double") {
            EliminationType::Double
        } else {
            EliminationType::Other(trimmed.to_string())
        }
    }
}

impl fmt::Display for EliminationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Competition division, sent upstream as the `sex` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Men,
    #[default]
    Women,
}

impl Division {
    pub fn as_param(&self) -> &'static str {
        match self {
            Division::Men => "Men",
            Division::Women => "Women",
        }
    }

    pub fn toggled(&self) -> Division {
        match self {
            Division::Men => Division::Women,
            Division::Women => Division::Men,
        }
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "men" | "m" => Ok(Division::Men),
            "women" | "w" => Ok(Division::Women),
            other => Err(format!("unknown division '{}' (expected men or women)", other)),
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// One observed score, normalised from whichever upstream list it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub kind: ScoreKind,
    pub athlete_id: String,
    pub athlete_name: String,
    pub score: Option<f64>,
    pub round_name: String,
    pub heat_number: String, // labels like "19a" exist, so never parsed
    pub elimination: Option<EliminationType>,
    pub category: Option<String>, // move type for jumps
    pub counting: bool,
}

impl ScoreRecord {
    /// The score if it may take part in an aggregate.
    pub fn valid_score(&self) -> Option<f64> {
        self.score.filter(|s| is_valid_score(*s))
    }

    pub fn elimination_str(&self) -> &str {
        self.elimination.as_ref().map(|e| e.as_str()).unwrap_or("")
    }
}

/// Single validity predicate used wherever a score is read for aggregation.
///
/// Scores are finite and non-negative; anything else is malformed upstream data.
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && score >= 0.0
}
