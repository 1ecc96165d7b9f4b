use super::engine::reconcile;
use super::options::FilterOptionIndex;
use crate::records::EliminationType;

/// Active selection. An empty component means "no constraint at this level".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterTuple {
    pub elimination: String,
    pub round: String,
    pub heat: String,
}

/// Filter levels, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterLevel {
    Elimination,
    Round,
    Heat,
}

impl FilterLevel {
    pub const ALL: [FilterLevel; 3] = [FilterLevel::Elimination, FilterLevel::Round, FilterLevel::Heat];

    pub fn label(&self) -> &'static str {
        match self {
            FilterLevel::Elimination => "Elimination",
            FilterLevel::Round => "Round",
            FilterLevel::Heat => "Heat",
        }
    }

    pub fn next(&self) -> FilterLevel {
        match self {
            FilterLevel::Elimination => FilterLevel::Round,
            FilterLevel::Round => FilterLevel::Heat,
            FilterLevel::Heat => FilterLevel::Elimination,
        }
    }
}

/// A single user edit to the tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Set(FilterLevel, String),
    Clear,
}

impl FilterTuple {
    pub fn new(elimination: &str, round: &str, heat: &str) -> Self {
        Self {
            elimination: elimination.to_string(),
            round: round.to_string(),
            heat: heat.to_string(),
        }
    }

    /// Tuple from typed input: values are trimmed and the elimination type is
    /// spelled the way records spell it ("single" -> "Single")
    pub fn from_input(elimination: &str, round: &str, heat: &str) -> Self {
        let elimination = match elimination.trim() {
            "" => String::new(),
            raw => EliminationType::from(raw).as_str().to_string(),
        };
        Self {
            elimination,
            round: round.trim().to_string(),
            heat: heat.trim().to_string(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.elimination.is_empty() && self.round.is_empty() && self.heat.is_empty()
    }

    pub fn get(&self, level: FilterLevel) -> &str {
        match level {
            FilterLevel::Elimination => &self.elimination,
            FilterLevel::Round => &self.round,
            FilterLevel::Heat => &self.heat,
        }
    }

    /// Apply an edit and reconcile the result against `index`.
    ///
    /// This is the only way the dashboard mutates its tuple, so downstream
    /// selections never point at values the upstream selection excludes.
    pub fn with_change(&self, change: FilterChange, index: &FilterOptionIndex) -> FilterTuple {
        let mut next = self.clone();
        match change {
            FilterChange::Set(FilterLevel::Elimination, value) => next.elimination = value,
            FilterChange::Set(FilterLevel::Round, value) => next.round = value,
            FilterChange::Set(FilterLevel::Heat, value) => next.heat = value,
            FilterChange::Clear => next = FilterTuple::default(),
        }
        reconcile(&next, index)
    }

    /// Non-empty components as upstream query parameters
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if !self.elimination.is_empty() {
            pairs.push(("elimination", self.elimination.as_str()));
        }
        if !self.round.is_empty() {
            pairs.push(("round_name", self.round.as_str()));
        }
        if !self.heat.is_empty() {
            pairs.push(("heat_number", self.heat.as_str()));
        }
        pairs
    }

    /// Short human description, e.g. "Single / Round 2 / Heat 19a"
    pub fn describe(&self) -> String {
        if self.is_unconstrained() {
            return "All results".to_string();
        }
        let mut parts = Vec::new();
        if !self.elimination.is_empty() {
            parts.push(self.elimination.clone());
        }
        if !self.round.is_empty() {
            parts.push(self.round.clone());
        }
        if !self.heat.is_empty() {
            parts.push(format!("Heat {}", self.heat));
        }
        parts.join(" / ")
    }
}
