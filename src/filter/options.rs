use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::records::{EliminationType, ScoreRecord};

/// Cascading option lists derived from one record set.
///
/// Rebuilt wholesale for every new record set; never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptionIndex {
    elimination_types: Vec<String>,
    rounds: Vec<String>,
    heats: Vec<String>,
    rounds_by_elimination: HashMap<String, Vec<String>>,
    heats_by_round: HashMap<String, Vec<String>>,
}

impl FilterOptionIndex {
    pub fn build(records: &[ScoreRecord]) -> Self {
        let mut eliminations: BTreeSet<EliminationType> = BTreeSet::new();
        let mut rounds: HashSet<&str> = HashSet::new();
        let mut heats: HashSet<&str> = HashSet::new();
        let mut rounds_by_elimination: HashMap<String, HashSet<&str>> = HashMap::new();
        let mut heats_by_round: HashMap<String, HashSet<&str>> = HashMap::new();

        for record in records {
            let round = record.round_name.as_str();
            let heat = record.heat_number.as_str();

            if let Some(elimination) = &record.elimination {
                if !elimination.as_str().is_empty() {
                    eliminations.insert(elimination.clone());
                    if !round.is_empty() {
                        rounds_by_elimination
                            .entry(elimination.as_str().to_string())
                            .or_default()
                            .insert(round);
                    }
                }
            }

            if !round.is_empty() {
                rounds.insert(round);
                if !heat.is_empty() {
                    heats_by_round.entry(round.to_string()).or_default().insert(heat);
                }
            }

            if !heat.is_empty() {
                heats.insert(heat);
            }
        }

        Self {
            elimination_types: eliminations.iter().map(|e| e.as_str().to_string()).collect(),
            rounds: sorted_labels(rounds),
            heats: sorted_labels(heats),
            rounds_by_elimination: rounds_by_elimination
                .into_iter()
                .map(|(k, v)| (k, sorted_labels(v)))
                .collect(),
            heats_by_round: heats_by_round
                .into_iter()
                .map(|(k, v)| (k, sorted_labels(v)))
                .collect(),
        }
    }

    pub fn elimination_types(&self) -> &[String] {
        &self.elimination_types
    }

    pub fn rounds(&self) -> &[String] {
        &self.rounds
    }

    pub fn heats(&self) -> &[String] {
        &self.heats
    }

    /// Rounds selectable under `elimination`; every round when unconstrained,
    /// nothing when the elimination type never occurs.
    pub fn rounds_for(&self, elimination: &str) -> &[String] {
        if elimination.is_empty() {
            return &self.rounds;
        }
        self.rounds_by_elimination
            .get(elimination)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Heats selectable under `round`, with the same conventions as [`rounds_for`](Self::rounds_for).
    pub fn heats_for(&self, round: &str) -> &[String] {
        if round.is_empty() {
            return &self.heats;
        }
        self.heats_by_round.get(round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.elimination_types.is_empty() && self.rounds.is_empty() && self.heats.is_empty()
    }
}

fn sorted_labels(labels: HashSet<&str>) -> Vec<String> {
    let mut out: Vec<String> = labels.into_iter().map(str::to_string).collect();
    out.sort_by(|a, b| compare_labels(a, b));
    out
}

/// Split "Round 12" into ("Round ", 12). Labels without trailing digits return None.
fn split_trailing_number(label: &str) -> Option<(&str, u64)> {
    let prefix_len = label.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if prefix_len == label.len() {
        return None;
    }
    let number = label[prefix_len..].parse::<u64>().ok()?;
    Some((&label[..prefix_len], number))
}

/// Ordering for round and heat labels.
///
/// Labels of the form `<prefix><integer>` with the same prefix compare by the
/// integer ("Heat 2" < "Heat 10"); everything else compares lexicographically.
/// Ties fall back to the raw string so the order is total.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    label_key(a).cmp(&label_key(b)).then_with(|| a.cmp(b))
}

fn label_key(label: &str) -> (&str, Option<u64>) {
    match split_trailing_number(label) {
        Some((prefix, n)) => (prefix, Some(n)),
        None => (label, None),
    }
}
