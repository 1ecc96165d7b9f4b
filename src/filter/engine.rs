use tracing::debug;

use super::options::FilterOptionIndex;
use super::tuple::FilterTuple;
use crate::records::ScoreRecord;

/// True when every non-empty component of `tuple` equals the record's field
pub fn matches(record: &ScoreRecord, tuple: &FilterTuple) -> bool {
    if !tuple.elimination.is_empty() && record.elimination_str() != tuple.elimination {
        return false;
    }
    if !tuple.round.is_empty() && record.round_name != tuple.round {
        return false;
    }
    if !tuple.heat.is_empty() && record.heat_number != tuple.heat {
        return false;
    }
    true
}

/// Records matching `tuple`, in input order
pub fn apply(records: &[ScoreRecord], tuple: &FilterTuple) -> Vec<ScoreRecord> {
    if tuple.is_unconstrained() {
        return records.to_vec();
    }
    records.iter().filter(|r| matches(r, tuple)).cloned().collect()
}

/// Bring `tuple` back in line with the cascading options of `index`.
///
/// A round the elimination type does not contain is cleared together with the
/// heat; a heat the round does not contain is cleared on its own. Nothing ever
/// propagates upward, and the result is a fixed point (reconciling it again
/// changes nothing).
pub fn reconcile(tuple: &FilterTuple, index: &FilterOptionIndex) -> FilterTuple {
    let mut next = tuple.clone();

    if !next.round.is_empty() && !contains(index.rounds_for(&next.elimination), &next.round) {
        debug!(
            elimination = %next.elimination,
            round = %next.round,
            "round not available for elimination, clearing round and heat"
        );
        next.round.clear();
        next.heat.clear();
    }

    if !next.heat.is_empty() && !contains(index.heats_for(&next.round), &next.heat) {
        debug!(round = %next.round, heat = %next.heat, "heat not available for round, clearing heat");
        next.heat.clear();
    }

    next
}

fn contains(options: &[String], value: &str) -> bool {
    options.iter().any(|o| o == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EliminationType, ScoreKind};

    fn record(athlete: &str, elimination: Option<&str>, round: &str, heat: &str) -> ScoreRecord {
        ScoreRecord {
            kind: ScoreKind::Heat,
            athlete_id: athlete.to_string(),
            athlete_name: athlete.to_string(),
            score: Some(6.0),
            round_name: round.to_string(),
            heat_number: heat.to_string(),
            elimination: elimination.map(EliminationType::from),
            category: None,
            counting: true,
        }
    }

    fn sample() -> Vec<ScoreRecord> {
        vec![
            record("A", Some("Single"), "Round 1", "1"),
            record("B", Some("Single"), "Round 1", "2"),
            record("C", Some("Single"), "Round 2", "5"),
            record("D", Some("Double"), "Round 3", "19a"),
            record("E", None, "Round 1", "1"),
        ]
    }

    #[test]
    fn test_apply_unconstrained_is_identity() {
        let records = sample();
        assert_eq!(apply(&records, &FilterTuple::default()), records);
    }

    #[test]
    fn test_apply_by_round_preserves_order() {
        let records = sample();
        let filtered = apply(&records, &FilterTuple::new("", "Round 1", ""));
        let ids: Vec<&str> = filtered.iter().map(|r| r.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "E"]);
    }

    #[test]
    fn test_apply_elimination_excludes_missing_elimination() {
        let records = sample();
        let filtered = apply(&records, &FilterTuple::new("Single", "Round 1", "1"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].athlete_id, "A");
    }

    #[test]
    fn test_apply_no_matches() {
        let records = sample();
        assert!(apply(&records, &FilterTuple::new("", "Round 9", "")).is_empty());
    }

    #[test]
    fn test_reconcile_clears_round_and_heat_for_foreign_elimination() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("Double", "Round 1", "1");
        assert_eq!(reconcile(&tuple, &index), FilterTuple::new("Double", "", ""));
    }

    #[test]
    fn test_reconcile_clears_heat_only() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("Single", "Round 2", "1");
        assert_eq!(reconcile(&tuple, &index), FilterTuple::new("Single", "Round 2", ""));
    }

    #[test]
    fn test_reconcile_keeps_valid_tuple() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("Single", "Round 1", "2");
        assert_eq!(reconcile(&tuple, &index), tuple);
    }

    #[test]
    fn test_reconcile_heat_without_round_uses_all_heats() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("", "", "19a");
        assert_eq!(reconcile(&tuple, &index), tuple);
    }

    #[test]
    fn test_reconcile_never_clears_upward() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("Single", "Round 1", "nope");
        let reconciled = reconcile(&tuple, &index);
        assert_eq!(reconciled.elimination, "Single");
        assert_eq!(reconciled.round, "Round 1");
        assert!(reconciled.heat.is_empty());
    }

    #[test]
    fn test_reconcile_idempotent() {
        let index = FilterOptionIndex::build(&sample());
        let tuple = FilterTuple::new("Double", "Round 1", "2");
        let once = reconcile(&tuple, &index);
        assert_eq!(reconcile(&once, &index), once);
    }

    #[test]
    fn test_selecting_double_on_single_only_set_clears_selection() {
        let records = vec![
            record("A", Some("Single"), "Round 1", "1"),
            record("B", Some("Single"), "Round 2", "3"),
        ];
        let index = FilterOptionIndex::build(&records);
        let tuple = FilterTuple::new("Single", "Round 2", "3");
        let next = reconcile(&FilterTuple { elimination: "Double".to_string(), ..tuple }, &index);
        assert_eq!(next, FilterTuple::new("Double", "", ""));
    }
}
