use std::collections::HashSet;

use crate::records::{ScoreKind, ScoreRecord};

use super::engine::{Aggregate, BestScore, CategoryAggregates};

/// How best scores are attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Cross-athlete leaderboard: holders carry athlete identity
    Event,
    /// One subject athlete: holders are occurrences (round and heat)
    Athlete,
}

/// Who (or where) a best score was achieved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Holder {
    Athlete {
        athlete_id: String,
        athlete_name: String,
        round_name: String,
        heat_number: String,
    },
    Occurrence {
        round_name: String,
        heat_number: String,
    },
}

impl Holder {
    fn from_record(record: &ScoreRecord, mode: ProjectionMode) -> Self {
        match mode {
            ProjectionMode::Event => Holder::Athlete {
                athlete_id: record.athlete_id.clone(),
                athlete_name: record.athlete_name.clone(),
                round_name: record.round_name.clone(),
                heat_number: record.heat_number.clone(),
            },
            ProjectionMode::Athlete => Holder::Occurrence {
                round_name: record.round_name.clone(),
                heat_number: record.heat_number.clone(),
            },
        }
    }

    pub fn athlete_name(&self) -> Option<&str> {
        match self {
            Holder::Athlete { athlete_name, .. } => Some(athlete_name),
            Holder::Occurrence { .. } => None,
        }
    }

    pub fn round_name(&self) -> &str {
        match self {
            Holder::Athlete { round_name, .. } | Holder::Occurrence { round_name, .. } => round_name,
        }
    }

    pub fn heat_number(&self) -> &str {
        match self {
            Holder::Athlete { heat_number, .. } | Holder::Occurrence { heat_number, .. } => heat_number,
        }
    }

    /// "Name (Round 1, Heat 3)" or "Round 1, Heat 3"
    pub fn describe(&self) -> String {
        let place = format!("{}, Heat {}", self.round_name(), self.heat_number());
        match self.athlete_name() {
            Some(name) => format!("{} ({})", name, place),
            None => place,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatBest {
    pub score: f64,
    pub holder: Holder,
    pub tied: Vec<Holder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveBest {
    pub score: f64,
    pub holder: Holder,
    pub tied: Vec<Holder>,
}

/// One tied holder and every move it landed at the best score
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TiedJump {
    pub holder: Holder,
    pub moves: Vec<String>,
}

/// Jumps additionally carry the move that produced the score.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpBest {
    pub score: f64,
    pub holder: Holder,
    pub move_type: String,
    pub tied: Vec<TiedJump>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryBest {
    Heat(HeatBest),
    Jump(JumpBest),
    Wave(WaveBest),
}

impl CategoryBest {
    pub fn kind(&self) -> ScoreKind {
        match self {
            CategoryBest::Heat(_) => ScoreKind::Heat,
            CategoryBest::Jump(_) => ScoreKind::Jump,
            CategoryBest::Wave(_) => ScoreKind::Wave,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            CategoryBest::Heat(b) => b.score,
            CategoryBest::Jump(b) => b.score,
            CategoryBest::Wave(b) => b.score,
        }
    }

    pub fn holder(&self) -> &Holder {
        match self {
            CategoryBest::Heat(b) => &b.holder,
            CategoryBest::Jump(b) => &b.holder,
            CategoryBest::Wave(b) => &b.holder,
        }
    }

    pub fn tied_count(&self) -> usize {
        match self {
            CategoryBest::Heat(b) => b.tied.len(),
            CategoryBest::Jump(b) => b.tied.len(),
            CategoryBest::Wave(b) => b.tied.len(),
        }
    }

    pub fn has_multiple_tied(&self) -> bool {
        self.tied_count() > 1
    }

    /// One display line per tied holder, in record order
    pub fn tied_lines(&self) -> Vec<String> {
        match self {
            CategoryBest::Heat(b) => b.tied.iter().map(Holder::describe).collect(),
            CategoryBest::Wave(b) => b.tied.iter().map(Holder::describe).collect(),
            CategoryBest::Jump(b) => b
                .tied
                .iter()
                .map(|t| format!("{}: {}", t.holder.describe(), t.moves.join(", ")))
                .collect(),
        }
    }
}

/// Card for one kind. `best == None` is the "no data" state.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCard {
    pub kind: ScoreKind,
    pub best: Option<CategoryBest>,
    pub average: Option<f64>,
    pub valid_count: usize,
}

/// One bar group of the move-type chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub move_type: String,
    pub best: Option<f64>,
    pub average: Option<f64>,
    pub best_by: Option<Holder>,
    /// Fleet comparison anchor; never recomputed from the filtered subset
    pub fleet_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mode: ProjectionMode,
    /// Always Heat, Jump, Wave in that order
    pub cards: Vec<SummaryCard>,
    pub series: Vec<CategorySeries>,
}

impl Summary {
    pub fn card(&self, kind: ScoreKind) -> Option<&SummaryCard> {
        self.cards.iter().find(|c| c.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.iter().all(|c| c.best.is_none()) && self.series.iter().all(|s| s.best.is_none())
    }
}

/// Shape aggregates into summary cards and chart series for one projection mode.
pub fn project(aggregates: &CategoryAggregates, mode: ProjectionMode) -> Summary {
    let cards = ScoreKind::ALL
        .iter()
        .map(|&kind| {
            let aggregate = aggregates.kind(kind);
            SummaryCard {
                kind,
                best: aggregate.best.as_ref().map(|b| project_best(kind, b, mode)),
                average: aggregate.average,
                valid_count: aggregate.valid_count,
            }
        })
        .collect();

    let series = aggregates
        .move_types
        .iter()
        .map(|m| series_for(&m.move_type, &m.aggregate, mode))
        .collect();

    Summary { mode, cards, series }
}

fn series_for(move_type: &str, aggregate: &Aggregate, mode: ProjectionMode) -> CategorySeries {
    CategorySeries {
        move_type: move_type.to_string(),
        best: aggregate.best_score(),
        average: aggregate.average,
        best_by: aggregate
            .best
            .as_ref()
            .map(|b| Holder::from_record(&b.holder, mode)),
        fleet_average: None,
    }
}

fn project_best(kind: ScoreKind, best: &BestScore, mode: ProjectionMode) -> CategoryBest {
    let holder = Holder::from_record(&best.holder, mode);
    match kind {
        ScoreKind::Heat => CategoryBest::Heat(HeatBest {
            score: best.score,
            holder,
            tied: distinct_holders(&best.tied, mode),
        }),
        ScoreKind::Wave => CategoryBest::Wave(WaveBest {
            score: best.score,
            holder,
            tied: distinct_holders(&best.tied, mode),
        }),
        ScoreKind::Jump => {
            let mut tied: Vec<TiedJump> = Vec::new();
            for record in &best.tied {
                let holder = Holder::from_record(record, mode);
                let move_type = move_name(record);
                match tied.iter_mut().find(|t| t.holder == holder) {
                    Some(entry) if entry.moves.contains(&move_type) => {}
                    Some(entry) => entry.moves.push(move_type),
                    None => tied.push(TiedJump {
                        holder,
                        moves: vec![move_type],
                    }),
                }
            }
            CategoryBest::Jump(JumpBest {
                score: best.score,
                holder,
                move_type: move_name(&best.holder),
                tied,
            })
        }
    }
}

/// Event mode groups by athlete and occurrence, athlete mode by occurrence only
fn distinct_holders(records: &[ScoreRecord], mode: ProjectionMode) -> Vec<Holder> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| Holder::from_record(r, mode))
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

fn move_name(record: &ScoreRecord) -> String {
    record
        .category
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;

    fn record(kind: ScoreKind, athlete: &str, score: f64, round: &str, heat: &str) -> ScoreRecord {
        ScoreRecord {
            kind,
            athlete_id: athlete.to_lowercase(),
            athlete_name: athlete.to_string(),
            score: Some(score),
            round_name: round.to_string(),
            heat_number: heat.to_string(),
            elimination: None,
            category: None,
            counting: true,
        }
    }

    fn jump(athlete: &str, score: f64, round: &str, heat: &str, move_type: &str) -> ScoreRecord {
        ScoreRecord {
            category: Some(move_type.to_string()),
            ..record(ScoreKind::Jump, athlete, score, round, heat)
        }
    }

    #[test]
    fn test_event_mode_keeps_athlete_identity() {
        let records = vec![
            record(ScoreKind::Heat, "A", 7.0, "Round 1", "3"),
            record(ScoreKind::Heat, "B", 7.0, "Round 1", "3"),
            record(ScoreKind::Heat, "C", 6.5, "Round 1", "3"),
        ];
        let summary = project(&aggregate(&records), ProjectionMode::Event);
        let best = summary.card(ScoreKind::Heat).unwrap().best.as_ref().unwrap();

        assert_eq!(best.score(), 7.0);
        assert_eq!(best.holder().athlete_name(), Some("A"));
        assert_eq!(best.tied_count(), 2);
        assert_eq!(
            best.tied_lines(),
            vec!["A (Round 1, Heat 3)", "B (Round 1, Heat 3)"]
        );
    }

    #[test]
    fn test_athlete_mode_groups_by_occurrence() {
        // Two jumps in the same heat share the maximum: one occurrence in athlete mode
        let records = vec![
            record(ScoreKind::Wave, "A", 5.0, "Round 1", "3"),
            record(ScoreKind::Wave, "A", 5.0, "Round 1", "3"),
            record(ScoreKind::Wave, "A", 5.0, "Round 2", "7"),
        ];
        let aggregates = aggregate(&records);

        let athlete = project(&aggregates, ProjectionMode::Athlete);
        let best = athlete.card(ScoreKind::Wave).unwrap().best.as_ref().unwrap();
        assert_eq!(best.tied_count(), 2);
        assert_eq!(best.holder().athlete_name(), None);
        assert_eq!(best.tied_lines(), vec!["Round 1, Heat 3", "Round 2, Heat 7"]);
    }

    #[test]
    fn test_event_mode_distinguishes_athletes_in_same_heat() {
        let records = vec![
            record(ScoreKind::Wave, "A", 5.0, "Round 1", "3"),
            record(ScoreKind::Wave, "B", 5.0, "Round 1", "3"),
        ];
        let aggregates = aggregate(&records);
        let event = project(&aggregates, ProjectionMode::Event);
        let athlete = project(&aggregates, ProjectionMode::Athlete);

        assert_eq!(event.card(ScoreKind::Wave).unwrap().best.as_ref().unwrap().tied_count(), 2);
        assert_eq!(athlete.card(ScoreKind::Wave).unwrap().best.as_ref().unwrap().tied_count(), 1);
    }

    #[test]
    fn test_jump_without_move_counts_on_card_only() {
        let records = vec![record(ScoreKind::Jump, "A", 6.0, "Round 1", "3")];
        let summary = project(&aggregate(&records), ProjectionMode::Event);

        match summary.card(ScoreKind::Jump).unwrap().best.as_ref().unwrap() {
            CategoryBest::Jump(best) => assert_eq!(best.move_type, "Unknown"),
            other => panic!("expected jump best, got {:?}", other),
        }
        assert!(summary.series.is_empty());
    }

    #[test]
    fn test_athlete_mode_jump_ties_group_moves_by_heat() {
        let records = vec![
            jump("A", 6.0, "Round 1", "3", "Forward Loop"),
            jump("A", 6.0, "Round 1", "3", "Backloop"),
            jump("A", 6.0, "Round 1", "3", "Backloop"),
            jump("A", 6.0, "Round 2", "7", "Backloop"),
        ];
        let summary = project(&aggregate(&records), ProjectionMode::Athlete);
        let best = summary.card(ScoreKind::Jump).unwrap().best.as_ref().unwrap();

        assert_eq!(best.tied_count(), 2);
        assert_eq!(
            best.tied_lines(),
            vec!["Round 1, Heat 3: Forward Loop, Backloop", "Round 2, Heat 7: Backloop"]
        );
    }

    #[test]
    fn test_jump_best_carries_move_type() {
        let records = vec![
            jump("A", 6.0, "Round 1", "3", "Forward Loop"),
            jump("B", 6.0, "Round 1", "4", "Backloop"),
            jump("C", 4.0, "Round 1", "4", "Backloop"),
        ];
        let summary = project(&aggregate(&records), ProjectionMode::Event);
        match summary.card(ScoreKind::Jump).unwrap().best.as_ref().unwrap() {
            CategoryBest::Jump(best) => {
                assert_eq!(best.move_type, "Forward Loop");
                assert_eq!(best.tied.len(), 2);
                assert_eq!(best.tied[1].moves, vec!["Backloop"]);
            }
            other => panic!("expected jump best, got {:?}", other),
        }

        let backloop = summary.series.iter().find(|s| s.move_type == "Backloop").unwrap();
        assert_eq!(backloop.best, Some(6.0));
        assert_eq!(backloop.average, Some(5.0));
        assert_eq!(backloop.best_by.as_ref().and_then(|h| h.athlete_name()), Some("B"));
        assert_eq!(backloop.fleet_average, None);
    }

    #[test]
    fn test_empty_kind_does_not_blank_others() {
        let records = vec![record(ScoreKind::Heat, "A", 9.5, "Final", "1")];
        let summary = project(&aggregate(&records), ProjectionMode::Athlete);

        assert!(summary.card(ScoreKind::Heat).unwrap().best.is_some());
        assert!(summary.card(ScoreKind::Jump).unwrap().best.is_none());
        assert!(summary.card(ScoreKind::Wave).unwrap().average.is_none());
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_project_empty_aggregates() {
        let summary = project(&aggregate(&[]), ProjectionMode::Event);
        assert_eq!(summary.cards.len(), 3);
        assert!(summary.is_empty());
    }
}
