use std::collections::HashMap;

use crate::records::{ScoreKind, ScoreRecord};

/// Maximum valid score of a partition and every record that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct BestScore {
    pub score: f64,
    /// First record in input order with the maximum score
    pub holder: ScoreRecord,
    /// All records with exactly `score`, in input order; includes `holder`
    pub tied: Vec<ScoreRecord>,
}

impl BestScore {
    pub fn has_multiple_tied(&self) -> bool {
        self.tied.len() > 1
    }
}

/// Best, mean and counts for one partition.
///
/// `best` and `average` are `None` when the partition holds no valid score:
/// that is "no data", which is not the same thing as a score of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub best: Option<BestScore>,
    pub average: Option<f64>,
    pub valid_count: usize,
    pub dropped: usize,
}

impl Aggregate {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ScoreRecord>,
    {
        let mut best: Option<BestScore> = None;
        let mut sum = 0.0_f64;
        let mut min = f64::INFINITY;
        let mut valid_count = 0usize;
        let mut dropped = 0usize;

        for record in records {
            let Some(score) = record.valid_score() else {
                dropped += 1;
                continue;
            };

            sum += score;
            min = min.min(score);
            valid_count += 1;

            match best.as_mut() {
                Some(current) if score > current.score => {
                    *current = BestScore {
                        score,
                        holder: record.clone(),
                        tied: vec![record.clone()],
                    };
                }
                Some(current) if score == current.score => current.tied.push(record.clone()),
                Some(_) => {}
                None => {
                    best = Some(BestScore {
                        score,
                        holder: record.clone(),
                        tied: vec![record.clone()],
                    });
                }
            }
        }

        // Summation rounding can push the mean a few ulps outside [min, max]
        let average = best
            .as_ref()
            .map(|b| (sum / valid_count as f64).clamp(min, b.score));

        Self {
            best,
            average,
            valid_count,
            dropped,
        }
    }

    pub fn has_data(&self) -> bool {
        self.best.is_some()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveTypeAggregate {
    pub move_type: String,
    pub aggregate: Aggregate,
}

/// Aggregates for every partition of one (possibly filtered) record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryAggregates {
    pub heat: Aggregate,
    pub jump: Aggregate,
    pub wave: Aggregate,
    /// One entry per distinct category value, in order of first appearance
    pub move_types: Vec<MoveTypeAggregate>,
}

impl CategoryAggregates {
    pub fn kind(&self, kind: ScoreKind) -> &Aggregate {
        match kind {
            ScoreKind::Heat => &self.heat,
            ScoreKind::Jump => &self.jump,
            ScoreKind::Wave => &self.wave,
        }
    }

    pub fn move_type(&self, move_type: &str) -> Option<&Aggregate> {
        self.move_types
            .iter()
            .find(|m| m.move_type == move_type)
            .map(|m| &m.aggregate)
    }

    /// Add empty partitions for move types absent from this subset, so a filter
    /// that excludes a move type reports it as "no data" rather than dropping it.
    pub fn with_move_types<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            if self.move_type(name).is_none() {
                self.move_types.push(MoveTypeAggregate {
                    move_type: name.to_string(),
                    aggregate: Aggregate::default(),
                });
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.heat.has_data()
            && !self.jump.has_data()
            && !self.wave.has_data()
            && self.move_types.iter().all(|m| !m.aggregate.has_data())
    }
}

/// Partition `records` by kind and by category, and aggregate each partition
/// independently. Malformed scores are counted as dropped, never raised.
pub fn aggregate(records: &[ScoreRecord]) -> CategoryAggregates {
    let by_kind = |kind: ScoreKind| Aggregate::from_records(records.iter().filter(move |r| r.kind == kind));

    let mut order: Vec<&str> = Vec::new();
    let mut partitions: HashMap<&str, Vec<&ScoreRecord>> = HashMap::new();
    for record in records {
        if let Some(category) = record.category.as_deref().filter(|c| !c.is_empty()) {
            partitions
                .entry(category)
                .or_insert_with(|| {
                    order.push(category);
                    Vec::new()
                })
                .push(record);
        }
    }

    let move_types = order
        .into_iter()
        .map(|name| MoveTypeAggregate {
            move_type: name.to_string(),
            aggregate: Aggregate::from_records(partitions.get(name).into_iter().flatten().copied()),
        })
        .collect();

    CategoryAggregates {
        heat: by_kind(ScoreKind::Heat),
        jump: by_kind(ScoreKind::Jump),
        wave: by_kind(ScoreKind::Wave),
        move_types,
    }
}

/// Distinct non-empty categories in order of first appearance
pub fn known_move_types(records: &[ScoreRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in records.iter().filter_map(|r| r.category.as_deref()) {
        if !category.is_empty() && !seen.iter().any(|s| s == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
