use tracing::{debug, warn};

use super::request::{FetchKey, Payload};
use crate::filter::{self, FilterChange, FilterOptionIndex, FilterTuple};
use crate::records::ScoreRecord;
use crate::source::TransportError;
use crate::stats::{aggregate, known_move_types, project, CategoryAggregates, FleetBaselines, ProjectionMode, Summary};

/// Who the loaded records belong to, for athlete views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AthleteInfo {
    pub athlete_id: String,
    pub name: String,
    pub country_code: Option<String>,
    pub overall_position: Option<u32>,
}

/// Records, option index, filter, aggregates and summary for one subject.
///
/// Each stage is derived only from the one before it and everything
/// downstream of a change is recomputed wholesale, so the summary always
/// matches the records and tuple it was computed from.
#[derive(Debug, Clone)]
pub struct DashboardState {
    key: Option<FetchKey>,
    athlete: Option<AthleteInfo>,
    records: Vec<ScoreRecord>,
    move_types: Vec<String>,
    index: FilterOptionIndex,
    tuple: FilterTuple,
    filtered: Vec<ScoreRecord>,
    aggregates: CategoryAggregates,
    baselines: FleetBaselines,
    summary: Summary,
    error: Option<TransportError>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let aggregates = CategoryAggregates::default();
        Self {
            key: None,
            athlete: None,
            records: Vec::new(),
            move_types: Vec::new(),
            index: FilterOptionIndex::default(),
            tuple: FilterTuple::default(),
            filtered: Vec::new(),
            summary: project(&aggregates, ProjectionMode::Event),
            aggregates,
            baselines: FleetBaselines::default(),
            error: None,
        }
    }

    /// Apply a resolved fetch.
    ///
    /// - A new subject replaces everything and resets the filter.
    /// - The same subject fetched unscoped replaces the records and keeps the
    ///   filter, reconciled against the new options.
    /// - The same subject fetched with server filters only refreshes the
    ///   fleet baselines, since its records may already be narrowed.
    /// - A failure keeps the current state and records the error.
    pub fn apply_fetch(&mut self, key: FetchKey, result: Result<Payload, TransportError>) {
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key.describe(), status = e.status, "fetch failed: {}", e);
                self.error = Some(e);
                return;
            }
        };
        self.error = None;

        let same_subject = self.key.as_ref().is_some_and(|k| k.same_subject(&key));

        if same_subject && !key.server_filters.is_unconstrained() {
            if let Payload::Athlete(stats) = payload {
                debug!(filters = %key.server_filters.describe(), "fleet baselines rescoped");
                self.baselines = stats.baselines;
                self.key = Some(key);
                self.recompute_summary();
            }
            return;
        }

        let (records, baselines, athlete) = match payload {
            Payload::Event(stats) => (stats.records, stats.baselines, None),
            Payload::Athlete(stats) => (
                stats.records,
                stats.baselines,
                Some(AthleteInfo {
                    athlete_id: stats.athlete_id,
                    name: stats.name,
                    country_code: stats.country_code,
                    overall_position: stats.overall_position,
                }),
            ),
        };

        self.records = records;
        self.baselines = baselines;
        self.athlete = athlete;
        self.move_types = known_move_types(&self.records);
        self.index = FilterOptionIndex::build(&self.records);
        self.tuple = if same_subject {
            filter::reconcile(&self.tuple, &self.index)
        } else {
            FilterTuple::default()
        };
        self.key = Some(key);
        self.recompute();
    }

    /// Apply a user filter change. Returns true if the tuple changed.
    pub fn change_filter(&mut self, change: FilterChange) -> bool {
        let next = self.tuple.with_change(change, &self.index);
        self.replace_tuple(next)
    }

    /// Replace the whole tuple, reconciling it against the current options
    pub fn set_filter(&mut self, tuple: FilterTuple) -> bool {
        let next = filter::reconcile(&tuple, &self.index);
        self.replace_tuple(next)
    }

    fn replace_tuple(&mut self, next: FilterTuple) -> bool {
        if next == self.tuple {
            return false;
        }
        self.tuple = next;
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.filtered = filter::apply(&self.records, &self.tuple);
        self.aggregates = aggregate(&self.filtered).with_move_types(self.move_types.iter().map(String::as_str));
        self.recompute_summary();
    }

    fn recompute_summary(&mut self) {
        self.summary = project(&self.aggregates, self.mode()).with_fleet_baselines(&self.baselines);
    }

    pub fn mode(&self) -> ProjectionMode {
        match self.key.as_ref().and_then(|k| k.athlete_id.as_ref()) {
            Some(_) => ProjectionMode::Athlete,
            None => ProjectionMode::Event,
        }
    }

    /// The key to fetch so the fleet baselines match the current filter, if
    /// they do not already
    pub fn scoped_baseline_key(&self) -> Option<FetchKey> {
        let key = self.key.as_ref().filter(|k| k.is_athlete())?;
        if key.server_filters == self.tuple {
            return None;
        }
        Some(key.clone().with_server_filters(self.tuple.clone()))
    }

    pub fn key(&self) -> Option<&FetchKey> {
        self.key.as_ref()
    }

    pub fn athlete(&self) -> Option<&AthleteInfo> {
        self.athlete.as_ref()
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn index(&self) -> &FilterOptionIndex {
        &self.index
    }

    pub fn tuple(&self) -> &FilterTuple {
        &self.tuple
    }

    pub fn filtered(&self) -> &[ScoreRecord] {
        &self.filtered
    }

    pub fn aggregates(&self) -> &CategoryAggregates {
        &self.aggregates
    }

    pub fn baselines(&self) -> &FleetBaselines {
        &self.baselines
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterLevel;
    use crate::records::{Division, EliminationType, ScoreKind};
    use crate::source::{AthleteStats, EventStats};

    fn record(athlete: &str, score: f64, elimination: &str, round: &str, heat: &str) -> ScoreRecord {
        ScoreRecord {
            kind: ScoreKind::Heat,
            athlete_id: athlete.to_string(),
            athlete_name: athlete.to_string(),
            score: Some(score),
            round_name: round.to_string(),
            heat_number: heat.to_string(),
            elimination: Some(EliminationType::from(elimination)),
            category: None,
            counting: true,
        }
    }

    fn event_payload() -> Payload {
        Payload::Event(EventStats {
            records: vec![
                record("A", 7.0, "Single", "Round 1", "3"),
                record("B", 8.0, "Single", "Round 2", "7"),
                record("C", 6.0, "Double", "Round 1", "12"),
            ],
            baselines: FleetBaselines::default(),
        })
    }

    fn athlete_payload(fleet: f64) -> Payload {
        let mut baselines = FleetBaselines::new();
        baselines.insert("Backloop", fleet);
        Payload::Athlete(AthleteStats {
            athlete_id: "A".to_string(),
            name: "A".to_string(),
            records: vec![
                record("A", 7.0, "Single", "Round 1", "3"),
                record("A", 5.0, "Double", "Round 2", "9"),
            ],
            baselines,
            ..AthleteStats::default()
        })
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = DashboardState::new();
        assert!(!state.is_loaded());
        assert!(state.summary().is_empty());
    }

    #[test]
    fn test_filter_recomputes_summary() {
        let mut state = DashboardState::new();
        state.apply_fetch(FetchKey::event(1, Division::Women), Ok(event_payload()));

        let best = |s: &DashboardState| s.aggregates().heat.best_score();
        assert_eq!(best(&state), Some(8.0));

        assert!(state.change_filter(FilterChange::Set(FilterLevel::Round, "Round 1".to_string())));
        assert_eq!(state.filtered().len(), 2);
        assert_eq!(best(&state), Some(7.0));

        assert!(!state.change_filter(FilterChange::Set(FilterLevel::Round, "Round 1".to_string())));
    }

    #[test]
    fn test_new_subject_resets_filter() {
        let mut state = DashboardState::new();
        state.apply_fetch(FetchKey::event(1, Division::Women), Ok(event_payload()));
        state.set_filter(FilterTuple::new("Single", "", ""));
        assert!(!state.tuple().is_unconstrained());

        state.apply_fetch(FetchKey::event(1, Division::Men), Ok(event_payload()));
        assert!(state.tuple().is_unconstrained());
        assert_eq!(state.filtered().len(), 3);
    }

    #[test]
    fn test_refresh_keeps_filter() {
        let mut state = DashboardState::new();
        let key = FetchKey::event(1, Division::Women);
        state.apply_fetch(key.clone(), Ok(event_payload()));
        state.set_filter(FilterTuple::new("Single", "Round 2", ""));

        state.apply_fetch(key, Ok(event_payload()));
        assert_eq!(state.tuple(), &FilterTuple::new("Single", "Round 2", ""));
        assert_eq!(state.filtered().len(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_state() {
        let mut state = DashboardState::new();
        let key = FetchKey::event(1, Division::Women);
        state.apply_fetch(key.clone(), Ok(event_payload()));

        state.apply_fetch(key, Err(TransportError::from_status(503, "/events/1/stats")));
        assert_eq!(state.error().map(|e| e.status), Some(503));
        assert_eq!(state.records().len(), 3);
        assert_eq!(state.aggregates().heat.best_score(), Some(8.0));
    }

    #[test]
    fn test_scoped_refetch_updates_baselines_only() {
        let mut state = DashboardState::new();
        let key = FetchKey::athlete(1, "A", Division::Women);
        state.apply_fetch(key.clone(), Ok(athlete_payload(4.0)));
        assert_eq!(state.mode(), ProjectionMode::Athlete);

        state.set_filter(FilterTuple::new("Single", "", ""));
        let scoped = state.scoped_baseline_key().unwrap();
        assert_eq!(scoped.server_filters, FilterTuple::new("Single", "", ""));

        // Server-narrowed records must not shrink the option index
        let narrowed = match athlete_payload(6.5) {
            Payload::Athlete(mut stats) => {
                stats.records.truncate(1);
                Payload::Athlete(stats)
            }
            other => other,
        };
        state.apply_fetch(scoped, Ok(narrowed));

        assert_eq!(state.records().len(), 2);
        assert_eq!(state.index().elimination_types().len(), 2);
        assert_eq!(state.baselines().get("Backloop"), Some(6.5));
        assert_eq!(state.tuple(), &FilterTuple::new("Single", "", ""));
        assert!(state.scoped_baseline_key().is_none());
    }

    #[test]
    fn test_event_mode_has_no_scoped_key() {
        let mut state = DashboardState::new();
        state.apply_fetch(FetchKey::event(1, Division::Women), Ok(event_payload()));
        state.set_filter(FilterTuple::new("Single", "", ""));
        assert!(state.scoped_baseline_key().is_none());
    }
}
