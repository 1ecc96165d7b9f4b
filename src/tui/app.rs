use std::time::Instant;
use tracing::debug;

use crate::config::Config;
use crate::dashboard::{DashboardState, FetchKey, Payload, RequestTracker, Ticket};
use crate::filter::{FilterChange, FilterLevel};
use crate::records::Division;
use crate::source::{AthleteListEntry, TransportError};
use crate::tui::theme::ThemeColors;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Help,
}

pub struct App {
    pub state: DashboardState,
    pub tracker: RequestTracker,
    /// Unscoped key of the subject on screen (or being loaded)
    pub subject: FetchKey,
    pub athletes: Vec<AthleteListEntry>,
    pub focus: FilterLevel,
    pub show_ties: bool,
    pub table_state: ratatui::widgets::TableState,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, Instant)>,
    pub last_refresh: Option<Instant>,
    pub last_interaction: Instant,
    pub should_quit: bool,
    pub spinner_frame: usize,
    pub config: Config,
    pub colors: ThemeColors,
    pending: Option<FetchKey>,
    athletes_wanted: bool,
}

impl App {
    /// Create an App in loading state for `subject`; the first fetch is queued
    pub fn new(subject: FetchKey, config: Config) -> Self {
        Self {
            state: DashboardState::new(),
            tracker: RequestTracker::new(),
            pending: Some(subject.clone()),
            subject,
            athletes: Vec::new(),
            focus: FilterLevel::Elimination,
            show_ties: false,
            table_state: ratatui::widgets::TableState::default(),
            input_mode: InputMode::Normal,
            flash_message: None,
            last_refresh: None,
            last_interaction: Instant::now(),
            should_quit: false,
            spinner_frame: 0,
            config,
            colors: ThemeColors::dark(),
            athletes_wanted: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some() || self.tracker.is_loading()
    }

    /// Next fetch to start, issued through the tracker so older ones go stale
    pub fn take_request(&mut self) -> Option<Ticket> {
        self.pending.take().map(|key| self.tracker.issue(key))
    }

    /// Whether the athlete list should be (re)fetched, and for which division
    pub fn take_athletes_request(&mut self) -> Option<Division> {
        std::mem::take(&mut self.athletes_wanted).then_some(self.subject.division)
    }

    fn request(&mut self, key: FetchKey) {
        self.pending = Some(key);
    }

    pub fn refresh(&mut self) {
        self.request(self.subject.clone());
    }

    /// Apply a finished fetch if its ticket is still the latest
    pub fn complete_fetch(&mut self, ticket: Ticket, result: Result<Payload, TransportError>) {
        if !self.tracker.accept(&ticket) {
            return;
        }

        let scoped = !ticket.key.server_filters.is_unconstrained();
        match &result {
            Ok(_) if scoped => {}
            Ok(_) => {
                self.last_refresh = Some(Instant::now());
                self.show_flash(format!("Loaded {}", ticket.key.describe()));
            }
            Err(e) => self.show_flash(format!("Error: {} (r to retry)", e)),
        }

        let succeeded = result.is_ok();
        self.state.apply_fetch(ticket.key, result);
        if succeeded {
            self.request_scoped_baselines();
        }
        self.clamp_selection();
    }

    pub fn complete_athletes(&mut self, division: Division, result: Result<Vec<AthleteListEntry>, TransportError>) {
        if division != self.subject.division {
            debug!(%division, "discarding athlete list for previous division");
            return;
        }
        match result {
            Ok(athletes) => self.athletes = athletes,
            Err(e) => self.show_flash(format!("Error: athlete list unavailable: {}", e)),
        }
    }

    /// Rescope fleet baselines to the current filter when forwarding is on.
    ///
    /// Waits while any fetch is queued or in flight: the state on screen may
    /// belong to a subject that is about to be replaced. `complete_fetch`
    /// calls back in once the latest load lands.
    fn request_scoped_baselines(&mut self) {
        if !self.config.forward_filters || self.is_loading() {
            return;
        }
        if !self.state.key().is_some_and(|k| k.same_subject(&self.subject)) {
            return;
        }
        if let Some(key) = self.state.scoped_baseline_key() {
            self.request(key);
        }
    }

    /// Legal values for `level` under the current tuple, "" (All) first
    pub fn options_for(&self, level: FilterLevel) -> Vec<String> {
        let index = self.state.index();
        let tuple = self.state.tuple();
        let options = match level {
            FilterLevel::Elimination => index.elimination_types(),
            FilterLevel::Round => index.rounds_for(&tuple.elimination),
            FilterLevel::Heat => index.heats_for(&tuple.round),
        };
        std::iter::once(String::new()).chain(options.iter().cloned()).collect()
    }

    /// Step the focused level to its next (or previous) legal option
    pub fn cycle_option(&mut self, forward: bool) {
        let options = self.options_for(self.focus);
        if options.len() <= 1 {
            self.show_flash(format!("No {} options", self.focus.label().to_lowercase()));
            return;
        }
        let current = self.state.tuple().get(self.focus);
        let pos = options.iter().position(|o| o == current).unwrap_or(0);
        let next = if forward {
            (pos + 1) % options.len()
        } else {
            (pos + options.len() - 1) % options.len()
        };
        let value = options[next].clone();
        self.apply_filter(FilterChange::Set(self.focus, value));
    }

    pub fn clear_filters(&mut self) {
        if self.state.tuple().is_unconstrained() {
            return;
        }
        self.apply_filter(FilterChange::Clear);
        self.show_flash("Filters cleared".to_string());
    }

    fn apply_filter(&mut self, change: FilterChange) {
        if self.state.change_filter(change) {
            self.request_scoped_baselines();
            self.clamp_selection();
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        // Three levels: two steps forward is one step back
        self.focus = self.focus.next().next();
    }

    pub fn toggle_ties(&mut self) {
        self.show_ties = !self.show_ties;
    }

    pub fn toggle_division(&mut self) {
        self.subject.division = self.subject.division.toggled();
        self.subject.server_filters = Default::default();
        self.athletes.clear();
        self.athletes_wanted = true;
        self.show_flash(format!("Division: {}", self.subject.division));
        self.refresh();
    }

    /// Switch to the next (or previous) athlete in the list
    pub fn cycle_athlete(&mut self, forward: bool) {
        if self.athletes.is_empty() {
            self.show_flash("No athletes loaded".to_string());
            return;
        }
        let len = self.athletes.len();
        let current = self
            .subject
            .athlete_id
            .as_deref()
            .and_then(|id| self.athletes.iter().position(|a| a.athlete_id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        let athlete_id = self.athletes[next].athlete_id.clone();
        let label = self.athletes[next].label();
        self.show_flash(format!("Athlete: {}", label));
        self.subject = FetchKey::athlete(self.subject.event_id, athlete_id, self.subject.division);
        self.refresh();
    }

    pub fn show_event(&mut self) {
        if self.subject.athlete_id.is_none() {
            return;
        }
        self.subject = FetchKey::event(self.subject.event_id, self.subject.division);
        self.refresh();
    }

    pub fn next_row(&mut self) {
        let len = self.state.summary().series.len();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1) % len);
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.state.summary().series.len();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.table_state.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        let len = self.state.summary().series.len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterTuple;
    use crate::records::{EliminationType, ScoreKind, ScoreRecord};
    use crate::source::{AthleteStats, EventStats};
    use crate::stats::FleetBaselines;

    fn record(elimination: &str, round: &str, heat: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            kind: ScoreKind::Heat,
            athlete_id: "7".to_string(),
            athlete_name: "Jane".to_string(),
            score: Some(score),
            round_name: round.to_string(),
            heat_number: heat.to_string(),
            elimination: Some(EliminationType::from(elimination)),
            category: None,
            counting: true,
        }
    }

    fn records() -> Vec<ScoreRecord> {
        vec![
            record("Single", "Round 1", "3", 7.0),
            record("Single", "Round 2", "7", 8.0),
            record("Double", "Round 1", "12", 6.0),
        ]
    }

    fn loaded_event_app() -> App {
        let mut app = App::new(FetchKey::event(1, Division::Women), Config::default());
        let ticket = app.take_request().unwrap();
        app.complete_fetch(
            ticket,
            Ok(Payload::Event(EventStats {
                records: records(),
                baselines: FleetBaselines::default(),
            })),
        );
        app
    }

    fn athlete_payload() -> Payload {
        Payload::Athlete(AthleteStats {
            athlete_id: "7".to_string(),
            name: "Jane".to_string(),
            records: records(),
            ..AthleteStats::default()
        })
    }

    #[test]
    fn test_initial_fetch_is_queued() {
        let mut app = App::new(FetchKey::event(1, Division::Women), Config::default());
        assert!(app.is_loading());
        assert_eq!(app.take_athletes_request(), Some(Division::Women));
        assert_eq!(app.take_athletes_request(), None);
        let ticket = app.take_request().unwrap();
        assert_eq!(ticket.key, FetchKey::event(1, Division::Women));
        assert!(app.take_request().is_none());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut app = App::new(FetchKey::event(1, Division::Women), Config::default());
        let stale = app.take_request().unwrap();
        app.toggle_division();
        let latest = app.take_request().unwrap();

        app.complete_fetch(stale, Ok(Payload::Event(EventStats::default())));
        assert!(!app.state.is_loaded());

        app.complete_fetch(
            latest,
            Ok(Payload::Event(EventStats {
                records: records(),
                baselines: FleetBaselines::default(),
            })),
        );
        assert_eq!(app.state.key().map(|k| k.division), Some(Division::Men));
        assert_eq!(app.state.records().len(), 3);
    }

    #[test]
    fn test_cycle_options_follow_cascade() {
        let mut app = loaded_event_app();
        assert_eq!(app.options_for(FilterLevel::Elimination), vec!["", "Single", "Double"]);

        app.cycle_option(true);
        assert_eq!(app.state.tuple().elimination, "Single");

        app.focus_next();
        assert_eq!(app.options_for(FilterLevel::Round), vec!["", "Round 1", "Round 2"]);
        app.cycle_option(false);
        assert_eq!(app.state.tuple().round, "Round 2");

        // Switching to Double drops Round 2, which Double never reached
        app.focus_previous();
        app.cycle_option(true);
        assert_eq!(app.state.tuple(), &FilterTuple::new("Double", "", ""));
    }

    #[test]
    fn test_clear_filters() {
        let mut app = loaded_event_app();
        app.cycle_option(true);
        app.clear_filters();
        assert!(app.state.tuple().is_unconstrained());
    }

    #[test]
    fn test_athlete_filter_requests_scoped_baselines() {
        let mut app = App::new(FetchKey::athlete(1, "7", Division::Women), Config::default());
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Ok(athlete_payload()));
        assert!(!app.is_loading());

        app.cycle_option(true);
        let scoped = app.take_request().unwrap();
        assert_eq!(scoped.key.server_filters, FilterTuple::new("Single", "", ""));
    }

    #[test]
    fn test_filter_change_during_subject_switch_keeps_new_subject() {
        let mut app = App::new(FetchKey::athlete(1, "7", Division::Women), Config::default());
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Ok(athlete_payload()));

        app.toggle_division();
        let men = app.take_request().unwrap();
        app.cycle_option(true);
        assert!(app.take_request().is_none());

        app.complete_fetch(men, Ok(athlete_payload()));
        assert_eq!(app.state.key().map(|k| k.division), Some(Division::Men));
        assert_eq!(app.subject.division, Division::Men);
        assert!(app.state.tuple().is_unconstrained());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_filter_change_during_refresh_rescopes_after_load() {
        let mut app = App::new(FetchKey::athlete(1, "7", Division::Women), Config::default());
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Ok(athlete_payload()));

        app.refresh();
        let refresh = app.take_request().unwrap();
        app.cycle_option(true);
        assert!(app.take_request().is_none());

        app.complete_fetch(refresh, Ok(athlete_payload()));
        let scoped = app.take_request().unwrap();
        assert_eq!(scoped.key.division, Division::Women);
        assert_eq!(scoped.key.server_filters, FilterTuple::new("Single", "", ""));
    }

    #[test]
    fn test_failed_scoped_fetch_is_not_reissued() {
        let mut app = App::new(FetchKey::athlete(1, "7", Division::Women), Config::default());
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Ok(athlete_payload()));

        app.cycle_option(true);
        let scoped = app.take_request().unwrap();
        app.complete_fetch(scoped, Err(TransportError::from_status(503, "/events/1/athletes/7/stats")));
        assert!(app.take_request().is_none());
        assert_eq!(app.state.records().len(), 3);
    }

    #[test]
    fn test_no_scoped_baselines_when_forwarding_disabled() {
        let config = Config {
            forward_filters: false,
            ..Config::default()
        };
        let mut app = App::new(FetchKey::athlete(1, "7", Division::Women), config);
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Ok(athlete_payload()));

        app.cycle_option(true);
        assert!(app.take_request().is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_state_and_flashes() {
        let mut app = loaded_event_app();
        app.refresh();
        let ticket = app.take_request().unwrap();
        app.complete_fetch(ticket, Err(TransportError::from_status(500, "/events/1/stats")));

        assert_eq!(app.state.records().len(), 3);
        let (msg, _) = app.flash_message.as_ref().unwrap();
        assert!(msg.starts_with("Error:"));
    }

    #[test]
    fn test_cycle_athlete() {
        let mut app = loaded_event_app();
        app.complete_athletes(
            Division::Women,
            Ok(vec![
                AthleteListEntry {
                    athlete_id: "7".to_string(),
                    name: "Jane".to_string(),
                    ..AthleteListEntry::default()
                },
                AthleteListEntry {
                    athlete_id: "9".to_string(),
                    name: "Kim".to_string(),
                    ..AthleteListEntry::default()
                },
            ]),
        );

        app.cycle_athlete(false);
        assert_eq!(app.subject.athlete_id.as_deref(), Some("9"));
        app.cycle_athlete(true);
        assert_eq!(app.subject.athlete_id.as_deref(), Some("7"));

        app.show_event();
        assert!(app.subject.athlete_id.is_none());
        assert_eq!(app.take_request().unwrap().key, FetchKey::event(1, Division::Women));
    }

    #[test]
    fn test_athlete_list_for_old_division_is_ignored() {
        let mut app = loaded_event_app();
        app.toggle_division();
        app.complete_athletes(Division::Women, Ok(vec![AthleteListEntry::default()]));
        assert!(app.athletes.is_empty());
    }
}
