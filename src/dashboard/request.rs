use tracing::debug;

use crate::filter::FilterTuple;
use crate::records::Division;
use crate::source::{AthleteStats, EventStats};

/// Full identity of one fetch. Two keys with the same subject but different
/// `server_filters` describe the same record set under a different fleet scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub event_id: u64,
    pub athlete_id: Option<String>,
    pub division: Division,
    pub server_filters: FilterTuple,
}

impl FetchKey {
    pub fn event(event_id: u64, division: Division) -> Self {
        Self {
            event_id,
            athlete_id: None,
            division,
            server_filters: FilterTuple::default(),
        }
    }

    pub fn athlete(event_id: u64, athlete_id: impl Into<String>, division: Division) -> Self {
        Self {
            event_id,
            athlete_id: Some(athlete_id.into()),
            division,
            server_filters: FilterTuple::default(),
        }
    }

    pub fn with_server_filters(mut self, filters: FilterTuple) -> Self {
        // Only the athlete endpoint accepts filters
        if self.athlete_id.is_some() {
            self.server_filters = filters;
        }
        self
    }

    pub fn same_subject(&self, other: &FetchKey) -> bool {
        self.event_id == other.event_id
            && self.athlete_id == other.athlete_id
            && self.division == other.division
    }

    pub fn is_athlete(&self) -> bool {
        self.athlete_id.is_some()
    }

    /// "Event 42 (Women)" or "Event 42 / athlete 17 (Men)"
    pub fn describe(&self) -> String {
        match &self.athlete_id {
            Some(athlete) => format!("Event {} / athlete {} ({})", self.event_id, athlete, self.division),
            None => format!("Event {} ({})", self.event_id, self.division),
        }
    }
}

/// What a fetch produced
#[derive(Debug, Clone)]
pub enum Payload {
    Event(EventStats),
    Athlete(AthleteStats),
}

/// Proof of issue for one in-flight fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub key: FetchKey,
}

/// Latest-request-wins bookkeeping.
///
/// Every issued fetch supersedes all earlier ones; a result is applied only
/// if its ticket is still the latest when it resolves.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    in_flight: Option<FetchKey>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, key: FetchKey) -> Ticket {
        self.generation += 1;
        self.in_flight = Some(key.clone());
        Ticket {
            generation: self.generation,
            key,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && self.in_flight.as_ref() == Some(&ticket.key)
    }

    /// Consume a resolved ticket. Returns false (and logs) when it is stale.
    pub fn accept(&mut self, ticket: &Ticket) -> bool {
        if self.is_current(ticket) {
            self.in_flight = None;
            true
        } else {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                key = %ticket.key.describe(),
                "discarding stale response"
            );
            false
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Invalidate whatever is in flight
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }
}
