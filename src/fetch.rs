use tracing::{debug, warn};

use crate::dashboard::{DashboardState, FetchKey, Payload};
use crate::filter::{FilterLevel, FilterTuple};
use crate::source::{StatsClient, TransportError};

/// Fetch the record set a key describes.
///
/// Called from the one-shot CLI commands and from the TUI event loop for the
/// initial load and every refresh.
pub async fn fetch_payload(client: &StatsClient, key: &FetchKey) -> Result<Payload, TransportError> {
    match &key.athlete_id {
        Some(athlete_id) => {
            let filters = (!key.server_filters.is_unconstrained()).then_some(&key.server_filters);
            client
                .fetch_athlete_records(key.event_id, athlete_id, key.division, filters)
                .await
                .map(Payload::Athlete)
        }
        None => client
            .fetch_event_records(key.event_id, key.division)
            .await
            .map(Payload::Event),
    }
}

/// A loaded dashboard plus what happened to the requested filter
#[derive(Debug)]
pub struct LoadOutcome {
    pub state: DashboardState,
    /// Levels the caller asked for that were cleared as invalid
    pub cleared: Vec<FilterLevel>,
}

/// Load a subject, apply the requested filter and, for athletes, rescope the
/// fleet baselines to that filter when `forward_filters` is set.
///
/// A failed baseline rescope is not fatal: the unscoped baselines stay.
pub async fn load_dashboard(
    client: &StatsClient,
    key: FetchKey,
    requested: &FilterTuple,
    forward_filters: bool,
) -> Result<LoadOutcome, TransportError> {
    let payload = fetch_payload(client, &key).await?;

    let mut state = DashboardState::new();
    state.apply_fetch(key, Ok(payload));
    state.set_filter(requested.clone());

    let cleared = cleared_levels(requested, state.tuple());
    if !cleared.is_empty() {
        debug!(requested = %requested.describe(), applied = %state.tuple().describe(), "filter reconciled");
    }

    if forward_filters {
        if let Some(scoped) = state.scoped_baseline_key() {
            match fetch_payload(client, &scoped).await {
                Ok(payload) => state.apply_fetch(scoped, Ok(payload)),
                Err(e) => warn!("keeping unscoped fleet baselines: {}", e),
            }
        }
    }

    Ok(LoadOutcome { state, cleared })
}

/// Levels that were requested but did not survive reconciliation
pub fn cleared_levels(requested: &FilterTuple, applied: &FilterTuple) -> Vec<FilterLevel> {
    FilterLevel::ALL
        .iter()
        .copied()
        .filter(|&level| !requested.get(level).is_empty() && requested.get(level) != applied.get(level))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_levels() {
        let requested = FilterTuple::new("Double", "Round 2", "");
        let applied = FilterTuple::new("Double", "", "");
        assert_eq!(cleared_levels(&requested, &applied), vec![FilterLevel::Round]);
        assert!(cleared_levels(&FilterTuple::default(), &applied).is_empty());
    }
}
