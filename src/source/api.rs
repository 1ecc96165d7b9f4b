use tracing::debug;

use super::client::StatsClient;
use super::error::TransportError;
use super::types::{
    AthleteListEntry, AthleteListResponse, AthleteStatsResponse, EventListResponse, EventStatsResponse, EventSummary,
    HeadToHead, MoveTypeStat,
};
use crate::filter::FilterTuple;
use crate::records::{Division, ScoreRecord};
use crate::stats::FleetBaselines;

/// Event-wide record set
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    pub records: Vec<ScoreRecord>,
    pub baselines: FleetBaselines,
}

/// One athlete's record set plus the server-computed context around it
#[derive(Debug, Clone, Default)]
pub struct AthleteStats {
    pub athlete_id: String,
    pub name: String,
    pub country_code: Option<String>,
    pub overall_position: Option<u32>,
    pub records: Vec<ScoreRecord>,
    pub baselines: FleetBaselines,
}

fn baselines(stats: &[MoveTypeStat]) -> FleetBaselines {
    stats
        .iter()
        .filter_map(|s| s.fleet_average.map(|avg| (s.move_type.clone(), avg)))
        .collect()
}

impl StatsClient {
    /// `GET /events/{event_id}/stats?sex=..`
    pub async fn fetch_event_records(
        &self,
        event_id: u64,
        division: Division,
    ) -> Result<EventStats, TransportError> {
        let id = event_id.to_string();
        let response: EventStatsResponse = self
            .get_json(&["events", &id, "stats"], &[("sex", division.as_param())])
            .await?;

        let baselines = baselines(&response.move_type_stats);
        let records = response.into_records();
        debug!(event_id, %division, records = records.len(), "event records fetched");

        Ok(EventStats { records, baselines })
    }

    /// `GET /events/{event_id}/athletes/{athlete_id}/stats?sex=..`
    ///
    /// `server_filters` scopes the server-computed baselines; the records are
    /// always filtered locally as well.
    pub async fn fetch_athlete_records(
        &self,
        event_id: u64,
        athlete_id: &str,
        division: Division,
        server_filters: Option<&FilterTuple>,
    ) -> Result<AthleteStats, TransportError> {
        let id = event_id.to_string();
        let mut query = vec![("sex", division.as_param())];
        if let Some(filters) = server_filters {
            query.extend(filters.query_pairs());
        }

        let response: AthleteStatsResponse = self
            .get_json(&["events", &id, "athletes", athlete_id, "stats"], &query)
            .await?;

        let records = response.records(athlete_id);
        debug!(event_id, athlete_id, %division, records = records.len(), "athlete records fetched");

        let profile = response.profile.unwrap_or_default();
        Ok(AthleteStats {
            athlete_id: athlete_id.to_string(),
            name: profile.name,
            country_code: profile.country_code,
            overall_position: response.summary_stats.and_then(|s| s.overall_position),
            records,
            baselines: baselines(&response.move_type_scores),
        })
    }

    /// `GET /events/{event_id}/athletes?sex=..`
    pub async fn fetch_event_athletes(
        &self,
        event_id: u64,
        division: Division,
    ) -> Result<Vec<AthleteListEntry>, TransportError> {
        let id = event_id.to_string();
        let response: AthleteListResponse = self
            .get_json(&["events", &id, "athletes"], &[("sex", division.as_param())])
            .await?;
        Ok(response.athletes)
    }

    /// `GET /events?page=..&page_size=..&wave_only=..`
    pub async fn fetch_events(
        &self,
        page: u32,
        page_size: u32,
        wave_only: bool,
    ) -> Result<Vec<EventSummary>, TransportError> {
        let page = page.to_string();
        let page_size = page_size.to_string();
        let wave_only = wave_only.to_string();
        let response: EventListResponse = self
            .get_json(
                &["events"],
                &[
                    ("page", page.as_str()),
                    ("page_size", page_size.as_str()),
                    ("wave_only", wave_only.as_str()),
                ],
            )
            .await?;
        debug!(events = response.events.len(), "event list fetched");
        Ok(response.events)
    }

    /// `GET /events/{event_id}/head-to-head?athlete1_id=..&athlete2_id=..&division=..`
    pub async fn fetch_head_to_head(
        &self,
        event_id: u64,
        athlete1_id: &str,
        athlete2_id: &str,
        division: Division,
    ) -> Result<HeadToHead, TransportError> {
        let id = event_id.to_string();
        self.get_json(
            &["events", &id, "head-to-head"],
            &[
                ("athlete1_id", athlete1_id),
                ("athlete2_id", athlete2_id),
                ("division", division.as_param()),
            ],
        )
        .await
    }
}
