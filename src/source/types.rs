use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::records::{EliminationType, ScoreKind, ScoreRecord};

// Wire types for the stats API. Every list and most fields are optional
// upstream, so everything defaults rather than failing the whole response.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventStatsResponse {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub top_heat_scores: Vec<TopScoreRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub top_jump_scores: Vec<TopScoreRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub top_wave_scores: Vec<TopScoreRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub move_type_stats: Vec<MoveTypeStat>,
}

/// Row of an event top-scores list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopScoreRow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub athlete_id: String,
    #[serde(default)]
    pub athlete_name: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub round_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub heat_number: String,
    #[serde(default)]
    pub elimination_type: Option<String>,
    #[serde(default)]
    pub move_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveTypeStat {
    #[serde(default)]
    pub move_type: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub best_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub average_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub fleet_average: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteStatsResponse {
    #[serde(default)]
    pub profile: Option<AthleteProfile>,
    #[serde(default)]
    pub summary_stats: Option<AthleteSummaryStats>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub move_type_scores: Vec<MoveTypeStat>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub heat_scores: Vec<AthleteScoreRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub jump_scores: Vec<AthleteScoreRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub wave_scores: Vec<AthleteScoreRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sail_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteSummaryStats {
    #[serde(default, deserialize_with = "lenient_position")]
    pub overall_position: Option<u32>,
}

/// Row of an athlete's heat, jump or wave list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteScoreRow {
    #[serde(default)]
    pub round_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub heat_number: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub elimination_type: Option<String>,
    #[serde(default, rename = "move")]
    pub move_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub counting: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteListResponse {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub athletes: Vec<AthleteListEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AthleteListEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub athlete_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub overall_position: Option<u32>,
}

impl AthleteListEntry {
    /// "3. Jane Doe (ESP)"
    pub fn label(&self) -> String {
        let mut label = match self.overall_position {
            Some(position) => format!("{}. {}", position, self.name),
            None => self.name.clone(),
        };
        if let Some(country) = self.country_code.as_deref().filter(|c| !c.is_empty()) {
            label.push_str(&format!(" ({})", country));
        }
        label
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventListResponse {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub events: Vec<EventSummary>,
}

/// One row of the event calendar
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EventSummary {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub event_name: String,
    /// Display date range as published, e.g. "Feb 1 - 9, 2025"
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub stars: Option<u32>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub total_men: Option<u32>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub total_women: Option<u32>,
}

impl EventSummary {
    pub fn date(&self) -> &str {
        self.event_date
            .as_deref()
            .or(self.start_date.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadToHead {
    #[serde(default, deserialize_with = "string_or_number")]
    pub event_id: String,
    #[serde(default)]
    pub athlete1: HeadToHeadAthlete,
    #[serde(default)]
    pub athlete2: HeadToHeadAthlete,
    #[serde(default)]
    pub comparison: HeadToHeadComparison,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadToHeadAthlete {
    #[serde(default, deserialize_with = "string_or_number")]
    pub athlete_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub place: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadToHeadComparison {
    #[serde(default)]
    pub heat_wins: ComparisonStat,
    #[serde(default)]
    pub heat_scores_best: ComparisonStat,
    #[serde(default)]
    pub heat_scores_avg: ComparisonStat,
    #[serde(default)]
    pub jumps_best: ComparisonStat,
    #[serde(default)]
    pub jumps_avg_counting: ComparisonStat,
    #[serde(default)]
    pub waves_best: ComparisonStat,
    #[serde(default)]
    pub waves_avg_counting: ComparisonStat,
}

impl HeadToHeadComparison {
    /// Rows in display order. Heat wins are a count, the rest are scores.
    pub fn rows(&self) -> [(&'static str, &ComparisonStat); 7] {
        [
            ("Heat wins", &self.heat_wins),
            ("Best heat", &self.heat_scores_best),
            ("Average heat", &self.heat_scores_avg),
            ("Best jump", &self.jumps_best),
            ("Average jump", &self.jumps_avg_counting),
            ("Best wave", &self.waves_best),
            ("Average wave", &self.waves_avg_counting),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Athlete1,
    Athlete2,
    Tie,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ComparisonStat {
    #[serde(default, deserialize_with = "lenient_score")]
    pub athlete1_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub athlete2_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_side")]
    pub winner: Option<Side>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub difference: Option<f64>,
}

impl ComparisonStat {
    /// The server's verdict, or one derived from the values when it sent none
    pub fn leader(&self) -> Option<Side> {
        if self.winner.is_some() {
            return self.winner;
        }
        let (a, b) = (self.athlete1_value?, self.athlete2_value?);
        Some(if a > b {
            Side::Athlete1
        } else if b > a {
            Side::Athlete2
        } else {
            Side::Tie
        })
    }

    pub fn margin(&self) -> Option<f64> {
        self.difference.or_else(|| {
            let (a, b) = (self.athlete1_value?, self.athlete2_value?);
            Some((a - b).abs())
        })
    }
}

/// Text for ids and heat numbers that arrive as strings or numbers.
/// Anything else (null, bool, object) becomes empty.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Accepts numbers, numeric strings and null. Anything unparseable is None.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_position<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

fn lenient_side<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "athlete1" => Some(Side::Athlete1),
            "athlete2" => Some(Side::Athlete2),
            "tie" => Some(Side::Tie),
            _ => None,
        },
        _ => None,
    })
}

/// A list where rows that fail to decode are dropped instead of failing the
/// whole response. A missing or non-list value is an empty list.
fn lenient_rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let rows = match Value::deserialize(deserializer)? {
        Value::Array(rows) => rows,
        _ => return Ok(Vec::new()),
    };
    let total = rows.len();
    let kept: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if kept.len() < total {
        debug!(dropped = total - kept.len(), "skipped malformed rows");
    }
    Ok(kept)
}

fn elimination(raw: Option<&str>) -> Option<EliminationType> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EliminationType::from)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl EventStatsResponse {
    /// Flatten the three top-score lists into one record set.
    ///
    /// Top-score lists only hold counting scores.
    pub fn into_records(self) -> Vec<ScoreRecord> {
        let lists = [
            (ScoreKind::Heat, self.top_heat_scores),
            (ScoreKind::Jump, self.top_jump_scores),
            (ScoreKind::Wave, self.top_wave_scores),
        ];

        lists
            .into_iter()
            .flat_map(|(kind, rows)| rows.into_iter().map(move |row| row.into_record(kind)))
            .collect()
    }
}

impl TopScoreRow {
    fn into_record(self, kind: ScoreKind) -> ScoreRecord {
        ScoreRecord {
            kind,
            athlete_id: self.athlete_id,
            athlete_name: self.athlete_name,
            score: self.score,
            round_name: self.round_name.unwrap_or_default(),
            heat_number: self.heat_number,
            elimination: elimination(self.elimination_type.as_deref()),
            category: match kind {
                ScoreKind::Jump => non_empty(self.move_type),
                _ => None,
            },
            counting: true,
        }
    }
}

impl AthleteStatsResponse {
    pub fn athlete_name(&self) -> &str {
        self.profile.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Flatten heat, jump and wave rows into records attributed to `athlete_id`
    pub fn records(&self, athlete_id: &str) -> Vec<ScoreRecord> {
        let name = self.athlete_name().to_string();
        let lists = [
            (ScoreKind::Heat, &self.heat_scores),
            (ScoreKind::Jump, &self.jump_scores),
            (ScoreKind::Wave, &self.wave_scores),
        ];

        lists
            .into_iter()
            .flat_map(|(kind, rows)| {
                let name = name.clone();
                rows.iter().map(move |row| ScoreRecord {
                    kind,
                    athlete_id: athlete_id.to_string(),
                    athlete_name: name.clone(),
                    score: row.score,
                    round_name: row.round_name.clone(),
                    heat_number: row.heat_number.clone(),
                    elimination: elimination(row.elimination_type.as_deref()),
                    category: match kind {
                        ScoreKind::Jump => non_empty(row.move_name.clone()),
                        _ => None,
                    },
                    counting: row.counting.unwrap_or(true),
                })
            })
            .collect()
    }
}
