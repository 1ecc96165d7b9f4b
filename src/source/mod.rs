pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{AthleteStats, EventStats};
pub use client::StatsClient;
pub use error::{status_message, TransportError};
pub use types::{AthleteListEntry, ComparisonStat, EventSummary, HeadToHead, HeadToHeadAthlete, Side};
