pub mod request;
pub mod state;

pub use request::{FetchKey, Payload, RequestTracker, Ticket};
pub use state::{AthleteInfo, DashboardState};
