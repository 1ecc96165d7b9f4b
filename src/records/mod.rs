pub mod rounds;
pub mod types;

pub use rounds::{round_order, sort_by_round_progression};
pub use types::{is_valid_score, Division, EliminationType, ScoreKind, ScoreRecord};
