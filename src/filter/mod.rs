pub mod engine;
pub mod options;
pub mod tuple;

pub use engine::{apply, matches, reconcile};
pub use options::{compare_labels, FilterOptionIndex};
pub use tuple::{FilterChange, FilterLevel, FilterTuple};
