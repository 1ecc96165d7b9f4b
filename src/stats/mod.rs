pub mod engine;
pub mod fleet;
pub mod summary;

pub use engine::{aggregate, known_move_types, Aggregate, BestScore, CategoryAggregates, MoveTypeAggregate};
pub use fleet::FleetBaselines;
pub use summary::{
    project, CategoryBest, CategorySeries, HeatBest, Holder, JumpBest, ProjectionMode, Summary,
    SummaryCard, TiedJump, WaveBest,
};
