pub mod formatter;

pub use formatter::{
    format_events, format_events_tsv, format_head_to_head, format_head_to_head_tsv, format_heat_scores,
    format_move_types, format_options_tree, format_score, format_summary,
    format_tsv, should_use_colors, truncate_label, NO_DATA,
};
