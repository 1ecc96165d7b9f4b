pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod filter;
pub mod logging;
pub mod output;
pub mod records;
pub mod source;
pub mod stats;
pub mod stderr_buffer;
pub mod tui;
