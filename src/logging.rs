use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::stderr_buffer::BufferedStderr;

/// Initialize logging to stderr (through the TUI-aware buffer).
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or this
/// crate's debug output with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "heatsheet=debug,warn" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Ignore a second initialisation (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .without_time()
                .with_target(verbose)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(|| BufferedStderr),
        )
        .try_init();
}
