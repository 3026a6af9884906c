//! Logging setup shared by the Vetbook binaries.
//!
//! Logs go to stderr so that command output on stdout stays clean.

use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events are shown at the configured level.
const VETBOOK_TARGETS: [&str; 4] = ["vetbook_common", "vetbook_api", "vetbook_reconciler", "vetbook_cli"];

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` takes precedence when set. Calling this twice is harmless.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Parses a configured level name, falling back to INFO.
pub fn parse_level(name: &str) -> Level {
    name.trim().parse::<Level>().unwrap_or(Level::INFO)
}

fn default_filter(level: Level) -> EnvFilter {
    let directives = VETBOOK_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(format!("warn,{}", directives))
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
