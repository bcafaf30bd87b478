//! Logging initialisation via tracing-subscriber.
//!
//! The configured level is parsed once by [`parse_level`] while config is
//! loaded, then handed to [`init`]. Library code only emits `tracing` events;
//! the binary owns the subscriber.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Build the filter: `RUST_LOG` directives when set, otherwise `level` for
/// every target. Unparseable `RUST_LOG` directives are skipped.
fn filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber, writing compact lines to stderr so command
/// output on stdout stays clean.
pub fn init(level: LevelFilter) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Parse a configured level (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_any_case() {
        assert_eq!(parse_level("warn").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level(" DEBUG ").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn unknown_or_empty_level_errors() {
        assert!(matches!(parse_level("verbose"), Err(AppError::Logger(_))));
        assert!(parse_level("  ").is_err());
    }

    #[test]
    fn init_succeeds_or_already_init() {
        // Another test in this process may have installed a subscriber first.
        match init(LevelFilter::WARN) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
