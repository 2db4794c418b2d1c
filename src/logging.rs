//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout carries command output only.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Filter directive for the given verbosity flags.
///
/// `level_override` wins over the flags; `-q` wins over `-v`.
#[must_use]
pub fn level_directive(verbose: u8, quiet: bool, level_override: Option<&str>) -> String {
    if let Some(level) = level_override {
        return level.to_string();
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    format!("issue_desk={level},{level}")
}

/// Install the global subscriber for the binary.
///
/// `RUST_LOG` takes precedence over every flag.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    level_override: Option<&str>,
) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbose, quiet, level_override)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
}

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("issue_desk=debug,info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_directive(0, false, None), "issue_desk=warn,warn");
        assert_eq!(level_directive(1, false, None), "issue_desk=debug,debug");
        assert_eq!(level_directive(3, false, None), "issue_desk=trace,trace");
        assert_eq!(level_directive(2, true, None), "issue_desk=error,error");
        assert_eq!(level_directive(2, true, Some("info")), "info");
    }

    #[test]
    fn test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!("still logging");
    }
}
