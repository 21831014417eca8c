//! Tracing subscriber setup.
//!
//! Logs always go to stderr so stdout stays parseable with `--json`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Filter directive for the given CLI verbosity.
///
/// `-q` wins over `-v`. Without either, `default_level` applies.
#[must_use]
pub fn level_directive(verbose: u8, quiet: bool, default_level: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => default_level.to_string(),
        1 => "errorly=debug,info".to_string(),
        _ => "errorly=trace,debug".to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the CLI flags.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the
/// filter directive is invalid.
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    json: bool,
    default_level: &str,
) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level_directive(verbose, quiet, default_level))?,
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

/// Logging for tests: captured by the test harness, safe to call repeatedly.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .with_test_writer()
        .try_init();
}
