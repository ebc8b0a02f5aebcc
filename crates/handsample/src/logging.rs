//! Logging setup for the `handsample` binary and its tests.
//!
//! Output goes through `tracing-subscriber`'s fmt layer. The filter comes from
//! `RUST_LOG` when it is set and parses, otherwise from the `-v`/`-q` flags.
//! HTTP request spans from `tower_http` share the crate's level.

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// How much the service logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Startup, accepted submissions and warnings.
    #[default]
    Normal,
    /// Adds rejected uploads, session activity and request traces.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Resolve the command-line flags. `quiet` wins over any `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The level this verbosity admits.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` does not apply.
    #[must_use]
    pub fn default_directive(self) -> String {
        let level = self.level();
        format!("handsample={level},tower_http={level}")
    }
}

/// Build the filter for `verbosity`, preferring a usable `rust_log` value.
#[must_use]
pub fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.default_directive()))
}

/// Install the global subscriber.
///
/// Later calls are no-ops, so tests and the binary can both call this.
///
/// ```no_run
/// use handsample::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Quiet subscriber for unit tests; shows warnings and errors only.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
