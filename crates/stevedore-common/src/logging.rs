//! Tracing setup for the worker, driven by the `-l` CLI flag.

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Log level names accepted by `-l`.
///
/// Celery/the original source spells two of these non-standardly
/// (`warning` rather than `warn`, `critical` rather than `error`); we keep
/// both spellings so the CLI surface matches spec.md §6 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Trace,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    #[must_use]
    pub const fn as_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// Install a global `tracing` subscriber at the given level.
///
/// Only ever called once, from `main`; tests that want log output install
/// their own subscriber via `tracing_subscriber::fmt().with_test_writer()`.
pub fn init(level: LogLevel) {
    let filter = level.as_filter();

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(filter)
                .with_filter(FilterFn::new(|metadata| {
                    cfg!(debug_assertions) || metadata.target().starts_with("stevedore")
                })),
        )
        .init();
}

/// Emit an event under the `stevedore` target at a named span, the way
/// `empath_common::log!` scopes every message under a named span.
#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:tt)*) => {{
        let span = $crate::tracing::span!(target: "stevedore", $level, $span);
        let _enter = span.enter();
        $crate::tracing::event!(target: "stevedore", $level, $($msg)*)
    }};
}

/// Log an internal worker lifecycle event (startup, shutdown).
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:tt)*) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($msg)*)
    };
    ($($msg:tt)*) => {
        $crate::internal!(level = TRACE, $($msg)*)
    };
}

/// Log a broker-facing event (connect, declare, publish, consume).
#[macro_export]
macro_rules! broker {
    (level = $level:ident, $($msg:tt)*) => {
        $crate::log!($crate::tracing::Level::$level, "broker", $($msg)*)
    };
    ($($msg:tt)*) => {
        $crate::broker!(level = TRACE, $($msg)*)
    };
}

/// Log a dispatch-loop event (decode, handler invocation, ack/reject/requeue).
#[macro_export]
macro_rules! dispatch {
    (level = $level:ident, $($msg:tt)*) => {
        $crate::log!($crate::tracing::Level::$level, "dispatch", $($msg)*)
    };
    ($($msg:tt)*) => {
        $crate::dispatch!(level = TRACE, $($msg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping_matches_spec() {
        assert_eq!(LogLevel::Debug.as_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::Warning.as_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.as_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Error.as_filter(), LevelFilter::ERROR);
    }
}
