//! The worker's configuration surface: broker URI(s), work queue, prefetch
//! (concurrency), and log level.
//!
//! Populated from CLI flags (see the `stevedore` binary's `cli` module) and
//! handed to the broker consumer/worker pool as a single value. A
//! `;`-separated broker URI list means several equivalent brokers for
//! failover (spec.md §6); this type does not itself validate reachability,
//! only shape.

use crate::{error::ConfigError, logging::LogLevel};

fn default_concurrency() -> usize {
    num_cpus::get()
}

/// Parsed, validated worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The URI scheme shared by every broker in `broker_uris` (e.g. `"amqp"`).
    pub scheme: String,
    /// One or more equivalent broker URIs, in failover order.
    pub broker_uris: Vec<String>,
    /// Name of the work queue to consume from.
    pub queue: String,
    /// Prefetch / concurrency bound: the number of unacked deliveries the
    /// broker is allowed to hand this worker at once.
    pub concurrency: usize,
    /// Log verbosity.
    pub log_level: LogLevel,
}

impl WorkerConfig {
    /// Build a [`WorkerConfig`] from raw CLI values.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `broker` has no scheme, an empty URI list,
    /// or a scheme other than `amqp` (the only scheme this worker accepts
    /// at start-up, per spec.md §6).
    pub fn new(
        broker: &str,
        queue: impl Into<String>,
        concurrency: Option<usize>,
        log_level: LogLevel,
    ) -> Result<Self, ConfigError> {
        let broker_uris: Vec<String> = broker
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        let first = broker_uris.first().ok_or(ConfigError::EmptyUriList)?;
        let scheme = first
            .split_once("://")
            .map(|(scheme, _)| scheme.to_owned())
            .ok_or_else(|| ConfigError::MissingScheme(first.clone()))?;

        if scheme != "amqp" {
            return Err(ConfigError::UnsupportedScheme(scheme));
        }

        Ok(Self {
            scheme,
            broker_uris,
            queue: queue.into(),
            concurrency: concurrency.unwrap_or_else(default_concurrency),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_failover_uris() {
        let cfg = WorkerConfig::new(
            "amqp://a:5672/;amqp://b:5672/",
            "celery",
            Some(4),
            LogLevel::Info,
        )
        .unwrap();
        assert_eq!(cfg.broker_uris.len(), 2);
        assert_eq!(cfg.scheme, "amqp");
        assert_eq!(cfg.concurrency, 4);
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = WorkerConfig::new("redis://localhost/", "celery", None, LogLevel::Info)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "redis"));
    }

    #[test]
    fn rejects_missing_scheme() {
        let err = WorkerConfig::new("localhost", "celery", None, LogLevel::Info).unwrap_err();
        assert!(matches!(err, ConfigError::MissingScheme(_)));
    }

    #[test]
    fn default_concurrency_is_cpu_count() {
        let cfg = WorkerConfig::new("amqp://localhost/", "celery", None, LogLevel::Info).unwrap();
        assert_eq!(cfg.concurrency, num_cpus::get());
    }
}
