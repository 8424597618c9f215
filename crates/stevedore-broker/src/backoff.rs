//! Bounded/unbounded backoff retry around [`Driver::connect`], for the
//! legacy "connect once, then consume" mode described in spec.md §4.6.
//! Grounded directly on `original_source/amqp_broker.go`'s
//! `ConnectMaxRetries`: the growth is linear (first failure sets the delay
//! to two seconds, every failure after adds two more), not exponential.

use std::time::Duration;

use tracing::error;

use crate::{driver::Driver, error::BrokerError};

const STEP: Duration = Duration::from_secs(2);

/// `N = u64::MAX - 1`, mirroring the Go source's `math.MaxUint64-1`.
pub const UNBOUNDED_RETRIES: u64 = u64::MAX - 1;

/// Retry `driver.connect()` up to `retries + 1` times with linear backoff
/// between attempts, returning once connected or
/// [`BrokerError::MaxRetriesExceeded`] once the budget is spent.
///
/// # Errors
/// Returns [`BrokerError::MaxRetriesExceeded`] if every attempt fails.
pub async fn connect_bounded(driver: &dyn Driver, retries: u64) -> Result<(), BrokerError> {
    let mut attempts_left = retries.saturating_add(1);
    let mut backoff = Duration::ZERO;

    while attempts_left > 0 {
        attempts_left -= 1;

        if backoff.is_zero() {
            backoff = STEP;
        } else {
            error!(delay = ?backoff, "retrying broker connection");
            tokio::time::sleep(backoff).await;
            backoff += STEP;
        }

        match driver.connect().await {
            Ok(()) => return Ok(()),
            Err(err) => error!(error = %err, "dial failed"),
        }
    }

    Err(BrokerError::MaxRetriesExceeded(retries))
}

/// `connect_bounded` with [`UNBOUNDED_RETRIES`].
///
/// # Errors
/// In practice never returns `Err` — see [`UNBOUNDED_RETRIES`] — but keeps
/// the `Result` signature for symmetry with [`connect_bounded`].
pub async fn connect_unbounded(driver: &dyn Driver) -> Result<(), BrokerError> {
    connect_bounded(driver, UNBOUNDED_RETRIES).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        driver::MessageReceiver,
        topology::{Binding, Exchange, Publishing, Queue},
    };

    struct FlakyDriver {
        failures_before_success: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Driver for FlakyDriver {
        async fn connect(&self) -> Result<(), BrokerError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                Err(BrokerError::NotConnected)
            } else {
                Ok(())
            }
        }
        async fn is_connected(&self) -> bool {
            true
        }
        async fn declare_exchange(&self, _: &Exchange) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn declare_queue(&self, _: &Queue) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn bind(&self, _: &Binding) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn publish(&self, _: &Publishing) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn get_messages(&self, _: &Queue, _: u16) -> Result<MessageReceiver, BrokerError> {
            unimplemented!("not exercised by backoff tests")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_once_under_the_retry_budget() {
        let driver = FlakyDriver {
            failures_before_success: 2,
            attempts: AtomicUsize::new(0),
        };
        connect_bounded(&driver, 5).await.unwrap();
        assert_eq!(driver.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_the_budget_and_reports_max_retries() {
        let driver = FlakyDriver {
            failures_before_success: usize::MAX,
            attempts: AtomicUsize::new(0),
        };
        let err = connect_bounded(&driver, 2).await.unwrap_err();
        assert!(matches!(err, BrokerError::MaxRetriesExceeded(2)));
        assert_eq!(driver.attempts.load(Ordering::SeqCst), 3);
    }
}
