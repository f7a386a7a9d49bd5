//! Bounded confirmation polling.
//!
//! Submitting a transaction through a relay returns a signature long before
//! the chain reaches a verdict on it. [`ConfirmationPoller`] closes that gap
//! with a fixed-interval poll loop over a [`StatusSource`], classifying the
//! submission into exactly one terminal [`ConfirmationOutcome`] per call.
//!
//! The loop is a plain timed task: it holds no subscription state and a
//! caller can race it against its own timeout or cancellation without
//! affecting the underlying submission.

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::wallet::WalletError;

/// A status observed for a submitted transaction, prior to classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The transaction is known to the network but below the confirmed
    /// commitment level.
    Pending,
    /// Confirmed by a supermajority of the cluster.
    Confirmed,
    /// Finalized; rollback is no longer possible.
    Finalized,
    /// Executed and failed, with the chain-reported reason.
    Failed(String),
}

/// Terminal classification of a submitted transaction.
///
/// An observed on-chain failure is a normal return value, not an error:
/// the four terminal states form a closed set the caller matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Confirmed by a supermajority of the cluster.
    Confirmed,
    /// Finalized; rollback is no longer possible.
    Finalized,
    /// Executed on chain and failed.
    Failed(String),
    /// No terminal status observed within the poll budget.
    TimedOut,
}

impl ConfirmationOutcome {
    /// Whether the transaction landed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Finalized)
    }

    /// Convert into a `Result`, for callers that treat failure and timeout
    /// as errors carrying the transaction id.
    pub fn into_result(self, signature: &str, elapsed_ms: u64) -> Result<Self, WalletError> {
        match self {
            Self::Failed(reason) => Err(WalletError::TransactionFailed {
                signature: signature.to_string(),
                reason,
            }),
            Self::TimedOut => Err(WalletError::ConfirmationTimedOut {
                signature: signature.to_string(),
                elapsed_ms,
            }),
            outcome => Ok(outcome),
        }
    }
}

/// Source of transaction statuses, queried once per poll tick.
///
/// `None` means the transaction is not yet known to the source — expected
/// immediately after submission while the node indexes the signature.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Query the current status of the transaction with the given id.
    async fn status(&self, id: &str) -> Result<Option<TxStatus>, WalletError>;
}

/// Fixed-interval poll loop with a cumulative time budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationPoller {
    config: PollConfig,
}

impl ConfirmationPoller {
    /// Create a poller with the given cadence and budget.
    #[must_use]
    pub const fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll until the transaction reaches a terminal state or the budget
    /// runs out. Returns exactly one terminal outcome.
    ///
    /// Transport errors from the status source are logged and absorbed;
    /// polling continues at the normal cadence. A single observed on-chain
    /// failure ends polling immediately.
    pub async fn wait(&self, source: &dyn StatusSource, id: &str) -> ConfirmationOutcome {
        let started = Instant::now();
        loop {
            match source.status(id).await {
                Ok(Some(TxStatus::Finalized)) => {
                    info!(id = %id, elapsed_ms = started.elapsed().as_millis() as u64, "transaction finalized");
                    return ConfirmationOutcome::Finalized;
                }
                Ok(Some(TxStatus::Confirmed)) => {
                    info!(id = %id, elapsed_ms = started.elapsed().as_millis() as u64, "transaction confirmed");
                    return ConfirmationOutcome::Confirmed;
                }
                Ok(Some(TxStatus::Failed(reason))) => {
                    warn!(id = %id, reason = %reason, "transaction failed on chain");
                    return ConfirmationOutcome::Failed(reason);
                }
                Ok(Some(TxStatus::Pending)) | Ok(None) => {
                    debug!(id = %id, "transaction not yet confirmed");
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "status query failed; will poll again");
                }
            }

            let elapsed = self.sleep_within_budget(started).await;
            if let Some(elapsed) = elapsed {
                warn!(id = %id, elapsed_ms = elapsed, "confirmation poll budget exhausted");
                return ConfirmationOutcome::TimedOut;
            }
        }
    }

    /// Sleep until the next tick, capped at the remaining budget. Returns
    /// `Some(elapsed_ms)` once the budget is exhausted.
    async fn sleep_within_budget(&self, started: Instant) -> Option<u64> {
        let elapsed = started.elapsed();
        if elapsed >= self.config.timeout {
            return Some(elapsed.as_millis() as u64);
        }
        let remaining = self.config.timeout - elapsed;
        sleep(self.config.interval.min(remaining)).await;
        let elapsed = started.elapsed();
        (elapsed >= self.config.timeout).then(|| elapsed.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns `None` for the first `pending_polls` queries, then the
    /// scripted terminal status. Counts every query it receives.
    struct ScriptedSource {
        pending_polls: usize,
        terminal: TxStatus,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(pending_polls: usize, terminal: TxStatus) -> Self {
            Self {
                pending_polls,
                terminal,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn status(&self, _id: &str) -> Result<Option<TxStatus>, WalletError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.pending_polls {
                Ok(None)
            } else {
                Ok(Some(self.terminal.clone()))
            }
        }
    }

    /// Never returns a status.
    struct SilentSource;

    #[async_trait]
    impl StatusSource for SilentSource {
        async fn status(&self, _id: &str) -> Result<Option<TxStatus>, WalletError> {
            Ok(None)
        }
    }

    fn poller(interval_ms: u64, timeout_ms: u64) -> ConfirmationPoller {
        ConfirmationPoller::new(PollConfig {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalized_after_n_pending_polls() {
        let source = ScriptedSource::new(3, TxStatus::Finalized);
        let started = Instant::now();
        let outcome = poller(2000, 120_000).wait(&source, "sig").await;

        assert_eq!(outcome, ConfirmationOutcome::Finalized);
        // Three pending polls at 0/2000/4000 ms, terminal on the fourth.
        assert_eq!(started.elapsed(), Duration::from_millis(6000));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_elapses_fully_before_giving_up() {
        let started = Instant::now();
        let outcome = poller(2000, 5000).wait(&SilentSource, "sig").await;

        assert_eq!(outcome, ConfirmationOutcome::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_terminal_immediately() {
        let source = ScriptedSource::new(1, TxStatus::Failed("custom program error".into()));
        let outcome = poller(2000, 120_000).wait(&source, "sig").await;

        assert_eq!(outcome, ConfirmationOutcome::Failed("custom program error".into()));
        // One pending poll, one failure observation, nothing after.
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_absorbed() {
        struct FlakySource {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl StatusSource for FlakySource {
            async fn status(&self, _id: &str) -> Result<Option<TxStatus>, WalletError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(WalletError::rpc("connection reset"))
                } else {
                    Ok(Some(TxStatus::Confirmed))
                }
            }
        }

        let source = FlakySource { calls: AtomicUsize::new(0) };
        let outcome = poller(2000, 120_000).wait(&source, "sig").await;
        assert_eq!(outcome, ConfirmationOutcome::Confirmed);
    }

    #[test]
    fn test_into_result_maps_failure_and_timeout() {
        assert!(ConfirmationOutcome::Finalized.into_result("sig", 0).is_ok());
        assert!(matches!(
            ConfirmationOutcome::Failed("x".into()).into_result("sig", 0),
            Err(WalletError::TransactionFailed { .. })
        ));
        assert!(matches!(
            ConfirmationOutcome::TimedOut.into_result("sig", 5000),
            Err(WalletError::ConfirmationTimedOut { .. })
        ));
    }
}
