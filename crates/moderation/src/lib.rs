// Rust guideline compliant 2026-10-15

//! Moderation worker -- pulls submitted incidents from a `Consumer` port,
//! persists them through the `Database` port, and notifies reviewers through
//! the `Notifier` port.
//!
//! Delivery is at-least-once, so a redelivered incident that is already stored
//! is acknowledged without a second notification.
//!
//! Entry points: [`ModerationWorker::handle_once`], [`ModerationWorker::run`].
//! Configuration via [`WorkerConfig::builder`].

use std::str::FromStr;

use domain::{
    Consumer, Database, DatabaseError, Incident, Notifier, NotifierError, QueueError, QueueMessage,
};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// WorkerError
// ---------------------------------------------------------------------------

/// Errors that can occur while moderating incidents.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The supplied configuration is invalid.
    #[error("invalid worker configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// Reading from the queue failed.
    #[error("consume error: {0}")]
    Consume(QueueError),
    /// Persisting the incident failed for a reason other than a duplicate.
    #[error("save error: {0}")]
    Save(DatabaseError),
    /// The reviewer notification was not delivered.
    #[error("notify error: {0}")]
    Notify(NotifierError),
}

// ---------------------------------------------------------------------------
// FailurePolicy
// ---------------------------------------------------------------------------

/// What the run loop does after a message fails to process.
///
/// The failed message is nacked in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the error and stop the worker.
    #[default]
    Stop,
    /// Log the error and keep consuming.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "continue" => Ok(Self::Continue),
            other => Err(WorkerError::InvalidConfig {
                reason: format!(
                    "unknown failure policy {other:?}, expected \"stop\" or \"continue\""
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`ModerationWorker`].
///
/// Construct via [`WorkerConfig::builder`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Behaviour after a processing failure.
    pub failure_policy: FailurePolicy,
    /// Optional upper bound on handled messages. `None` means infinite.
    pub iterations: Option<u64>,
}

/// Builder for [`WorkerConfig`].
///
/// Obtain via [`WorkerConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct WorkerConfigBuilder {
    failure_policy: FailurePolicy,
    iterations: Option<u64>,
}

impl WorkerConfig {
    /// Create a builder.
    ///
    /// Default values: `failure_policy = Stop`, `iterations = None`.
    #[must_use]
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder { failure_policy: FailurePolicy::default(), iterations: None }
    }
}

impl WorkerConfigBuilder {
    #[must_use]
    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Set a finite message count. Without this the worker runs until the
    /// queue signals `Closed` or it is cancelled.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidConfig`] when `iterations` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<WorkerConfig, WorkerError> {
        if self.iterations == Some(0) {
            return Err(WorkerError::InvalidConfig { reason: "iterations must be >= 1".to_owned() });
        }
        Ok(WorkerConfig { failure_policy: self.failure_policy, iterations: self.iterations })
    }
}

// ---------------------------------------------------------------------------
// ModerationWorker
// ---------------------------------------------------------------------------

/// Result of handling one message successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The incident was stored and reviewers were notified.
    Stored,
    /// The incident was already stored; the redelivery was acknowledged.
    Duplicate,
}

/// Consumes incidents, persists them, and notifies reviewers.
///
/// Generic over the queue, database, and notifier ports for static dispatch.
/// Holds no adapter references; dependencies are injected per call, so any
/// number of workers may share one queue.
#[derive(Debug)]
pub struct ModerationWorker {
    config: WorkerConfig,
}

impl ModerationWorker {
    #[must_use]
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Persist and announce one consumed message, then settle it.
    ///
    /// - Save returns `AlreadyExists`: ack, no notification.
    /// - Save or notify fails: nack and return the error.
    /// - Otherwise: ack.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Save`] or [`WorkerError::Notify`]; the message
    /// has been nacked in both cases.
    pub async fn process<M, D, N>(
        &self,
        message: M,
        db: &D,
        notifier: &N,
    ) -> Result<Outcome, WorkerError>
    where
        M: QueueMessage<Incident>,
        D: Database,
        N: Notifier,
    {
        let incident = message.body();
        let id = incident.id.clone();

        match db.save_incident(incident).await {
            Ok(()) => {}
            Err(DatabaseError::AlreadyExists) => {
                tracing::info!(incident_id = %id, "moderation.incident.duplicate");
                message.ack();
                return Ok(Outcome::Duplicate);
            }
            Err(e) => {
                tracing::error!(incident_id = %id, error = %e, "moderation.incident.save_failed");
                message.nack();
                return Err(WorkerError::Save(e));
            }
        }

        if let Err(e) = notifier.notify(message.body()).await {
            tracing::error!(incident_id = %id, error = %e, "moderation.incident.notify_failed");
            message.nack();
            return Err(WorkerError::Notify(e));
        }

        message.ack();
        tracing::info!(incident_id = %id, "moderation.incident.acked");
        Ok(Outcome::Stored)
    }

    /// Consume one message and [`process`](Self::process) it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Consume`] on queue failure (including `Closed`),
    /// otherwise as [`process`](Self::process).
    pub async fn handle_once<C, D, N>(
        &self,
        consumer: &C,
        db: &D,
        notifier: &N,
    ) -> Result<Outcome, WorkerError>
    where
        C: Consumer<Incident>,
        D: Database,
        N: Notifier,
    {
        let message = consumer.consume().await.map_err(WorkerError::Consume)?;
        self.process(message, db, notifier).await
    }

    /// Run the moderation loop until stopped.
    ///
    /// Stops cleanly when:
    /// - `cancel` fires while waiting for a message (returns `Ok(())`),
    /// - the queue signals [`QueueError::Closed`] (returns `Ok(())`), or
    /// - `config.iterations` messages have been handled (returns `Ok(())`).
    ///
    /// Cancellation also aborts a message still being processed. The message
    /// is dropped unsettled, so the queue redelivers it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Consume`] for queue errors other than `Closed`.
    /// Processing errors are returned under [`FailurePolicy::Stop`] and logged
    /// under [`FailurePolicy::Continue`].
    pub async fn run<C, D, N>(
        &self,
        consumer: &C,
        db: &D,
        notifier: &N,
        cancel: &CancellationToken,
    ) -> Result<(), WorkerError>
    where
        C: Consumer<Incident>,
        D: Database,
        N: Notifier,
    {
        let mut count = 0u64;
        loop {
            let consumed = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(count, "moderation.run.stopped: cancelled");
                    return Ok(());
                }
                consumed = consumer.consume() => consumed,
            };

            let message = match consumed {
                Ok(message) => message,
                Err(QueueError::Closed) => {
                    tracing::info!(count, "moderation.run.stopped: queue closed");
                    return Ok(());
                }
                Err(e) => return Err(WorkerError::Consume(e)),
            };

            let processed = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(count, "moderation.run.stopped: cancelled while processing");
                    return Ok(());
                }
                processed = self.process(message, db, notifier) => processed,
            };

            match processed {
                Ok(_) => {}
                Err(e) if self.config.failure_policy == FailurePolicy::Continue => {
                    tracing::warn!(error = %e, "moderation.run.continuing");
                }
                Err(e) => return Err(e),
            }

            count += 1;
            if let Some(max) = self.config.iterations
                && count >= max
            {
                tracing::info!(count, "moderation.run.stopped: iteration limit reached");
                return Ok(());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
