// Rust guideline compliant 2026-10-14

//! Shared domain types for the incident intake-and-moderation pipeline.
//!
//! Defines `Incident`, `Region`, `Session`, the port error enums, and the
//! hexagonal port traits: `Producer`, `Consumer`, `QueueMessage`, `Database`,
//! `Notifier`, and `Storage`. All pipeline components depend on this crate.

mod incident;
mod region;

pub use incident::{
    Comment, Coordinates, Incident, IncidentDraft, Location, Resolution, Session, sort_comments,
};
pub use region::{
    Axis, Edge, MAX_LAT_UNITS, MAX_LON_UNITS, REGION_INCREMENT, Region, RegionError,
    UNITS_PER_DEGREE, ValidRegion,
};

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Errors that a queue implementation may return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue has been closed; no further messages are accepted or delivered.
    #[error("queue closed")]
    Closed,
    /// The backing broker could not be reached.
    #[error("queue unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the Database port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// The record is already stored. An idempotency signal, not a failure.
    #[error("database: already exists")]
    AlreadyExists,
    /// The record to read or update is not stored.
    #[error("database: doesn't exist")]
    DoesNotExist,
    /// The session exists but its expiry has passed.
    #[error("database: session expired")]
    SessionExpired,
    /// Transport or driver failure. `reason` is for logs only.
    #[error("database unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the Notifier port.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// Notification could not be delivered.
    #[error("delivery failed: {reason}")]
    DeliveryFailed {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the Storage port.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object could not be stored.
    #[error("upload failed: {reason}")]
    UploadFailed {
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Queue ports
// ---------------------------------------------------------------------------

/// A consumed message together with its acknowledgement handle.
///
/// `ack` and `nack` take `self`, so exactly one of them settles a message.
pub trait QueueMessage<T> {
    /// The payload.
    fn body(&self) -> &T;

    /// Processing succeeded; remove the message for good.
    fn ack(self);

    /// Processing failed; hand the message back for redelivery to some future
    /// consumer. Ordering relative to fresh messages is not preserved.
    fn nack(self);
}

/// Hexagonal port: the write side of the incident queue.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Producer<T> {
    /// Enqueue `body`. May suspend until the queue has room (backpressure).
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Closed` once the queue has been shut down, or
    /// `QueueError::Unavailable` on broker failure.
    async fn produce(&self, body: T) -> Result<(), QueueError>;
}

/// Hexagonal port: the read side of the incident queue.
///
/// Delivery is at-least-once: a message is handed to one consumer at a time
/// and comes back after a `nack`.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Consumer<T> {
    /// Handle type returned for each delivery.
    type Message: QueueMessage<T>;

    /// Suspend until a message is available.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Closed` when the queue is closed and drained.
    async fn consume(&self) -> Result<Self::Message, QueueError>;
}

// ---------------------------------------------------------------------------
// Collaborator ports
// ---------------------------------------------------------------------------

/// Hexagonal port: incident and session persistence.
///
/// Consistency contract:
/// - `save_incident` is an exists-check plus insert; a second save of the same
///   id returns `AlreadyExists` and leaves the stored record untouched.
/// - `save_review` updates the resolution and appends exactly one comment
///   atomically; both effects are visible together or not at all.
/// - Reads return comments oldest first.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Database {
    /// Store a new incident.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the id is taken, `Unavailable` on transport failure.
    async fn save_incident(&self, incident: &Incident) -> Result<(), DatabaseError>;

    /// Set the resolution of `id` and append `comment`.
    ///
    /// # Errors
    ///
    /// `DoesNotExist` if no such incident, `Unavailable` on transport failure.
    async fn save_review(
        &self,
        id: &str,
        resolution: Resolution,
        comment: Comment,
    ) -> Result<(), DatabaseError>;

    /// Fetch one incident with its comments sorted oldest first.
    ///
    /// # Errors
    ///
    /// `DoesNotExist` if no such incident, `Unavailable` on transport failure.
    async fn view_incident(&self, id: &str) -> Result<Incident, DatabaseError>;

    /// All incidents whose resolution is still `Unspecified`.
    ///
    /// # Errors
    ///
    /// `Unavailable` on transport failure.
    async fn incidents_without_review(&self) -> Result<Vec<Incident>, DatabaseError>;

    /// Accepted or alerted incidents inside `region` created at or after `since`.
    ///
    /// # Errors
    ///
    /// `Unavailable` on transport failure.
    async fn incidents_in_region(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError>;

    /// Alerted incidents inside `region` created at or after `since`.
    ///
    /// # Errors
    ///
    /// `Unavailable` on transport failure.
    async fn alerting_incidents(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError>;

    /// Store a reviewer session.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the token is taken, `Unavailable` on transport failure.
    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError>;

    /// Check a session token. Read-only: never deletes expired rows.
    ///
    /// # Errors
    ///
    /// `DoesNotExist` for unknown tokens, `SessionExpired` once `now >= expiry`,
    /// `Unavailable` on transport failure.
    async fn is_valid_session(&self, token: &str) -> Result<(), DatabaseError>;

    /// Delete sessions that expired at or before `now`; returns the count removed.
    ///
    /// # Errors
    ///
    /// `Unavailable` on transport failure.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

/// Hexagonal port: tell reviewers that an incident awaits moderation.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Notifier {
    /// Announce `incident` to reviewers.
    ///
    /// # Errors
    ///
    /// Returns `NotifierError::DeliveryFailed` when the notification is lost.
    async fn notify(&self, incident: &Incident) -> Result<(), NotifierError>;
}

/// Hexagonal port: image upload.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Storage {
    /// Store `body` and return a reference that uniquely identifies it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UploadFailed` when the object cannot be stored.
    async fn upload(&self, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[test]
    fn database_error_messages() {
        assert_eq!(DatabaseError::AlreadyExists.to_string(), "database: already exists");
        assert_eq!(DatabaseError::DoesNotExist.to_string(), "database: doesn't exist");
        let e = DatabaseError::Unavailable { reason: "disk".to_owned() };
        assert_eq!(e.to_string(), "database unavailable: disk");
    }

    #[test]
    fn queue_error_variants() {
        let closed = QueueError::Closed;
        let down = QueueError::Unavailable { reason: "broker".to_owned() };
        assert_eq!(closed, QueueError::Closed);
        assert_ne!(closed, down);
        assert_eq!(down.to_string(), "queue unavailable: broker");
    }

    /// Verify that a minimal single-threaded queue satisfies the queue ports.
    #[tokio::test]
    async fn queue_ports_minimal_impl() {
        struct TestQueue {
            items: RefCell<VecDeque<u32>>,
            acked: RefCell<Vec<u32>>,
        }

        struct TestMessage<'a> {
            queue: &'a TestQueue,
            body: u32,
        }

        impl QueueMessage<u32> for TestMessage<'_> {
            fn body(&self) -> &u32 {
                &self.body
            }

            fn ack(self) {
                self.queue.acked.borrow_mut().push(self.body);
            }

            fn nack(self) {
                self.queue.items.borrow_mut().push_back(self.body);
            }
        }

        impl Producer<u32> for TestQueue {
            async fn produce(&self, body: u32) -> Result<(), QueueError> {
                self.items.borrow_mut().push_back(body);
                Ok(())
            }
        }

        impl<'a> Consumer<u32> for &'a TestQueue {
            type Message = TestMessage<'a>;

            async fn consume(&self) -> Result<TestMessage<'a>, QueueError> {
                let body = self.items.borrow_mut().pop_front().ok_or(QueueError::Closed)?;
                Ok(TestMessage { queue: *self, body })
            }
        }

        let queue = TestQueue { items: RefCell::new(VecDeque::new()), acked: RefCell::new(vec![]) };
        queue.produce(7).await.unwrap();
        let consumer = &queue;

        consumer.consume().await.unwrap().nack();
        let msg = consumer.consume().await.unwrap();
        assert_eq!(*msg.body(), 7);
        msg.ack();

        assert_eq!(*queue.acked.borrow(), vec![7]);
        assert_eq!(consumer.consume().await.err(), Some(QueueError::Closed));
    }
}
