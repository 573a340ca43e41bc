// Rust guideline compliant 2026-10-15

//! Reviewer surface -- resolve incidents, inspect them, list the moderation
//! backlog, and manage reviewer sessions, all through the `Database` port.
//!
//! Transport failures surface as [`ReviewError::Unavailable`] with the
//! driver detail logged, never returned.
//!
//! Entry points: [`Reviewer::save_review`], [`Reviewer::view_incident`],
//! [`Reviewer::incidents_without_review`], [`Reviewer::open_session`],
//! [`Reviewer::check_session`], [`Reviewer::purge_sessions`].
//! Configuration via [`ReviewConfig::builder`].

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use domain::{Comment, Database, DatabaseError, Incident, Resolution, Session};

// ---------------------------------------------------------------------------
// ReviewError
// ---------------------------------------------------------------------------

/// Errors returned to reviewer-facing callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// The supplied configuration is invalid.
    #[error("invalid review configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A review must move the incident to a concrete resolution.
    #[error("resolution must not be unspecified")]
    UnspecifiedResolution,
    /// No incident with this id.
    #[error("incident {id} not found")]
    NotFound { id: String },
    /// The session token is unknown or expired.
    #[error("session is not valid")]
    Unauthenticated,
    /// The backing store failed. Detail is in the logs.
    #[error("service unavailable")]
    Unavailable,
}

/// Log a transport failure and replace it with the opaque error.
fn unavailable(op: &'static str, e: &DatabaseError) -> ReviewError {
    tracing::error!(op, error = %e, "review.database.failed");
    ReviewError::Unavailable
}

// ---------------------------------------------------------------------------
// ReviewConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Reviewer`].
///
/// Construct via [`ReviewConfig::builder`].
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Lifetime of a newly opened session.
    pub session_ttl: TimeDelta,
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    session_ttl: Duration,
}

impl ReviewConfig {
    /// Create a builder.
    ///
    /// Default values: `session_ttl = 1 h`.
    #[must_use]
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder { session_ttl: Duration::from_secs(60 * 60) }
    }
}

impl ReviewConfigBuilder {
    #[must_use]
    pub fn session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::InvalidConfig`] for a zero or unrepresentable TTL.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let session_ttl = TimeDelta::from_std(self.session_ttl)
            .ok()
            .filter(|ttl| *ttl > TimeDelta::zero())
            .ok_or_else(|| ReviewError::InvalidConfig {
                reason: "session_ttl must be positive and finite".to_owned(),
            })?;
        Ok(ReviewConfig { session_ttl })
    }
}

// ---------------------------------------------------------------------------
// Reviewer
// ---------------------------------------------------------------------------

/// Reviewer operations over a [`Database`] port injected per call.
#[derive(Debug)]
pub struct Reviewer {
    config: ReviewConfig,
}

impl Reviewer {
    #[must_use]
    pub fn new(config: ReviewConfig) -> Self {
        Self { config }
    }

    /// Resolve incident `id` and attach `message` as a comment by `author_id`,
    /// timestamped now.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::UnspecifiedResolution`] when `resolution` is
    /// `Unspecified`, [`ReviewError::NotFound`] for an unknown id, or
    /// [`ReviewError::Unavailable`].
    pub async fn save_review<D: Database>(
        &self,
        db: &D,
        id: &str,
        author_id: &str,
        resolution: Resolution,
        message: &str,
    ) -> Result<(), ReviewError> {
        if resolution == Resolution::Unspecified {
            return Err(ReviewError::UnspecifiedResolution);
        }
        tracing::info!(incident_id = %id, resolution = resolution.as_str(), "review.received");

        let comment = Comment {
            author_id: author_id.to_owned(),
            timestamp: Utc::now(),
            message: message.to_owned(),
        };
        db.save_review(id, resolution, comment).await.map_err(|e| match e {
            DatabaseError::DoesNotExist => ReviewError::NotFound { id: id.to_owned() },
            e => unavailable("save_review", &e),
        })
    }

    /// One incident with its comments oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] or [`ReviewError::Unavailable`].
    pub async fn view_incident<D: Database>(
        &self,
        db: &D,
        id: &str,
    ) -> Result<Incident, ReviewError> {
        tracing::debug!(incident_id = %id, "review.view_incident");
        db.view_incident(id).await.map_err(|e| match e {
            DatabaseError::DoesNotExist => ReviewError::NotFound { id: id.to_owned() },
            e => unavailable("view_incident", &e),
        })
    }

    /// Every incident still awaiting a first review.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Unavailable`].
    pub async fn incidents_without_review<D: Database>(
        &self,
        db: &D,
    ) -> Result<Vec<Incident>, ReviewError> {
        let incidents = db
            .incidents_without_review()
            .await
            .map_err(|e| unavailable("incidents_without_review", &e))?;
        tracing::debug!(count = incidents.len(), "review.backlog.listed");
        Ok(incidents)
    }

    /// Start a reviewer session valid for `config.session_ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Unavailable`].
    pub async fn open_session<D: Database>(&self, db: &D) -> Result<Session, ReviewError> {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            expiry: Utc::now() + self.config.session_ttl,
        };
        db.save_session(&session).await.map_err(|e| unavailable("save_session", &e))?;
        tracing::info!(expiry = %session.expiry, "review.session.opened");
        Ok(session)
    }

    /// Check `token` without modifying any state.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Unauthenticated`] for unknown or expired tokens,
    /// or [`ReviewError::Unavailable`].
    pub async fn check_session<D: Database>(&self, db: &D, token: &str) -> Result<(), ReviewError> {
        db.is_valid_session(token).await.map_err(|e| match e {
            DatabaseError::DoesNotExist | DatabaseError::SessionExpired => {
                tracing::debug!(reason = %e, "review.session.rejected");
                ReviewError::Unauthenticated
            }
            e => unavailable("is_valid_session", &e),
        })
    }

    /// Delete sessions that have expired by now. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Unavailable`].
    pub async fn purge_sessions<D: Database>(&self, db: &D) -> Result<u64, ReviewError> {
        let removed = db
            .purge_expired_sessions(Utc::now())
            .await
            .map_err(|e| unavailable("purge_expired_sessions", &e))?;
        if removed > 0 {
            tracing::info!(removed, "review.session.purged");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use domain::{Location, ValidRegion, sort_comments};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    // ------------------------------------------------------------------
    // Mock database
    // ------------------------------------------------------------------

    struct MockDatabase {
        incidents: RefCell<BTreeMap<String, Incident>>,
        sessions: RefCell<BTreeMap<String, Session>>,
        down: Cell<bool>,
    }

    impl MockDatabase {
        fn with(ids: &[&str]) -> Self {
            let incidents = ids
                .iter()
                .map(|id| {
                    let incident = Incident {
                        id: (*id).to_owned(),
                        timestamp: Utc::now(),
                        description: "stolen bike".to_owned(),
                        coordinates: None,
                        location: Location::Transportation,
                        resolution: Resolution::Unspecified,
                        image_id: None,
                        reviewer_comments: vec![],
                    };
                    ((*id).to_owned(), incident)
                })
                .collect();
            Self {
                incidents: RefCell::new(incidents),
                sessions: RefCell::new(BTreeMap::new()),
                down: Cell::new(false),
            }
        }

        fn check(&self) -> Result<(), DatabaseError> {
            if self.down.get() {
                return Err(DatabaseError::Unavailable { reason: "SELECT failed: no such table".to_owned() });
            }
            Ok(())
        }
    }

    impl Database for MockDatabase {
        async fn save_incident(&self, _: &Incident) -> Result<(), DatabaseError> {
            unimplemented!()
        }

        async fn save_review(&self, id: &str, resolution: Resolution, comment: Comment) -> Result<(), DatabaseError> {
            self.check()?;
            let mut incidents = self.incidents.borrow_mut();
            let incident = incidents.get_mut(id).ok_or(DatabaseError::DoesNotExist)?;
            incident.resolution = resolution;
            incident.reviewer_comments.push(comment);
            Ok(())
        }

        async fn view_incident(&self, id: &str) -> Result<Incident, DatabaseError> {
            self.check()?;
            let mut incident = self.incidents.borrow().get(id).cloned().ok_or(DatabaseError::DoesNotExist)?;
            sort_comments(&mut incident.reviewer_comments);
            Ok(incident)
        }

        async fn incidents_without_review(&self) -> Result<Vec<Incident>, DatabaseError> {
            self.check()?;
            Ok(self
                .incidents
                .borrow()
                .values()
                .filter(|i| i.resolution == Resolution::Unspecified)
                .cloned()
                .collect())
        }

        async fn incidents_in_region(&self, _: DateTime<Utc>, _: &ValidRegion) -> Result<Vec<Incident>, DatabaseError> {
            unimplemented!()
        }

        async fn alerting_incidents(&self, _: DateTime<Utc>, _: &ValidRegion) -> Result<Vec<Incident>, DatabaseError> {
            unimplemented!()
        }

        async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
            self.check()?;
            self.sessions.borrow_mut().insert(session.token.clone(), session.clone());
            Ok(())
        }

        async fn is_valid_session(&self, token: &str) -> Result<(), DatabaseError> {
            self.check()?;
            let sessions = self.sessions.borrow();
            let session = sessions.get(token).ok_or(DatabaseError::DoesNotExist)?;
            if session.is_valid_at(Utc::now()) { Ok(()) } else { Err(DatabaseError::SessionExpired) }
        }

        async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
            self.check()?;
            let mut sessions = self.sessions.borrow_mut();
            let before = sessions.len();
            sessions.retain(|_, s| s.is_valid_at(now));
            Ok((before - sessions.len()) as u64)
        }
    }

    fn reviewer() -> Reviewer {
        Reviewer::new(ReviewConfig::builder().build().unwrap())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    #[test]
    fn config_rejects_zero_ttl() {
        let result = ReviewConfig::builder().session_ttl(Duration::ZERO).build();
        assert!(matches!(result, Err(ReviewError::InvalidConfig { .. })));
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn review_then_view_round_trip() {
        let db = MockDatabase::with(&["a"]);
        let r = reviewer();

        r.save_review(&db, "a", "mod@safer.place", Resolution::Accepted, "looks legit").await.unwrap();
        let incident = r.view_incident(&db, "a").await.unwrap();

        assert_eq!(incident.resolution, Resolution::Accepted);
        assert_eq!(incident.reviewer_comments.len(), 1);
        assert_eq!(incident.reviewer_comments[0].author_id, "mod@safer.place");
        assert_eq!(incident.reviewer_comments[0].message, "looks legit");
    }

    #[tokio::test]
    async fn repeated_reviews_keep_comments_oldest_first() {
        let db = MockDatabase::with(&["a"]);
        let r = reviewer();

        r.save_review(&db, "a", "alice", Resolution::Accepted, "first").await.unwrap();
        r.save_review(&db, "a", "bob", Resolution::Alerted, "second").await.unwrap();
        let incident = r.view_incident(&db, "a").await.unwrap();

        assert_eq!(incident.resolution, Resolution::Alerted);
        let messages: Vec<_> = incident.reviewer_comments.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[tokio::test]
    async fn unknown_incident_is_not_found() {
        let db = MockDatabase::with(&[]);
        let r = reviewer();

        let saved = r.save_review(&db, "ghost", "alice", Resolution::Rejected, "spam").await;
        assert_eq!(saved, Err(ReviewError::NotFound { id: "ghost".to_owned() }));
        let viewed = r.view_incident(&db, "ghost").await;
        assert_eq!(viewed.err(), Some(ReviewError::NotFound { id: "ghost".to_owned() }));
    }

    #[tokio::test]
    async fn unspecified_resolution_is_refused() {
        let db = MockDatabase::with(&["a"]);
        let result = reviewer().save_review(&db, "a", "alice", Resolution::Unspecified, "hmm").await;
        assert_eq!(result, Err(ReviewError::UnspecifiedResolution));
        assert!(db.incidents.borrow()["a"].reviewer_comments.is_empty());
    }

    #[tokio::test]
    async fn backlog_lists_only_unreviewed() {
        let db = MockDatabase::with(&["a", "b", "c"]);
        let r = reviewer();
        r.save_review(&db, "b", "alice", Resolution::Rejected, "duplicate").await.unwrap();

        let backlog = r.incidents_without_review(&db).await.unwrap();
        let ids: Vec<_> = backlog.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn transport_detail_is_not_leaked() {
        let db = MockDatabase::with(&["a"]);
        db.down.set(true);

        let err = reviewer().incidents_without_review(&db).await.unwrap_err();

        assert_eq!(err, ReviewError::Unavailable);
        assert!(!err.to_string().contains("SELECT"));
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn opened_session_is_valid() {
        let db = MockDatabase::with(&[]);
        let r = reviewer();
        let session = r.open_session(&db).await.unwrap();
        assert!(session.expiry > Utc::now());
        r.check_session(&db, &session.token).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_and_expired_sessions_are_rejected() {
        let db = MockDatabase::with(&[]);
        let expired = Session { token: "old".to_owned(), expiry: Utc::now() - TimeDelta::seconds(1) };
        db.save_session(&expired).await.unwrap();
        let r = reviewer();

        assert_eq!(r.check_session(&db, "nope").await, Err(ReviewError::Unauthenticated));
        assert_eq!(r.check_session(&db, "old").await, Err(ReviewError::Unauthenticated));
        assert_eq!(db.sessions.borrow().len(), 1, "checking must not delete");

        assert_eq!(r.purge_sessions(&db).await.unwrap(), 1);
        assert!(db.sessions.borrow().is_empty());
    }
}
