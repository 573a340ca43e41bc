// Rust guideline compliant 2026-10-15

//! In-memory adapter for the `Database` port.
//!
//! Intended for demo runs and tests. One mutex guards incidents and sessions
//! together, so every operation, including the two-part `save_review`, is
//! atomic. Nothing survives a restart.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use domain::{
    Comment, Database, DatabaseError, Incident, Resolution, Session, ValidRegion, sort_comments,
};

#[derive(Debug, Default)]
struct Tables {
    incidents: BTreeMap<String, Incident>,
    sessions: BTreeMap<String, Session>,
}

/// `Database` adapter backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Incidents matching `keep`, inside `region`, at or after `since`,
    /// oldest first with comments oldest first.
    fn select(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
        keep: impl Fn(Resolution) -> bool,
    ) -> Vec<Incident> {
        let mut found: Vec<Incident> = self
            .lock()
            .incidents
            .values()
            .filter(|i| keep(i.resolution) && i.timestamp >= since)
            .filter(|i| i.coordinates.is_some_and(|c| region.contains(&c)))
            .cloned()
            .collect();
        found.sort_by_key(|i| i.timestamp);
        for incident in &mut found {
            sort_comments(&mut incident.reviewer_comments);
        }
        found
    }
}

impl Database for InMemoryDatabase {
    async fn save_incident(&self, incident: &Incident) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        if tables.incidents.contains_key(&incident.id) {
            return Err(DatabaseError::AlreadyExists);
        }
        tables.incidents.insert(incident.id.clone(), incident.clone());
        Ok(())
    }

    async fn save_review(
        &self,
        id: &str,
        resolution: Resolution,
        comment: Comment,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        let incident = tables.incidents.get_mut(id).ok_or(DatabaseError::DoesNotExist)?;
        incident.resolution = resolution;
        incident.reviewer_comments.push(comment);
        Ok(())
    }

    async fn view_incident(&self, id: &str) -> Result<Incident, DatabaseError> {
        let mut incident =
            self.lock().incidents.get(id).cloned().ok_or(DatabaseError::DoesNotExist)?;
        sort_comments(&mut incident.reviewer_comments);
        Ok(incident)
    }

    async fn incidents_without_review(&self) -> Result<Vec<Incident>, DatabaseError> {
        let mut found: Vec<Incident> = self
            .lock()
            .incidents
            .values()
            .filter(|i| i.resolution == Resolution::Unspecified)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.timestamp);
        Ok(found)
    }

    async fn incidents_in_region(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        Ok(self.select(since, region, Resolution::is_public))
    }

    async fn alerting_incidents(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        Ok(self.select(since, region, |r| r == Resolution::Alerted))
    }

    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        if tables.sessions.contains_key(&session.token) {
            return Err(DatabaseError::AlreadyExists);
        }
        tables.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn is_valid_session(&self, token: &str) -> Result<(), DatabaseError> {
        let tables = self.lock();
        let session = tables.sessions.get(token).ok_or(DatabaseError::DoesNotExist)?;
        if session.is_valid_at(Utc::now()) {
            Ok(())
        } else {
            Err(DatabaseError::SessionExpired)
        }
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.is_valid_at(now));
        Ok(u64::try_from(before - tables.sessions.len()).unwrap_or(u64::MAX))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
