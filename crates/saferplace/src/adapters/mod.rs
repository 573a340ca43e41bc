// Rust guideline compliant 2026-10-15

//! Adapters (secondary ports) for the saferplace binary.
//!
//! Each sub-module implements one or more port traits defined in the
//! `domain` crate. [`DatabaseBackend`] picks a `Database` adapter at start-up
//! from configuration.

pub mod in_memory_database;
pub mod in_memory_storage;
pub mod log_notifier;
pub mod memory_queue;
pub mod sqlite_database;

use chrono::{DateTime, Utc};
use domain::{Comment, Database, DatabaseError, Incident, Resolution, Session, ValidRegion};

use in_memory_database::InMemoryDatabase;
use sqlite_database::SqliteDatabase;

/// The configured `Database` adapter.
#[derive(Debug)]
pub enum DatabaseBackend {
    Memory(InMemoryDatabase),
    Sqlite(SqliteDatabase),
}

impl Database for DatabaseBackend {
    async fn save_incident(&self, incident: &Incident) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.save_incident(incident).await,
            Self::Sqlite(db) => db.save_incident(incident).await,
        }
    }

    async fn save_review(
        &self,
        id: &str,
        resolution: Resolution,
        comment: Comment,
    ) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.save_review(id, resolution, comment).await,
            Self::Sqlite(db) => db.save_review(id, resolution, comment).await,
        }
    }

    async fn view_incident(&self, id: &str) -> Result<Incident, DatabaseError> {
        match self {
            Self::Memory(db) => db.view_incident(id).await,
            Self::Sqlite(db) => db.view_incident(id).await,
        }
    }

    async fn incidents_without_review(&self) -> Result<Vec<Incident>, DatabaseError> {
        match self {
            Self::Memory(db) => db.incidents_without_review().await,
            Self::Sqlite(db) => db.incidents_without_review().await,
        }
    }

    async fn incidents_in_region(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        match self {
            Self::Memory(db) => db.incidents_in_region(since, region).await,
            Self::Sqlite(db) => db.incidents_in_region(since, region).await,
        }
    }

    async fn alerting_incidents(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        match self {
            Self::Memory(db) => db.alerting_incidents(since, region).await,
            Self::Sqlite(db) => db.alerting_incidents(since, region).await,
        }
    }

    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.save_session(session).await,
            Self::Sqlite(db) => db.save_session(session).await,
        }
    }

    async fn is_valid_session(&self, token: &str) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.is_valid_session(token).await,
            Self::Sqlite(db) => db.is_valid_session(token).await,
        }
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        match self {
            Self::Memory(db) => db.purge_expired_sessions(now).await,
            Self::Sqlite(db) => db.purge_expired_sessions(now).await,
        }
    }
}
