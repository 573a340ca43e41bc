// Rust guideline compliant 2026-10-15

//! Public viewer surface -- region-scoped incident queries behind the privacy
//! gate, plus single-incident lookup.
//!
//! Every region query validates its [`Region`] first; only the resulting
//! [`ValidRegion`] reaches the `Database` port. Transport failures surface as
//! [`ViewerError::Unavailable`] with the detail logged.
//!
//! Entry points: [`Viewer::view_incident`], [`Viewer::incidents_in_region`],
//! [`Viewer::alerting_incidents`]. Configuration via [`ViewerConfig::builder`].

use chrono::{DateTime, TimeDelta, Utc};
use domain::{Database, DatabaseError, Incident, Region, RegionError};

// ---------------------------------------------------------------------------
// ViewerError
// ---------------------------------------------------------------------------

/// Errors returned to public callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    /// The supplied configuration is invalid.
    #[error("invalid viewer configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The requested region failed the privacy gate.
    #[error("invalid region: {0}")]
    InvalidRegion(#[from] RegionError),
    /// No public incident with this id.
    #[error("incident {id} not found")]
    NotFound { id: String },
    /// The backing store failed. Detail is in the logs.
    #[error("service unavailable")]
    Unavailable,
}

fn unavailable(op: &'static str, e: &DatabaseError) -> ViewerError {
    tracing::error!(op, error = %e, "viewer.database.failed");
    ViewerError::Unavailable
}

// ---------------------------------------------------------------------------
// ViewerConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Viewer`].
///
/// Construct via [`ViewerConfig::builder`].
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// How far back region queries look when the caller gives no `since`.
    pub default_lookback: TimeDelta,
}

/// Builder for [`ViewerConfig`].
#[derive(Debug)]
pub struct ViewerConfigBuilder {
    default_lookback: TimeDelta,
}

impl ViewerConfig {
    /// Create a builder.
    ///
    /// Default values: `default_lookback = 7 days`.
    #[must_use]
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder { default_lookback: TimeDelta::days(7) }
    }
}

impl ViewerConfigBuilder {
    #[must_use]
    pub fn default_lookback(mut self, default_lookback: TimeDelta) -> Self {
        self.default_lookback = default_lookback;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::InvalidConfig`] when the lookback is not positive.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ViewerConfig, ViewerError> {
        if self.default_lookback <= TimeDelta::zero() {
            return Err(ViewerError::InvalidConfig {
                reason: "default_lookback must be positive".to_owned(),
            });
        }
        Ok(ViewerConfig { default_lookback: self.default_lookback })
    }
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// Read-only public queries over a [`Database`] port injected per call.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
}

impl Viewer {
    #[must_use]
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    fn since_or_default(&self, since: Option<DateTime<Utc>>) -> DateTime<Utc> {
        since.unwrap_or_else(|| Utc::now() - self.config.default_lookback)
    }

    /// One published incident.
    ///
    /// Incidents that are unreviewed or rejected are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NotFound`] or [`ViewerError::Unavailable`].
    pub async fn view_incident<D: Database>(
        &self,
        db: &D,
        id: &str,
    ) -> Result<Incident, ViewerError> {
        tracing::info!(incident_id = %id, "viewer.view_incident");
        let not_found = || ViewerError::NotFound { id: id.to_owned() };
        let incident = db.view_incident(id).await.map_err(|e| match e {
            DatabaseError::DoesNotExist => not_found(),
            e => unavailable("view_incident", &e),
        })?;
        if incident.resolution.is_public() { Ok(incident) } else { Err(not_found()) }
    }

    /// Accepted and alerted incidents inside `region` since `since`, which
    /// defaults to `config.default_lookback` ago.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::InvalidRegion`] before touching the store, or
    /// [`ViewerError::Unavailable`].
    pub async fn incidents_in_region<D: Database>(
        &self,
        db: &D,
        region: Region,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Incident>, ViewerError> {
        let region = region.validate()?;
        let since = self.since_or_default(since);
        tracing::info!(?region, %since, "viewer.incidents_in_region");
        db.incidents_in_region(since, &region)
            .await
            .map_err(|e| unavailable("incidents_in_region", &e))
    }

    /// Alerted incidents inside `region` since `since`, which defaults to
    /// `config.default_lookback` ago.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::InvalidRegion`] before touching the store, or
    /// [`ViewerError::Unavailable`].
    pub async fn alerting_incidents<D: Database>(
        &self,
        db: &D,
        region: Region,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Incident>, ViewerError> {
        let region = region.validate()?;
        let since = self.since_or_default(since);
        tracing::info!(?region, %since, "viewer.alerting_incidents");
        db.alerting_incidents(since, &region)
            .await
            .map_err(|e| unavailable("alerting_incidents", &e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
