// Rust guideline compliant 2026-10-15

//! Report submission -- validates citizen drafts, assigns server identity, and
//! hands accepted incidents to a `Producer` hexagonal port.
//!
//! Entry points: [`Reporter::send_report`], [`Reporter::upload_image`].
//! Configuration via [`ReportConfig::builder`]. [`generator`] produces
//! synthetic drafts for demo traffic.

pub mod generator;
mod validate;

pub use validate::{ValidationError, Violation, validate};

use chrono::Utc;
use domain::{Incident, IncidentDraft, Producer, QueueError, Resolution, Storage, StorageError};

// ---------------------------------------------------------------------------
// ReportError
// ---------------------------------------------------------------------------

/// Errors that can occur while submitting a report or its image.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The supplied configuration is invalid.
    #[error("invalid report configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The draft failed validation and was not enqueued.
    #[error("invalid report: {0}")]
    Invalid(#[from] ValidationError),
    /// The image was refused before reaching storage.
    #[error("invalid image: {reason}")]
    InvalidImage {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A queue write failed.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },
    /// The storage backend refused the upload.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },
}

// ---------------------------------------------------------------------------
// ReportConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Reporter`].
///
/// Construct via [`ReportConfig::builder`].
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Largest accepted image body, in bytes.
    pub max_image_bytes: usize,
}

/// Builder for [`ReportConfig`].
///
/// Obtain via [`ReportConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ReportConfigBuilder {
    max_image_bytes: usize,
}

impl ReportConfig {
    /// Create a builder.
    ///
    /// Default values: `max_image_bytes = 10 MiB`.
    #[must_use]
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder { max_image_bytes: 10 * 1024 * 1024 }
    }
}

impl ReportConfigBuilder {
    /// Override the image size cap.
    #[must_use]
    pub fn max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidConfig`] when `max_image_bytes` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        if self.max_image_bytes == 0 {
            return Err(ReportError::InvalidConfig {
                reason: "max_image_bytes must be >= 1".to_owned(),
            });
        }
        Ok(ReportConfig { max_image_bytes: self.max_image_bytes })
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Accepts incident drafts and forwards them to a [`Producer`] port.
///
/// Holds no port reference; the queue and storage are injected per call.
#[derive(Debug)]
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    #[must_use]
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Validate `draft`, stamp it with a fresh id and the current time, and
    /// enqueue it. Returns the new incident id.
    ///
    /// The resolution always starts as [`Resolution::Unspecified`] with no
    /// comments. Rejected drafts never reach `producer`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] for a bad draft, or
    /// [`ReportError::Queue`] when the write fails.
    pub async fn send_report<P: Producer<Incident>>(
        &self,
        producer: &P,
        draft: IncidentDraft,
    ) -> Result<String, ReportError> {
        if let Err(e) = validate(&draft) {
            tracing::debug!(error = %e, "report.rejected");
            return Err(e.into());
        }

        let incident = Incident {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            description: draft.description,
            coordinates: draft.coordinates,
            location: draft.location,
            resolution: Resolution::Unspecified,
            image_id: draft.image_id,
            reviewer_comments: Vec::new(),
        };
        let id = incident.id.clone();
        tracing::info!(incident_id = %id, "report.received");

        producer.produce(incident).await?;
        Ok(id)
    }

    /// Store an incident photo and return its storage reference.
    ///
    /// Only `image/*` content types and non-empty bodies up to
    /// `config.max_image_bytes` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidImage`] for a refused body, or
    /// [`ReportError::Storage`] when the upload fails.
    pub async fn upload_image<S: Storage>(
        &self,
        storage: &S,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ReportError> {
        if !content_type.starts_with("image/") {
            return Err(ReportError::InvalidImage {
                reason: format!("unsupported content type {content_type:?}"),
            });
        }
        if body.is_empty() {
            return Err(ReportError::InvalidImage { reason: "empty body".to_owned() });
        }
        if body.len() > self.config.max_image_bytes {
            return Err(ReportError::InvalidImage {
                reason: format!(
                    "{} bytes exceeds the {} byte limit",
                    body.len(),
                    self.config.max_image_bytes
                ),
            });
        }

        let size = body.len();
        let reference = storage.upload(body, content_type).await?;
        tracing::info!(image_id = %reference, size, content_type, "report.image.uploaded");
        Ok(reference)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
