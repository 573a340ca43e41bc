// Rust guideline compliant 2026-10-15

//! Log adapter for the `Notifier` port.
//!
//! Emits one `info` event per stored incident carrying the reviewer link.
//! Never fails.

use domain::{Incident, Notifier, NotifierError};

/// `Notifier` adapter that logs a review link for each new incident.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    review_url: String,
}

impl LogNotifier {
    /// Links point at `{review_url}/incident/{id}`. A trailing slash on
    /// `review_url` is ignored.
    #[must_use]
    pub fn new(review_url: &str) -> Self {
        Self { review_url: review_url.trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn link(&self, incident_id: &str) -> String {
        format!("{}/incident/{incident_id}", self.review_url)
    }
}

impl Notifier for LogNotifier {
    async fn notify(&self, incident: &Incident) -> Result<(), NotifierError> {
        tracing::info!(
            incident_id = %incident.id,
            link = %self.link(&incident.id),
            "log_notifier.review_requested"
        );
        Ok(())
    }
}
