// Rust guideline compliant 2026-10-15

//! Scripted reviewer and map viewer for demo runs.
//!
//! Each pass authenticates, resolves the backlog, then queries the public
//! region around the demo centre the way a map client would.

use std::time::Duration;

use domain::{
    Coordinates, Database, Incident, Location, MAX_LAT_UNITS, MAX_LON_UNITS, Region, Resolution,
    UNITS_PER_DEGREE,
};
use review::{ReviewError, Reviewer};
use tokio_util::sync::CancellationToken;
use viewer::{Viewer, ViewerError};

/// Author id stamped on demo review comments.
pub const DEMO_REVIEWER: &str = "demo-reviewer";

/// Errors that stop the demo reviewer.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// The single-cell region whose south-west corner holds `point`.
///
/// On the north pole or the antimeridian the cell is shifted inwards so it
/// stays on Earth.
#[must_use]
pub fn cell_around(point: Coordinates) -> Region {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "floored coordinates in hundredths of a degree fit in i32"
    )]
    let (south, west) = (
        ((point.lat * UNITS_PER_DEGREE).floor() as i32).clamp(-MAX_LAT_UNITS, MAX_LAT_UNITS - 1),
        ((point.lon * UNITS_PER_DEGREE).floor() as i32).clamp(-MAX_LON_UNITS, MAX_LON_UNITS - 1),
    );
    Region::new(south + 1, south, west + 1, west)
}

/// Resolution the demo reviewer gives `incident`.
///
/// Fights and snatches raise an alert, transportation reports are accepted
/// and empty-looking reports are rejected.
#[must_use]
pub fn verdict(incident: &Incident) -> Resolution {
    let text = incident.description.to_ascii_lowercase();
    if text.contains("fight") || text.contains("snatched") {
        Resolution::Alerted
    } else if incident.location == Location::Transportation {
        Resolution::Accepted
    } else if text.split_whitespace().count() < 3 {
        Resolution::Rejected
    } else {
        Resolution::Accepted
    }
}

/// Reviewer and viewer wired to one database.
#[derive(Debug)]
pub struct DemoReviewer<'a, D> {
    pub db: &'a D,
    pub reviewer: &'a Reviewer,
    pub viewer: &'a Viewer,
    pub centre: Coordinates,
    pub interval: Duration,
}

impl<D: Database> DemoReviewer<'_, D> {
    /// Work through the current backlog once. Returns the number of reviews
    /// saved.
    ///
    /// A fresh session is opened when `token` is missing or rejected.
    ///
    /// # Errors
    ///
    /// Returns the first reviewer or viewer error other than a lost race on
    /// an incident.
    pub async fn pass(&self, token: &mut Option<String>) -> Result<usize, DemoError> {
        let authenticated = match token.as_deref() {
            Some(t) => match self.reviewer.check_session(self.db, t).await {
                Ok(()) => true,
                Err(ReviewError::Unauthenticated) => false,
                Err(e) => return Err(e.into()),
            },
            None => false,
        };
        if !authenticated {
            self.reviewer.purge_sessions(self.db).await?;
            *token = Some(self.reviewer.open_session(self.db).await?.token);
        }

        let mut reviewed = 0;
        for incident in self.reviewer.incidents_without_review(self.db).await? {
            let resolution = verdict(&incident);
            let note = format!("demo pass: {}", resolution.as_str());
            match self
                .reviewer
                .save_review(self.db, &incident.id, DEMO_REVIEWER, resolution, &note)
                .await
            {
                Ok(()) => reviewed += 1,
                Err(ReviewError::NotFound { id }) => {
                    tracing::warn!(incident_id = %id, "demo.review.skipped: vanished");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let region = cell_around(self.centre);
        let public = self.viewer.incidents_in_region(self.db, region, None).await?;
        let alerts = self.viewer.alerting_incidents(self.db, region, None).await?;
        tracing::info!(
            reviewed,
            public = public.len(),
            alerts = alerts.len(),
            "demo.pass.done"
        );
        if let Some(latest) = alerts.last() {
            let shown = self.viewer.view_incident(self.db, &latest.id).await?;
            tracing::info!(
                incident_id = %shown.id,
                comments = shown.reviewer_comments.len(),
                "demo.alert.viewed"
            );
        }
        Ok(reviewed)
    }

    /// Repeat [`pass`](Self::pass) every `interval` until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns the first error from a pass.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), DemoError> {
        let mut token = None;
        loop {
            self.pass(&mut token).await?;
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("demo.run.stopped: cancelled");
                    return Ok(());
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
