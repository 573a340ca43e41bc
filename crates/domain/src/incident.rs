// Rust guideline compliant 2026-10-14

//! Incident, comment, and session types shared by every pipeline component.

use chrono::{DateTime, Utc};

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude, valid range `[-90, 90]`.
    pub lat: f64,
    /// Longitude, valid range `[-180, 180]`.
    pub lon: f64,
}

impl Coordinates {
    /// Create a coordinate pair without validating it.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` when the latitude lies in `[-90, 90]`. NaN is never valid.
    #[must_use]
    pub fn has_valid_lat(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
    }

    /// `true` when the longitude lies in `[-180, 180]`. NaN is never valid.
    #[must_use]
    pub fn has_valid_lon(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon)
    }

    /// `true` when both components are valid Earth coordinates.
    #[must_use]
    pub fn is_on_earth(&self) -> bool {
        self.has_valid_lat() && self.has_valid_lon()
    }
}

/// Where the reported incident took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    /// A fixed place; coordinates are mandatory.
    #[default]
    FixedPlace,
    /// On board public transport; coordinates may be omitted.
    Transportation,
}

impl Location {
    /// Stable storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedPlace => "LOCATION_FIXED_PLACE",
            Self::Transportation => "LOCATION_TRANSPORTATION",
        }
    }

    /// Parse a storage name; unknown names map to [`Location::FixedPlace`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "LOCATION_TRANSPORTATION" => Self::Transportation,
            _ => Self::FixedPlace,
        }
    }
}

/// Moderation outcome of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    /// Never reviewed.
    #[default]
    Unspecified,
    /// Reviewed and publicly visible.
    Accepted,
    /// Reviewed, publicly visible, and raised as an alert.
    Alerted,
    /// Reviewed and hidden.
    Rejected,
}

impl Resolution {
    /// Stable storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "RESOLUTION_UNSPECIFIED",
            Self::Accepted => "RESOLUTION_ACCEPTED",
            Self::Alerted => "RESOLUTION_ALERTED",
            Self::Rejected => "RESOLUTION_REJECTED",
        }
    }

    /// Parse a storage name; unknown names map to [`Resolution::Unspecified`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "RESOLUTION_ACCEPTED" => Self::Accepted,
            "RESOLUTION_ALERTED" => Self::Alerted,
            "RESOLUTION_REJECTED" => Self::Rejected,
            _ => Self::Unspecified,
        }
    }

    /// `true` for resolutions shown to the public in region queries.
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Accepted | Self::Alerted)
    }
}

/// A reviewer comment attached by exactly one review.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Identity of the reviewer.
    pub author_id: String,
    /// Creation time; ordering key.
    pub timestamp: DateTime<Utc>,
    /// Free-form text.
    pub message: String,
}

/// A citizen-submitted safety report.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    /// Server-generated unique identifier.
    pub id: String,
    /// Server-set creation time.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub description: String,
    /// Where it happened. Absent only for transportation incidents.
    pub coordinates: Option<Coordinates>,
    /// Kind of location.
    pub location: Location,
    /// Moderation outcome; `Unspecified` until the first review.
    pub resolution: Resolution,
    /// Opaque storage reference to an uploaded photo.
    pub image_id: Option<String>,
    /// Reviewer comments, oldest first.
    pub reviewer_comments: Vec<Comment>,
}

/// Client-supplied part of an incident, before the server assigns identity.
///
/// Carries no id, timestamp, or resolution: those are never client-trusted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentDraft {
    pub description: String,
    pub coordinates: Option<Coordinates>,
    pub location: Location,
    pub image_id: Option<String>,
}

/// Sort comments oldest first. Stable, so equal timestamps keep insertion order.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by_key(|c| c.timestamp);
}

/// Authenticated reviewer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque session token.
    pub token: String,
    /// Absolute expiry time.
    pub expiry: DateTime<Utc>,
}

impl Session {
    /// A session is valid iff `now < expiry`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn comment(author: &str, secs: i64) -> Comment {
        Comment {
            author_id: author.to_owned(),
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            message: String::new(),
        }
    }

    #[test]
    fn coordinates_bounds() {
        assert!(Coordinates::new(53.34, -6.26).is_on_earth());
        assert!(Coordinates::new(90.0, 180.0).is_on_earth());
        assert!(!Coordinates::new(-90.5, 0.0).is_on_earth());
        assert!(!Coordinates::new(0.0, 180.5).is_on_earth());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_on_earth());
    }

    #[test]
    fn resolution_names_round_trip() {
        for r in [
            Resolution::Unspecified,
            Resolution::Accepted,
            Resolution::Alerted,
            Resolution::Rejected,
        ] {
            assert_eq!(Resolution::from_name(r.as_str()), r);
        }
        assert_eq!(Resolution::from_name("garbage"), Resolution::Unspecified);
    }

    #[test]
    fn only_accepted_and_alerted_are_public() {
        assert!(Resolution::Accepted.is_public());
        assert!(Resolution::Alerted.is_public());
        assert!(!Resolution::Rejected.is_public());
        assert!(!Resolution::Unspecified.is_public());
    }

    #[test]
    fn comments_sort_oldest_first_and_stable() {
        let mut comments = vec![comment("c", 30), comment("a", 10), comment("b1", 20), comment("b2", 20)];
        sort_comments(&mut comments);
        let order: Vec<_> = comments.iter().map(|c| c.author_id.as_str()).collect();
        assert_eq!(order, ["a", "b1", "b2", "c"]);
    }

    #[test]
    fn session_expires_at_expiry() {
        let now = Utc::now();
        let session = Session { token: "t".to_owned(), expiry: now };
        assert!(!session.is_valid_at(now));
        assert!(session.is_valid_at(now - TimeDelta::seconds(1)));
    }
}
