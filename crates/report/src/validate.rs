// Rust guideline compliant 2026-10-15

//! Submission checks applied before an incident may enter the queue.
//!
//! Every check runs; failures are collected into one [`ValidationError`].

use domain::{IncidentDraft, Location};

/// One reason a draft was rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("missing description")]
    MissingDescription,
    /// Coordinates are required outside transportation.
    #[error("missing coordinates")]
    MissingCoordinates,
    #[error("latitude {0} must be between -90 and 90")]
    Latitude(f64),
    #[error("longitude {0} must be between -180 and 180")]
    Longitude(f64),
}

/// All violations found in a draft, in check order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

type Check = fn(&IncidentDraft) -> Option<Violation>;

fn check_description(draft: &IncidentDraft) -> Option<Violation> {
    draft.description.trim().is_empty().then_some(Violation::MissingDescription)
}

fn check_latitude(draft: &IncidentDraft) -> Option<Violation> {
    let c = draft.coordinates?;
    (!c.has_valid_lat()).then_some(Violation::Latitude(c.lat))
}

fn check_longitude(draft: &IncidentDraft) -> Option<Violation> {
    let c = draft.coordinates?;
    (!c.has_valid_lon()).then_some(Violation::Longitude(c.lon))
}

fn check_presence(draft: &IncidentDraft) -> Option<Violation> {
    let required = draft.location != Location::Transportation;
    (required && draft.coordinates.is_none()).then_some(Violation::MissingCoordinates)
}

const CHECKS: [Check; 4] = [check_description, check_presence, check_latitude, check_longitude];

/// Run every check against `draft`.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing each failed check.
pub fn validate(draft: &IncidentDraft) -> Result<(), ValidationError> {
    let violations: Vec<Violation> = CHECKS.iter().filter_map(|check| check(draft)).collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Coordinates;

    fn draft() -> IncidentDraft {
        IncidentDraft {
            description: "bike stolen outside the library".to_owned(),
            coordinates: Some(Coordinates::new(53.3438, -6.2546)),
            ..IncidentDraft::default()
        }
    }

    #[test]
    fn complete_draft_passes() {
        assert!(validate(&draft()).is_ok());
    }

    #[test]
    fn blank_description_is_rejected() {
        let d = IncidentDraft { description: "   ".to_owned(), ..draft() };
        let err = validate(&d).unwrap_err();
        assert_eq!(err.violations(), [Violation::MissingDescription]);
    }

    #[test]
    fn fixed_place_needs_coordinates() {
        let d = IncidentDraft { coordinates: None, ..draft() };
        let err = validate(&d).unwrap_err();
        assert_eq!(err.violations(), [Violation::MissingCoordinates]);
    }

    #[test]
    fn transportation_may_omit_coordinates() {
        let d = IncidentDraft { coordinates: None, location: Location::Transportation, ..draft() };
        assert!(validate(&d).is_ok());
    }

    #[test]
    fn transportation_coordinates_are_still_checked() {
        let d = IncidentDraft {
            coordinates: Some(Coordinates::new(91.0, 0.0)),
            location: Location::Transportation,
            ..draft()
        };
        let err = validate(&d).unwrap_err();
        assert_eq!(err.violations(), [Violation::Latitude(91.0)]);
    }

    #[test]
    fn all_violations_are_joined() {
        let d = IncidentDraft {
            description: String::new(),
            coordinates: Some(Coordinates::new(-100.0, 200.0)),
            ..IncidentDraft::default()
        };
        let err = validate(&d).unwrap_err();
        assert_eq!(
            err.violations(),
            [Violation::MissingDescription, Violation::Latitude(-100.0), Violation::Longitude(200.0)]
        );
        assert_eq!(
            err.to_string(),
            "missing description; latitude -100 must be between -90 and 90; \
             longitude 200 must be between -180 and 180"
        );
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        let d = IncidentDraft { coordinates: Some(Coordinates::new(f64::NAN, 0.0)), ..draft() };
        let err = validate(&d).unwrap_err();
        assert!(matches!(err.violations(), [Violation::Latitude(v)] if v.is_nan()));
    }
}
