// Rust guideline compliant 2026-10-14

//! Coarse rectangular query buckets and the privacy gate in front of every
//! region-scoped read.
//!
//! Edges are integers in hundredths of a degree, so the size check is exact.
//! A region may span at most [`REGION_INCREMENT`] units per axis; repeated
//! narrow queries therefore cannot pin down where a reporter stood.

use crate::Coordinates;

/// Maximum extent of a region per axis, in hundredths of a degree
/// (one unit is about 1.11 km at the equator).
pub const REGION_INCREMENT: i32 = 1;

/// Number of region units per degree.
pub const UNITS_PER_DEGREE: f64 = 100.0;

/// Largest valid latitude, in region units.
pub const MAX_LAT_UNITS: i32 = 9_000;
/// Largest valid longitude, in region units.
pub const MAX_LON_UNITS: i32 = 18_000;
// Absorbs float noise when scaling degrees to units at the box edge.
const EDGE_TOLERANCE: f64 = 1e-9;

/// One edge of a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    North,
    South,
    East,
    West,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        })
    }
}

/// Axis along which a region extent is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NorthSouth => "north-south",
            Self::EastWest => "east-west",
        })
    }
}

fn degrees(units: i32) -> f64 {
    f64::from(units) / UNITS_PER_DEGREE
}

/// Reasons a region is rejected. Deltas and values are in region units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// An edge lies outside valid Earth coordinates.
    #[error("{edge} ({:.2}): not a valid earth coordinate", degrees(*value))]
    OutOfBounds { edge: Edge, value: i32 },
    /// North is below south, or east is below west. `delta` is negative.
    #[error("{axis} ({:.2}): invalid bounds", degrees(*delta))]
    InvalidBounds { axis: Axis, delta: i32 },
    /// The region is larger than [`REGION_INCREMENT`] along `axis`.
    #[error("{axis} ({:.2}): region is too big", degrees(*delta))]
    TooBig { axis: Axis, delta: i32 },
}

impl RegionError {
    /// The signed delta carried by bound and size errors, in degrees.
    #[must_use]
    pub fn delta_degrees(&self) -> Option<f64> {
        match self {
            Self::OutOfBounds { .. } => None,
            Self::InvalidBounds { delta, .. } | Self::TooBig { delta, .. } => Some(degrees(*delta)),
        }
    }
}

/// An unvalidated bounding box, edges in hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub north: i32,
    pub south: i32,
    pub east: i32,
    pub west: i32,
}

impl Region {
    /// Build a region from edges in hundredths of a degree.
    #[must_use]
    pub fn new(north: i32, south: i32, east: i32, west: i32) -> Self {
        Self { north, south, east, west }
    }

    /// Check the region against Earth bounds, edge ordering, and the size cap.
    ///
    /// Fail-fast: the first violation, in that order, is returned.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`], [`RegionError::InvalidBounds`],
    /// or [`RegionError::TooBig`].
    pub fn validate(self) -> Result<ValidRegion, RegionError> {
        for (edge, value, max) in [
            (Edge::North, self.north, MAX_LAT_UNITS),
            (Edge::South, self.south, MAX_LAT_UNITS),
            (Edge::East, self.east, MAX_LON_UNITS),
            (Edge::West, self.west, MAX_LON_UNITS),
        ] {
            if !(-max..=max).contains(&value) {
                return Err(RegionError::OutOfBounds { edge, value });
            }
        }

        let ns = self.north - self.south;
        if ns < 0 {
            return Err(RegionError::InvalidBounds { axis: Axis::NorthSouth, delta: ns });
        }
        let ew = self.east - self.west;
        if ew < 0 {
            return Err(RegionError::InvalidBounds { axis: Axis::EastWest, delta: ew });
        }

        if ns > REGION_INCREMENT {
            return Err(RegionError::TooBig { axis: Axis::NorthSouth, delta: ns });
        }
        if ew > REGION_INCREMENT {
            return Err(RegionError::TooBig { axis: Axis::EastWest, delta: ew });
        }

        Ok(ValidRegion(self))
    }
}

/// A region that passed [`Region::validate`].
///
/// Only constructible through validation, so every region-scoped database
/// read is gated by the privacy check at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidRegion(Region);

impl ValidRegion {
    /// The underlying edges.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.0
    }

    /// `true` when `coordinates` lie inside the closed box.
    #[must_use]
    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        let r = &self.0;
        let lat = coordinates.lat * UNITS_PER_DEGREE;
        let lon = coordinates.lon * UNITS_PER_DEGREE;
        f64::from(r.south) - EDGE_TOLERANCE <= lat
            && lat <= f64::from(r.north) + EDGE_TOLERANCE
            && f64::from(r.west) - EDGE_TOLERANCE <= lon
            && lon <= f64::from(r.east) + EDGE_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_region_is_valid() {
        let region = Region::new(5335, 5334, -629, -630);
        assert!(region.validate().is_ok());
    }

    #[test]
    fn degenerate_point_region_is_valid() {
        assert!(Region::new(5334, 5334, -630, -630).validate().is_ok());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "correctly rounded division of integer units")]
    fn inverted_north_south_is_invalid_bounds() {
        let err = Region::new(5334, 5335, -629, -630).validate().unwrap_err();
        assert_eq!(err, RegionError::InvalidBounds { axis: Axis::NorthSouth, delta: -1 });
        assert_eq!(err.delta_degrees(), Some(-0.01));
    }

    #[test]
    fn inverted_east_west_is_invalid_bounds() {
        let err = Region::new(5335, 5334, -630, -629).validate().unwrap_err();
        assert_eq!(err, RegionError::InvalidBounds { axis: Axis::EastWest, delta: -1 });
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact integer-valued result")]
    fn whole_degree_is_too_big() {
        let err = Region::new(5300, 5200, -629, -630).validate().unwrap_err();
        assert_eq!(err, RegionError::TooBig { axis: Axis::NorthSouth, delta: 100 });
        assert_eq!(err.delta_degrees(), Some(1.0));
    }

    #[test]
    fn wide_east_west_is_too_big() {
        let err = Region::new(5335, 5334, -600, -630).validate().unwrap_err();
        assert_eq!(err, RegionError::TooBig { axis: Axis::EastWest, delta: 30 });
    }

    #[test]
    fn out_of_earth_edges_are_rejected() {
        let cases = [
            (Region::new(9001, 9000, 0, 0), Edge::North),
            (Region::new(0, -9001, 0, 0), Edge::South),
            (Region::new(0, 0, 18001, 18000), Edge::East),
            (Region::new(0, 0, 0, -18001), Edge::West),
        ];
        for (region, edge) in cases {
            assert!(
                matches!(region.validate(), Err(RegionError::OutOfBounds { edge: e, .. }) if e == edge),
                "{region:?} must fail on {edge}"
            );
        }
    }

    #[test]
    fn bounds_checked_before_ordering() {
        // Out of bounds and inverted: the bounds violation wins.
        let err = Region::new(-9500, 0, 0, 0).validate().unwrap_err();
        assert!(matches!(err, RegionError::OutOfBounds { edge: Edge::North, .. }));
    }

    #[test]
    fn contains_is_closed_box() {
        let region = Region::new(5335, 5334, -629, -630).validate().unwrap();
        assert!(region.contains(&Coordinates::new(53.345, -6.295)));
        assert!(region.contains(&Coordinates::new(53.35, -6.30)));
        assert!(!region.contains(&Coordinates::new(53.36, -6.295)));
        assert!(!region.contains(&Coordinates::new(53.345, -6.31)));
    }

    #[test]
    fn error_display_uses_degrees() {
        let err = RegionError::TooBig { axis: Axis::NorthSouth, delta: 100 };
        assert_eq!(err.to_string(), "north-south (1.00): region is too big");
    }
}
