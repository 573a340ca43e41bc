// Rust guideline compliant 2026-10-15

//! A single reference station and its historical crime statistics.

use std::collections::BTreeMap;

use domain::Coordinates;

/// Crime counts keyed by year.
pub type CrimesInYear = BTreeMap<i32, u64>;

/// Crime counts keyed by category name, then year.
pub type CrimesPerType = BTreeMap<String, CrimesInYear>;

/// Categories that contribute to a station's severity, with equal weight.
pub const WEIGHTED_CATEGORIES: [&str; 4] = ["violent_crime", "burglary", "theft", "robbery"];

/// Trailing window of whole years used to average crime counts.
///
/// Covers the `years` years strictly before `reference_year`. The reference
/// year is configuration rather than the wall clock because the source data
/// stops at a fixed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    /// Window length; must be at least 1.
    pub years: u32,
    /// First year after the window.
    pub reference_year: i32,
}

impl YearWindow {
    /// First year inside the window.
    #[must_use]
    pub fn first_year(&self) -> i32 {
        self.reference_year.saturating_sub_unsigned(self.years)
    }
}

/// A police station with a location and per-category yearly crime counts.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    name: String,
    coordinates: Coordinates,
    crimes: CrimesPerType,
}

impl Station {
    /// Create a station with no crime data.
    #[must_use]
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self { name: name.into(), coordinates, crimes: CrimesPerType::new() }
    }

    /// Attach crime counts, replacing any present.
    #[must_use]
    pub fn with_crimes(mut self, crimes: CrimesPerType) -> Self {
        self.crimes = crimes;
        self
    }

    /// Add `count` crimes of `category` in `year` to the existing tally.
    pub fn record(&mut self, category: &str, year: i32, count: u64) {
        *self
            .crimes
            .entry(category.to_owned())
            .or_default()
            .entry(year)
            .or_default() += count;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    #[must_use]
    pub fn crimes(&self) -> &CrimesPerType {
        &self.crimes
    }

    /// Planar Euclidean distance in degrees.
    ///
    /// Treats latitude and longitude as a flat grid. Good enough to rank
    /// stations within one country; not a geodesic distance.
    #[must_use]
    pub fn distance_to(&self, point: Coordinates) -> f64 {
        let d_lat = self.coordinates.lat - point.lat;
        let d_lon = self.coordinates.lon - point.lon;
        d_lat.hypot(d_lon)
    }

    /// Average yearly count of `category` over `window`. Missing years count as zero.
    #[must_use]
    pub fn category_average(&self, category: &str, window: YearWindow) -> f64 {
        let Some(by_year) = self.crimes.get(category) else {
            return 0.0;
        };
        let total: u64 = by_year
            .range(window.first_year()..window.reference_year)
            .map(|(_, count)| *count)
            .sum();
        #[expect(clippy::cast_precision_loss, reason = "yearly crime totals stay far below 2^52")]
        let total = total as f64;
        total / f64::from(window.years)
    }

    /// Mean of the weighted category averages over `window`.
    #[must_use]
    pub fn severity(&self, window: YearWindow) -> f64 {
        let sum: f64 = WEIGHTED_CATEGORIES
            .iter()
            .map(|category| self.category_average(category, window))
            .sum();
        #[expect(clippy::cast_precision_loss, reason = "fixed four-element array")]
        let n = WEIGHTED_CATEGORIES.len() as f64;
        sum / n
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
