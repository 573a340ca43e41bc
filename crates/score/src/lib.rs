// Rust guideline compliant 2026-10-15

//! Safety score for an arbitrary coordinate, derived from the crime history
//! of the nearest stations.
//!
//! The score ranges from 1 (safest station in the catalog) to 5 (most
//! dangerous). It is a calibration heuristic: planar distances, equal
//! category weights, and a static reference year.
//!
//! Entry points: [`ScoreEngine::score`], [`ScoreEngine::score_address`].
//! Configuration via [`ScoreConfig::builder`].

use domain::Coordinates;
use stations::{AddressResolver, Catalog, SeverityExtremes, YearWindow};

/// Score returned when the catalog cannot discriminate between stations.
pub const MIDPOINT_SCORE: f64 = 3.0;

const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 5.0;

// ---------------------------------------------------------------------------
// ScoreError
// ---------------------------------------------------------------------------

/// Errors that can occur while building or querying a [`ScoreEngine`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// The supplied configuration is invalid.
    #[error("invalid score configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The catalog holds no stations.
    #[error("station catalog is empty")]
    EmptyCatalog,
    /// The query point is not a valid Earth coordinate.
    #[error("invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },
    /// No known prefix matches the searched address.
    #[error("unable to resolve address {address:?}")]
    UnresolvedAddress { address: String },
}

/// Score of a searched address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressScore {
    /// Approximate name of the matched area.
    pub name: String,
    pub coordinates: Coordinates,
    pub score: f64,
    /// `score` rounded to the nearest whole step.
    pub rounded: u8,
}

// ---------------------------------------------------------------------------
// ScoreConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`ScoreEngine`].
///
/// Construct via [`ScoreConfig::builder`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreConfig {
    /// How many nearby stations are averaged.
    pub nearest: usize,
    /// Trailing averaging window.
    pub window: YearWindow,
    /// Stations with severity below this are excluded from the min/max calibration.
    pub noise_floor: f64,
}

/// Builder for [`ScoreConfig`].
///
/// Obtain via [`ScoreConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ScoreConfigBuilder {
    nearest: usize,
    years: u32,
    reference_year: i32,
    noise_floor: f64,
}

impl ScoreConfig {
    /// Create a builder.
    ///
    /// Default values: `nearest = 3`, `years = 5`, `reference_year = 2016`,
    /// `noise_floor = 0.01`.
    #[must_use]
    pub fn builder() -> ScoreConfigBuilder {
        ScoreConfigBuilder {
            nearest: 3,
            years: 5,
            // The published station statistics end in 2015.
            reference_year: 2016,
            noise_floor: 0.01,
        }
    }
}

impl ScoreConfigBuilder {
    /// Number of nearby stations to average.
    #[must_use]
    pub fn nearest(mut self, nearest: usize) -> Self {
        self.nearest = nearest;
        self
    }

    /// Length of the trailing window in years.
    #[must_use]
    pub fn years(mut self, years: u32) -> Self {
        self.years = years;
        self
    }

    /// First year after the averaging window.
    #[must_use]
    pub fn reference_year(mut self, reference_year: i32) -> Self {
        self.reference_year = reference_year;
        self
    }

    /// Severity below which a station counts as missing data.
    #[must_use]
    pub fn noise_floor(mut self, noise_floor: f64) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidConfig`] when `nearest` or `years` is zero,
    /// or the noise floor is negative or not finite.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ScoreConfig, ScoreError> {
        if self.nearest == 0 {
            return Err(ScoreError::InvalidConfig { reason: "nearest must be >= 1".to_owned() });
        }
        if self.years == 0 {
            return Err(ScoreError::InvalidConfig { reason: "years must be >= 1".to_owned() });
        }
        if !self.noise_floor.is_finite() || self.noise_floor < 0.0 {
            return Err(ScoreError::InvalidConfig {
                reason: "noise_floor must be a finite value >= 0".to_owned(),
            });
        }
        Ok(ScoreConfig {
            nearest: self.nearest,
            window: YearWindow { years: self.years, reference_year: self.reference_year },
            noise_floor: self.noise_floor,
        })
    }
}

// ---------------------------------------------------------------------------
// ScoreEngine
// ---------------------------------------------------------------------------

/// Computes 1-5 safety scores against an owned, immutable [`Catalog`].
///
/// Calibration extremes are computed once at construction.
#[derive(Debug)]
pub struct ScoreEngine {
    catalog: Catalog,
    config: ScoreConfig,
    extremes: Option<SeverityExtremes>,
}

impl ScoreEngine {
    /// Build an engine and calibrate it against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::EmptyCatalog`] when `catalog` has no stations.
    pub fn new(catalog: Catalog, config: ScoreConfig) -> Result<Self, ScoreError> {
        if catalog.is_empty() {
            return Err(ScoreError::EmptyCatalog);
        }
        let extremes = catalog.severity_extremes(config.window, config.noise_floor);
        if extremes.is_none() {
            tracing::warn!("score.calibration.degenerate: no station above the noise floor");
        }
        Ok(Self { catalog, config, extremes })
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Mean severity of the stations nearest to `point`.
    fn nearby_severity(&self, point: Coordinates) -> f64 {
        let nearest = self.catalog.nearest(point, self.config.nearest);
        let sum: f64 = nearest.iter().map(|s| s.severity(self.config.window)).sum();
        #[expect(clippy::cast_precision_loss, reason = "station counts are tiny")]
        let n = nearest.len() as f64;
        sum / n
    }

    /// Safety score for (`lat`, `lon`) in `[1, 5]`, where 1 is safest.
    ///
    /// Linearly maps the mean severity of the nearest stations between the
    /// catalog's safest and most dangerous station, clamped to the range.
    /// Returns [`MIDPOINT_SCORE`] when every calibrated station has the same
    /// severity.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidCoordinates`] for NaN or off-planet input.
    pub fn score(&self, lat: f64, lon: f64) -> Result<f64, ScoreError> {
        let point = Coordinates::new(lat, lon);
        if !point.is_on_earth() {
            return Err(ScoreError::InvalidCoordinates { lat, lon });
        }

        let Some(SeverityExtremes { min, max }) = self.extremes else {
            return Ok(MIDPOINT_SCORE);
        };
        if (max - min).abs() < f64::EPSILON {
            return Ok(MIDPOINT_SCORE);
        }

        let avg = self.nearby_severity(point);
        let score = MIN_SCORE + (avg - min) / (max - min) * (MAX_SCORE - MIN_SCORE);
        tracing::debug!(lat, lon, avg, score, "score.computed");
        Ok(score.clamp(MIN_SCORE, MAX_SCORE))
    }

    /// Resolve `address` and score the matched area.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::UnresolvedAddress`] when `resolver` knows no
    /// prefix of `address`, otherwise as [`score`](Self::score).
    pub fn score_address(
        &self,
        resolver: &AddressResolver,
        address: &str,
    ) -> Result<AddressScore, ScoreError> {
        let resolved = resolver
            .resolve(address)
            .ok_or_else(|| ScoreError::UnresolvedAddress { address: address.to_owned() })?;
        let Coordinates { lat, lon } = resolved.coordinates;
        let score = self.score(lat, lon)?;
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "score is clamped to 1..=5"
        )]
        let rounded = score.round() as u8;
        tracing::debug!(address, name = %resolved.name, score, "score.address");
        Ok(AddressScore { name: resolved.name, coordinates: resolved.coordinates, score, rounded })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
