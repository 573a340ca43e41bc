// Rust guideline compliant 2026-10-15

//! Station catalog -- static reference data used by the safety score.
//!
//! [`Catalog::load`] joins two independently keyed CSV datasets by station
//! name: station locations and yearly crime counts. The catalog is immutable
//! after loading and is shared by reference; concurrent reads need no locking.
//!
//! Crime records naming a station without a location are skipped and logged
//! at `warn`.
//!
//! [`AddressResolver`] turns a rough address into coordinates the score can
//! be computed for.

mod address;
mod station;

pub use address::{AddressResolver, ResolvedAddress};
pub use station::{CrimesInYear, CrimesPerType, Station, WEIGHTED_CATEGORIES, YearWindow};

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use domain::Coordinates;

// ---------------------------------------------------------------------------
// CatalogError
// ---------------------------------------------------------------------------

/// Errors that can occur while loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A data file could not be opened.
    #[error("unable to open {path}: {source}")]
    Open {
        /// File that failed to open.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// A CSV row could not be parsed.
    #[error("unable to parse station data: {0}")]
    Csv(#[from] csv::Error),
    /// A station location lies outside valid Earth coordinates.
    #[error("station {name:?} has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates {
        /// Station name.
        name: String,
        lat: f64,
        lon: f64,
    },
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

/// One row of the locations dataset: `name,lat,lon`.
#[derive(Debug, serde::Deserialize)]
struct LocationRecord {
    name: String,
    lat: f64,
    lon: f64,
}

/// One row of the crimes dataset: `station,category,year,count`.
#[derive(Debug, serde::Deserialize)]
struct CrimeRecord {
    station: String,
    category: String,
    year: i32,
    count: u64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Severity of the safest and the most dangerous station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityExtremes {
    pub min: f64,
    pub max: f64,
}

/// Immutable mapping from station name to [`Station`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stations: BTreeMap<String, Station>,
}

impl Catalog {
    /// Build a catalog from CSV readers for locations and crime counts.
    ///
    /// Both inputs must carry a header row. Duplicate crime rows for the same
    /// station, category, and year are summed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Csv`] on malformed rows, or
    /// [`CatalogError::InvalidCoordinates`] for off-planet locations.
    pub fn load<L: Read, C: Read>(locations: L, crimes: C) -> Result<Self, CatalogError> {
        let mut stations = BTreeMap::new();

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(locations);
        for row in reader.deserialize() {
            let LocationRecord { name, lat, lon } = row?;
            let coordinates = Coordinates::new(lat, lon);
            if !coordinates.is_on_earth() {
                return Err(CatalogError::InvalidCoordinates { name, lat, lon });
            }
            stations.insert(name.clone(), Station::new(name, coordinates));
        }

        let mut skipped = 0usize;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(crimes);
        for row in reader.deserialize() {
            let record: CrimeRecord = row?;
            match stations.get_mut(&record.station) {
                Some(station) => station.record(&record.category, record.year, record.count),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        station = %record.station,
                        "catalog.load.no_coordinates: skipping"
                    );
                }
            }
        }

        tracing::info!(stations = stations.len(), skipped, "catalog.load.done");
        Ok(Self { stations })
    }

    /// Open and load the two CSV files.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Open`] if either file is missing, otherwise as
    /// [`load`](Self::load).
    pub fn load_files(locations: &Path, crimes: &Path) -> Result<Self, CatalogError> {
        let open = |path: &Path| {
            std::fs::File::open(path).map_err(|source| CatalogError::Open {
                path: path.display().to_string(),
                source,
            })
        };
        Self::load(open(locations)?, open(crimes)?)
    }

    /// Build a catalog from already constructed stations. Later duplicates win.
    #[must_use]
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        Self {
            stations: stations.into_iter().map(|s| (s.name().to_owned(), s)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All stations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// The `n` stations closest to `point` by planar distance, nearest first.
    ///
    /// Returns every station when fewer than `n` exist. Ties keep name order.
    #[must_use]
    pub fn nearest(&self, point: Coordinates, n: usize) -> Vec<&Station> {
        let mut by_distance: Vec<(f64, &Station)> =
            self.stations.values().map(|s| (s.distance_to(point), s)).collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        by_distance.into_iter().take(n).map(|(_, s)| s).collect()
    }

    /// Lowest and highest station severity over `window`.
    ///
    /// Stations scoring below `epsilon` are treated as missing data and
    /// excluded. Returns `None` when no station remains.
    #[must_use]
    pub fn severity_extremes(&self, window: YearWindow, epsilon: f64) -> Option<SeverityExtremes> {
        let mut safest: Option<(&Station, f64)> = None;
        let mut worst: Option<(&Station, f64)> = None;

        for station in self.stations.values() {
            let severity = station.severity(window);
            if severity < epsilon {
                continue;
            }
            if safest.is_none_or(|(_, min)| severity < min) {
                safest = Some((station, severity));
            }
            if worst.is_none_or(|(_, max)| severity > max) {
                worst = Some((station, severity));
            }
        }

        let ((safe, min), (danger, max)) = (safest?, worst?);
        tracing::info!(
            safest = %safe,
            min,
            most_dangerous = %danger,
            max,
            "catalog.severity_extremes"
        );
        Some(SeverityExtremes { min, max })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
