// Rust guideline compliant 2026-10-15

//! Rough address resolution from well known prefixes.
//!
//! Maps an eircode routing key (`D02`) or a place name (`Dublin 2`) at the
//! start of a free-text address to a representative coordinate. Good enough
//! to feed the safety score; not a geocoder.

use std::io::Read;
use std::path::Path;

use domain::Coordinates;

use crate::CatalogError;

/// One row of the prefixes dataset: `prefix,names,lat,lon`, where `names`
/// lists the areas covered separated by `|`.
#[derive(Debug, serde::Deserialize)]
struct PrefixRecord {
    prefix: String,
    names: String,
    lat: f64,
    lon: f64,
}

/// Outcome of a successful [`AddressResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAddress {
    /// Areas covered by the matched prefix, marked as approximate (`~ Ranelagh, Dublin 6`).
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone)]
struct Prefix {
    key: String,
    names: Vec<String>,
    coordinates: Coordinates,
}

/// Prefix table, longest prefix first.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    prefixes: Vec<Prefix>,
}

/// Lowercase with runs of whitespace collapsed to one space.
fn normalise(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl AddressResolver {
    /// Build a resolver from a CSV reader with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Csv`] on malformed rows, or
    /// [`CatalogError::InvalidCoordinates`] for off-planet entries.
    pub fn load<R: Read>(prefixes: R) -> Result<Self, CatalogError> {
        let mut table = Vec::new();
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(prefixes);
        for row in reader.deserialize() {
            let PrefixRecord { prefix, names, lat, lon } = row?;
            let coordinates = Coordinates::new(lat, lon);
            if !coordinates.is_on_earth() {
                return Err(CatalogError::InvalidCoordinates { name: prefix, lat, lon });
            }
            let key = normalise(&prefix);
            if key.is_empty() {
                tracing::warn!(names = %names, "address.load.empty_prefix: skipping");
                continue;
            }
            let names = names.split('|').map(str::trim).map(str::to_owned).collect();
            table.push(Prefix { key, names, coordinates });
        }
        // Longest first so "dublin 15" wins over "dublin 1".
        table.sort_by(|a, b| b.key.len().cmp(&a.key.len()).then_with(|| a.key.cmp(&b.key)));

        tracing::info!(prefixes = table.len(), "address.load.done");
        Ok(Self { prefixes: table })
    }

    /// Open and load a prefixes file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Open`] if the file is missing, otherwise as
    /// [`load`](Self::load).
    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::load(file)
    }

    /// Resolve `address` by its longest known prefix.
    ///
    /// Matching ignores case, surrounding whitespace and repeated inner
    /// whitespace. Returns `None` when no prefix matches.
    #[must_use]
    pub fn resolve(&self, address: &str) -> Option<ResolvedAddress> {
        let address = normalise(address);
        if address.is_empty() {
            return None;
        }
        let found = self.prefixes.iter().find(|p| address.starts_with(&p.key))?;
        Some(ResolvedAddress {
            name: format!("~ {}", found.names.join(", ")),
            coordinates: found.coordinates,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
