// 🌍 Country Index - Country name / ISO code → representative coordinate
//
// Built once from a boundary-geometry feature collection, read-only afterwards.
// Name, alpha-2 and alpha-3 keys all point at the same coordinate.
//
// Coordinate choice:
// 1. Manual override table (antimeridian crossings, dispersed territories)
// 2. Midpoint of the geometry's axis-aligned bounding box
// Features with neither are skipped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::COORDINATE_OVERRIDES;
use crate::normalize::{normalize_key, normalize_value};

const ALPHA2_PROPERTY: &str = "ISO3166-1-Alpha-2";
const ALPHA3_PROPERTY: &str = "ISO3166-1-Alpha-3";

// ============================================================================
// COORDINATE
// ============================================================================

/// Geographic point; serialized as `[lon, lat]` like GeoJSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Coordinate { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Coordinate { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

// ============================================================================
// BOUNDING BOX
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
}

impl Bounds {
    fn empty() -> Self {
        Bounds {
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Visit every `[lon, lat]` pair at any nesting depth (Polygon, MultiPolygon, ...)
    fn visit(&mut self, coords: &Value) {
        let Value::Array(items) = coords else {
            return;
        };

        if let [Value::Number(lon), Value::Number(lat)] = items.as_slice() {
            if let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) {
                self.extend(lon, lat);
            }
            return;
        }

        for item in items {
            self.visit(item);
        }
    }

    fn midpoint(&self) -> Option<Coordinate> {
        let center = Coordinate::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        );
        center.is_finite().then_some(center)
    }
}

/// Midpoint of a geometry's bounding box, `None` for empty/malformed geometry
pub fn geometry_midpoint(geometry: &Value) -> Option<Coordinate> {
    let mut bounds = Bounds::empty();
    bounds.visit(geometry.get("coordinates").unwrap_or(&Value::Null));
    bounds.midpoint()
}

// ============================================================================
// COUNTRY INDEX
// ============================================================================

/// Immutable lookup from normalized country name / ISO code to coordinate
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    entries: HashMap<String, Coordinate>,
    digest: String,
}

impl CountryIndex {
    /// Index with no entries (dataset failed to load)
    pub fn empty() -> Self {
        CountryIndex::from_entries(HashMap::new())
    }

    /// Build from a GeoJSON feature collection using the built-in override table
    pub fn build(dataset: &Value) -> Self {
        CountryIndex::build_with_overrides(dataset, &BTreeMap::new())
    }

    /// Build with extra manual overrides (keyed by country name, any casing)
    ///
    /// Extra overrides take precedence over the built-in table.
    pub fn build_with_overrides(dataset: &Value, extra: &BTreeMap<String, Coordinate>) -> Self {
        let mut overrides: HashMap<String, Coordinate> = COORDINATE_OVERRIDES
            .iter()
            .map(|(name, pair)| (name.to_string(), Coordinate::from(*pair)))
            .collect();
        for (name, coordinate) in extra {
            overrides.insert(normalize_key(name), *coordinate);
        }

        let Some(features) = dataset.get("features").and_then(Value::as_array) else {
            warn!("Boundary dataset has no features array - country index is empty");
            return CountryIndex::empty();
        };

        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for feature in features {
            let properties = feature.get("properties").unwrap_or(&Value::Null);
            let name = properties.get("name").map(normalize_value).unwrap_or_default();

            let override_coordinate = if name.is_empty() {
                None
            } else {
                overrides.get(&name).copied().filter(Coordinate::is_finite)
            };

            let coordinate = match override_coordinate {
                Some(c) => c,
                None => match geometry_midpoint(feature.get("geometry").unwrap_or(&Value::Null)) {
                    Some(c) => c,
                    None => {
                        skipped += 1;
                        debug!("Skipping feature without usable geometry: {:?}", name);
                        continue;
                    }
                },
            };

            let keys = [
                name,
                properties.get(ALPHA2_PROPERTY).map(normalize_value).unwrap_or_default(),
                properties.get(ALPHA3_PROPERTY).map(normalize_value).unwrap_or_default(),
            ];
            for key in keys {
                if !key.is_empty() {
                    entries.insert(key, coordinate);
                }
            }
        }

        info!(
            "Country index built - features={}, keys={}, skipped={}",
            features.len(),
            entries.len(),
            skipped
        );

        CountryIndex::from_entries(entries)
    }

    /// Load a GeoJSON file from disk
    pub fn from_file<P: AsRef<Path>>(path: P, extra: &BTreeMap<String, Coordinate>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read boundary dataset: {:?}", path.as_ref()))?;

        let dataset: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse boundary dataset: {:?}", path.as_ref()))?;

        Ok(CountryIndex::build_with_overrides(&dataset, extra))
    }

    /// Load from disk, falling back to an empty index on any error
    ///
    /// An empty index resolves nothing, so the map renders its empty state.
    pub fn load_or_empty<P: AsRef<Path>>(path: P, extra: &BTreeMap<String, Coordinate>) -> Self {
        match CountryIndex::from_file(path, extra) {
            Ok(index) => index,
            Err(e) => {
                warn!("Country index unavailable, using empty index: {:#}", e);
                CountryIndex::empty()
            }
        }
    }

    fn from_entries(entries: HashMap<String, Coordinate>) -> Self {
        let digest = compute_digest(&entries);
        CountryIndex { entries, digest }
    }

    /// Coordinate for an already-normalized key
    pub fn get(&self, key: &str) -> Option<Coordinate> {
        self.entries.get(key).copied()
    }

    /// Normalize `raw` then look it up
    pub fn lookup(&self, raw: &str) -> Option<Coordinate> {
        self.get(&normalize_key(raw))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content fingerprint; equal for indexes with identical entries
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

fn compute_digest(entries: &HashMap<String, Coordinate>) -> String {
    let sorted: BTreeMap<&String, &Coordinate> = entries.iter().collect();

    let mut hasher = Sha256::new();
    for (key, coordinate) in sorted {
        hasher.update(format!("{}={},{};", key, coordinate.lon, coordinate.lat));
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
