// 📍 Marker Aggregator - Stories / top locations → weighted map markers
//
// Counting:
//   topLocations (when non-empty) are authoritative; otherwise each story adds 1
//   to its FIRST tagged location only.
//
// Coordinate resolution, first hit wins:
//   1. override keyed by the display name ("Berlin")
//   2. override keyed by the normalized key ("berlin")
//   3. override keyed by the alias-resolved name
//   4. override keyed by the normalized alias
//   5. any override whose normalized key equals the key or the alias ("BERLIN")
//   6. country index lookup by normalized alias
// Locations that resolve nowhere are dropped, never given a default coordinate.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::constants::location_alias;
use crate::country_index::{Coordinate, CountryIndex};
use crate::models::{lenient_list, Story, TopLocation};
use crate::normalize::normalize_key;

/// Caller-supplied coordinates that beat anything computed
pub type LocationOverrides = BTreeMap<String, Coordinate>;

const MIN_RADIUS: f64 = 3.0;
const MAX_RADIUS: f64 = 14.0;
const RADIUS_PER_STORY: f64 = 1.2;

// ============================================================================
// MARKER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Normalized location key
    pub key: String,

    /// Display name (first spelling seen)
    pub name: String,

    pub lat: f64,
    pub lon: f64,

    /// Stories (or upstream count) at this location, ≥ 1
    pub count: u32,

    /// Render radius, bounded so busy locations never dominate the map
    pub radius: f64,
}

/// `min(14, 3 + count * 1.2)`
pub fn marker_radius(count: u32) -> f64 {
    (MIN_RADIUS + count as f64 * RADIUS_PER_STORY).min(MAX_RADIUS)
}

// ============================================================================
// REQUEST
// ============================================================================

/// Inputs of one marker computation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerRequest {
    #[serde(default, deserialize_with = "lenient_list")]
    pub stories: Vec<Story>,

    #[serde(
        default,
        rename = "topLocations",
        alias = "top_locations",
        deserialize_with = "lenient_list"
    )]
    pub top_locations: Vec<TopLocation>,

    #[serde(
        default,
        rename = "locationOverrides",
        alias = "location_overrides",
        deserialize_with = "lenient_overrides"
    )]
    pub location_overrides: LocationOverrides,
}

/// Override map keeping the entries whose value is a `[lon, lat]` pair
fn lenient_overrides<'de, D>(deserializer: D) -> Result<LocationOverrides, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries,
        _ => return Ok(LocationOverrides::new()),
    };

    Ok(entries
        .into_iter()
        .filter_map(|(name, value)| {
            let coordinate: Coordinate = serde_json::from_value(value).ok()?;
            Some((name, coordinate))
        })
        .collect())
}

impl MarkerRequest {
    pub fn from_stories(stories: Vec<Story>) -> Self {
        MarkerRequest {
            stories,
            ..Default::default()
        }
    }

    pub fn with_top_locations(mut self, top_locations: Vec<TopLocation>) -> Self {
        self.top_locations = top_locations;
        self
    }

    pub fn with_overrides(mut self, overrides: LocationOverrides) -> Self {
        self.location_overrides = overrides;
        self
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregated count for one location before coordinate resolution
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCount {
    pub key: String,
    pub name: String,
    pub count: f64,
}

/// Tally counts per normalized key, preserving first-seen order
pub fn aggregate_location_counts(stories: &[Story], top_locations: &[TopLocation]) -> Vec<LocationCount> {
    let mut tallies: Vec<LocationCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let mut add = |name: &str, amount: f64| {
        let key = normalize_key(name);
        match positions.get(&key) {
            Some(&i) => tallies[i].count += amount,
            None => {
                positions.insert(key.clone(), tallies.len());
                tallies.push(LocationCount {
                    key,
                    name: name.to_string(),
                    count: amount,
                });
            }
        }
    };

    if !top_locations.is_empty() {
        for entry in top_locations {
            let name = entry.name.as_deref().map(str::trim).unwrap_or("");
            if name.is_empty() {
                continue;
            }
            match entry.count {
                Some(count) if count.is_finite() && count > 0.0 => add(name, count),
                _ => continue,
            }
        }
    } else {
        for story in stories {
            if let Some(name) = story.primary().and_then(|l| l.name()) {
                add(name, 1.0);
            }
        }
    }

    tallies
}

/// Caller overrides, by exact spelling and by normalized key
struct OverrideLookup<'a> {
    exact: &'a LocationOverrides,
    normalized: HashMap<String, Coordinate>,
}

impl<'a> OverrideLookup<'a> {
    fn new(exact: &'a LocationOverrides) -> Self {
        let mut normalized = HashMap::new();
        for (name, coordinate) in exact.iter().filter(|(_, c)| c.is_finite()) {
            normalized.entry(normalize_key(name)).or_insert(*coordinate);
        }
        OverrideLookup { exact, normalized }
    }

    fn resolve(&self, location: &LocationCount, index: &CountryIndex) -> Option<Coordinate> {
        let alias = location_alias(&location.key).unwrap_or(location.key.as_str());
        let normalized_alias = normalize_key(alias);

        let exact_hit = [
            location.name.as_str(),
            location.key.as_str(),
            alias,
            normalized_alias.as_str(),
        ]
        .into_iter()
        .filter_map(|k| self.exact.get(k))
        .find(|c| c.is_finite())
        .copied();

        exact_hit
            .or_else(|| self.normalized.get(&location.key).copied())
            .or_else(|| self.normalized.get(&normalized_alias).copied())
            .or_else(|| index.get(&normalized_alias).filter(Coordinate::is_finite))
    }
}

/// Resolve a tally to a coordinate through overrides, aliases and the index
///
/// Override keys match by exact spelling first, then case/spacing-insensitively.
pub fn resolve_coordinate(
    location: &LocationCount,
    index: &CountryIndex,
    overrides: &LocationOverrides,
) -> Option<Coordinate> {
    OverrideLookup::new(overrides).resolve(location, index)
}

/// Build the marker set
///
/// `index` is `None` while the boundary dataset is still loading; like an empty
/// index it yields no markers rather than blocking.
pub fn build_markers(request: &MarkerRequest, index: Option<&CountryIndex>) -> Vec<Marker> {
    let Some(index) = index.filter(|i| !i.is_empty()) else {
        debug!("Country index not available - no markers");
        return Vec::new();
    };

    let tallies = aggregate_location_counts(&request.stories, &request.top_locations);
    let overrides = OverrideLookup::new(&request.location_overrides);
    let mut markers = Vec::with_capacity(tallies.len());

    for tally in tallies {
        let Some(coordinate) = overrides.resolve(&tally, index) else {
            debug!("Dropping unresolved location: {:?}", tally.name);
            continue;
        };

        let count = tally.count.round().max(1.0) as u32;
        markers.push(Marker {
            key: tally.key,
            name: tally.name,
            lat: coordinate.lat,
            lon: coordinate.lon,
            count,
            radius: marker_radius(count),
        });
    }

    markers
}

// ============================================================================
// MEMOIZATION
// ============================================================================

/// Single-entry memo of the last marker computation
///
/// Keyed by a SHA-256 fingerprint of the request plus the index digest, so a
/// re-render with unchanged inputs skips aggregation entirely.
#[derive(Debug, Default)]
pub struct MarkerCache {
    fingerprint: Option<String>,
    markers: Vec<Marker>,
    hits: u64,
    misses: u64,
}

impl MarkerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, request: &MarkerRequest, index: Option<&CountryIndex>) -> &[Marker] {
        let fingerprint = request_fingerprint(request, index);

        if fingerprint.is_some() && fingerprint == self.fingerprint {
            self.hits += 1;
            debug!("Marker cache hit - markers={}", self.markers.len());
            return &self.markers;
        }

        self.misses += 1;
        self.markers = build_markers(request, index);
        self.fingerprint = fingerprint;
        &self.markers
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.fingerprint = None;
        self.markers.clear();
    }
}

fn request_fingerprint(request: &MarkerRequest, index: Option<&CountryIndex>) -> Option<String> {
    let body = serde_json::to_vec(request).ok()?;

    let mut hasher = Sha256::new();
    hasher.update(&body);
    hasher.update(index.map(CountryIndex::digest).unwrap_or("pending").as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// TESTS
// ============================================================================
