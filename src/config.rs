// ⚙️ Configuration - Paths, map page and location overrides as data
//
// JSON config file (path from STORY_MAP_CONFIG) with defaults for every field.
// Location overrides can be inline or in a CSV file with a `name,lon,lat` header.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_MAP_PAGE, MAX_MARKERS};
use crate::country_index::{Coordinate, CountryIndex};
use crate::map_payload::MapEmbed;
use crate::markers::LocationOverrides;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "STORY_MAP_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Country boundary GeoJSON
    pub boundaries_path: PathBuf,

    /// Optional CSV of `name,lon,lat` marker overrides
    pub overrides_csv: Option<PathBuf>,

    /// Inline marker overrides (name → [lon, lat])
    pub location_overrides: LocationOverrides,

    /// Extra country-index overrides for bad centroids
    pub coordinate_overrides: LocationOverrides,

    /// Page the embedded renderer is served from
    pub map_page: String,

    /// Marker limit for renderer payloads (never above the transport cap)
    pub max_markers: usize,

    /// Server listen address
    pub bind_addr: String,

    /// Static files (map page) served by the server
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            boundaries_path: PathBuf::from("countries.geojson"),
            overrides_csv: None,
            location_overrides: LocationOverrides::new(),
            coordinate_overrides: LocationOverrides::new(),
            map_page: DEFAULT_MAP_PAGE.to_string(),
            max_markers: MAX_MARKERS,
            bind_addr: "0.0.0.0:3000".to_string(),
            static_dir: PathBuf::from("web"),
        }
    }
}

impl AppConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: AppConfig = serde_json::from_str(&content).context("Failed to parse config JSON")?;

        debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Config from `STORY_MAP_CONFIG`, or defaults when unset
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => AppConfig::from_file(path.trim()),
            _ => {
                info!("{} not set - using default config", CONFIG_ENV);
                Ok(AppConfig::default())
            }
        }
    }

    /// Inline overrides merged with the CSV file (CSV rows win)
    pub fn resolved_overrides(&self) -> Result<LocationOverrides> {
        let mut overrides = self.location_overrides.clone();

        if let Some(path) = &self.overrides_csv {
            let from_csv = load_overrides_csv(path)?;
            overrides.extend(from_csv);
        }

        Ok(overrides)
    }

    /// Country index from `boundaries_path`; empty when the file is unusable
    pub fn load_country_index(&self) -> CountryIndex {
        CountryIndex::load_or_empty(&self.boundaries_path, &self.coordinate_overrides)
    }

    pub fn map_embed(&self) -> MapEmbed {
        MapEmbed::new(&self.map_page, self.max_markers)
    }
}

#[derive(Debug, Deserialize)]
struct OverrideRow {
    name: String,
    lon: f64,
    lat: f64,
}

/// Read `name,lon,lat` rows; blank names and non-finite coordinates are skipped
pub fn load_overrides_csv<P: AsRef<Path>>(path: P) -> Result<LocationOverrides> {
    let mut rdr = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open overrides CSV: {:?}", path.as_ref()))?;

    let mut overrides = LocationOverrides::new();

    for result in rdr.deserialize() {
        let row: OverrideRow = result.context("Failed to deserialize override row")?;
        let name = row.name.trim();
        let coordinate = Coordinate::new(row.lon, row.lat);

        if name.is_empty() || !coordinate.is_finite() {
            continue;
        }
        overrides.insert(name.to_string(), coordinate);
    }

    info!("Loaded {} location overrides from {:?}", overrides.len(), path.as_ref());
    Ok(overrides)
}
