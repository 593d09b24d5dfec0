// 🗺️ Map Payload Builder - Marker set + region viewport → embedded renderer input
//
// The URL only carries the viewport; marker data travels separately in a
// `{ "type": "markers", "markers": [...] }` message so untrusted names never
// end up in a query string.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_MAP_PAGE, DEFAULT_STORY_ZOOM, MAX_MARKERS, REGION_VIEWS};
use crate::markers::Marker;
use crate::models::Story;

const MIN_PAYLOAD_RADIUS: f64 = 3.0;
const DEFAULT_PAYLOAD_RADIUS: f64 = 6.0;

// ============================================================================
// REGION VIEWPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

/// Viewport for a region code; unknown codes get the global view
pub fn region_view(region: &str) -> RegionView {
    REGION_VIEWS
        .iter()
        .find(|(code, ..)| *code == region)
        .or_else(|| REGION_VIEWS.iter().find(|(code, ..)| code.is_empty()))
        .map(|&(_, lat, lon, zoom)| RegionView { lat, lon, zoom })
        .unwrap_or(RegionView {
            lat: 20.0,
            lon: 0.0,
            zoom: 2.0,
        })
}

// ============================================================================
// PAYLOAD / MESSAGE
// ============================================================================

/// What the overview map needs: the page URL and the cleaned markers to post to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPayload {
    pub src: String,
    pub markers: Vec<Marker>,
}

impl MapPayload {
    /// Message posted to the renderer once it signals ready
    pub fn message(&self) -> RendererMessage {
        RendererMessage::Markers {
            markers: self.markers.clone(),
        }
    }
}

/// One-way messages to the embedded renderer (no acknowledgement)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RendererMessage {
    Markers { markers: Vec<Marker> },
}

// ============================================================================
// MAP EMBED
// ============================================================================

/// URL/payload builder bound to one map page
#[derive(Debug, Clone)]
pub struct MapEmbed {
    page: String,
    max_markers: usize,
}

impl Default for MapEmbed {
    fn default() -> Self {
        MapEmbed::new(DEFAULT_MAP_PAGE, MAX_MARKERS)
    }
}

impl MapEmbed {
    /// `max_markers` is capped at the transport limit
    pub fn new(page: &str, max_markers: usize) -> Self {
        let trimmed = page.trim().trim_start_matches('/');
        let page = if trimmed.is_empty() {
            DEFAULT_MAP_PAGE.to_string()
        } else {
            format!("/{}", trimmed)
        };

        MapEmbed {
            page,
            max_markers: max_markers.min(MAX_MARKERS),
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    /// Overview map: clamp, clean, pick the region viewport
    ///
    /// `None` when no marker survives cleaning (caller shows its empty state).
    pub fn markers_payload(&self, markers: &[Marker], region: &str) -> Option<MapPayload> {
        let cleaned: Vec<Marker> = markers
            .iter()
            .take(self.max_markers)
            .filter_map(clean_marker)
            .collect();

        if cleaned.is_empty() {
            debug!("No transportable markers - map payload omitted");
            return None;
        }

        let view = region_view(region);
        let src = self.url(&[
            ("lat", view.lat.to_string()),
            ("lon", view.lon.to_string()),
            ("zoom", view.zoom.to_string()),
            ("fit", "0".to_string()),
        ]);

        Some(MapPayload { src, markers: cleaned })
    }

    /// Single-point story map; zoom falls back to 5
    pub fn story_url(&self, lat: f64, lon: f64, zoom: Option<f64>) -> Option<String> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let zoom = zoom.filter(|z| z.is_finite()).unwrap_or(DEFAULT_STORY_ZOOM);

        Some(self.url(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("zoom", zoom.to_string()),
        ]))
    }

    /// Story map for a story's primary location coordinates
    pub fn story_map_url(&self, story: &Story) -> Option<String> {
        let coordinate = story.primary()?.coordinate()?;
        self.story_url(coordinate.lat, coordinate.lon, None)
    }

    fn url(&self, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.page, query)
    }
}

/// Coerce a marker into transport shape; drops markers without a finite position
fn clean_marker(marker: &Marker) -> Option<Marker> {
    if !marker.lat.is_finite() || !marker.lon.is_finite() {
        return None;
    }

    // zero counts as unset, like a missing radius
    let radius = if marker.radius.is_finite() && marker.radius != 0.0 {
        marker.radius
    } else {
        DEFAULT_PAYLOAD_RADIUS
    };
    let radius = radius.round().max(MIN_PAYLOAD_RADIUS);

    Some(Marker {
        key: marker.key.clone(),
        name: marker.name.clone(),
        lat: marker.lat,
        lon: marker.lon,
        count: marker.count.max(1),
        radius,
    })
}

/// Overview payload with the default page and marker limit
pub fn build_map_payload(markers: &[Marker], region: &str) -> Option<MapPayload> {
    MapEmbed::default().markers_payload(markers, region)
}

/// Single-story URL with the default page
pub fn story_map_url(story: &Story) -> Option<String> {
    MapEmbed::default().story_map_url(story)
}

// ============================================================================
// TESTS
// ============================================================================
