// Static lookup tables shared by the pipeline

/// Non-standard country references → canonical names used by the country index
pub const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("u s", "united states of america"),
    ("us", "united states of america"),
    ("usa", "united states of america"),
    ("united states", "united states of america"),
    ("u k", "united kingdom"),
    ("uk", "united kingdom"),
    ("uae", "united arab emirates"),
    ("republic of korea", "south korea"),
    ("korea republic", "south korea"),
    ("north korea", "north korea"),
    ("south korea", "south korea"),
    ("russian federation", "russia"),
    ("czech republic", "czechia"),
];

/// Manual [lon, lat] for countries whose bounding-box midpoint lands in the wrong place
/// (antimeridian crossings, overseas territories)
pub const COORDINATE_OVERRIDES: &[(&str, [f64; 2])] = &[
    ("united states of america", [-98.0, 39.0]),
    ("russia", [100.0, 60.0]),
    ("france", [2.0, 46.0]),
    ("united kingdom", [-2.0, 54.0]),
    ("netherlands", [5.0, 52.0]),
    ("denmark", [10.0, 56.0]),
    ("portugal", [-8.0, 39.0]),
    ("spain", [-4.0, 40.0]),
    ("new zealand", [174.0, -41.0]),
    ("fiji", [178.0, -18.0]),
];

/// Region code → (lat, lon, zoom). The empty code is the global view.
pub const REGION_VIEWS: &[(&str, f64, f64, f64)] = &[
    ("", 20.0, 0.0, 2.0),
    ("north_america", 45.0, -100.0, 3.0),
    ("south_america", -20.0, -60.0, 3.0),
    ("europe", 52.0, 15.0, 4.0),
    ("africa", 5.0, 20.0, 3.0),
    ("middle_east", 28.0, 45.0, 4.0),
    ("asia", 35.0, 95.0, 3.0),
    ("oceania", -25.0, 140.0, 4.0),
];

/// Hard cap on markers handed to the embedded renderer
pub const MAX_MARKERS: usize = 80;

/// Default map page the renderer is loaded from
pub const DEFAULT_MAP_PAGE: &str = "/story-map.html";

/// Zoom used for single-story maps when none is given
pub const DEFAULT_STORY_ZOOM: f64 = 5.0;

/// Tokens ignored when picking a source's grouping token
pub const SOURCE_STOPWORDS: &[&str] = &["the", "news"];

/// Look up the canonical name for an already-normalized location key
pub fn location_alias(key: &str) -> Option<&'static str> {
    LOCATION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}
