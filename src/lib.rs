// Story Map - Core Library
// Location resolution, marker aggregation and source-bias classification.
// Exposes all modules for use in CLI, API server, and tests

pub mod normalize;      // Key normalization + lenient JSON coercion
pub mod constants;      // Alias / override / viewport tables
pub mod models;         // Story, Article, SourceRecord, TopLocation
pub mod bias;           // Bias classifier + coverage distribution
pub mod sources;        // Source grouping
pub mod country_index;  // Country name/ISO → representative point
pub mod markers;        // Marker aggregation + memoization
pub mod map_payload;    // Renderer URL + payload
pub mod dates;          // Timestamp helpers
pub mod config;         // AppConfig + CSV overrides

// Re-export commonly used types
pub use normalize::{normalize_key, to_number, to_text};
pub use models::{Article, LocationRef, PlaceRef, SourceRecord, Story, StoryFeed, TopLocation};
pub use bias::{
    classify_bias, BiasCategory, BiasDistribution, BiasSegment, SourceBiasLookup,
};
pub use sources::{
    build_source_group_bias_map, count_distinct_sources, group_key, normalize_source_key,
};
pub use country_index::{geometry_midpoint, Coordinate, CountryIndex};
pub use markers::{
    aggregate_location_counts, build_markers, marker_radius, resolve_coordinate,
    LocationCount, LocationOverrides, Marker, MarkerCache, MarkerRequest,
};
pub use map_payload::{
    build_map_payload, region_view, story_map_url, MapEmbed, MapPayload, RegionView,
    RendererMessage,
};
pub use dates::{parse_timestamp, sort_articles_by_date, sort_stories_by_date};
pub use config::{load_overrides_csv, AppConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
