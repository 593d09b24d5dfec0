// 🌐 Story Map - Web Server
// REST API with Axum: markers, coverage and story-map URLs over the shared index

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use story_map::models::lenient_list;
use story_map::normalize::lenient_string;
use story_map::{
    count_distinct_sources, AppConfig, Article, BiasDistribution, BiasSegment, CountryIndex,
    LocationOverrides, MapEmbed, MapPayload, MarkerCache, MarkerRequest, SourceBiasLookup,
    SourceRecord,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    index: Arc<CountryIndex>,
    cache: Arc<Mutex<MarkerCache>>,
    embed: MapEmbed,
    overrides: Arc<LocationOverrides>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// POST /api/markers body
#[derive(Deserialize)]
struct MarkersBody {
    #[serde(flatten)]
    request: MarkerRequest,
    #[serde(default, deserialize_with = "lenient_string")]
    region: Option<String>,
}

/// POST /api/coverage body
#[derive(Deserialize)]
struct CoverageBody {
    #[serde(default, deserialize_with = "lenient_list")]
    articles: Vec<Article>,
    #[serde(default, deserialize_with = "lenient_list")]
    sources: Vec<SourceRecord>,
}

#[derive(Serialize)]
struct CoverageResponse {
    distribution: BiasDistribution,
    segments: Vec<BiasSegment>,
    sources_count: usize,
}

#[derive(Deserialize)]
struct StoryMapQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    zoom: Option<f64>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/markers - Aggregate markers and build the renderer payload
async fn post_markers(State(state): State<AppState>, Json(body): Json<MarkersBody>) -> impl IntoResponse {
    let MarkersBody { mut request, region } = body;
    let region = region.unwrap_or_default();

    // Request overrides beat configured ones
    let mut overrides = (*state.overrides).clone();
    overrides.extend(std::mem::take(&mut request.location_overrides));
    request.location_overrides = overrides;

    let payload: Option<MapPayload> = {
        let mut cache = state.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let markers = cache.get_or_build(&request, Some(&state.index));
        debug!("{} markers for region {:?}", markers.len(), region);
        state.embed.markers_payload(markers, &region)
    };

    Json(ApiResponse::ok(payload))
}

/// POST /api/coverage - Bias distribution of a story's articles
async fn post_coverage(Json(body): Json<CoverageBody>) -> impl IntoResponse {
    let lookup = SourceBiasLookup::from_sources(&body.sources);
    let distribution = BiasDistribution::from_articles(&body.articles, &lookup);

    Json(ApiResponse::ok(CoverageResponse {
        segments: distribution.segments(),
        distribution,
        sources_count: count_distinct_sources(&body.articles),
    }))
}

/// GET /api/story-map?lat=&lon=&zoom= - Single-point map URL
async fn get_story_map(State(state): State<AppState>, Query(query): Query<StoryMapQuery>) -> impl IntoResponse {
    let url = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => state.embed.story_url(lat, lon, query.zoom),
        _ => None,
    };

    Json(ApiResponse::ok(url))
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState, config: &AppConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/markers", post(post_markers))
        .route("/coverage", post(post_coverage))
        .route("/story-map", get(get_story_map))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn build_state(config: &AppConfig) -> Result<AppState> {
    Ok(AppState {
        index: Arc::new(config.load_country_index()),
        cache: Arc::new(Mutex::new(MarkerCache::new())),
        embed: config.map_embed(),
        overrides: Arc::new(config.resolved_overrides()?),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Story Map - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::load()?;
    let state = build_state(&config)?;
    info!("Country index ready: {} keys", state.index.len());

    let app = app(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/markers", config.bind_addr);
    println!("   Map: http://{}{}", config.bind_addr, config.map_page);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
