// 🗺️ Story Map - CLI
//
// story-map index <boundaries.geojson>
// story-map markers <boundaries.geojson> <feed.json> [region]
// story-map coverage <feed.json> <sources.json>

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use story_map::{
    build_markers, AppConfig, BiasDistribution, CountryIndex, MarkerRequest,
    SourceBiasLookup, SourceRecord, StoryFeed,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load()?;

    match args.get(1).map(String::as_str) {
        Some("index") if args.len() > 2 => run_index(&config, &args[2]),
        Some("markers") if args.len() > 3 => {
            let region = args.get(4).map(String::as_str).unwrap_or("");
            run_markers(&config, &args[2], &args[3], region)
        }
        Some("coverage") if args.len() > 3 => run_coverage(&args[2], &args[3]),
        _ => {
            print_usage();
            bail!("missing or unknown command");
        }
    }
}

fn print_usage() {
    println!("🗺️  Story Map v{}", story_map::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  story-map index <boundaries.geojson>");
    println!("  story-map markers <boundaries.geojson> <feed.json> [region]");
    println!("  story-map coverage <feed.json> <sources.json>");
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read {:?}", path.as_ref()))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path.as_ref()))
}

fn run_index(config: &AppConfig, boundaries: &str) -> Result<()> {
    println!("🌍 Country Index");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let index = CountryIndex::from_file(boundaries, &config.coordinate_overrides)?;

    println!("✓ {} keys indexed from {}", index.len(), boundaries);
    println!("  digest: {}", index.digest());
    Ok(())
}

fn run_markers(config: &AppConfig, boundaries: &str, feed_path: &str, region: &str) -> Result<()> {
    let index = CountryIndex::from_file(boundaries, &config.coordinate_overrides)?;
    let feed: StoryFeed = read_json(feed_path)?;

    let request = MarkerRequest::from_stories(feed.stories)
        .with_top_locations(feed.top_locations)
        .with_overrides(config.resolved_overrides()?);

    let markers = build_markers(&request, Some(&index));

    match config.map_embed().markers_payload(&markers, region) {
        Some(payload) => {
            let json = serde_json::to_string_pretty(&payload).context("Failed to serialize map payload")?;
            println!("{}", json);
        }
        None => println!("No mapped locations yet."),
    }

    Ok(())
}

fn run_coverage(feed_path: &str, sources_path: &str) -> Result<()> {
    let feed: StoryFeed = read_json(feed_path)?;
    let sources: Vec<SourceRecord> = read_json(sources_path)?;
    let lookup = SourceBiasLookup::from_sources(&sources);

    println!("⚖️  Coverage by source bias");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for story in &feed.stories {
        let title = story.title.as_deref().unwrap_or("(untitled)");
        let distribution = BiasDistribution::from_articles(&story.articles, &lookup);

        println!("\n📰 {}", title);
        println!("   sources: {}", story.source_count());

        if distribution.is_empty() {
            println!("   no rated sources");
            continue;
        }

        for segment in distribution.segments() {
            println!("   {:<12} {}", segment.label, segment.count);
        }
        println!("   {:<12} {}", "total", distribution.total());
    }

    Ok(())
}
