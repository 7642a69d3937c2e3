use std::process::ExitCode;

use station_search::search::{EngineConfig, SearchEngine, SearchOptions};
use station_search::stations::JsonCatalog;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Catalog used when `STATION_CATALOG` is not set.
const DEFAULT_CATALOG: &str = "data/stations.json";

/// Number of completions printed per query.
const SUGGESTION_LIMIT: usize = 5;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::var("STATION_CATALOG").unwrap_or_else(|_| DEFAULT_CATALOG.to_string());
    let queries: Vec<String> = std::env::args().skip(1).collect();
    if queries.is_empty() {
        eprintln!("Usage: station-search <query>...");
        eprintln!();
        eprintln!("Reads the catalog from STATION_CATALOG (default {DEFAULT_CATALOG}).");
        return ExitCode::FAILURE;
    }

    let catalog = JsonCatalog::new(&path);
    let mut engine = match SearchEngine::from_provider(&catalog, EngineConfig::default()) {
        Ok(engine) => engine,
        Err(e) => {
            error!(path = %path, "failed to build search index: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = SearchOptions::default();
    for query in &queries {
        let response = match engine.search(query, &options) {
            Ok(response) => response,
            Err(e) => {
                eprintln!("{query:?}: {e}");
                continue;
            }
        };

        let metrics = &response.metrics;
        println!(
            "{query:?}: {} results via {} in {:.2} ms{}",
            metrics.results_found,
            metrics.algorithm,
            metrics.search_time_ms(),
            if metrics.cache_hit { " (cached)" } else { "" }
        );
        for result in &response.results {
            let station = &result.station;
            println!(
                "  {:>7.2}  {:<9}  {} ({}){}",
                result.score,
                result.match_type.as_str(),
                station.name,
                station.line,
                if station.is_transfer { " [transfer]" } else { "" }
            );
        }

        let suggestions = engine.get_suggestions(query, SUGGESTION_LIMIT);
        if !suggestions.is_empty() {
            println!("  suggestions: {}", suggestions.join(", "));
        }
    }

    let stats = engine.get_stats();
    println!();
    println!(
        "{} stations, {} trie nodes, cache {}/{} (hit rate {:.0}%)",
        stats.stations,
        stats.trie.nodes,
        stats.cache.len,
        stats.cache.capacity,
        stats.cache.hit_rate * 100.0
    );

    ExitCode::SUCCESS
}
