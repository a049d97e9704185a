//! Basic location search functionality
//!
//! This example runs a few searches against the live Norwegian registries:
//! - Creating an orchestrator with the default configuration
//! - Place, address and coordinate searches
//! - Mixing in points of interest the map already knows about
//!
//! Endpoints can be redirected with `KARTSOK_GAZETTEER_URL`,
//! `KARTSOK_ADDRESS_URL` and `KARTSOK_REVERSE_URL`.

use kartsok::{PointOfInterest, SearchConfigBuilder, SearchOrchestrator, SearchResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kartsok::init_logging(tracing::Level::INFO)?;

    let config = SearchConfigBuilder::from_env()?.try_build()?;
    let orchestrator = SearchOrchestrator::builder().config(config).build()?;

    let cabins = vec![
        PointOfInterest::new("kikut", "Kikutstua", 60.0539, 10.6453, "cabin")
            .with_description("Betjent hytte i Nordmarka"),
        PointOfInterest::new("ullevalseter", "Ullevålseter", 60.0175, 10.6928, "cabin"),
    ];

    for query in ["Galdhøpiggen", "Karl Johans gate 1", "Nordmarka", "59.9139, 10.7522"] {
        println!("\nSearching for '{query}':");
        let results = orchestrator.search(query, &cabins).await;
        print_search_results(&results, 5);
    }

    // Repeating a query within the cache TTL does not reach the network
    println!("\nSearching for 'galdhøpiggen' again (cached):");
    let results = orchestrator.search("galdhøpiggen", &cabins).await;
    print_search_results(&results, 1);

    Ok(())
}

fn print_search_results(results: &[SearchResult], limit: usize) {
    if results.is_empty() {
        println!("  no results");
    }
    for (i, result) in results.iter().take(limit).enumerate() {
        println!(
            "  {}. {} [{} from {}] ({:.5}, {:.5})",
            i + 1,
            result.display_name,
            result.kind,
            result.source,
            result.lat,
            result.lng
        );
    }

    if results.len() > limit {
        println!("  ... and {} more results", results.len() - limit);
    }
}
