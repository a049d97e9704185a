//! Integration tests for kartsok location search
//!
//! These tests run against the public API only. Upstream registries are replaced
//! by a scripted transport so that every scenario is deterministic and offline.

use std::{sync::Arc, time::Duration};

use kartsok::{
    PointOfInterest, ResultKind, ResultSource, SearchConfigBuilder, SearchContext,
    SearchOrchestrator, format_canonical,
    sources::{
        Territory, haversine_distance_m,
        test_fetcher::{StubFetcher, StubReply, query_param},
    },
};
use serde_json::{Value, json};

const GAZETTEER: &str = "/stedsnavn/v1/sted";
const ADDRESS: &str = "/adresser/v1/sok";
const REVERSE: &str = "/stedsnavn/v1/punkt";

fn setup_test_env() {
    let _ = kartsok::init_logging(tracing::Level::WARN);
}

fn place(
    number: u64,
    name: &str,
    object_type: &str,
    lat: f64,
    lng: f64,
    municipality: &str,
) -> Value {
    json!({
        "stedsnummer": number,
        "stedsnavn": [{ "skrivemåte": name }],
        "navneobjekttype": object_type,
        "representasjonspunkt": { "nord": lat, "øst": lng },
        "kommuner": [{ "kommunenavn": municipality }],
        "fylker": [{ "fylkesnavn": "Innlandet" }]
    })
}

fn address(text: &str, lat: f64, lon: f64) -> Value {
    json!({
        "adressetekst": text,
        "kommunenavn": "LOM",
        "kommunenummer": "3434",
        "postnummer": "2686",
        "poststed": "LOM",
        "representasjonspunkt": { "lat": lat, "lon": lon }
    })
}

fn orchestrator(stub: &Arc<StubFetcher>) -> SearchOrchestrator {
    SearchOrchestrator::builder()
        .fetcher(stub.clone())
        .build()
        .expect("Should build orchestrator")
}

fn cabins() -> Vec<PointOfInterest> {
    vec![
        PointOfInterest::new("spiterstulen", "Spiterstulen", 61.6386, 8.4003, "cabin")
            .with_description("Turisthytte ved Visdalen"),
        PointOfInterest::new("juvasshytta", "Juvasshytta", 61.6779, 8.3664, "cabin"),
    ]
}

#[tokio::test]
async fn test_full_workflow() {
    setup_test_env();

    let stub = Arc::new(
        StubFetcher::new()
            .on_path(
                GAZETTEER,
                StubReply::json(json!({
                    "metadata": { "totaltAntallTreff": 3 },
                    "navn": [
                        place(1, "Galdhøpiggen", "Fjell", 61.6364, 8.3125, "Lom"),
                        place(2, "Galdhøe", "Topp", 61.65, 8.25, "Lom"),
                        // Same summit as the first record, 40 m away
                        place(3, "Galdhøpiggen", "Topp", 61.6367, 8.3129, "Lom"),
                    ]
                })),
            )
            .on_path(
                ADDRESS,
                StubReply::json(json!({ "adresser": [address("Galdhøpiggvegen 1", 61.78, 8.5)] })),
            ),
    );
    let orchestrator = orchestrator(&stub);

    let results = orchestrator.search("Galdhøpiggen", &cabins()).await;

    let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Galdhøpiggen", "Galdhøe", "Galdhøpiggvegen 1"]);
    assert_eq!(results[0].display_name, "Galdhøpiggen, Lom");
    assert_eq!(results[0].source, ResultSource::Gazetteer);
    assert_eq!(results[2].kind, ResultKind::Address);
    assert_eq!(results[2].display_name, "Galdhøpiggvegen 1, 2686 Lom");

    let sent = stub
        .requests()
        .into_iter()
        .find(|url| url.path() == GAZETTEER)
        .expect("Should query the gazetteer");
    assert_eq!(query_param(&sent, "sok").as_deref(), Some("Galdhøpiggen*"));
    assert_eq!(query_param(&sent, "side").as_deref(), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn test_coordinate_search() {
    setup_test_env();

    let stub = Arc::new(
        StubFetcher::new()
            .on_path(GAZETTEER, StubReply::json(json!({ "navn": [] })))
            .on_path(ADDRESS, StubReply::json(json!({ "adresser": [] })))
            .on_path(
                REVERSE,
                StubReply::json(json!({
                    "navn": [
                        { "skrivemåte": "Visdalen", "navneobjekttype": "Dal" },
                        { "skrivemåte": "Spiterstulen", "navneobjekttype": "Seter" }
                    ]
                })),
            ),
    );
    let orchestrator = orchestrator(&stub);

    let results = orchestrator.search("61.6388, 8.4005", &cabins()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, ResultKind::Coordinates);
    assert_eq!(results[0].display_name, "61.63880°N, 8.40050°E (near Visdalen)");

    let reverse = stub
        .requests()
        .into_iter()
        .find(|url| url.path() == REVERSE)
        .expect("Should look up a nearby place");
    assert_eq!(query_param(&reverse, "nord").as_deref(), Some("61.6388"));
    assert_eq!(query_param(&reverse, "ost").as_deref(), Some("8.4005"));
    assert_eq!(stub.requests_to(GAZETTEER), 1);
}

#[tokio::test(start_paused = true)]
async fn test_canonical_output_round_trips_through_search() {
    setup_test_env();

    let stub = Arc::new(StubFetcher::new());
    let orchestrator = SearchOrchestrator::builder()
        .config(SearchConfigBuilder::offline().build())
        .fetcher(stub.clone())
        .build()
        .unwrap();

    let first = orchestrator.search("69°39'N 18°57'E", &[]).await;
    let canonical = first[0].name.clone();
    let second = orchestrator.search(&canonical, &[]).await;

    assert_eq!(second[0].name, canonical);
    assert_eq!(format_canonical(second[0].lat, second[0].lng), canonical);
}

#[tokio::test]
async fn test_out_of_territory_coordinate_is_not_a_result() {
    setup_test_env();

    let stub = Arc::new(StubFetcher::new());
    let orchestrator = orchestrator(&stub);

    let results = orchestrator.search("48.8566, 2.3522", &[]).await;

    assert!(results.is_empty());
    assert_eq!(stub.requests_to(REVERSE), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failures_are_contained() {
    setup_test_env();

    let stub = Arc::new(
        StubFetcher::new()
            .on_path(GAZETTEER, StubReply::Body("<html>maintenance</html>".to_string()))
            .on_path(ADDRESS, StubReply::Status(503).delayed(Duration::from_secs(2))),
    );
    let orchestrator = orchestrator(&stub);

    let results = orchestrator.search("spiterstulen", &cabins()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, ResultSource::LocalIndex);
    assert_eq!(results[0].description.as_deref(), Some("Turisthytte ved Visdalen"));
}

#[tokio::test]
async fn test_results_respect_territory_dedup_and_cap() {
    setup_test_env();

    let places: Vec<_> = (0..10)
        .map(|i| {
            let lat = 60.0 + f64::from(i as u32) * 0.05;
            place(i, &format!("Lia {i}"), "Grend", lat, 9.0, "Flå")
        })
        .chain([place(99, "Lia", "Grend", 55.0, 9.0, "Danmark")])
        .collect();
    let addresses: Vec<_> = (0..10)
        .map(|i| address(&format!("Liavegen {i}"), 65.0 + f64::from(i) * 0.05, 13.0))
        .collect();
    let stub = Arc::new(
        StubFetcher::new()
            .on_path(GAZETTEER, StubReply::json(json!({ "navn": places })))
            .on_path(ADDRESS, StubReply::json(json!({ "adresser": addresses }))),
    );
    let orchestrator = orchestrator(&stub);

    let results = orchestrator.search("lia", &[]).await;

    assert_eq!(results.len(), 12);
    let territory = Territory::NORWAY;
    assert!(results.iter().all(|r| territory.contains(r.lat, r.lng)));
    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            assert!(haversine_distance_m(a.lat, a.lng, b.lat, b.lng) >= 500.0);
        }
    }
    // Six places from the gazetteer cap, then addresses
    assert!(results[..6].iter().all(|r| r.kind == ResultKind::Place));
    assert!(results[6..].iter().all(|r| r.kind == ResultKind::Address));
}

#[tokio::test(start_paused = true)]
async fn test_cache_lifecycle() {
    setup_test_env();

    let lom = place(1, "Lom", "Tettsted", 61.84, 8.57, "Lom");
    let stub = Arc::new(
        StubFetcher::new()
            .on_path(GAZETTEER, StubReply::json(json!({ "navn": [lom] })))
            .on_path(ADDRESS, StubReply::json(json!({ "adresser": [] }))),
    );
    let context = Arc::new(SearchContext::default());
    let orchestrator = SearchOrchestrator::builder()
        .context(Arc::clone(&context))
        .fetcher(stub.clone())
        .build()
        .unwrap();

    orchestrator.search("Lom", &[]).await;
    assert_eq!(stub.requests_to(GAZETTEER), 1);

    tokio::time::advance(Duration::from_secs(299)).await;
    orchestrator.search("LOM", &[]).await;
    assert_eq!(stub.requests_to(GAZETTEER), 1, "Should be served from cache");

    tokio::time::advance(Duration::from_secs(2)).await;
    orchestrator.search("lom", &[]).await;
    assert_eq!(stub.requests_to(GAZETTEER), 2, "Expired entry should be refetched");

    context.clear_cache();
    orchestrator.search("lom", &[]).await;
    assert_eq!(stub.requests_to(GAZETTEER), 3);
}
