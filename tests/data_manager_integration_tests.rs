use futures::future::join_all;
use mxbikes_data::data_fetcher::models::{ContentType, RaceStatus};
use mxbikes_data::error::ErrorKind;
use mxbikes_data::testing_utils::TestDataBuilder;
use mxbikes_data::{AppError, Config, DataManager, LoadOptions};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(public: &MockServer, internal: Option<&MockServer>) -> Config {
    Config {
        public_api_url: public.uri(),
        internal_api_url: internal.map(MockServer::uri),
        static_base: None,
        retry_base_delay_ms: 1,
        max_retries: 2,
        load_timeout_seconds: 5,
        ..Config::default()
    }
}

async fn mount_health(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestDataBuilder::health_ok()))
        .mount(server)
        .await;
}

async fn started(config: Config) -> DataManager {
    let manager = DataManager::new(config).unwrap();
    manager.initialize().await;
    manager
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

fn five_tracks() -> Value {
    let categories = ["Motocross", "Supercross", "Motocross", "Enduro", "FreeRide"];
    let tracks: Vec<Value> = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let mut track = TestDataBuilder::raw_track(&format!("t{i}"), &format!("Track {i}"));
            track["category"] = json!(category);
            if i == 2 {
                track["downloads"] = json!({"links": ["https://evil.example.com/track.zip"]});
            }
            track
        })
        .collect();
    json!({ "items": tracks })
}

#[tokio::test]
async fn test_identical_loads_hit_network_once() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/mods"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([TestDataBuilder::raw_track("m1", "Bike Pack")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let options = LoadOptions::new().with_search("bike").with_category("Motocross");
    let reordered = LoadOptions::from_pairs([("category", "Motocross"), ("search", "bike")]);

    let first = manager.load_data("mods", options).await.unwrap();
    let second = manager.load_data("mods", reordered).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_category_filter_scenario() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(five_tracks()))
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let data = manager
        .load_data("tracks", LoadOptions::new().with_category("Motocross"))
        .await
        .unwrap();
    let items = data.into_content().unwrap();

    assert_eq!(items.len(), 2);
    let with_links = items.iter().find(|item| item.id == "t0").unwrap();
    assert!(
        with_links
            .downloads
            .primary
            .as_deref()
            .is_some_and(|url| url.contains("mediafire.com"))
    );
    let without_links = items.iter().find(|item| item.id == "t2").unwrap();
    assert!(without_links.downloads.primary.is_none());
    assert!(without_links.downloads.mirrors.is_empty());
}

#[tokio::test]
async fn test_internal_probe_timeout_blocks_racing() {
    let public = MockServer::start().await;
    mount_health(&public).await;
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(TestDataBuilder::health_ok())
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&internal)
        .await;
    Mock::given(method("GET"))
        .and(path("/races"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&internal)
        .await;

    let config = Config {
        health_timeout_seconds: 1,
        ..config_for(&public, Some(&internal))
    };
    let manager = started(config).await;

    assert!(manager.health().public);
    assert!(!manager.has_racing_access());
    let err = manager.load_data("races", LoadOptions::new()).await.unwrap_err();
    assert!(matches!(err, AppError::ApiUnavailable { .. }));
}

#[tokio::test]
async fn test_clear_cache_drops_every_variant() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/tracks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([TestDataBuilder::raw_track("t1", "Desert Run")])),
        )
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    for search in ["desert", "run", "track"] {
        manager
            .load(ContentType::Tracks, LoadOptions::new().with_search(search))
            .await
            .unwrap();
    }
    assert_eq!(manager.cached_entries().await, 3);

    assert_eq!(manager.clear_cache(Some(ContentType::Tracks)).await, 3);
    let before = requests_to(&server, "/tracks").await;

    manager.load_data("tracks", LoadOptions::new()).await.unwrap();
    manager.load_data("tracks", LoadOptions::new()).await.unwrap();
    assert_eq!(requests_to(&server, "/tracks").await, before + 1);
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/downloads"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([TestDataBuilder::raw_track("d1", "Gear Pack")]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let loads = (0..5).map(|_| manager.load(ContentType::Downloads, LoadOptions::new()));
    let results = join_all(loads).await;

    let first = results[0].as_ref().unwrap();
    for result in &results {
        assert_eq!(result.as_ref().unwrap(), first);
    }
    assert_eq!(manager.request_stats().total, 1);
}

#[tokio::test]
async fn test_concurrent_failed_loads_share_one_fetch() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/mods"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let loads = (0..5).map(|_| manager.load(ContentType::Mods, LoadOptions::new()));
    let results = join_all(loads).await;

    for result in &results {
        let err = result.as_ref().unwrap_err();
        assert!(matches!(err, AppError::DataUnavailable { .. }), "got {err}");
    }
    assert_eq!(requests_to(&server, "/mods").await, 1);

    // failures are not cached; the next load fetches again
    assert!(manager.load(ContentType::Mods, LoadOptions::new()).await.is_err());
    assert_eq!(requests_to(&server, "/mods").await, 2);
}

#[tokio::test]
async fn test_single_download_record_is_served() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/downloads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d1",
            "name": "Gear Pack",
            "downloads": {"count": 3, "links": ["https://mega.nz/file/a"]}
        })))
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let items = manager
        .load(ContentType::Downloads, LoadOptions::new())
        .await
        .unwrap()
        .into_content()
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "d1");
    assert_eq!(items[0].downloads.count, 3);
}

#[tokio::test]
async fn test_local_rate_limit_rejects_without_network() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        rate_limit_per_second: 2,
        ..config_for(&server, None)
    };
    let manager = started(config).await;

    for page in 1..=2 {
        manager
            .load(ContentType::Tracks, LoadOptions::new().with_page(page))
            .await
            .unwrap();
    }
    let err = manager
        .load(ContentType::Tracks, LoadOptions::new().with_page(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RateLimitExceeded { limit: 2, .. }));
    assert_eq!(manager.request_stats().rate_limited, 1);
}

#[tokio::test]
async fn test_429_is_retried_with_correlation_headers() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/mods"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mods"))
        .and(header_exists("X-Request-ID"))
        .and(header("X-Client-Version", mxbikes_data::VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mods": []})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = started(config_for(&server, None)).await;
    let data = manager.load(ContentType::Mods, LoadOptions::new()).await.unwrap();
    assert!(data.is_empty());

    let stats = manager.request_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_timeouts_are_retried_and_counted_by_kind() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/tracks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        http_timeout_seconds: 1,
        ..config_for(&server, None)
    };
    let manager = started(config).await;

    let err = manager.load(ContentType::Tracks, LoadOptions::new()).await.unwrap_err();
    assert!(matches!(err, AppError::DataUnavailable { .. }));

    let stats = manager.request_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.errors_by_kind.get(&ErrorKind::Network), Some(&1));
}

#[tokio::test]
async fn test_static_fallback_serves_internal_only_type() {
    let public = MockServer::start().await;
    mount_health(&public).await;
    Mock::given(method("GET"))
        .and(path("/static/data/races.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&public)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/data/races-fallback.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "races": [TestDataBuilder::raw_race("5", "in_progress")]
        })))
        .expect(1)
        .mount(&public)
        .await;

    let config = Config {
        internal_api_url: Some("http://127.0.0.1:1".to_string()),
        static_base: Some(public.uri()),
        static_fallback_types: vec![ContentType::Races],
        ..config_for(&public, None)
    };
    let manager = started(config).await;
    assert!(!manager.has_racing_access());

    let races = manager
        .load_data("races", LoadOptions::new())
        .await
        .unwrap()
        .into_races()
        .unwrap();
    assert_eq!(races.len(), 1);
    assert_eq!(races[0].status, RaceStatus::InProgress);

    // seeded cache answers the repeat
    manager.load_data("races", LoadOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_deadline_returns_early_but_cache_is_still_written() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/rankings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"top_10": [TestDataBuilder::raw_ranking(1, "Ace", 1800)]}))
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        load_timeout_seconds: 1,
        ..config_for(&server, Some(&server))
    };
    let manager = started(config).await;

    let err = manager.load_data("rankings", LoadOptions::new()).await.unwrap_err();
    assert!(matches!(err, AppError::NetworkTimeout { .. }));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let rankings = manager
        .load_data("rankings", LoadOptions::new())
        .await
        .unwrap()
        .into_rankings()
        .unwrap();
    assert_eq!(rankings[0].rider_name, "Ace");
}

#[tokio::test]
async fn test_managers_are_independent_instances() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    Mock::given(method("GET"))
        .and(path("/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let a = started(config_for(&server, None)).await;
    let b = started(config_for(&server, None)).await;
    a.load(ContentType::Tracks, LoadOptions::new()).await.unwrap();
    b.load(ContentType::Tracks, LoadOptions::new()).await.unwrap();
    assert_eq!(a.request_stats().total, 1);
    assert_eq!(b.request_stats().total, 1);
}
