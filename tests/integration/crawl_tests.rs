//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end. The mock server's own port doubles as the "proxy"
//! for the connectivity probe; requests go to it directly.

use onion_ripple::config::{Config, ControlConfig, CrawlerConfig, OutputConfig, OutputFormat};
use onion_ripple::crawler::{
    build_http_client, CrawlEngine, FetchOutcome, FetchSettings, Fetcher, RateGate,
    RecordingSleeper, RetryPolicy,
};
use onion_ripple::proxy::{IdentityRotator, TorControl};
use onion_ripple::storage::{open_store, read_records, Store};
use onion_ripple::{EngineState, HostPolicy, RippleError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `seeds` and writing to `out_path`
fn create_test_config(seeds: Vec<String>, proxy_port: u16, out_path: &Path) -> Config {
    let mut crawler = CrawlerConfig::with_seeds(seeds);
    // Mock servers live on 127.0.0.1, so keep every link
    crawler.link_suffix_filter = String::new();

    let mut config = Config {
        proxy: Default::default(),
        control: None,
        fetch: Default::default(),
        rate_limit: Default::default(),
        crawler,
        output: OutputConfig {
            format: OutputFormat::Jsonl,
            path: out_path.to_string_lossy().into_owned(),
        },
    };
    config.proxy.port = proxy_port;
    config.proxy.wait_timeout = 1;
    config.proxy.poll_interval = 1;
    config.rate_limit.base = 1.0;
    config.rate_limit.jitter = 0.0;
    config
}

/// Fetch settings for a local mock server: no host policy, no backoff wait
fn local_settings(config: &Config) -> FetchSettings {
    FetchSettings {
        host_policy: HostPolicy::Any,
        retry: RetryPolicy::new(config.fetch.max_retries, Duration::ZERO),
        ..FetchSettings::from_config(&config.fetch)
    }
}

/// Builds an engine that never really sleeps
fn create_engine(
    config: Config,
    settings: FetchSettings,
    rotator: Option<Box<dyn IdentityRotator>>,
) -> (CrawlEngine, RecordingSleeper) {
    let client = build_http_client(None, &config.fetch).expect("Failed to build client");
    let fetcher = Fetcher::new(client, settings);
    let store = open_store(&config.output).expect("Failed to open store");
    let sleeper = RecordingSleeper::new();

    let engine = CrawlEngine::with_parts(config, fetcher, store, rotator)
        .expect("Failed to create engine")
        .with_sleeper(Arc::new(sleeper.clone()))
        .with_rate_gate(RateGate::seeded(1.0, 0.0, 7));

    (engine, sleeper)
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

const LONG_TEXT: &str = "This paragraph is comfortably longer than fifty characters of text.";

#[tokio::test]
async fn test_full_crawl_to_jsonl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(
                r#"<p>{}</p><a href="{}/page1">1</a><a href="/page2">2</a><a href="/page1#top">1 again</a>"#,
                LONG_TEXT, base_url
            ),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page("Page 1", r#"<a href="/">home</a><a href="page3">3</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page("Page 2", "<p>short</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(html_page("Page 3", ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", base_url)],
        mock_server.address().port(),
        &out,
    );
    let settings = local_settings(&config);
    let (mut engine, sleeper) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(engine.state(), EngineState::Finished);
    assert_eq!(summary.pages_attempted, 4);
    assert_eq!(summary.pages_stored, 4);
    assert_eq!(summary.visits_by_domain.get("127.0.0.1"), Some(&4));

    // Breadth-first, in discovery order
    let records = read_records(&out).expect("Failed to read records");
    let urls: Vec<_> = records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
            format!("{}/page3", base_url),
        ]
    );

    let home = &records[0];
    assert_eq!(home.status, Some(200));
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(home.snippet.as_deref(), Some(LONG_TEXT));
    assert_eq!(
        home.links,
        vec![format!("{}/page1", base_url), format!("{}/page2", base_url)]
    );
    assert_eq!(records[2].snippet.as_deref(), Some("[No visible text found]"));

    // One politeness delay per visit
    assert_eq!(sleeper.requested(), vec![Duration::from_secs(1); 4]);
}

#[tokio::test]
async fn test_domain_confinement() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let port = mock_server.address().port();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(r#"<a href="http://localhost:{}/other">elsewhere</a>"#, port),
        ))
        .mount(&mock_server)
        .await;

    // Same server, different host name: must never be requested
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html_page("Other", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", base_url)],
        port,
        &dir.path().join("pages.jsonl"),
    );
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_attempted, 1);
    assert_eq!(
        summary.visits_by_domain.keys().collect::<Vec<_>>(),
        vec!["127.0.0.1"]
    );
}

#[tokio::test]
async fn test_quota_limits_pages_per_domain() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .respond_with(html_page("Any", &links))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    config.crawler.max_pages_per_domain = 3;
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_attempted, 3);
    assert_eq!(engine.store().count().expect("Failed to count"), 3);

    let requests = mock_server.received_requests().await.expect("Recording disabled");
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_retry_bound_and_backoff() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(html_page("Slow", "").set_delay(Duration::from_secs(5)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    let settings = FetchSettings {
        request_timeout: Duration::from_millis(200),
        retry: RetryPolicy::new(3, Duration::from_secs(1)),
        ..local_settings(&config)
    };
    let (mut engine, sleeper) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.pages_stored, 0);
    assert_eq!(engine.store().count().expect("Failed to count"), 0);

    // 2s and 4s between attempts, nothing after the last, then the rate gate
    assert_eq!(
        sleeper.requested(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(1)
        ]
    );
}

#[tokio::test]
async fn test_failures_consume_quota() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/a">a</a><a href="/b">b</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", "").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    config.crawler.max_pages_per_domain = 2;
    config.fetch.max_retries = 1;
    let settings = FetchSettings {
        request_timeout: Duration::from_millis(200),
        ..local_settings(&config)
    };
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_attempted, 2);
    assert_eq!(summary.pages_stored, 1);
    assert_eq!(summary.pages_failed, 1);
}

#[tokio::test]
async fn test_oversized_body_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("x".repeat(1_000_000))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.pages_stored, 0);
    assert_eq!(engine.store().count().expect("Failed to count"), 0);

    // A skip is never retried
    let requests = mock_server.received_requests().await.expect("Recording disabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_unsupported_content_type_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
                .insert_header("content-type", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");
    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.pages_stored, 0);
}

#[tokio::test]
async fn test_error_status_is_still_stored() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<title>Not Found</title>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &out,
    );
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    engine.run().await.expect("Crawl failed");

    let records = read_records(&out).expect("Failed to read records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, Some(404));
    assert_eq!(records[0].title.as_deref(), Some("Not Found"));
}

#[tokio::test]
async fn test_suffix_policy_blocks_local_hosts() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(html_page("Never", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    // Default policy only admits .onion hosts
    let settings = FetchSettings::from_config(&config.fetch);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");
    assert_eq!(summary.pages_skipped, 1);
}

/// Fetch settings that admit only 127.0.0.1, with the client built to match
fn allow_loopback_ip(config: &mut Config) -> FetchSettings {
    config.fetch.allow_list = Some(vec!["127.0.0.1".to_string()]);
    FetchSettings {
        retry: RetryPolicy::new(config.fetch.max_retries, Duration::ZERO),
        ..FetchSettings::from_config(&config.fetch)
    }
}

#[tokio::test]
async fn test_redirect_off_policy_is_not_followed() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://localhost:{}/secret", port).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // Same server, but reached under a host name the allow-list does not hold
    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(html_page("Off-policy host", &format!("<p>{}</p>", LONG_TEXT)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", mock_server.uri())], port, &out);
    let settings = allow_loopback_ip(&mut config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");
    assert_eq!(summary.pages_stored, 1);

    let records = read_records(&out).expect("Failed to read records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, format!("{}/", mock_server.uri()));
    assert_eq!(records[0].status, Some(302));
    assert_ne!(records[0].title.as_deref(), Some("Off-policy host"));
}

#[tokio::test]
async fn test_redirect_within_policy_is_followed() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("pages.jsonl");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/moved", mock_server.uri()).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(html_page("Moved", ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &out,
    );
    let settings = allow_loopback_ip(&mut config);
    let (mut engine, _) = create_engine(config, settings, None);

    engine.run().await.expect("Crawl failed");

    let records = read_records(&out).expect("Failed to read records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, Some(200));
    assert_eq!(records[0].title.as_deref(), Some("Moved"));
}

/// Minimal HTTP server that answers every request with `body` and no
/// Content-Length, closing the connection to end the body
async fn unsized_body_server(body: Vec<u8>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    let body = Arc::new(body);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let body = Arc::clone(&body);
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut lines = BufReader::new(reader).lines();
                let mut saw_request = false;

                // Read the request head; a bare connect (the proxy check) sends none
                while let Ok(Some(line)) = lines.next_line().await {
                    saw_request = true;
                    if line.is_empty() {
                        break;
                    }
                }
                if !saw_request {
                    return;
                }

                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";
                if writer.write_all(head.as_bytes()).await.is_ok() {
                    // The client hangs up once it has read enough
                    let _ = writer.write_all(&body).await;
                }
                let _ = writer.shutdown().await;
            });
        }
    });

    port
}

#[tokio::test]
async fn test_body_without_length_is_truncated_at_cap() {
    let mut body = b"<html><head><title>Big</title></head><body><p>".to_vec();
    body.resize(500 * 1024, b'x');
    let port = unsized_body_server(body).await;
    let seed = format!("http://127.0.0.1:{}/", port);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("pages.jsonl");
    let config = create_test_config(vec![seed.clone()], port, &out);
    assert_eq!(config.fetch.max_content_bytes, 204_800);
    let settings = local_settings(&config);

    let client = build_http_client(None, &config.fetch).expect("Failed to build client");
    match Fetcher::new(client, settings.clone()).fetch(&seed).await {
        FetchOutcome::Success {
            status,
            body,
            truncated,
            ..
        } => {
            assert_eq!(status, 200);
            assert_eq!(body.len(), 204_800);
            assert!(truncated);
        }
        other => panic!("Expected a truncated success, got {:?}", other),
    }

    let (mut engine, _) = create_engine(config, settings, None);
    let summary = engine.run().await.expect("Crawl failed");
    assert_eq!(summary.pages_stored, 1);

    let records = read_records(&out).expect("Failed to read records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, seed);
    assert_eq!(records[0].status, Some(200));
    assert_eq!(records[0].title.as_deref(), Some("Big"));
}

/// Fake Tor control port that accepts every command
///
/// Returns the address and a counter of `SIGNAL NEWNYM` commands received.
async fn fake_control_port() -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    let newnym = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&newnym);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut lines = BufReader::new(reader).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.starts_with("QUIT") {
                        break;
                    }
                    if line == "SIGNAL NEWNYM" {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    if writer.write_all(b"250 OK\r\n").await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (port, newnym)
}

#[tokio::test]
async fn test_identity_rotation_cadence() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let (control_port, newnym) = fake_control_port().await;

    let links: String = (0..4)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .respond_with(html_page("Any", &links))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    let control = ControlConfig {
        host: "127.0.0.1".to_string(),
        port: control_port,
        password: Some("hunter2".to_string()),
        rotate_after_requests: 2,
        settle_time: 7,
    };
    let rotator: Box<dyn IdentityRotator> = Box::new(TorControl::from_config(&control));
    config.control = Some(control);
    let settings = local_settings(&config);
    let (mut engine, sleeper) = create_engine(config, settings, Some(rotator));

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_attempted, 5);
    assert_eq!(summary.rotations, 2);
    assert_eq!(newnym.load(Ordering::SeqCst), 2);

    let settles = sleeper
        .requested()
        .into_iter()
        .filter(|d| *d == Duration::from_secs(7))
        .count();
    assert_eq!(settles, 2);
}

#[tokio::test]
async fn test_failed_rotation_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(html_page("Any", r#"<a href="/next">next</a>"#))
        .mount(&mock_server)
        .await;

    // Nothing listens on this port
    let closed = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let closed_port = closed.local_addr().expect("No local address").port();
    drop(closed);

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    let control = ControlConfig {
        host: "127.0.0.1".to_string(),
        port: closed_port,
        password: None,
        rotate_after_requests: 1,
        settle_time: 3,
    };
    let rotator: Box<dyn IdentityRotator> = Box::new(TorControl::from_config(&control));
    config.control = Some(control);
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, Some(rotator));

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_stored, 2);
    assert_eq!(summary.rotations, 0);
}

#[tokio::test]
async fn test_proxy_unavailable_fetches_nothing() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(html_page("Never", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let closed = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let closed_port = closed.local_addr().expect("No local address").port();
    drop(closed);

    let config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        closed_port,
        &dir.path().join("pages.jsonl"),
    );
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let err = engine.run().await.expect_err("Crawl should fail");

    assert!(matches!(err, RippleError::ProxyUnavailable { .. }));
    assert_eq!(engine.state(), EngineState::Failed);
}

#[tokio::test]
async fn test_sqlite_backend() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/next">next</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("Next", ""))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        vec![format!("{}/", mock_server.uri())],
        mock_server.address().port(),
        &dir.path().join("db/pages.sqlite"),
    );
    config.output.format = OutputFormat::Sqlite;
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_stored, 2);
    assert_eq!(engine.store().count().expect("Failed to count"), 2);
}

#[tokio::test]
async fn test_multiple_seeds_have_separate_quotas() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let links: String = (0..5)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    for server in [&first, &second] {
        Mock::given(method("GET"))
            .respond_with(html_page("Any", &links))
            .mount(server)
            .await;
    }

    // Both servers share 127.0.0.1 but differ in port; the seed domain is
    // the host alone, so a second seed on the same host gets a fresh quota
    let mut config = create_test_config(
        vec![format!("{}/", first.uri()), format!("{}/", second.uri())],
        first.address().port(),
        &dir.path().join("pages.jsonl"),
    );
    config.crawler.max_pages_per_domain = 2;
    let settings = local_settings(&config);
    let (mut engine, _) = create_engine(config, settings, None);

    let summary = engine.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_attempted, 4);
    assert_eq!(summary.visits_by_domain.get("127.0.0.1"), Some(&4));
    assert_eq!(first.received_requests().await.expect("Recording disabled").len(), 2);
    assert_eq!(second.received_requests().await.expect("Recording disabled").len(), 2);
}
