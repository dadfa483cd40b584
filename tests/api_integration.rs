//! API integration tests
//!
//! Drive the full router: link issuance, beacon ingestion, log dump, link
//! lookup, CORS handling and notification delivery.

use axum::{
    body::Body,
    extract::Path,
    http::{header, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{Layer, ServiceExt};
use tracelink::app::{create_app, Services};
use tracelink::config::*;
use tracelink::registry::{LINK_ID_ALPHABET, LINK_ID_LEN};

const PREFIX: &str = "https://links.example";

/// Helper layer to inject ConnectInfo for tests
#[derive(Clone)]
struct TestConnectInfoLayer;

impl<S> Layer<S> for TestConnectInfoLayer {
    type Service = TestConnectInfoMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TestConnectInfoMiddleware { inner }
    }
}

#[derive(Clone)]
struct TestConnectInfoMiddleware<S> {
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for TestConnectInfoMiddleware<S>
where
    S: tower::Service<Request<B>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let addr = SocketAddr::from(([127, 0, 0, 1], 12345));
        req.extensions_mut()
            .insert(axum::extract::connect_info::ConnectInfo(addr));
        self.inner.call(req)
    }
}

type Received = Arc<Mutex<Vec<Value>>>;

/// One stub server for both outbound calls: geolocation and Telegram
async fn spawn_upstream_stub(received: Received) -> String {
    let app = Router::new()
        .route(
            "/json/{ip}",
            get(|Path(ip): Path<String>| async move {
                Json(json!({
                    "status": "success",
                    "query": ip,
                    "city": "Lyon",
                    "country": "France",
                    "countryCode": "FR",
                    "regionName": "Auvergne-Rhone-Alpes",
                    "isp": "Orange",
                    "org": "Orange SA",
                    "zip": "69001",
                    "lat": 45.76,
                    "lon": 4.83
                }))
            }),
        )
        .route(
            "/{bot}/sendMessage",
            post(move |Json(body): Json<Value>| {
                let received = Arc::clone(&received);
                async move {
                    received.lock().unwrap().push(body);
                    Json(json!({"ok": true}))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn create_test_config(upstream: &str, telegram_base: Option<String>, log_path: PathBuf) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        link_prefix: PREFIX.to_string(),
        redirect_mode: RedirectMode::Decoy,
        geoip: GeoIpConfig {
            api_url: format!("{upstream}/json"),
            timeout_secs: 2,
            cache_ttl_secs: 60,
        },
        notify: NotifyConfig {
            telegram: telegram_base.map(|api_base| TelegramConfig {
                api_base,
                bot_token: "TEST".to_string(),
                chat_id: "1001".to_string(),
            }),
            timeout_secs: 2,
        },
        visit_log: VisitLogConfig {
            path: log_path.to_string_lossy().into_owned(),
        },
    }
}

struct TestApp {
    app: Router,
    log_path: PathBuf,
    received: Received,
    _dir: tempfile::TempDir,
}

async fn create_test_app() -> TestApp {
    let received: Received = Arc::new(Mutex::new(vec![]));
    let upstream = spawn_upstream_stub(Arc::clone(&received)).await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.txt");
    let config = create_test_config(&upstream, Some(upstream.clone()), log_path.clone());

    let services = Services::from_config(&config).unwrap();
    let app = create_app(&services, &config.link_prefix, config.redirect_mode)
        .layer(TestConnectInfoLayer);

    TestApp {
        app,
        log_path,
        received,
        _dir: dir,
    }
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn assert_cors_headers(headers: &axum::http::HeaderMap) {
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, POST, OPTIONS"
    );
}

async fn wait_for_messages(received: &Received, count: usize) -> Vec<Value> {
    for _ in 0..50 {
        {
            let messages = received.lock().unwrap();
            if messages.len() >= count {
                return messages.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    received.lock().unwrap().clone()
}

#[tokio::test]
async fn test_generate_link() {
    let test = create_test_app().await;

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/api/generate",
            json!({"decoyUrl": "https://example.com"}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    let link = value["link"].as_str().unwrap();

    let id = link
        .strip_prefix(&format!("{PREFIX}/t/"))
        .expect("link should be prefix + /t/ + id");
    assert_eq!(id.len(), LINK_ID_LEN);
    assert!(id.bytes().all(|b| LINK_ID_ALPHABET.contains(&b)));

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/links/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record = body_json(response).await;
    assert_eq!(record["id"], id);
    assert_eq!(record["decoyUrl"], "https://example.com");
}

#[tokio::test]
async fn test_generate_rejects_bad_bodies() {
    let test = create_test_app().await;

    for body in [
        "not json".to_string(),
        json!({}).to_string(),
        json!({"decoyUrl": 5}).to_string(),
        json!({"decoyUrl": ""}).to_string(),
        json!({"decoyUrl": "https://example.com/a\nb"}).to_string(),
    ] {
        let response = test
            .app
            .clone()
            .oneshot(post_json("/api/generate", body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(body_json(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn test_get_unknown_link_is_404() {
    let test = create_test_app().await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/api/links/nope0000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_track_appends_log_and_notifies() {
    let test = create_test_app().await;

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/api/track",
            json!({
                "id": "abc12345",
                "duration": 4200,
                "events": [{}, {}],
                "fingerprint": {"userAgent": "TestUA"}
            })
            .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "tracked"}));

    let log = std::fs::read_to_string(&test.log_path).unwrap();
    assert_eq!(log.matches("ID: abc12345").count(), 1);
    assert!(log.contains("4200"));
    assert!(log.contains("Events: 2"));

    let messages = wait_for_messages(&test.received, 1).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["chat_id"], "1001");
    assert_eq!(messages[0]["parse_mode"], "Markdown");
    let text = messages[0]["text"].as_str().unwrap();
    assert!(text.contains("ID: `abc12345`"));
    assert!(text.contains("Location: Lyon, France (FR)"));
    assert!(text.contains("Coords: https://www.google.com/maps?q=45.76,4.83"));
    assert!(text.contains("User-Agent: `TestUA`"));
    assert!(!text.contains("VPN"));
}

#[tokio::test]
async fn test_track_forged_id_cannot_split_log_entries() {
    let test = create_test_app().await;

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/api/track",
            json!({"id": "x\n-----------\n\n✅ Deep Tracking\nID: forged99"}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let log = std::fs::read_to_string(&test.log_path).unwrap();
    let blocks: Vec<&str> = log
        .split("-----------")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(log.lines().filter(|l| l.starts_with("ID: ")).count(), 1);
}

#[tokio::test]
async fn test_track_rejects_malformed_body() {
    let test = create_test_app().await;

    for body in ["{", r#"{"events": "lots"}"#, r#"{"duration": "4s"}"#] {
        let response = test
            .app
            .clone()
            .oneshot(post_json("/api/track", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    assert!(!test.log_path.exists());
}

#[tokio::test]
async fn test_track_survives_unreachable_upstreams_and_bad_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        "http://127.0.0.1:9",
        Some("http://127.0.0.1:9".to_string()),
        dir.path().join("missing").join("log.txt"),
    );
    let services = Services::from_config(&config).unwrap();
    let app = create_app(&services, &config.link_prefix, config.redirect_mode)
        .layer(TestConnectInfoLayer);

    let response = app
        .clone()
        .oneshot(post_json("/api/track", json!({"id": "abc12345"}).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_logs_endpoint_returns_plain_text() {
    let test = create_test_app().await;

    test.app
        .clone()
        .oneshot(post_json("/api/track", json!({"id": "logs0001"}).to_string()))
        .await
        .unwrap();

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("ID: logs0001"));
}

#[tokio::test]
async fn test_options_short_circuits_with_cors_headers() {
    let test = create_test_app().await;

    // Plain OPTIONS, no preflight headers
    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(response.headers());

    // Browser preflight
    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/track")
                .header(header::ORIGIN, "https://page.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(response.headers());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());

    // OPTIONS on a redirect route never touches the registry
    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/t/nope0000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(response.headers());
}

#[tokio::test]
async fn test_json_responses_carry_cors_headers() {
    let test = create_test_app().await;

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://page.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(response.headers());
    assert_eq!(body_json(response).await, json!({"status": "OK", "links": 0}));

    // Error responses carry them too
    let response = test
        .app
        .oneshot(post_json("/api/generate", "not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors_headers(response.headers());
}

#[tokio::test]
async fn test_concurrent_generation_yields_distinct_ids() {
    let test = create_test_app().await;

    let mut handles = vec![];
    for i in 0..25 {
        let app = test.app.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(post_json(
                    "/api/generate",
                    json!({"decoyUrl": format!("https://example.com/{i}")}).to_string(),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await["link"].as_str().unwrap().to_string()
        }));
    }

    let mut links = std::collections::HashSet::new();
    for handle in handles {
        links.insert(handle.await.unwrap());
    }
    assert_eq!(links.len(), 25);

    let response = test
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["links"], 25);
}
