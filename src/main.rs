use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod integrations;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use integrations::{build_http_client, PaypalIpnClient, RecordStoreClient};
use services::{ContinueService, PurchasePolicy, ScoreRelay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcade_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting arcade relay");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!("PayPal verifier: {}", config.paypal_verify_url);
    tracing::info!("Session backend: {}", config.session_backend.as_str());

    // Session storage
    let sessions = db::connect(&config).await?;

    // Outbound clients
    let http = build_http_client(&config)?;
    let verifier = PaypalIpnClient::new(config.paypal_verify_url.clone(), http.clone());
    let record_store = RecordStoreClient::new(
        config.record_store_url.clone(),
        config.record_store_api_key.clone(),
        http,
    );

    let app_state = api::AppState {
        config: config.clone(),
        sessions: sessions.clone(),
        continues: ContinueService::new(
            sessions.clone(),
            Arc::new(verifier),
            PurchasePolicy::from_config(&config),
            config.session_consume_on_check,
        ),
        scores: ScoreRelay::new(Arc::new(record_store)),
    };

    // Build router
    let app = build_router(app_state);

    // Start background services
    tokio::spawn(services::start_background_services(
        sessions,
        config.clone(),
    ));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_layer(&state.config);

    // Game build; unknown paths get the entry document for client-side routing.
    let static_dir = Path::new(&state.config.static_dir);
    let game = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Continue purchase sessions
        .route("/api/create-session", post(api::session::create_session))
        .route(
            "/api/check-continue/{token}",
            get(api::session::check_continue),
        )
        // Payment notifications
        .route("/api/paypal-ipn", post(api::paypal_ipn::paypal_ipn))
        // High scores
        .route(
            "/api/scores",
            get(api::scores::list_scores).post(api::scores::submit_score),
        )
        .fallback_service(game)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Origins from `CORS_ALLOWED_ORIGINS`; `None` means any origin.
fn parse_cors_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return None;
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", s);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; allowing any origin");
        return None;
    }
    Some(allowed)
}

/// The browser client only issues simple GETs and JSON POSTs.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins = match parse_cors_origins(&config.cors_allowed_origins) {
        Some(list) => AllowOrigin::list(list),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemorySessionStore, SessionStore};
    use crate::services::continue_service::tests::StubVerifier;
    use crate::services::score_relay::tests::FakeScoreStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        scores: Arc<FakeScoreStore>,
    }

    fn test_app_with(
        verifier: StubVerifier,
        scores: FakeScoreStore,
        static_dir: &str,
    ) -> TestApp {
        let mut config = config::test_config();
        config.static_dir = static_dir.to_string();
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(3600));
        let scores = Arc::new(scores);
        let state = api::AppState {
            config: config.clone(),
            sessions: sessions.clone(),
            continues: ContinueService::new(
                sessions,
                Arc::new(verifier),
                PurchasePolicy::from_config(&config),
                false,
            ),
            scores: ScoreRelay::new(scores.clone()),
        };
        TestApp {
            router: build_router(state),
            scores,
        }
    }

    fn test_app(verifier: StubVerifier) -> TestApp {
        test_app_with(verifier, FakeScoreStore::default(), "does-not-exist")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(
        router: &Router,
        method: &str,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = send(router, request).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, bytes) = send(router, request).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn post_ipn(router: &Router, form: String) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri("/api/paypal-ipn")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        send(router, request).await.0
    }

    async fn create_session(router: &Router, level: Value) -> String {
        let (status, body) =
            send_json(router, "POST", "/api/create-session", json!({ "level": level })).await;
        assert_eq!(status, StatusCode::OK);
        body["sessionToken"].as_str().unwrap().to_string()
    }

    fn completed_ipn(token: &str) -> String {
        format!(
            "txn_id=9XY&payment_status=Completed&mc_gross=0.99&mc_currency=USD&custom={}",
            token
        )
    }

    #[tokio::test]
    async fn created_session_polls_as_pending() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let token = create_session(&app.router, json!(3)).await;
        assert_eq!(token.len(), 64);

        let (status, body) = get_json(&app.router, &format!("/api/check-continue/{}", token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"hasPurchasedContinue": false, "level": 3}));
    }

    #[tokio::test]
    async fn level_given_as_string_is_coerced() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let token = create_session(&app.router, json!("12")).await;
        let (_, body) = get_json(&app.router, &format!("/api/check-continue/{}", token)).await;
        assert_eq!(body["level"], 12);
    }

    #[tokio::test]
    async fn create_session_without_level_is_400() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let (status, body) = send_json(&app.router, "POST", "/api/create-session", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let request = Request::builder()
            .method("POST")
            .uri("/api/create-session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{broken"))
            .unwrap();
        assert_eq!(send(&app.router, request).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_token_is_404() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let (status, body) = get_json(&app.router, "/api/check-continue/not-a-session").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn verified_ipn_grants_continue() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let token = create_session(&app.router, json!(5)).await;

        assert_eq!(post_ipn(&app.router, completed_ipn(&token)).await, StatusCode::OK);

        let (_, body) = get_json(&app.router, &format!("/api/check-continue/{}", token)).await;
        assert_eq!(body, json!({"hasPurchasedContinue": true, "level": 5}));
    }

    #[tokio::test]
    async fn incomplete_payment_is_200_without_grant() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let token = create_session(&app.router, json!(2)).await;
        let form = completed_ipn(&token).replace("Completed", "Refunded");

        assert_eq!(post_ipn(&app.router, form).await, StatusCode::OK);
        let (_, body) = get_json(&app.router, &format!("/api/check-continue/{}", token)).await;
        assert_eq!(body["hasPurchasedContinue"], false);
    }

    #[tokio::test]
    async fn invalid_verifier_reply_is_400_without_grant() {
        let app = test_app(StubVerifier::replying("INVALID"));
        let token = create_session(&app.router, json!(2)).await;

        assert_eq!(
            post_ipn(&app.router, completed_ipn(&token)).await,
            StatusCode::BAD_REQUEST
        );
        let (_, body) = get_json(&app.router, &format!("/api/check-continue/{}", token)).await;
        assert_eq!(body["hasPurchasedContinue"], false);
    }

    #[tokio::test]
    async fn verifier_outage_is_500() {
        let app = test_app(StubVerifier::failing());
        let token = create_session(&app.router, json!(2)).await;
        assert_eq!(
            post_ipn(&app.router, completed_ipn(&token)).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn ipn_for_unknown_session_is_400() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        assert_eq!(
            post_ipn(&app.router, completed_ipn("0000")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn submit_score_defaults_level_and_returns_201() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let (status, body) = send_json(
            &app.router,
            "POST",
            "/api/scores",
            json!({"score": 100, "player_name": "ace"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["level"], 1);
        assert_eq!(app.scores.created.lock().await[0].level, 1);
    }

    #[tokio::test]
    async fn submit_score_without_name_is_400() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let (status, _) =
            send_json(&app.router, "POST", "/api/scores", json!({"score": 100})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.scores.created.lock().await.is_empty());
    }

    #[tokio::test]
    async fn list_scores_relays_store_order() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        for (score, name) in [(10, "low"), (300, "high"), (50, "mid")] {
            send_json(
                &app.router,
                "POST",
                "/api/scores",
                json!({"score": score, "player_name": name}),
            )
            .await;
        }

        let (status, body) = get_json(&app.router, "/api/scores").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["player_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn store_outage_is_sanitized_500() {
        let app = test_app_with(
            StubVerifier::replying("VERIFIED"),
            FakeScoreStore::offline(),
            "does-not-exist",
        );
        let (status, body) = get_json(&app.router, "/api/scores").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
        assert!(!body.to_string().contains("connection refused"));

        let (status, _) = send_json(
            &app.router,
            "POST",
            "/api/scores",
            json!({"score": 1, "player_name": "ace"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_memory_store() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let (status, body) = get_json(&app.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_store"], "memory: connected");
    }

    #[tokio::test]
    async fn unmatched_paths_serve_entry_document() {
        let dir = std::env::temp_dir()
            .join(format!("arcade-relay-{}", db::generate_session_token()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<!DOCTYPE html><title>Arcade</title>").unwrap();
        std::fs::write(dir.join("game.js"), "console.log('arcade')").unwrap();

        let app = test_app_with(
            StubVerifier::replying("VERIFIED"),
            FakeScoreStore::default(),
            dir.to_str().unwrap(),
        );

        for uri in ["/", "/play/level-3"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(&app.router, request).await;
            assert_eq!(status, StatusCode::OK, "uri: {uri}");
            assert!(String::from_utf8_lossy(&body).contains("Arcade"));
        }

        let request = Request::builder().uri("/game.js").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("console.log"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cors_origins_parse_list_or_wildcard() {
        assert!(parse_cors_origins("*").is_none());
        assert!(parse_cors_origins("  ").is_none());

        let list = parse_cors_origins("https://arcade.example, ,https://cdn.example").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], "https://arcade.example");
    }

    #[tokio::test]
    async fn cors_preflight_allows_only_client_methods() {
        let app = test_app(StubVerifier::replying("VERIFIED"));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/submit-score")
            .header(header::ORIGIN, "https://arcade.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_ascii_uppercase();
        assert!(methods.contains("POST"));
        assert!(methods.contains("GET"));
        assert!(!methods.contains("DELETE"));
        assert!(!methods.contains("PUT"));
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .to_ascii_lowercase(),
            "content-type"
        );
    }
}
