//! Same-origin proxy for the upstream feeds plus static hosting of the web frontend

use crate::core::config::{AppConfig, UpstreamConfig};
use crate::core::{Domain, QuoteSource, fetch_quotes};
use crate::providers;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream: UpstreamConfig,
    pub gold: Arc<dyn QuoteSource>,
    pub currency: Arc<dyn QuoteSource>,
}

impl AppState {
    pub fn new(client: reqwest::Client, config: &AppConfig) -> Self {
        AppState {
            gold: providers::build_source(&config.sources.gold, &client),
            currency: providers::build_source(&config.sources.currency, &client),
            upstream: config.server.upstream.clone(),
            client,
        }
    }

    fn source(&self, domain: Domain) -> &dyn QuoteSource {
        match domain {
            Domain::Gold => self.gold.as_ref(),
            Domain::Currency => self.currency.as_ref(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Upstream(Domain),
    UnknownDomain(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Upstream(domain) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {domain} prices"),
            ),
            ApiError::UnknownDomain(name) => {
                (StatusCode::NOT_FOUND, format!("Unknown domain: {name}"))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn fetch_upstream(client: &reqwest::Client, url: &str) -> Result<Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error status"))?;

    response
        .json::<Value>()
        .await
        .with_context(|| format!("{url} returned invalid JSON"))
}

async fn relay(state: &AppState, domain: Domain) -> Result<Json<Value>, ApiError> {
    let url = state.upstream.for_domain(domain);
    match fetch_upstream(&state.client, url).await {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            error!(%domain, error = ?e, "Error fetching {domain} prices");
            Err(ApiError::Upstream(domain))
        }
    }
}

/// GET /api/gold
async fn gold(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    relay(&state, Domain::Gold).await
}

/// GET /api/currency
async fn currency(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    relay(&state, Domain::Currency).await
}

/// GET /api/quotes/{domain}
async fn quotes(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let domain: Domain = name.parse().map_err(|_| ApiError::UnknownDomain(name))?;
    Ok(Json(fetch_quotes(domain, state.source(domain)).await))
}

pub fn create_router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    let frontend =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/gold", get(gold))
        .route("/api/currency", get(currency))
        .route("/api/quotes/{domain}", get(quotes))
        .fallback_service(frontend)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

pub async fn serve(config: &AppConfig, port: u16) -> Result<()> {
    let client = providers::http_client(config.poll.timeout())?;
    let state = Arc::new(AppState::new(client, config));
    let app = create_router(state, std::path::Path::new(&config.server.static_dir));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!("Server running on port {port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SourceConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GOLD_JSON: &str = r#"[
        {"Kod": "HH", "Aciklama": "Has Altın", "MobilAciklama": "Has", "Alis": "2.900,00", "Satis": "2.990,00", "GuncellenmeZamani": "10:15", "Change": null},
        {"Kod": "C", "Aciklama": "Çeyrek Altın", "MobilAciklama": "Çeyrek", "Alis": "4.850,00", "Satis": "4.990,00", "GuncellenmeZamani": "10:15", "Change": 0.5},
        {"Kod": "GA", "Aciklama": "Gram Altın", "MobilAciklama": "Gram", "Alis": "2.950,10", "Satis": "3.010,45", "GuncellenmeZamani": "10:15", "Change": 0.4}
    ]"#;

    async fn upstream() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Gold"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GOLD_JSON))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Currency"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn test_router(upstream: &MockServer, static_dir: &std::path::Path) -> Router {
        let mut config = AppConfig::default();
        config.server.upstream = UpstreamConfig {
            gold: format!("{}/Gold", upstream.uri()),
            currency: format!("{}/Currency", upstream.uri()),
        };
        config.sources.gold = SourceConfig::Json {
            url: format!("{}/Gold", upstream.uri()),
        };
        config.sources.currency = SourceConfig::Json {
            url: format!("{}/Currency", upstream.uri()),
        };

        let state = Arc::new(AppState::new(reqwest::Client::new(), &config));
        create_router(state, static_dir)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_relays_upstream_json() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();

        let (status, body) = get_json(test_router(&mock_server, dir.path()), "/api/gold").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["Kod"], "HH");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();

        let (status, body) =
            get_json(test_router(&mock_server, dir.path()), "/api/currency").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch currency prices");
    }

    #[tokio::test]
    async fn test_normalized_quotes() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();

        let (status, body) =
            get_json(test_router(&mock_server, dir.path()), "/api/quotes/gold").await;

        assert_eq!(status, StatusCode::OK);
        let quotes = body.as_array().unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0]["code"], "GA");
        assert_eq!(quotes[0]["label"], "Gram");
        assert_eq!(quotes[0]["sellingText"], "3.010,45");
        assert_eq!(quotes[1]["code"], "C");
    }

    #[tokio::test]
    async fn test_normalized_quotes_failure_is_empty_list() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();

        let (status, body) =
            get_json(test_router(&mock_server, dir.path()), "/api/quotes/currency").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_domain_is_404() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();

        let (status, body) =
            get_json(test_router(&mock_server, dir.path()), "/api/quotes/silver").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown domain: silver");
    }

    #[tokio::test]
    async fn test_client_routes_fall_back_to_index() {
        let mock_server = upstream().await;
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<div id=\"root\"></div>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let app = test_router(&mock_server, dir.path());
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"console.log(1)");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/calculator")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<div id=\"root\"></div>");
    }
}
