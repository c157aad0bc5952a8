// Bank Directory - Web Server
// REST API with Axum over an immutable bank snapshot

use anyhow::{bail, Context};
use axum::{
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bank_directory::config::{build_config, AppConfig, CliOverrides};
use bank_directory::directory::{
    BankCard, DirectorySession, DirectoryState, FeatureExclusions, FilterEntry, FilterState,
    LocationScope, SnapshotSource,
};
use bank_directory::slices::{slices_from_document, RenderReport, SliceRegistry};
use bank_directory::telemetry::init_tracing;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Bank Directory Server - REST API for bank search and slice rendering
#[derive(Parser, Debug)]
#[command(name = "bank-directory-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE", env = "BANKDIR_CONFIG")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Environment (development, staging, production)
    #[arg(long = "env")]
    environment: Option<String>,

    /// Backend snapshot served by /api/banks
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        CliOverrides {
            config_file: args.config.clone(),
            host: args.host.clone(),
            port: args.port,
            log_level: args.log_level.clone(),
            environment: args.environment.clone(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    snapshot: Arc<SnapshotSource>,
    config: Arc<AppConfig>,
    registry: Arc<SliceRegistry>,
    exclusions: Arc<FeatureExclusions>,
}

impl AppState {
    fn new(snapshot: SnapshotSource, config: AppConfig) -> Self {
        let registry = SliceRegistry::new(config.render_options());
        let exclusions = config.exclusions();
        Self {
            snapshot: Arc::new(snapshot),
            config: Arc::new(config),
            registry: Arc::new(registry),
            exclusions: Arc::new(exclusions),
        }
    }
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

impl ApiResponse<()> {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    banks: usize,
}

/// Query string of GET /api/banks
#[derive(Debug, Default, Deserialize)]
struct BanksQuery {
    country: Option<String>,
    state: Option<String>,
    q: Option<String>,
    /// Comma-separated `category:key` list
    filter: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BanksResponse {
    status: &'static str,
    location: LocationScope,
    filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetched_at: Option<DateTime<Utc>>,
    cards: Vec<BankCard>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: bank_directory::VERSION,
        banks: state.snapshot.len(),
    }))
}

/// GET /api/filters - Every filter toggle, all off
async fn list_filters() -> impl IntoResponse {
    let entries: Vec<FilterEntry> = FilterState::default().entries();
    Json(ApiResponse::ok(entries))
}

/// GET /api/banks - Ranked bank cards for a location, query and filters
async fn get_banks(State(state): State<AppState>, Query(params): Query<BanksQuery>) -> Response {
    let mut filters = FilterState::default();
    let specs = params.filter.as_deref().unwrap_or("");
    for spec in specs.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Err(e) = filters.enable(spec) {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string()))).into_response();
        }
    }

    let location = LocationScope::new(params.country.as_deref(), params.state.as_deref());
    let mut session = DirectorySession::new(state.config.matcher()).with_location(location);
    session.set_query(params.q.unwrap_or_default());
    session.set_filters(filters);
    session.run(state.snapshot.as_ref());

    let fetched_at = match session.state() {
        DirectoryState::Error { message } => {
            tracing::error!(%message, "bank query failed");
            return (StatusCode::BAD_GATEWAY, Json(ApiResponse::error(message.clone())))
                .into_response();
        }
        DirectoryState::Loaded { fetched_at, .. } => Some(*fetched_at),
        _ => None,
    };

    let response = BanksResponse {
        status: session.state().label(),
        location: session.request().location.clone(),
        filters: session.request().filters.active_specs(),
        fetched_at,
        cards: session.cards(&state.exclusions),
    };

    tracing::debug!(status = response.status, cards = response.cards.len(), "bank query");
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// POST /api/slices/render - Render a slice list or document
async fn render_slices(State(state): State<AppState>, Json(document): Json<Value>) -> impl IntoResponse {
    let slices = slices_from_document(&document);
    let report: RenderReport = state.registry.render_report(&slices);
    Json(ApiResponse::ok(report))
}

/// Tag every response with a fresh request id
async fn request_id(request: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    tracing::info_span!("request", request_id = %id).in_scope(|| {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "request received");
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/filters", get(list_filters))
        .route("/banks", get(get_banks))
        .route("/slices/render", post(render_slices))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = build_config(&CliOverrides::from(&args)).context("invalid configuration")?;
    if let Some(records) = args.records {
        config.data.records_path = Some(records);
    }

    init_tracing(config.log_level.as_filter_str());

    let Some(records_path) = config.data.records_path.clone() else {
        bail!("no records file (pass --records, set data.records_path or BANKDIR_RECORDS)");
    };
    let snapshot = SnapshotSource::from_file(&records_path)
        .with_context(|| format!("failed to load records from {}", records_path.display()))?;

    tracing::info!(
        version = bank_directory::VERSION,
        environment = %config.environment,
        banks = snapshot.len(),
        threshold = config.search.threshold,
        dev_diagnostics = config.render_options().dev_diagnostics,
        "server configuration loaded"
    );

    let addr = config.socket_addr();
    let router = app(AppState::new(snapshot, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!(address = %addr, "🚀 server running");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use bank_directory::directory::BankRecord;
    use serde_json::json;
    use tower::ServiceExt;

    fn state() -> AppState {
        let mut harvested = BankRecord::new("green", "Green Bank").in_country("GB");
        harvested.harvest_data = serde_json::from_value(json!({
            "depositProducts": { "savings": true, "interest_rates": [{ "high_rate": "3.5" }] },
            "loanProducts": { "credit_cards": true, "mortgages": true }
        }))
        .unwrap();

        let snapshot = SnapshotSource::new(vec![
            harvested,
            BankRecord::new("plain", "Plain Bank").in_country("GB"),
            BankRecord::new("ca", "Golden State Bank").in_country("US").licensed_in("CA"),
        ]);
        AppState::new(snapshot, AppConfig::default())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app(state())
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["banks"], 3);
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let response = app(state())
            .oneshot(HttpRequest::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_banks_by_country() {
        let (status, body) = get_json("/api/banks?country=gb").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "loaded");

        let cards = body["data"]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0]["name"], "Green Bank");
        assert_eq!(cards[0]["interestRate"], "Up to 3.5%");
        // credit cards are not listed for GB
        assert_eq!(cards[0]["features"][1]["features"], json!(["Mortgages"]));
    }

    #[tokio::test]
    async fn test_banks_filter_and_query() {
        let (_, body) = get_json("/api/banks?country=GB&filter=depositProducts:savings").await;
        let cards = body["data"]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["id"], "green");

        let (_, body) = get_json("/api/banks?country=GB&q=plan").await;
        assert_eq!(body["data"]["cards"][0]["id"], "plain");
    }

    #[tokio::test]
    async fn test_banks_us_requires_state() {
        let (status, body) = get_json("/api/banks?country=US").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "empty");
        assert_eq!(body["data"]["cards"], json!([]));

        let (_, body) = get_json("/api/banks?country=US&state=us-ca").await;
        assert_eq!(body["data"]["cards"][0]["id"], "ca");
    }

    #[tokio::test]
    async fn test_banks_unknown_filter_rejected() {
        let (status, body) = get_json("/api/banks?country=GB&filter=vibes:good").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("vibes:good"));
    }

    #[tokio::test]
    async fn test_filters_listing() {
        let (_, body) = get_json("/api/filters").await;
        let entries = body["data"].as_array().unwrap();
        assert!(entries.iter().any(|e| e["key"] == "mobile_banking"));
        assert!(entries.iter().all(|e| e["enabled"] == false));
    }

    #[tokio::test]
    async fn test_render_slices_with_placeholder() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/slices/render")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "body": [
                    { "slice_type": "quote", "primary": { "quote": "Money is a tool" } },
                    { "slice_type": "mystery_slice" }
                ] })
                .to_string(),
            ))
            .unwrap();

        let response = app(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let nodes = body["data"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1]["kind"], "unknown");
        assert_eq!(nodes[1]["tag"], "mystery_slice");
    }
}
