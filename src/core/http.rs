//! Read-only operator status server

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::core::scheduler::LatestReport;
use crate::metrics::Metrics;
use crate::models::account::{Position, TradeStats};
use crate::models::report::CycleReport;
use crate::services::exchange::ExchangeClient;

const SERVICE_NAME: &str = "tradefuse";

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub latest: LatestReport,
    pub exchange: Arc<dyn ExchangeClient>,
    pub symbol: Arc<str>,
}

/// Process liveness as seen by the runtime; flips to `stopped` on shutdown.
#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: String,
    service: &'static str,
    symbol: String,
    uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_cycle: Option<LastCycle>,
}

#[derive(Debug, Serialize)]
struct LastCycle {
    outcome: &'static str,
    at: chrono::DateTime<chrono::Utc>,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let status = state.health.read().await.status.clone();
    let last_cycle = state.latest.read().await.as_ref().map(|report| LastCycle {
        outcome: report.outcome.label(),
        at: report.timestamp,
    });

    Json(HealthBody {
        status,
        service: SERVICE_NAME,
        symbol: state.symbol.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        last_cycle,
    })
}

async fn prometheus_text(State(state): State<AppState>) -> Response {
    match state.metrics.export() {
        Ok(body) => body.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 404 until the first cycle has finished.
async fn latest_report(State(state): State<AppState>) -> Result<Json<CycleReport>, StatusCode> {
    let latest = state.latest.read().await;
    latest.clone().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn position(State(state): State<AppState>) -> Result<Json<Position>, StatusCode> {
    match state.exchange.get_position(&state.symbol).await {
        Ok(position) => Ok(Json(position)),
        Err(e) => {
            warn!(symbol = %state.symbol, error = %e, "Position lookup failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn trade_stats(State(state): State<AppState>) -> Result<Json<TradeStats>, StatusCode> {
    match state.exchange.get_trade_stats().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            warn!(error = %e, "Trade stats lookup failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// Counts requests by method and status class and times them.
async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let metrics = &state.metrics;
    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    metrics.http_requests_in_flight.dec();

    let elapsed = started.elapsed();
    let status = response.status();
    let class = match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), class])
        .inc();
    metrics
        .http_request_duration_seconds
        .observe(elapsed.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Status request failed"
        );
    }

    response
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(latest_report))
        .route("/position", get(position))
        .route("/stats", get(trade_stats))
}

pub fn create_router(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_text))
        .nest("/api", api_routes())
        .layer(layers)
        .with_state(state)
}

/// Serve until the listener fails or the task is aborted.
pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port = port, symbol = %state.symbol, "Status server listening");
    axum::serve(listener, create_router(state)).await
}
