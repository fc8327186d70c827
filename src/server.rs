// HTTP surface: /search, /health and /metrics.

use std::{
    fmt::{self, Write as _},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::{handler::SearchHandler, model::PriceResult};

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SearchHandler>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub date: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub fn router(handler: Arc<SearchHandler>) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(AppState { handler })
        .layer(TraceLayer::new_for_http())
}

/// GET /search - Always 200; failures degrade to the fallback price.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<PriceResult> {
    let result = state
        .handler
        .handle_search(&params.origin, &params.destination, params.date.as_deref())
        .await;
    Json(result)
}

/// GET /health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let body = render_metrics(&state.handler).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

fn write_counter(out: &mut String, name: &str, help: &str, value: usize) -> fmt::Result {
    writeln!(out, "# HELP {name} {help}")?;
    writeln!(out, "# TYPE {name} counter")?;
    writeln!(out, "{name} {value}")
}

fn render_metrics(handler: &SearchHandler) -> Result<String, fmt::Error> {
    let stats = handler.stats();
    let mut out = String::new();

    write_counter(
        &mut out,
        "travelsphere_requests_total",
        "Total requests to TravelSphere API",
        stats.requests_total,
    )?;
    write_counter(
        &mut out,
        "travelsphere_fallbacks_total",
        "Search requests answered with the fallback price",
        stats.fallbacks_total,
    )?;
    write_counter(
        &mut out,
        "travelsphere_flight_cache_hits_total",
        "Flight price cache hits",
        stats.flight_cache.hit_count,
    )?;
    write_counter(
        &mut out,
        "travelsphere_flight_cache_misses_total",
        "Flight price cache misses",
        stats.flight_cache.miss_count,
    )?;
    write_counter(
        &mut out,
        "travelsphere_rate_cache_hits_total",
        "Exchange rate cache hits",
        stats.rate_cache.hit_count,
    )?;
    write_counter(
        &mut out,
        "travelsphere_rate_cache_misses_total",
        "Exchange rate cache misses",
        stats.rate_cache.miss_count,
    )?;

    Ok(out)
}
