//! Axum route handlers for the algorithm bank API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::GatewayError, service::AlgorithmService};

// ── Shared state ─────────────────────────────────────────────────────────────

type Service = Arc<AlgorithmService>;

// ── Response types ───────────────────────────────────────────────────────────

/// Success envelope shared by every operation.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub item: T,
}

fn envelope<T: Serialize>(item: T) -> Json<Envelope<T>> {
    Json(Envelope { ok: true, item })
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the application router around `service`.
pub fn create_router(service: Service, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/add", post(create_algorithm))
        .route("/update", put(update_algorithm))
        .route("/list", get(list_algorithms))
        .route("/retrieve/{algo_name}", get(retrieve_latest))
        .route("/retrieve/{algo_name}/{version}", get(retrieve_version))
        .route("/remove/{algo_name}", delete(remove_latest))
        .route("/remove/{algo_name}/{version}", delete(remove_version))
        .route("/health", get(health))
        .with_state(service)
        .layer(TraceLayer::new_for_http());
    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `POST /add`: store version 1 of a new algorithm.
///
/// # Errors
/// 400 for invalid fields, 409 if the name exists, 500 on storage failure.
pub async fn create_algorithm(
    State(service): State<Service>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let record = service.create(parse_body(&body)?).await?;
    Ok((StatusCode::CREATED, envelope(record)))
}

/// `PUT /update`: store the next version of an existing algorithm.
///
/// # Errors
/// 400 for invalid fields, 404 if the name is unknown, 500 on storage failure.
pub async fn update_algorithm(
    State(service): State<Service>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let record = service.update(parse_body(&body)?).await?;
    Ok(envelope(record))
}

/// `GET /list`: every name with its latest version.
///
/// # Errors
/// 500 if the record collection fails.
pub async fn list_algorithms(
    State(service): State<Service>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(envelope(service.list().await?))
}

/// `GET /retrieve/{algo_name}`: the latest version with code inlined.
///
/// # Errors
/// 404 if the name is unknown.
pub async fn retrieve_latest(
    State(service): State<Service>,
    Path(algo_name): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(envelope(service.retrieve(&algo_name, None).await?))
}

/// `GET /retrieve/{algo_name}/{version}`: one version with code inlined.
///
/// # Errors
/// 400 for a malformed version, 404 if the name or version is unknown.
pub async fn retrieve_version(
    State(service): State<Service>,
    Path((algo_name, version)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let version = parse_version(&version)?;
    Ok(envelope(service.retrieve(&algo_name, Some(version)).await?))
}

/// `DELETE /remove/{algo_name}`: remove the latest version.
///
/// # Errors
/// 404 if the name is unknown.
pub async fn remove_latest(
    State(service): State<Service>,
    Path(algo_name): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(envelope(service.delete(&algo_name, None).await?))
}

/// `DELETE /remove/{algo_name}/{version}`: remove one version.
///
/// # Errors
/// 400 for a malformed version, 404 if the name or version is unknown.
pub async fn remove_version(
    State(service): State<Service>,
    Path((algo_name, version)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let version = parse_version(&version)?;
    Ok(envelope(service.delete(&algo_name, Some(version)).await?))
}

// ── Extraction helpers ───────────────────────────────────────────────────────

/// Parses a JSON body ourselves so malformed input gets the JSON error body.
fn parse_body(bytes: &[u8]) -> Result<Value, GatewayError> {
    serde_json::from_slice(bytes)
        .map_err(|e| GatewayError::InvalidRequest(format!("body is not valid JSON: {e}")))
}

fn parse_version(raw: &str) -> Result<u32, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::InvalidRequest(format!("version '{raw}' is not a number")))
}
