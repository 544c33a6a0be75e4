//! HTTP routes
//!
//! Every route answers `200 OK` with a JSON [`Envelope`]; failures are
//! reported inside the envelope, never as HTTP errors.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{CommandGateway, Envelope};
use crate::error::{BridgeError, Result};

type Gateway = State<Arc<CommandGateway>>;

/// Body of `POST /api/read-file`
#[derive(Debug, Default, Deserialize)]
struct ReadFileRequest {
    #[serde(default)]
    filename: Option<String>,
}

/// Body of `POST /api/led`
#[derive(Debug, Default, Deserialize)]
struct IndicatorRequest {
    #[serde(default)]
    value: Option<String>,
}

/// Build the HTTP application
///
/// When `static_dir` is given, paths outside `/api` are served from it.
pub fn router(gateway: Arc<CommandGateway>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/status", get(status))
        .route("/api/ping", get(ping))
        .route("/api/connection", get(connection))
        .route("/api/connect", post(connect))
        .route("/api/disconnect", post(disconnect))
        .route("/api/bbid", get(identifier))
        .route("/api/files", get(list_files))
        .route("/api/dump-nand", post(dump_nand))
        .route("/api/dump-fs", post(dump_filesystem))
        .route("/api/read-file", post(read_file))
        .route("/api/led", post(set_indicator))
        .with_state(gateway);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// Handlers
// =============================================================================

async fn status(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.status())
}

async fn ping(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.ping().await)
}

async fn connection(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.connection().await)
}

async fn connect(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.connect().await)
}

async fn disconnect(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.disconnect().await)
}

async fn identifier(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.identifier().await)
}

async fn list_files(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.list_files().await)
}

async fn dump_nand(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.dump_nand().await)
}

async fn dump_filesystem(State(gateway): Gateway) -> Json<Envelope> {
    Json(gateway.dump_filesystem().await)
}

async fn read_file(State(gateway): Gateway, body: Bytes) -> Json<Envelope> {
    match parse_body::<ReadFileRequest>(&body) {
        Ok(request) => Json(gateway.read_file(request.filename.as_deref()).await),
        Err(e) => Json(Envelope::from_error(&e)),
    }
}

async fn set_indicator(State(gateway): Gateway, body: Bytes) -> Json<Envelope> {
    match parse_body::<IndicatorRequest>(&body) {
        Ok(request) => Json(gateway.set_indicator(request.value.as_deref()).await),
        Err(e) => Json(Envelope::from_error(&e)),
    }
}

/// Parse a JSON request body; an empty body means "no fields"
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| BridgeError::Validation(format!("Invalid request body: {}", e)))
}
