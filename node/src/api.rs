//! # REST API
//!
//! Builds the axum router that exposes the chain over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                       | Description                          |
//! |--------|----------------------------|--------------------------------------|
//! | GET    | `/`                        | Welcome message                      |
//! | GET    | `/health`                  | Liveness probe                       |
//! | POST   | `/api/blockchain`          | Create (or reset) the chain          |
//! | GET    | `/api/blockchain`          | Current chain, `null` before create  |
//! | POST   | `/api/blockchain/append`   | Append a block                       |
//! | GET    | `/api/blockchain/validate` | Run the integrity check              |
//!
//! ## Locking
//!
//! The chain sits behind a single `RwLock`. Create and append hold the
//! write guard for the whole read-tail, hash, push sequence; reads and
//! validation share the read guard.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use miler_protocol::config::WELCOME_MESSAGE;
use miler_protocol::storage::block::field_text;
use miler_protocol::storage::{Block, Chain, GenesisSeed};

use crate::metrics::SharedMetrics;

/// Returned for any create/append body missing a required field.
pub const BAD_REQUEST_MESSAGE: &str = "Request format is not correct!";

/// Returned when an operation needs a chain and none was created.
pub const NO_CHAIN_MESSAGE: &str = "No chain has been created yet";

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The node's single chain. `None` until the first create request.
pub type SharedChain = Arc<RwLock<Option<Chain<Value>>>>;

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The chain this node serves.
    pub chain: SharedChain,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Fresh state with no chain.
    pub fn new(version: impl Into<String>, metrics: SharedMetrics) -> Self {
        Self {
            version: version.into(),
            chain: Arc::new(RwLock::new(None)),
            metrics,
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/blockchain",
            get(get_chain_handler).post(create_chain_handler),
        )
        .route("/api/blockchain/append", post(append_block_handler))
        .route("/api/blockchain/validate", get(validate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Plain `{ "message": ... }` body used for greetings and errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response payload for `POST /api/blockchain`.
#[derive(Debug, Serialize)]
pub struct ChainCreatedResponse<'a> {
    pub message: &'static str,
    pub data: &'a Chain<Value>,
}

/// Response payload for `GET /api/blockchain`.
#[derive(Debug, Serialize)]
pub struct ChainResponse<'a> {
    pub chain: Option<&'a Chain<Value>>,
}

/// Response payload for `POST /api/blockchain/append`.
#[derive(Debug, Serialize)]
pub struct BlockAddedResponse<'a> {
    pub message: &'static str,
    pub block: &'a Block<Value>,
}

/// Response payload for `GET /api/blockchain/validate`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the chain passed the integrity check.
    pub valid: bool,
    /// Number of blocks checked, genesis included.
    pub length: usize,
    /// Whether genesis was re-derived too.
    pub strict: bool,
    /// First violation, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 time of the check.
    pub checked_at: String,
}

/// Query string for `GET /api/blockchain/validate`.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub strict: bool,
}

fn message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Request Parsing
// ---------------------------------------------------------------------------

/// A field counts as present unless it is missing, `null`, `false`, `0`,
/// or the empty string.
fn present<'a>(value: Option<&'a Value>) -> Option<&'a Value> {
    value.filter(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    })
}


/// Parsed body of a create request.
#[derive(Debug)]
struct CreateRequest {
    id: String,
    name: String,
    seed: GenesisSeed<Value>,
}

fn parse_create(body: &Value) -> Option<CreateRequest> {
    let id = field_text(present(body.get("id"))?);
    let name = field_text(present(body.get("name"))?);
    let genesis = present(body.get("genesis"))?;
    let date = present(genesis.get("date")).or_else(|| present(genesis.get("timestamp")))?;
    let transaction = present(genesis.get("transaction"))?;

    Some(CreateRequest {
        id,
        name,
        seed: GenesisSeed::new(field_text(date), transaction.clone()),
    })
}

fn parse_append(body: &Value) -> Option<(String, Value)> {
    let timestamp = field_text(present(body.get("timestamp"))?);
    let transaction = present(body.get("transaction"))?;
    Some((timestamp, transaction.clone()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — static welcome.
async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: WELCOME_MESSAGE.to_string(),
        }),
    )
}

/// `GET /health` — returns 200 if the node is alive.
///
/// Never takes the chain lock.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": state.version })),
    )
}

/// `POST /api/blockchain` — create the chain, or reset it if one exists.
async fn create_chain_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request = match body.ok().and_then(|Json(body)| parse_create(&body)) {
        Some(request) => request,
        None => return message(StatusCode::BAD_REQUEST, BAD_REQUEST_MESSAGE),
    };

    let mut guard = state.chain.write().await;
    let created = match guard.as_mut() {
        Some(chain) => chain
            .reset(request.id, request.name, request.seed)
            .map(|()| None),
        None => Chain::genesis(request.id, request.name, request.seed).map(Some),
    };
    match created {
        Ok(Some(chain)) => *guard = Some(chain),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("failed to create chain: {}", e);
            return message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    }

    let chain = match guard.as_ref() {
        Some(chain) => chain,
        None => return message(StatusCode::INTERNAL_SERVER_ERROR, NO_CHAIN_MESSAGE),
    };

    state.metrics.chains_created_total.inc();
    state.metrics.chain_length.set(chain.len() as i64);
    tracing::info!(
        id = %chain.id(),
        name = %chain.name(),
        genesis = %chain.tail().hash(),
        "chain created"
    );

    (
        StatusCode::OK,
        Json(ChainCreatedResponse {
            message: "Chain created!",
            data: chain,
        }),
    )
        .into_response()
}

/// `GET /api/blockchain` — the current chain.
async fn get_chain_handler(State(state): State<AppState>) -> Response {
    let guard = state.chain.read().await;
    (
        StatusCode::OK,
        Json(ChainResponse {
            chain: guard.as_ref(),
        }),
    )
        .into_response()
}

/// `POST /api/blockchain/append` — link a new block to the tail.
async fn append_block_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let (timestamp, transaction) = match body.ok().and_then(|Json(body)| parse_append(&body)) {
        Some(parsed) => parsed,
        None => return message(StatusCode::BAD_REQUEST, BAD_REQUEST_MESSAGE),
    };

    let started = Instant::now();
    let mut guard = state.chain.write().await;
    let chain = match guard.as_mut() {
        Some(chain) => chain,
        None => return message(StatusCode::CONFLICT, NO_CHAIN_MESSAGE),
    };

    let appended = Block::candidate(chain.len() as u64, timestamp, transaction)
        .and_then(|candidate| chain.append(candidate).cloned());
    let block = match appended {
        Ok(block) => block,
        Err(e) => {
            tracing::error!("failed to append block: {}", e);
            return message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };
    let length = chain.len();
    drop(guard);

    state.metrics.blocks_appended_total.inc();
    state.metrics.chain_length.set(length as i64);
    state
        .metrics
        .append_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    tracing::info!(index = block.index(), hash = %block.hash(), "block added");

    (
        StatusCode::OK,
        Json(BlockAddedResponse {
            message: "Block added!",
            block: &block,
        }),
    )
        .into_response()
}

/// `GET /api/blockchain/validate` — integrity check over the whole chain.
///
/// `?strict=true` also re-derives the genesis block.
async fn validate_handler(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Response {
    let guard = state.chain.read().await;
    let chain = match guard.as_ref() {
        Some(chain) => chain,
        None => return message(StatusCode::CONFLICT, NO_CHAIN_MESSAGE),
    };

    let outcome = if query.strict {
        chain.verify_strict()
    } else {
        chain.verify()
    };

    state.metrics.validations_total.inc();
    if let Err(e) = &outcome {
        state.metrics.validation_failures_total.inc();
        tracing::warn!(id = %chain.id(), "chain failed validation: {}", e);
    }

    Json(ValidateResponse {
        valid: outcome.is_ok(),
        length: chain.len(),
        strict: query.strict,
        error: outcome.err().map(|e| e.to_string()),
        checked_at: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
