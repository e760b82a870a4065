//! HTTP surface of the balancer.
//!
//! - `POST /put` with `{"key": ..., "value": ...}`
//! - `GET /get?key=...`
//! - `DELETE /delete?key=...`
//! - `GET /nodes` - candidate health and ring membership (JSON)
//! - `GET /ring` - ring summary and ownership shares (JSON)
//!
//! Routed requests answer with a plain-text summary naming the node that
//! served them, under the status the backend returned.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Json;
use corelib::{HashRing, Node, Ownership, Topology};
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::metrics;
use crate::monitor::{HealthTable, NodeHealth};
use crate::request::{Operation, Request};
use crate::router::{RouteOutcome, Router};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Router,
    pub health: HealthTable,
}

impl AppState {
    pub fn new(router: Router, health: HealthTable) -> Self {
        Self { router, health }
    }

    fn ring(&self) -> &Arc<HashRing> {
        self.router.ring()
    }
}

pub fn app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/put", post(put_handler))
        .route("/get", get(get_handler))
        .route("/delete", delete(delete_handler))
        .route("/nodes", get(nodes_handler))
        .route("/ring", get(ring_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PutPayload {
    key: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

impl IntoResponse for RouteOutcome {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, self.to_string()).into_response()
    }
}

impl RouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            RouteError::Malformed(_) => StatusCode::BAD_REQUEST,
            RouteError::NoNodes => StatusCode::SERVICE_UNAVAILABLE,
            RouteError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouteError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let body = format!("error ({} stage): {}", self.stage(), self);
        (self.status_code(), body).into_response()
    }
}

async fn route(
    state: &AppState,
    op: Operation,
    request: Result<Request, RouteError>,
) -> Result<RouteOutcome, RouteError> {
    match request {
        Ok(request) => state.router.route(request).await,
        Err(err) => {
            metrics::record_request(op, err.stage());
            Err(err)
        }
    }
}

/// The body is parsed as JSON whatever `Content-Type` says.
async fn put_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<RouteOutcome, RouteError> {
    let request = match Json::<PutPayload>::from_bytes(&body) {
        Ok(Json(payload)) => Request::put(payload.key, payload.value),
        Err(rejection) => Err(RouteError::Malformed(rejection.body_text())),
    };
    route(&state, Operation::Put, request).await
}

fn query_key(
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Option<String>, RouteError> {
    query
        .map(|Query(q)| q.key)
        .map_err(|rejection| RouteError::Malformed(rejection.body_text()))
}

async fn get_handler(
    State(state): State<AppState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<RouteOutcome, RouteError> {
    let request = query_key(query).and_then(Request::get);
    route(&state, Operation::Get, request).await
}

async fn delete_handler(
    State(state): State<AppState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<RouteOutcome, RouteError> {
    let request = query_key(query).and_then(Request::delete);
    route(&state, Operation::Delete, request).await
}

#[derive(Debug, Serialize)]
pub struct NodeStatus {
    pub endpoint: Node,
    pub health: NodeHealth,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub on_ring: bool,
}

async fn nodes_handler(State(state): State<AppState>) -> Json<Vec<NodeStatus>> {
    let snapshot = state.ring().snapshot();
    let statuses = state
        .health
        .entries()
        .into_iter()
        .map(|(node, record)| NodeStatus {
            on_ring: snapshot.contains(&node),
            endpoint: node,
            health: record.health,
            consecutive_failures: record.consecutive_failures,
            last_error: record.last_error,
        })
        .collect();
    Json(statuses)
}

#[derive(Debug, Serialize)]
pub struct RingSummary {
    pub members: usize,
    pub positions: usize,
    pub hash: &'static str,
    pub vnodes_per_node: usize,
    pub ownership: Vec<Ownership>,
}

async fn ring_handler(State(state): State<AppState>) -> Json<RingSummary> {
    let ring = state.ring();
    let snapshot = ring.snapshot();
    Json(RingSummary {
        members: snapshot.node_count(),
        positions: snapshot.token_count(),
        hash: ring.partitioner_name(),
        vnodes_per_node: ring.vnodes_per_node(),
        ownership: Topology::new(snapshot).ownership(),
    })
}
