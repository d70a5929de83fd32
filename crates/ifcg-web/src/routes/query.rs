//! Raw query route.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: Option<String>,
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

/// Forward a query verbatim to the store and return its rows.
///
/// No authentication: anything the store accepts, including writes, runs.
pub async fn run_cypher(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Json(req) = payload.map_err(|e| bad_request(e.body_text()))?;
    let query = req
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| bad_request("No query provided"))?;

    debug!(%query, "Running raw query");
    let rows = state.store.run_query(&query).await.map_err(|e| {
        warn!(error = %e, "Raw query failed");
        bad_request(format!("{:#}", e))
    })?;

    Ok(Json(rows))
}
