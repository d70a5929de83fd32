//! Graph status route.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use ifcg_graph::GraphCounts;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub counts: GraphCounts,
}

pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let counts = state
        .store
        .counts()
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    Ok(Json(StatusResponse { status: "ok", counts }))
}
