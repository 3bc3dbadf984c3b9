use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::AppResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shows/{show_id}", get(get_show_seats))
}

// GET /api/shows/{show_id}
async fn get_show_seats(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let view = state.availability.resolve(show_id).await?;
    Ok(Json(json!({ "data": view })))
}
