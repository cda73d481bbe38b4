use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "city": state.city.city_name,
        "jobs": state.catalog.list_jobs().len(),
    });
    (StatusCode::OK, Json(body))
}
