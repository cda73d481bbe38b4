use axum::{
    extract::State,
    http::{header::REFERER, HeaderMap},
    response::{IntoResponse, Json, Redirect},
};
use serde_json::json;

use crate::{dto::form_dto::RawForm, error::Result, AppState};

const CONTACT_THANK_YOU: &str = "/contact/thank-you";
const NEWSLETTER_THANK_YOU: &str = "/thank-you?type=newsletter";

// Deflected (honeypot) and accepted submissions get the same response.
fn accepted() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

#[axum::debug_handler]
pub async fn submit_job_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: RawForm,
) -> Result<impl IntoResponse> {
    let source_url = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    state
        .submission_service
        .submit_job_application(&form, source_url)
        .await?;
    Ok(accepted())
}

#[axum::debug_handler]
pub async fn submit_employer_job(
    State(state): State<AppState>,
    form: RawForm,
) -> Result<impl IntoResponse> {
    state.submission_service.submit_employer_job(&form).await?;
    Ok(accepted())
}

#[axum::debug_handler]
pub async fn submit_contact(
    State(state): State<AppState>,
    form: RawForm,
) -> Result<impl IntoResponse> {
    state.submission_service.submit_contact(&form).await?;
    Ok(Redirect::to(CONTACT_THANK_YOU))
}

#[axum::debug_handler]
pub async fn subscribe_newsletter(
    State(state): State<AppState>,
    form: RawForm,
) -> Result<impl IntoResponse> {
    state.submission_service.subscribe_newsletter(&form).await?;
    Ok(Redirect::to(NEWSLETTER_THANK_YOU))
}
