pub mod health;
pub mod jobs;
pub mod submissions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

/// Every route the service answers, without the outer tower layers.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let read_api = Router::new()
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/jobs/featured", get(jobs::list_featured_jobs))
        .route("/api/jobs/:slug", get(jobs::get_job))
        .route("/api/categories", get(jobs::list_categories))
        .route("/jobs/:slug/apply", get(jobs::apply_redirect));

    let forms = Router::new()
        .route("/api/job-apply", post(submissions::submit_job_application))
        .route("/api/employer-jobs", post(submissions::submit_employer_job))
        .route("/api/contact", post(submissions::submit_contact))
        .route("/api/lead", post(submissions::subscribe_newsletter))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes));

    Router::new()
        .route("/health", get(health::health))
        .merge(read_api)
        .merge(forms)
        .with_state(state)
}
