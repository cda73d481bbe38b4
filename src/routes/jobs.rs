use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Redirect},
};

use crate::{
    dto::job_dto::{CategoryCount, CategoryListResponse, JobListQuery, JobListResponse},
    error::{Error, Result},
    models::job::{ApplyTarget, JobCategory, JobRecord},
    services::catalog_service::{filter_by_category, filter_by_english_friendly, search},
    AppState,
};

fn parse_english(raw: Option<&str>) -> Option<bool> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let mut items: Box<dyn Iterator<Item = &JobRecord> + '_> =
        Box::new(state.catalog.list_jobs().iter());

    if let Some(q) = query.q.as_deref() {
        items = Box::new(search(items, q));
    }
    if let Some(raw) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        match JobCategory::parse(raw) {
            Some(category) => items = Box::new(filter_by_category(items, category)),
            None => items = Box::new(std::iter::empty()),
        }
    }
    if let Some(english) = parse_english(query.english.as_deref()) {
        items = Box::new(filter_by_english_friendly(items, english));
    }

    Ok(Json(JobListResponse::new(items)))
}

#[axum::debug_handler]
pub async fn list_featured_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(JobListResponse::new(state.catalog.list_featured_jobs())))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let job = state
        .catalog
        .get_job_by_slug(&slug)
        .ok_or_else(|| Error::NotFound("Job not found".into()))?;
    Ok(Json(job.clone()))
}

#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state
        .catalog
        .category_counts(&state.city)
        .into_iter()
        .map(|(key, count)| CategoryCount {
            key,
            label: key.label(),
            count,
        })
        .collect();
    Ok(Json(CategoryListResponse {
        city: state.city.city_name.clone(),
        items,
    }))
}

/// Outbound apply link: the employer's own page when there is one, otherwise
/// the internal form.
#[axum::debug_handler]
pub async fn apply_redirect(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let job = state
        .catalog
        .get_job_by_slug(&slug)
        .ok_or_else(|| Error::NotFound("Job not found".into()))?;

    let target = match job.apply_target() {
        ApplyTarget::External(url) => {
            tracing::info!(slug = %slug, target = %url, "Outbound apply click");
            url.to_string()
        }
        ApplyTarget::Internal => format!("/jobs/{}#apply", job.slug()),
    };
    Ok(Redirect::to(&target))
}
