mod common;

use axum::http::{header, StatusCode};
use common::{app, get, json_body};
use studentjobs_backend::test_dependencies::TestDependencies;
use tower::ServiceExt;

fn slugs(body: &serde_json::Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["slug"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn lists_all_jobs_in_source_order() {
    let deps = TestDependencies::new();
    let resp = app(&deps).oneshot(get("/api/jobs")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["total"], 5);
    assert_eq!(
        slugs(&body),
        vec![
            "domakin-agent-eindhoven",
            "ib-tutor",
            "pepperminds-door-to-door-sales-eindhoven-nl",
            "thuisbezorgd-takeaway-courier-netherlands",
            "uber-eats-courier-eindhoven",
        ]
    );
    assert_eq!(
        body["items"][0]["shortDescription"],
        "€30 per gig — €300 per sale — Domakin helps students in the Netherlands find housing."
    );
    assert_eq!(body["items"][1]["DUO"], true);
    assert_eq!(body["items"][1]["datePosted"], "2026-02-14");
}

#[tokio::test]
async fn query_filters_compose() {
    let deps = TestDependencies::new();
    let body = json_body(
        app(&deps)
            .oneshot(get("/api/jobs?category=sales&english=false"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(slugs(&body), vec!["pepperminds-door-to-door-sales-eindhoven-nl"]);

    let body = json_body(app(&deps).oneshot(get("/api/jobs?q=courier")).await.unwrap()).await;
    assert_eq!(
        slugs(&body),
        vec!["thuisbezorgd-takeaway-courier-netherlands", "uber-eats-courier-eindhoven"]
    );

    let body = json_body(app(&deps).oneshot(get("/api/jobs?category=logistics")).await.unwrap()).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn featured_excludes_unfeatured_jobs() {
    let deps = TestDependencies::new();
    let body = json_body(app(&deps).oneshot(get("/api/jobs/featured")).await.unwrap()).await;
    let featured = slugs(&body);
    assert_eq!(featured.len(), 4);
    assert!(!featured.contains(&"uber-eats-courier-eindhoven".to_string()));
}

#[tokio::test]
async fn job_detail_and_missing_job() {
    let deps = TestDependencies::new();
    let resp = app(&deps).oneshot(get("/api/jobs/ib-tutor")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["orgName"], "AcademiaAI");
    assert_eq!(body["baseSalaryMin"], 20.0);

    let resp = app(&deps).oneshot(get("/api/jobs/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "Job not found");
}

#[tokio::test]
async fn categories_carry_counts() {
    let deps = TestDependencies::new();
    let body = json_body(app(&deps).oneshot(get("/api/categories")).await.unwrap()).await;
    assert_eq!(body["city"], "Eindhoven");
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 7);
    let fieldwork = items.iter().find(|i| i["key"] == "fieldwork").unwrap();
    assert_eq!(fieldwork["count"], 3);
    assert_eq!(fieldwork["label"], "Fieldwork");
}

#[tokio::test]
async fn apply_link_prefers_external_url() {
    let deps = TestDependencies::new();
    let resp = app(&deps)
        .oneshot(get("/jobs/thuisbezorgd-takeaway-courier-netherlands/apply"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()[header::LOCATION],
        "http://short.takeaway.com/nl355999758"
    );

    let resp = app(&deps).oneshot(get("/jobs/ib-tutor/apply")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/jobs/ib-tutor#apply");
}

#[tokio::test]
async fn health_reports_catalog_size() {
    let deps = TestDependencies::new();
    let resp = app(&deps).oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"], 5);
}
