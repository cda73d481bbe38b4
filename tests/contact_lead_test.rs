mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use common::{app, eventually, json_body, urlencoded_request};
use studentjobs_backend::{
    models::submission::SubmissionRow,
    test_dependencies::{SpyMailTransport, SpySubmissionStore, TestDependencies},
};
use tower::ServiceExt;

#[tokio::test]
async fn contact_message_is_stored_and_redirects() {
    let mailer = Arc::new(SpyMailTransport::new());
    let deps = TestDependencies::new().with_mail(mailer.clone());
    let fields = [
        ("name", "Sam"),
        ("email", "sam@example.com"),
        ("subject", "Partnership"),
        ("message", "Can we list our café jobs?"),
    ];
    let resp = app(&deps)
        .oneshot(urlencoded_request("/api/contact", &fields))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/contact/thank-you");

    let rows = deps.store.rows();
    let SubmissionRow::Contact(msg) = &rows[0] else {
        panic!("expected a contact row, got {:?}", rows[0]);
    };
    assert_eq!(msg.subject.as_deref(), Some("Partnership"));

    assert!(eventually(|| mailer.sent().len() == 1).await);
    assert_eq!(mailer.sent()[0].subject, "Contact: Partnership");
}

#[tokio::test]
async fn contact_without_message_is_rejected() {
    let deps = TestDependencies::new();
    let resp = app(&deps)
        .oneshot(urlencoded_request("/api/contact", &[("email", "sam@example.com")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["field"], "message");
    assert_eq!(deps.store.insert_count(), 0);
}

#[tokio::test]
async fn newsletter_lead_defaults_city() {
    let deps = TestDependencies::new();
    let resp = app(&deps)
        .oneshot(urlencoded_request("/api/lead", &[("email", "lee@example.com")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/thank-you?type=newsletter");

    let SubmissionRow::Newsletter(lead) = &deps.store.rows()[0] else {
        panic!("expected a newsletter row");
    };
    assert_eq!(lead.city, "Eindhoven");
    assert_eq!(lead.email, "lee@example.com");
}

#[tokio::test]
async fn honeypot_redirects_like_success() {
    let deps = TestDependencies::new();
    let fields = [("email", "bot@example.com"), ("message", "buy"), ("website", "x")];
    for uri in ["/api/contact", "/api/lead"] {
        let resp = app(&deps)
            .oneshot(urlencoded_request(uri, &fields))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
    assert_eq!(deps.store.insert_count(), 0);
}

#[tokio::test]
async fn newsletter_insert_failure_is_server_error() {
    let deps = TestDependencies::new().with_store(SpySubmissionStore::failing("connection reset"));
    let resp = app(&deps)
        .oneshot(urlencoded_request("/api/lead", &[("email", "lee@example.com")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"], "Failed to subscribe. Please try again.");
}
