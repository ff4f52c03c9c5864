//! HTTP surface tests: status codes and bodies for each outcome class.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use academic_gate_testing::test_clock;
use academics::access::AccessContext;
use academics::app::Lookups;
use academics::mocks::{ScriptedClearance, ScriptedStanding, ScriptedTuition, StaticVerifier};
use academics::records::InMemoryRecordStore;
use academics::remote::{RemoteError, RemoteService};
use academics::{AcademicsApp, Config, TuitionStatus};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const STUDENT: &str = "student-token";
const ADMIN: &str = "admin-token";
const OTHER_STUDENT: &str = "other-student-token";

struct TestApp {
    router: Router,
    tuition: ScriptedTuition,
}

fn app() -> TestApp {
    let tuition = ScriptedTuition::paid();
    let verifier = StaticVerifier::new()
        .with_token(STUDENT, AccessContext::student("A123"))
        .with_token(OTHER_STUDENT, AccessContext::student("B456"))
        .with_token(ADMIN, AccessContext::admin("ADMIN01"));

    let app = AcademicsApp::with_dependencies(
        Config::local("test-secret"),
        Lookups {
            tuition: Arc::new(tuition.clone()),
            standing: Arc::new(ScriptedStanding::active()),
            clearance: Arc::new(ScriptedClearance::approved()),
        },
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(verifier),
        Arc::new(test_clock()),
    );

    TestApp {
        router: app.router(),
        tuition,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_endpoints_answer() {
    let app = app();

    let (status, _) = call(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app.router, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn exam_registration_returns_created_record() {
    let app = app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/exams",
        Some(STUDENT),
        Some(json!({ "title": "Thesis X" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["subject"], "A123");
    assert_eq!(body["title"], "Thesis X");
    assert_eq!(body["status"], "REGISTERED");
}

#[tokio::test]
async fn missing_credential_is_unauthorized() {
    let app = app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/exams",
        None,
        Some(json!({ "title": "Thesis X" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(app.tuition.calls(), 0);
}

#[tokio::test]
async fn anonymous_caller_is_rejected_before_body_parsing() {
    let app = app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/graduations",
        None,
        Some(json!({ "semester": "2025/2026-Genap" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let uri = format!("/api/admin/exams/{}/status", uuid::Uuid::new_v4());
    let (status, _) = call(&app.router, "PUT", &uri, None, Some(json!({ "state": 1 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app.router, "PUT", &uri, Some(STUDENT), Some(json!({ "state": 1 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gate_denial_is_precondition_failed() {
    let app = app();
    app.tuition.set_default(Ok(TuitionStatus::Unpaid));

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/exams",
        Some(STUDENT),
        Some(json!({ "title": "Thesis X" })),
    )
    .await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["code"], "PRECONDITION_DENIED");
    assert_eq!(body["message"], "tuition has not been paid (status: UNPAID)");
}

#[tokio::test]
async fn remote_rejection_message_is_passed_through() {
    let app = app();
    app.tuition.set_default(Err(RemoteError::ApplicationRejected {
        service: RemoteService::Finance,
        message: "Student not found".to_string(),
    }));

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/exams",
        Some(STUDENT),
        Some(json!({ "title": "Thesis X" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "DEPENDENCY_UNAVAILABLE");
    assert_eq!(body["message"], "Student not found");
}

#[tokio::test]
async fn malformed_body_is_unprocessable() {
    let app = app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/graduations",
        Some(STUDENT),
        Some(json!({ "semester": "2025/2026-Genap" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn invalid_course_load_is_unprocessable() {
    let app = app();

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/course-loads",
        Some(STUDENT),
        Some(json!({
            "term": "2025/2026-Ganjil",
            "items": [{ "courseCode": "IF101", "credits": 9 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "invalid credits for IF101: 9 (must be between 1 and 6)"
    );
}

#[tokio::test]
async fn course_load_round_trip_through_me_endpoints() {
    let app = app();

    let (status, created) = call(
        &app.router,
        "POST",
        "/api/course-loads",
        Some(STUDENT),
        Some(json!({
            "term": "2025-Ganjil",
            "items": [
                { "courseCode": "if101", "courseName": "Algorithms", "credits": 3 },
                { "courseCode": "IF102", "credits": 2 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["totalCredits"], 5);
    assert_eq!(created["items"][0]["courseCode"], "IF101");

    let (status, fetched) = call(
        &app.router,
        "GET",
        "/api/me/course-loads/2025-Ganjil",
        Some(STUDENT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (status, _) = call(
        &app.router,
        "GET",
        "/api/me/course-loads/2026-Genap",
        Some(STUDENT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, history) = call(&app.router, "GET", "/api/me/course-loads", Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn term_with_encoded_slash_is_one_path_segment() {
    let app = app();

    let (status, created) = call(
        &app.router,
        "POST",
        "/api/course-loads",
        Some(STUDENT),
        Some(json!({
            "term": "2025/2026-Ganjil",
            "items": [{ "courseCode": "IF101", "credits": 3 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = call(
        &app.router,
        "GET",
        "/api/me/course-loads/2025%2F2026-Ganjil",
        Some(STUDENT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["term"], "2025/2026-Ganjil");
}

#[tokio::test]
async fn admin_update_flow_and_permissions() {
    let app = app();

    let (_, exam) = call(
        &app.router,
        "POST",
        "/api/exams",
        Some(STUDENT),
        Some(json!({ "title": "Thesis X" })),
    )
    .await;
    let uri = format!("/api/admin/exams/{}/status", exam["id"].as_str().unwrap());

    let (status, _) = call(
        &app.router,
        "PUT",
        &uri,
        Some(STUDENT),
        Some(json!({ "status": "APPROVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(
        &app.router,
        "PUT",
        &uri,
        Some(ADMIN),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "APPROVED");

    let (status, graduation) = call(
        &app.router,
        "POST",
        "/api/graduations",
        Some(STUDENT),
        Some(json!({ "period": "2025/2026-Genap" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(graduation["status"], "REGISTERED");

    let (status, body) = call(
        &app.router,
        "POST",
        "/api/graduations",
        Some(STUDENT),
        Some(json!({ "period": "2025/2026-Genap" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, mine) = call(&app.router, "GET", "/api/me/graduations", Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn admin_update_of_unknown_record_is_not_found() {
    let app = app();
    let uri = format!("/api/admin/graduations/{}/status", uuid::Uuid::new_v4());

    let (status, body) = call(
        &app.router,
        "PUT",
        &uri,
        Some(ADMIN),
        Some(json!({ "status": "APPROVED" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn response_echoes_correlation_id() {
    let app = app();
    let id = uuid::Uuid::new_v4();

    let request = Request::builder()
        .uri("/api/me/exams")
        .header(header::AUTHORIZATION, format!("Bearer {STUDENT}"))
        .header("X-Correlation-ID", id.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["X-Correlation-ID"].to_str().unwrap(),
        id.to_string()
    );
}

#[tokio::test]
async fn shared_correlation_id_does_not_merge_requests() {
    let app = app();
    let id = uuid::Uuid::new_v4().to_string();

    let request = |token: &str, title: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/exams")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Correlation-ID", id.as_str())
            .body(Body::from(json!({ "title": title }).to_string()))
            .unwrap()
    };

    let (first, second) = tokio::join!(
        app.router.clone().oneshot(request(STUDENT, "Alice thesis")),
        app.router.clone().oneshot(request(OTHER_STUDENT, "Bob thesis")),
    );

    for (response, subject, title) in [
        (first.unwrap(), "A123", "Alice thesis"),
        (second.unwrap(), "B456", "Bob thesis"),
    ] {
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["subject"], subject);
        assert_eq!(body["title"], title);
    }

    let (_, mine) = call(&app.router, "GET", "/api/me/exams", Some(OTHER_STUDENT), None).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}
