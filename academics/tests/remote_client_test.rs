//! GraphQL adapters against a local fake service.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use academics::remote::{
    ClearanceLookup, FinanceClient, GraphqlClient, LibraryClient, RemoteError, RemoteService,
    StandingLookup, StudentClient, TuitionLookup,
};
use academics::{AcademicStanding, SubjectId, TuitionStatus};
use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve a single canned GraphQL answer and return its endpoint.
async fn fake_service(status: StatusCode, body: Value) -> String {
    fake_service_with_delay(status, body, Duration::ZERO).await
}

async fn fake_service_with_delay(status: StatusCode, body: Value, delay: Duration) -> String {
    let app = Router::new().route(
        "/graphql",
        post(move |Json(_request): Json<Value>| {
            let body = body.clone();
            async move {
                tokio::time::sleep(delay).await;
                (status, Json(body))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/graphql")
}

fn client(service: RemoteService, endpoint: &str) -> GraphqlClient {
    GraphqlClient::new(service, endpoint, Duration::from_millis(500)).unwrap()
}

fn subject() -> SubjectId {
    SubjectId::new("A123")
}

#[tokio::test]
async fn finance_status_is_mapped() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "checkTuitionStatus": { "status": "PAID" } } }),
    )
    .await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let status = finance.tuition_status(&subject()).await.unwrap();

    assert_eq!(status, TuitionStatus::Paid);
}

#[tokio::test]
async fn lowercase_finance_status_is_not_paid() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "checkTuitionStatus": { "status": "paid" } } }),
    )
    .await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let status = finance.tuition_status(&subject()).await.unwrap();

    assert_eq!(status, TuitionStatus::Other("paid".to_string()));
    assert!(academics::rules::tuition_gate(&status).is_err());
}

#[tokio::test]
async fn lowercase_student_status_is_not_active() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "studentByNim": {
            "nim": "A123",
            "fullName": "Ayu Lestari",
            "major": "Informatics",
            "status": "active"
        } } }),
    )
    .await;
    let students = StudentClient::new(client(RemoteService::Student, &endpoint));

    let profile = students.student_profile(&subject()).await.unwrap();

    assert_eq!(profile.standing, AcademicStanding::Other("active".to_string()));
}

#[tokio::test]
async fn student_profile_is_mapped() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "studentByNim": {
            "nim": "A123",
            "fullName": "Ayu Lestari",
            "major": "Informatics",
            "status": "ACTIVE"
        } } }),
    )
    .await;
    let students = StudentClient::new(client(RemoteService::Student, &endpoint));

    let profile = students.student_profile(&subject()).await.unwrap();

    assert_eq!(profile.name, "Ayu Lestari");
    assert_eq!(profile.standing, AcademicStanding::Active);
}

#[tokio::test]
async fn null_student_is_an_application_rejection() {
    let endpoint = fake_service(StatusCode::OK, json!({ "data": { "studentByNim": null } })).await;
    let students = StudentClient::new(client(RemoteService::Student, &endpoint));

    let error = students.student_profile(&subject()).await.unwrap_err();

    assert_eq!(error.to_string(), "A123 not found in Student Service");
}

#[tokio::test]
async fn first_graphql_error_is_returned_verbatim() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({
            "data": null,
            "errors": [{ "message": "Tuition record not found" }, { "message": "second" }]
        }),
    )
    .await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert_eq!(
        error,
        RemoteError::ApplicationRejected {
            service: RemoteService::Finance,
            message: "Tuition record not found".to_string(),
        }
    );
}

#[tokio::test]
async fn missing_clearance_record_is_none() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "checkLibraryClearance": null } }),
    )
    .await;
    let library = LibraryClient::new(client(RemoteService::Library, &endpoint));

    let clearance = library.library_clearance(&subject()).await.unwrap();

    assert!(clearance.is_none());
}

#[tokio::test]
async fn absent_approval_flag_means_not_approved() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "checkLibraryClearance": { "reason": "late fees" } } }),
    )
    .await;
    let library = LibraryClient::new(client(RemoteService::Library, &endpoint));

    let clearance = library.library_clearance(&subject()).await.unwrap().unwrap();

    assert!(!clearance.approved);
    assert_eq!(clearance.reason.as_deref(), Some("late fees"));
}

#[tokio::test]
async fn response_without_data_is_malformed() {
    let endpoint = fake_service(StatusCode::OK, json!({})).await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert_eq!(error.outcome(), "malformed");
}

#[tokio::test]
async fn unexpected_shape_is_malformed() {
    let endpoint = fake_service(
        StatusCode::OK,
        json!({ "data": { "checkTuitionStatus": { "state": "PAID" } } }),
    )
    .await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert!(matches!(error, RemoteError::MalformedResponse { .. }));
}

#[tokio::test]
async fn server_error_is_unreachable() {
    let endpoint = fake_service(StatusCode::BAD_GATEWAY, json!({ "data": null })).await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert!(matches!(error, RemoteError::Unreachable { .. }));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let finance = FinanceClient::new(client(
        RemoteService::Finance,
        &format!("http://{addr}/graphql"),
    ));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert_eq!(error.service(), RemoteService::Finance);
    assert_eq!(error.outcome(), "unreachable");
}

#[tokio::test]
async fn slow_service_times_out_as_unreachable() {
    let endpoint = fake_service_with_delay(
        StatusCode::OK,
        json!({ "data": { "checkTuitionStatus": { "status": "PAID" } } }),
        Duration::from_secs(2),
    )
    .await;
    let finance = FinanceClient::new(client(RemoteService::Finance, &endpoint));

    let error = finance.tuition_status(&subject()).await.unwrap_err();

    assert!(matches!(error, RemoteError::Unreachable { .. }));
}
