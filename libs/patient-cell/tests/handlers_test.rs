use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use patient_cell::{create_patient_router, InMemoryPatientDirectory, PatientDirectory};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn router(config: &TestConfig, directory: Arc<InMemoryPatientDirectory>) -> Router {
    create_patient_router(config.to_arc(), directory)
}

async fn send(router: Router, method: Method, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn profile_body() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@example.com",
        "phoneNumber": "+234 801 234 5678",
        "gender": "FEMALE",
        "address": "4 Broad Street",
        "bloodGroup": "AB-",
        "genotype": "AS"
    })
}

#[tokio::test]
async fn patient_registers_and_reads_own_profile() {
    let config = TestConfig::default();
    let directory = Arc::new(InMemoryPatientDirectory::new());
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let (status, created) = send(router(&config, directory.clone()), Method::POST, "/", &token, Some(profile_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!(patient.id));
    assert_eq!(created["registrationSource"], "ACCOUNT");

    let (status, _) = send(router(&config, directory.clone()), Method::POST, "/", &token, Some(profile_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = send(
        router(&config, directory.clone()),
        Method::GET,
        &format!("/{}", patient.id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["bloodGroup"], "AB-");
}

#[tokio::test]
async fn patients_cannot_read_other_profiles() {
    let config = TestConfig::default();
    let directory = Arc::new(InMemoryPatientDirectory::new());
    let owner = TestUser::patient("owner@example.com");
    directory
        .register_account(owner.id, serde_json::from_value(profile_body()).unwrap())
        .await
        .unwrap();

    let snooper = TestUser::patient("snooper@example.com");
    let token = JwtTestUtils::create_test_token(&snooper, &config.jwt_secret, None);
    let (status, body) = send(router(&config, directory.clone()), Method::GET, &format!("/{}", owner.id), &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "policy_error");

    let receptionist = TestUser::receptionist("desk@example.com");
    let token = JwtTestUtils::create_test_token(&receptionist, &config.jwt_secret, None);
    let (status, _) = send(router(&config, directory), Method::GET, &format!("/{}", owner.id), &token, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn staff_cannot_register_account_profiles() {
    let config = TestConfig::default();
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    let (status, _) = send(
        router(&config, Arc::new(InMemoryPatientDirectory::new())),
        Method::POST,
        "/",
        &token,
        Some(profile_body()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let config = TestConfig::default();
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_expired_token(&patient, &config.jwt_secret);

    let (status, _) = send(
        router(&config, Arc::new(InMemoryPatientDirectory::new())),
        Method::GET,
        &format!("/{}", patient.id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
