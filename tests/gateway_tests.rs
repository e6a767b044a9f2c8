use std::time::Duration;

use httpmock::prelude::*;
use saveraks_core::error::GatewayErrorCode;
use saveraks_core::services::gateway::{Envelope, GatewayClient, GatewayOptions};
use serde_json::json;

fn client_for(endpoint: Option<String>, cooldown: Duration) -> GatewayClient {
    GatewayClient::new(GatewayOptions {
        endpoint,
        http_timeout: Duration::from_secs(2),
        breaker_cooldown: cooldown,
    })
    .expect("client should build")
}

#[tokio::test]
async fn login_posts_plain_text_envelope_and_parses_user() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/exec")
                .header("content-type", "text/plain;charset=utf-8")
                .body_contains("\"action\":\"LOGIN\"")
                .body_contains("\"schoolId\":\"SM-2024-889\"");
            then.status(200).json_body(json!({
                "user": {
                    "id": "u1",
                    "name": "Somchai",
                    "schoolId": "SM-2024-889",
                    "role": "STUDENT",
                    "points": 550
                }
            }));
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_secs(60));
    let user = client.login("SM-2024-889").await.expect("login should succeed");

    mock.assert_async().await;
    assert_eq!(user.id, "u1");
    assert_eq!(user.points, 550);
    // Derived fields are recomputed, never trusted from the wire.
    assert_eq!(user.level, 2);
    assert_eq!(user.xp, 550);
}

#[tokio::test]
async fn missing_endpoint_fails_without_any_network_call() {
    let client = client_for(None, Duration::from_secs(60));
    let err = client.login("SM-1").await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::MissingEndpoint));
}

#[tokio::test]
async fn empty_and_undefined_bodies_are_rejected() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(200).body("undefined");
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_secs(60));
    let err = client.leaderboard().await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::EmptyResponse));
}

#[tokio::test]
async fn backend_script_source_in_body_is_reported_as_misconfiguration() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(200)
                .body("TypeError: Cannot read sheet Users via getDataRange at doPost");
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_secs(60));
    let err = client.school_stats().await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::Misconfigured));
}

#[tokio::test]
async fn remote_reported_errors_fail_the_call() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(200)
                .json_body(json!({"status": "error", "message": "unknown school id"}));
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_secs(60));
    let err = client.login("SM-404").await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::RemoteError));
}

#[tokio::test]
async fn breaker_opens_on_failure_and_closes_after_cooldown() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(500);
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_millis(100));

    let err = client.leaderboard().await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::RemoteError));
    assert_eq!(mock.hits_async().await, 1);

    // While open the breaker fails fast without touching the network.
    let err = client.leaderboard().await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::BreakerOpen));
    assert_eq!(mock.hits_async().await, 1);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let err = client.leaderboard().await.unwrap_err();
    assert_eq!(err.gateway_code(), Some(GatewayErrorCode::RemoteError));
    assert_eq!(mock.hits_async().await, 2);
}

#[tokio::test]
async fn successful_call_resets_an_expired_breaker() {
    let server = MockServer::start_async().await;

    let failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("GET_LEADERBOARD");
            then.status(500);
        })
        .await;
    let _stats = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("GET_ADMIN_STATS");
            then.status(200).json_body(json!({
                "totalStudents": 812,
                "totalPoints": 120_500,
                "pendingReports": 3,
                "carbonSaved": 45.2
            }));
        })
        .await;

    let client = client_for(Some(server.url("/exec")), Duration::from_millis(50));

    client.leaderboard().await.unwrap_err();
    assert_eq!(failing.hits_async().await, 1);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let stats = client.school_stats().await.expect("stats should succeed");
    assert_eq!(stats.total_students, 812);

    // The success re-closed the breaker, so the next call reaches the
    // network immediately.
    client.leaderboard().await.unwrap_err();
    assert_eq!(failing.hits_async().await, 2);
}

#[test]
fn log_activity_envelope_stringifies_ai_data() {
    let envelope = Envelope::LogActivity {
        user_id: "u1".into(),
        category: "energy".into(),
        label: "Electricity Bill - June".into(),
        points: 100,
        file_base64: Some("aGVsbG8=".into()),
        mime_type: "image/png".into(),
        ai_data: "{\"units\":120.5}".into(),
    };

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["aiData"], "{\"units\":120.5}");
    assert_eq!(json["fileBase64"], "aGVsbG8=");
}
