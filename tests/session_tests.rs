use std::time::Duration;

use httpmock::prelude::*;
use saveraks_core::app::AppState;
use saveraks_core::db::repositories::SettingsRepository;
use saveraks_core::error::AppError;
use saveraks_core::models::user::UserRole;
use saveraks_core::services::gateway::GatewayOptions;
use serde_json::json;
use tempfile::TempDir;

fn app_for(endpoint: Option<String>) -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let state = AppState::with_gateway(
        dir.path(),
        GatewayOptions {
            endpoint,
            http_timeout: Duration::from_secs(2),
            breaker_cooldown: Duration::from_secs(60),
        },
    )
    .expect("app state should build");
    (dir, state)
}

#[tokio::test]
async fn remote_login_persists_session_with_derived_fields() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("LOGIN");
            then.status(200).json_body(json!({
                "user": {
                    "id": "u9",
                    "name": "Ploy",
                    "schoolId": "SM-2024-001",
                    "classRoom": "M.5/2",
                    "role": "STUDENT",
                    "points": 5240
                }
            }));
        })
        .await;

    let (_dir, state) = app_for(Some(server.url("/exec")));

    let user = state.session.login("SM-2024-001").await.unwrap();
    assert_eq!(user.level, 5);

    let stored = state.session.current_user().unwrap().unwrap();
    assert_eq!(stored.id, "u9");
    assert_eq!(stored.class_room.as_deref(), Some("M.5/2"));
}

#[tokio::test]
async fn login_reuses_matching_session_without_touching_the_remote() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("LOGIN");
            then.status(200).json_body(json!({
                "user": {
                    "id": "u1",
                    "name": "Somchai",
                    "schoolId": "SM-2024-889",
                    "role": "STUDENT",
                    "points": 0
                }
            }));
        })
        .await;

    let (_dir, state) = app_for(Some(server.url("/exec")));

    state.session.login("SM-2024-889").await.unwrap();
    state.session.login("SM-2024-889").await.unwrap();
    assert_eq!(mock.hits_async().await, 1);

    state.session.login("sm-2024-889").await.unwrap();
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn unreachable_remote_yields_an_offline_session() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(500);
        })
        .await;

    let (_dir, state) = app_for(Some(server.url("/exec")));

    let user = state.session.login("ADMIN-007").await.unwrap();
    assert_eq!(user.role, UserRole::Admin);
    assert_eq!(user.points, 0);
    assert!(user.id.starts_with("local-"));

    // The offline session persists like any other.
    let stored = state.session.current_user().unwrap().unwrap();
    assert_eq!(stored.role, UserRole::Admin);
}

#[tokio::test]
async fn register_falls_back_with_the_requested_name() {
    let (_dir, state) = app_for(None);

    let user = state.session.register("Malee", "SM-2024-777").await.unwrap();
    assert_eq!(user.name, "Malee");
    assert_eq!(user.role, UserRole::Student);

    let err = state.session.register("", "SM-1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (_dir, state) = app_for(None);

    state.session.login("SM-2024-889").await.unwrap();
    state.session.logout().unwrap();
    assert!(state.session.current_user().unwrap().is_none());

    let err = state.session.apply_points_delta(10).unwrap_err();
    assert!(matches!(err, AppError::NoSession));
}

#[tokio::test]
async fn corrupted_session_record_is_discarded() {
    let (_dir, state) = app_for(None);

    let conn = state.db_pool.get_connection().unwrap();
    SettingsRepository::upsert(&conn, "session.user", "{not json").unwrap();
    drop(conn);

    assert!(state.session.current_user().unwrap().is_none());
    // And it stays gone.
    assert!(state.session.current_user().unwrap().is_none());
}

#[tokio::test]
async fn point_deltas_recompute_level_and_xp() {
    let (_dir, state) = app_for(None);

    state.session.login("SM-2024-889").await.unwrap();
    let user = state.session.apply_points_delta(550).unwrap();
    assert_eq!(user.points, 550);
    assert_eq!(user.xp, 550);
    assert_eq!(user.level, 2);

    let user = state.session.adopt_remote_total(8_000).unwrap();
    assert_eq!(user.level, 6);
}
