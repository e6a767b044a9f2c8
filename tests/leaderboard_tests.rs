use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use saveraks_core::db::DbPool;
use saveraks_core::services::gateway::{GatewayClient, GatewayOptions};
use saveraks_core::services::LeaderboardService;
use serde_json::json;
use tempfile::TempDir;

fn gateway_for(endpoint: Option<String>) -> Arc<GatewayClient> {
    Arc::new(
        GatewayClient::new(GatewayOptions {
            endpoint,
            http_timeout: Duration::from_secs(2),
            breaker_cooldown: Duration::from_secs(60),
        })
        .expect("client should build"),
    )
}

#[tokio::test]
async fn leaderboard_snapshot_survives_a_remote_outage() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("GET_LEADERBOARD");
            then.status(200).json_body(json!({
                "leaders": [
                    {"name": "Ploy", "classRoom": "M.5/2", "points": 5240, "level": 5},
                    {"name": "Somchai", "points": 550, "level": 2}
                ]
            }));
        })
        .await;

    let dir = TempDir::new().unwrap();
    let pool = DbPool::new(dir.path().join("test.db")).unwrap();

    let online = LeaderboardService::new(pool.clone(), gateway_for(Some(server.url("/exec"))));
    let leaders = online.leaderboard().await.unwrap();
    mock.assert_async().await;
    assert_eq!(leaders.len(), 2);
    assert_eq!(leaders[0].name, "Ploy");

    // Same database, remote gone: the snapshot is served.
    let offline = LeaderboardService::new(pool, gateway_for(None));
    let cached = offline.leaderboard().await.unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[1].points, 550);
}

#[tokio::test]
async fn leaderboard_is_empty_when_nothing_was_ever_fetched() {
    let dir = TempDir::new().unwrap();
    let pool = DbPool::new(dir.path().join("test.db")).unwrap();

    let service = LeaderboardService::new(pool, gateway_for(None));
    assert!(service.leaderboard().await.unwrap().is_empty());
}

#[tokio::test]
async fn school_stats_fall_back_to_snapshot_then_zeroes() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec").body_contains("GET_ADMIN_STATS");
            then.status(200).json_body(json!({
                "totalStudents": 812,
                "totalPoints": 120500,
                "pendingReports": 3,
                "carbonSaved": 45.2
            }));
        })
        .await;

    let dir = TempDir::new().unwrap();
    let pool = DbPool::new(dir.path().join("test.db")).unwrap();

    let online = LeaderboardService::new(pool.clone(), gateway_for(Some(server.url("/exec"))));
    let stats = online.school_stats().await.unwrap();
    assert_eq!(stats.total_students, 812);
    assert_eq!(stats.carbon_saved, 45.2);

    let offline = LeaderboardService::new(pool, gateway_for(None));
    let cached = offline.school_stats().await.unwrap();
    assert_eq!(cached.total_points, 120_500);

    // Fresh database and no remote: all zeroes rather than an error.
    let empty_dir = TempDir::new().unwrap();
    let empty_pool = DbPool::new(empty_dir.path().join("test.db")).unwrap();
    let empty = LeaderboardService::new(empty_pool, gateway_for(None));
    let zeroed = empty.school_stats().await.unwrap();
    assert_eq!(zeroed.total_students, 0);
    assert_eq!(zeroed.carbon_saved, 0.0);
}
