use std::time::Duration;

use saveraks_core::app::AppState;
use saveraks_core::error::AppError;
use saveraks_core::models::activity::ActionKind;
use saveraks_core::services::gateway::GatewayOptions;
use tempfile::TempDir;

fn offline_app() -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let state = AppState::with_gateway(
        dir.path(),
        GatewayOptions {
            endpoint: None,
            http_timeout: Duration::from_secs(2),
            breaker_cooldown: Duration::from_secs(60),
        },
    )
    .expect("app state should build");
    (dir, state)
}

#[tokio::test]
async fn catalog_lists_the_four_rewards() {
    let (_dir, state) = offline_app();
    let catalog = state.rewards.catalog();
    assert_eq!(catalog.len(), 4);
    assert!(catalog.iter().any(|reward| reward.title == "Late Pass"));
}

#[tokio::test]
async fn redemption_needs_sufficient_points() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();
    state.session.apply_points_delta(100).unwrap();

    let err = state.rewards.redeem("r1").await.unwrap_err();
    match err {
        AppError::InsufficientPoints {
            required,
            available,
        } => {
            assert_eq!(required, 500);
            assert_eq!(available, 100);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Balance untouched after the refusal.
    let user = state.session.current_user().unwrap().unwrap();
    assert_eq!(user.points, 100);
}

#[tokio::test]
async fn redemption_deducts_exactly_the_cost_and_issues_a_code() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();
    state.session.apply_points_delta(700).unwrap();

    let outcome = state.rewards.redeem("r2").await.unwrap();
    assert_eq!(outcome.redemption.cost, 150);
    assert!(outcome.redemption.code.starts_with("SR-"));
    assert_eq!(outcome.redemption.code.len(), 9);
    assert_eq!(outcome.user.points, 550);

    let history = state.activity.history(10).unwrap();
    assert_eq!(history[0].kind, ActionKind::Redemption);
    assert_eq!(history[0].points, -150);
}

#[tokio::test]
async fn unknown_reward_is_not_found() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();
    state.session.apply_points_delta(10_000).unwrap();

    let err = state.rewards.redeem("r99").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn redemption_without_a_session_is_rejected() {
    let (_dir, state) = offline_app();
    let err = state.rewards.redeem("r1").await.unwrap_err();
    assert!(matches!(err, AppError::NoSession));
}
