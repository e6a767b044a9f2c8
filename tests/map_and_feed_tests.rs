use std::time::Duration;

use saveraks_core::app::AppState;
use saveraks_core::error::AppError;
use saveraks_core::models::pin::{PinKind, PinReportInput, PinStatus};
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

fn hazard_input() -> PinReportInput {
    PinReportInput {
        x: 42.0,
        y: 17.5,
        kind: PinKind::Hazard,
        description: "Broken stairs near building 3".into(),
    }
}

#[tokio::test]
async fn reporting_a_pin_earns_points_and_stores_it_open() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();

    let outcome = state.map.report(hazard_input()).await.unwrap();
    assert_eq!(outcome.pin.status, PinStatus::Open);
    assert_eq!(outcome.activity.entry.points, 30);
    assert_eq!(outcome.activity.user.points, 30);

    let pins = state.map.open_pins().unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].kind, PinKind::Hazard);
}

#[tokio::test]
async fn pin_coordinates_and_description_are_validated() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();

    let mut input = hazard_input();
    input.x = 120.0;
    let err = state.map.report(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let mut input = hazard_input();
    input.description = "   ".into();
    let err = state.map.report(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    assert!(state.map.pins().unwrap().is_empty());
}

#[tokio::test]
async fn only_admins_resolve_pins_and_resolution_is_one_way() {
    let (_dir, state) = offline_app();

    state.session.login("SM-1").await.unwrap();
    let outcome = state.map.report(hazard_input()).await.unwrap();
    let pin_id = outcome.pin.id.clone();

    let err = state.map.resolve(&pin_id).unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    state.session.logout().unwrap();
    state.session.login("ADMIN-007").await.unwrap();

    let resolved = state.map.resolve(&pin_id).unwrap();
    assert_eq!(resolved.status, PinStatus::Resolved);
    let first_resolved_at = resolved.resolved_at.clone();

    // Second resolve is a no-op, timestamp included.
    let resolved_again = state.map.resolve(&pin_id).unwrap();
    assert_eq!(resolved_again.status, PinStatus::Resolved);
    assert_eq!(resolved_again.resolved_at, first_resolved_at);

    assert!(state.map.open_pins().unwrap().is_empty());
    assert_eq!(state.map.pins().unwrap().len(), 1);
}

#[tokio::test]
async fn resolving_a_missing_pin_is_not_found() {
    let (_dir, state) = offline_app();
    state.session.login("ADMIN-007").await.unwrap();

    let err = state.map.resolve("nope").unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn feed_cards_are_published_from_activity_entries() {
    let (_dir, state) = offline_app();
    state.session.login("SM-1").await.unwrap();

    let outcome = state
        .activity
        .log(saveraks_core::models::activity::ActivityDetails::Commute {
            mode: "bicycle".into(),
        })
        .await
        .unwrap();

    let item = state.feed.publish(&outcome.entry).unwrap();
    assert_eq!(item.description, "Travel by bicycle");
    assert_eq!(item.likes, 0);

    let likes = state.feed.like(&item.id).unwrap();
    assert_eq!(likes, 1);

    let recent = state.feed.recent().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].likes, 1);
}

#[tokio::test]
async fn liking_an_unknown_feed_item_fails() {
    let (_dir, state) = offline_app();
    let err = state.feed.like("missing").unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
