mod common;

use axum::{extract::State, http::StatusCode};
use theater_booking_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let (status, response) = health_check(State(db.state.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.data.is_some());
    Ok(())
}
