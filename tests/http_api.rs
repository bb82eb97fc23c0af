mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use theater_booking_api::{
    app::{build_app, cors_layer},
    middleware::auth::{AuthUser, Role},
    services::auth_service::issue_token,
};
use tower::ServiceExt;

fn app(db: &common::TestDb) -> anyhow::Result<Router> {
    Ok(build_app(db.state.clone(), cors_layer(None)?))
}

fn bearer(db: &common::TestDb, user: &AuthUser) -> anyhow::Result<String> {
    Ok(format!(
        "Bearer {}",
        issue_token(&db.state.auth, user.user_id, user.role)?
    ))
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_reports_the_database() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let response = app(&db)?
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await?;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "up");
    Ok(())
}

#[tokio::test]
async fn booking_without_a_token_is_unauthorized() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let response = app(&db)?
        .oneshot(
            Request::post("/api/booking")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "seatNumber": 1 }).to_string()))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["code"], "unauthorized");
    Ok(())
}

#[tokio::test]
async fn occupied_seats_without_ids_is_a_validation_error() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let response = app(&db)?
        .oneshot(Request::get("/api/booking/occupied-seats").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["code"], "validation_failed");
    assert_eq!(body["data"]["fields"], json!(["movieId", "showTimeId"]));
    Ok(())
}

#[tokio::test]
async fn booking_then_double_booking_over_http() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;
    let showtime = &show.show_times[0];

    let body = json!({
        "movie": show.id.to_string(),
        "date": "2026-12-01",
        "seatNumber": 12,
        "user": user.user_id.to_string(),
        "showTimeId": showtime.id.to_string(),
    })
    .to_string();
    let request = || -> anyhow::Result<Request<Body>> {
        Ok(Request::post("/api/booking")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, bearer(&db, &user)?)
            .body(Body::from(body.clone()))?)
    };

    let app = app(&db)?;
    let first = app.clone().oneshot(request()?).await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let created = body_json(first).await?;
    assert_eq!(created["data"]["bookings"][0]["seatNumber"], 12);

    let second = app.clone().oneshot(request()?).await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let conflict = body_json(second).await?;
    assert_eq!(conflict["data"]["code"], "seat_taken");
    assert_eq!(conflict["data"]["seat"], 12);

    let uri = format!(
        "/api/booking/occupied-seats?movieId={}&showTimeId={}",
        show.id, showtime.id
    );
    let occupied = app
        .oneshot(Request::get(uri.as_str()).body(Body::empty())?)
        .await?;
    assert_eq!(occupied.status(), StatusCode::OK);
    let occupied = body_json(occupied).await?;
    assert_eq!(occupied["data"]["occupiedSeats"], json!([12]));
    Ok(())
}

#[tokio::test]
async fn admin_token_cannot_book_over_http() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let response = app(&db)?
        .oneshot(
            Request::post("/api/booking")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, bearer(&db, &admin)?)
                .body(Body::from(
                    json!({
                        "movie": show.id.to_string(),
                        "date": "2026-12-01",
                        "seatNumbers": [1],
                        "user": admin.user_id.to_string(),
                        "showTimeId": show.show_times[0].id.to_string(),
                    })
                    .to_string(),
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn register_login_and_list_movies() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;
    let app = app(&db)?;

    let register = json!({ "name": "Ada", "email": "ada@example.com", "password": "s3cret" });
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register.to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register.to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "ada@example.com", "password": "s3cret" }).to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await?;
    assert_eq!(login["data"]["role"], "user");
    assert!(login["data"]["token"].as_str().unwrap().starts_with("Bearer "));

    let response = app
        .oneshot(Request::get("/api/movie?q=HAM&per_page=5").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await?;
    assert_eq!(list["meta"]["total"], 1);
    assert_eq!(list["data"][0]["showTimes"][0]["availableSeats"], 50);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let app = app(&db)?;

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/booking")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, bearer(&db, &user)?)
                .body(Body::from(json!({ "seatNumbers": "abc" }).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["code"], "bad_request");
    assert!(body["data"]["error"].as_str().is_some_and(|e| !e.is_empty()));

    let response = app
        .oneshot(
            Request::post("/api/auth/login")
                .body(Body::from(r#"{"email": "#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["code"], "bad_request");
    Ok(())
}
