#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use theater_booking_api::{
    config::AuthSettings,
    db::{create_orm_conn, run_migrations},
    dto::{
        bookings::CreateBookingRequest,
        shows::{Numeric, ShowPayload, ShowtimeInput},
    },
    entity::users::ActiveModel as UserActive,
    middleware::auth::{AuthUser, Role},
    models::Show,
    services::show_service,
    state::AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-secret";

/// A migrated throwaway SQLite database. Keep it alive for the whole test.
pub struct TestDb {
    pub state: AppState,
    _dir: TempDir,
}

pub async fn setup() -> anyhow::Result<TestDb> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    // One connection: concurrent callers queue up and race on the real indexes.
    let orm = create_orm_conn(&url, 1).await?;
    run_migrations(&orm).await?;

    let state = AppState::new(
        orm,
        AuthSettings {
            jwt_secret: JWT_SECRET.into(),
            token_ttl_hours: 1,
        },
    );
    Ok(TestDb { state, _dir: dir })
}

pub async fn create_account(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        name: Set(format!("{role} {id}")),
        email: Set(format!("{id}@example.com")),
        password_hash: Set("dummy".into()),
        role: Set(role.to_string()),
        booking_ids: Set(serde_json::json!([])),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser { user_id: id, role })
}

pub fn show_payload(total_seats: i64, dates: &[&str]) -> ShowPayload {
    ShowPayload {
        title: Some("Hamlet".into()),
        description: Some("The prince of Denmark seeks revenge.".into()),
        director: Some("Ana Ruiz".into()),
        genre: Some("Drama".into()),
        duration: Some(Numeric::Int(180)),
        room: Some("Main Hall".into()),
        total_seats: Some(Numeric::Int(total_seats)),
        price: Some(Numeric::Int(2500)),
        poster: None,
        actors: Some(vec!["Lucas Vidal".into()]),
        show_times: Some(
            dates
                .iter()
                .map(|date| ShowtimeInput {
                    id: None,
                    date: Some((*date).to_string()),
                })
                .collect(),
        ),
    }
}

pub async fn create_show(
    state: &AppState,
    admin: &AuthUser,
    total_seats: i64,
    dates: &[&str],
) -> anyhow::Result<Show> {
    let resp = show_service::create_show(state, admin, show_payload(total_seats, dates)).await?;
    resp.data.ok_or_else(|| anyhow::anyhow!("create_show returned no data"))
}

pub fn booking_request(
    show: &Show,
    showtime_index: usize,
    user: &AuthUser,
    seats: Vec<i32>,
) -> CreateBookingRequest {
    let showtime = &show.show_times[showtime_index];
    CreateBookingRequest {
        movie: Some(show.id.to_string()),
        date: Some(showtime.date.to_rfc3339()),
        seat_numbers: Some(seats),
        seat_number: None,
        user: Some(user.user_id.to_string()),
        show_time_id: Some(showtime.id.to_string()),
    }
}
