use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod doc;
pub mod health;
pub mod notifications;
pub mod params;
pub mod shows;

// State is attached once, by the caller that owns the `AppState`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/movie", shows::router())
        .nest("/booking", bookings::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
}
