use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingList, CreateBookingRequest, CreatedBookings, OccupiedSeats, OccupiedSeatsQuery},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::Booking,
    response::ApiResponse,
    routes::params::Pagination,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/occupied-seats", get(occupied_seats))
        .route("/mine", get(my_bookings))
        .route("/{id}", delete(delete_booking))
}

#[utoipa::path(
    post,
    path = "/api/booking",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Seats booked", body = ApiResponse<CreatedBookings>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Admins cannot book, or booking for someone else"),
        (status = 404, description = "Movie, user or showtime not found"),
        (status = 409, description = "A requested seat is already booked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedBookings>>)> {
    let resp = booking_service::create_bookings(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/booking/occupied-seats",
    params(OccupiedSeatsQuery),
    responses(
        (status = 200, description = "Seat numbers already sold for the showtime", body = ApiResponse<OccupiedSeats>),
        (status = 400, description = "movieId or showTimeId missing"),
    ),
    tag = "Bookings"
)]
pub async fn occupied_seats(
    State(state): State<AppState>,
    Query(query): Query<OccupiedSeatsQuery>,
) -> AppResult<Json<ApiResponse<OccupiedSeats>>> {
    let resp = booking_service::occupied_seats(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/mine",
    params(Pagination),
    responses(
        (status = 200, description = "Bookings of the caller", body = ApiResponse<BookingList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_my_bookings(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/booking/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking deleted", body = ApiResponse<Booking>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Booking not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}
