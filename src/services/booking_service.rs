//! The only entry point that creates bookings, and the owner of cascading
//! cancellation when performances disappear from the catalog.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::bookings::{BookingList, CreateBookingRequest, CreatedBookings, OccupiedSeats, OccupiedSeatsQuery, parse_id},
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings, Model as BookingModel},
        showtimes::{Column as ShowtimeCol, Entity as Showtimes},
        shows::{Entity as Shows, Model as ShowModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_booker},
    models::Booking,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        booking_refs,
        notification_service::{self, Severity},
        seat_ledger::{self, NewBooking},
    },
    state::AppState,
};

/// Validates and commits a booking request.
///
/// All seats of one request are written in a single transaction: if any seat
/// is already taken, none of the request's seats are kept and the caller gets
/// [`AppError::SeatAlreadyBooked`] naming the first conflicting seat.
pub async fn create_bookings(
    state: &AppState,
    principal: &AuthUser,
    request: CreateBookingRequest,
) -> AppResult<ApiResponse<CreatedBookings>> {
    ensure_booker(principal)?;
    let command = request.validate()?;
    if command.user_id != principal.user_id {
        return Err(AppError::Forbidden);
    }

    let show = Shows::find_by_id(command.show_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("movie"))?;
    let user = Users::find_by_id(command.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let showtime = Showtimes::find_by_id(command.showtime_id)
        .filter(ShowtimeCol::ShowId.eq(show.id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("showtime"))?;

    if let Some(seat) = command.seats.iter().find(|seat| **seat > show.total_seats) {
        return Err(AppError::BadRequest(format!(
            "seat number {seat} is outside 1..={}",
            show.total_seats
        )));
    }

    let txn = state.orm.begin().await?;
    let mut created = Vec::with_capacity(command.seats.len());
    for seat in &command.seats {
        let booking = NewBooking {
            show_id: show.id,
            showtime_id: showtime.id,
            seat_number: *seat,
            user_id: user.id,
            price: show.price,
            show_date: showtime.starts_at.with_timezone(&Utc),
        };
        match seat_ledger::create_booking(&txn, booking).await {
            Ok(model) => created.push(model),
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "booking rollback failed");
                }
                return Err(err);
            }
        }
    }
    txn.commit().await?;

    let ids: Vec<Uuid> = created.iter().map(|b| b.id).collect();
    booking_refs::record(&state.orm, user.id, show.id, &ids).await;

    tracing::info!(
        show_id = %show.id,
        showtime_id = %showtime.id,
        user_id = %user.id,
        seats = ?command.seats,
        "bookings created"
    );
    audit::record(
        &state.orm,
        Some(principal.user_id),
        "booking_create",
        "bookings",
        serde_json::json!({ "booking_ids": ids, "show_id": show.id, "showtime_id": showtime.id }),
    )
    .await;

    let bookings = created.into_iter().map(Booking::from).collect();
    Ok(ApiResponse::success(
        "Booking created",
        CreatedBookings { bookings },
        Some(Meta::empty()),
    ))
}

pub async fn occupied_seats(
    state: &AppState,
    query: OccupiedSeatsQuery,
) -> AppResult<ApiResponse<OccupiedSeats>> {
    let mut missing = Vec::new();
    if query.movie_id.as_deref().is_none_or(|v| v.trim().is_empty()) {
        missing.push("movieId");
    }
    if query.show_time_id.as_deref().is_none_or(|v| v.trim().is_empty()) {
        missing.push("showTimeId");
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let show_id = parse_id("movieId", query.movie_id.as_deref())?;
    let showtime_id = parse_id("showTimeId", query.show_time_id.as_deref())?;
    let seats = seat_ledger::list_occupied_seats(&state.orm, show_id, showtime_id).await?;

    Ok(ApiResponse::success(
        "Occupied seats",
        OccupiedSeats {
            movie_id: show_id,
            show_time_id: showtime_id,
            occupied_seats: seats.into_iter().collect(),
        },
        Some(Meta::empty()),
    ))
}

/// Deletes a booking on behalf of its owner or an admin.
pub async fn cancel_booking(
    state: &AppState,
    principal: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    let booking = seat_ledger::find_booking(&state.orm, id).await?;
    if !principal.is_admin() && booking.user_id != principal.user_id {
        return Err(AppError::Forbidden);
    }

    let deleted = seat_ledger::delete_booking(&state.orm, id).await?;

    audit::record(
        &state.orm,
        Some(principal.user_id),
        "booking_delete",
        "bookings",
        serde_json::json!({ "booking_id": id, "seat": deleted.seat_number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Booking deleted",
        Booking::from(deleted),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_bookings(
    state: &AppState,
    principal: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Bookings::find()
        .filter(BookingCol::UserId.eq(principal.user_id))
        .order_by_desc(BookingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Booking::from)
        .collect();

    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// What a cascade did: the bookings it removed and who was told.
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    pub cancelled: Vec<BookingModel>,
    pub notified_users: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy)]
pub enum CascadeReason {
    ShowtimeRemoved,
    ShowDeleted,
}

impl CascadeReason {
    fn message(&self, title: &str) -> String {
        match self {
            CascadeReason::ShowtimeRemoved => format!(
                "A performance of \"{title}\" was removed from the schedule. Your booking for it has been cancelled."
            ),
            CascadeReason::ShowDeleted => {
                format!("\"{title}\" has been cancelled. Your booking for it has been cancelled.")
            }
        }
    }
}

/// Deletes the given showtimes of a show together with every booking held at
/// them, on the caller's connection. Meant to run inside the transaction that
/// rewrites the show: the showtime rows are locked first, so a booking racing
/// this call either commits before the lock and is cancelled here, or fails
/// on the missing showtime afterwards. Returns exactly the bookings removed.
pub async fn cancel_showtimes<C: ConnectionTrait>(
    conn: &C,
    show_id: Uuid,
    showtime_ids: &HashSet<Uuid>,
) -> AppResult<Vec<BookingModel>> {
    if showtime_ids.is_empty() {
        return Ok(Vec::new());
    }

    Showtimes::find()
        .select_only()
        .column(ShowtimeCol::Id)
        .filter(ShowtimeCol::ShowId.eq(show_id))
        .filter(ShowtimeCol::Id.is_in(showtime_ids.iter().copied()))
        .lock_exclusive()
        .into_tuple::<Uuid>()
        .all(conn)
        .await?;

    let cancelled = seat_ledger::bookings_for(conn, show_id, showtime_ids).await?;
    seat_ledger::delete_bookings(conn, &cancelled).await?;

    Showtimes::delete_many()
        .filter(ShowtimeCol::ShowId.eq(show_id))
        .filter(ShowtimeCol::Id.is_in(showtime_ids.iter().copied()))
        .exec(conn)
        .await?;

    Ok(cancelled)
}

/// Follow-up for bookings removed by [`cancel_showtimes`], run once their
/// transaction has committed: drops them from the cached ref lists and tells
/// each affected user once. Notification failures are logged, never returned.
pub async fn announce_cancellations(
    state: &AppState,
    actor: &AuthUser,
    show: &ShowModel,
    cancelled: Vec<BookingModel>,
    reason: CascadeReason,
) -> CascadeOutcome {
    if cancelled.is_empty() {
        return CascadeOutcome::default();
    }

    booking_refs::release(&state.orm, &cancelled).await;

    let users: Vec<Uuid> = cancelled
        .iter()
        .map(|b| b.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if let Err(err) = notification_service::notify(
        &state.orm,
        &users,
        "Booking cancelled",
        &reason.message(&show.title),
        Severity::Warning,
    )
    .await
    {
        tracing::warn!(error = %err, show_id = %show.id, "cancellation notification failed");
    }

    let showtime_ids: BTreeSet<Uuid> = cancelled.iter().map(|b| b.showtime_id).collect();
    tracing::info!(
        show_id = %show.id,
        cancelled = cancelled.len(),
        affected_users = users.len(),
        reason = ?reason,
        "cascade cancellation"
    );
    audit::record(
        &state.orm,
        Some(actor.user_id),
        "booking_cascade_cancel",
        "bookings",
        serde_json::json!({
            "show_id": show.id,
            "showtime_ids": showtime_ids,
            "cancelled": cancelled.len(),
        }),
    )
    .await;

    CascadeOutcome {
        cancelled,
        notified_users: users,
    }
}
