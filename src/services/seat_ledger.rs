//! Authoritative record of which seats are sold for each showtime.
//!
//! A seat is unique per `(show, showtime, seat)` through the
//! `uq_bookings_show_showtime_seat` index. Inserts never read occupancy first:
//! concurrent callers race on the index and exactly one of them wins.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entity::bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings, Model as BookingModel},
    error::{AppError, AppResult},
    services::booking_refs,
};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub show_id: Uuid,
    pub showtime_id: Uuid,
    pub seat_number: i32,
    pub user_id: Uuid,
    pub price: i64,
    pub show_date: DateTime<Utc>,
}

/// Seat numbers with a live booking for the showtime, ascending. Empty when
/// nothing is booked.
pub async fn list_occupied_seats<C: ConnectionTrait>(
    conn: &C,
    show_id: Uuid,
    showtime_id: Uuid,
) -> AppResult<BTreeSet<i32>> {
    let seats: Vec<i32> = Bookings::find()
        .select_only()
        .column(BookingCol::SeatNumber)
        .filter(BookingCol::ShowId.eq(show_id))
        .filter(BookingCol::ShowtimeId.eq(showtime_id))
        .order_by_asc(BookingCol::SeatNumber)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(seats.into_iter().collect())
}

/// Number of booked seats per showtime, for every id in `showtime_ids`
/// that has at least one booking.
pub async fn occupancy_by_showtime<C: ConnectionTrait>(
    conn: &C,
    showtime_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, i64>> {
    if showtime_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i64)> = Bookings::find()
        .select_only()
        .column(BookingCol::ShowtimeId)
        .column_as(Expr::col(BookingCol::Id).count(), "occupied")
        .filter(BookingCol::ShowtimeId.is_in(showtime_ids))
        .group_by(BookingCol::ShowtimeId)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Inserts one booking. Works on a plain connection or inside a transaction.
pub async fn create_booking<C: ConnectionTrait>(
    conn: &C,
    booking: NewBooking,
) -> AppResult<BookingModel> {
    let seat = booking.seat_number;
    let active = BookingActive {
        id: Set(Uuid::new_v4()),
        show_id: Set(booking.show_id),
        showtime_id: Set(booking.showtime_id),
        seat_number: Set(booking.seat_number),
        user_id: Set(booking.user_id),
        price: Set(booking.price),
        show_date: Set(booking.show_date.into()),
        created_at: Set(Utc::now().into()),
    };

    active.insert(conn).await.map_err(|err| {
        let mapped = translate_insert_error(err, seat);
        if let AppError::SeatAlreadyBooked(_) = mapped {
            tracing::warn!(
                show_id = %booking.show_id,
                showtime_id = %booking.showtime_id,
                seat,
                "seat already booked"
            );
        }
        mapped
    })
}

fn translate_insert_error(err: DbErr, seat: i32) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::SeatAlreadyBooked(seat),
        // The showtime vanished between validation and insert.
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::NotFound("showtime"),
        _ => AppError::OrmError(err),
    }
}

pub async fn find_booking<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<BookingModel> {
    Bookings::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("booking"))
}

/// Removes one booking, then drops its id from the cached lists on the user
/// and the show. Cache cleanup failures are logged, never returned.
pub async fn delete_booking<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<BookingModel> {
    let booking = find_booking(conn, id).await?;

    let result = Bookings::delete_by_id(id).exec(conn).await?;
    if result.rows_affected == 0 {
        // Lost a race with another delete.
        return Err(AppError::NotFound("booking"));
    }

    booking_refs::release(conn, std::slice::from_ref(&booking)).await;
    tracing::info!(booking_id = %id, seat = booking.seat_number, "booking deleted");
    Ok(booking)
}

/// Bookings of `show_id` at any of `showtime_ids`, ordered by showtime and seat.
pub async fn bookings_for<C: ConnectionTrait>(
    conn: &C,
    show_id: Uuid,
    showtime_ids: &HashSet<Uuid>,
) -> AppResult<Vec<BookingModel>> {
    if showtime_ids.is_empty() {
        return Ok(Vec::new());
    }

    let bookings = Bookings::find()
        .filter(BookingCol::ShowId.eq(show_id))
        .filter(BookingCol::ShowtimeId.is_in(showtime_ids.iter().copied()))
        .order_by_asc(BookingCol::ShowtimeId)
        .order_by_asc(BookingCol::SeatNumber)
        .all(conn)
        .await?;

    Ok(bookings)
}

/// Deletes exactly the given bookings and nothing else. Cached ref lists are
/// left alone so the caller can release them after its transaction commits.
pub async fn delete_bookings<C: ConnectionTrait>(
    conn: &C,
    bookings: &[BookingModel],
) -> AppResult<u64> {
    if bookings.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    let result = Bookings::delete_many()
        .filter(BookingCol::Id.is_in(ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Every booking held by one user, removed. Used when an account is deleted.
pub async fn delete_bookings_of_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Vec<BookingModel>> {
    let bookings = Bookings::find()
        .filter(BookingCol::UserId.eq(user_id))
        .all(conn)
        .await?;
    delete_bookings(conn, &bookings).await?;
    booking_refs::release(conn, &bookings).await;
    Ok(bookings)
}
