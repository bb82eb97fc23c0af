use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{ShowBookingCount, Stats, UserList},
        bookings::BookingList,
    },
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        showtimes::{Column as ShowtimeCol, Entity as Showtimes},
        shows::{Column as ShowCol, Entity as Shows},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role, ensure_admin},
    models::{Booking, User},
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, Pagination},
    services::seat_ledger,
    state::AppState,
};

pub async fn stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Stats>> {
    ensure_admin(user)?;

    let total_shows = Shows::find().count(&state.orm).await? as i64;
    let total_users = Users::find().count(&state.orm).await? as i64;
    let total_bookings = Bookings::find().count(&state.orm).await? as i64;
    let upcoming_showtimes = Showtimes::find()
        .filter(ShowtimeCol::StartsAt.gt(Utc::now().fixed_offset()))
        .count(&state.orm)
        .await? as i64;

    // Grouped by price so the sum stays in integer arithmetic on every backend.
    let by_price: Vec<(i64, i64)> = Bookings::find()
        .select_only()
        .column(BookingCol::Price)
        .column_as(Expr::col(BookingCol::Id).count(), "bookings")
        .group_by(BookingCol::Price)
        .into_tuple()
        .all(&state.orm)
        .await?;
    let total_revenue = by_price.iter().map(|(price, n)| price * n).sum();

    let by_show: HashMap<Uuid, i64> = Bookings::find()
        .select_only()
        .column(BookingCol::ShowId)
        .column_as(Expr::col(BookingCol::Id).count(), "bookings")
        .group_by(BookingCol::ShowId)
        .into_tuple::<(Uuid, i64)>()
        .all(&state.orm)
        .await?
        .into_iter()
        .collect();

    let titles: Vec<(Uuid, String)> = Shows::find()
        .select_only()
        .column(ShowCol::Id)
        .column(ShowCol::Title)
        .order_by_asc(ShowCol::Title)
        .into_tuple()
        .all(&state.orm)
        .await?;
    let mut bookings_per_show: Vec<ShowBookingCount> = titles
        .into_iter()
        .map(|(movie_id, title)| ShowBookingCount {
            bookings: by_show.get(&movie_id).copied().unwrap_or(0),
            movie_id,
            title,
        })
        .collect();
    bookings_per_show.sort_by(|a, b| b.bookings.cmp(&a.bookings));

    Ok(ApiResponse::success(
        "Stats",
        Stats {
            total_shows,
            total_users,
            total_bookings,
            upcoming_showtimes,
            total_revenue,
            bookings_per_show,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Deletes a user account after releasing every seat it holds.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let target = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if target.role == Role::Admin.as_str() {
        return Err(AppError::BadRequest("admin accounts cannot be deleted".into()));
    }

    let released = seat_ledger::delete_bookings_of_user(&state.orm, target.id).await?;
    Users::delete_by_id(target.id).exec(&state.orm).await?;

    tracing::info!(user_id = %target.id, released = released.len(), "user deleted");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": target.id, "released_bookings": released.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "User deleted",
        User::from(target),
        Some(Meta::empty()),
    ))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(show_id) = query.show_id {
        condition = condition.add(BookingCol::ShowId.eq(show_id));
    }
    let finder = Bookings::find()
        .filter(condition)
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
