use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, OnConflict, Query},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::shows::{RateShowRequest, RatingSummary, ShowDraft, ShowList, ShowPayload, ShowtimeDraft},
    entity::{
        ratings::{ActiveModel as RatingActive, Column as RatingCol, Entity as Ratings},
        showtimes::{
            ActiveModel as ShowtimeActive, Column as ShowtimeCol, Entity as Showtimes,
            Model as ShowtimeModel,
        },
        shows::{ActiveModel as ShowActive, Column as ShowCol, Entity as Shows, Model as ShowModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Show, Showtime, string_list, uuid_list},
    response::{ApiResponse, Meta},
    routes::params::{ShowQuery, ShowSortBy, SortOrder},
    services::{
        booking_service::{self, CascadeReason},
        seat_ledger,
    },
    state::AppState,
};

/// Turns stored shows into API shows, attaching ordered showtimes and the
/// seats still free at each of them.
pub async fn hydrate<C: ConnectionTrait>(conn: &C, shows: Vec<ShowModel>) -> AppResult<Vec<Show>> {
    if shows.is_empty() {
        return Ok(Vec::new());
    }

    let show_ids: Vec<Uuid> = shows.iter().map(|s| s.id).collect();
    let showtimes = Showtimes::find()
        .filter(ShowtimeCol::ShowId.is_in(show_ids))
        .order_by_asc(ShowtimeCol::Position)
        .order_by_asc(ShowtimeCol::StartsAt)
        .all(conn)
        .await?;
    let occupancy =
        seat_ledger::occupancy_by_showtime(conn, showtimes.iter().map(|t| t.id).collect()).await?;

    let mut by_show: HashMap<Uuid, Vec<ShowtimeModel>> = HashMap::new();
    for showtime in showtimes {
        by_show.entry(showtime.show_id).or_default().push(showtime);
    }

    Ok(shows
        .into_iter()
        .map(|show| {
            let times = by_show.remove(&show.id).unwrap_or_default();
            show_from_entity(show, times, &occupancy)
        })
        .collect())
}

fn show_from_entity(
    model: ShowModel,
    showtimes: Vec<ShowtimeModel>,
    occupancy: &HashMap<Uuid, i64>,
) -> Show {
    let capacity = i64::from(model.total_seats);
    let show_times = showtimes
        .into_iter()
        .map(|t| Showtime {
            id: t.id,
            date: t.starts_at.with_timezone(&Utc),
            available_seats: (capacity - occupancy.get(&t.id).copied().unwrap_or(0)).max(0),
        })
        .collect();

    Show {
        id: model.id,
        title: model.title,
        description: model.description,
        director: model.director,
        genre: model.genre,
        duration: model.duration_minutes,
        room: model.room,
        total_seats: model.total_seats,
        price: model.price,
        poster: model.poster,
        actors: string_list(&model.actors),
        show_times,
        average_rating: model.average_rating,
        rating_count: model.rating_count,
        admin_id: model.admin_id,
        booking_ids: uuid_list(&model.booking_ids),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn find_show<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ShowModel> {
    Shows::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("movie"))
}

async fn hydrate_one<C: ConnectionTrait>(conn: &C, show: ShowModel) -> AppResult<Show> {
    hydrate(conn, vec![show])
        .await?
        .pop()
        .ok_or(AppError::NotFound("movie"))
}

pub async fn list_shows(state: &AppState, query: ShowQuery) -> AppResult<ApiResponse<ShowList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col(ShowCol::Title)))
                .like(format!("%{}%", q.to_lowercase())),
        );
    }
    if query.upcoming.unwrap_or(false) {
        let now: DateTime<Utc> = Utc::now();
        condition = condition.add(
            ShowCol::Id.in_subquery(
                Query::select()
                    .column(ShowtimeCol::ShowId)
                    .from(Showtimes)
                    .and_where(ShowtimeCol::StartsAt.gt(now.fixed_offset()))
                    .to_owned(),
            ),
        );
    }

    let mut finder = Shows::find().filter(condition);
    let column = match query.sort_by.unwrap_or(ShowSortBy::CreatedAt) {
        ShowSortBy::CreatedAt => ShowCol::CreatedAt,
        ShowSortBy::Title => ShowCol::Title,
        ShowSortBy::Price => ShowCol::Price,
        ShowSortBy::Rating => ShowCol::AverageRating,
    };
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let shows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, shows).await?;

    Ok(ApiResponse::success(
        "Movies",
        ShowList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_show(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Show>> {
    let show = find_show(&state.orm, id).await?;
    let show = hydrate_one(&state.orm, show).await?;
    Ok(ApiResponse::success("Movie found", show, Some(Meta::empty())))
}

pub async fn create_show(
    state: &AppState,
    user: &AuthUser,
    payload: ShowPayload,
) -> AppResult<ApiResponse<Show>> {
    ensure_admin(user)?;
    let draft = payload.validate()?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let show = ShowActive {
        id: Set(Uuid::new_v4()),
        average_rating: Set(0.0),
        rating_count: Set(0),
        admin_id: Set(Some(user.user_id)),
        booking_ids: Set(serde_json::json!([])),
        created_at: Set(now.into()),
        ..draft_to_active(&draft, now)
    }
    .insert(&txn)
    .await?;

    for (position, time) in draft.showtimes.iter().enumerate() {
        insert_showtime(&txn, show.id, time.starts_at, position as i32).await?;
    }
    txn.commit().await?;

    tracing::info!(show_id = %show.id, showtimes = draft.showtimes.len(), "show created");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "show_create",
        "shows",
        serde_json::json!({ "show_id": show.id, "title": show.title }),
    )
    .await;

    let show = hydrate_one(&state.orm, show).await?;
    Ok(ApiResponse::success("Movie created", show, Some(Meta::empty())))
}

/// Replaces a show's content and its showtime list in one transaction.
/// Bookings at showtimes that disappear are deleted in that same transaction;
/// their holders are notified once it has committed.
pub async fn update_show(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ShowPayload,
) -> AppResult<ApiResponse<Show>> {
    ensure_admin(user)?;
    let draft = payload.validate()?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let show = find_show(&txn, id).await?;
    let existing: Vec<Uuid> = Showtimes::find()
        .select_only()
        .column(ShowtimeCol::Id)
        .filter(ShowtimeCol::ShowId.eq(show.id))
        .into_tuple()
        .all(&txn)
        .await?;
    let plan = plan_showtime_changes(&existing, &draft.showtimes)?;

    let cancelled = booking_service::cancel_showtimes(&txn, show.id, &plan.removed).await?;
    let updated = ShowActive {
        id: Set(show.id),
        ..draft_to_active(&draft, now)
    }
    .update(&txn)
    .await?;
    for kept in &plan.kept {
        ShowtimeActive {
            id: Set(kept.id),
            show_id: NotSet,
            starts_at: Set(kept.starts_at.into()),
            position: Set(kept.position),
        }
        .update(&txn)
        .await?;
    }
    for added in &plan.added {
        insert_showtime(&txn, show.id, added.starts_at, added.position).await?;
    }
    txn.commit().await?;

    let outcome = booking_service::announce_cancellations(
        state,
        user,
        &updated,
        cancelled,
        CascadeReason::ShowtimeRemoved,
    )
    .await;

    tracing::info!(
        show_id = %show.id,
        kept = plan.kept.len(),
        added = plan.added.len(),
        removed = plan.removed.len(),
        cancelled = outcome.cancelled.len(),
        "show updated"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "show_update",
        "shows",
        serde_json::json!({
            "show_id": show.id,
            "removed_showtimes": plan.removed,
            "cancelled_bookings": outcome.cancelled.len(),
        }),
    )
    .await;

    let show = hydrate_one(&state.orm, updated).await?;
    Ok(ApiResponse::success("Movie updated", show, Some(Meta::empty())))
}

/// Deletes a show, its showtimes and every booking at them in one
/// transaction, then notifies the holders.
pub async fn delete_show(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let show = find_show(&txn, id).await?;
    let showtime_ids: HashSet<Uuid> = Showtimes::find()
        .select_only()
        .column(ShowtimeCol::Id)
        .filter(ShowtimeCol::ShowId.eq(show.id))
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let cancelled = booking_service::cancel_showtimes(&txn, show.id, &showtime_ids).await?;
    let result = Shows::delete_by_id(show.id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("movie"));
    }
    txn.commit().await?;

    let outcome = booking_service::announce_cancellations(
        state,
        user,
        &show,
        cancelled,
        CascadeReason::ShowDeleted,
    )
    .await;

    tracing::info!(show_id = %show.id, cancelled = outcome.cancelled.len(), "show deleted");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "show_delete",
        "shows",
        serde_json::json!({ "show_id": show.id, "cancelled_bookings": outcome.cancelled.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Movie deleted",
        serde_json::json!({
            "id": show.id,
            "cancelledBookings": outcome.cancelled.len(),
            "notifiedUsers": outcome.notified_users.len(),
        }),
        Some(Meta::empty()),
    ))
}

/// Records the caller's rating (overwriting a previous one) and refreshes the
/// show's average and count from every stored rating.
pub async fn rate_show(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RateShowRequest,
) -> AppResult<ApiResponse<RatingSummary>> {
    if !(1..=5).contains(&payload.value) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    let show = find_show(&state.orm, id).await?;

    Ratings::insert(RatingActive {
        id: Set(Uuid::new_v4()),
        show_id: Set(show.id),
        user_id: Set(user.user_id),
        value: Set(payload.value),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([RatingCol::ShowId, RatingCol::UserId])
            .update_columns([RatingCol::Value, RatingCol::CreatedAt])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let values: Vec<i32> = Ratings::find()
        .select_only()
        .column(RatingCol::Value)
        .filter(RatingCol::ShowId.eq(show.id))
        .into_tuple()
        .all(&state.orm)
        .await?;
    let (average, count) = rating_stats(&values);

    let mut active: ShowActive = show.into();
    active.average_rating = Set(average);
    active.rating_count = Set(count);
    let show = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Rating saved",
        RatingSummary {
            movie_id: show.id,
            your_rating: payload.value,
            average_rating: show.average_rating,
            rating_count: show.rating_count,
        },
        Some(Meta::empty()),
    ))
}

fn rating_stats(values: &[i32]) -> (f64, i32) {
    if values.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    (sum as f64 / values.len() as f64, values.len() as i32)
}

fn draft_to_active(draft: &ShowDraft, now: DateTime<Utc>) -> ShowActive {
    ShowActive {
        id: NotSet,
        title: Set(draft.title.clone()),
        description: Set(draft.description.clone()),
        director: Set(draft.director.clone()),
        genre: Set(draft.genre.clone()),
        duration_minutes: Set(draft.duration_minutes),
        room: Set(draft.room.clone()),
        total_seats: Set(draft.total_seats),
        price: Set(draft.price),
        poster: Set(draft.poster.clone()),
        actors: Set(serde_json::json!(draft.actors)),
        average_rating: NotSet,
        rating_count: NotSet,
        admin_id: NotSet,
        booking_ids: NotSet,
        created_at: NotSet,
        updated_at: Set(now.into()),
    }
}

async fn insert_showtime<C: ConnectionTrait>(
    conn: &C,
    show_id: Uuid,
    starts_at: DateTime<Utc>,
    position: i32,
) -> AppResult<ShowtimeModel> {
    let showtime = ShowtimeActive {
        id: Set(Uuid::new_v4()),
        show_id: Set(show_id),
        starts_at: Set(starts_at.into()),
        position: Set(position),
    }
    .insert(conn)
    .await?;
    Ok(showtime)
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeptShowtime {
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddedShowtime {
    pub starts_at: DateTime<Utc>,
    pub position: i32,
}

#[derive(Debug, Default, PartialEq)]
pub struct ShowtimePlan {
    pub kept: Vec<KeptShowtime>,
    pub added: Vec<AddedShowtime>,
    pub removed: HashSet<Uuid>,
}

/// Diffs the stored showtime ids against the submitted list. Entries carrying
/// an id must name a showtime of this show; every stored id not mentioned is
/// removed.
pub fn plan_showtime_changes(
    existing: &[Uuid],
    drafts: &[ShowtimeDraft],
) -> AppResult<ShowtimePlan> {
    let known: HashSet<Uuid> = existing.iter().copied().collect();
    let mut mentioned = HashSet::new();
    let mut plan = ShowtimePlan::default();

    for (index, draft) in drafts.iter().enumerate() {
        let position = index as i32;
        match draft.id {
            Some(id) => {
                if !known.contains(&id) {
                    return Err(AppError::BadRequest(format!(
                        "showtime {id} does not belong to this movie"
                    )));
                }
                if !mentioned.insert(id) {
                    return Err(AppError::BadRequest(format!("showtime {id} is listed twice")));
                }
                plan.kept.push(KeptShowtime {
                    id,
                    starts_at: draft.starts_at,
                    position,
                });
            }
            None => plan.added.push(AddedShowtime {
                starts_at: draft.starts_at,
                position,
            }),
        }
    }

    plan.removed = known.difference(&mentioned).copied().collect();
    Ok(plan)
}
