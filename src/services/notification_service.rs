use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::notifications::NotificationList,
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Stores one notification per distinct user. Returns how many were written.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    user_ids: &[Uuid],
    title: &str,
    message: &str,
    severity: Severity,
) -> AppResult<usize> {
    let mut seen = HashSet::new();
    let rows: Vec<NotificationActive> = user_ids
        .iter()
        .filter(|id| seen.insert(**id))
        .map(|user_id| NotificationActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(*user_id),
            title: Set(title.to_owned()),
            message: Set(message.to_owned()),
            severity: Set(severity.as_str().to_owned()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        })
        .collect();

    let written = rows.len();
    if written == 0 {
        return Ok(0);
    }

    Notifications::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    tracing::info!(recipients = written, title, "notifications stored");
    Ok(written)
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Notifications::find()
        .filter(NotificationCol::UserId.eq(user.user_id))
        .order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = Notifications::find()
        .filter(
            Condition::all()
                .add(NotificationCol::Id.eq(id))
                .add(NotificationCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("notification"))?;

    let mut active: NotificationActive = existing.into();
    active.is_read = Set(true);
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Notification read",
        Notification::from(updated),
        Some(Meta::empty()),
    ))
}
