//! Best-effort maintenance of the cached `booking_ids` lists on users and
//! shows. These lists are a read convenience; nothing checks invariants
//! against them, and concurrent edits may lose an update.

use std::collections::{HashMap, HashSet};

use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entity::{
        bookings::Model as BookingModel,
        shows::{ActiveModel as ShowActive, Entity as Shows},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::AppResult,
    models::uuid_list,
};

/// Appends freshly created bookings to the owner's and the show's lists.
pub async fn record<C: ConnectionTrait>(conn: &C, user_id: Uuid, show_id: Uuid, ids: &[Uuid]) {
    if ids.is_empty() {
        return;
    }
    if let Err(err) = update_user_refs(conn, user_id, ids, &HashSet::new()).await {
        tracing::warn!(error = %err, %user_id, "failed to append booking refs to user");
    }
    if let Err(err) = update_show_refs(conn, show_id, ids, &HashSet::new()).await {
        tracing::warn!(error = %err, %show_id, "failed to append booking refs to show");
    }
}

/// Pulls deleted bookings out of every affected user's and show's list.
/// A list that never held the id is left as is.
pub async fn release<C: ConnectionTrait>(conn: &C, bookings: &[BookingModel]) {
    let mut by_user: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    let mut by_show: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for booking in bookings {
        by_user.entry(booking.user_id).or_default().insert(booking.id);
        by_show.entry(booking.show_id).or_default().insert(booking.id);
    }

    for (user_id, ids) in by_user {
        if let Err(err) = update_user_refs(conn, user_id, &[], &ids).await {
            tracing::warn!(error = %err, %user_id, "failed to pull booking refs from user");
        }
    }
    for (show_id, ids) in by_show {
        if let Err(err) = update_show_refs(conn, show_id, &[], &ids).await {
            tracing::warn!(error = %err, %show_id, "failed to pull booking refs from show");
        }
    }
}

async fn update_user_refs<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    add: &[Uuid],
    remove: &HashSet<Uuid>,
) -> AppResult<()> {
    let Some(user) = Users::find_by_id(user_id).one(conn).await? else {
        return Ok(());
    };
    let next = merged(&user.booking_ids, add, remove);
    if next == user.booking_ids {
        return Ok(());
    }
    let mut active: UserActive = user.into();
    active.booking_ids = Set(next);
    active.update(conn).await?;
    Ok(())
}

async fn update_show_refs<C: ConnectionTrait>(
    conn: &C,
    show_id: Uuid,
    add: &[Uuid],
    remove: &HashSet<Uuid>,
) -> AppResult<()> {
    let Some(show) = Shows::find_by_id(show_id).one(conn).await? else {
        return Ok(());
    };
    let next = merged(&show.booking_ids, add, remove);
    if next == show.booking_ids {
        return Ok(());
    }
    let mut active: ShowActive = show.into();
    active.booking_ids = Set(next);
    active.update(conn).await?;
    Ok(())
}

/// `current - remove + add`, keeping order and never duplicating an id.
pub fn merged(current: &Value, add: &[Uuid], remove: &HashSet<Uuid>) -> Value {
    let mut ids: Vec<Uuid> = uuid_list(current)
        .into_iter()
        .filter(|id| !remove.contains(id))
        .collect();
    for id in add {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    Value::Array(ids.into_iter().map(|id| Value::String(id.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_appends_without_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let current = serde_json::json!([a.to_string()]);
        let next = merged(&current, &[a, b], &HashSet::new());
        assert_eq!(uuid_list(&next), vec![a, b]);
    }

    #[test]
    fn merge_removes_and_tolerates_absent_ids() {
        let a = Uuid::new_v4();
        let absent = Uuid::new_v4();
        let current = serde_json::json!([a.to_string()]);
        let next = merged(&current, &[], &HashSet::from([a, absent]));
        assert!(uuid_list(&next).is_empty());
    }

    #[test]
    fn merge_recovers_from_a_malformed_cache() {
        let a = Uuid::new_v4();
        let next = merged(&serde_json::json!({"oops": true}), &[a], &HashSet::new());
        assert_eq!(uuid_list(&next), vec![a]);
    }
}
