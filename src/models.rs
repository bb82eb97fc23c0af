use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{bookings, notifications, users};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub booking_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            booking_ids: uuid_list(&model.booking_ids),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// A scheduled performance. `available_seats` is derived from the booking
/// table on every read.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub available_seats: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub director: String,
    pub genre: String,
    pub duration: i32,
    pub room: String,
    pub total_seats: i32,
    /// Minor currency units (cents).
    pub price: i64,
    pub poster: Option<String>,
    pub actors: Vec<String>,
    pub show_times: Vec<Showtime>,
    pub average_rating: f64,
    pub rating_count: i32,
    pub admin_id: Option<Uuid>,
    pub booking_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub movie: Uuid,
    pub show_time_id: Uuid,
    pub seat_number: i32,
    pub user: Uuid,
    /// Show price at booking time, in cents.
    pub price: i64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Self {
            id: model.id,
            movie: model.show_id,
            show_time_id: model.showtime_id,
            seat_number: model.seat_number,
            user: model.user_id,
            price: model.price,
            date: model.show_date.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for Notification {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            severity: model.severity,
            is_read: model.is_read,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Reads a cached id list stored as a JSON array, skipping anything malformed.
pub fn uuid_list(value: &serde_json::Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .filter_map(|raw| Uuid::parse_str(raw).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
