use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowBookingCount {
    pub movie_id: Uuid,
    pub title: String,
    pub bookings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_shows: i64,
    pub total_users: i64,
    pub total_bookings: i64,
    pub upcoming_showtimes: i64,
    pub total_revenue: i64,
    pub bookings_per_show: Vec<ShowBookingCount>,
}
