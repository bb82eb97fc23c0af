use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Notification;

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct NotificationList {
    #[schema(value_type = Vec<Notification>)]
    pub items: Vec<Notification>,
}
