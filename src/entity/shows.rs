use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub director: String,
    pub genre: String,
    pub duration_minutes: i32,
    pub room: String,
    /// Declared capacity. Occupancy is never subtracted from it.
    pub total_seats: i32,
    pub price: i64,
    pub poster: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub actors: Json,
    #[sea_orm(column_type = "Double")]
    pub average_rating: f64,
    pub rating_count: i32,
    pub admin_id: Option<Uuid>,
    /// Cached booking ids; the bookings table is authoritative.
    #[sea_orm(column_type = "JsonBinary")]
    pub booking_ids: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::showtimes::Entity")]
    Showtimes,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::ratings::Entity")]
    Ratings,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AdminId",
        to = "super::users::Column::Id"
    )]
    Admin,
}

impl Related<super::showtimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Showtimes.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::ratings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
