use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(Users::BookingIds).json_binary().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shows::Title).string().not_null())
                    .col(ColumnDef::new(Shows::Description).text().not_null())
                    .col(ColumnDef::new(Shows::Director).string().not_null())
                    .col(ColumnDef::new(Shows::Genre).string().not_null())
                    .col(ColumnDef::new(Shows::DurationMinutes).integer().not_null())
                    .col(ColumnDef::new(Shows::Room).string().not_null())
                    .col(ColumnDef::new(Shows::TotalSeats).integer().not_null())
                    .col(ColumnDef::new(Shows::Price).big_integer().not_null())
                    .col(ColumnDef::new(Shows::Poster).string().null())
                    .col(ColumnDef::new(Shows::Actors).json_binary().not_null())
                    .col(
                        ColumnDef::new(Shows::AverageRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Shows::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Shows::AdminId).uuid().null())
                    .col(ColumnDef::new(Shows::BookingIds).json_binary().not_null())
                    .col(
                        ColumnDef::new(Shows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shows_admin")
                            .from(Shows::Table, Shows::AdminId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Showtimes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Showtimes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Showtimes::ShowId).uuid().not_null())
                    .col(
                        ColumnDef::new(Showtimes::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Showtimes::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_showtimes_show")
                            .from(Showtimes::Table, Showtimes::ShowId)
                            .to(Shows::Table, Shows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_showtimes_show")
                    .table(Showtimes::Table)
                    .col(Showtimes::ShowId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ratings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Ratings::ShowId).uuid().not_null())
                    .col(ColumnDef::new(Ratings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Ratings::Value).integer().not_null())
                    .col(
                        ColumnDef::new(Ratings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_show")
                            .from(Ratings::Table, Ratings::ShowId)
                            .to(Shows::Table, Shows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_user")
                            .from(Ratings::Table, Ratings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One rating per (show, user); upserts target this index.
        manager
            .create_index(
                Index::create()
                    .name("uq_ratings_show_user")
                    .table(Ratings::Table)
                    .col(Ratings::ShowId)
                    .col(Ratings::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ratings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Showtimes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    BookingIds,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Shows {
    Table,
    Id,
    Title,
    Description,
    Director,
    Genre,
    DurationMinutes,
    Room,
    TotalSeats,
    Price,
    Poster,
    Actors,
    AverageRating,
    RatingCount,
    AdminId,
    BookingIds,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Showtimes {
    Table,
    Id,
    ShowId,
    StartsAt,
    Position,
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    Id,
    ShowId,
    UserId,
    Value,
    CreatedAt,
}
