use sea_orm_migration::prelude::*;

use super::m20250110_000001_create_accounts_and_catalog::{Showtimes, Shows, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::ShowId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::SeatNumber).integer().not_null())
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::ShowDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_show")
                            .from(Bookings::Table, Bookings::ShowId)
                            .to(Shows::Table, Shows::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_showtime")
                            .from(Bookings::Table, Bookings::ShowtimeId)
                            .to(Showtimes::Table, Showtimes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_user")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A seat is sold at most once per showtime. Booking inserts rely on this
        // index rather than on a read-before-write check.
        manager
            .create_index(
                Index::create()
                    .name("uq_bookings_show_showtime_seat")
                    .table(Bookings::Table)
                    .col(Bookings::ShowId)
                    .col(Bookings::ShowtimeId)
                    .col(Bookings::SeatNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    ShowId,
    ShowtimeId,
    SeatNumber,
    UserId,
    Price,
    ShowDate,
    CreatedAt,
}
