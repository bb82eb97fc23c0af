//! Schema migrations. They only use portable sea-query builders so the same
//! set runs against PostgreSQL in production and SQLite in the test suite.

use sea_orm_migration::prelude::*;

mod m20250110_000001_create_accounts_and_catalog;
mod m20250110_000002_create_bookings;
mod m20250110_000003_create_notifications_and_audit;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250110_000001_create_accounts_and_catalog::Migration),
            Box::new(m20250110_000002_create_bookings::Migration),
            Box::new(m20250110_000003_create_notifications_and_audit::Migration),
        ]
    }
}
