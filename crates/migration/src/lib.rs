pub use sea_orm_migration::prelude::*;

mod m20260110_000001_users;
mod m20260110_000002_ledger_entries;
mod m20260110_000003_legacy_points;
mod m20260110_000004_subject_aliases;
mod m20260115_000001_redemption_requests;
mod m20260120_000001_usage_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_users::Migration),
            Box::new(m20260110_000002_ledger_entries::Migration),
            Box::new(m20260110_000003_legacy_points::Migration),
            Box::new(m20260110_000004_subject_aliases::Migration),
            Box::new(m20260115_000001_redemption_requests::Migration),
            Box::new(m20260120_000001_usage_events::Migration),
        ]
    }
}
