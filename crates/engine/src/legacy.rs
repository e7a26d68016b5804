//! Migration-era point rows.
//!
//! Before the ledger was consolidated, points lived in `legacy_points` with
//! its own column names and an integer key. The table is read-only from the
//! engine's point of view: new awards always land in `ledger_entries`, but
//! the aggregator still unions both tables so old balances survive.

use sea_orm::entity::prelude::*;

use crate::entries::{EntrySource, LedgerEntry};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "legacy_points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub child_key: String,
    pub points: i64,
    pub note: String,
    pub awarded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Normalizes a legacy row into the common entry shape.
///
/// Legacy rows predate idempotency keys and evidence tracking, so both come
/// back empty.
impl From<Model> for LedgerEntry {
    fn from(model: Model) -> Self {
        Self {
            id: format!("legacy:{}", model.id),
            subject_id: model.child_key,
            amount: model.points,
            reason: model.note,
            created_at: model.awarded_at,
            evidence_count: 0,
            source_key: None,
            source: EntrySource::Legacy,
        }
    }
}
