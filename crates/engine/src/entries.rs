//! Ledger entry primitives.
//!
//! A `LedgerEntry` is one immutable, signed point-amount record tied to a
//! subject and a free-text reason. Rows are never updated or deleted; all
//! derived figures are recomputed from the full entry set on read.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Which physical table an aggregated entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Canonical,
    Legacy,
}

impl EntrySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Legacy => "legacy",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry id. Canonical rows carry a UUID; legacy rows are prefixed with
    /// `legacy:` so ids stay unique across the merged view.
    pub id: String,
    pub subject_id: String,
    /// Signed points: positive earns, negative spends/adjustments.
    pub amount: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub evidence_count: i32,
    /// Idempotency key; at most one row per `(subject_id, source_key)`.
    pub source_key: Option<String>,
    pub source: EntrySource,
}

impl LedgerEntry {
    pub fn new(
        subject_id: String,
        amount: i64,
        reason: String,
        created_at: DateTime<Utc>,
        evidence_count: i32,
        source_key: Option<String>,
    ) -> ResultEngine<Self> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount(
                "amount must not be 0".to_string(),
            ));
        }
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(EngineError::InvalidReason(
                "reason must not be empty".to_string(),
            ));
        }
        if evidence_count < 0 {
            return Err(EngineError::InvalidAmount(
                "evidence_count must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            subject_id,
            amount,
            reason,
            created_at,
            evidence_count,
            source_key,
            source: EntrySource::Canonical,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject_id: String,
    pub amount: i64,
    pub reason: String,
    pub created_at: DateTimeUtc,
    pub evidence_count: i32,
    pub source_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.clone()),
            subject_id: ActiveValue::Set(entry.subject_id.clone()),
            amount: ActiveValue::Set(entry.amount),
            reason: ActiveValue::Set(entry.reason.clone()),
            created_at: ActiveValue::Set(entry.created_at),
            evidence_count: ActiveValue::Set(entry.evidence_count),
            source_key: ActiveValue::Set(entry.source_key.clone()),
        }
    }
}

impl From<Model> for LedgerEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            subject_id: model.subject_id,
            amount: model.amount,
            reason: model.reason,
            created_at: model.created_at,
            evidence_count: model.evidence_count,
            source_key: model.source_key,
            source: EntrySource::Canonical,
        }
    }
}
