use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};

use crate::events::{ChangeEvent, ChangeOp};
use crate::{LedgerEntry, ResultEngine, entries};

use super::{Engine, normalize_optional_text};

/// One point-changing event to append.
#[derive(Clone, Debug)]
pub struct AwardCmd {
    pub subject_id: String,
    /// Signed points; zero is rejected before any write.
    pub amount: i64,
    pub reason: String,
    /// Optional idempotency key. Recommended for any caller that may retry.
    pub source_key: Option<String>,
    pub evidence_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Engine {
    /// Appends exactly one ledger entry per idempotency key.
    ///
    /// If an entry with the same `(subject_id, source_key)` already exists,
    /// the stored entry is returned and nothing is written. The pre-check is
    /// an optimization only: two concurrent awards with the same key race on
    /// the store's unique index, and the loser re-reads the winner's row.
    pub async fn award(&self, cmd: AwardCmd) -> ResultEngine<LedgerEntry> {
        let entry = LedgerEntry::new(
            cmd.subject_id,
            cmd.amount,
            cmd.reason,
            cmd.created_at,
            cmd.evidence_count,
            normalize_optional_text(cmd.source_key.as_deref()),
        )?;

        if let Some(key) = entry.source_key.as_deref()
            && let Some(existing) = self.find_by_source_key(&entry.subject_id, key).await?
        {
            return Ok(existing.into());
        }

        match entries::ActiveModel::from(&entry).insert(&self.database).await {
            Ok(model) => {
                tracing::debug!(
                    subject_id = %entry.subject_id,
                    amount = entry.amount,
                    "ledger entry appended"
                );
                self.publish(ChangeEvent {
                    subject_id: entry.subject_id.clone(),
                    table: "ledger_entries",
                    op: ChangeOp::Insert,
                });
                Ok(model.into())
            }
            Err(err) => {
                // Unique-index collision from a concurrent retry: return the
                // stored entry instead of double-crediting.
                if let Some(key) = entry.source_key.as_deref()
                    && let Some(existing) = self.find_by_source_key(&entry.subject_id, key).await?
                {
                    return Ok(existing.into());
                }
                Err(err.into())
            }
        }
    }

    async fn find_by_source_key(
        &self,
        subject_id: &str,
        key: &str,
    ) -> ResultEngine<Option<entries::Model>> {
        let existing = entries::Entity::find()
            .filter(entries::Column::SubjectId.eq(subject_id))
            .filter(entries::Column::SourceKey.eq(key))
            .one(&self.database)
            .await?;
        Ok(existing)
    }
}
