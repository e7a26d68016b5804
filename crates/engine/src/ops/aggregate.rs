//! Multi-source ledger aggregation.
//!
//! A subject can carry more than one identifying key (legacy migrations), so
//! a read unions `ledger_entries` with `legacy_points`, normalizes both into
//! the common shape, reconciles known migration artifacts, and sorts newest
//! first. Reads fail closed: if either source errors, the whole load errors.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entries::EntrySource;
use crate::{LedgerEntry, ResultEngine, SubjectIdentities, entries, identity, legacy};

use super::Engine;

/// How to treat a legacy row that looks like a canonical row.
///
/// Migration-era data may hold the same logical event in both tables without
/// a shared idempotency key. `SurfaceBoth` keeps the historical behavior of
/// summing both; `PreferCanonical` drops the legacy copy when a canonical
/// row has the same `(amount, created_at, reason)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    #[default]
    SurfaceBoth,
    PreferCanonical,
}

/// Applies the duplicate policy to a merged entry set.
pub fn reconcile(policy: ReconcilePolicy, mut entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    match policy {
        ReconcilePolicy::SurfaceBoth => entries,
        ReconcilePolicy::PreferCanonical => {
            let canonical: HashSet<(i64, DateTime<Utc>, String)> = entries
                .iter()
                .filter(|entry| entry.source == EntrySource::Canonical)
                .map(|entry| (entry.amount, entry.created_at, entry.reason.to_lowercase()))
                .collect();
            entries.retain(|entry| {
                entry.source == EntrySource::Canonical
                    || !canonical.contains(&(
                        entry.amount,
                        entry.created_at,
                        entry.reason.to_lowercase(),
                    ))
            });
            entries
        }
    }
}

impl Engine {
    /// Resolves a raw key into the subject's full identity set.
    ///
    /// Precedence: an alias row maps the key to its canonical id; a key with
    /// no alias row is its own canonical id. All other aliases of that
    /// canonical id come back as legacy keys.
    pub async fn resolve_identities(&self, raw_key: &str) -> ResultEngine<SubjectIdentities> {
        let canonical = match identity::Entity::find_by_id(raw_key).one(&self.database).await? {
            Some(row) => row.canonical_id,
            None => raw_key.to_string(),
        };

        let legacy = identity::Entity::find()
            .filter(identity::Column::CanonicalId.eq(canonical.clone()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|row| row.alias)
            .filter(|alias| *alias != canonical)
            .collect();

        Ok(SubjectIdentities { canonical, legacy })
    }

    /// Loads all entries for a resolved id-set, newest first.
    pub async fn load_entries(
        &self,
        ids: &SubjectIdentities,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let mut query = entries::Entity::find()
            .filter(entries::Column::SubjectId.eq(ids.canonical.clone()));
        if let Some(since) = since {
            query = query.filter(entries::Column::CreatedAt.gte(since));
        }
        let mut merged: Vec<LedgerEntry> = query
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::from)
            .collect();

        if !ids.legacy.is_empty() {
            let mut query = legacy::Entity::find()
                .filter(legacy::Column::ChildKey.is_in(ids.legacy.clone()));
            if let Some(since) = since {
                query = query.filter(legacy::Column::AwardedAt.gte(since));
            }
            merged.extend(
                query
                    .all(&self.database)
                    .await?
                    .into_iter()
                    .map(LedgerEntry::from),
            );
        }

        let mut merged = reconcile(self.reconcile_policy, merged);
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(merged)
    }

    /// Convenience: resolve and load in one call.
    pub async fn load_entries_for(
        &self,
        raw_key: &str,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let ids = self.resolve_identities(raw_key).await?;
        self.load_entries(&ids, since).await
    }
}
