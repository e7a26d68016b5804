use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::redemptions::RedemptionStatus;
use crate::{ResultEngine, WalletSnapshot, redemptions, wallet};

use super::Engine;

impl Engine {
    /// Derives the wallet snapshot for a subject.
    ///
    /// Pure read: resolve identities, load all entries, read pending
    /// reservations, compute. Nothing is cached; calling this repeatedly and
    /// concurrently is safe.
    pub async fn compute_wallet(
        &self,
        raw_key: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> ResultEngine<WalletSnapshot> {
        let ids = self.resolve_identities(raw_key).await?;
        let entries = self.load_entries(&ids, None).await?;
        let reserved = self.reserved_points(&ids.canonical, None).await?;
        Ok(wallet::compute_wallet(
            &entries,
            reserved,
            self.policy.games_daily_cap,
            now,
            offset,
        ))
    }

    /// Sum of points held by pending (`Requested`/`Approved`) redemption
    /// requests, optionally ignoring one request id (used when re-checking
    /// balance for that same request).
    pub(crate) async fn reserved_points(
        &self,
        subject_id: &str,
        excluding: Option<&str>,
    ) -> ResultEngine<i64> {
        let mut query = redemptions::Entity::find()
            .filter(redemptions::Column::SubjectId.eq(subject_id))
            .filter(redemptions::Column::Status.is_in([
                RedemptionStatus::Requested.as_str(),
                RedemptionStatus::Approved.as_str(),
            ]));
        if let Some(id) = excluding {
            query = query.filter(redemptions::Column::Id.ne(id));
        }

        let pending = query.all(&self.database).await?;
        Ok(pending.iter().map(|row| row.requested_points).sum())
    }
}
