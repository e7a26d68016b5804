use chrono::{FixedOffset, Offset, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::events::{ChangeEvent, ChangeFeed};

mod aggregate;
mod award;
mod redemptions;
mod usage;
mod wallet;

pub use aggregate::{ReconcilePolicy, reconcile};
pub use award::AwardCmd;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Policy knobs for the accounting core.
#[derive(Clone, Copy, Debug)]
pub struct EnginePolicy {
    /// Daily ceiling on game points counting toward the spendable wallet.
    pub games_daily_cap: i64,
    /// Smallest cash-out request accepted.
    pub redemption_minimum: i64,
    /// Payout rate recorded on new redemption requests.
    pub rate_per_point_minor: i64,
    /// Default calendar-day boundary, minutes east of UTC.
    pub day_offset_minutes: i32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            games_daily_cap: 500,
            redemption_minimum: 2000,
            rate_per_point_minor: 1,
            day_offset_minutes: 0,
        }
    }
}

impl EnginePolicy {
    /// Offset used when a caller does not supply one.
    pub fn day_offset(&self) -> FixedOffset {
        let seconds = self.day_offset_minutes.clamp(-13 * 60, 14 * 60) * 60;
        FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    policy: EnginePolicy,
    reconcile_policy: ReconcilePolicy,
    feed: ChangeFeed,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Subscribes to the change feed. Purely advisory: consumers re-pull the
    /// wallet on events, correctness never depends on receiving them.
    pub fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    pub(crate) fn publish(&self, event: ChangeEvent) {
        self.feed.publish(event);
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    policy: Option<EnginePolicy>,
    reconcile_policy: Option<ReconcilePolicy>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn policy(mut self, policy: EnginePolicy) -> EngineBuilder {
        self.policy = Some(policy);
        self
    }

    pub fn reconcile_policy(mut self, policy: ReconcilePolicy) -> EngineBuilder {
        self.reconcile_policy = Some(policy);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            policy: self.policy.unwrap_or_default(),
            reconcile_policy: self.reconcile_policy.unwrap_or_default(),
            feed: ChangeFeed::default(),
        }
    }
}
