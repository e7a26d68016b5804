use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reporting bucket assigned to a ledger entry's reason at read time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Daily,
    Checklists,
    Games,
    Targets,
    Wishlist,
    RewardEncourage,
    RewardRedemption,
    Other,
}

pub mod entry {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AwardNew {
        pub subject_id: String,
        /// Signed points; zero is rejected.
        pub amount: i64,
        pub reason: String,
        /// Optional idempotency key for safely retrying the same award.
        pub source_key: Option<String>,
        pub evidence_count: Option<i32>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        /// If absent, the server uses now().
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: String,
        pub subject_id: String,
        pub amount: i64,
        pub reason: String,
        pub category: Category,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub created_at: DateTime<FixedOffset>,
        pub evidence_count: i32,
        pub source_key: Option<String>,
        /// `canonical` or `legacy`, for migration-era visibility.
        pub source: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryList {
        pub subject_id: String,
        pub since: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
    }
}

pub mod wallet {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletGet {
        pub subject_id: String,
        /// Caller's calendar offset for "today" bucketing; UTC when absent.
        pub tz_offset_minutes: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub total_earned: i64,
        pub total_spent: i64,
        pub reserved: i64,
        pub available: i64,
        pub balance: i64,
        pub per_category: BTreeMap<Category, i64>,
        pub game_points_today: i64,
        pub game_excess_today: i64,
    }
}

pub mod redemption {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RedemptionStatus {
        Requested,
        Approved,
        Rejected,
        Accepted,
        Fulfilled,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RedemptionNew {
        pub subject_id: String,
        pub points: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RedemptionView {
        pub id: Uuid,
        pub subject_id: String,
        pub requested_points: i64,
        pub rate_per_point_minor: i64,
        pub note: Option<String>,
        pub status: RedemptionStatus,
        pub requested_at: DateTime<FixedOffset>,
        pub decided_at: Option<DateTime<FixedOffset>>,
        pub accepted_at: Option<DateTime<FixedOffset>>,
        pub fulfilled_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RedemptionList {
        pub subject_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RedemptionListResponse {
        pub redemptions: Vec<RedemptionView>,
    }
}

pub mod usage {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum UsageWindow {
        Day,
        Month,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsageNew {
        pub subject_id: String,
        pub action_kind: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsageCountGet {
        pub subject_id: String,
        pub action_kind: String,
        pub window: UsageWindow,
        /// Caller's calendar offset for window bucketing; UTC when absent.
        pub tz_offset_minutes: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsageCountResponse {
        pub count: u64,
    }
}
