//! Derived wallet figures.
//!
//! `compute_wallet` is a pure function over the full entry set; nothing here
//! is cached or persisted, so it is safe to call repeatedly and concurrently.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::caps::daily_cap;
use crate::classify::{Category, classify};
use crate::entries::LedgerEntry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Sum of capped per-category positive amounts.
    pub total_earned: i64,
    /// Sum of absolute negative amounts (fulfilled redemptions included).
    pub total_spent: i64,
    /// Points held by pending redemption requests, excluded from `available`.
    pub reserved: i64,
    pub available: i64,
    /// `available + reserved`.
    pub balance: i64,
    /// Capped positive totals per category; `Σ(values) == total_earned`.
    pub per_category: BTreeMap<Category, i64>,
    pub game_points_today: i64,
    pub game_excess_today: i64,
}

/// Derives the wallet from `entries`.
///
/// Steps: classify every entry, accumulate per-category positive sums, clamp
/// the games category to `games_daily_cap` for the caller's current day,
/// then `available = max(0, total_earned - total_spent) - reserved` with the
/// reservation clamped so `available` never goes negative.
pub fn compute_wallet(
    entries: &[LedgerEntry],
    reserved_points: i64,
    games_daily_cap: i64,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> WalletSnapshot {
    let mut per_category: BTreeMap<Category, i64> = BTreeMap::new();
    let mut total_spent = 0;
    for entry in entries {
        if entry.amount > 0 {
            *per_category.entry(classify(&entry.reason)).or_insert(0) += entry.amount;
        } else {
            total_spent += -entry.amount;
        }
    }

    let today = now.with_timezone(&offset).date_naive();
    let cap = daily_cap(entries, Category::Games, games_daily_cap, today, offset);
    if cap.excess > 0
        && let Some(games) = per_category.get_mut(&Category::Games)
    {
        *games -= cap.excess;
    }

    let total_earned: i64 = per_category.values().sum();
    let spendable = (total_earned - total_spent).max(0);
    let reserved = reserved_points.clamp(0, spendable);
    let available = spendable - reserved;

    WalletSnapshot {
        total_earned,
        total_spent,
        reserved,
        available,
        balance: available + reserved,
        per_category,
        game_points_today: cap.counted,
        game_excess_today: cap.excess,
    }
}
