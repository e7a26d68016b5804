//! Read-time daily caps.
//!
//! A cap bounds how many points of a volatile category (games) count toward
//! the spendable wallet per rolling local day. It is a display/accounting
//! clamp only: the underlying rows keep their full amounts for audit.

use chrono::{FixedOffset, NaiveDate};

use crate::classify::{Category, classify};
use crate::entries::LedgerEntry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapOutcome {
    /// Points that count toward the wallet, `min(raw, limit)`.
    pub counted: i64,
    /// Points clamped away, `max(0, raw - limit)`.
    pub excess: i64,
}

/// Clamps the positive amounts of `category` earned on `today` to `limit`.
///
/// "Today" follows the caller's calendar: each entry's `created_at` is
/// shifted into `offset` before the date comparison, so midnight boundaries
/// are decided in the caller's timezone, not in UTC.
pub fn daily_cap(
    entries: &[LedgerEntry],
    category: Category,
    limit: i64,
    today: NaiveDate,
    offset: FixedOffset,
) -> CapOutcome {
    let raw: i64 = entries
        .iter()
        .filter(|entry| entry.amount > 0)
        .filter(|entry| classify(&entry.reason) == category)
        .filter(|entry| entry.created_at.with_timezone(&offset).date_naive() == today)
        .map(|entry| entry.amount)
        .sum();

    let excess = (raw - limit).max(0);
    CapOutcome {
        counted: raw - excess,
        excess,
    }
}
