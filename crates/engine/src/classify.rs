//! Read-time categorization of ledger entries.
//!
//! Categories are derived from the free-text `reason` on every read and are
//! never stored. The whole policy lives in one ordered rule table: the first
//! matching rule wins, so game names must be checked before generic words
//! like "reward" ("Math Sprint reward" is a game earn, not an encouragement).

use serde::{Deserialize, Serialize};

/// Closed set of reporting buckets.
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

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Checklists => "checklists",
            Self::Games => "games",
            Self::Targets => "targets",
            Self::Wishlist => "wishlist",
            Self::RewardEncourage => "reward_encourage",
            Self::RewardRedemption => "reward_redemption",
            Self::Other => "other",
        }
    }
}

/// Game identifiers recognized by rule 1. Matched as substrings so prefixed
/// reasons ("Math Sprint reward", "Math Sprint level 3") still resolve.
const GAME_NAMES: &[&str] = &[
    "math sprint",
    "word builder",
    "memory match",
    "shape hunt",
    "star quiz",
];

const ENCOURAGE_PHRASES: &[&str] = &["encourage", "high five", "high-five", "bonus", "great job"];

const REDEMPTION_PHRASES: &[&str] = &["redeem", "redemption", "cash-out", "cash out"];

enum Pattern {
    Contains(&'static str),
    AnyOf(&'static [&'static str]),
}

impl Pattern {
    fn matches(&self, reason: &str) -> bool {
        match self {
            Self::Contains(needle) => reason.contains(needle),
            Self::AnyOf(needles) => needles.iter().any(|needle| reason.contains(needle)),
        }
    }
}

/// Ordered rule table. Order is significant.
const RULES: &[(Pattern, Category)] = &[
    (Pattern::AnyOf(GAME_NAMES), Category::Games),
    (Pattern::Contains("daily activity"), Category::Daily),
    (Pattern::Contains("checklist"), Category::Checklists),
    (Pattern::Contains("target"), Category::Targets),
    (Pattern::Contains("wishlist"), Category::Wishlist),
    (Pattern::Contains("wish"), Category::Wishlist),
    (Pattern::AnyOf(ENCOURAGE_PHRASES), Category::RewardEncourage),
    (Pattern::AnyOf(REDEMPTION_PHRASES), Category::RewardRedemption),
];

/// Maps a reason to its category; unclassifiable reasons fall through to
/// [`Category::Other`] so no entry ever disappears from the totals.
pub fn classify(reason: &str) -> Category {
    let lowered = reason.to_lowercase();
    for (pattern, category) in RULES {
        if pattern.matches(&lowered) {
            return *category;
        }
    }
    tracing::debug!(reason, "unclassified ledger reason");
    Category::Other
}
