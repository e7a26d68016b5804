pub use caps::{CapOutcome, daily_cap};
pub use classify::{Category, classify};
pub use entries::{EntrySource, LedgerEntry};
pub use error::EngineError;
pub use events::{ChangeEvent, ChangeFeed, ChangeOp};
pub use idempotency::progress_key;
pub use identity::SubjectIdentities;
pub use ops::{AwardCmd, Engine, EngineBuilder, EnginePolicy, ReconcilePolicy, reconcile};
pub use redemptions::{RedemptionRequest, RedemptionStatus};
pub use usage::UsageWindow;
pub use wallet::{WalletSnapshot, compute_wallet};

mod caps;
mod classify;
mod entries;
mod error;
mod events;
mod idempotency;
mod identity;
mod legacy;
mod ops;
mod redemptions;
mod usage;
mod wallet;

type ResultEngine<T> = Result<T, EngineError>;
