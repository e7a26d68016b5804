//! Deterministic idempotency keys for progress-driven awards.
//!
//! Game and activity code awards points per progress segment ("every 10
//! correct answers"). The key is a pure function of `(source, segment)`, so
//! a retried or duplicated trigger produces the same key and the store's
//! unique index turns the repeat into a no-op.

/// Builds the idempotency key for one progress segment of a source.
///
/// Same `(source_name, segment)` always yields the same key; uniqueness per
/// subject comes from the `(subject_id, source_key)` index at write time.
pub fn progress_key(source_name: &str, segment: u64) -> String {
    format!("{}#{segment}", source_name.trim().to_lowercase())
}
