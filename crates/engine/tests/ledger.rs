use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{AwardCmd, Engine, EngineError, EntrySource, ReconcilePolicy, UsageWindow, progress_key};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn award(subject: &str, amount: i64, reason: &str, key: Option<&str>) -> AwardCmd {
    AwardCmd {
        subject_id: subject.to_string(),
        amount,
        reason: reason.to_string(),
        source_key: key.map(ToString::to_string),
        evidence_count: 0,
        created_at: Utc::now(),
    }
}

async fn seed_legacy(db: &DatabaseConnection, child_key: &str, points: i64, note: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO legacy_points (child_key, points, note, awarded_at) VALUES (?, ?, ?, ?)",
        vec![
            child_key.into(),
            points.into(),
            note.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

async fn seed_alias(db: &DatabaseConnection, alias: &str, canonical: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO subject_aliases (alias, canonical_id) VALUES (?, ?)",
        vec![alias.into(), canonical.into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn awarding_twice_with_same_key_writes_one_entry() {
    let (engine, _db) = engine_with_db().await;

    let key = progress_key("chat-feed", 42);
    let first = engine
        .award(award("kid-1", 50, "daily activity", Some(&key)))
        .await
        .unwrap();
    let second = engine
        .award(award("kid-1", 50, "daily activity", Some(&key)))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 50);
}

#[tokio::test]
async fn same_key_for_different_subjects_stays_independent() {
    let (engine, _db) = engine_with_db().await;

    let key = progress_key("chat-feed", 1);
    engine
        .award(award("kid-1", 10, "daily activity", Some(&key)))
        .await
        .unwrap();
    engine
        .award(award("kid-2", 20, "daily activity", Some(&key)))
        .await
        .unwrap();

    assert_eq!(engine.load_entries_for("kid-1", None).await.unwrap().len(), 1);
    assert_eq!(engine.load_entries_for("kid-2", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn zero_amount_award_is_rejected_before_write() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .award(award("kid-1", 0, "daily activity", None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount must not be 0".to_string())
    );
    assert!(engine.load_entries_for("kid-1", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_reason_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.award(award("kid-1", 10, "   ", None)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidReason("reason must not be empty".to_string())
    );
}

#[tokio::test]
async fn legacy_rows_are_merged_through_aliases() {
    let (engine, db) = engine_with_db().await;
    seed_alias(&db, "old-kid-1", "kid-1").await;
    seed_legacy(&db, "old-kid-1", 30, "daily activity").await;

    engine
        .award(award("kid-1", 50, "Checklist: Approved", None))
        .await
        .unwrap();

    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.source == EntrySource::Legacy && e.amount == 30));
    assert!(entries.iter().any(|e| e.source == EntrySource::Canonical && e.amount == 50));

    // Legacy key resolves to the same merged view.
    let via_alias = engine.load_entries_for("old-kid-1", None).await.unwrap();
    assert_eq!(via_alias.len(), 2);

    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.total_earned, 80);
    assert_eq!(wallet.available, 80);
}

#[tokio::test]
async fn entries_come_back_newest_first() {
    let (engine, _db) = engine_with_db().await;

    let old = AwardCmd {
        created_at: Utc::now() - Duration::days(2),
        ..award("kid-1", 10, "daily activity", None)
    };
    engine.award(old).await.unwrap();
    engine.award(award("kid-1", 20, "helped grandma", None)).await.unwrap();

    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].created_at >= entries[1].created_at);

    let since = Utc::now() - Duration::days(1);
    let recent = engine.load_entries_for("kid-1", Some(since)).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].amount, 20);
}

#[tokio::test]
async fn prefer_canonical_policy_hides_migrated_duplicates() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .reconcile_policy(ReconcilePolicy::PreferCanonical)
        .build();

    seed_alias(&db, "old-kid-1", "kid-1").await;
    let at = Utc::now();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO legacy_points (child_key, points, note, awarded_at) VALUES (?, ?, ?, ?)",
        vec!["old-kid-1".into(), 50.into(), "daily activity".into(), at.into()],
    ))
    .await
    .unwrap();
    engine
        .award(AwardCmd {
            created_at: at,
            ..award("kid-1", 50, "Daily Activity", None)
        })
        .await
        .unwrap();

    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, EntrySource::Canonical);
}

#[tokio::test]
async fn redemption_below_minimum_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 5000, "daily activity", None)).await.unwrap();

    let err = engine
        .create_redemption("kid-1", 1999, None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientBalance("requested points below minimum".to_string())
    );

    // Exactly the minimum passes.
    engine
        .create_redemption("kid-1", 2000, None, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn redemption_cannot_exceed_available_balance() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 2500, "daily activity", None)).await.unwrap();

    let err = engine
        .create_redemption("kid-1", 3000, None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientBalance("requested points exceed available balance".to_string())
    );
}

#[tokio::test]
async fn full_redemption_workflow_deducts_points_once() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 5000, "daily activity", None)).await.unwrap();

    let request = engine
        .create_redemption("kid-1", 2000, Some("lego set"), Utc::now())
        .await
        .unwrap();

    // Pending request reserves points without touching the ledger.
    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.reserved, 2000);
    assert_eq!(wallet.available, 3000);
    assert_eq!(wallet.balance, 5000);
    assert_eq!(wallet.total_spent, 0);

    engine.approve(request.id, Utc::now()).await.unwrap();
    let accepted = engine.accept(request.id, Utc::now()).await.unwrap();
    assert_eq!(accepted.status, engine::RedemptionStatus::Accepted);

    // Acceptance appended the spend entry and released the reservation.
    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.total_spent, 2000);
    assert_eq!(wallet.reserved, 0);
    assert_eq!(wallet.available, 3000);
    assert_eq!(wallet.balance, 3000);

    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    let spend = entries.iter().find(|e| e.amount < 0).unwrap();
    assert_eq!(spend.amount, -2000);
    assert_eq!(spend.source_key, Some(format!("redemption:{}", request.id)));

    // Retried accept is a no-op, not a second deduction.
    engine.accept(request.id, Utc::now()).await.unwrap();
    let entries = engine.load_entries_for("kid-1", None).await.unwrap();
    assert_eq!(entries.iter().filter(|e| e.amount < 0).count(), 1);

    let fulfilled = engine.fulfill(request.id, Utc::now()).await.unwrap();
    assert_eq!(fulfilled.status, engine::RedemptionStatus::Fulfilled);
    assert!(fulfilled.fulfilled_at.is_some());

    // Terminal requests absorb further transitions unchanged.
    let still = engine.reject(request.id, Utc::now()).await.unwrap();
    assert_eq!(still.status, engine::RedemptionStatus::Fulfilled);

    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.total_spent, 2000);
}

#[tokio::test]
async fn reject_and_cancel_release_the_reservation() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 5000, "daily activity", None)).await.unwrap();

    let rejected = engine
        .create_redemption("kid-1", 2000, None, Utc::now())
        .await
        .unwrap();
    engine.reject(rejected.id, Utc::now()).await.unwrap();

    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.reserved, 0);
    assert_eq!(wallet.available, 5000);

    let cancelled = engine
        .create_redemption("kid-1", 2000, None, Utc::now())
        .await
        .unwrap();
    engine.approve(cancelled.id, Utc::now()).await.unwrap();
    engine.cancel(cancelled.id, Utc::now()).await.unwrap();

    let wallet = engine
        .compute_wallet("kid-1", Utc::now(), engine.policy().day_offset())
        .await
        .unwrap();
    assert_eq!(wallet.reserved, 0);
    assert_eq!(wallet.available, 5000);
    assert_eq!(wallet.total_spent, 0);
}

#[tokio::test]
async fn accept_requires_prior_approval() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 5000, "daily activity", None)).await.unwrap();

    let request = engine
        .create_redemption("kid-1", 2000, None, Utc::now())
        .await
        .unwrap();

    let err = engine.accept(request.id, Utc::now()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("cannot accept a requested request".to_string())
    );
}

#[tokio::test]
async fn approve_recheck_fails_when_balance_moved() {
    let (engine, _db) = engine_with_db().await;
    engine.award(award("kid-1", 5000, "daily activity", None)).await.unwrap();

    let request = engine
        .create_redemption("kid-1", 3000, None, Utc::now())
        .await
        .unwrap();

    // Another spend lands between request and approval.
    engine
        .award(award("kid-1", -4000, "manual adjustment", None))
        .await
        .unwrap();

    let err = engine.approve(request.id, Utc::now()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientBalance("requested points exceed available balance".to_string())
    );
}

#[tokio::test]
async fn usage_counter_is_scoped_to_the_window() {
    let (engine, db) = engine_with_db().await;

    engine.record_usage("kid-1", "image_generation", Utc::now()).await.unwrap();
    engine.record_usage("kid-1", "image_generation", Utc::now()).await.unwrap();
    engine.record_usage("kid-1", "story_request", Utc::now()).await.unwrap();

    // A usage event from two months ago stays outside the month window.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO usage_events (id, subject_id, action_kind, occurred_at) VALUES (?, ?, ?, ?)",
        vec![
            "stale-event".into(),
            "kid-1".into(),
            "image_generation".into(),
            (Utc::now() - Duration::days(62)).into(),
        ],
    ))
    .await
    .unwrap();

    let offset = engine.policy().day_offset();
    let count = engine
        .usage_count("kid-1", "image_generation", UsageWindow::Month, Utc::now(), offset)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let count = engine
        .usage_count("kid-1", "story_request", UsageWindow::Month, Utc::now(), offset)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn change_feed_announces_awards() {
    let (engine, _db) = engine_with_db().await;
    let mut changes = engine.changes();

    engine.award(award("kid-1", 10, "daily activity", None)).await.unwrap();

    let event = changes.try_recv().unwrap();
    assert_eq!(event.subject_id, "kid-1");
    assert_eq!(event.table, "ledger_entries");
}
