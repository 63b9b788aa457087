//! Database-backed pipeline tests.
//!
//! Require a migrated Postgres with the vector extension; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use chrono::Utc;
use server_core::domains::delivery::models::{DeliveryHistory, DeliveryStage};
use server_core::domains::ingestion::models::RawPosting;
use server_core::domains::users::models::User;
use server_core::domains::windows::models::{ConversationWindow, ReminderLog};
use server_core::domains::windows::reminders::ReminderStage;
use sqlx::PgPool;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPool::connect(&url).await.expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
    pool
}

fn unique_handle() -> String {
    format!("234{}", &uuid::Uuid::new_v4().simple().to_string()[..10])
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn enqueue_is_idempotent() {
    let pool = pool().await;
    let source_id = uuid::Uuid::new_v4().to_string();

    let first = RawPosting::enqueue(
        "jobspy",
        &source_id,
        serde_json::json!({"title": "Sales Executive"}),
        None,
        Utc::now(),
        &pool,
    )
    .await
    .unwrap();
    assert!(!first.is_duplicate());

    let second = RawPosting::enqueue(
        "jobspy",
        &source_id,
        serde_json::json!({"title": "Sales Executive"}),
        None,
        Utc::now(),
        &pool,
    )
    .await
    .unwrap();
    assert!(second.is_duplicate());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn delivery_history_is_unique_per_user_and_posting() {
    let pool = pool().await;
    let user = User::get_or_create(&unique_handle(), Utc::now(), &pool)
        .await
        .unwrap();

    let first = DeliveryHistory::insert_pending(user.id, 999_999, 87.0, DeliveryStage::RealTime, &pool)
        .await
        .unwrap();
    assert!(first.is_some());

    let second =
        DeliveryHistory::insert_pending(user.id, 999_999, 87.0, DeliveryStage::Backfill, &pool)
            .await
            .unwrap();
    assert!(second.is_none());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn opening_a_window_expires_the_previous_one() {
    let pool = pool().await;
    let user = User::get_or_create(&unique_handle(), Utc::now(), &pool)
        .await
        .unwrap();

    let first = ConversationWindow::open(user.id, Utc::now(), &pool)
        .await
        .unwrap();
    let second = ConversationWindow::open(user.id, Utc::now(), &pool)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let active = ConversationWindow::find_active(user.id, &pool)
        .await
        .unwrap()
        .expect("an active window");
    assert_eq!(active.id, second.id);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn reminder_ledger_is_at_most_once_per_stage() {
    let pool = pool().await;
    let user = User::get_or_create(&unique_handle(), Utc::now(), &pool)
        .await
        .unwrap();
    let window = ConversationWindow::open(user.id, Utc::now(), &pool)
        .await
        .unwrap();

    let first = ReminderLog::try_record(user.id, window.id, ReminderStage::S5, Utc::now(), &pool)
        .await
        .unwrap();
    let second = ReminderLog::try_record(user.id, window.id, ReminderStage::S5, Utc::now(), &pool)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
}
