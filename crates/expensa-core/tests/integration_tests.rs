//! Integration tests for expensa-core
//!
//! These tests exercise the record → summarize → budget workflow through the
//! public API.

use chrono::NaiveDate;
use expensa_core::{
    db::Database, format_compact_money, format_money, month_range, Config, Currency,
    LatestRequest, NewTransaction, PeriodSelection, Store, DEFAULT_TOP_DAYS,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// A month of typical spending plus a few entries on either side
fn seed_march(db: &Database) {
    let entries = [
        (4.5, "Food", d(2024, 2, 29)),
        (62.3, "Groceries", d(2024, 3, 2)),
        (3.75, "Food", d(2024, 3, 4)),
        (120.0, "Bills", d(2024, 3, 5)),
        (18.0, "Transport", d(2024, 3, 11)),
        (45.1, "Groceries", d(2024, 3, 16)),
        (230.0, "Travel", d(2024, 3, 17)),
        (12.0, "Food", d(2024, 3, 31)),
        (9.99, "Entertainment", d(2024, 4, 1)),
    ];
    for (amount, category, date) in entries {
        db.insert_transaction(&NewTransaction::new(amount, category, date))
            .expect("Failed to insert transaction");
    }
}

// =============================================================================
// Database Integration Tests
// =============================================================================

#[test]
fn test_month_summary_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    seed_march(&db);

    let range = PeriodSelection::Month { date: d(2024, 3, 10) }.range();
    let summary = db.get_period_summary(&range, DEFAULT_TOP_DAYS).unwrap();

    assert_eq!(summary.transaction_count, 7);
    assert!((summary.total - 491.15).abs() < 1e-9);

    let categories: Vec<&str> = summary
        .categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(
        categories,
        vec!["Travel", "Bills", "Groceries", "Transport", "Food"]
    );
    let category_sum: f64 = summary.categories.iter().map(|c| c.total).sum();
    assert!((category_sum - summary.total).abs() < 1e-9);

    assert_eq!(summary.top_days[0].date, d(2024, 3, 17));
    assert_eq!(summary.top_days.len(), 7);
}

#[test]
fn test_week_navigation() {
    let db = Database::in_memory().unwrap();
    seed_march(&db);

    let week = PeriodSelection::Week { date: d(2024, 3, 17) };
    assert_eq!(week.range().from_iso(), "2024-03-11");
    assert!((db.get_total(&week.range()).unwrap() - 293.1).abs() < 1e-9);

    let previous = week.shifted(-1).range();
    assert_eq!(previous.from_iso(), "2024-03-04");
    assert_eq!(db.get_total(&previous).unwrap(), 123.75);
}

#[test]
fn test_budget_workflow() {
    let db = Database::in_memory().unwrap();
    seed_march(&db);
    db.set_monthly_budget(400.0).unwrap();
    db.sync_budget_month(d(2024, 3, 20)).unwrap();

    let status = db.get_budget_status(d(2024, 3, 20)).unwrap();
    assert!(status.over_budget);

    let currency = db.get_currency().unwrap();
    assert_eq!(format_money(status.spent, currency.code()), "$491.15");
    assert_eq!(
        format_money(status.remaining.unwrap(), currency.code()),
        "-$91.15"
    );
    assert_eq!(format_compact_money(1_500.0, currency.code()), "$1.5K");
}

#[test]
fn test_category_workflow() {
    let db = Database::in_memory().unwrap();

    assert!(db.add_custom_category("Groceries").is_err());
    let name = db.add_custom_category("  Board   Games ").unwrap();
    assert_eq!(name, "Board Games");

    db.insert_transaction(&NewTransaction::new(35.0, &name, d(2024, 3, 3)))
        .unwrap();
    db.record_recent_category(&name).unwrap();

    let catalog = db.get_category_catalog().unwrap();
    assert_eq!(catalog.recent, vec!["Board Games"]);
    assert_eq!(catalog.custom, vec!["Board Games"]);

    let totals = db.get_category_totals(&month_range(d(2024, 3, 1))).unwrap();
    assert_eq!(totals[0].category, "Board Games");
}

// =============================================================================
// Store Integration Tests
// =============================================================================

#[tokio::test]
async fn test_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_path: dir.path().join("data").join("expensa.db"),
        ..Config::default()
    };

    {
        let store = Store::new(config.clone());
        store
            .add_transaction(NewTransaction::new(10.0, "Food", d(2024, 3, 1)).with_note("lunch"))
            .await
            .unwrap();
        assert!(store.select_currency(Currency::Eur).await);
        store.set_monthly_budget(200.0).await.unwrap();
    }

    let store = Store::new(config);
    assert_eq!(store.currency().await.unwrap(), Currency::Eur);
    assert_eq!(store.monthly_budget().await.unwrap(), Some(200.0));
    let txs = store
        .transactions_in_range(month_range(d(2024, 3, 1)))
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].note.as_deref(), Some("lunch"));
    assert_eq!(store.recent_categories().await.unwrap(), vec!["Food"]);
}

#[tokio::test]
async fn test_store_delete_transaction() {
    let store = Store::in_memory();
    let saved = store
        .add_transaction(NewTransaction::new(8.0, "Food", d(2024, 3, 1)))
        .await
        .unwrap();
    store.delete_transaction(&saved.id).await.unwrap();
    assert!(store.get_transaction(&saved.id).await.unwrap().is_none());
    assert!(store.delete_transaction(&saved.id).await.is_err());
}

#[tokio::test]
async fn test_superseded_period_load_is_dropped() {
    let store = Store::in_memory();
    store
        .add_transaction(NewTransaction::new(5.0, "Food", d(2024, 4, 2)))
        .await
        .unwrap();
    let gate = LatestRequest::new();

    // The user flips from March to April before the March load returns
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let (march, april) = tokio::join!(
        gate.run(async {
            let _ = release_rx.await;
            store.total(month_range(d(2024, 3, 1))).await
        }),
        async {
            let april = gate.run(store.total(month_range(d(2024, 4, 1)))).await;
            let _ = release_tx.send(());
            april
        },
    );

    assert!(march.is_none());
    assert_eq!(april.unwrap().unwrap(), 5.0);
}
