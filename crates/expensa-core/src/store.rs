//! Async store used by the app shell
//!
//! The `Store` owns the database lazily: nothing is opened until the first
//! operation, and concurrent first callers wait on the same initialization
//! instead of racing duplicate migrations. SQLite work runs on the blocking
//! thread pool so callers on the UI runtime never block on disk.

use chrono::NaiveDate;
use tokio::sync::{broadcast, OnceCell, RwLock};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{keys, Database};
use crate::dates::DateRange;
use crate::error::Result;
use crate::models::{
    BudgetStatus, CategoryCatalog, CategoryTotal, CustomCategory, DayTotal, NewTransaction,
    PeriodSummary, Transaction,
};
use crate::money::Currency;

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A locally applied setting could not be saved. The local value is kept.
    PersistFailed {
        setting: &'static str,
        message: String,
    },
}

const EVENT_CAPACITY: usize = 16;

pub struct Store {
    config: Config,
    db: OnceCell<Database>,
    /// Currency as the UI currently shows it, which may be ahead of disk
    currency: RwLock<Option<Currency>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(config: Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            db: OnceCell::new(),
            currency: RwLock::new(None),
            events,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Config::in_memory())
    }

    /// Wrap an already opened database
    pub fn with_database(db: Database) -> Self {
        let store = Self::new(Config {
            database_path: db.path().into(),
            ..Config::default()
        });
        // A fresh cell cannot already be set
        let _ = store.db.set(db);
        store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.db.initialized()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// The shared database, opened and migrated on first use
    pub async fn database(&self) -> Result<Database> {
        let db = self
            .db
            .get_or_try_init(|| async {
                let config = self.config.clone();
                info!("Opening database at {}", config.database_path.display());
                tokio::task::spawn_blocking(move || Database::open(&config)).await?
            })
            .await?;
        Ok(db.clone())
    }

    /// Run a blocking database call off the async runtime
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.database().await?;
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Save an expense and move its category to the front of the recent list.
    ///
    /// Once the expense is saved the call succeeds; a failure to update the
    /// recent list is logged and broadcast as `StoreEvent::PersistFailed`.
    pub async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let saved = self.with_db(move |db| db.insert_transaction(&tx)).await?;

        let category = saved.category.clone();
        if let Err(e) = self
            .with_db(move |db| db.record_recent_category(&category))
            .await
        {
            warn!("Saved transaction {} but not its recent category: {}", saved.id, e);
            let _ = self.events.send(StoreEvent::PersistFailed {
                setting: keys::RECENT_CATEGORIES,
                message: e.user_message(),
            });
        }
        Ok(saved)
    }

    pub async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let id = id.to_string();
        self.with_db(move |db| db.get_transaction(&id)).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| db.delete_transaction(&id)).await
    }

    pub async fn transactions_in_range(&self, range: DateRange) -> Result<Vec<Transaction>> {
        self.with_db(move |db| db.list_transactions_in_range(&range))
            .await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    pub async fn total(&self, range: DateRange) -> Result<f64> {
        self.with_db(move |db| db.get_total(&range)).await
    }

    pub async fn category_totals(&self, range: DateRange) -> Result<Vec<CategoryTotal>> {
        self.with_db(move |db| db.get_category_totals(&range)).await
    }

    pub async fn top_days(&self, range: DateRange, limit: usize) -> Result<Vec<DayTotal>> {
        self.with_db(move |db| db.get_top_days(&range, limit)).await
    }

    pub async fn daily_totals(&self, range: DateRange) -> Result<Vec<DayTotal>> {
        self.with_db(move |db| db.get_daily_totals(&range)).await
    }

    /// All summary figures for a range, queried concurrently.
    ///
    /// The queries are independent reads; a write landing between them can
    /// make the figures disagree slightly.
    pub async fn period_summary(&self, range: DateRange, top_days: usize) -> Result<PeriodSummary> {
        let (total, transaction_count, categories, top_days) = tokio::try_join!(
            self.total(range),
            self.with_db(move |db| db.get_transaction_count(&range)),
            self.category_totals(range),
            self.top_days(range, top_days),
        )?;
        Ok(PeriodSummary {
            range,
            total,
            transaction_count,
            categories,
            top_days,
        })
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn add_custom_category(&self, name: &str) -> Result<String> {
        let name = name.to_string();
        self.with_db(move |db| db.add_custom_category(&name)).await
    }

    pub async fn delete_custom_category(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.with_db(move |db| db.delete_custom_category(&name)).await
    }

    pub async fn custom_categories(&self) -> Result<Vec<CustomCategory>> {
        self.with_db(|db| db.list_custom_categories()).await
    }

    pub async fn recent_categories(&self) -> Result<Vec<String>> {
        self.with_db(|db| db.get_recent_categories()).await
    }

    pub async fn record_recent_category(&self, name: &str) -> Result<Vec<String>> {
        let name = name.to_string();
        self.with_db(move |db| db.record_recent_category(&name)).await
    }

    pub async fn category_catalog(&self) -> Result<CategoryCatalog> {
        self.with_db(|db| db.get_category_catalog()).await
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Display currency; the locally selected value wins over disk
    pub async fn currency(&self) -> Result<Currency> {
        if let Some(currency) = *self.currency.read().await {
            return Ok(currency);
        }
        let loaded = self.with_db(|db| db.get_currency()).await?;
        let mut cached = self.currency.write().await;
        Ok(*cached.get_or_insert(loaded))
    }

    /// Apply a currency locally, then try to persist it.
    ///
    /// A failed write is reported through `StoreEvent::PersistFailed` and the
    /// local selection is kept. Returns whether the write succeeded.
    pub async fn select_currency(&self, currency: Currency) -> bool {
        *self.currency.write().await = Some(currency);

        match self.with_db(move |db| db.set_currency(currency)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save currency {}: {}", currency, e);
                // No subscribers is fine
                let _ = self.events.send(StoreEvent::PersistFailed {
                    setting: keys::CURRENCY,
                    message: e.user_message(),
                });
                false
            }
        }
    }

    pub async fn monthly_budget(&self) -> Result<Option<f64>> {
        self.with_db(|db| db.get_monthly_budget()).await
    }

    /// Store a budget (clamped to 0 when negative); returns the stored amount
    pub async fn set_monthly_budget(&self, amount: f64) -> Result<f64> {
        self.with_db(move |db| db.set_monthly_budget(amount)).await
    }

    pub async fn clear_monthly_budget(&self) -> Result<()> {
        self.with_db(|db| db.clear_monthly_budget()).await
    }

    /// Rewrite the budget month marker if `today` is in a different month
    pub async fn sync_budget_month(&self, today: NaiveDate) -> Result<bool> {
        self.with_db(move |db| db.sync_budget_month(today)).await
    }

    pub async fn budget_status(&self, today: NaiveDate) -> Result<BudgetStatus> {
        self.with_db(move |db| db.get_budget_status(today)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{month_range, PeriodSelection};
    use crate::db::DEFAULT_TOP_DAYS;
    use crate::requests::LatestRequest;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_database_opens_lazily() {
        let store = Store::in_memory();
        assert!(!store.is_initialized());
        store.total(month_range(d(2024, 3, 1))).await.unwrap();
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_database() {
        let store = Arc::new(Store::in_memory());
        let (a, b) = tokio::join!(store.database(), store.database());
        let (a, b) = (a.unwrap(), b.unwrap());

        a.insert_transaction(&NewTransaction::new(7.0, "Food", d(2024, 3, 1)))
            .unwrap();
        assert_eq!(b.get_total(&month_range(d(2024, 3, 1))).unwrap(), 7.0);
    }

    #[tokio::test]
    async fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("expensa.db"),
            ..Config::default()
        };
        let store = Store::new(config.clone());
        store
            .add_transaction(NewTransaction::new(12.0, "Food", d(2024, 3, 1)))
            .await
            .unwrap();
        drop(store);

        let reopened = Store::new(config);
        assert_eq!(reopened.total(month_range(d(2024, 3, 1))).await.unwrap(), 12.0);
    }

    #[tokio::test]
    async fn test_march_scenario() {
        let store = Store::in_memory();
        for (amount, date) in [
            (10.0, d(2024, 3, 1)),
            (20.0, d(2024, 3, 15)),
            (5.0, d(2024, 4, 1)),
        ] {
            store
                .add_transaction(NewTransaction::new(amount, "Food", date))
                .await
                .unwrap();
        }

        let range = PeriodSelection::Month { date: d(2024, 3, 10) }.range();
        let summary = store.period_summary(range, DEFAULT_TOP_DAYS).await.unwrap();
        assert_eq!(summary.total, 30.0);
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.categories.len(), 1);
        assert_eq!(summary.categories[0].total, 30.0);
        assert_eq!(summary.top_days.len(), 2);
    }

    #[tokio::test]
    async fn test_add_transaction_records_recent_category() {
        let store = Store::in_memory();
        store
            .add_transaction(NewTransaction::new(3.0, " Coffee ", d(2024, 3, 1)))
            .await
            .unwrap();
        assert_eq!(store.recent_categories().await.unwrap(), vec!["Coffee"]);
    }

    #[tokio::test]
    async fn test_saved_expense_survives_recent_list_failure() {
        let db = Database::in_memory().unwrap();
        db.conn().unwrap().execute_batch("DROP TABLE settings").unwrap();
        let store = Store::with_database(db);
        let mut events = store.subscribe();

        let saved = store
            .add_transaction(NewTransaction::new(10.0, "Food", d(2024, 3, 1)))
            .await
            .unwrap();
        assert_eq!(saved.category, "Food");
        assert_eq!(store.total(month_range(d(2024, 3, 1))).await.unwrap(), 10.0);

        match events.recv().await.unwrap() {
            StoreEvent::PersistFailed { setting, .. } => {
                assert_eq!(setting, keys::RECENT_CATEGORIES);
            }
        }
    }

    #[tokio::test]
    async fn test_validation_errors_surface_to_caller() {
        let store = Store::in_memory();
        let err = store.add_custom_category("Groceries").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(store.add_custom_category("  My  Shop ").await.unwrap(), "My Shop");
    }

    #[tokio::test]
    async fn test_select_currency_persists() {
        let store = Store::in_memory();
        assert_eq!(store.currency().await.unwrap(), Currency::Usd);
        assert!(store.select_currency(Currency::Eur).await);

        let db = store.database().await.unwrap();
        assert_eq!(db.get_currency().unwrap(), Currency::Eur);
    }

    #[tokio::test]
    async fn test_select_currency_keeps_local_value_when_write_fails() {
        let db = Database::in_memory().unwrap();
        db.conn().unwrap().execute_batch("DROP TABLE settings").unwrap();
        let store = Store::with_database(db);
        let mut events = store.subscribe();

        assert!(!store.select_currency(Currency::Gbp).await);
        assert_eq!(store.currency().await.unwrap(), Currency::Gbp);

        match events.recv().await.unwrap() {
            StoreEvent::PersistFailed { setting, message } => {
                assert_eq!(setting, keys::CURRENCY);
                assert_eq!(message, crate::error::GENERIC_FAILURE_MESSAGE);
            }
        }
    }

    #[tokio::test]
    async fn test_budget_roundtrip_and_rollover() {
        let store = Store::in_memory();
        assert_eq!(store.monthly_budget().await.unwrap(), None);
        assert_eq!(store.set_monthly_budget(-5.0).await.unwrap(), 0.0);
        store.set_monthly_budget(250.0).await.unwrap();

        assert!(store.sync_budget_month(d(2024, 3, 1)).await.unwrap());
        assert!(store.sync_budget_month(d(2024, 4, 1)).await.unwrap());
        // Rollover leaves the amount in place
        assert_eq!(store.monthly_budget().await.unwrap(), Some(250.0));

        store.clear_monthly_budget().await.unwrap();
        let status = store.budget_status(d(2024, 4, 2)).await.unwrap();
        assert_eq!(status.budget, None);
        assert_eq!(status.month, "2024-04");
    }

    #[tokio::test]
    async fn test_latest_request_wins_over_store_loads() {
        let store = Arc::new(Store::in_memory());
        store
            .add_transaction(NewTransaction::new(9.0, "Food", d(2024, 4, 3)))
            .await
            .unwrap();
        let gate = LatestRequest::new();

        let ticket_march = gate.begin();
        let march = store.total(month_range(d(2024, 3, 1))).await.unwrap();
        let april = gate
            .run(store.total(month_range(d(2024, 4, 1))))
            .await
            .unwrap()
            .unwrap();

        assert!(!gate.is_latest(ticket_march), "march load was superseded");
        assert_eq!(march, 0.0);
        assert_eq!(april, 9.0);
    }
}
