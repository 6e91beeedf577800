//! Expensa Core Library
//!
//! Local data and analytics layer for the Expensa expense tracker:
//! - Date-range windows for day/week/month/custom periods
//! - Currency handling and money formatting
//! - Default, custom and recently-used categories
//! - SQLite storage with migrations, settings and budget
//! - Spending aggregation over date ranges
//! - Async store with lazy one-time initialization for the app shell

pub mod categories;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod money;
pub mod requests;
pub mod store;

pub use categories::{normalize_category_name, DEFAULT_CATEGORIES, MAX_RECENT_CATEGORIES};
pub use config::Config;
pub use dates::{
    custom_range, day_range, month_key, month_range, week_range, DateRange, Period,
    PeriodSelection,
};
pub use db::{Database, DEFAULT_TOP_DAYS};
pub use error::{Error, ErrorKind, Result};
pub use models::{
    BudgetStatus, CategoryCatalog, CategoryTotal, CustomCategory, DayTotal, NewTransaction,
    PeriodSummary, Transaction,
};
pub use money::{format_compact, format_compact_money, format_money, Currency};
pub use requests::{LatestRequest, RequestTicket};
pub use store::{Store, StoreEvent};
