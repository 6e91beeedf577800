//! Key-value settings: currency, monthly budget, and the budget month marker

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::Database;
use crate::dates::{month_key, month_range, parse_month_key};
use crate::error::{Error, Result};
use crate::models::BudgetStatus;
use crate::money::Currency;

/// Setting keys
pub mod keys {
    pub const CURRENCY: &str = "currency_code";
    /// Name used by older releases; migrated to `CURRENCY` on first read
    pub const LEGACY_CURRENCY: &str = "currency";
    pub const MONTHLY_BUDGET: &str = "monthly_budget";
    pub const BUDGET_MONTH: &str = "budget_month";
    pub const RECENT_CATEGORIES: &str = "recent_categories";
}

pub(crate) fn read_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.flatten())
}

pub(crate) fn write_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Stored budget text to an amount; anything unusable means "unset"
fn parse_budget(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        read_setting(&conn, key)
    }

    /// Insert or overwrite a setting
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        write_setting(&conn, key, value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Selected display currency.
    ///
    /// When only the legacy key exists its value is normalized, rewritten under
    /// the current key, and the legacy key removed.
    pub fn get_currency(&self) -> Result<Currency> {
        let mut conn = self.conn()?;
        if let Some(code) = read_setting(&conn, keys::CURRENCY)? {
            return Ok(Currency::from_code_or_default(Some(&code)));
        }

        let Some(legacy) = read_setting(&conn, keys::LEGACY_CURRENCY)? else {
            return Ok(Currency::default());
        };
        let currency = Currency::from_code_or_default(Some(&legacy));

        let tx = conn.transaction()?;
        write_setting(&tx, keys::CURRENCY, currency.code())?;
        tx.execute(
            "DELETE FROM settings WHERE key = ?1",
            params![keys::LEGACY_CURRENCY],
        )?;
        tx.commit()?;
        info!("Migrated legacy currency setting {:?} -> {}", legacy, currency);

        Ok(currency)
    }

    pub fn set_currency(&self, currency: Currency) -> Result<()> {
        self.set_setting(keys::CURRENCY, currency.code())
    }

    /// Monthly budget, or `None` when unset or unreadable
    pub fn get_monthly_budget(&self) -> Result<Option<f64>> {
        let raw = self.get_setting(keys::MONTHLY_BUDGET)?;
        let budget = parse_budget(raw.as_deref());
        if budget.is_none() && raw.as_deref().is_some_and(|r| !r.is_empty()) {
            debug!("Treating stored budget {:?} as unset", raw);
        }
        Ok(budget)
    }

    /// Store a budget; negative or non-finite amounts are clamped to 0
    pub fn set_monthly_budget(&self, amount: f64) -> Result<f64> {
        let amount = if amount.is_finite() && amount > 0.0 {
            amount
        } else {
            0.0
        };
        self.set_setting(keys::MONTHLY_BUDGET, &amount.to_string())?;
        Ok(amount)
    }

    /// Mark the budget as unset (empty-string sentinel)
    pub fn clear_monthly_budget(&self) -> Result<()> {
        self.set_setting(keys::MONTHLY_BUDGET, "")
    }

    /// `YYYY-MM` the budget was last confirmed for
    pub fn get_budget_month(&self) -> Result<Option<String>> {
        Ok(self
            .get_setting(keys::BUDGET_MONTH)?
            .filter(|m| parse_month_key(m).is_some()))
    }

    pub fn set_budget_month(&self, month: &str) -> Result<()> {
        let month = month.trim();
        if parse_month_key(month).is_none() {
            return Err(Error::Validation(format!(
                "Invalid budget month: {} (expected YYYY-MM)",
                month
            )));
        }
        self.set_setting(keys::BUDGET_MONTH, month)
    }

    /// Rewrite the month marker if it does not match `today`'s month.
    ///
    /// Returns true when the marker changed. The budget amount is left as is;
    /// whether to reset it on rollover is up to the caller.
    pub fn sync_budget_month(&self, today: NaiveDate) -> Result<bool> {
        let current = month_key(today);
        if self.get_budget_month()?.as_deref() == Some(current.as_str()) {
            return Ok(false);
        }
        self.set_setting(keys::BUDGET_MONTH, &current)?;
        debug!("Budget month marker moved to {}", current);
        Ok(true)
    }

    /// Budget against spend for the month containing `today`
    pub fn get_budget_status(&self, today: NaiveDate) -> Result<BudgetStatus> {
        let budget = self.get_monthly_budget()?;
        let spent = self.get_total(&month_range(today))?;
        Ok(BudgetStatus::new(month_key(today), budget, spent))
    }
}
