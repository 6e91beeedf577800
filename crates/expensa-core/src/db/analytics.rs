//! Spending aggregation over `[from, to)` date ranges

use chrono::NaiveDate;
use rusqlite::params;

use super::Database;
use crate::dates::{DateRange, ISO_DATE_FORMAT};
use crate::error::Result;
use crate::models::{CategoryTotal, DayTotal, PeriodSummary};

/// Number of days returned by `get_top_days` when the caller has no preference
pub const DEFAULT_TOP_DAYS: usize = 10;

fn parse_day(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, ISO_DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Database {
    /// Total spend in the range; 0 when there are no transactions
    pub fn get_total(&self, range: &DateRange) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE date >= ?1 AND date < ?2",
            params![range.from_iso(), range.to_iso()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn get_transaction_count(&self, range: &DateRange) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE date >= ?1 AND date < ?2",
            params![range.from_iso(), range.to_iso()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Per-category totals, largest first. Case variants of a name share one row.
    pub fn get_category_totals(&self, range: &DateRange) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT MIN(category) AS name, SUM(amount) AS total
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            GROUP BY category COLLATE NOCASE
            ORDER BY total DESC, name ASC
            "#,
        )?;
        let rows = stmt.query_map(params![range.from_iso(), range.to_iso()], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// The `limit` days with the highest spend, largest first
    pub fn get_top_days(&self, range: &DateRange, limit: usize) -> Result<Vec<DayTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, SUM(amount) AS total
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            GROUP BY date
            ORDER BY total DESC, date ASC
            LIMIT ?3
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![range.from_iso(), range.to_iso(), limit], |row| {
            Ok(DayTotal {
                date: parse_day(row, 0)?,
                total: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Per-day totals in date order; days without spend are omitted
    pub fn get_daily_totals(&self, range: &DateRange) -> Result<Vec<DayTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, SUM(amount) AS total
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            GROUP BY date
            ORDER BY date ASC
            "#,
        )?;
        let rows = stmt.query_map(params![range.from_iso(), range.to_iso()], |row| {
            Ok(DayTotal {
                date: parse_day(row, 0)?,
                total: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Total, count, category breakdown and top days for one range.
    ///
    /// The queries run one after another without a wrapping transaction.
    pub fn get_period_summary(&self, range: &DateRange, top_days: usize) -> Result<PeriodSummary> {
        Ok(PeriodSummary {
            range: *range,
            total: self.get_total(range)?,
            transaction_count: self.get_transaction_count(range)?,
            categories: self.get_category_totals(range)?,
            top_days: self.get_top_days(range, top_days)?,
        })
    }
}
