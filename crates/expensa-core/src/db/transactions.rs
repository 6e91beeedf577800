//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use super::categories::canonical_category;
use super::{format_timestamp, now_millis, timestamp_column, Database};
use crate::dates::{DateRange, ISO_DATE_FORMAT};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

const TRANSACTION_COLUMNS: &str =
    "id, amount, category, item, note, attachmentUri, date, createdAt";

pub(crate) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(6)?;
    let date = NaiveDate::parse_from_str(&date_str, ISO_DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        item: row.get(3)?,
        note: row.get(4)?,
        attachment_uri: row.get(5)?,
        date,
        created_at: timestamp_column(row, 7)?,
    })
}

impl Database {
    /// Validate and store a new expense, returning the saved row.
    ///
    /// The category is stored with the casing it was first seen with, whether
    /// that is a default, a custom category or an earlier expense.
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let mut tx = tx.validated()?;
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = now_millis();

        let mut conn = self.conn()?;
        let db_tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.category = canonical_category(&db_tx, &tx.category)?;
        db_tx.execute(
            r#"
            INSERT INTO transactions (id, amount, category, item, note, attachmentUri, date, createdAt)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                id,
                tx.amount,
                tx.category,
                tx.item,
                tx.note,
                tx.attachment_uri,
                tx.date.format(ISO_DATE_FORMAT).to_string(),
                format_timestamp(&created_at),
            ],
        )?;
        db_tx.commit()?;
        debug!("Inserted transaction {} ({} on {})", id, tx.category, tx.date);

        Ok(Transaction {
            id,
            amount: tx.amount,
            category: tx.category,
            item: tx.item,
            note: tx.note,
            attachment_uri: tx.attachment_uri,
            date: tx.date,
            created_at,
        })
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLUMNS);
        let tx = conn
            .query_row(&sql, params![id], row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    /// Delete a transaction. Transactions are otherwise immutable.
    pub fn delete_transaction(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        debug!("Deleted transaction {}", id);
        Ok(())
    }

    /// Transactions with `date` in `[from, to)`, newest expense date first
    pub fn list_transactions_in_range(&self, range: &DateRange) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            ORDER BY date DESC, createdAt DESC
            "#,
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![range.from_iso(), range.to_iso()], row_to_transaction)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Most recently entered transactions, regardless of expense date
    pub fn list_recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY createdAt DESC LIMIT ?1",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], row_to_transaction)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
