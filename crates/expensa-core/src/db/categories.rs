//! Custom and recently-used categories

use rusqlite::{params, Connection, TransactionBehavior};
use tracing::debug;

use super::settings::{keys, read_setting, write_setting};
use super::{format_timestamp, now_millis, timestamp_column, Database};
use crate::categories::{
    is_default_category, normalize_category_name, parse_recent, push_recent, same_category,
    DEFAULT_CATEGORIES,
};
use crate::error::{Error, Result};
use crate::models::{CategoryCatalog, CustomCategory};

fn query_custom_categories(conn: &Connection) -> Result<Vec<CustomCategory>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM custom_categories ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(CustomCategory {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: timestamp_column(row, 2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Spelling under which `name` is already known: a default, a custom
/// category, or the earliest expense filed under it. Falls back to `name`.
pub(crate) fn canonical_category(conn: &Connection, name: &str) -> Result<String> {
    if let Some(default) = DEFAULT_CATEGORIES.iter().find(|d| same_category(d, name)) {
        return Ok(default.to_string());
    }
    if let Some(custom) = query_custom_categories(conn)?
        .into_iter()
        .find(|c| same_category(&c.name, name))
    {
        return Ok(custom.name);
    }

    let mut stmt = conn.prepare(
        "SELECT category FROM transactions GROUP BY category ORDER BY MIN(createdAt), category",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let existing: String = row.get(0)?;
        if same_category(&existing, name) {
            return Ok(existing);
        }
    }
    Ok(name.to_string())
}

impl Database {
    /// Custom categories in creation order
    pub fn list_custom_categories(&self) -> Result<Vec<CustomCategory>> {
        let conn = self.conn()?;
        query_custom_categories(&conn)
    }

    /// Add a user category, returning the normalized name that was stored.
    ///
    /// The duplicate check and the insert share one immediate transaction, so
    /// concurrent adds of case variants cannot both land.
    pub fn add_custom_category(&self, name: &str) -> Result<String> {
        let name = normalize_category_name(name);
        if name.is_empty() {
            return Err(Error::Validation("Category name cannot be empty".to_string()));
        }
        if is_default_category(&name) {
            return Err(Error::DuplicateCategory(name));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if query_custom_categories(&tx)?
            .iter()
            .any(|c| same_category(&c.name, &name))
        {
            return Err(Error::DuplicateCategory(name));
        }
        tx.execute(
            "INSERT INTO custom_categories (name, created_at) VALUES (?1, ?2)",
            params![name, format_timestamp(&now_millis())],
        )?;
        tx.commit()?;
        debug!("Added custom category {}", name);
        Ok(name)
    }

    /// Remove a custom category by exact normalized name. Returns whether a row was removed.
    pub fn delete_custom_category(&self, name: &str) -> Result<bool> {
        let name = normalize_category_name(name);
        if name.is_empty() {
            return Ok(false);
        }
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM custom_categories WHERE name = ?1 COLLATE BINARY",
            params![name],
        )?;
        Ok(deleted > 0)
    }

    /// Recently-used categories, most recent first
    pub fn get_recent_categories(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let raw = read_setting(&conn, keys::RECENT_CATEGORIES)?;
        Ok(parse_recent(raw.as_deref()))
    }

    /// Move a category to the front of the recent list
    pub fn record_recent_category(&self, name: &str) -> Result<Vec<String>> {
        let name = normalize_category_name(name);
        let conn = self.conn()?;
        let current = parse_recent(read_setting(&conn, keys::RECENT_CATEGORIES)?.as_deref());
        if name.is_empty() {
            return Ok(current);
        }
        let updated = push_recent(&current, &name);
        write_setting(
            &conn,
            keys::RECENT_CATEGORIES,
            &serde_json::to_string(&updated)?,
        )?;
        Ok(updated)
    }

    /// All category lists for the picker
    pub fn get_category_catalog(&self) -> Result<CategoryCatalog> {
        Ok(CategoryCatalog {
            recent: self.get_recent_categories()?,
            defaults: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            custom: self
                .list_custom_categories()?
                .into_iter()
                .map(|c| c.name)
                .collect(),
        })
    }
}
