//! SQLite row store for return orders.
//!
//! The store is the system of record. Handles are cheap clones holding only
//! the database path; every call opens a fresh connection, which keeps the
//! type `Send + Sync` and safe to use from `spawn_blocking`.
//!
//! Inserts also journal the order into `index_backlog` inside the same
//! transaction. The semantic index consumes that journal: an entry is
//! removed only after the matching vector write lands, so a crash between
//! the two writes leaves a replayable record instead of a silently
//! unsearchable order.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS return_orders (
    order_id TEXT PRIMARY KEY,
    product TEXT,
    category TEXT,
    return_reason TEXT,
    cost REAL,
    approved_flag TEXT,
    store_name TEXT,
    date TEXT
);
CREATE TABLE IF NOT EXISTS index_backlog (
    order_id TEXT PRIMARY KEY,
    content TEXT NOT NULL
);
";

/// A customer return order.
///
/// `cost` is numeric here and in SQLite; it only becomes a string at the
/// text-projection boundary. `approved_flag` and `date` stay strings, as
/// upstream data carries free-form values for both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnOrder {
    /// Unique order identifier.
    pub order_id: String,
    /// Returned product name.
    pub product: String,
    /// Product category.
    pub category: String,
    /// Free-form return reason.
    pub return_reason: String,
    /// Order cost.
    pub cost: f64,
    /// Approval flag, `"Yes"` or `"No"` in well-formed data.
    pub approved_flag: String,
    /// Store the order was returned to.
    pub store_name: String,
    /// Return date string.
    pub date: String,
}

impl ReturnOrder {
    /// Renders the order as a block of `key: value` lines.
    ///
    /// This is the canonical text shape for index content, retrieval
    /// results, and full dumps; the record parser reads it back.
    #[must_use]
    pub fn projection(&self) -> String {
        format!(
            "order_id: {}\nproduct: {}\ncategory: {}\nreturn_reason: {}\ncost: {}\napproved_flag: {}\nstore_name: {}\ndate: {}",
            self.order_id,
            self.product,
            self.category,
            self.return_reason,
            self.cost,
            self.approved_flag,
            self.store_name,
            self.date,
        )
    }

    /// Renders the one-line listing entry used in insert confirmations.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Order ID: {}, Product: {}, Store: {}, Date: {}",
            self.order_id, self.product, self.store_name, self.date,
        )
    }
}

/// Handle to the return-order tables of a SQLite database.
#[derive(Debug, Clone)]
pub struct RowStore {
    path: PathBuf,
}

impl RowStore {
    /// Opens the store at `path`, creating the schema if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self { path: path.into() };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Inserts a new order, failing on a duplicate `order_id`.
    ///
    /// The index journal entry for `projection` is written in the same
    /// transaction, so either both land or neither does.
    pub fn insert(&self, order: &ReturnOrder, projection: &str) -> Result<(), StorageError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO return_orders
             (order_id, product, category, return_reason, cost, approved_flag, store_name, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                order.order_id,
                order.product,
                order.category,
                order.return_reason,
                order.cost,
                order.approved_flag,
                order.store_name,
                order.date,
            ],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO index_backlog (order_id, content) VALUES (?1, ?2)",
            params![order.order_id, projection],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts or replaces an order. Used by seeding, where re-running the
    /// same CSV must not fail.
    pub fn upsert(&self, order: &ReturnOrder, projection: &str) -> Result<(), StorageError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO return_orders
             (order_id, product, category, return_reason, cost, approved_flag, store_name, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                order.order_id,
                order.product,
                order.category,
                order.return_reason,
                order.cost,
                order.approved_flag,
                order.store_name,
                order.date,
            ],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO index_backlog (order_id, content) VALUES (?1, ?2)",
            params![order.order_id, projection],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Returns all orders in insertion order.
    pub fn fetch_all(&self) -> Result<Vec<ReturnOrder>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT order_id, product, category, return_reason, cost, approved_flag, store_name, date
             FROM return_orders ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ReturnOrder {
                order_id: row.get(0)?,
                product: row.get(1)?,
                category: row.get(2)?,
                return_reason: row.get(3)?,
                cost: row.get(4)?,
                approved_flag: row.get(5)?,
                store_name: row.get(6)?,
                date: row.get(7)?,
            })
        })?;
        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }

    /// Renders the one-line-per-order listing for insert confirmations.
    pub fn order_lines(&self) -> Result<String, StorageError> {
        let orders = self.fetch_all()?;
        Ok(orders
            .iter()
            .map(ReturnOrder::summary_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Number of stored orders.
    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM return_orders", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Journal entries whose index write has not been confirmed yet.
    pub fn pending_backlog(&self) -> Result<Vec<(String, String)>, StorageError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT order_id, content FROM index_backlog ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut pending = Vec::new();
        for row in rows {
            pending.push(row?);
        }
        Ok(pending)
    }

    /// Removes the journal entry for `order_id` once its index write landed.
    pub fn clear_backlog(&self, order_id: &str) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM index_backlog WHERE order_id = ?1",
            params![order_id],
        )?;
        Ok(())
    }
}
