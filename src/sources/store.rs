//! Customer store backed by SQLite
//!
//! Every call opens its own connection on a blocking thread; SQLite opens
//! are cheap and this keeps the store `Send + Sync` without a pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use super::{AdapterHealth, HealthCheck};
use crate::error::{Error, Result};
use crate::models::{Customer, Subscription};

/// Adapter name used in errors and health output
pub const ADAPTER: &str = "store";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customers (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    bu      TEXT NOT NULL,
    rr      REAL NOT NULL DEFAULT 0,
    nrr     REAL NOT NULL DEFAULT 0,
    total   REAL NOT NULL DEFAULT 0,
    UNIQUE (name, bu)
);
CREATE TABLE IF NOT EXISTS subscriptions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id   INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    sub_id        TEXT,
    arr           REAL,
    renewal_qtr   TEXT,
    will_renew    TEXT,
    projected_arr REAL
);
";

/// Query parameters for [`CustomerStore::find_customers`].
///
/// Serialized into the cache key, so every field must distinguish results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerFilter {
    pub bu: Option<String>,
    pub min_total: Option<f64>,
}

#[async_trait]
pub trait CustomerStore: HealthCheck {
    /// Customers with subscriptions, largest total revenue first.
    async fn find_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>>;

    /// Insert or replace a customer and its subscriptions; returns the row id.
    async fn upsert_customer(&self, customer: &Customer) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a fresh connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| Error::adapter(ADAPTER, format!("query task failed: {}", e)))?
    }
}

fn load_customers(conn: &Connection, filter: &CustomerFilter) -> Result<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, bu, rr, nrr, total FROM customers
         WHERE (?1 IS NULL OR bu = ?1) AND (?2 IS NULL OR total >= ?2)
         ORDER BY total DESC, name",
    )?;
    let rows = stmt
        .query_map(params![filter.bu, filter.min_total], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Customer {
                    name: row.get(1)?,
                    bu: row.get(2)?,
                    rr: row.get(3)?,
                    nrr: row.get(4)?,
                    total: row.get(5)?,
                    subscriptions: Vec::new(),
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut subs: HashMap<i64, Vec<Subscription>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT customer_id, sub_id, arr, renewal_qtr, will_renew, projected_arr
         FROM subscriptions ORDER BY id",
    )?;
    let sub_rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Subscription {
                sub_id: row.get(1)?,
                arr: row.get(2)?,
                renewal_qtr: row.get(3)?,
                will_renew: row.get(4)?,
                projected_arr: row.get(5)?,
            },
        ))
    })?;
    for sub in sub_rows {
        let (customer_id, sub) = sub?;
        subs.entry(customer_id).or_default().push(sub);
    }

    Ok(rows
        .into_iter()
        .map(|(id, mut customer)| {
            customer.subscriptions = subs.remove(&id).unwrap_or_default();
            customer
        })
        .collect())
}

fn upsert(conn: &mut Connection, customer: &Customer) -> Result<i64> {
    let tx = conn.transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM customers WHERE name = ?1 AND bu = ?2",
            params![customer.name, customer.bu],
            |row| row.get(0),
        )
        .optional()?;

    let id = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE customers SET rr = ?1, nrr = ?2, total = ?3 WHERE id = ?4",
                params![customer.rr, customer.nrr, customer.total, id],
            )?;
            tx.execute("DELETE FROM subscriptions WHERE customer_id = ?1", params![id])?;
            id
        }
        None => {
            tx.execute(
                "INSERT INTO customers (name, bu, rr, nrr, total) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![customer.name, customer.bu, customer.rr, customer.nrr, customer.total],
            )?;
            tx.last_insert_rowid()
        }
    };

    for sub in &customer.subscriptions {
        tx.execute(
            "INSERT INTO subscriptions
                (customer_id, sub_id, arr, renewal_qtr, will_renew, projected_arr)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                sub.sub_id,
                sub.arr,
                sub.renewal_qtr,
                sub.will_renew,
                sub.projected_arr
            ],
        )?;
    }

    tx.commit()?;
    Ok(id)
}

#[async_trait]
impl CustomerStore for SqliteStore {
    async fn find_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let filter = filter.clone();
        let customers = self
            .with_connection(move |conn| load_customers(conn, &filter))
            .await?;
        debug!("Loaded {} customers from {}", customers.len(), self.path.display());
        Ok(customers)
    }

    async fn upsert_customer(&self, customer: &Customer) -> Result<i64> {
        let customer = customer.clone();
        self.with_connection(move |conn| upsert(conn, &customer))
            .await
    }
}

#[async_trait]
impl HealthCheck for SqliteStore {
    async fn health(&self) -> AdapterHealth {
        let probe = self
            .with_connection(|conn| {
                let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
                Ok(one)
            })
            .await;

        match probe {
            Ok(_) => AdapterHealth::connected(ADAPTER),
            Err(err) => AdapterHealth::failed(ADAPTER, err.to_string()),
        }
    }
}
