//! SQLite rate cache
//!
//! One row per date (`YYYY-MM-DD` primary key) and one TEXT column per
//! currency holding the decimal rate against the base currency. Older
//! caches that stored REAL values are still readable.
//!
//! The connection is shared through [`ConnectionPool`]: every access is
//! serialized by a mutex, the connection is opened on the first lease and
//! closed when the last lease is dropped. [`RateStore::hold`] takes a lease
//! for a whole batch of lookups so the file stays open between them.

use super::base::{RateQuote, RateTable};
pub use super::store::CACHE_FILE_NAME;
use super::store::{RateStore, StoreHold};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

struct PoolState {
    conn: Option<Connection>,
    leases: usize,
    opened: usize,
}

/// Reference-counted, mutex-guarded SQLite connection
pub struct ConnectionPool {
    path: PathBuf,
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    /// Create new pool for the database at `path`; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(PoolState {
                conn: None,
                leases: 0,
                opened: 0,
            }),
        }
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|_| MoneyError::CacheUnavailable("connection lock poisoned".to_string()))
    }

    /// Take a lease, opening the connection if nobody holds one
    pub fn acquire(&self) -> Result<PoolLease<'_>> {
        let mut state = self.lock()?;
        if state.conn.is_none() {
            log::debug!("Opening rate cache {}", self.path.display());
            let conn = Connection::open(&self.path).map_err(|e| {
                MoneyError::CacheUnavailable(format!(
                    "Failed to open {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            state.conn = Some(conn);
            state.opened += 1;
        }
        state.leases += 1;
        Ok(PoolLease { pool: self })
    }

    /// Number of live leases
    pub fn leases(&self) -> usize {
        self.lock().map(|s| s.leases).unwrap_or(0)
    }

    /// Whether a connection is currently open
    pub fn is_open(&self) -> bool {
        self.lock().map(|s| s.conn.is_some()).unwrap_or(false)
    }

    /// How many times a connection has been opened
    pub fn opens(&self) -> usize {
        self.lock().map(|s| s.opened).unwrap_or(0)
    }
}

/// Shared use of the pooled connection; the last one dropped closes it
pub struct PoolLease<'a> {
    pool: &'a ConnectionPool,
}

impl PoolLease<'_> {
    /// Run `f` with exclusive access to the connection
    pub fn with<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let state = self.pool.lock()?;
        let conn = state
            .conn
            .as_ref()
            .ok_or_else(|| MoneyError::CacheUnavailable("connection closed".to_string()))?;
        f(conn).map_err(|e| MoneyError::CacheUnavailable(e.to_string()))
    }
}

impl Drop for PoolLease<'_> {
    fn drop(&mut self) {
        let mut state = match self.pool.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.leases = state.leases.saturating_sub(1);
        if state.leases == 0 {
            if let Some(conn) = state.conn.take() {
                log::debug!("Closing rate cache {}", self.pool.path.display());
                if let Err((_, e)) = conn.close() {
                    log::warn!("Failed to close rate cache cleanly: {}", e);
                }
            }
        }
    }
}

/// Rate cache backed by a SQLite file
pub struct SqliteRateStore {
    pool: ConnectionPool,
}

impl SqliteRateStore {
    /// Open (creating if needed) the database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            pool: ConnectionPool::new(path),
        };
        store.create_table()?;
        Ok(store)
    }

    /// Open `<dir>/exchange-rates.db`, creating the directory
    pub fn open_dir(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Self::new(dir.join(CACHE_FILE_NAME))
    }

    /// Get the connection pool
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Create the rates table with a column for every catalog currency
    pub fn create_table(&self) -> Result<()> {
        let columns = Currency::VARIANTS
            .iter()
            .map(|c| format!("\"{}\" TEXT", c.column()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS rates (date TEXT PRIMARY KEY, {})",
            columns
        );

        let lease = self.pool.acquire()?;
        lease.with(|conn| conn.execute(&sql, []).map(|_| ()))
    }
}

fn existing_columns(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(rates)")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

fn decimal_from_sql(value: ValueRef<'_>) -> Option<Decimal> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).ok(),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| Decimal::from_str(s.trim()).ok()),
        ValueRef::Blob(_) => None,
    }
}

impl RateStore for SqliteRateStore {
    fn get(&self, date: NaiveDate, currencies: &[Currency]) -> Result<Option<RateQuote>> {
        let lease = self.pool.acquire()?;
        let values = lease.with(|conn| {
            let existing = existing_columns(conn)?;
            let present: Vec<Currency> = currencies
                .iter()
                .copied()
                .filter(|c| existing.contains(&c.column()))
                .collect();

            let mut select = vec!["date".to_string()];
            select.extend(present.iter().map(|c| format!("\"{}\"", c.column())));
            let sql = format!("SELECT {} FROM rates WHERE date = ?1", select.join(", "));

            conn.query_row(&sql, params![date.to_string()], |row| {
                let mut values = Vec::with_capacity(present.len());
                for (i, currency) in present.iter().enumerate() {
                    values.push((*currency, decimal_from_sql(row.get_ref(i + 1)?)));
                }
                Ok(values)
            })
            .optional()
        })?;

        Ok(values.map(|values| {
            let mut quote = RateQuote::new(date);
            for currency in currencies {
                quote.insert(*currency, None);
            }
            for (currency, rate) in values {
                quote.insert(currency, rate);
            }
            quote
        }))
    }

    fn get_table(&self, date: NaiveDate) -> Result<Option<RateTable>> {
        let lease = self.pool.acquire()?;
        lease.with(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM rates WHERE date = ?1")?;
            let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

            let table = stmt
                .query_row(params![date.to_string()], |row| {
                    let mut table = RateTable::new(date);
                    for (i, name) in names.iter().enumerate() {
                        let Some(currency) = Currency::from_code(name) else {
                            continue;
                        };
                        if let Some(rate) = decimal_from_sql(row.get_ref(i)?) {
                            table.insert(currency, rate);
                        }
                    }
                    Ok(table)
                })
                .optional()?;
            Ok(table)
        })
    }

    fn put(&self, table: &RateTable) -> Result<()> {
        if table.is_empty() {
            return Ok(());
        }

        let lease = self.pool.acquire()?;
        lease.with(|conn| {
            let existing = existing_columns(conn)?;
            for (currency, _) in table.iter() {
                if !existing.contains(&currency.column()) {
                    conn.execute(
                        &format!("ALTER TABLE rates ADD COLUMN \"{}\" TEXT", currency.column()),
                        [],
                    )?;
                }
            }

            let columns: Vec<String> = table
                .iter()
                .map(|(c, _)| format!("\"{}\"", c.column()))
                .collect();
            let placeholders: Vec<String> = (0..columns.len()).map(|i| format!("?{}", i + 2)).collect();
            let sql = format!(
                "INSERT OR REPLACE INTO rates (date, {}) VALUES (?1, {})",
                columns.join(", "),
                placeholders.join(", ")
            );

            let mut values = vec![table.date().to_string()];
            values.extend(table.iter().map(|(_, rate)| rate.to_string()));
            conn.execute(&sql, params_from_iter(values.iter())).map(|_| ())
        })?;

        log::debug!("Cached {} rates for {}", table.len(), table.date());
        Ok(())
    }

    fn hold(&self) -> Result<StoreHold<'_>> {
        Ok(StoreHold::new(self.pool.acquire()?))
    }

    fn dates(&self) -> Result<Vec<NaiveDate>> {
        let lease = self.pool.acquire()?;
        let raw = lease.with(|conn| {
            let mut stmt = conn.prepare("SELECT date FROM rates ORDER BY date")?;
            let dates = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(dates)
        })?;

        Ok(raw
            .iter()
            .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .collect())
    }
}
