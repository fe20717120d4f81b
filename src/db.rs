//! Database primitives: raw query execution and cursor acquisition.
//!
//! The crate has no database driver of its own; the application registers
//! its backend as the original provider
//! ([`set_sql_backend`](crate::registry::set_sql_backend)). The bundled
//! [`MemoryBackend`] is an observable in-memory implementation for demos
//! and tests.

use std::sync::{Arc, Mutex, PoisonError};

use crate::callsite::CallSite;
use crate::error::{Blocked, Error};
use crate::intercept::{decide, Decision};
use crate::policy::Signature;

/// One result row, as a list of column values.
pub type Row = Vec<String>;

/// Provider of raw-SQL capabilities.
pub trait SqlBackend: Send + Sync {
    /// Executes a raw query. `None` means the query produced no results,
    /// matching the ORM primitive's documented behavior.
    fn raw_query(&self, site: &CallSite, sql: &str) -> Result<Option<Vec<Row>>, Error>;

    /// Acquires a cursor for statement-at-a-time execution.
    fn cursor(&self, site: &CallSite) -> Result<Cursor, Error>;
}

type Executor = Arc<dyn Fn(&str) -> Vec<Row> + Send + Sync>;

/// A database cursor supporting both direct method calls and scoped use.
///
/// A live cursor executes statements against its backend; a detached one
/// (the neutralized substitute) accepts the same protocol but every fetch
/// returns empty results.
///
/// # Examples
///
/// ```
/// use callguard::Cursor;
///
/// // Direct use.
/// let mut cursor = Cursor::detached();
/// cursor.execute("SELECT * FROM users");
/// assert!(cursor.fetch_one().is_none());
///
/// // Scoped use.
/// let rows = Cursor::detached().scope(|c| {
///     c.execute("SELECT * FROM users");
///     c.fetch_all()
/// });
/// assert!(rows.is_empty());
/// ```
pub struct Cursor {
    executor: Option<Executor>,
    rows: Vec<Row>,
    next: usize,
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("live", &self.executor.is_some())
            .field("pending_rows", &(self.rows.len() - self.next.min(self.rows.len())))
            .finish()
    }
}

impl Cursor {
    /// Creates a cursor bound to a backend executor.
    pub fn live(executor: Executor) -> Self {
        Self {
            executor: Some(executor),
            rows: Vec::new(),
            next: 0,
        }
    }

    /// Creates the detached stand-in: protocol-compatible, but every
    /// statement is a no-op and every fetch comes back empty.
    pub fn detached() -> Self {
        Self {
            executor: None,
            rows: Vec::new(),
            next: 0,
        }
    }

    /// Executes a statement, replacing the pending result set.
    pub fn execute(&mut self, sql: &str) {
        self.next = 0;
        self.rows = match &self.executor {
            Some(run) => run(sql),
            None => Vec::new(),
        };
    }

    /// Fetches the next pending row, if any.
    pub fn fetch_one(&mut self) -> Option<Row> {
        let row = self.rows.get(self.next).cloned();
        if row.is_some() {
            self.next += 1;
        }
        row
    }

    /// Fetches all remaining pending rows.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        let rest = self.rows.split_off(self.next.min(self.rows.len()));
        self.rows.clear();
        self.next = 0;
        rest
    }

    /// Runs a closure with the cursor and releases it afterwards, the
    /// scoped-acquisition form of the protocol.
    pub fn scope<R>(mut self, f: impl FnOnce(&mut Cursor) -> R) -> R {
        f(&mut self)
    }
}

/// Backend used when the application never registered one: every query has
/// no results.
#[derive(Debug, Default)]
pub struct NullBackend;

impl SqlBackend for NullBackend {
    fn raw_query(&self, _site: &CallSite, _sql: &str) -> Result<Option<Vec<Row>>, Error> {
        Ok(None)
    }

    fn cursor(&self, _site: &CallSite) -> Result<Cursor, Error> {
        Ok(Cursor::detached())
    }
}

/// Observable in-memory SQL backend for demos and tests.
///
/// Holds the rows of a single table. Queries are interpreted naively: any
/// `SELECT` returns a snapshot of all rows, anything else returns nothing.
/// That is deliberately minimal: the point is observing whether a query
/// reached the backend at all, not SQL fidelity.
///
/// # Examples
///
/// ```
/// use callguard::{CallSite, MemoryBackend, SqlBackend};
///
/// let backend = MemoryBackend::with_rows(vec![
///     vec!["1".into(), "alice".into()],
/// ]);
/// let rows = backend
///     .raw_query(&CallSite::unknown(), "SELECT * FROM users")
///     .unwrap()
///     .unwrap();
/// assert_eq!(rows[0][1], "alice");
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Arc<Mutex<Vec<Row>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Appends a row to the table.
    pub fn insert(&self, row: Row) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    fn select(rows: &Arc<Mutex<Vec<Row>>>, sql: &str) -> Vec<Row> {
        if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            rows.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        } else {
            Vec::new()
        }
    }
}

impl SqlBackend for MemoryBackend {
    fn raw_query(&self, _site: &CallSite, sql: &str) -> Result<Option<Vec<Row>>, Error> {
        let rows = Self::select(&self.rows, sql);
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows))
        }
    }

    fn cursor(&self, _site: &CallSite) -> Result<Cursor, Error> {
        let rows = Arc::clone(&self.rows);
        Ok(Cursor::live(Arc::new(move |sql| {
            MemoryBackend::select(&rows, sql)
        })))
    }
}

/// Decision-aware wrapper installed over the original SQL provider.
pub(crate) struct GuardedSql {
    original: Arc<dyn SqlBackend>,
}

impl GuardedSql {
    pub(crate) fn new(original: Arc<dyn SqlBackend>) -> Self {
        Self { original }
    }
}

impl SqlBackend for GuardedSql {
    fn raw_query(&self, site: &CallSite, sql: &str) -> Result<Option<Vec<Row>>, Error> {
        match decide(Signature::DbRaw, site) {
            Decision::Defer => self.original.raw_query(site, sql),
            Decision::Block => Err(Blocked::new(Signature::DbRaw, site).into()),
            // "No results found", per the real primitive's contract.
            Decision::Neutralize => Ok(None),
        }
    }

    fn cursor(&self, site: &CallSite) -> Result<Cursor, Error> {
        match decide(Signature::DbCursor, site) {
            Decision::Defer => self.original.cursor(site),
            Decision::Block => Err(Blocked::new(Signature::DbCursor, site).into()),
            Decision::Neutralize => Ok(Cursor::detached()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryBackend {
        MemoryBackend::with_rows(vec![
            vec!["1".to_string(), "test_instance_1".to_string()],
            vec!["2".to_string(), "test_instance_2".to_string()],
        ])
    }

    #[test]
    fn raw_query_returns_rows_for_select() {
        let backend = seeded();
        let rows = backend
            .raw_query(&CallSite::unknown(), "SELECT * FROM app_testmodel")
            .unwrap()
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "test_instance_1");
    }

    #[test]
    fn raw_query_returns_none_when_empty() {
        let backend = MemoryBackend::new();
        let result = backend
            .raw_query(&CallSite::unknown(), "SELECT * FROM app_testmodel")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn live_cursor_supports_direct_calls() {
        let backend = seeded();
        let mut cursor = backend.cursor(&CallSite::unknown()).unwrap();
        cursor.execute("SELECT * FROM app_testmodel");
        assert_eq!(cursor.fetch_one().expect("first row")[0], "1");
        assert_eq!(cursor.fetch_all().len(), 1);
        assert!(cursor.fetch_one().is_none());
    }

    #[test]
    fn live_cursor_supports_scoped_use() {
        let backend = seeded();
        let rows = backend
            .cursor(&CallSite::unknown())
            .unwrap()
            .scope(|c| {
                c.execute("SELECT * FROM app_testmodel");
                c.fetch_all()
            });
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn detached_cursor_fetches_nothing() {
        let mut cursor = Cursor::detached();
        cursor.execute("SELECT * FROM app_testmodel");
        assert!(cursor.fetch_one().is_none());
        assert!(cursor.fetch_all().is_empty());
    }

    #[test]
    fn non_select_statements_produce_no_rows() {
        let backend = seeded();
        let mut cursor = backend.cursor(&CallSite::unknown()).unwrap();
        cursor.execute("DROP TABLE app_testmodel");
        assert!(cursor.fetch_all().is_empty());
        // The naive interpreter ignores non-SELECT, so the table survives.
        assert!(backend
            .raw_query(&CallSite::unknown(), "SELECT 1")
            .unwrap()
            .is_some());
    }

    #[test]
    fn null_backend_has_no_results() {
        let backend = NullBackend;
        assert!(backend
            .raw_query(&CallSite::unknown(), "SELECT 1")
            .unwrap()
            .is_none());
        let mut cursor = backend.cursor(&CallSite::unknown()).unwrap();
        cursor.execute("SELECT 1");
        assert!(cursor.fetch_all().is_empty());
    }
}
