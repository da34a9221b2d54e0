//! Test support: an in-memory [`Store`] fake.
//!
//! [`MemoryStore`] keeps tables in a `HashMap` and implements just enough
//! behavior to exercise the orchestrator and the write semantics without a
//! running database: destructive replace, rollback-on-failure via
//! injection, idempotent namespace creation, and a tiny
//! `SELECT * FROM <table> [LIMIT n]` reader for the read-back tests.

use std::collections::HashMap;
use std::io;

use crate::error::EtlError;
use crate::frame::Frame;
use crate::store::{Row, Store, TableRef};

/// Contents of one fake table.
#[derive(Clone, Debug, Default)]
pub struct StoredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// In-memory store with failure injection.
pub struct MemoryStore {
    engine: String,
    namespaces: Vec<String>,
    tables: HashMap<String, StoredTable>,
    fail_writes_after: Option<usize>,
    fail_queries: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
            namespaces: Vec::new(),
            tables: HashMap::new(),
            fail_writes_after: None,
            fail_queries: false,
        }
    }

    /// Make `replace_table` fail once more than `rows` rows would land,
    /// simulating a store error partway through a bulk insert.
    #[must_use]
    pub fn fail_writes_after(mut self, rows: usize) -> Self {
        self.fail_writes_after = Some(rows);
        self
    }

    /// Make every `fetch_all` fail.
    #[must_use]
    pub fn fail_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Look up a table by its qualified key (`table` or `ns.table`).
    #[must_use]
    pub fn table(&self, key: &str) -> Option<&StoredTable> {
        self.tables.get(key)
    }

    /// Namespaces created so far, in creation order, without duplicates.
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn key(table: &TableRef) -> String {
        match &table.namespace {
            Some(ns) => format!("{ns}.{}", table.table),
            None => table.table.clone(),
        }
    }

    fn bad_query(&self, sql: &str, reason: &str) -> EtlError {
        EtlError::Query {
            engine: self.engine.clone(),
            message: format!("{reason}: '{sql}'"),
        }
    }
}

impl Store for MemoryStore {
    fn engine(&self) -> &str {
        &self.engine
    }

    fn ensure_namespace(&mut self, namespace: &str) -> Result<(), EtlError> {
        if !self.namespaces.iter().any(|ns| ns == namespace) {
            self.namespaces.push(namespace.to_string());
        }
        Ok(())
    }

    fn replace_table(&mut self, table: &TableRef, frame: &Frame) -> Result<usize, EtlError> {
        let key = Self::key(table);
        // Replace semantics: prior contents go away before any insert.
        self.tables.insert(
            key.clone(),
            StoredTable {
                columns: frame.columns().to_vec(),
                rows: Vec::new(),
            },
        );
        if let Some(limit) = self.fail_writes_after {
            if frame.len() > limit {
                // Like a rolled-back transaction: the table stays empty.
                return Err(EtlError::Write {
                    engine: self.engine.clone(),
                    source: Box::new(io::Error::other(format!(
                        "injected failure after {limit} rows"
                    ))),
                });
            }
        }
        let stored = self.tables.get_mut(&key).expect("just inserted");
        stored.rows = frame.rows().to_vec();
        Ok(frame.len())
    }

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, EtlError> {
        if self.fail_queries {
            return Err(EtlError::Query {
                engine: self.engine.clone(),
                message: "injected query failure".to_string(),
            });
        }
        // Just enough SQL for the read-back tests:
        //   SELECT * FROM <name> [LIMIT n]
        let tokens: Vec<&str> = sql.split_whitespace().collect();
        let from = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("from"))
            .and_then(|i| tokens.get(i + 1))
            .ok_or_else(|| self.bad_query(sql, "missing FROM clause"))?;
        let name = from.replace(['`', '"'], "");
        let limit = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("limit"))
            .and_then(|i| tokens.get(i + 1))
            .and_then(|n| n.parse::<usize>().ok());

        let table = self
            .tables
            .get(&name)
            .ok_or_else(|| self.bad_query(sql, "no such table"))?;
        let mut rows = table.rows.clone();
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}
