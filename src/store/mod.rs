//! Relational sinks behind a trait seam.
//!
//! [`Store`] is the synchronous interface the orchestrator writes and reads
//! through. Real backends live in [`mysql`] and [`postgres`] (each behind
//! its own feature flag); tests use the in-memory fake in
//! [`crate::testing`].
//!
//! # Write semantics
//!
//! `replace_table` is destructive-replace: pre-existing contents are
//! dropped before the insert, so running the pipeline twice leaves the
//! second run's rows, not the sum. Inserts go out as multi-row statements
//! of [`INSERT_CHUNK_ROWS`] rows inside a single transaction; a mid-batch
//! failure rolls back, leaving the table absent or empty — never
//! half-written. Connections are scoped to the call and released on every
//! exit path.

#[cfg(feature = "sink-mysql")]
pub mod mysql;
#[cfg(feature = "sink-postgres")]
pub mod postgres;

use crate::error::EtlError;
use crate::frame::Frame;

/// One materialized result row.
pub type Row = Vec<Option<String>>;

/// Rows per multi-row INSERT statement.
pub const INSERT_CHUNK_ROWS: usize = 500;

/// Synchronous interface to one relational target.
pub trait Store {
    /// Engine name used in logs and reports (e.g. `"mysql"`).
    fn engine(&self) -> &str;

    /// Idempotently ensure a namespace exists. Safe to call every run;
    /// an already-existing namespace is not an error.
    fn ensure_namespace(&mut self, namespace: &str) -> Result<(), EtlError>;

    /// Persist `frame` as the full contents of `table`, dropping whatever
    /// was there before. Returns the number of rows written.
    fn replace_table(&mut self, table: &TableRef, frame: &Frame) -> Result<usize, EtlError>;

    /// Execute a read query and materialize every result row as text.
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, EtlError>;
}

/// A table name, optionally qualified by a namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    pub namespace: Option<String>,
    pub table: String,
}

impl TableRef {
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            namespace: None,
            table: table.to_string(),
        }
    }

    #[must_use]
    pub fn in_namespace(namespace: &str, table: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            table: table.to_string(),
        }
    }

    /// Render as a (possibly qualified) identifier using `quote`.
    #[must_use]
    pub fn qualified(&self, quote: fn(&str) -> String) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", quote(ns), quote(&self.table)),
            None => quote(&self.table),
        }
    }
}

impl From<&crate::config::SinkSpec> for TableRef {
    fn from(spec: &crate::config::SinkSpec) -> Self {
        Self {
            namespace: spec.namespace.clone(),
            table: spec.table.clone(),
        }
    }
}

/// Placeholder dialect for parameterized inserts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholders {
    /// `?` per value (MySQL).
    Question,
    /// `$1..$n` numbered across the statement (PostgreSQL).
    Numbered,
}

/// Quote an identifier with backticks, doubling embedded backticks.
#[must_use]
pub fn quote_mysql(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote an identifier with double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_postgres(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `CREATE TABLE` statement with every column as `TEXT`.
#[must_use]
pub fn create_table_sql(qualified: &str, columns: &[String], quote: fn(&str) -> String) -> String {
    let cols = columns
        .iter()
        .map(|c| format!("{} TEXT", quote(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {qualified} ({cols})")
}

/// Multi-row `INSERT` statement for `rows` rows of `columns.len()` values.
#[must_use]
pub fn insert_sql(
    qualified: &str,
    columns: &[String],
    quote: fn(&str) -> String,
    rows: usize,
    style: Placeholders,
) -> String {
    let cols = columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let width = columns.len();
    let groups = (0..rows)
        .map(|r| {
            let values = (0..width)
                .map(|c| match style {
                    Placeholders::Question => "?".to_string(),
                    Placeholders::Numbered => format!("${}", r * width + c + 1),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({values})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {qualified} ({cols}) VALUES {groups}")
}

/// Wrap a driver error as a contained write failure.
pub(crate) fn write_error(
    engine: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> EtlError {
    EtlError::Write {
        engine: engine.to_string(),
        source: Box::new(source),
    }
}

/// Wrap a driver error as a contained query failure.
pub(crate) fn query_error(
    engine: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> EtlError {
    EtlError::Query {
        engine: engine.to_string(),
        message: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names() {
        let plain = TableRef::new("invoices");
        assert_eq!(plain.qualified(quote_mysql), "`invoices`");
        let scoped = TableRef::in_namespace("invoices", "invoices");
        assert_eq!(scoped.qualified(quote_postgres), "\"invoices\".\"invoices\"");
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_mysql("we`ird"), "`we``ird`");
        assert_eq!(quote_postgres("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn create_table_all_text() {
        let cols = vec!["InvoiceNo".to_string(), "CustomerID".to_string()];
        assert_eq!(
            create_table_sql("`invoices`", &cols, quote_mysql),
            "CREATE TABLE `invoices` (`InvoiceNo` TEXT, `CustomerID` TEXT)"
        );
    }

    #[test]
    fn insert_placeholders_per_dialect() {
        let cols = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            insert_sql("`t`", &cols, quote_mysql, 2, Placeholders::Question),
            "INSERT INTO `t` (`a`, `b`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(
            insert_sql("\"t\"", &cols, quote_postgres, 2, Placeholders::Numbered),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2), ($3, $4)"
        );
    }
}
