//! Best-effort read-back queries with timing.
//!
//! [`run_query`] never propagates a store error: the outcome — rows or a
//! failure message — comes back as a value inside a [`QueryReport`], and
//! the caller decides whether to keep going. The report also carries
//! wall-clock start and finish times, the way an operator watching the
//! console expects them.

use chrono::{DateTime, Duration, Local};
use log::{info, warn};
use serde::Serialize;

use crate::store::{Row, Store};

/// What a query produced: all rows, or the failure that contained it.
#[derive(Clone, Debug, Serialize)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Failed(String),
}

/// Timed record of one read-back query against one store.
#[derive(Clone, Debug, Serialize)]
pub struct QueryReport {
    pub engine: String,
    pub sql: String,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub outcome: QueryOutcome,
}

impl QueryReport {
    /// Wall-clock duration of the query.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished - self.started
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Rows(_))
    }
}

/// Execute `sql` against `store`, materialize every row, and report.
///
/// Execution errors are contained: they surface as
/// [`QueryOutcome::Failed`] with the engine name in the log line, and the
/// run continues.
pub fn run_query(store: &mut dyn Store, sql: &str) -> QueryReport {
    let started = Local::now();
    let outcome = match store.fetch_all(sql) {
        Ok(rows) => {
            info!(
                "query executed successfully on {} ({} rows)",
                store.engine(),
                rows.len()
            );
            QueryOutcome::Rows(rows)
        }
        Err(e) => {
            warn!("error executing query on {}: {e}", store.engine());
            QueryOutcome::Failed(e.to_string())
        }
    };
    QueryReport {
        engine: store.engine().to_string(),
        sql: sql.to_string(),
        started,
        finished: Local::now(),
        outcome,
    }
}

/// Render a result row the way the console prints it: `(a, b, NULL)`.
#[must_use]
pub fn format_row(row: &Row) -> String {
    let cells = row
        .iter()
        .map(|cell| cell.as_deref().unwrap_or("NULL").to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({cells})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_render_as_tuples() {
        let row: Row = vec![Some("536365".into()), None, Some("2.55".into())];
        assert_eq!(format_row(&row), "(536365, NULL, 2.55)");
    }
}
