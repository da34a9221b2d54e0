//! PostgreSQL sink.
//!
//! PostgreSQL DDL is transactional, so the whole replace — drop, create,
//! every insert batch — runs as one transaction: the table is either fully
//! loaded or exactly as it was.

use log::{debug, info};
use postgres::types::ToSql;
use postgres::{Client, NoTls};

use crate::config::StoreConfig;
use crate::error::EtlError;
use crate::frame::Frame;
use crate::store::{
    self, create_table_sql, insert_sql, quote_postgres, Placeholders, Row, Store, TableRef,
    INSERT_CHUNK_ROWS,
};

const ENGINE: &str = "postgresql";

/// Sink for the unidentified partition. Holds connection settings only;
/// each operation opens its own connection and drops it on return.
pub struct PostgresStore {
    config: postgres::Config,
}

impl PostgresStore {
    #[must_use]
    pub fn new(cfg: &StoreConfig) -> Self {
        let mut config = postgres::Config::new();
        config
            .user(&cfg.username)
            .password(&cfg.password)
            .host(&cfg.host)
            .port(cfg.port)
            .dbname(&cfg.database);
        Self { config }
    }

    fn connect(&self) -> Result<Client, postgres::Error> {
        self.config.connect(NoTls)
    }
}

impl Store for PostgresStore {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn ensure_namespace(&mut self, namespace: &str) -> Result<(), EtlError> {
        let mut client = self.connect().map_err(|e| store::write_error(ENGINE, e))?;
        client
            .batch_execute(&format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_postgres(namespace)
            ))
            .map_err(|e| store::write_error(ENGINE, e))
    }

    fn replace_table(&mut self, table: &TableRef, frame: &Frame) -> Result<usize, EtlError> {
        let mut client = self.connect().map_err(|e| store::write_error(ENGINE, e))?;
        let qualified = table.qualified(quote_postgres);

        // An early return drops the transaction uncommitted and the driver
        // rolls back, restoring the previous table contents.
        let mut tx = client
            .transaction()
            .map_err(|e| store::write_error(ENGINE, e))?;
        tx.batch_execute(&format!("DROP TABLE IF EXISTS {qualified}"))
            .map_err(|e| store::write_error(ENGINE, e))?;
        tx.batch_execute(&create_table_sql(&qualified, frame.columns(), quote_postgres))
            .map_err(|e| store::write_error(ENGINE, e))?;

        for chunk in frame.rows().chunks(INSERT_CHUNK_ROWS) {
            let sql = insert_sql(
                &qualified,
                frame.columns(),
                quote_postgres,
                chunk.len(),
                Placeholders::Numbered,
            );
            let params: Vec<&(dyn ToSql + Sync)> = chunk
                .iter()
                .flat_map(|row| row.iter())
                .map(|cell| cell as &(dyn ToSql + Sync))
                .collect();
            tx.execute(sql.as_str(), &params)
                .map_err(|e| store::write_error(ENGINE, e))?;
            debug!("{ENGINE}: inserted batch of {} rows into {qualified}", chunk.len());
        }
        tx.commit().map_err(|e| store::write_error(ENGINE, e))?;
        info!("{ENGINE}: loaded {} rows into {qualified}", frame.len());
        Ok(frame.len())
    }

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, EtlError> {
        let mut client = self.connect().map_err(|e| store::query_error(ENGINE, e))?;
        let rows = client
            .query(sql, &[])
            .map_err(|e| store::query_error(ENGINE, e))?;
        Ok(rows
            .iter()
            .map(|row| (0..row.len()).map(|i| cell_text(row, i)).collect())
            .collect())
    }
}

/// Tables written by this pipeline are all text; the numeric and boolean
/// casts cover columns computed by ad hoc read-back queries.
fn cell_text(row: &postgres::Row, idx: usize) -> Option<String> {
    if let Ok(v) = row.try_get::<_, Option<String>>(idx) {
        return v;
    }
    if let Ok(v) = row.try_get::<_, Option<i64>>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<_, Option<f64>>(idx) {
        return v.map(|n| n.to_string());
    }
    row.try_get::<_, Option<bool>>(idx)
        .ok()
        .flatten()
        .map(|b| b.to_string())
}
