//! MySQL sink.
//!
//! MySQL auto-commits DDL, so the drop/create pair cannot live inside the
//! insert transaction. The guarantee here is therefore "absent, empty, or
//! fully loaded": DDL runs first, then every insert batch goes through one
//! transaction that rolls back as a unit on failure.

use log::{debug, info};
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder, Params, TxOpts, Value};

use crate::config::StoreConfig;
use crate::error::EtlError;
use crate::frame::Frame;
use crate::store::{
    self, create_table_sql, insert_sql, quote_mysql, Placeholders, Row, Store, TableRef,
    INSERT_CHUNK_ROWS,
};

const ENGINE: &str = "mysql";

/// Sink for the identified partition. Holds connection settings only;
/// each operation opens its own connection and drops it on return.
pub struct MySqlStore {
    opts: Opts,
}

impl MySqlStore {
    #[must_use]
    pub fn new(cfg: &StoreConfig) -> Self {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(cfg.host.clone()))
            .tcp_port(cfg.port)
            .user(Some(cfg.username.clone()))
            .pass(Some(cfg.password.clone()))
            .db_name(Some(cfg.database.clone()));
        Self {
            opts: Opts::from(opts),
        }
    }

    fn connect(&self) -> Result<Conn, mysql::Error> {
        Conn::new(self.opts.clone())
    }
}

impl Store for MySqlStore {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn ensure_namespace(&mut self, namespace: &str) -> Result<(), EtlError> {
        // CREATE SCHEMA is an alias for CREATE DATABASE here.
        let mut conn = self.connect().map_err(|e| store::write_error(ENGINE, e))?;
        conn.query_drop(format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_mysql(namespace)
        ))
        .map_err(|e| store::write_error(ENGINE, e))
    }

    fn replace_table(&mut self, table: &TableRef, frame: &Frame) -> Result<usize, EtlError> {
        let mut conn = self.connect().map_err(|e| store::write_error(ENGINE, e))?;
        let qualified = table.qualified(quote_mysql);

        conn.query_drop(format!("DROP TABLE IF EXISTS {qualified}"))
            .map_err(|e| store::write_error(ENGINE, e))?;
        conn.query_drop(create_table_sql(&qualified, frame.columns(), quote_mysql))
            .map_err(|e| store::write_error(ENGINE, e))?;

        // One transaction for all batches; an early return drops it
        // uncommitted and the driver rolls back, leaving the table empty.
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .map_err(|e| store::write_error(ENGINE, e))?;
        for chunk in frame.rows().chunks(INSERT_CHUNK_ROWS) {
            let sql = insert_sql(
                &qualified,
                frame.columns(),
                quote_mysql,
                chunk.len(),
                Placeholders::Question,
            );
            let values: Vec<Value> = chunk
                .iter()
                .flat_map(|row| row.iter())
                .map(|cell| Value::from(cell.as_deref()))
                .collect();
            tx.exec_drop(sql, Params::Positional(values))
                .map_err(|e| store::write_error(ENGINE, e))?;
            debug!("{ENGINE}: inserted batch of {} rows into {qualified}", chunk.len());
        }
        tx.commit().map_err(|e| store::write_error(ENGINE, e))?;
        info!("{ENGINE}: loaded {} rows into {qualified}", frame.len());
        Ok(frame.len())
    }

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, EtlError> {
        let mut conn = self.connect().map_err(|e| store::query_error(ENGINE, e))?;
        let rows: Vec<mysql::Row> = conn
            .query(sql)
            .map_err(|e| store::query_error(ENGINE, e))?;
        Ok(rows
            .into_iter()
            .map(|row| row.unwrap().into_iter().map(value_to_text).collect())
            .collect())
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        other => Some(other.as_sql(true)),
    }
}
