//! # Invoiceflow
//!
//! A small **extract-transform-load pipeline** for e-commerce invoice
//! records: read a semicolon-delimited CSV, split rows by whether a
//! customer identifier is present, encrypt the identifier for the
//! identified branch, and load the two partitions into two relational
//! engines — MySQL for the identified rows, PostgreSQL (under its own
//! schema) for the unidentified ones. Afterwards a couple of read-back
//! queries run with timing around them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use invoiceflow::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = EtlConfig::from_env()?;
//! let mut mysql = MySqlStore::new(&cfg.mysql);
//! let mut postgres = PostgresStore::new(&cfg.postgres);
//!
//! let report = run_pipeline(&cfg, &mut mysql, &mut postgres, &[
//!     SampleQuery::new(SinkTarget::Identified, "SELECT * FROM invoices LIMIT 5"),
//! ])?;
//! report.print();
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Frame
//!
//! A [`Frame`] is the in-memory tabular structure every stage hands to the
//! next: an ordered header plus rows of nullable text cells. The source
//! file decides the columns; an empty field is a null.
//!
//! ### Partitions
//!
//! [`split_by_null`] divides a frame into the **unidentified** rows (key
//! column null) and the **identified** rows (key present). The split is
//! exhaustive and disjoint, and both halves preserve source order.
//!
//! ### Encryption
//!
//! A [`Cipher`] wraps a Fernet key and rewrites the identifier column of
//! the identified partition into tokens. The key either lives for one run
//! (`KeySource::Generate`, the default — ciphertext dies with the process)
//! or comes from the operator (`KeySource::Provided`).
//!
//! ### Stores
//!
//! Sinks implement the [`Store`] trait: idempotent namespace creation,
//! destructive-replace table loads with batched transactional inserts, and
//! full-materialization reads. Real backends are gated behind the
//! `sink-mysql` and `sink-postgres` features; [`testing::MemoryStore`]
//! backs the tests.
//!
//! ### Orchestration
//!
//! [`run_pipeline`] walks the linear state machine and returns a
//! [`RunReport`]. Source, partition, and key failures abort; write and
//! query failures are contained as typed outcomes in the report and the
//! run continues — the continue-on-failure policy is an explicit decision,
//! not a side effect of error handling.
//!
//! ## Feature Flags
//!
//! - `sink-mysql` - Enable the MySQL sink (default)
//! - `sink-postgres` - Enable the PostgreSQL sink (default)
//!
//! ## Module Overview
//!
//! - [`config`] - Immutable run configuration
//! - [`source`] - Delimited file ingestion
//! - [`partition`] - Nullability split
//! - [`crypto`] - Identifier encryption
//! - [`store`] - Sink trait and SQL backends
//! - [`query`] - Timed best-effort read-back queries
//! - [`runner`] - Orchestration and the run report
//! - [`testing`] - In-memory store fake for tests

pub mod config;
pub mod crypto;
pub mod error;
pub mod frame;
pub mod partition;
pub mod query;
pub mod runner;
pub mod source;
pub mod store;
pub mod testing;

// General re-exports
pub use config::{EtlConfig, KeySource, SinkSpec, SourceConfig, StoreConfig, TextEncoding};
pub use crypto::Cipher;
pub use error::EtlError;
pub use frame::Frame;
pub use partition::split_by_null;
pub use query::{run_query, QueryOutcome, QueryReport};
pub use runner::{
    run_pipeline, RunReport, SampleQuery, SinkTarget, Stage, StepOutcome, StepStatus,
};
pub use source::read_frame;
pub use store::{Row, Store, TableRef};

// Gated re-exports
#[cfg(feature = "sink-mysql")]
pub use store::mysql::MySqlStore;

#[cfg(feature = "sink-postgres")]
pub use store::postgres::PostgresStore;
