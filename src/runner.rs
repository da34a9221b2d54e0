//! Pipeline orchestration.
//!
//! The run is a linear state machine:
//!
//! ```text
//! Init → Loaded → Partitioned → Encrypted → WroteIdentified
//!      → WroteUnidentified → Queried → Done
//! ```
//!
//! Failures come in two classes. Source, partition, and encryption
//! failures are fatal — everything downstream depends on them, so
//! [`run_pipeline`] propagates the error. Write and query failures are
//! contained at their step boundary: they come back as values
//! ([`StepStatus::Failed`], [`QueryOutcome::Failed`]) inside the
//! [`RunReport`], and the orchestrator's explicit policy is to keep going.
//! There is no retry and no cross-step rollback.
//!
//! The report serializes to JSON so an operator gets a machine-readable
//! outcome in addition to the console lines.
//!
//! [`QueryOutcome::Failed`]: crate::query::QueryOutcome::Failed

use log::{error, info, warn};
use serde::Serialize;

use crate::config::{EtlConfig, KeySource, SinkSpec};
use crate::crypto::Cipher;
use crate::error::EtlError;
use crate::frame::Frame;
use crate::query::{self, QueryReport};
use crate::store::{Store, TableRef};
use crate::{partition, source};

/// States of the run, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    Init,
    Loaded,
    Partitioned,
    Encrypted,
    WroteIdentified,
    WroteUnidentified,
    Queried,
    Done,
}

/// How one step ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Succeeded,
    Failed(String),
}

/// Record of one executed transition.
#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub stage: Stage,
    pub status: StepStatus,
    /// Rows the step handled, where that is meaningful.
    pub rows: Option<usize>,
}

/// Which sink a sample query runs against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SinkTarget {
    Identified,
    Unidentified,
}

/// A read-back query to run after the load.
#[derive(Clone, Debug)]
pub struct SampleQuery {
    pub target: SinkTarget,
    pub sql: String,
}

impl SampleQuery {
    #[must_use]
    pub fn new(target: SinkTarget, sql: &str) -> Self {
        Self {
            target,
            sql: sql.to_string(),
        }
    }
}

/// Everything one run produced, step by step.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Furthest state reached.
    pub stage: Stage,
    /// Executed transitions in order.
    pub steps: Vec<StepOutcome>,
    pub source_rows: usize,
    pub identified_rows: usize,
    pub unidentified_rows: usize,
    /// One report per sample query, in execution order.
    pub queries: Vec<QueryReport>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            stage: Stage::Init,
            steps: Vec::new(),
            source_rows: 0,
            identified_rows: 0,
            unidentified_rows: 0,
            queries: Vec::new(),
        }
    }

    fn record(&mut self, stage: Stage, status: StepStatus, rows: Option<usize>) {
        self.stage = stage;
        self.steps.push(StepOutcome { stage, status, rows });
    }

    /// Whether every executed step succeeded. Query outcomes are
    /// best-effort and tracked separately in [`RunReport::queries`].
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Succeeded)
    }

    /// The report as a JSON value.
    ///
    /// # Errors
    /// Serialization errors from `serde_json`.
    pub fn to_json(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Write the report as pretty JSON to `path`.
    ///
    /// # Errors
    /// Serialization or file I/O failures.
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Print a per-step summary to stdout.
    pub fn print(&self) {
        println!("pipeline finished at stage {:?}", self.stage);
        println!(
            "rows: {} source = {} identified + {} unidentified",
            self.source_rows, self.identified_rows, self.unidentified_rows
        );
        for step in &self.steps {
            match &step.status {
                StepStatus::Succeeded => match step.rows {
                    Some(rows) => println!("  {:?}: ok ({rows} rows)", step.stage),
                    None => println!("  {:?}: ok", step.stage),
                },
                StepStatus::Failed(message) => println!("  {:?}: FAILED - {message}", step.stage),
            }
        }
    }
}

/// Run the whole pipeline: read, partition, encrypt, load both partitions,
/// then the sample queries.
///
/// `identified_store` receives the identified partition with its key
/// column encrypted; `unidentified_store` receives the unidentified
/// partition verbatim. Both writes use destructive-replace semantics.
///
/// # Errors
/// Only the fatal class propagates: `Io`/`Decode`/`Parse` from the source,
/// `MissingColumn` from partitioning or encryption, `Crypto` from key
/// material. Write and query failures are contained in the report.
pub fn run_pipeline(
    cfg: &EtlConfig,
    identified_store: &mut dyn Store,
    unidentified_store: &mut dyn Store,
    sample_queries: &[SampleQuery],
) -> Result<RunReport, EtlError> {
    let mut report = RunReport::new();

    info!("loading '{}'", cfg.source.path.display());
    let frame = source::read_frame(&cfg.source.path, cfg.source.delimiter, cfg.source.encoding)?;
    report.source_rows = frame.len();
    report.record(Stage::Loaded, StepStatus::Succeeded, Some(frame.len()));

    let (unidentified, identified) = partition::split_by_null(&frame, &cfg.source.key_column)?;
    info!(
        "partitioned {} rows into {} identified / {} unidentified",
        frame.len(),
        identified.len(),
        unidentified.len()
    );
    report.identified_rows = identified.len();
    report.unidentified_rows = unidentified.len();
    report.record(Stage::Partitioned, StepStatus::Succeeded, None);

    let cipher = Cipher::from_source(&cfg.key_source)?;
    if matches!(cfg.key_source, KeySource::Generate) {
        warn!(
            "encryption key generated for this run only; ciphertext written to '{}' \
             becomes unreadable when the process exits",
            cfg.identified_sink.table
        );
    }
    let encrypted = cipher.encrypt_column(&identified, &cfg.source.key_column)?;
    report.record(Stage::Encrypted, StepStatus::Succeeded, Some(encrypted.len()));

    let status = write_partition(identified_store, &cfg.identified_sink, &encrypted);
    report.record(Stage::WroteIdentified, status, Some(encrypted.len()));

    let status = write_partition(unidentified_store, &cfg.unidentified_sink, &unidentified);
    report.record(Stage::WroteUnidentified, status, Some(unidentified.len()));

    for sample in sample_queries {
        let store: &mut dyn Store = match sample.target {
            SinkTarget::Identified => &mut *identified_store,
            SinkTarget::Unidentified => &mut *unidentified_store,
        };
        report.queries.push(query::run_query(store, &sample.sql));
    }
    report.record(Stage::Queried, StepStatus::Succeeded, None);

    report.stage = Stage::Done;
    info!("pipeline done");
    Ok(report)
}

/// Ensure the sink's namespace, then replace its table. A failure in
/// either half is contained here: logged against the engine and returned
/// as a failed status for the report.
fn write_partition(store: &mut dyn Store, sink: &SinkSpec, frame: &Frame) -> StepStatus {
    if let Some(namespace) = &sink.namespace {
        if let Err(e) = store.ensure_namespace(namespace) {
            error!("error preparing namespace on {}: {e}", store.engine());
            return StepStatus::Failed(e.to_string());
        }
    }
    match store.replace_table(&TableRef::from(sink), frame) {
        Ok(rows) => {
            info!("data loaded successfully to {} ({rows} rows)", store.engine());
            StepStatus::Succeeded
        }
        Err(e) => {
            error!("error loading data to {}: {e}", store.engine());
            StepStatus::Failed(e.to_string())
        }
    }
}
