//! Binary entry: build the configuration from the environment, run the
//! pipeline against the real stores, and render the report.
//!
//! Exits nonzero only on the fatal class (unreadable source, bad key,
//! missing column); contained write/query failures are visible in the
//! console output and the step summary instead.

use anyhow::{Context, Result};
use invoiceflow::query::{format_row, QueryOutcome};
use invoiceflow::{
    run_pipeline, EtlConfig, MySqlStore, PostgresStore, SampleQuery, SinkTarget,
};

fn main() -> Result<()> {
    env_logger::init();
    let cfg = EtlConfig::from_env().context("loading configuration")?;

    let mut mysql = MySqlStore::new(&cfg.mysql);
    let mut postgres = PostgresStore::new(&cfg.postgres);
    let samples = [
        SampleQuery::new(SinkTarget::Identified, "SELECT * FROM invoices LIMIT 5"),
        SampleQuery::new(
            SinkTarget::Unidentified,
            "SELECT * FROM invoices.invoices LIMIT 5",
        ),
    ];

    let report = run_pipeline(&cfg, &mut mysql, &mut postgres, &samples)?;

    for query in &report.queries {
        println!("These are the results for {}", query.engine);
        match &query.outcome {
            QueryOutcome::Rows(rows) => {
                for row in rows {
                    println!("{}", format_row(row));
                }
            }
            QueryOutcome::Failed(message) => println!("query failed: {message}"),
        }
        println!("Start Time: {}", query.started);
        println!("Finish Time: {}", query.finished);
        println!("Time Difference: {}", query.elapsed());
    }
    report.print();
    Ok(())
}
