use std::io::Write;
use std::path::Path;

use invoiceflow::testing::MemoryStore;
use invoiceflow::{
    run_pipeline, Cipher, EtlConfig, EtlError, KeySource, QueryOutcome, SampleQuery, SinkSpec,
    SinkTarget, SourceConfig, Stage, StepStatus, StoreConfig, TextEncoding,
};
use tempfile::NamedTempFile;

const CSV: &[u8] = b"CustomerID;InvoiceNo;Quantity\n\
17850;536365;6\n\
;536366;3\n\
13047;536367;8\n\
;536368;2\n\
12583;536369;24\n";

fn temp_csv(bytes: &[u8]) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    Ok(file)
}

fn dummy_store() -> StoreConfig {
    StoreConfig {
        username: "etl".into(),
        password: "etl".into(),
        host: "localhost".into(),
        port: 0,
        database: "etl".into(),
    }
}

fn config_for(path: &Path, key_source: KeySource) -> EtlConfig {
    EtlConfig {
        source: SourceConfig {
            path: path.to_path_buf(),
            delimiter: b';',
            encoding: TextEncoding::Latin1,
            key_column: "CustomerID".into(),
        },
        key_source,
        mysql: dummy_store(),
        postgres: dummy_store(),
        identified_sink: SinkSpec::table("invoices"),
        unidentified_sink: SinkSpec::namespaced("invoices", "invoices"),
    }
}

fn sample_queries() -> Vec<SampleQuery> {
    vec![
        SampleQuery::new(SinkTarget::Identified, "SELECT * FROM invoices LIMIT 2"),
        SampleQuery::new(
            SinkTarget::Unidentified,
            "SELECT * FROM invoices.invoices LIMIT 5",
        ),
    ]
}

#[test]
fn full_run_partitions_encrypts_and_loads() -> anyhow::Result<()> {
    let file = temp_csv(CSV)?;
    let key = Cipher::generate().key().to_string();
    let cfg = config_for(file.path(), KeySource::Provided(key.clone()));

    let mut identified = MemoryStore::new("mysql");
    let mut unidentified = MemoryStore::new("postgresql");
    let report = run_pipeline(&cfg, &mut identified, &mut unidentified, &sample_queries())?;

    assert!(report.succeeded());
    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.source_rows, 5);
    assert_eq!(report.identified_rows, 3);
    assert_eq!(report.unidentified_rows, 2);

    // Identified sink: key column holds decryptable tokens, not raw ids.
    let cipher = Cipher::from_key(&key)?;
    let stored = identified.table("invoices").expect("table exists");
    assert_eq!(stored.rows.len(), 3);
    let originals: Vec<String> = stored
        .rows
        .iter()
        .map(|row| {
            let token = row[0].as_deref().expect("identified rows have a key");
            assert_ne!(token, "17850");
            cipher.decrypt(token)
        })
        .collect::<Result<_, _>>()?;
    assert_eq!(originals, ["17850", "13047", "12583"]);

    // Unidentified sink: verbatim rows under the ensured namespace.
    assert_eq!(unidentified.namespaces(), ["invoices"]);
    let stored = unidentified
        .table("invoices.invoices")
        .expect("table exists");
    assert_eq!(stored.rows.len(), 2);
    assert!(stored.rows.iter().all(|row| row[0].is_none()));
    assert_eq!(stored.rows[0][1].as_deref(), Some("536366"));

    // Read-back queries materialized rows.
    assert_eq!(report.queries.len(), 2);
    match &report.queries[0].outcome {
        QueryOutcome::Rows(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected rows, got {other:?}"),
    }
    assert!(report.queries[1].succeeded());
    assert!(report.queries[0].elapsed() >= chrono::Duration::zero());
    Ok(())
}

#[test]
fn rerun_replaces_instead_of_accumulating() -> anyhow::Result<()> {
    let file = temp_csv(CSV)?;
    let cfg = config_for(file.path(), KeySource::Generate);

    let mut identified = MemoryStore::new("mysql");
    let mut unidentified = MemoryStore::new("postgresql");
    run_pipeline(&cfg, &mut identified, &mut unidentified, &[])?;
    run_pipeline(&cfg, &mut identified, &mut unidentified, &[])?;

    assert_eq!(identified.table("invoices").expect("table").rows.len(), 3);
    assert_eq!(
        unidentified
            .table("invoices.invoices")
            .expect("table")
            .rows
            .len(),
        2
    );
    Ok(())
}

#[test]
fn write_failure_is_contained_and_run_continues() -> anyhow::Result<()> {
    let file = temp_csv(CSV)?;
    let cfg = config_for(file.path(), KeySource::Generate);

    let mut identified = MemoryStore::new("mysql").fail_writes_after(0);
    let mut unidentified = MemoryStore::new("postgresql");
    let report = run_pipeline(&cfg, &mut identified, &mut unidentified, &sample_queries())?;

    assert_eq!(report.stage, Stage::Done);
    assert!(!report.succeeded());
    let failed = report
        .steps
        .iter()
        .find(|s| s.stage == Stage::WroteIdentified)
        .expect("step recorded");
    assert!(matches!(failed.status, StepStatus::Failed(_)));

    // Downstream still ran: the other partition landed, queries executed.
    let later = report
        .steps
        .iter()
        .find(|s| s.stage == Stage::WroteUnidentified)
        .expect("step recorded");
    assert_eq!(later.status, StepStatus::Succeeded);
    assert_eq!(
        unidentified
            .table("invoices.invoices")
            .expect("table")
            .rows
            .len(),
        2
    );
    assert_eq!(report.queries.len(), 2);
    Ok(())
}

#[test]
fn query_failure_is_reported_not_fatal() -> anyhow::Result<()> {
    let file = temp_csv(CSV)?;
    let cfg = config_for(file.path(), KeySource::Generate);

    let mut identified = MemoryStore::new("mysql");
    let mut unidentified = MemoryStore::new("postgresql").fail_queries();
    let report = run_pipeline(&cfg, &mut identified, &mut unidentified, &sample_queries())?;

    assert_eq!(report.stage, Stage::Done);
    assert!(report.queries[0].succeeded());
    match &report.queries[1].outcome {
        QueryOutcome::Failed(message) => assert!(message.contains("injected")),
        other => panic!("expected failure, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_key_column_aborts_the_run() -> anyhow::Result<()> {
    let file = temp_csv(b"InvoiceNo;Quantity\n536365;6\n")?;
    let cfg = config_for(file.path(), KeySource::Generate);

    let mut identified = MemoryStore::new("mysql");
    let mut unidentified = MemoryStore::new("postgresql");
    let err = run_pipeline(&cfg, &mut identified, &mut unidentified, &[]).unwrap_err();
    assert!(matches!(err, EtlError::MissingColumn(_)), "got {err:?}");
    assert!(!err.is_contained());
    Ok(())
}

#[test]
fn report_serializes_to_json() -> anyhow::Result<()> {
    let file = temp_csv(CSV)?;
    let cfg = config_for(file.path(), KeySource::Generate);

    let mut identified = MemoryStore::new("mysql");
    let mut unidentified = MemoryStore::new("postgresql");
    let report = run_pipeline(&cfg, &mut identified, &mut unidentified, &sample_queries())?;

    let json = report.to_json()?;
    assert_eq!(json["source_rows"], 5);
    assert_eq!(json["stage"], "Done");

    let out = NamedTempFile::new()?;
    report.save_to_file(out.path())?;
    let text = std::fs::read_to_string(out.path())?;
    assert!(text.contains("\"identified_rows\": 3"));
    Ok(())
}
