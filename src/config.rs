//! Immutable run configuration.
//!
//! An [`EtlConfig`] is constructed once at startup and passed by reference
//! into the pipeline; no other component reads ambient process state. The
//! binary builds it from environment variables via [`EtlConfig::from_env`],
//! tests construct it directly.

use std::env;
use std::path::PathBuf;

use crate::error::EtlError;

/// Default source location when `CSV_PATH` is not set.
pub const DEFAULT_CSV_PATH: &str = "data/ecommerce.csv";

/// Everything one run needs, fixed at startup.
#[derive(Clone, Debug)]
pub struct EtlConfig {
    /// Source file settings.
    pub source: SourceConfig,
    /// Where the encryption key comes from.
    pub key_source: KeySource,
    /// Credentials for the identified-partition target.
    pub mysql: StoreConfig,
    /// Credentials for the unidentified-partition target.
    pub postgres: StoreConfig,
    /// Table receiving the identified partition (key column encrypted).
    pub identified_sink: SinkSpec,
    /// Table receiving the unidentified partition verbatim.
    pub unidentified_sink: SinkSpec,
}

/// Source file settings: location, dialect, and the partition key.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Path of the delimited input file.
    pub path: PathBuf,
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Text encoding of the file bytes.
    pub encoding: TextEncoding,
    /// Nullable column the partitioner splits on.
    pub key_column: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CSV_PATH),
            delimiter: b';',
            encoding: TextEncoding::Latin1,
            key_column: "CustomerID".to_string(),
        }
    }
}

/// Supported source text encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict UTF-8; invalid bytes fail the read.
    Utf8,
    /// ISO-8859-1; every byte maps to a code point, cannot fail.
    Latin1,
}

impl TextEncoding {
    /// Name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

/// Connection settings for one relational target.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Target relation, optionally namespace-qualified.
#[derive(Clone, Debug)]
pub struct SinkSpec {
    /// Schema to place the table in; `None` means the store default.
    pub namespace: Option<String>,
    /// Table name.
    pub table: String,
}

impl SinkSpec {
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            namespace: None,
            table: table.to_string(),
        }
    }

    #[must_use]
    pub fn namespaced(namespace: &str, table: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            table: table.to_string(),
        }
    }
}

/// Where the run's encryption key comes from.
///
/// `Generate` matches the original behavior: a fresh key each run, so
/// ciphertext written by this run is unreadable once the process exits.
/// `Provided` takes an operator-supplied base64 key and keeps the data
/// decryptable across runs.
#[derive(Clone, Debug)]
pub enum KeySource {
    Generate,
    Provided(String),
}

impl EtlConfig {
    /// Build the configuration from the process environment.
    ///
    /// Required: `{MYSQL,POSTGRES}_{USERNAME,PASSWORD,HOST,DATABASE}`.
    /// Optional: `MYSQL_PORT` (3306), `POSTGRES_PORT` (5432), `CSV_PATH`,
    /// and `ENCRYPTION_KEY` (base64; absent means generate-per-run).
    ///
    /// # Errors
    /// `Configuration` naming the variable that is missing or malformed.
    pub fn from_env() -> Result<Self, EtlError> {
        let mut source = SourceConfig::default();
        if let Ok(path) = env::var("CSV_PATH") {
            source.path = PathBuf::from(path);
        }
        let key_source = match env::var("ENCRYPTION_KEY") {
            Ok(key) => KeySource::Provided(key),
            Err(_) => KeySource::Generate,
        };
        Ok(Self {
            source,
            key_source,
            mysql: store_from_env("MYSQL", 3306)?,
            postgres: store_from_env("POSTGRES", 5432)?,
            identified_sink: SinkSpec::table("invoices"),
            unidentified_sink: SinkSpec::namespaced("invoices", "invoices"),
        })
    }
}

fn store_from_env(prefix: &str, default_port: u16) -> Result<StoreConfig, EtlError> {
    let port = match env::var(format!("{prefix}_PORT")) {
        Ok(raw) => raw.parse().map_err(|_| {
            EtlError::Configuration(format!("{prefix}_PORT is not a valid port: '{raw}'"))
        })?,
        Err(_) => default_port,
    };
    Ok(StoreConfig {
        username: required(prefix, "USERNAME")?,
        password: required(prefix, "PASSWORD")?,
        host: required(prefix, "HOST")?,
        port,
        database: required(prefix, "DATABASE")?,
    })
}

fn required(prefix: &str, name: &str) -> Result<String, EtlError> {
    env::var(format!("{prefix}_{name}"))
        .map_err(|_| EtlError::Configuration(format!("{prefix}_{name} is not set")))
}
