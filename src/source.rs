//! Delimited source ingestion.
//!
//! This module turns a delimited flat file into a [`Frame`]:
//! - **Byte decoding** per the configured [`TextEncoding`] (the invoice feed
//!   ships as Latin-1)
//! - **Header-driven parsing** with the `csv` reader; the header row names
//!   the frame's columns
//! - **Null mapping**: an empty field becomes `None`
//!
//! Errors are annotated with the record number for easier debugging. A row
//! whose field count disagrees with the header fails the read; this stage
//! has no side effects beyond reading the file.

use std::fs;
use std::path::Path;

use log::debug;

use crate::config::TextEncoding;
use crate::error::EtlError;
use crate::frame::Frame;

/// Read a delimited file into a [`Frame`].
///
/// The first row is treated as the header and names the columns. Every
/// other row becomes a frame row with empty fields mapped to `None`.
///
/// # Errors
/// * `Io` if the path cannot be read.
/// * `Decode` if the bytes are invalid for `encoding`.
/// * `Parse` if the file has no header row or a record's field count
///   disagrees with the header, carrying the record number.
pub fn read_frame(
    path: impl AsRef<Path>,
    delimiter: u8,
    encoding: TextEncoding,
) -> Result<Frame, EtlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| EtlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = decode(bytes, encoding, path)?;
    if text.trim().is_empty() {
        return Err(parse_error(path, 0, "missing header row"));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns = rdr
        .headers()
        .map_err(|e| parse_error(path, 0, &e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut frame = Frame::new(columns);

    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| parse_error(path, i as u64 + 1, &e.to_string()))?;
        frame.push_row(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }
    debug!(
        "read {} rows x {} columns from '{}'",
        frame.len(),
        frame.columns().len(),
        path.display()
    );
    Ok(frame)
}

fn decode(bytes: Vec<u8>, encoding: TextEncoding, path: &Path) -> Result<String, EtlError> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes).map_err(|_| EtlError::Decode {
            path: path.display().to_string(),
            encoding: encoding.name(),
        }),
        // Latin-1 bytes map one-to-one onto the first 256 code points.
        TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn parse_error(path: &Path, record: u64, message: &str) -> EtlError {
    EtlError::Parse {
        path: path.display().to_string(),
        record,
        message: message.to_string(),
    }
}
