//! Splitting a frame on the nullability of one column.

use crate::error::EtlError;
use crate::frame::Frame;

/// Split `frame` into `(unidentified, identified)` partitions on whether
/// `key_column` is null.
///
/// Every source row lands in exactly one partition, order within each
/// partition preserves source order, and both partitions share the source
/// header. Pure: the input frame is untouched.
///
/// # Errors
/// `MissingColumn` if `key_column` is not in the header.
pub fn split_by_null(frame: &Frame, key_column: &str) -> Result<(Frame, Frame), EtlError> {
    let key = frame
        .column_index(key_column)
        .ok_or_else(|| EtlError::MissingColumn(key_column.to_string()))?;

    let mut unidentified = Frame::new(frame.columns().to_vec());
    let mut identified = Frame::new(frame.columns().to_vec());
    for row in frame.rows() {
        if row[key].is_none() {
            unidentified.push_row(row.clone());
        } else {
            identified.push_row(row.clone());
        }
    }
    Ok((unidentified, identified))
}
