//! Record boundary scanning.
//!
//! Every record starts with a `<type>.001:<length>` field. For all record
//! types except 1 the length is the record's own byte count, including its
//! trailing `FS`. The type-1 header declares the length of the whole
//! transaction instead, so its end is found by searching for the first `FS`.

use std::ops::Range;

use tracing::{debug, warn};

use crate::error::{Diagnostic, RecordError, Result};
use crate::separator::{FS, GS, TAG_DELIMITER};

/// Leading tag of the type-1 header record.
pub const HEADER_LENGTH_TAG: &[u8] = b"1.001";

/// Where the record starting at the front of a buffer ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The record spans this many bytes.
    Complete(usize),
    /// The declared length runs past the end of input; only reported at EOF.
    Truncated { declared: usize, available: usize },
    /// More input is needed to decide; never reported at EOF.
    Incomplete,
}

/// Why a boundary could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BoundaryFault {
    MissingTerminator,
    Malformed(String),
}

impl BoundaryFault {
    pub(crate) fn into_error(self, offset: usize) -> RecordError {
        match self {
            Self::MissingTerminator => RecordError::MissingTerminator { offset },
            Self::Malformed(reason) => RecordError::MalformedHeader { offset, reason },
        }
    }
}

/// Decide where the record at the start of `data` ends.
///
/// `at_eof` tells whether `data` holds everything that will ever arrive.
/// When false, any decision that depends on bytes not yet seen returns
/// [`Boundary::Incomplete`].
pub(crate) fn next_boundary(
    data: &[u8],
    at_eof: bool,
) -> std::result::Result<Boundary, BoundaryFault> {
    match find(data, TAG_DELIMITER) {
        Some(colon) if &data[..colon] == HEADER_LENGTH_TAG => {
            return match find(data, FS) {
                Some(fs) => Ok(Boundary::Complete(fs + 1)),
                None if at_eof => Err(BoundaryFault::MissingTerminator),
                None => Ok(Boundary::Incomplete),
            };
        }
        Some(_) => {}
        None if !at_eof => return Ok(Boundary::Incomplete),
        None => {}
    }

    // A record holding only its length field has no GS.
    let Some(end) = data.iter().position(|&b| b == GS || b == FS) else {
        return if at_eof {
            Err(BoundaryFault::Malformed(
                "no separator after record header".to_string(),
            ))
        } else {
            Ok(Boundary::Incomplete)
        };
    };

    let declared = parse_length_field(&data[..end]).map_err(BoundaryFault::Malformed)?;
    if declared <= data.len() {
        Ok(Boundary::Complete(declared))
    } else if at_eof {
        Ok(Boundary::Truncated {
            declared,
            available: data.len(),
        })
    } else {
        Ok(Boundary::Incomplete)
    }
}

/// Parse a `<tag>:<length>` header field into the declared length.
fn parse_length_field(field: &[u8]) -> std::result::Result<usize, String> {
    let text = std::str::from_utf8(field).map_err(|_| "header is not ASCII".to_string())?;
    let mut parts = text.split(':');
    let (Some(_tag), Some(length), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected <tag>:<length>, found {text:?}"));
    };
    let declared: usize = length
        .trim()
        .parse()
        .map_err(|_| format!("non-numeric record length {length:?}"))?;
    if declared == 0 {
        return Err("record length is zero".to_string());
    }
    Ok(declared)
}

fn find(data: &[u8], byte: u8) -> Option<usize> {
    data.iter().position(|&b| b == byte)
}

/// Result of scanning a whole transaction buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Byte ranges of each record, in order.
    pub spans: Vec<Range<usize>>,
    /// Recoverable problems found while scanning.
    pub diagnostics: Vec<Diagnostic>,
}

impl Scan {
    /// Offset just past the last scanned record.
    pub fn end(&self) -> usize {
        self.spans.last().map(|span| span.end).unwrap_or(0)
    }
}

/// Split a transaction buffer into record spans.
///
/// A malformed header stops the scan but keeps every record before it; a
/// length that overruns the input is clamped. Only an unterminated type-1
/// header is fatal.
pub fn scan(data: &[u8]) -> Result<Scan> {
    let mut out = Scan::default();
    let mut cursor = 0usize;

    while cursor < data.len() {
        let remaining = &data[cursor..];
        let len = match next_boundary(remaining, true) {
            Ok(Boundary::Complete(len)) => len,
            Ok(Boundary::Truncated {
                declared,
                available,
            }) => {
                warn!(
                    offset = cursor,
                    declared, available, "record length exceeds input, truncating"
                );
                out.diagnostics.push(Diagnostic::LengthOverrun {
                    offset: cursor,
                    declared,
                    available,
                });
                available
            }
            Ok(Boundary::Incomplete) => break,
            Err(BoundaryFault::Malformed(reason)) => {
                warn!(offset = cursor, %reason, "malformed record header, stopping scan");
                out.diagnostics.push(Diagnostic::MalformedHeader {
                    offset: cursor,
                    reason,
                });
                break;
            }
            Err(fault) => return Err(fault.into_error(cursor)),
        };

        debug!(offset = cursor, len, "scanned record");
        out.spans.push(cursor..cursor + len);
        cursor += len;
    }

    Ok(out)
}
