//! Record field decoding.
//!
//! Text records are split on `GS`. Binary records cannot be split that way:
//! their image payload may contain any byte, including `GS`, `FS` and
//! tag-shaped text. They are walked tag by tag instead, and the walk stops for
//! good at the `.999` image tag, whose value runs to the end of the record.

use std::ops::Range;

use bytes::Bytes;
use tracing::debug;

use crate::error::Diagnostic;
use crate::record::{FieldValue, Fields, Record};
use crate::separator::{is_binary_record_type, FS, GS, TAG_DELIMITER, TAG_DOT};
use crate::tag::FieldTag;

/// Fields decoded from one record plus any fields that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Fields in record order.
    pub fields: Fields,
    /// Recoverable problems found while decoding.
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode one record's fields.
///
/// `raw` is the record exactly as scanned, normally ending in `FS`. Image
/// payloads are returned as zero-copy slices of `raw`.
pub fn decode(raw: &Bytes) -> Decoded {
    let body = strip_terminator(raw);

    let Some(first_gs) = find_from(raw, 0, GS) else {
        let mut out = Decoded::default();
        decode_piece(raw, body, &mut out);
        return out;
    };

    match leading_record_type(&raw[..first_gs]) {
        Some(record_type) if is_binary_record_type(record_type) => {
            debug!(record_type, len = raw.len(), "decoding binary record");
            decode_binary(raw, body)
        }
        _ => decode_text(raw, body),
    }
}

/// Decode a record and keep its raw bytes alongside the fields.
pub fn decode_record(raw: Bytes) -> (Record, Vec<Diagnostic>) {
    let Decoded {
        fields,
        diagnostics,
    } = decode(&raw);
    (Record::new(fields, raw), diagnostics)
}

/// Record type named before the first `.` of the leading field.
fn leading_record_type(first_field: &[u8]) -> Option<u32> {
    let dot = first_field.iter().position(|&b| b == TAG_DOT)?;
    std::str::from_utf8(&first_field[..dot]).ok()?.parse().ok()
}

fn decode_text(raw: &Bytes, body: Range<usize>) -> Decoded {
    let mut out = Decoded::default();
    let mut start = body.start;
    while start <= body.end {
        let end = find_from(&raw[..body.end], start, GS).unwrap_or(body.end);
        decode_piece(raw, start..end, &mut out);
        start = end + 1;
    }
    out
}

fn decode_binary(raw: &Bytes, body: Range<usize>) -> Decoded {
    let mut out = Decoded::default();
    let data = &raw[..body.end];
    let mut cursor = body.start;

    while cursor < body.end {
        let Some(colon) = find_from(data, cursor, TAG_DELIMITER) else {
            break;
        };

        // Colons inside earlier values or ahead of the image tag are not tags.
        let Some(tag) = FieldTag::from_bytes(&data[cursor..colon]) else {
            cursor = colon + 1;
            continue;
        };

        if tag.is_image() {
            let blob = raw.slice(colon + 1..body.end);
            debug!(%tag, len = blob.len(), "image payload");
            out.fields.insert(tag, FieldValue::Blob(blob));
            break;
        }

        let end = find_from(data, colon, GS).unwrap_or(body.end);
        out.fields.insert(tag, text_value(&data[colon + 1..end]));
        cursor = end + 1;
    }

    out
}

/// Decode a `tag:value` piece; pieces without a colon are ignored.
fn decode_piece(raw: &Bytes, piece: Range<usize>, out: &mut Decoded) {
    let Some(colon) = find_from(&raw[..piece.end], piece.start, TAG_DELIMITER) else {
        return;
    };
    let tag_bytes = &raw[piece.start..colon];
    let Some(tag) = FieldTag::from_bytes(tag_bytes) else {
        let tag = String::from_utf8_lossy(tag_bytes).into_owned();
        debug!(%tag, "skipping field with invalid tag");
        out.diagnostics.push(Diagnostic::SkippedField { tag });
        return;
    };

    let value = if tag.is_image() {
        FieldValue::Blob(raw.slice(colon + 1..piece.end))
    } else {
        text_value(&raw[colon + 1..piece.end])
    };
    out.fields.insert(tag, value);
}

fn text_value(bytes: &[u8]) -> FieldValue {
    FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
}

/// Record body with one trailing `FS` removed.
fn strip_terminator(raw: &[u8]) -> Range<usize> {
    match raw.last() {
        Some(&FS) => 0..raw.len() - 1,
        _ => 0..raw.len(),
    }
}

fn find_from(data: &[u8], from: usize, byte: u8) -> Option<usize> {
    data.get(from..)?
        .iter()
        .position(|&b| b == byte)
        .map(|pos| pos + from)
}
