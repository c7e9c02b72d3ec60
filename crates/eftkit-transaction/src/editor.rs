//! Descriptive-field editing that leaves every other byte in place.

use bytes::{BufMut, Bytes, BytesMut};
use eftkit_record::{rewrite_length, FieldTag, Record, RecordWriter};
use tracing::{debug, warn};

use crate::error::EditError;
use crate::transaction::{parse, FieldMap, Transaction, DESCRIPTIVE_RECORD_TYPE};

type Result<T> = std::result::Result<T, EditError>;

/// Apply `patch` to the first type-2 record of a transaction.
///
/// Existing fields keep their position; new fields follow in tag order. All
/// other records and any unscanned tail are copied unchanged, except that the
/// header's `1.001` is updated to the new total size.
pub fn edit(data: impl Into<Bytes>, patch: &FieldMap) -> Result<Bytes> {
    let transaction = parse(data)?;
    edit_transaction(&transaction, patch)
}

/// Apply `patch` to an already parsed transaction.
pub fn edit_transaction(transaction: &Transaction, patch: &FieldMap) -> Result<Bytes> {
    if let Some(tag) = patch
        .keys()
        .find(|tag| tag.record_type != DESCRIPTIVE_RECORD_TYPE)
    {
        return Err(EditError::ForeignField(*tag));
    }
    let index = transaction
        .descriptive_index()
        .ok_or(EditError::MissingDescriptiveRecord)?;

    let records = transaction.records();
    let patched = patch_record(&records[index], patch)?;

    let mut body = BytesMut::new();
    for (i, record) in records.iter().enumerate().skip(1) {
        if i == index {
            body.put_slice(&patched);
        } else {
            body.put_slice(&record.raw);
        }
    }
    body.put_slice(&transaction.trailing());

    let first = match records.first() {
        Some(_) if index == 0 => patched,
        Some(record) if transaction.header().is_some() => {
            rewrite_length(&record.raw, body.len()).unwrap_or_else(|| {
                warn!("header has no rewritable length field, copying unchanged");
                record.raw.clone()
            })
        }
        Some(record) => record.raw.clone(),
        None => Bytes::new(),
    };

    let mut out = BytesMut::with_capacity(first.len() + body.len());
    out.put_slice(&first);
    out.put_slice(&body);
    debug!(
        fields = patch.len(),
        before = transaction.source().len(),
        after = out.len(),
        "edited descriptive record"
    );
    Ok(out.freeze())
}

fn patch_record(record: &Record, patch: &FieldMap) -> Result<Bytes> {
    let length_tag = FieldTag::length(DESCRIPTIVE_RECORD_TYPE);
    let mut writer = RecordWriter::new(DESCRIPTIVE_RECORD_TYPE);

    for (tag, value) in record.fields.iter() {
        if *tag == length_tag {
            continue;
        }
        match patch.get(tag) {
            Some(text) => writer.text(*tag, text)?,
            None => writer.field(*tag, value)?,
        };
    }
    for (tag, text) in patch {
        if *tag != length_tag && !record.fields.contains(tag) {
            writer.text(*tag, text)?;
        }
    }
    Ok(writer.finish())
}
