use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{RecordError, Result};
use crate::record::FieldValue;
use crate::separator::{FS, GS, TAG_DELIMITER};
use crate::tag::FieldTag;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Number of decimal digits in `n`.
fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Solve a self-describing length.
///
/// `fixed` is every byte of the output except the digits of the length
/// itself. Returns the total, whose own digit count is included.
pub fn solve_length(fixed: usize) -> usize {
    let mut digits = 1;
    loop {
        let total = fixed + digits;
        let needed = decimal_digits(total);
        if needed == digits {
            return total;
        }
        digits = needed;
    }
}

/// Serializes one record.
///
/// Fields are written in call order; [`finish`](Self::finish) prepends the
/// `<type>.001` length field and appends the terminating `FS`.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    record_type: u32,
    body: BytesMut,
}

impl RecordWriter {
    /// Start a record of the given type.
    pub fn new(record_type: u32) -> Self {
        Self {
            record_type,
            body: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Record type being written.
    pub fn record_type(&self) -> u32 {
        self.record_type
    }

    /// Append a text field.
    ///
    /// Text may carry `US`/`RS` subfield separators but never `GS` or `FS`,
    /// which would end the field or record early.
    pub fn text(&mut self, tag: FieldTag, value: &str) -> Result<&mut Self> {
        if let Some(&byte) = value.as_bytes().iter().find(|&&b| b == GS || b == FS) {
            return Err(RecordError::SeparatorInValue {
                tag: tag.to_string(),
                byte,
            });
        }
        self.put_tag(tag);
        self.body.put_slice(value.as_bytes());
        Ok(self)
    }

    /// Append an image field; the bytes are written verbatim.
    pub fn blob(&mut self, tag: FieldTag, data: &[u8]) -> &mut Self {
        self.body.reserve(data.len() + 16);
        self.put_tag(tag);
        self.body.put_slice(data);
        self
    }

    /// Append a decoded field value.
    pub fn field(&mut self, tag: FieldTag, value: &FieldValue) -> Result<&mut Self> {
        match value {
            FieldValue::Text(text) => self.text(tag, text),
            FieldValue::Blob(data) => Ok(self.blob(tag, data)),
        }
    }

    /// Finish the record; its length field holds its own byte count.
    pub fn finish(self) -> Bytes {
        self.finish_with_trailing(0)
    }

    /// Finish a record whose length field also counts `trailing` bytes that
    /// follow it (the type-1 header declares the whole transaction).
    pub fn finish_with_trailing(self, trailing: usize) -> Bytes {
        let prefix = format!("{}{}", FieldTag::length(self.record_type), TAG_DELIMITER as char);
        let own = prefix.len() + self.body.len() + 1;
        let declared = solve_length(own + trailing);

        let mut out = BytesMut::with_capacity(own + decimal_digits(declared));
        out.put_slice(prefix.as_bytes());
        out.put_slice(declared.to_string().as_bytes());
        out.put_slice(&self.body);
        out.put_u8(FS);
        out.freeze()
    }

    fn put_tag(&mut self, tag: FieldTag) {
        self.body.put_u8(GS);
        self.body.put_slice(tag.to_string().as_bytes());
        self.body.put_u8(TAG_DELIMITER);
    }
}

/// Rewrite the value of a record's leading length field.
///
/// The new value counts the rewritten record plus `trailing` bytes. Every
/// byte other than the length digits is kept. Returns `None` when the record
/// does not start with a `tag:value` field.
pub fn rewrite_length(raw: &[u8], trailing: usize) -> Option<Bytes> {
    let colon = raw.iter().position(|&b| b == TAG_DELIMITER)?;
    let value_end = raw[colon + 1..]
        .iter()
        .position(|&b| b == GS || b == FS)
        .map(|pos| pos + colon + 1)?;

    let fixed = raw.len() - (value_end - colon - 1) + trailing;
    let declared = solve_length(fixed);

    let mut out = BytesMut::with_capacity(fixed - trailing + decimal_digits(declared));
    out.put_slice(&raw[..=colon]);
    out.put_slice(declared.to_string().as_bytes());
    out.put_slice(&raw[value_end..]);
    Some(out.freeze())
}
