use bytes::Bytes;

use crate::tag::FieldTag;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text value of any non-image field.
    Text(String),
    /// Raw bytes of a `.999` image field.
    Blob(Bytes),
}

impl FieldValue {
    /// The text value, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blob(_) => None,
        }
    }

    /// The raw bytes, if this is an image field.
    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            Self::Text(_) => None,
            Self::Blob(blob) => Some(blob),
        }
    }

    /// Serialized size of the value in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Blob(blob) => blob.len(),
        }
    }

    /// True when the value has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        Self::Blob(value)
    }
}

/// Ordered fields of one record, at most one per tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(FieldTag, FieldValue)>,
}

impl Fields {
    /// Create an empty field list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field.
    ///
    /// A tag that is already present keeps its position and takes the new
    /// value; the previous value is returned.
    pub fn insert(&mut self, tag: FieldTag, value: FieldValue) -> Option<FieldValue> {
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((tag, value));
                None
            }
        }
    }

    /// Look up a field by tag.
    pub fn get(&self, tag: &FieldTag) -> Option<&FieldValue> {
        self.entries.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    /// Look up a text field by tag.
    pub fn text(&self, tag: &FieldTag) -> Option<&str> {
        self.get(tag).and_then(FieldValue::as_text)
    }

    /// True if a field with this tag exists.
    pub fn contains(&self, tag: &FieldTag) -> bool {
        self.get(tag).is_some()
    }

    /// Iterate fields in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldTag, &FieldValue)> {
        self.entries.iter().map(|(t, v)| (t, v))
    }

    /// Tag of the first field.
    pub fn first_tag(&self) -> Option<FieldTag> {
        self.entries.first().map(|(t, _)| *t)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FieldTag, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (FieldTag, FieldValue)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (tag, value) in iter {
            fields.insert(tag, value);
        }
        fields
    }
}

/// One record of a transaction: its decoded fields and the exact source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Decoded fields in record order.
    pub fields: Fields,
    /// Raw record bytes, including the trailing file separator.
    pub raw: Bytes,
}

impl Record {
    /// Create a record.
    pub fn new(fields: Fields, raw: impl Into<Bytes>) -> Self {
        Self {
            fields,
            raw: raw.into(),
        }
    }

    /// Record type, taken from the first field's tag.
    pub fn record_type(&self) -> Option<u32> {
        self.fields.first_tag().map(|tag| tag.record_type)
    }

    /// The record's own `<type>.001` value parsed as a length.
    pub fn declared_length(&self) -> Option<usize> {
        let record_type = self.record_type()?;
        self.fields
            .text(&FieldTag::length(record_type))?
            .trim()
            .parse()
            .ok()
    }

    /// The `.999` image payload, if present.
    pub fn image(&self) -> Option<&Bytes> {
        let record_type = self.record_type()?;
        self.fields
            .get(&FieldTag::image(record_type))
            .and_then(FieldValue::as_blob)
    }

    /// Wire size of the record in the source.
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }
}
