use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;
use crate::separator::{IMAGE_FIELD, LENGTH_FIELD, TAG_DOT};

/// A field tag: `<record-type>.<field-number>`.
///
/// Parsing accepts any digit width (`2.18`, `2.018`); display always pads the
/// field number to three digits, which is how ANSI/NIST-ITL files write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldTag {
    /// Record type the field belongs to.
    pub record_type: u32,
    /// Field number within the record.
    pub field_number: u32,
}

impl FieldTag {
    /// Create a tag.
    pub const fn new(record_type: u32, field_number: u32) -> Self {
        Self {
            record_type,
            field_number,
        }
    }

    /// The `<type>.001` length tag of a record type.
    pub const fn length(record_type: u32) -> Self {
        Self::new(record_type, LENGTH_FIELD)
    }

    /// The `<type>.999` image tag of a record type.
    pub const fn image(record_type: u32) -> Self {
        Self::new(record_type, IMAGE_FIELD)
    }

    /// True for the `.001` record length field.
    pub fn is_length(&self) -> bool {
        self.field_number == LENGTH_FIELD
    }

    /// True for the `.999` image field.
    pub fn is_image(&self) -> bool {
        self.field_number == IMAGE_FIELD
    }

    /// Parse a tag candidate from raw bytes.
    ///
    /// Accepts exactly `digits "." digits`; anything else (including empty
    /// sides, signs, whitespace or non-ASCII) returns `None`.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        let dot = raw.iter().position(|&b| b == TAG_DOT)?;
        let (left, right) = (&raw[..dot], &raw[dot + 1..]);
        Some(Self::new(parse_digits(left)?, parse_digits(right)?))
    }
}

fn parse_digits(raw: &[u8]) -> Option<u32> {
    if raw.is_empty() || !raw.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // All bytes are ASCII digits, so this is valid UTF-8.
    std::str::from_utf8(raw).ok()?.parse().ok()
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.record_type, self.field_number)
    }
}

impl FromStr for FieldTag {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or_else(|| RecordError::InvalidTag(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_digit_width() {
        assert_eq!("2.018".parse::<FieldTag>().unwrap(), FieldTag::new(2, 18));
        assert_eq!("2.18".parse::<FieldTag>().unwrap(), FieldTag::new(2, 18));
        assert_eq!("14.999".parse::<FieldTag>().unwrap(), FieldTag::image(14));
    }

    #[test]
    fn displays_padded_field_number() {
        assert_eq!(FieldTag::new(2, 18).to_string(), "2.018");
        assert_eq!(FieldTag::length(1).to_string(), "1.001");
        assert_eq!(FieldTag::new(2, 1234).to_string(), "2.1234");
    }

    #[test]
    fn rejects_non_tag_text() {
        for bad in ["", ".", "2.", ".18", "2.1a", "a2.18", " 2.18", "2.18.1", "+2.1", "2"] {
            assert!(FieldTag::from_bytes(bad.as_bytes()).is_none(), "{bad:?}");
        }
        assert!(matches!(
            "x.y".parse::<FieldTag>(),
            Err(RecordError::InvalidTag(_))
        ));
    }

    #[test]
    fn rejects_binary_noise() {
        assert!(FieldTag::from_bytes(&[0xFF, b'.', b'1']).is_none());
        assert!(FieldTag::from_bytes(&[b'1', b'.', 0x1D]).is_none());
    }

    #[test]
    fn orders_by_type_then_field() {
        let mut tags = vec![
            FieldTag::new(14, 1),
            FieldTag::new(2, 18),
            FieldTag::new(2, 2),
        ];
        tags.sort();
        assert_eq!(
            tags,
            vec![FieldTag::new(2, 2), FieldTag::new(2, 18), FieldTag::new(14, 1)]
        );
    }
}
