//! Reserved ANSI/NIST-ITL control bytes.
//!
//! - `FS` terminates a record
//! - `GS` separates fields inside a record
//! - `RS` separates repeated subfields
//! - `US` separates information items inside a subfield

/// Unit separator (information items).
pub const US: u8 = 0x1F;

/// Record separator (subfields).
pub const RS: u8 = 0x1E;

/// Group separator (fields).
pub const GS: u8 = 0x1D;

/// File separator (records).
pub const FS: u8 = 0x1C;

/// Separates a field tag from its value.
pub const TAG_DELIMITER: u8 = b':';

/// Separates record type from field number inside a tag.
pub const TAG_DOT: u8 = b'.';

/// Field number carrying the opaque image payload.
pub const IMAGE_FIELD: u32 = 999;

/// Field number carrying the record length.
pub const LENGTH_FIELD: u32 = 1;

/// Record types known to embed an image blob under field 999.
pub const BINARY_RECORD_TYPES: [u32; 9] = [4, 7, 8, 10, 13, 14, 15, 16, 17];

/// Returns a human-readable name for a separator byte.
pub fn separator_name(byte: u8) -> Option<&'static str> {
    match byte {
        US => Some("US"),
        RS => Some("RS"),
        GS => Some("GS"),
        FS => Some("FS"),
        _ => None,
    }
}

/// Returns true if the byte is one of the four reserved separators.
pub fn is_separator(byte: u8) -> bool {
    separator_name(byte).is_some()
}

/// Returns true if records of this type carry an opaque `.999` payload.
pub fn is_binary_record_type(record_type: u32) -> bool {
    BINARY_RECORD_TYPES.contains(&record_type)
}
