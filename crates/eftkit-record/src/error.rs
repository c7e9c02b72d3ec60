/// Errors that abort record scanning or decoding.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The type-1 header record has no file separator.
    #[error("type-1 record at offset {offset} has no FS terminator")]
    MissingTerminator { offset: usize },

    /// A record's leading length field could not be parsed.
    ///
    /// The whole-buffer scanner reports this as a [`Diagnostic`] instead;
    /// only the streaming codec surfaces it as an error.
    #[error("malformed record header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },

    /// Text that is not a `<type>.<field>` tag.
    #[error("invalid field tag {0:?}")]
    InvalidTag(String),

    /// A text value contains a byte that would end its field or record.
    #[error("value of field {tag} contains reserved separator 0x{byte:02X}")]
    SeparatorInValue { tag: String, byte: u8 },

    /// A record exceeds the configured maximum size.
    #[error("record too large ({size} bytes, max {max})")]
    RecordTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing records.
    #[error("record I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Recoverable findings collected while scanning or decoding.
///
/// None of these stop the records already read from being used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// Scanning stopped at a record whose header could not be parsed.
    #[error("malformed record header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },

    /// A declared record length ran past the end of the input.
    #[error("record at offset {offset} declares {declared} bytes, {available} available; truncated")]
    LengthOverrun {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// The type-1 header's declared total differs from the bytes present.
    #[error("header declares {declared} bytes, transaction has {actual}")]
    TransactionLengthMismatch { declared: usize, actual: usize },

    /// A field whose tag text is not a valid field tag was dropped.
    #[error("skipped field with invalid tag {tag:?}")]
    SkippedField { tag: String },
}
