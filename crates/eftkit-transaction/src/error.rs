use std::path::PathBuf;

use eftkit_record::{FieldTag, RecordError};

/// Errors that can occur while loading or parsing a transaction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The input file does not exist.
    #[error("transaction file not found: {}", path.display())]
    FileAbsent { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Record-level failure (unterminated header).
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

pub type Result<T> = std::result::Result<T, TransactionError>;

/// Errors that can occur while editing a transaction.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The source transaction could not be parsed.
    #[error("parse failed: {0}")]
    Parse(#[from] TransactionError),

    /// The transaction has no type-2 descriptive record.
    #[error("transaction has no type-2 record")]
    MissingDescriptiveRecord,

    /// A patch key names a field outside the type-2 record.
    #[error("field {0} is not a type-2 field")]
    ForeignField(FieldTag),

    /// A patched value could not be serialized.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Errors that can occur while generating a transaction.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A descriptive key names a field outside the type-2 record.
    #[error("field {0} is not a type-2 field")]
    ForeignField(FieldTag),

    /// An image segment has no encoded bytes.
    #[error("image segment for position {position} is empty")]
    EmptySegment { position: String },

    /// A value could not be serialized.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Errors that can occur while generating under a size budget.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// Every ratio of the ladder produced output over the ceiling.
    #[error("transaction size {size} bytes exceeds limit of {max} bytes after {attempts} attempts")]
    SizeBudgetExceeded {
        size: usize,
        max: usize,
        attempts: usize,
    },

    /// The segment provider failed to (re)encode images.
    #[error("segment provider failed at ratio {ratio}: {source}")]
    Provider {
        ratio: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generation failed for reasons other than size.
    #[error("generate failed: {0}")]
    Generate(#[from] GenerateError),
}
