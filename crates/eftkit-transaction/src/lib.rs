//! Transaction-level operations on ANSI/NIST-ITL fingerprint files.
//!
//! Parse a transaction into records, read its descriptive fields and print
//! images, edit the type-2 record in place, and generate new transactions
//! that fit a size budget.

pub mod budget;
pub mod editor;
pub mod error;
pub mod generator;
pub mod header;
pub mod segment;
pub mod transaction;

pub use budget::{
    generate_within_budget, BudgetConfig, BudgetController, BudgetOutcome, SegmentProvider,
    MAX_TRANSACTION_SIZE, RATIO_LADDER,
};
pub use editor::{edit, edit_transaction};
pub use error::{BudgetError, EditError, GenerateError, Result, TransactionError};
pub use generator::{generate, generate_with_header};
pub use header::TransactionHeader;
pub use segment::{CompressionLabel, FingerPosition, ImageLayout, ImageSegment, Mode, PositionCode};
pub use transaction::{parse, FieldMap, ImageRecord, Transaction};
