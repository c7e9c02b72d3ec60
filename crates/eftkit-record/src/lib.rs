//! Record-level wire format for ANSI/NIST-ITL fingerprint transactions.
//!
//! A transaction is a sequence of records. Each record is a list of
//! `<type>.<field>:<value>` fields separated by `GS` and terminated by `FS`:
//! - The first field, `<type>.001`, declares the record's byte length
//! - The type-1 header is the exception: its `1.001` declares the whole file
//! - Image records end with a `.999` field holding raw, unescaped bytes
//!
//! This crate finds record boundaries, decodes fields and serializes records.

#[cfg(feature = "async")]
pub mod codec;
pub mod decoder;
pub mod error;
pub mod record;
pub mod scanner;
pub mod separator;
pub mod tag;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::{CodecConfig, RecordCodec};
pub use decoder::{decode, decode_record, Decoded};
pub use error::{Diagnostic, RecordError, Result};
pub use record::{FieldValue, Fields, Record};
pub use scanner::{scan, Boundary, Scan};
pub use separator::{
    is_binary_record_type, BINARY_RECORD_TYPES, FS, GS, IMAGE_FIELD, LENGTH_FIELD, RS, US,
};
pub use tag::FieldTag;
pub use writer::{rewrite_length, solve_length, RecordWriter};
