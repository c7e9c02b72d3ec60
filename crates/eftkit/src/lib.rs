//! Toolkit for ANSI/NIST-ITL fingerprint transactions.
//!
//! # Crate Structure
//!
//! - [`record`] — Record boundaries, field decoding and record serialization
//! - [`transaction`] — Parsing, descriptive-field editing and size-budgeted generation
//!
//! The `eftkit` binary (feature `cli`) exposes the same operations on files.

/// Re-export record types.
pub mod record {
    pub use eftkit_record::*;
}

/// Re-export transaction types.
pub mod transaction {
    pub use eftkit_transaction::*;
}
