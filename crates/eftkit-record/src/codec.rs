//! Streaming record codec for `tokio_util::codec`.
//!
//! Yields each record's raw bytes as soon as its boundary is known. Boundary
//! rules match [`scan`](crate::scanner::scan): overrun clamping only happens
//! at end of stream, where no more bytes can arrive.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{RecordError, Result};
use crate::scanner::{next_boundary, Boundary};

/// Configuration for the streaming codec.
#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    /// Largest record accepted, in bytes. `None` means unlimited.
    pub max_record_size: Option<usize>,
}

/// Splits a byte stream into raw records.
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    config: CodecConfig,
    offset: usize,
}

impl RecordCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config, offset: 0 }
    }

    /// Stream offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn check_size(&self, size: usize) -> Result<()> {
        match self.config.max_record_size {
            Some(max) if size > max => Err(RecordError::RecordTooLarge { size, max }),
            _ => Ok(()),
        }
    }

    fn take(&mut self, src: &mut BytesMut, len: usize) -> Result<Bytes> {
        self.check_size(len)?;
        self.offset += len;
        Ok(src.split_to(len).freeze())
    }
}

impl Decoder for RecordCodec {
    type Item = Bytes;
    type Error = RecordError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if src.is_empty() {
            return Ok(None);
        }
        match next_boundary(src, false).map_err(|fault| fault.into_error(self.offset))? {
            Boundary::Complete(len) => self.take(src, len).map(Some),
            Boundary::Incomplete | Boundary::Truncated { .. } => {
                // Bound buffering while a boundary is still unknown.
                self.check_size(src.len())?;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if src.is_empty() {
            return Ok(None);
        }
        match next_boundary(src, true).map_err(|fault| fault.into_error(self.offset))? {
            Boundary::Complete(len) => self.take(src, len).map(Some),
            Boundary::Truncated {
                declared,
                available,
            } => {
                warn!(
                    offset = self.offset,
                    declared, available, "record length exceeds stream, truncating"
                );
                self.take(src, available).map(Some)
            }
            Boundary::Incomplete => Ok(None),
        }
    }
}

impl Encoder<Bytes> for RecordCodec {
    type Error = RecordError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        self.check_size(item.len())?;
        dst.extend_from_slice(&item);
        Ok(())
    }
}
