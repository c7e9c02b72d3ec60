//! Size-budgeted generation with a fixed compression ladder.
//!
//! Each attempt asks a [`SegmentProvider`] for images encoded at the next
//! compression ratio, generates the transaction and measures it. The first
//! output that fits is returned; after the last ratio the caller gets
//! [`BudgetError::SizeBudgetExceeded`].

use bytes::Bytes;
use tracing::{info, warn};

use crate::error::BudgetError;
use crate::generator::generate_with_header;
use crate::header::TransactionHeader;
use crate::segment::{ImageSegment, Mode};
use crate::transaction::FieldMap;

/// Largest transaction accepted by the receiving system (11 MiB).
pub const MAX_TRANSACTION_SIZE: usize = 11 * 1024 * 1024;

/// Compression ratios tried in order: the default, then three retries.
pub const RATIO_LADDER: [u32; 4] = [10, 15, 20, 30];

type Result<T> = std::result::Result<T, BudgetError>;

/// Supplies image segments encoded at a requested compression ratio.
pub trait SegmentProvider {
    /// Encode (or look up) the segments for `ratio`.
    fn segments(
        &mut self,
        ratio: u32,
    ) -> std::result::Result<Vec<ImageSegment>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<F, E> SegmentProvider for F
where
    F: FnMut(u32) -> std::result::Result<Vec<ImageSegment>, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn segments(
        &mut self,
        ratio: u32,
    ) -> std::result::Result<Vec<ImageSegment>, Box<dyn std::error::Error + Send + Sync>> {
        self(ratio).map_err(Into::into)
    }
}

/// Budget controller configuration.
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Inclusive size ceiling in bytes.
    pub max_bytes: usize,
    /// Compression ratios, one attempt each, in order.
    pub ratios: [u32; 4],
    /// Type-1 header content for every attempt.
    pub header: TransactionHeader,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_TRANSACTION_SIZE,
            ratios: RATIO_LADDER,
            header: TransactionHeader::default(),
        }
    }
}

/// A transaction that fits the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOutcome {
    /// The generated transaction.
    pub bytes: Bytes,
    /// Number of generation attempts, 1 to 4.
    pub attempts: usize,
    /// Compression ratio of the accepted attempt.
    pub ratio: u32,
}

/// Runs the compression ladder until a transaction fits.
#[derive(Debug, Clone, Default)]
pub struct BudgetController {
    config: BudgetConfig,
}

impl BudgetController {
    /// Controller with the default ceiling, ladder and header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller with explicit configuration.
    pub fn with_config(config: BudgetConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Generate, retrying with higher compression while the output is too large.
    pub fn run<P>(&self, fields: &FieldMap, provider: &mut P, mode: Mode) -> Result<BudgetOutcome>
    where
        P: SegmentProvider + ?Sized,
    {
        let max = self.config.max_bytes;
        let mut last_size = 0;

        for (attempt, &ratio) in self.config.ratios.iter().enumerate() {
            let attempts = attempt + 1;
            let segments = provider
                .segments(ratio)
                .map_err(|source| BudgetError::Provider { ratio, source })?;
            let bytes = generate_with_header(fields, &segments, mode, &self.config.header)?;
            let size = bytes.len();
            info!(attempt = attempts, ratio, size, max, "generated transaction");

            if size <= max {
                return Ok(BudgetOutcome {
                    bytes,
                    attempts,
                    ratio,
                });
            }
            warn!(ratio, size, max, "transaction over size limit");
            last_size = size;
        }

        Err(BudgetError::SizeBudgetExceeded {
            size: last_size,
            max,
            attempts: self.config.ratios.len(),
        })
    }
}

/// Generate with the default ladder and header under `max_bytes`.
pub fn generate_within_budget<P>(
    fields: &FieldMap,
    provider: &mut P,
    mode: Mode,
    max_bytes: usize,
) -> Result<Bytes>
where
    P: SegmentProvider + ?Sized,
{
    let controller = BudgetController::with_config(BudgetConfig {
        max_bytes,
        ..BudgetConfig::default()
    });
    controller
        .run(fields, provider, mode)
        .map(|outcome| outcome.bytes)
}
