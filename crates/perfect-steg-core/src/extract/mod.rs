//! Recovery of a hidden payload from a possibly damaged carrier.
//!
//! Five strategies run in a fixed order, from the strict packet format down to
//! blindly taking the tail of the carrier. The first candidate that passes
//! [`verify::accept`] wins. The strict strategy is the one exception to "try the
//! next one": a packet it finds whose checksum does not match ends the cascade with
//! [`StegError::DataCorrupted`].

mod deep_scan;
mod legacy;
mod strict;
mod tail;
mod trailer;
pub mod verify;

use enum_dispatch::enum_dispatch;
use log::debug;

pub use deep_scan::DeepScan;
pub use legacy::LegacyFormat;
pub use strict::StrictFormat;
pub use tail::TailScan;
pub use trailer::KnownTrailer;

use crate::error::StegError;
use crate::metadata::Metadata;
use crate::result::Result;
use crate::signature::{self, OCTET_STREAM};

/// Knobs of the extraction cascade.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// How many trailing bytes the last resort strategy takes
    pub tail_window: usize,
    /// Candidates with a larger share of zero bytes are rejected
    pub max_zero_ratio: f64,
    /// Minimal length of a zero run that counts as padding between image and payload
    pub zero_run: usize,
    /// Whether the last resort strategy runs at all
    pub brute_force: bool,
}

pub const DEFAULT_TAIL_WINDOW: usize = 5 * 1024 * 1024;

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            tail_window: DEFAULT_TAIL_WINDOW,
            max_zero_ratio: 0.9,
            zero_run: 64,
            brute_force: true,
        }
    }
}

/// What is known about a recovered payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedHeader {
    pub payload_type: String,
    pub size: u64,
    pub timestamp: u64,
    pub name: String,
    pub mime_type: String,
    pub file_signature: Option<String>,
    /// Only packets in the current format carry metadata
    pub metadata: Option<Metadata>,
}

/// A payload candidate, as produced by one strategy.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub header: ExtractedHeader,
    pub data: Vec<u8>,
    pub strategy: Strategy,
}

impl Extraction {
    /// Wraps bytes found without any framing, all that is known comes from sniffing.
    fn unframed(data: &[u8], strategy: Strategy) -> Self {
        let sig = signature::sniff(data);
        let extension = sig.map(|s| s.extension).unwrap_or("bin");

        Self {
            header: ExtractedHeader {
                payload_type: "unknown".to_owned(),
                size: data.len() as u64,
                timestamp: 0,
                name: format!("recovered.{extension}"),
                mime_type: sig.map(|s| s.mime_type).unwrap_or(OCTET_STREAM).to_owned(),
                file_signature: Some(signature::file_signature(data)),
                metadata: None,
            },
            data: data.to_vec(),
            strategy,
        }
    }
}

#[enum_dispatch]
pub trait Recover {
    fn name(&self) -> &'static str;

    /// `Ok(None)` hands over to the next strategy, an error ends the cascade.
    fn recover(&self, carrier: &[u8], opts: &ExtractOptions) -> Result<Option<Extraction>>;
}

#[enum_dispatch(Recover)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    StrictFormat,
    LegacyFormat,
    KnownTrailer,
    DeepScan,
    TailScan,
}

/// The order matters, see the module docs.
pub const CASCADE: [Strategy; 5] = [
    Strategy::StrictFormat(StrictFormat),
    Strategy::LegacyFormat(LegacyFormat),
    Strategy::KnownTrailer(KnownTrailer),
    Strategy::DeepScan(DeepScan),
    Strategy::TailScan(TailScan),
];

pub fn extract(carrier: &[u8]) -> Result<Extraction> {
    extract_with_options(carrier, &ExtractOptions::default())
}

pub fn extract_with_options(carrier: &[u8], opts: &ExtractOptions) -> Result<Extraction> {
    for strategy in CASCADE {
        if !opts.brute_force && matches!(strategy, Strategy::TailScan(_)) {
            continue;
        }

        match strategy.recover(carrier, opts)? {
            Some(candidate) if verify::accept(&candidate.data, opts) => {
                debug!(
                    "{} recovered {} bytes as {}",
                    strategy.name(),
                    candidate.data.len(),
                    candidate.header.name
                );
                return Ok(candidate);
            }
            Some(candidate) => debug!(
                "{} found {} implausible bytes, trying next",
                strategy.name(),
                candidate.data.len()
            ),
            None => debug!("{} found nothing", strategy.name()),
        }
    }

    Err(StegError::NoDataFound)
}
