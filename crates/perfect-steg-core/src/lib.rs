//! # Perfect Steg Core API
//!
//! Hides a file behind a carrier image by appending a self describing packet, and
//! gets it back out even from carriers that went through lossy hands.
//!
//! - [`hide`] and [`extract`] work on the packet level
//! - [`conceal`] and [`reveal`] add the structure preservation of office documents
//!   and the type specific repairs on top
//! - [`api`] offers the same on files, builder style
//!
//! # Usage Examples
//!
//! ## Hide a file behind an image
//!
//! ```rust
//! let carrier = b"\x89PNG\r\n\x1a\n...image data...".to_vec();
//! let secret = b"%PDF-1.7 a very secret report".to_vec();
//!
//! let with_secret = perfect_steg_core::conceal(&carrier, &secret, "report.pdf")
//!     .expect("Failed to hide the report");
//! assert!(with_secret.starts_with(&carrier));
//! ```
//!
//! ## Get it back out
//!
//! ```rust
//! # let carrier = b"\x89PNG\r\n\x1a\n...image data...".to_vec();
//! # let with_secret = perfect_steg_core::conceal(&carrier, b"%PDF-1.7 report", "report.pdf").unwrap();
//! let restored = perfect_steg_core::reveal(&with_secret).expect("Failed to reveal");
//!
//! assert_eq!(restored.filename, "report.pdf");
//! assert_eq!(restored.mime_type, "application/pdf");
//! ```

#![warn(clippy::redundant_else)]

pub mod api;
pub mod commands;
pub mod container;
pub mod error;
pub mod extract;
pub mod fixers;
pub mod metadata;
pub mod result;
pub mod scan;
pub mod signature;
pub mod structure;

pub use crate::container::hide;
pub use crate::error::StegError;
pub use crate::extract::{extract, extract_with_options, ExtractOptions, ExtractedHeader, Extraction};
pub use crate::metadata::{Extensions, Metadata};
pub use crate::result::Result;
pub use crate::signature::FileKind;
pub use crate::structure::{
    process_after_extraction, process_for_hiding, PayloadKind, Restored,
};

use log::debug;

/// Prepares `payload` by its name and hides it behind `carrier`.
///
/// Archives get their snapshot hidden along, so [`reveal`] can tell whether they
/// survived the trip.
pub fn conceal(carrier: &[u8], payload: &[u8], filename: &str) -> Result<Vec<u8>> {
    let prepared = process_for_hiding(payload, filename);
    debug!("concealing {filename} as {}", prepared.kind.type_name());

    hide(
        carrier,
        prepared.processed,
        prepared.kind.type_name(),
        filename,
        prepared.extra_metadata()?,
    )
}

/// Extracts whatever is hidden behind `carrier` and restores it.
pub fn reveal(carrier: &[u8]) -> Result<Restored> {
    reveal_with_options(carrier, &ExtractOptions::default())
}

/// Like [`reveal`], with control over the extraction strategies.
pub fn reveal_with_options(carrier: &[u8], opts: &ExtractOptions) -> Result<Restored> {
    let found = extract_with_options(carrier, opts)?;
    process_after_extraction(found.data, &found.header)
}
