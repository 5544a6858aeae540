//! Preparation of payloads before hiding and restoration after extraction.
//!
//! Archive based payloads (office documents, e-books, plain ZIP files) are
//! snapshotted before they are hidden. On the way out the snapshot tells whether
//! the archive survived unchanged. Payloads without a snapshot are validated by
//! type and repaired where that is possible.

pub mod office;
pub mod repair;
mod snapshot;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use snapshot::{ArchiveSnapshot, EntrySnapshot, OfficeKind};

use crate::extract::ExtractedHeader;
use crate::fixers;
use crate::metadata::{sha256_hex, Extensions, ARCHIVE_SNAPSHOT, IS_SPECIAL};
use crate::result::Result;
use crate::signature::{self, extension_of, FileKind, OCTET_STREAM};

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ARCHIVE_EXTENSIONS: [&str; 6] = ["docx", "pptx", "xlsx", "odt", "epub", "zip"];

const FALLBACK_NAME: &str = "recovered.bin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// How a payload is treated on its way in and out of a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadKind {
    Office(ArchiveSnapshot),
    SimpleFile(FileMeta),
    Text,
}

impl PayloadKind {
    /// Goes into the packet as the payload type.
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadKind::Office(_) => "office",
            PayloadKind::SimpleFile(_) => "file",
            PayloadKind::Text => "text",
        }
    }
}

#[derive(Debug)]
pub struct Prepared<'a> {
    pub processed: &'a [u8],
    pub kind: PayloadKind,
}

impl Prepared<'_> {
    /// Metadata fields to hide along with the payload.
    pub fn extra_metadata(&self) -> Result<Extensions> {
        let mut extra = Extensions::new();
        match &self.kind {
            PayloadKind::Office(snapshot) => {
                extra.insert(IS_SPECIAL.to_owned(), Value::Bool(true));
                extra.insert(ARCHIVE_SNAPSHOT.to_owned(), serde_json::to_value(snapshot)?);
            }
            PayloadKind::SimpleFile(meta) if meta.mime_type != OCTET_STREAM => {
                extra.insert("mimeType".to_owned(), Value::String(meta.mime_type.clone()));
            }
            PayloadKind::SimpleFile(_) => {}
            PayloadKind::Text => {
                extra.insert("mimeType".to_owned(), Value::String("text/plain".to_owned()));
            }
        }
        Ok(extra)
    }
}

/// Classifies `buffer`, snapshotting it when it is an archive. The buffer itself
/// is passed through unchanged.
pub fn process_for_hiding<'a>(buffer: &'a [u8], filename: &str) -> Prepared<'a> {
    let ext = extension_of(filename);

    if buffer.starts_with(ZIP_LOCAL_HEADER)
        && ext.as_deref().is_some_and(|e| ARCHIVE_EXTENSIONS.contains(&e))
    {
        match ArchiveSnapshot::take(buffer, filename) {
            Ok(snapshot) => {
                let missing = snapshot.missing_entries();
                if !missing.is_empty() {
                    warn!("{filename} lacks required entries {missing:?}, hiding it anyway");
                }
                debug!("snapshotted {filename} with {} entries", snapshot.entry_count);
                return Prepared {
                    processed: buffer,
                    kind: PayloadKind::Office(snapshot),
                };
            }
            Err(e) => warn!("{filename} looks like an archive but does not open: {e}"),
        }
    }

    let kind = if ext.as_deref() == Some("txt") && std::str::from_utf8(buffer).is_ok() {
        PayloadKind::Text
    } else {
        PayloadKind::SimpleFile(FileMeta {
            name: filename.to_owned(),
            size: buffer.len() as u64,
            mime_type: signature::mime_for_name(filename)
                .unwrap_or_else(|| signature::sniff_mime(buffer))
                .to_owned(),
        })
    };

    Prepared {
        processed: buffer,
        kind,
    }
}

/// Raised when an archive no longer matches the snapshot taken before hiding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumAdvisory {
    pub expected: String,
    pub actual: String,
}

/// A recovered payload, ready to be written or delivered.
#[derive(Debug, Clone)]
pub struct Restored {
    pub buffer: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub kind: FileKind,
    pub advisory: Option<ChecksumAdvisory>,
}

pub fn process_after_extraction(buffer: Vec<u8>, header: &ExtractedHeader) -> Result<Restored> {
    let filename = sanitize_filename(&header.name);
    let mut advisory = None;

    let buffer = match header.metadata.as_ref().filter(|m| m.is_special()) {
        Some(meta) => {
            match meta.extension::<ArchiveSnapshot>(ARCHIVE_SNAPSHOT) {
                Some(snapshot) => {
                    let actual = sha256_hex(&buffer);
                    if !actual.eq_ignore_ascii_case(&snapshot.checksum) {
                        warn!(
                            "CHECKSUM_MISMATCH_ADVISORY: {filename} differs from its snapshot, expected {} got {actual}",
                            snapshot.checksum
                        );
                        advisory = Some(ChecksumAdvisory {
                            expected: snapshot.checksum,
                            actual,
                        });
                    }
                }
                None => warn!("{filename} is marked special but carries no archive snapshot"),
            }
            buffer
        }
        None => validate_and_fix_file(buffer, &filename)?,
    };

    let mime_type = signature::mime_for_name(&filename)
        .map(str::to_owned)
        .or_else(|| {
            Some(header.mime_type.clone()).filter(|m| !m.is_empty() && m != OCTET_STREAM)
        })
        .unwrap_or_else(|| signature::sniff_mime(&buffer).to_owned());

    Ok(Restored {
        kind: FileKind::from_mime(&mime_type),
        buffer,
        filename,
        mime_type,
        advisory,
    })
}

/// Hands archives to the archive fixer, everything else to the type fixers.
pub fn validate_and_fix_file(buffer: Vec<u8>, filename: &str) -> Result<Vec<u8>> {
    if extension_of(filename).is_some_and(|e| ARCHIVE_EXTENSIONS.contains(&e.as_str())) {
        return office::fix_archive(&buffer, filename);
    }

    if let std::borrow::Cow::Owned(fixed) = fixers::fix_by_extension(&buffer, filename) {
        return Ok(fixed);
    }
    Ok(buffer)
}

/// Keeps the last path component only, names from a carrier are not trusted.
pub fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or(FALLBACK_NAME)
        .to_owned()
}
