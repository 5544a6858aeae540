use log::warn;

use super::{ExtractOptions, ExtractedHeader, Extraction, Recover};
use crate::container::packet;
use crate::error::StegError;
use crate::metadata::sha256_hex;
use crate::result::Result;

/// Packets in the current format, verified by their SHA-256 checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictFormat;

impl Recover for StrictFormat {
    fn name(&self) -> &'static str {
        "strict format"
    }

    fn recover(&self, carrier: &[u8], _opts: &ExtractOptions) -> Result<Option<Extraction>> {
        let Some(found) = packet::find(carrier) else {
            return Ok(None);
        };

        let actual = sha256_hex(found.payload);
        if !actual.eq_ignore_ascii_case(&found.metadata.checksum) {
            warn!(
                "packet at {} holds {} bytes that do not match their checksum",
                found.offset,
                found.payload.len()
            );
            return Err(StegError::DataCorrupted {
                expected: found.metadata.checksum,
                actual,
            });
        }

        if crc32fast::hash(found.payload) != found.header.crc32 {
            warn!("packet at {} has a stale crc32 in its fixed header", found.offset);
        }

        let meta = found.metadata;
        Ok(Some(Extraction {
            header: ExtractedHeader {
                payload_type: meta.original_type.clone(),
                size: meta.original_size,
                timestamp: meta.timestamp,
                name: meta.original_name.clone(),
                mime_type: meta.mime_type.clone(),
                file_signature: Some(meta.file_signature.clone()),
                metadata: Some(meta),
            },
            data: found.payload.to_vec(),
            strategy: (*self).into(),
        }))
    }
}
