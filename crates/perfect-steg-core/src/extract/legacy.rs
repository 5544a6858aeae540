use super::{ExtractOptions, ExtractedHeader, Extraction, Recover};
use crate::container::legacy;
use crate::result::Result;
use crate::signature;

/// Packets of the pipe delimited first release format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFormat;

impl Recover for LegacyFormat {
    fn name(&self) -> &'static str {
        "legacy format"
    }

    fn recover(&self, carrier: &[u8], _opts: &ExtractOptions) -> Result<Option<Extraction>> {
        let Some(found) = legacy::find(carrier) else {
            return Ok(None);
        };

        let mime_type = signature::mime_for_name(&found.name)
            .unwrap_or_else(|| signature::sniff_mime(found.payload));

        Ok(Some(Extraction {
            header: ExtractedHeader {
                size: found.payload.len() as u64,
                timestamp: 0,
                mime_type: mime_type.to_owned(),
                file_signature: Some(signature::file_signature(found.payload)),
                metadata: None,
                payload_type: found.payload_type,
                name: found.name,
            },
            data: found.payload.to_vec(),
            strategy: (*self).into(),
        }))
    }
}
