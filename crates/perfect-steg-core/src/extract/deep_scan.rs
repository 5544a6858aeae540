use log::trace;

use super::{ExtractOptions, Extraction, Recover};
use crate::result::Result;
use crate::signature;

/// Looks for a known file signature in the back half of the carrier.
///
/// Payloads are appended, so a signature in the front half most likely belongs to
/// the carrier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepScan;

impl Recover for DeepScan {
    fn name(&self) -> &'static str {
        "deep signature scan"
    }

    fn recover(&self, carrier: &[u8], _opts: &ExtractOptions) -> Result<Option<Extraction>> {
        let Some((pos, sig)) = signature::find_after(carrier, carrier.len() / 2) else {
            return Ok(None);
        };

        trace!("{} signature at {pos} of {}", sig.extension, carrier.len());
        Ok(Some(Extraction::unframed(&carrier[pos..], (*self).into())))
    }
}
