use super::{ExtractOptions, Extraction, Recover};
use crate::result::Result;

/// Last resort, takes the trailing window of the carrier as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailScan;

impl Recover for TailScan {
    fn name(&self) -> &'static str {
        "tail scan"
    }

    fn recover(&self, carrier: &[u8], opts: &ExtractOptions) -> Result<Option<Extraction>> {
        let window = opts.tail_window.min(carrier.len());
        if window == 0 {
            return Ok(None);
        }

        let tail = &carrier[carrier.len() - window..];
        Ok(Some(Extraction::unframed(tail, (*self).into())))
    }
}
