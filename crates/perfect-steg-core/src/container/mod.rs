//! Wire format of the packet appended to a carrier.

pub mod legacy;
pub mod packet;

use log::{debug, error};

use crate::error::StegError;
use crate::metadata::{Extensions, Metadata};
use crate::result::Result;

pub use packet::ParsedPacket;

pub const MAGIC: &[u8; 15] = b"PERFECT_STEG_V2";
pub const VERSION: u8 = 2;
pub const SEPARATOR: [u8; 4] = [0xFF, 0x00, 0xFF, 0x00];
pub const END_MARKER: [u8; 4] = [0xFE, 0xED, 0xFE, 0xED];

/// Appends `payload` as a packet to a copy of `carrier`.
///
/// The carrier bytes are never inspected. Should the packet not be buildable, the
/// payload is written in the legacy format instead, so the only error is an empty payload.
pub fn hide(
    carrier: &[u8],
    payload: &[u8],
    payload_type: &str,
    payload_name: &str,
    extra: Extensions,
) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(StegError::EmptyPayload);
    }

    let meta = Metadata::describe(payload, payload_type, payload_name, extra);
    let packet = match packet::encode(payload, &meta) {
        Ok(packet) => packet,
        Err(e) => {
            error!("cannot build packet for {payload_name}, falling back to legacy format: {e}");
            legacy::encode(payload_type, payload_name, payload)
        }
    };
    debug!(
        "hiding {} bytes of {payload_name} as a {} byte packet",
        payload.len(),
        packet.len()
    );

    let mut out = Vec::with_capacity(carrier.len() + packet.len());
    out.extend_from_slice(carrier);
    out.extend_from_slice(&packet);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_append_without_touching_the_carrier() {
        let carrier = b"\x89PNG fake image".to_vec();
        let out = hide(&carrier, b"payload", "file", "p.bin", Extensions::new()).unwrap();

        assert!(out.starts_with(&carrier));
        assert_eq!(&out[carrier.len()..carrier.len() + MAGIC.len()], MAGIC);
        assert!(out.ends_with(&END_MARKER));
    }

    #[test]
    fn should_reject_empty_payloads() {
        let result = hide(b"carrier", b"", "file", "empty.bin", Extensions::new());
        assert!(matches!(result, Err(StegError::EmptyPayload)));
    }

    #[test]
    fn should_accept_empty_carriers() {
        let out = hide(b"", b"x", "file", "x.bin", Extensions::new()).unwrap();
        assert_eq!(packet::find(&out).unwrap().payload, b"x");
    }
}
