//! The pipe delimited format of the first release, kept readable forever.
//!
//! `PERFECT_STEG|<type>|<name>|<size in decimal>|<payload>`, no checksum.

use log::debug;

use crate::scan;

pub const LEGACY_MARKER: &[u8] = b"PERFECT_STEG|";

#[derive(Debug, PartialEq, Eq)]
pub struct LegacyPacket<'a> {
    pub payload_type: String,
    pub name: String,
    pub payload: &'a [u8],
}

/// Encoding never fails, `|` inside type or name is replaced by `_`.
pub fn encode(payload_type: &str, name: &str, payload: &[u8]) -> Vec<u8> {
    let head = format!(
        "PERFECT_STEG|{}|{}|{}|",
        payload_type.replace('|', "_"),
        name.replace('|', "_"),
        payload.len()
    );

    let mut buf = Vec::with_capacity(head.len() + payload.len());
    buf.extend_from_slice(head.as_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Parses the legacy packet starting at the last marker occurrence.
///
/// When the payload itself contains the marker, that occurrence does not parse and
/// the search goes on towards the start of the buffer.
pub fn find(buf: &[u8]) -> Option<LegacyPacket<'_>> {
    let mut end = buf.len();
    while let Some(offset) = scan::rfind(&buf[..end], LEGACY_MARKER) {
        if let Some(packet) = parse_at(buf, offset) {
            return Some(packet);
        }
        debug!("skipping legacy marker at {offset}, no valid packet");
        end = offset + LEGACY_MARKER.len() - 1;
    }

    None
}

fn parse_at(buf: &[u8], offset: usize) -> Option<LegacyPacket<'_>> {
    let rest = buf.get(offset + LEGACY_MARKER.len()..)?;
    let mut fields = rest.splitn(4, |b| *b == b'|');

    let payload_type = fields.next()?;
    let name = fields.next()?;
    let size: usize = std::str::from_utf8(fields.next()?).ok()?.parse().ok()?;
    let payload = fields.next()?.get(..size)?;

    Some(LegacyPacket {
        payload_type: String::from_utf8_lossy(payload_type).into_owned(),
        name: String::from_utf8_lossy(name).into_owned(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_a_hand_built_packet() {
        let mut buf = b"\x89PNG....image....".to_vec();
        buf.extend_from_slice(b"PERFECT_STEG|file|name.bin|5|");
        buf.extend_from_slice(&[1, 2, 3, 4, 5]);

        let packet = find(&buf).unwrap();
        assert_eq!(packet.payload_type, "file");
        assert_eq!(packet.name, "name.bin");
        assert_eq!(packet.payload, &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn should_allow_pipes_and_markers_inside_the_payload() {
        let payload = b"a|b|PERFECT_STEG|c";
        let buf = encode("file", "pipes.txt", payload);

        let packet = find(&buf).unwrap();
        assert_eq!(packet.payload, payload);
        assert_eq!(packet.name, "pipes.txt");
    }

    #[test]
    fn should_sanitize_fields() {
        let buf = encode("fi|le", "a|b.bin", b"xyz");
        assert!(buf.starts_with(b"PERFECT_STEG|fi_le|a_b.bin|3|"));
    }

    #[test]
    fn should_reject_broken_sizes() {
        assert!(find(b"PERFECT_STEG|file|a.bin|9|short").is_none());
        assert!(find(b"PERFECT_STEG|file|a.bin|x|short").is_none());
        assert!(find(b"PERFECT_STEG|file|a.bin").is_none());
        assert!(find(b"no marker at all").is_none());
    }
}
