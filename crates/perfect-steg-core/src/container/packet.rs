use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::debug;

use super::{END_MARKER, MAGIC, SEPARATOR, VERSION};
use crate::error::StegError;
use crate::metadata::{FixedHeader, Metadata, FIXED_HEADER_LEN};
use crate::result::Result;
use crate::scan;

/// Serializes `payload` as a complete packet described by `meta`.
///
/// ```text
/// MAGIC | VERSION | FIXED_HEADER | METADATA_LEN | METADATA | SEPARATOR | PAYLOAD | END_MARKER
/// ```
pub fn encode(payload: &[u8], meta: &Metadata) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(meta)?;
    let json_len = u32::try_from(json.len()).map_err(|_| StegError::MetadataTooLarge(json.len()))?;
    let header = FixedHeader::new(payload, meta);

    let mut buf = Vec::with_capacity(
        MAGIC.len() + 1 + FIXED_HEADER_LEN + 4 + json.len() + SEPARATOR.len() + payload.len() + END_MARKER.len(),
    );
    buf.extend_from_slice(MAGIC);
    buf.write_u8(VERSION)?;
    buf.extend_from_slice(&header.to_bytes());
    buf.write_u32::<BigEndian>(json_len)?;
    buf.extend_from_slice(&json);
    buf.extend_from_slice(&SEPARATOR);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&END_MARKER);

    Ok(buf)
}

/// A packet found inside a carrier, the payload is not verified yet.
#[derive(Debug)]
pub struct ParsedPacket<'a> {
    /// Offset of the magic in the carrier
    pub offset: usize,
    pub header: FixedHeader,
    pub metadata: Metadata,
    pub payload: &'a [u8],
    /// Offset right behind the payload
    pub end: usize,
    /// Whether the end marker follows the payload, informational only
    pub end_marker: bool,
}

/// Parses the packet whose magic starts at `offset`.
///
/// `None` on anything structurally off: unknown version, truncated fields, unparsable
/// metadata, missing separator, or a fixed header that disagrees with the metadata.
pub fn parse_at(buf: &[u8], offset: usize) -> Option<ParsedPacket<'_>> {
    let mut pos = offset;
    if buf.get(pos..pos + MAGIC.len())? != MAGIC {
        return None;
    }
    pos += MAGIC.len();

    let version = *buf.get(pos)?;
    if version != VERSION {
        debug!("packet at {offset} has unsupported version {version}");
        return None;
    }
    pos += 1;

    let header = FixedHeader::from_bytes(buf.get(pos..pos + FIXED_HEADER_LEN)?)?;
    pos += FIXED_HEADER_LEN;

    let json_len = BigEndian::read_u32(buf.get(pos..pos + 4)?) as usize;
    pos += 4;
    let json = buf.get(pos..pos.checked_add(json_len)?)?;
    let metadata: Metadata = match serde_json::from_slice(json) {
        Ok(m) => m,
        Err(e) => {
            debug!("packet at {offset} has unreadable metadata: {e}");
            return None;
        }
    };
    pos += json_len;

    if buf.get(pos..pos + SEPARATOR.len())? != SEPARATOR {
        debug!("packet at {offset} misses the separator");
        return None;
    }
    pos += SEPARATOR.len();

    if !header.agrees_with(&metadata) {
        debug!(
            "packet at {offset}: fixed header says {} bytes, metadata says {}",
            header.length, metadata.original_size
        );
        return None;
    }

    let size = usize::try_from(metadata.original_size).ok()?;
    let payload = buf.get(pos..pos.checked_add(size)?)?;
    pos += size;

    let end_marker = buf.get(pos..pos + END_MARKER.len()) == Some(&END_MARKER[..]);

    Some(ParsedPacket {
        offset,
        header,
        metadata,
        payload,
        end: pos,
        end_marker,
    })
}

/// The last structurally valid packet that is not part of another packet's payload.
///
/// Hiding into a carrier that already holds a packet appends the new packet behind
/// the old one, so the last one wins. Magics inside a packet's payload belong to a
/// nested carrier and are skipped, as are accidental ones that do not parse.
pub fn find(buf: &[u8]) -> Option<ParsedPacket<'_>> {
    let mut last = None;
    let mut from = 0;
    while let Some(offset) = scan::find(buf, MAGIC, from) {
        match parse_at(buf, offset) {
            Some(packet) => {
                from = packet.end;
                if let Some(ParsedPacket { offset: prev, .. }) = last.replace(packet) {
                    debug!("packet at {prev} is superseded by the one at {offset}");
                }
            }
            None => {
                debug!("skipping magic at {offset}, no valid packet");
                from = offset + 1;
            }
        }
    }
    last
}
