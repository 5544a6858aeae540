//! Finds where the carrier image ends and treats everything behind it as payload.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use hex_literal::hex;

use super::{ExtractOptions, Extraction, Recover};
use crate::result::Result;

const PNG_SIGNATURE: [u8; 8] = hex!("89504E470D0A1A0A");

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: u8 = 0xD9;
const JPEG_SOS: u8 = 0xDA;
const JPEG_TEM: u8 = 0x01;
const JPEG_RST: std::ops::RangeInclusive<u8> = 0xD0..=0xD7;

/// Payloads appended behind a recognizable end of image, or behind zero padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownTrailer;

impl Recover for KnownTrailer {
    fn name(&self) -> &'static str {
        "known trailer"
    }

    fn recover(&self, carrier: &[u8], opts: &ExtractOptions) -> Result<Option<Extraction>> {
        let end = image_end(carrier).or_else(|| zero_run_end(carrier, opts.zero_run));

        Ok(end
            .filter(|end| *end < carrier.len())
            .map(|end| Extraction::unframed(&carrier[end..], (*self).into())))
    }
}

/// Offset right behind the image, for the formats whose end can be found.
pub fn image_end(data: &[u8]) -> Option<usize> {
    if data.starts_with(&PNG_SIGNATURE) {
        png_end(data)
    } else if data.starts_with(&JPEG_SOI) {
        jpeg_end(data)
    } else if data.starts_with(b"BM") {
        bmp_end(data)
    } else if data.starts_with(b"GIF8") {
        gif_end(data)
    } else {
        None
    }
}

/// Walks the chunks up to and including `IEND` and its crc.
fn png_end(data: &[u8]) -> Option<usize> {
    let mut pos = PNG_SIGNATURE.len();
    loop {
        let len = BigEndian::read_u32(data.get(pos..pos + 4)?) as usize;
        let chunk_type = data.get(pos + 4..pos + 8)?;
        // length, type, data, crc
        let next = pos.checked_add(12)?.checked_add(len)?;
        if chunk_type == b"IEND" {
            return (next <= data.len()).then_some(next);
        }
        pos = next;
    }
}

/// Walks the marker segments, skipping entropy coded data, until `EOI`.
///
/// Thumbnails in APP segments carry their own `EOI` and are skipped as a whole.
fn jpeg_end(data: &[u8]) -> Option<usize> {
    let mut pos = JPEG_SOI.len();
    loop {
        if *data.get(pos)? != 0xFF {
            return None;
        }
        // fill bytes
        while *data.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            JPEG_EOI => return Some(pos),
            JPEG_TEM => {}
            m if JPEG_RST.contains(&m) => {}
            m => {
                let len = BigEndian::read_u16(data.get(pos..pos + 2)?) as usize;
                if len < 2 {
                    return None;
                }
                pos += len;
                if m == JPEG_SOS {
                    pos = skip_entropy_data(data, pos)?;
                }
            }
        }
    }
}

/// Position of the next real marker, stuffed `FF 00` and restart markers are data.
fn skip_entropy_data(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let ff = pos + data.get(pos..)?.iter().position(|b| *b == 0xFF)?;
        let next = *data.get(ff + 1)?;
        if next == 0x00 || JPEG_RST.contains(&next) {
            pos = ff + 2;
        } else {
            return Some(ff);
        }
    }
}

/// The file size field of the bitmap file header.
fn bmp_end(data: &[u8]) -> Option<usize> {
    let size = LittleEndian::read_u32(data.get(2..6)?) as usize;
    (size >= 26 && size <= data.len()).then_some(size)
}

const GIF_EXTENSION: u8 = 0x21;
const GIF_IMAGE: u8 = 0x2C;
const GIF_TRAILER: u8 = 0x3B;

/// Walks the blocks behind the logical screen descriptor up to the trailer.
fn gif_end(data: &[u8]) -> Option<usize> {
    let mut pos = 13 + color_table_len(*data.get(10)?);
    loop {
        match *data.get(pos)? {
            GIF_TRAILER => return Some(pos + 1),
            GIF_EXTENSION => pos = skip_sub_blocks(data, pos + 2)?,
            GIF_IMAGE => {
                let packed = *data.get(pos + 9)?;
                // descriptor, local color table, LZW minimum code size
                pos = skip_sub_blocks(data, pos + 10 + color_table_len(packed) + 1)?;
            }
            _ => return None,
        }
    }
}

fn color_table_len(packed: u8) -> usize {
    if packed & 0x80 == 0 {
        0
    } else {
        3 << ((packed & 0x07) + 1)
    }
}

/// Position behind the zero length block that terminates a run of data sub-blocks.
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let len = *data.get(pos)? as usize;
        pos += 1 + len;
        if len == 0 {
            return Some(pos);
        }
    }
}

/// End of the last run of at least `min_run` zero bytes that still has data behind it.
fn zero_run_end(data: &[u8], min_run: usize) -> Option<usize> {
    if min_run == 0 {
        return None;
    }

    let mut best = None;
    let mut run = 0;
    for (i, b) in data.iter().enumerate() {
        if *b == 0 {
            run += 1;
        } else {
            if run >= min_run {
                best = Some(i);
            }
            run = 0;
        }
    }

    best
}
