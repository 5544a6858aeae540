//! Last ditch repairs of archives that no longer open.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use hex_literal::hex;
use log::{debug, warn};
use zip::read::read_zipfile_from_stream;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::scan;

/// End of central directory record.
pub const EOCD_SIGNATURE: [u8; 4] = hex!("504B0506");
const EOCD_LEN: usize = 22;
const EOCD_COMMENT_LEN: std::ops::Range<usize> = 20..22;

/// How far from the end an intact archive keeps its end of central directory record.
pub const EOCD_WINDOW: usize = 1000;

pub fn has_end_signature(data: &[u8]) -> bool {
    scan::ends_within(data, &EOCD_SIGNATURE, EOCD_WINDOW)
}

/// Cuts off whatever follows the last end of central directory record.
///
/// `None` when there is no complete record at all.
pub fn repair_end_signature(data: &[u8]) -> Option<Vec<u8>> {
    let offset = scan::rfind(data, &EOCD_SIGNATURE)?;
    let record_end = offset + EOCD_LEN;
    if record_end > data.len() {
        return None;
    }

    let comment_len =
        LittleEndian::read_u16(&data[offset + EOCD_COMMENT_LEN.start..offset + EOCD_COMMENT_LEN.end])
            as usize;
    // a comment running past the buffer is dropped along with the junk
    let end = match record_end + comment_len {
        end if end <= data.len() => end,
        _ => record_end,
    };
    debug!("truncating archive from {} to {end} bytes", data.len());

    Some(data[..end].to_vec())
}

/// Streams the local file headers and copies every readable entry into a fresh archive.
///
/// Only the first entry of a name is kept, later ones stem from appended or damaged
/// archives. `None` when not a single entry could be copied.
pub fn rebuild(data: &[u8]) -> Option<Vec<u8>> {
    let mut reader = Cursor::new(data);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen = HashSet::new();
    let mut copied = 0;
    let mut dropped = 0;
    loop {
        let mut file = match read_zipfile_from_stream(&mut reader) {
            Ok(Some(file)) => file,
            Ok(None) => break,
            Err(e) => {
                debug!("stopped reading local headers: {e}");
                break;
            }
        };

        let name = file.name().to_owned();
        if !seen.insert(name.clone()) {
            warn!("dropping repeated entry {name}");
            dropped += 1;
            continue;
        }

        let is_dir = file.is_dir();
        let copy = if is_dir {
            zip.add_directory(name.as_str(), options)
        } else {
            copy_entry(&mut file, &mut zip, &name, options)
        };
        match copy {
            Ok(()) if is_dir => {}
            Ok(()) => copied += 1,
            Err(e) => {
                warn!("dropping unreadable entry {name}: {e}");
                dropped += 1;
            }
        }
    }

    if copied == 0 {
        return None;
    }
    debug!("rebuilt archive with {copied} entries, {dropped} dropped");

    match zip.finish() {
        Ok(rebuilt) => Some(rebuilt.into_inner()),
        Err(e) => {
            warn!("could not finish the rebuilt archive: {e}");
            None
        }
    }
}

fn copy_entry(
    file: &mut impl Read,
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    options: SimpleFileOptions,
) -> ZipResult<()> {
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    zip.start_file(name, options)?;
    zip.write_all(&content)?;
    Ok(())
}
