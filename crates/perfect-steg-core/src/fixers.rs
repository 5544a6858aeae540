//! Checks and light repairs of recovered payloads, picked by file extension.
//!
//! Every fixer hands back its input borrowed when there is nothing to fix, and
//! applying one twice changes nothing.

use std::borrow::Cow;

use log::{debug, warn};

use crate::scan;
use crate::signature::extension_of;

const PDF_HEADER: &[u8] = b"%PDF-";
const PDF_EOF: &[u8] = b"%%EOF";
const PDF_EOF_WINDOW: usize = 1024;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn fix_by_extension<'a>(data: &'a [u8], name: &str) -> Cow<'a, [u8]> {
    match extension_of(name).as_deref() {
        Some("pdf") => fix_pdf(data),
        Some("jpg" | "jpeg") => fix_jpeg(data),
        Some("png") => check_png(data),
        Some("mp3") => check_mp3(data),
        Some("mp4" | "m4a" | "mov") => check_mp4(data),
        _ => Cow::Borrowed(data),
    }
}

/// Appends an `%%EOF` marker when the trailing kilobyte lacks one.
pub fn fix_pdf(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.starts_with(PDF_HEADER) {
        warn!("pdf does not start with a pdf header, leaving it alone");
        return Cow::Borrowed(data);
    }
    if scan::ends_within(data, PDF_EOF, PDF_EOF_WINDOW) {
        return Cow::Borrowed(data);
    }

    debug!("pdf lacks its eof marker, appending one");
    let mut fixed = data.to_vec();
    fixed.extend_from_slice(b"\n%%EOF\n");
    Cow::Owned(fixed)
}

/// Appends an end of image marker when the data does not end with one.
pub fn fix_jpeg(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.starts_with(&JPEG_SOI) {
        warn!("jpeg does not start with a start of image marker, leaving it alone");
        return Cow::Borrowed(data);
    }
    if data.ends_with(&JPEG_EOI) {
        return Cow::Borrowed(data);
    }

    debug!("jpeg lacks its end of image marker, appending one");
    let mut fixed = data.to_vec();
    fixed.extend_from_slice(&JPEG_EOI);
    Cow::Owned(fixed)
}

pub fn check_png(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.starts_with(&PNG_SIGNATURE) {
        warn!("png does not start with a png signature");
    } else if !scan::ends_within(data, b"IEND", 12) {
        warn!("png does not end with an IEND chunk, it may be truncated");
    }
    Cow::Borrowed(data)
}

pub fn check_mp3(data: &[u8]) -> Cow<'_, [u8]> {
    let head = &data[..data.len().min(1000)];
    let synced = head.starts_with(b"ID3")
        || head
            .windows(2)
            .any(|w| w[0] == 0xFF && w[1] & 0xE0 == 0xE0);
    if !synced {
        warn!("mp3 has no frame sync in its first 1000 bytes");
    }
    Cow::Borrowed(data)
}

pub fn check_mp4(data: &[u8]) -> Cow<'_, [u8]> {
    let head = &data[..data.len().min(100)];
    if scan::find(head, b"ftyp", 0).is_none() {
        warn!("mp4 has no ftyp box in its first 100 bytes");
    }
    Cow::Borrowed(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_terminate_pdfs_once() {
        let fixed = fix_pdf(b"%PDF-1.4 body");
        assert_eq!(&fixed[..], b"%PDF-1.4 body\n%%EOF\n");
        assert!(matches!(fix_pdf(&fixed), Cow::Borrowed(_)));

        assert!(matches!(fix_pdf(b"%PDF-1.4 body %%EOF"), Cow::Borrowed(_)));
        assert!(matches!(fix_pdf(b"not a pdf"), Cow::Borrowed(_)));
    }

    #[test]
    fn should_look_for_the_pdf_eof_in_the_last_kilobyte_only() {
        let mut pdf = b"%PDF-1.4 %%EOF".to_vec();
        pdf.extend_from_slice(&[b' '; 2000]);
        assert!(matches!(fix_pdf(&pdf), Cow::Owned(_)));
    }

    #[test]
    fn should_terminate_jpegs_once() {
        let fixed = fix_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0, 0x01]);
        assert_eq!(&fixed[..], b"\xFF\xD8\xFF\xE0\x01\xFF\xD9");
        assert!(matches!(fix_jpeg(&fixed), Cow::Borrowed(_)));
        assert!(matches!(fix_jpeg(b"GIF89a"), Cow::Borrowed(_)));
    }

    #[test]
    fn should_only_inspect_media() {
        assert!(matches!(check_png(&PNG_SIGNATURE), Cow::Borrowed(_)));
        assert!(matches!(check_mp3(b"no sync"), Cow::Borrowed(_)));
        assert!(matches!(check_mp4(b"\0\0\0\x18ftypmp42"), Cow::Borrowed(_)));
    }

    #[test]
    fn should_dispatch_by_extension() {
        assert_eq!(fix_by_extension(b"%PDF-1.7", "Report.PDF").len(), 8 + 7);
        assert_eq!(fix_by_extension(&[0xFF, 0xD8], "a.jpeg").len(), 4);
        assert_eq!(fix_by_extension(b"%PDF-1.7", "notes.txt").len(), 8);
        assert_eq!(fix_by_extension(b"%PDF-1.7", "no_extension").len(), 8);
    }
}
