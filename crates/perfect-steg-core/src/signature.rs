//! Ordered table of file signatures (magic byte prefixes).
//!
//! Lookups are first match in table order. Several prefixes are ambiguous, `50 4B 03 04`
//! starts every ZIP, APK and Office document alike, so longer and more specific entries
//! must come before the short generic ones. Two byte prefixes are last.

use hex_literal::hex;
use serde::{Deserialize, Serialize};

use crate::scan;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Coarse kind of a file, used to pick a delivery channel for a restored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Audio,
    Video,
    Document,
    Archive,
    Other,
}

impl FileKind {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        match mime.split('/').next().unwrap_or_default() {
            "image" => FileKind::Image,
            "audio" => FileKind::Audio,
            "video" => FileKind::Video,
            "text" => FileKind::Document,
            _ => match mime.as_str() {
                "application/zip"
                | "application/gzip"
                | "application/x-7z-compressed"
                | "application/vnd.rar" => FileKind::Archive,
                m if m == "application/pdf"
                    || m == "application/rtf"
                    || m == "application/xml"
                    || m == "application/msword"
                    || m == "application/epub+zip"
                    || m.starts_with("application/vnd.openxmlformats")
                    || m.starts_with("application/vnd.oasis.opendocument") =>
                {
                    FileKind::Document
                }
                _ => FileKind::Other,
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Signature {
    pub prefix: &'static [u8],
    pub mime_type: &'static str,
    pub kind: FileKind,
    pub extension: &'static str,
}

impl Signature {
    pub fn matches(&self, data: &[u8]) -> bool {
        data.starts_with(self.prefix)
    }
}

macro_rules! sig {
    ($hex:literal, $mime:expr, $kind:ident, $ext:literal) => {
        Signature {
            prefix: &hex!($hex),
            mime_type: $mime,
            kind: FileKind::$kind,
            extension: $ext,
        }
    };
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The table order is part of the contract, do not sort it.
pub static SIGNATURES: &[Signature] = &[
    sig!("89504E470D0A1A0A", "image/png", Image, "png"),
    sig!("D0CF11E0A1B11AE1", "application/msword", Document, "doc"),
    // zip version 2.0 with flags 0x0006, as written by office suites
    sig!("504B030414000600", DOCX_MIME, Document, "docx"),
    sig!("0000001866747970", "video/mp4", Video, "mp4"),
    sig!("0000001C66747970", "video/mp4", Video, "mp4"),
    sig!("0000002066747970", "video/mp4", Video, "mp4"),
    sig!("377ABCAF271C", "application/x-7z-compressed", Archive, "7z"),
    sig!("526172211A07", "application/vnd.rar", Archive, "rar"),
    sig!("474946383961", "image/gif", Image, "gif"),
    sig!("474946383761", "image/gif", Image, "gif"),
    sig!("7B5C72746631", "application/rtf", Document, "rtf"),
    sig!("3C3F786D6C20", "application/xml", Document, "xml"),
    sig!("255044462D", "application/pdf", Document, "pdf"),
    sig!("504B0304", "application/zip", Archive, "zip"),
    sig!("504B0506", "application/zip", Archive, "zip"),
    sig!("504B0708", "application/zip", Archive, "zip"),
    sig!("1A45DFA3", "video/webm", Video, "webm"),
    sig!("4F676753", "audio/ogg", Audio, "ogg"),
    sig!("664C6143", "audio/flac", Audio, "flac"),
    sig!("52494646", "audio/wav", Audio, "wav"),
    sig!("49492A00", "image/tiff", Image, "tif"),
    sig!("4D4D002A", "image/tiff", Image, "tif"),
    sig!("7F454C46", "application/x-elf", Other, "elf"),
    sig!("FFD8FF", "image/jpeg", Image, "jpg"),
    sig!("494433", "audio/mpeg", Audio, "mp3"),
    sig!("1F8B08", "application/gzip", Archive, "gz"),
    sig!("FFFB", "audio/mpeg", Audio, "mp3"),
    sig!("FFF3", "audio/mpeg", Audio, "mp3"),
    sig!("FFF2", "audio/mpeg", Audio, "mp3"),
    sig!("424D", "image/bmp", Image, "bmp"),
    sig!("4D5A", "application/vnd.microsoft.portable-executable", Other, "exe"),
];

/// First table entry whose prefix starts `data`.
pub fn sniff(data: &[u8]) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|s| s.matches(data))
}

/// MIME type of `data`, `application/octet-stream` when nothing matches.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    sniff(data).map(|s| s.mime_type).unwrap_or(OCTET_STREAM)
}

/// First entry, in table order, with an occurrence strictly after `from`.
/// Returns the offset of that entry's first such occurrence.
pub fn find_after(data: &[u8], from: usize) -> Option<(usize, &'static Signature)> {
    SIGNATURES
        .iter()
        .find_map(|s| scan::find(data, s.prefix, from + 1).map(|pos| (pos, s)))
}

/// MIME type for a file name, based on its extension.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = extension_of(name)?;
    let mime = match ext.as_str() {
        "docx" => DOCX_MIME,
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "epub" => "application/epub+zip",
        "txt" => "text/plain",
        "jpeg" => "image/jpeg",
        "tiff" => "image/tiff",
        "mov" => "video/quicktime",
        "m4a" => "audio/mp4",
        other => SIGNATURES.iter().find(|s| s.extension == other)?.mime_type,
    };

    Some(mime)
}

/// Upper case hex of the first four bytes, the `fileSignature` of a payload.
pub fn file_signature(data: &[u8]) -> String {
    hex::encode_upper(&data[..data.len().min(4)])
}

/// Lower case extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_never_shadow_a_later_entry() {
        for (i, earlier) in SIGNATURES.iter().enumerate() {
            for later in &SIGNATURES[i + 1..] {
                assert!(
                    !later.prefix.starts_with(earlier.prefix),
                    "{:X?} can never match, {:X?} comes first",
                    later.prefix,
                    earlier.prefix
                );
            }
        }
    }

    #[test]
    fn should_prefer_specific_over_generic_zip() {
        let office = hex!("504B03041400060008000000");
        let plain = hex!("504B03040A00000000000000");

        assert_eq!(sniff(&office).unwrap().extension, "docx");
        assert_eq!(sniff(&plain).unwrap().extension, "zip");
    }

    #[test]
    fn should_sniff_common_formats() {
        assert_eq!(sniff_mime(&hex!("89504E470D0A1A0A0000")), "image/png");
        assert_eq!(sniff_mime(&hex!("FFD8FFE000104A46")), "image/jpeg");
        assert_eq!(sniff_mime(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_mime(b"ID3\x04\x00"), "audio/mpeg");
        assert_eq!(sniff_mime(b"BM\x00\x00"), "image/bmp");
        assert_eq!(sniff_mime(b"hello"), OCTET_STREAM);
        assert_eq!(sniff_mime(b""), OCTET_STREAM);
    }

    #[test]
    fn should_find_signature_past_offset_in_table_order() {
        let mut data = vec![0x11; 100];
        data.extend_from_slice(b"%PDF-1.4");
        data.extend_from_slice(&hex!("89504E470D0A1A0A"));

        let (pos, s) = find_after(&data, 50).unwrap();
        assert_eq!(s.mime_type, "image/png");
        assert_eq!(pos, 108);

        assert!(find_after(&data, 200).is_none());
    }

    #[test]
    fn should_map_mime_to_kind() {
        assert_eq!(FileKind::from_mime("image/png"), FileKind::Image);
        assert_eq!(FileKind::from_mime("audio/mpeg"), FileKind::Audio);
        assert_eq!(FileKind::from_mime("video/mp4"), FileKind::Video);
        assert_eq!(FileKind::from_mime(DOCX_MIME), FileKind::Document);
        assert_eq!(FileKind::from_mime("application/zip"), FileKind::Archive);
        assert_eq!(FileKind::from_mime(OCTET_STREAM), FileKind::Other);
    }

    #[test]
    fn should_resolve_names() {
        assert_eq!(mime_for_name("report.PDF"), Some("application/pdf"));
        assert_eq!(mime_for_name("notes.txt"), Some("text/plain"));
        assert_eq!(mime_for_name("slides.pptx").map(FileKind::from_mime), Some(FileKind::Document));
        assert_eq!(mime_for_name("noext"), None);
        assert_eq!(mime_for_name(".hidden"), None);
        assert_eq!(file_signature(b"%PDF-1.4"), "25504446");
        assert_eq!(file_signature(b"ab"), "6162");
    }
}
