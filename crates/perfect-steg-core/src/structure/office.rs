//! Validation and repair of ZIP based payloads, office documents in particular.

use std::borrow::Cow;
use std::io::{Cursor, Read, Write};

use log::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::repair;
use super::OfficeKind;
use crate::result::Result;

/// Upper bound of text carried over into a replacement document.
const MAX_RECOVERED_TEXT: usize = 64 * 1024;
/// Shorter runs of printable characters are considered noise.
const MIN_TEXT_RUN: usize = 8;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_TAIL: &str = "</w:body></w:document>";

/// Returns an archive that opens, as close to `buffer` as possible.
///
/// 1. Junk behind the end of central directory record is cut off.
/// 2. An archive that still does not open is rebuilt from its local file headers.
/// 3. A `.docx` that is unusable after that, or lacks required entries, is replaced
///    by a minimal document holding whatever text could be salvaged. Other formats
///    are handed back as they are.
pub fn fix_archive(buffer: &[u8], name: &str) -> Result<Vec<u8>> {
    let kind = OfficeKind::from_name(name);

    let mut candidate = Cow::Borrowed(buffer);
    if !repair::has_end_signature(buffer) {
        if let Some(truncated) = repair::repair_end_signature(buffer) {
            info!("{name}: removed {} trailing bytes", buffer.len() - truncated.len());
            candidate = Cow::Owned(truncated);
        }
    }

    let names = match entry_names(&candidate) {
        Ok(names) => Some(names),
        Err(e) => {
            warn!("{name} does not open as an archive ({e}), rebuilding");
            match repair::rebuild(&candidate) {
                Some(rebuilt) => {
                    candidate = Cow::Owned(rebuilt);
                    entry_names(&candidate).ok()
                }
                None => None,
            }
        }
    };

    let Some(names) = names else {
        return match kind {
            Some(OfficeKind::Docx) => {
                warn!("{name} is beyond repair, replacing it by a minimal document");
                minimal_docx(&recover_text(buffer))
            }
            _ => {
                warn!("{name} is beyond repair, keeping it as it is");
                Ok(buffer.to_vec())
            }
        };
    };

    let Some(kind) = kind else {
        return Ok(candidate.into_owned());
    };

    let missing = kind.missing(names.iter().map(String::as_str));
    if missing.is_empty() {
        return Ok(candidate.into_owned());
    }

    if kind == OfficeKind::Docx {
        warn!("{name} lacks {missing:?}, replacing it by a minimal document");
        minimal_docx(&recover_text(&candidate))
    } else {
        warn!("{name} lacks {missing:?}, keeping it as it is");
        Ok(candidate.into_owned())
    }
}

fn entry_names(data: &[u8]) -> Result<Vec<String>> {
    let zip = ZipArchive::new(Cursor::new(data))?;
    Ok(zip.file_names().map(str::to_owned).collect())
}

/// A word processing document with one paragraph per line of `text`.
pub fn minimal_docx(text: &str) -> Result<Vec<u8>> {
    let mut document = String::from(DOCUMENT_HEAD);
    for line in text.lines() {
        document.push_str(r#"<w:p><w:r><w:t xml:space="preserve">"#);
        document.push_str(&xml_escape(line));
        document.push_str("</w:t></w:r></w:p>");
    }
    if text.lines().next().is_none() {
        document.push_str("<w:p/>");
    }
    document.push_str(DOCUMENT_TAIL);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (entry, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(entry, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// The document text if `word/document.xml` can still be read, otherwise the first
/// readable run of UTF-8 text in the raw bytes.
pub fn recover_text(data: &[u8]) -> String {
    if let Some(text) = document_text(data) {
        return text;
    }

    String::from_utf8_lossy(data)
        .split(|c: char| c == char::REPLACEMENT_CHARACTER || (c.is_control() && !c.is_whitespace()))
        .map(str::trim)
        .find(|run| run.chars().count() >= MIN_TEXT_RUN)
        .map(|run| run.chars().take(MAX_RECOVERED_TEXT).collect())
        .unwrap_or_default()
}

fn document_text(data: &[u8]) -> Option<String> {
    let mut zip = ZipArchive::new(Cursor::new(data)).ok()?;
    let mut xml = String::new();
    zip.by_name("word/document.xml")
        .ok()?
        .read_to_string(&mut xml)
        .ok()?;

    let mut text = String::new();
    let mut tag = String::new();
    let mut in_tag = false;
    for c in xml.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if tag == "/w:p" {
                    text.push('\n');
                }
            }
            c if in_tag => tag.push(c),
            c => text.push(c),
        }
    }

    let text = xml_unescape(text.trim());
    (!text.is_empty()).then(|| text.chars().take(MAX_RECOVERED_TEXT).collect())
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
