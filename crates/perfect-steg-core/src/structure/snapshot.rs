use std::io::Cursor;

use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::metadata::{now_millis, sha256_hex};
use crate::result::Result;
use crate::signature::extension_of;

/// Listing of an archive taken before hiding it.
///
/// Travels in the packet metadata. The checksum only tells whether the archive drifted
/// on its way, the snapshot is never used to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSnapshot {
    pub original_name: String,
    pub original_size: u64,
    pub entry_count: usize,
    pub entries: Vec<EntrySnapshot>,
    pub is_office: bool,
    pub timestamp: u64,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub is_directory: bool,
}

impl ArchiveSnapshot {
    pub fn take(buffer: &[u8], name: &str) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(buffer))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            // raw, so encrypted entries can be listed too
            let file = zip.by_index_raw(i)?;
            entries.push(EntrySnapshot {
                name: file.name().to_owned(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                is_directory: file.is_dir(),
            });
        }

        Ok(Self {
            original_name: name.to_owned(),
            original_size: buffer.len() as u64,
            entry_count: entries.len(),
            entries,
            is_office: OfficeKind::from_name(name).is_some(),
            timestamp: now_millis(),
            checksum: sha256_hex(buffer),
        })
    }

    /// Required entries of the office format that the archive lacks.
    pub fn missing_entries(&self) -> Vec<&'static str> {
        match OfficeKind::from_name(&self.original_name) {
            Some(kind) => kind.missing(self.entries.iter().map(|e| e.name.as_str())),
            None => Vec::new(),
        }
    }
}

/// Archive based document formats, and the entries each of them cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeKind {
    Docx,
    Xlsx,
    Pptx,
    Odt,
    Epub,
}

impl OfficeKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match extension_of(name)?.as_str() {
            "docx" => Some(OfficeKind::Docx),
            "xlsx" => Some(OfficeKind::Xlsx),
            "pptx" => Some(OfficeKind::Pptx),
            "odt" => Some(OfficeKind::Odt),
            "epub" => Some(OfficeKind::Epub),
            _ => None,
        }
    }

    /// A trailing `/` stands for any entry below that folder.
    pub fn required_entries(self) -> &'static [&'static str] {
        match self {
            OfficeKind::Docx => &["word/", "[Content_Types].xml", "_rels/.rels"],
            OfficeKind::Xlsx => &["xl/", "[Content_Types].xml", "_rels/.rels"],
            OfficeKind::Pptx => &["ppt/", "[Content_Types].xml", "_rels/.rels"],
            OfficeKind::Odt => &["mimetype", "content.xml", "META-INF/manifest.xml"],
            OfficeKind::Epub => &["mimetype", "META-INF/container.xml"],
        }
    }

    pub fn missing<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
        let names: Vec<&str> = names.into_iter().collect();

        self.required_entries()
            .iter()
            .copied()
            .filter(|required| {
                !names.iter().any(|name| {
                    *name == *required || (required.ends_with('/') && name.starts_with(required))
                })
            })
            .collect()
    }
}
