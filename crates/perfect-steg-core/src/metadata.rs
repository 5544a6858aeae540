//! The two descriptions of a hidden payload that travel inside every packet:
//! the JSON [`Metadata`] block and the fixed 128 byte [`FixedHeader`].

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::signature;

/// Open set of extension fields, serialized next to the named fields.
pub type Extensions = BTreeMap<String, Value>;

/// Extension key marking a payload whose structure was snapshotted before hiding.
pub const IS_SPECIAL: &str = "isSpecial";
/// Extension key holding the [`crate::structure::ArchiveSnapshot`].
pub const ARCHIVE_SNAPSHOT: &str = "archive";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub original_size: u64,
    pub original_type: String,
    pub original_name: String,
    pub timestamp: u64,
    pub checksum: String,
    pub mime_type: String,
    pub file_signature: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Metadata {
    /// Describes `payload`, then lets `extra` override the descriptive fields.
    ///
    /// `checksum` and `originalSize` always describe `payload`, whatever `extra` says.
    /// Overrides of the wrong type are dropped. Keys that do not name a field land in
    /// [`Metadata::extensions`].
    pub fn describe(payload: &[u8], payload_type: &str, payload_name: &str, extra: Extensions) -> Self {
        let mut meta = Self {
            original_size: payload.len() as u64,
            original_type: payload_type.to_owned(),
            original_name: payload_name.to_owned(),
            timestamp: now_millis(),
            checksum: sha256_hex(payload),
            mime_type: signature::sniff_mime(payload).to_owned(),
            file_signature: signature::file_signature(payload),
            extensions: Extensions::new(),
        };

        for (key, value) in extra {
            if let Some(value) = meta.apply(&key, value) {
                meta.extensions.insert(key, value);
            }
        }

        meta
    }

    /// Hands `value` back when `key` does not override a field.
    fn apply(&mut self, key: &str, value: Value) -> Option<Value> {
        match (key, value) {
            ("originalSize" | "checksum", _) => None,
            ("originalType", Value::String(s)) => {
                self.original_type = s;
                None
            }
            ("originalName", Value::String(s)) => {
                self.original_name = s;
                None
            }
            ("mimeType", Value::String(s)) => {
                self.mime_type = s;
                None
            }
            ("fileSignature", Value::String(s)) => {
                self.file_signature = s;
                None
            }
            ("timestamp", Value::Number(n)) if n.is_u64() => {
                self.timestamp = n.as_u64().unwrap_or(self.timestamp);
                None
            }
            (
                "originalType" | "originalName" | "mimeType" | "fileSignature" | "timestamp",
                value,
            ) => {
                log::debug!("ignoring metadata override {key}={value}, wrong type");
                None
            }
            (_, value) => Some(value),
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self.extensions.get(IS_SPECIAL), Some(Value::Bool(true)))
    }

    pub fn extension<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extensions
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub const FIXED_HEADER_LEN: usize = 128;

const TYPE_FIELD: std::ops::Range<usize> = 0..20;
const NAME_FIELD: std::ops::Range<usize> = 20..50;
const LENGTH_FIELD: std::ops::Range<usize> = 70..78;
const TIMESTAMP_FIELD: std::ops::Range<usize> = 78..86;
const SIGNATURE_FIELD: std::ops::Range<usize> = 86..96;
const CRC_FIELD: std::ops::Range<usize> = 96..100;

/// Compact duplicate of the metadata, readable without any JSON parsing.
///
/// ```text
///   0..20  type, utf-8, zero padded
///  20..50  name, utf-8, zero padded
///  50..70  reserved
///  70..78  payload length, u64 BE
///  78..86  timestamp in ms, u64 BE
///  86..96  file signature, ascii hex, zero padded
///  96..100 crc32 of the payload, u32 BE
/// 100..128 reserved
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHeader {
    pub payload_type: String,
    pub name: String,
    pub length: u64,
    pub timestamp: u64,
    pub file_signature: String,
    pub crc32: u32,
}

impl FixedHeader {
    pub fn new(payload: &[u8], meta: &Metadata) -> Self {
        Self {
            payload_type: meta.original_type.clone(),
            name: meta.original_name.clone(),
            length: payload.len() as u64,
            timestamp: meta.timestamp,
            file_signature: meta.file_signature.clone(),
            crc32: crc32fast::hash(payload),
        }
    }

    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_LEN] {
        let mut buf = [0u8; FIXED_HEADER_LEN];
        put_str(&mut buf[TYPE_FIELD], &self.payload_type);
        put_str(&mut buf[NAME_FIELD], &self.name);
        BigEndian::write_u64(&mut buf[LENGTH_FIELD], self.length);
        BigEndian::write_u64(&mut buf[TIMESTAMP_FIELD], self.timestamp);
        put_str(&mut buf[SIGNATURE_FIELD], &self.file_signature);
        BigEndian::write_u32(&mut buf[CRC_FIELD], self.crc32);
        buf
    }

    /// `None` if `buf` is shorter than [`FIXED_HEADER_LEN`].
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < FIXED_HEADER_LEN {
            return None;
        }

        Some(Self {
            payload_type: get_str(&buf[TYPE_FIELD]),
            name: get_str(&buf[NAME_FIELD]),
            length: BigEndian::read_u64(&buf[LENGTH_FIELD]),
            timestamp: BigEndian::read_u64(&buf[TIMESTAMP_FIELD]),
            file_signature: get_str(&buf[SIGNATURE_FIELD]),
            crc32: BigEndian::read_u32(&buf[CRC_FIELD]),
        })
    }

    /// Both descriptions have to agree on the payload length.
    pub fn agrees_with(&self, meta: &Metadata) -> bool {
        self.length == meta.original_size
    }
}

/// Writes as much of `s` as fits, never splitting a character.
fn put_str(field: &mut [u8], s: &str) {
    let mut end = s.len().min(field.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    field[..end].copy_from_slice(&s.as_bytes()[..end]);
}

fn get_str(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extra(v: Value) -> Extensions {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn should_describe_the_payload() {
        let meta = Metadata::describe(b"%PDF-1.4 body", "document", "a.pdf", Extensions::new());

        assert_eq!(meta.original_size, 13);
        assert_eq!(meta.mime_type, "application/pdf");
        assert_eq!(meta.file_signature, "25504446");
        assert_eq!(meta.checksum, sha256_hex(b"%PDF-1.4 body"));
        assert_eq!(meta.checksum.len(), 64);
        assert!(meta.timestamp > 0);
    }

    #[test]
    fn should_let_extra_override_all_but_checksum_and_size() {
        let meta = Metadata::describe(
            b"hello",
            "file",
            "a.bin",
            extra(json!({
                "checksum": "00",
                "originalSize": 1,
                "mimeType": "text/plain",
                "originalName": "b.txt",
                "timestamp": 42,
                "isSpecial": true,
                "author": "bob",
            })),
        );

        assert_eq!(meta.checksum, sha256_hex(b"hello"));
        assert_eq!(meta.original_size, 5);
        assert_eq!(meta.mime_type, "text/plain");
        assert_eq!(meta.original_name, "b.txt");
        assert_eq!(meta.timestamp, 42);
        assert!(meta.is_special());
        assert_eq!(meta.extension::<String>("author").as_deref(), Some("bob"));
    }

    #[test]
    fn should_drop_mistyped_overrides() {
        let meta = Metadata::describe(b"x", "file", "x", extra(json!({ "timestamp": "yesterday" })));

        assert_ne!(meta.timestamp, 0);
        assert!(meta.extensions.is_empty());

        let json = serde_json::to_vec(&meta).unwrap();
        assert_eq!(serde_json::from_slice::<Metadata>(&json).unwrap(), meta);
    }

    #[test]
    fn should_serialize_camel_case_with_flat_extensions() {
        let meta = Metadata::describe(b"x", "file", "x.bin", extra(json!({ "isSpecial": false })));
        let v: Value = serde_json::to_value(&meta).unwrap();

        assert_eq!(v["originalSize"], 1);
        assert_eq!(v["originalName"], "x.bin");
        assert_eq!(v["isSpecial"], false);

        let back: Metadata = serde_json::from_value(v).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn should_lay_out_the_fixed_header() {
        let meta = Metadata::describe(b"hello", "file", "name.bin", Extensions::new());
        let header = FixedHeader::new(b"hello", &meta);
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], b"file");
        assert_eq!(bytes[4], 0);
        assert_eq!(&bytes[20..28], b"name.bin");
        assert_eq!(BigEndian::read_u64(&bytes[70..78]), 5);
        assert_eq!(&bytes[86..94], b"68656C6C");
        assert_eq!(BigEndian::read_u32(&bytes[96..100]), crc32fast::hash(b"hello"));
        assert!(bytes[100..].iter().all(|b| *b == 0));

        assert_eq!(FixedHeader::from_bytes(&bytes), Some(header.clone()));
        assert!(header.agrees_with(&meta));
        assert_eq!(FixedHeader::from_bytes(&bytes[..127]), None);
    }

    #[test]
    fn should_truncate_long_names_on_char_boundary() {
        let name = "ä".repeat(20);
        let meta = Metadata::describe(b"x", "file", &name, Extensions::new());
        let header = FixedHeader::from_bytes(&FixedHeader::new(b"x", &meta).to_bytes()).unwrap();

        assert_eq!(header.name, "ä".repeat(15));
    }
}
