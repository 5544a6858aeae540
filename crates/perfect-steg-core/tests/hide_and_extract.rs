use std::io::{Cursor, Read, Write};

use perfect_steg_core::extract::{DeepScan, Strategy, StrictFormat};
use perfect_steg_core::*;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const PNG_CARRIER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0\x1f\x15\xc4\x89\0\0\0\0IEND\xaeB`\x82";

fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn read_entry(archive: &[u8], name: &str) -> String {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut out = String::new();
    zip.by_name(name).unwrap().read_to_string(&mut out).unwrap();
    out
}

#[test]
fn should_round_trip_arbitrary_payloads() {
    let payloads: [(&str, Vec<u8>); 3] = [
        ("report.pdf", b"%PDF-1.7\n1 0 obj\n%%EOF\n".to_vec()),
        ("photo.png", PNG_CARRIER.to_vec()),
        ("noise.bin", (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect()),
    ];

    for (name, payload) in payloads {
        let out = hide(PNG_CARRIER, &payload, "file", name, Extensions::new()).unwrap();
        assert!(out.starts_with(PNG_CARRIER));

        let found = extract(&out).unwrap();
        assert_eq!(found.data, payload, "{name}");
        assert_eq!(found.header.name, name);
        assert_eq!(found.header.size, payload.len() as u64);
        assert_eq!(found.strategy, Strategy::StrictFormat(StrictFormat));
    }
}

#[test]
fn should_extract_the_latest_payload_of_a_reused_carrier() {
    let first = hide(PNG_CARRIER, b"old secret", "file", "old.bin", Extensions::new()).unwrap();
    let second = hide(&first, b"new secret", "file", "new.bin", Extensions::new()).unwrap();

    let found = extract(&second).unwrap();
    assert_eq!(found.data, b"new secret");
    assert_eq!(found.header.name, "new.bin");
    assert_eq!(found.strategy, Strategy::StrictFormat(StrictFormat));
}

#[test]
fn should_carry_extension_metadata_but_never_a_forged_checksum() {
    let mut extra = Extensions::new();
    extra.insert("checksum".into(), json!("0".repeat(64)));
    extra.insert("originalSize".into(), json!(1));
    extra.insert("sender".into(), json!({ "id": 42 }));

    let out = hide(PNG_CARRIER, b"payload", "file", "p.bin", extra).unwrap();
    let found = extract(&out).unwrap();
    let meta = found.header.metadata.unwrap();

    assert_eq!(meta.original_size, 7);
    assert_eq!(meta.checksum, metadata::sha256_hex(b"payload"));
    assert_eq!(meta.extensions["sender"]["id"], 42);
}

#[test]
fn should_detect_a_flipped_payload_bit() {
    let payload = b"%PDF-1.4 tamper evident";
    let mut out = hide(PNG_CARRIER, payload, "document", "t.pdf", Extensions::new()).unwrap();
    let at = out.len() - container::END_MARKER.len() - payload.len() + 3;
    out[at] ^= 0x10;

    let err = extract(&out).unwrap_err();
    assert!(err.is_corrupted());
    assert!(reveal(&out).unwrap_err().is_corrupted());
}

#[test]
fn should_fall_back_to_a_deep_scan_when_the_packet_head_is_gone() {
    let payload = b"%PDF-1.5\nsalvaged\n%%EOF\n";
    let carrier = vec![0x11; 100];
    let mut out = hide(&carrier, payload, "document", "r.pdf", Extensions::new()).unwrap();
    out[carrier.len()] = b'X';

    let found = extract(&out).unwrap();

    assert_eq!(found.strategy, Strategy::DeepScan(DeepScan));
    assert!(found.data.starts_with(payload));
    assert_eq!(found.header.mime_type, "application/pdf");
    assert_eq!(found.header.name, "recovered.pdf");
    assert_eq!(FileKind::from_mime(&found.header.mime_type), FileKind::Document);
}

#[test]
fn should_repair_archives_with_trailing_junk() {
    let clean = zip_of(&[("a.txt", "alpha"), ("b/c.txt", "gamma")]);
    let mut damaged = clean.clone();
    damaged.extend_from_slice(&[0xAB; 2000]);

    let out = hide(PNG_CARRIER, &damaged, "file", "bundle.zip", Extensions::new()).unwrap();
    let restored = reveal(&out).unwrap();

    assert_eq!(restored.buffer, clean);
    assert_eq!(restored.kind, FileKind::Archive);
    assert_eq!(read_entry(&restored.buffer, "b/c.txt"), "gamma");
}

#[test]
fn should_rebuild_archives_with_repeated_local_headers() {
    let clean = zip_of(&[("a.txt", "alpha")]);
    let cd = clean.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
    let mut damaged = clean[..cd].to_vec();
    damaged.extend_from_slice(&clean[..cd]);

    let out = hide(PNG_CARRIER, &damaged, "file", "bundle.zip", Extensions::new()).unwrap();
    let restored = reveal(&out).unwrap();
    assert_eq!(read_entry(&restored.buffer, "a.txt"), "alpha");

    let out = hide(PNG_CARRIER, &damaged, "file", "letter.docx", Extensions::new()).unwrap();
    let restored = reveal(&out).unwrap();
    assert_eq!(restored.filename, "letter.docx");
    let mut docx = ZipArchive::new(Cursor::new(&restored.buffer[..])).unwrap();
    assert!(docx.by_name("word/document.xml").is_ok());
}

#[test]
fn should_replace_a_broken_docx_by_a_minimal_one() {
    let broken = b"\x00\x01Quarterly numbers look <fine>\x00\x02";
    let out = conceal(PNG_CARRIER, broken, "numbers.docx").unwrap();
    let restored = reveal(&out).unwrap();

    assert_eq!(restored.filename, "numbers.docx");
    assert_eq!(restored.kind, FileKind::Document);
    assert!(read_entry(&restored.buffer, "word/document.xml")
        .contains("Quarterly numbers look &lt;fine&gt;"));
    assert!(read_entry(&restored.buffer, "[Content_Types].xml").contains("wordprocessingml"));
}

#[test]
fn should_preserve_office_documents_byte_exactly() {
    let docx = zip_of(&[
        ("[Content_Types].xml", "<Types/>"),
        ("_rels/.rels", "<Relationships/>"),
        ("word/document.xml", "<w:document/>"),
    ]);

    let out = conceal(PNG_CARRIER, &docx, "letter.docx").unwrap();
    let found = extract(&out).unwrap();
    let meta = found.header.metadata.as_ref().unwrap();
    assert!(meta.is_special());
    assert_eq!(found.header.payload_type, "office");

    let restored = reveal(&out).unwrap();
    assert_eq!(restored.buffer, docx);
    assert!(restored.advisory.is_none());
}

#[test]
fn should_reject_empty_payloads() {
    assert!(matches!(
        hide(PNG_CARRIER, b"", "file", "empty.bin", Extensions::new()),
        Err(StegError::EmptyPayload)
    ));
}

#[test]
fn should_report_clean_carriers_as_empty() {
    let opts = ExtractOptions {
        brute_force: false,
        ..Default::default()
    };
    assert!(extract_with_options(PNG_CARRIER, &opts)
        .unwrap_err()
        .is_not_found());
}
