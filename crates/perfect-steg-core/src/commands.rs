use std::fs;
use std::path::Path;

use crate::container::legacy;
use crate::extract::Recover;
use crate::metadata::sha256_hex;
use crate::{conceal, extract_with_options, reveal, ExtractOptions, Restored, Result, StegError};

pub fn hide(
    carrier: &Path,
    payload: &Path,
    output: &Path,
    payload_type: Option<String>,
) -> Result<()> {
    crate::api::hide::prepare()
        .with_carrier(carrier)
        .with_payload(payload)
        .use_type(payload_type)
        .with_output(output)
        .execute()
}

pub fn extract(carrier: &Path, destination: &Path, options: ExtractOptions) -> Result<Restored> {
    crate::api::extract::prepare()
        .with_options(options)
        .from_carrier(carrier)
        .into_output_folder(destination)
        .execute()
}

/// What [`check`] found in a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub strategy: &'static str,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    /// Only packets in the current format carry a checksum
    pub verified: bool,
}

/// Looks for hidden data without writing anything, `None` when there is none.
pub fn check(carrier: &Path, options: &ExtractOptions) -> Result<Option<CheckReport>> {
    let data = fs::read(carrier).map_err(|source| StegError::ReadError { source })?;

    match extract_with_options(&data, options) {
        Ok(found) => Ok(Some(CheckReport {
            strategy: found.strategy.name(),
            name: found.header.name,
            size: found.data.len() as u64,
            mime_type: found.header.mime_type,
            verified: found.header.metadata.is_some(),
        })),
        Err(StegError::NoDataFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTest {
    pub round_trip: bool,
    pub corruption_detected: bool,
    pub legacy_readable: bool,
}

impl SelfTest {
    pub fn passed(&self) -> bool {
        self.round_trip && self.corruption_detected && self.legacy_readable
    }
}

/// Runs a generated payload through an in memory carrier.
pub fn self_test() -> Result<SelfTest> {
    let carrier = b"\x89PNG\r\n\x1a\n\0\0\0\0IEND\xAE\x42\x60\x82";
    let payload: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(31) % 251) as u8).collect();

    let out = conceal(carrier, &payload, "self-test.bin")?;
    let restored = reveal(&out)?;
    let round_trip = restored.buffer == payload;
    if !round_trip {
        log::error!(
            "round trip changed the payload, {} became {}",
            sha256_hex(&payload),
            sha256_hex(&restored.buffer)
        );
    }

    // last payload byte, right in front of the end marker
    let mut tampered = out.clone();
    let at = tampered.len() - crate::container::END_MARKER.len() - 1;
    tampered[at] ^= 0x01;
    let corruption_detected = matches!(reveal(&tampered), Err(e) if e.is_corrupted());

    let mut old = carrier.to_vec();
    old.extend_from_slice(&legacy::encode("file", "self-test.bin", &payload));
    let legacy_readable = reveal(&old).is_ok_and(|r| r.buffer == payload);

    Ok(SelfTest {
        round_trip,
        corruption_detected,
        legacy_readable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn should_pass_the_self_test() {
        let result = self_test().unwrap();
        assert!(result.passed(), "{result:?}");
    }

    #[test]
    fn should_hide_check_and_extract_files() {
        let temp_dir = tempdir().unwrap();
        let carrier = temp_dir.path().join("carrier.gif");
        let payload = temp_dir.path().join("notes.txt");
        let output = temp_dir.path().join("out.gif");
        fs::write(&carrier, b"GIF89a carrier").unwrap();
        fs::write(&payload, b"meet at noon").unwrap();

        let no_brute_force = ExtractOptions {
            brute_force: false,
            ..Default::default()
        };
        assert_eq!(check(&carrier, &no_brute_force).unwrap(), None);

        hide(&carrier, &payload, &output, None).unwrap();

        let report = check(&output, &ExtractOptions::default()).unwrap().unwrap();
        assert_eq!(report.strategy, "strict format");
        assert_eq!(report.name, "notes.txt");
        assert_eq!(report.size, 12);
        assert!(report.verified);

        let folder = temp_dir.path().join("extracted");
        fs::create_dir(&folder).unwrap();
        let restored = extract(&output, &folder, ExtractOptions::default()).unwrap();
        assert_eq!(restored.filename, "notes.txt");
        assert_eq!(fs::read(folder.join("notes.txt")).unwrap(), b"meet at noon");
    }
}
