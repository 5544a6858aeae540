use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::{reveal_with_options, ExtractOptions, Restored, Result, StegError};

pub fn prepare() -> ExtractApi {
    ExtractApi::default()
}

#[derive(Default, Debug)]
pub struct ExtractApi {
    carrier: Option<PathBuf>,
    output_folder: Option<PathBuf>,
    options: ExtractOptions,
}

impl ExtractApi {
    /// Use the given extraction options
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// This is the carrier that contains the data to be extracted
    pub fn from_carrier(mut self, carrier: impl AsRef<Path>) -> Self {
        self.carrier = Some(carrier.as_ref().to_path_buf());
        self
    }

    /// This is the folder where the data will be saved to
    pub fn into_output_folder(mut self, output_folder: impl AsRef<Path>) -> Self {
        self.output_folder = Some(output_folder.as_ref().to_path_buf());
        self
    }

    /// Extracts, restores and writes the payload, named as it was when hidden
    pub fn execute(self) -> Result<Restored> {
        let Some(carrier) = self.carrier else {
            return Err(StegError::CarrierNotSet);
        };
        let Some(output_folder) = self.output_folder else {
            return Err(StegError::TargetNotSet);
        };

        let data = fs::read(&carrier).map_err(|source| StegError::ReadError { source })?;
        let restored = reveal_with_options(&data, &self.options)?;
        if let Some(advisory) = &restored.advisory {
            warn!(
                "{} was changed after hiding, checksum {} is now {}",
                restored.filename, advisory.expected, advisory.actual
            );
        }

        let target = output_folder.join(&restored.filename);
        fs::write(&target, &restored.buffer).map_err(|source| StegError::WriteError { source })?;

        Ok(restored)
    }
}
