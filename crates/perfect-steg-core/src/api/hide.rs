use std::fs;
use std::path::{Path, PathBuf};

use crate::structure::process_for_hiding;
use crate::{container, Result, StegError};

pub fn prepare() -> HideApi {
    HideApi::default()
}

#[derive(Default, Debug)]
pub struct HideApi {
    carrier: Option<PathBuf>,
    payload: Option<PathBuf>,
    payload_type: Option<String>,
    output: Option<PathBuf>,
}

impl HideApi {
    /// The image the payload gets appended to, used readonly
    pub fn with_carrier<A: AsRef<Path>>(mut self, carrier: A) -> Self {
        self.carrier = Some(carrier.as_ref().to_path_buf());
        self
    }

    pub fn with_payload<A: AsRef<Path>>(mut self, payload: A) -> Self {
        self.payload = Some(payload.as_ref().to_path_buf());
        self
    }

    /// Overrides the payload type that is otherwise derived from the payload itself
    pub fn with_type(mut self, payload_type: &str) -> Self {
        self.payload_type = Some(payload_type.to_string());
        self
    }

    pub fn use_type<S: AsRef<str>>(mut self, payload_type: Option<S>) -> Self {
        self.payload_type = payload_type.map(|s| s.as_ref().to_string());
        self
    }

    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn execute(self) -> Result<()> {
        let Some(carrier) = self.carrier else {
            return Err(StegError::CarrierNotSet);
        };
        let Some(payload) = self.payload else {
            return Err(StegError::MissingPayload);
        };
        let Some(output) = self.output else {
            return Err(StegError::TargetNotSet);
        };

        let name = payload
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(StegError::InvalidFileName)?;
        let carrier = fs::read(&carrier).map_err(|source| StegError::ReadError { source })?;
        let data = fs::read(&payload).map_err(|source| StegError::ReadError { source })?;

        let prepared = process_for_hiding(&data, name);
        let payload_type = self
            .payload_type
            .as_deref()
            .unwrap_or_else(|| prepared.kind.type_name());
        let out = container::hide(
            &carrier,
            prepared.processed,
            payload_type,
            name,
            prepared.extra_metadata()?,
        )?;

        fs::write(&output, out).map_err(|source| StegError::WriteError { source })
    }
}
