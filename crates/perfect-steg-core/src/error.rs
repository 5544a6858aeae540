use thiserror::Error;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum StegError {
    /// Represents an unveil of no hidden data. Every recovery strategy came up empty.
    #[error("No hidden data found")]
    NoDataFound,

    /// Represents a packet that was unambiguously found, but whose payload does not match its checksum
    #[error("Hidden data is corrupted: expected checksum {expected}, got {actual}")]
    DataCorrupted { expected: String, actual: String },

    /// Represents an attempt to hide nothing
    #[error("Payload is empty, there is nothing to hide")]
    EmptyPayload,

    /// Represents a ZIP based payload that could neither be opened nor repaired
    #[error("Archive is malformed")]
    MalformedArchive(#[from] ZipError),

    /// Represents a metadata block that could not be (de)serialized
    #[error("Metadata error")]
    Metadata(#[from] serde_json::Error),

    /// Represents a metadata block that does not fit the 32 bit length field
    #[error("Metadata block of {0} bytes is too large")]
    MetadataTooLarge(usize),

    /// Represents an error caused by an invalid filename, for example not unsupported charset or empty filename
    #[error("A file with an invalid file name was provided")]
    InvalidFileName,

    /// Represents a failure to read from input.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents a failure to write target file.
    #[error("Write error")]
    WriteError { source: std::io::Error },

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("No carrier image set")]
    CarrierNotSet,

    #[error("No target file set")]
    TargetNotSet,

    #[error("API Error: Missing payload")]
    MissingPayload,

    /// Represents a self test run whose round trip did not hold up
    #[error("Self test failed")]
    SelfTestFailed,
}

impl StegError {
    /// `true` when the carrier simply holds nothing, as opposed to holding something broken.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StegError::NoDataFound)
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, StegError::DataCorrupted { .. })
    }
}
