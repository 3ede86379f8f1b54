//! Error types for the OBB crate.

use thiserror::Error;

/// Errors that can occur when working with expansion containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] xapk_common::Error),

    /// Invalid ZIP magic bytes.
    #[error("invalid ZIP signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// Could not find the end of central directory record.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// ZIP64 record not found when expected.
    #[error("ZIP64 end of central directory not found")]
    Zip64EocdNotFound,

    /// A record points outside the container.
    #[error("{0} out of bounds")]
    OutOfBounds(&'static str),

    /// Unsupported compression method.
    #[error("unsupported compression method {method} for entry {name}")]
    UnsupportedCompression { name: String, method: u16 },

    /// Encrypted entries cannot be read.
    #[error("entry is encrypted: {0}")]
    Encrypted(String),

    /// No expansion file exists for the requested versions.
    #[error("no expansion file found for main version {main_version}, patch version {patch_version}")]
    ExpansionNotFound { main_version: u32, patch_version: u32 },
}

/// Result type for OBB operations.
pub type Result<T> = std::result::Result<T, Error>;
