//! Error types for the lookup engine.

use thiserror::Error;

/// Errors produced while resolving, reading or encoding an entry.
///
/// The `Display` output of each variant is the message handed back to the
/// host when a request fails.
#[derive(Debug, Error)]
pub enum Error {
    /// No expansion file exists for the requested versions.
    #[error("expansion file not found (main version {main_version}, patch version {patch_version})")]
    ArchiveNotFound { main_version: u32, patch_version: u32 },

    /// Neither the versioned nor the root path exists.
    #[error("file not found ({0})")]
    FileNotFound(String),

    /// Stream fault while reading an entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text was requested but the entry is not valid UTF-8.
    #[error("entry is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The expansion file exists but could not be indexed.
    #[error("invalid expansion file: {0}")]
    Archive(xapk_obb::Error),

    /// Host configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The reader shut down before the request produced a result.
    #[error("reader closed before the request completed")]
    Closed,
}

impl From<xapk_obb::Error> for Error {
    fn from(err: xapk_obb::Error) -> Self {
        match err {
            xapk_obb::Error::ExpansionNotFound {
                main_version,
                patch_version,
            } => Self::ArchiveNotFound {
                main_version,
                patch_version,
            },
            other => Self::Archive(other),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
