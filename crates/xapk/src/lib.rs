//! Entry lookup and decode engine for Android APK expansion files.
//!
//! Given the expansion files of an application, this crate finds a named
//! entry, reads it fully into memory, infers its content type and encodes it
//! into the representation the caller asked for.
//!
//! The pipeline, leaf first:
//!
//! - [`ArchiveIndex`] - opens main/patch expansion files once per version pair
//! - [`resolve`] - versioned subdirectory first, archive root second
//! - [`content::read`] - drains an entry stream into a [`Payload`]
//! - [`sniff`] - best-effort MIME type from leading bytes or file name
//! - [`encode`] - text, raw buffer, binary string or base64 data URI
//! - [`XapkReader`] - worker pool that runs the pipeline per request
//!
//! # Example
//!
//! ```no_run
//! use xapk::prelude::*;
//!
//! let config = ReaderConfig::from_json_file("xapk.json")?;
//! let reader = XapkReader::new(config)?;
//!
//! let _uri = reader.get_as("img/logo.png", RepresentationMode::DataUri).wait()?;
//! # Ok::<(), xapk::Error>(())
//! ```

mod config;
mod error;
mod index;
mod reader;

pub mod content;
pub mod encode;
pub mod resolve;
pub mod sniff;

#[cfg(test)]
mod test_support;

pub use config::{ExpansionVersion, ReaderConfig};
pub use content::Payload;
pub use encode::{encode, Message, Representation, RepresentationMode};
pub use error::{Error, Result};
pub use index::{get_entry, ArchiveHandle, ArchiveIndex, EntryLocator};
pub use reader::{lookup, LookupRequest, PendingRead, XapkReader};
pub use resolve::resolve;
pub use sniff::sniff;

pub use xapk_obb as obb;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ExpansionVersion, ReaderConfig, Representation, RepresentationMode, XapkReader,
    };
    pub use xapk_obb::{ExpansionDir, ExpansionKind, ExpansionSet, ObbArchive};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
