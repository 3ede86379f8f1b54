//! Reader for Android APK expansion (OBB) files.
//!
//! Expansion files are plain ZIP archives, frequently larger than 4 GiB, that
//! an application downloads separately from its package. This crate supports:
//!
//! - ZIP and ZIP64 end-of-central-directory records
//! - Stored (method 0) and DEFLATE (method 8) entries
//! - Zero-copy memory-mapped access shared across threads
//! - Main/patch file pairs merged into one namespace
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use xapk_obb::{ExpansionDir, ExpansionSet};
//!
//! let dir = ExpansionDir::new("/sdcard/Android/obb/com.example.game", "com.example.game");
//! let set = ExpansionSet::open(&dir, 3, 3)?;
//!
//! if let Some((archive, entry)) = set.find("main.3.com.example.game/level1.json") {
//!     let mut data = Vec::new();
//!     archive.open_entry(entry)?.read_to_end(&mut data)?;
//! }
//! # Ok::<(), xapk_obb::Error>(())
//! ```

mod archive;
mod entry;
mod error;
mod expansion;
mod stream;
pub mod zip;

pub use archive::ObbArchive;
pub use entry::ObbEntry;
pub use error::{Error, Result};
pub use expansion::{ExpansionDir, ExpansionKind, ExpansionSet};
pub use stream::EntryStream;
