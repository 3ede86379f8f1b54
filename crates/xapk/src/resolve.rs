//! Entry resolution: versioned subdirectory first, archive root second.

use xapk_obb::ExpansionSet;

use crate::index::{get_entry, EntryLocator};
use crate::{Error, Result};

/// Subdirectory named after a container: its file name minus the extension.
///
/// `main.3.com.example.game.obb` gives `main.3.com.example.game`. A name
/// without a dot is returned unchanged.
pub fn subdirectory(base_container_name: &str) -> &str {
    match base_container_name.rfind('.') {
        Some(dot) => &base_container_name[..dot],
        None => base_container_name,
    }
}

/// Resolve `filename` to an entry.
///
/// Tries `<subdirectory>/<filename>` and then `<filename>`. The subdirectory
/// path always wins when both exist.
pub fn resolve<'a>(
    handle: &'a ExpansionSet,
    base_container_name: &str,
    filename: &str,
) -> Result<EntryLocator<'a>> {
    let qualified = format!("{}/{}", subdirectory(base_container_name), filename);

    get_entry(handle, &qualified)
        .or_else(|| get_entry(handle, filename))
        .ok_or_else(|| Error::FileNotFound(filename.to_string()))
}
