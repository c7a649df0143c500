//! Load-path validation.
//!
//! Every path the loader computes is checked here immediately before the
//! filesystem is consulted. There is no cache and no way around the check.

use std::path::Path;

use crate::error::{DispatchError, Result};

fn is_allowed(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'/' | b'\\' | b'_' | b'.' | b'-')
}

/// Ensures `path` only contains `[A-Za-z0-9/\\_.-]`.
///
/// Paths that are not valid UTF-8 are rejected as well.
///
/// ```rust
/// use std::path::Path;
/// use waypoint_dispatch::security::check;
///
/// assert!(check(Path::new("controllers/HogeController.unit")).is_ok());
/// assert!(check(Path::new("controllers/Hoge Controller.unit")).is_err());
/// ```
pub fn check(path: &Path) -> Result<()> {
    let illegal = || DispatchError::IllegalCharacter(path.to_path_buf());
    let text = path.to_str().ok_or_else(illegal)?;
    if text.bytes().all(is_allowed) {
        Ok(())
    } else {
        Err(illegal())
    }
}

/// Ensures a unit name cannot step outside its directory.
///
/// Unit names come from request paths and handler forwards, so they may not
/// carry separators or parent references even though the path check allows
/// both for configured directories.
pub fn check_unit_name(name: &str, path: &Path) -> Result<()> {
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(DispatchError::IllegalCharacter(path.to_path_buf()));
    }
    Ok(())
}
