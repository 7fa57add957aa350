//! Locating the host repository from the working directory

use std::path::Path;

use vendored_fs::ControlLayout;

use crate::error::Result;

/// Control layout for the repository containing `cwd`.
///
/// Walks up to the nearest directory holding `.vendored/` or `.git/`. Outside
/// any repository the working directory itself is used, so commands report
/// "no registry" rather than failing to locate one.
pub fn locate(cwd: &Path) -> Result<ControlLayout> {
    let cwd = dunce::canonicalize(cwd)?;
    Ok(ControlLayout::discover(&cwd).unwrap_or_else(|| ControlLayout::new(cwd.as_path())))
}
