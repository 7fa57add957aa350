//! Machine-readable install results
//!
//! Results are printed as `key=value` lines and, inside CI, appended to the
//! file named by `GITHUB_OUTPUT` so later workflow steps can branch on them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, InstallResult, Registry, Result};

/// Ordered `key=value` pairs for one or many results.
///
/// A single result reports its fields plus the vendor's install branch;
/// several report how many changed and the full list as JSON.
pub fn outputs_for(results: &[InstallResult], registry: &Registry) -> Vec<(String, String)> {
    if let [result] = results {
        let install_branch = registry
            .get(&result.vendor)
            .map(|d| d.install_branch_or_default(&result.vendor))
            .unwrap_or_else(|| crate::descriptor::default_install_branch(&result.vendor));
        return vec![
            ("vendor".into(), result.vendor.clone()),
            ("old_version".into(), result.old_version.clone()),
            ("new_version".into(), result.new_version.clone()),
            ("changed".into(), result.changed.to_string()),
            ("install_branch".into(), install_branch),
        ];
    }

    let changed = results.iter().filter(|r| r.changed).count();
    // Plain string fields; serialization cannot fail.
    let json = serde_json::to_string(results).unwrap_or_default();
    vec![
        ("changed_count".into(), changed.to_string()),
        ("changed".into(), (changed > 0).to_string()),
        ("results".into(), json),
    ]
}

pub fn render(outputs: &[(String, String)]) -> String {
    outputs
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

pub fn github_output_path() -> Option<PathBuf> {
    std::env::var_os("GITHUB_OUTPUT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Append `outputs` to `path`, creating it if needed.
pub fn append_outputs(path: &Path, outputs: &[(String, String)]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(render(outputs).as_bytes())
        .map_err(|e| Error::io(path, e))
}
