//! Control-directory layout
//!
//! Every persisted artifact lives at a fixed place relative to the host
//! repository root:
//!
//! ```text
//! .vendored/
//!   config.json            monolithic registry (+ settings)
//!   configs/<name>.json    per-vendor registry files
//!   manifests/<name>.files | .version | .deps
//!   pkg/<name>/            scratch install root (non-dogfood)
//!   hooks/pre-commit       protection hook source
//! ```

use std::fs;
use std::path::Path;

use crate::constants::{ControlPath, ManifestArtifact};
use crate::{Error, NormalizedPath, Result};

/// Resolves control-directory paths for one host repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLayout {
    root: NormalizedPath,
}

impl ControlLayout {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` to the first directory holding `.vendored/` or `.git/`.
    pub fn discover(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| {
                dir.join(ControlPath::ControlDir.as_str()).is_dir()
                    || dir.join(ControlPath::GitDir.as_str()).exists()
            })
            .map(Self::new)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Absolute location of a repository-relative path.
    pub fn resolve(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    pub fn control_dir(&self) -> NormalizedPath {
        self.root.join(ControlPath::ControlDir.as_str())
    }

    pub fn registry_file(&self) -> NormalizedPath {
        self.control_dir().join(ControlPath::RegistryFile.as_str())
    }

    pub fn configs_dir(&self) -> NormalizedPath {
        self.control_dir().join(ControlPath::ConfigsDir.as_str())
    }

    pub fn vendor_config(&self, name: &str) -> NormalizedPath {
        self.configs_dir().join(&format!("{name}.json"))
    }

    pub fn manifests_dir(&self) -> NormalizedPath {
        self.control_dir().join(ControlPath::ManifestsDir.as_str())
    }

    pub fn manifest(&self, name: &str, artifact: ManifestArtifact) -> NormalizedPath {
        self.root.join(&self.manifest_relative(name, artifact))
    }

    /// Repository-relative path of a manifest artifact, as protected and removed.
    pub fn manifest_relative(&self, name: &str, artifact: ManifestArtifact) -> String {
        format!(
            "{}/{}/{}.{}",
            ControlPath::ControlDir,
            ControlPath::ManifestsDir,
            name,
            artifact.extension()
        )
    }

    /// Repository-relative scratch root handed to install scripts.
    pub fn package_relative(&self, name: &str) -> String {
        format!("{}/{}/{}", ControlPath::ControlDir, ControlPath::PackagesDir, name)
    }

    pub fn package_dir(&self, name: &str) -> NormalizedPath {
        self.root.join(&self.package_relative(name))
    }

    pub fn hook_source(&self) -> NormalizedPath {
        self.control_dir()
            .join(ControlPath::HooksDir.as_str())
            .join("pre-commit")
    }

    pub fn git_hooks_dir(&self) -> NormalizedPath {
        self.root.join(ControlPath::GitDir.as_str()).join("hooks")
    }

    /// Config file a vendor kept in its own dot-directory before per-vendor files existed.
    pub fn legacy_project_config(&self, name: &str) -> NormalizedPath {
        self.root.join(&format!(".{name}")).join("config.json")
    }

    /// Per-vendor config files, sorted by path.
    pub fn per_vendor_config_files(&self) -> Result<Vec<NormalizedPath>> {
        let dir = self.configs_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let native = dir.to_native();
        let entries = fs::read_dir(&native).map_err(|e| Error::io(&native, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            if path.is_file() && path.extension() == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Whether the per-vendor encoding is in use.
    pub fn uses_per_vendor_configs(&self) -> Result<bool> {
        Ok(!self.per_vendor_config_files()?.is_empty())
    }
}
