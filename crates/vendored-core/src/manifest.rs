//! Per-vendor manifest records
//!
//! `.vendored/manifests/<vendor>.files` lists every file an install produced,
//! `<vendor>.version` the installed version and `<vendor>.deps` the vendor's
//! dependencies by local name. All three are sorted, newline-delimited text.

use std::collections::BTreeMap;
use std::fs;

use vendored_fs::constants::ManifestArtifact;
use vendored_fs::{ControlLayout, NormalizedPath, io, normalize_relative};

use crate::{Error, Result, VendorDescriptor};

/// Marker file older installs left next to their files.
const LEGACY_VERSION_FILE: &str = ".version";

#[derive(Debug, Clone)]
pub struct ManifestStore {
    layout: ControlLayout,
}

impl ManifestStore {
    pub fn new(layout: ControlLayout) -> Self {
        Self { layout }
    }

    pub fn control_layout(&self) -> &ControlLayout {
        &self.layout
    }

    fn path(&self, vendor: &str, artifact: ManifestArtifact) -> NormalizedPath {
        self.layout.manifest(vendor, artifact)
    }

    pub fn has_manifest(&self, vendor: &str) -> bool {
        self.path(vendor, ManifestArtifact::Files).is_file()
    }

    pub fn read_files(&self, vendor: &str) -> Result<Option<Vec<String>>> {
        Ok(io::read_lines(&self.path(vendor, ManifestArtifact::Files))?)
    }

    pub fn write_files<S: AsRef<str>>(&self, vendor: &str, files: &[S]) -> Result<()> {
        let normalized = files.iter().map(|f| normalize_relative(f.as_ref()));
        io::write_sorted_lines(&self.path(vendor, ManifestArtifact::Files), normalized)?;
        Ok(())
    }

    pub fn read_version(&self, vendor: &str) -> Result<Option<String>> {
        Ok(io::read_lines(&self.path(vendor, ManifestArtifact::Version))?
            .and_then(|lines| lines.into_iter().next()))
    }

    pub fn write_version(&self, vendor: &str, version: &str) -> Result<()> {
        io::write_text(
            &self.path(vendor, ManifestArtifact::Version),
            &format!("{}\n", version.trim()),
        )?;
        Ok(())
    }

    pub fn read_deps(&self, vendor: &str) -> Result<Option<Vec<String>>> {
        Ok(io::read_lines(&self.path(vendor, ManifestArtifact::Deps))?)
    }

    pub fn write_deps<S: AsRef<str>>(&self, vendor: &str, deps: &[S]) -> Result<()> {
        io::write_sorted_lines(&self.path(vendor, ManifestArtifact::Deps), deps)?;
        Ok(())
    }

    /// Repository-relative paths of the artifacts present for `vendor`.
    pub fn artifact_paths(&self, vendor: &str) -> Vec<String> {
        ManifestArtifact::ALL
            .iter()
            .filter(|artifact| self.path(vendor, **artifact).is_file())
            .map(|artifact| self.layout.manifest_relative(vendor, *artifact))
            .collect()
    }

    /// Delete every artifact of `vendor`, returning how many existed.
    pub fn remove_artifacts(&self, vendor: &str) -> Result<usize> {
        let mut removed = 0;
        for artifact in ManifestArtifact::ALL {
            if io::remove_file_if_exists(&self.path(vendor, artifact))? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Vendors with an artifact of the given kind, sorted.
    fn vendors_with(&self, artifact: ManifestArtifact) -> Result<Vec<String>> {
        let dir = self.layout.manifests_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let native = dir.to_native();
        let mut vendors = Vec::new();
        for entry in fs::read_dir(&native).map_err(|e| Error::io(&native, e))? {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            if path.is_file() && path.extension() == Some(artifact.extension()) {
                if let Some(stem) = path.file_stem() {
                    vendors.push(stem.to_string());
                }
            }
        }
        vendors.sort();
        Ok(vendors)
    }

    /// Every persisted `.deps` record, keyed by vendor.
    pub fn all_deps(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut deps = BTreeMap::new();
        for vendor in self.vendors_with(ManifestArtifact::Deps)? {
            let list = self.read_deps(&vendor)?.unwrap_or_default();
            deps.insert(vendor, list);
        }
        Ok(deps)
    }

    /// Manifest-listed paths that are missing on disk.
    pub fn missing_files<S: AsRef<str>>(&self, files: &[S]) -> Vec<String> {
        files
            .iter()
            .map(|f| normalize_relative(f.as_ref()))
            .filter(|f| !self.layout.resolve(f).exists())
            .collect()
    }

    /// First other vendor whose manifest already lists any of `files`.
    pub fn find_overlap<S: AsRef<str>>(
        &self,
        vendor: &str,
        files: &[S],
    ) -> Result<Option<(String, Vec<String>)>> {
        for other in self.vendors_with(ManifestArtifact::Files)? {
            if other == vendor {
                continue;
            }
            let owned = self.read_files(&other)?.unwrap_or_default();
            let mut shared: Vec<String> = files
                .iter()
                .map(|f| normalize_relative(f.as_ref()))
                .filter(|f| owned.contains(f))
                .collect();
            if !shared.is_empty() {
                shared.sort();
                shared.dedup();
                return Ok(Some((other, shared)));
            }
        }
        Ok(None)
    }

    /// Installed version of `vendor`, or `None` for a fresh install.
    ///
    /// The manifest version wins. Without one, a legacy `.version` marker is
    /// looked up among the `allowed` entries and then next to the base
    /// directory of each `protected` pattern.
    pub fn get_current_version(
        &self,
        vendor: &str,
        descriptor: &VendorDescriptor,
    ) -> Result<Option<String>> {
        if let Some(version) = self.read_version(vendor)? {
            return Ok(Some(version));
        }

        for candidate in legacy_version_candidates(descriptor) {
            if let Some(text) = io::read_text_opt(&self.layout.resolve(&candidate))? {
                let version = text.trim();
                if !version.is_empty() {
                    return Ok(Some(version.to_string()));
                }
            }
        }
        Ok(None)
    }
}

fn legacy_version_candidates(descriptor: &VendorDescriptor) -> Vec<String> {
    let mut candidates: Vec<String> = descriptor
        .allowed
        .iter()
        .map(|p| normalize_relative(p))
        .filter(|p| p.rsplit('/').next().is_some_and(|n| n.ends_with(LEGACY_VERSION_FILE)))
        .collect();

    // Only directory globs such as `.mytool/**` imply a vendor-owned directory.
    for pattern in descriptor.protected_patterns() {
        let normalized = normalize_relative(pattern);
        let literal: Vec<&str> = normalized
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?', '[']))
            .collect();
        if literal.is_empty() || literal.len() == normalized.split('/').count() {
            continue;
        }
        let candidate = format!("{}/{LEGACY_VERSION_FILE}", literal.join("/"));
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}
