//! Vendor removal
//!
//! Removal is manifest-driven: a vendor without a `.files` manifest is
//! refused rather than guessed at. [`Remover::plan`] gathers what would go
//! and who depends on it; [`Remover::execute`] performs it.

use std::collections::BTreeSet;

use vendored_fs::{ControlLayout, NormalizedPath, escapes_root, io};

use crate::{Error, ManifestStore, RegistryStore, Result};

/// Everything a removal will touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub vendor: String,
    /// Manifest-listed files followed by the manifest artifacts.
    pub files: Vec<String>,
    /// Vendors whose `.deps` name this vendor.
    pub reverse_deps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub vendor: String,
    pub removed_files: usize,
    pub pruned_dirs: Vec<String>,
}

pub struct Remover {
    layout: ControlLayout,
    registry: RegistryStore,
    manifests: ManifestStore,
}

impl Remover {
    pub fn new(layout: ControlLayout) -> Self {
        Self {
            registry: RegistryStore::new(layout.clone()),
            manifests: ManifestStore::new(layout.clone()),
            layout,
        }
    }

    /// Other vendors that list `vendor` among their dependencies.
    pub fn check_reverse_deps(&self, vendor: &str) -> Result<Vec<String>> {
        Ok(self
            .manifests
            .all_deps()?
            .into_iter()
            .filter(|(owner, deps)| owner != vendor && deps.iter().any(|d| d == vendor))
            .map(|(owner, _)| owner)
            .collect())
    }

    /// Manifest entries plus the manifest artifacts themselves.
    pub fn get_files_to_remove(&self, vendor: &str) -> Result<Vec<String>> {
        let Some(mut files) = self.manifests.read_files(vendor)? else {
            return Err(Error::NoManifest {
                vendor: vendor.to_string(),
            });
        };
        let escaping: Vec<String> = files.iter().filter(|f| escapes_root(f)).cloned().collect();
        if !escaping.is_empty() {
            return Err(Error::ManifestPathEscapes {
                vendor: vendor.to_string(),
                files: escaping,
            });
        }
        for artifact in self.manifests.artifact_paths(vendor) {
            if !files.contains(&artifact) {
                files.push(artifact);
            }
        }
        Ok(files)
    }

    pub fn plan(&self, vendor: &str) -> Result<RemovalPlan> {
        let registry = self.registry.load()?;
        if !registry.contains(vendor) {
            return Err(Error::UnknownVendor {
                name: vendor.to_string(),
                known: registry.names(),
            });
        }
        Ok(RemovalPlan {
            vendor: vendor.to_string(),
            files: self.get_files_to_remove(vendor)?,
            reverse_deps: self.check_reverse_deps(vendor)?,
        })
    }

    /// Delete the planned files, the registry entry and the package scratch
    /// directory, then prune directories the removal left empty.
    pub fn execute(&self, plan: &RemovalPlan) -> Result<RemovalReport> {
        let mut removed_files = 0;
        let mut parents = BTreeSet::new();
        for file in &plan.files {
            let path = self.layout.resolve(file);
            if io::remove_file_if_exists(&path)? {
                removed_files += 1;
            }
            if let Some(parent) = path.parent() {
                parents.insert(parent);
            }
        }

        let mut registry = self.registry.load()?;
        if registry.remove(&plan.vendor).is_some() {
            self.registry.save(&registry)?;
        }

        let package = self.layout.package_dir(&plan.vendor);
        if package.is_dir() {
            let native = package.to_native();
            std::fs::remove_dir_all(&native).map_err(|e| Error::io(&native, e))?;
        }
        if let Some(parent) = package.parent() {
            parents.insert(parent);
        }

        let stop_at = [self.layout.root().clone(), self.layout.control_dir()];
        let mut pruned = Vec::new();
        // Deepest first so nested empty directories collapse fully.
        let mut ordered: Vec<NormalizedPath> = parents.into_iter().collect();
        ordered.sort_by_key(|dir| std::cmp::Reverse(dir.as_str().matches('/').count()));
        for dir in ordered {
            for removed in io::prune_empty_dirs(&dir, &stop_at)? {
                pruned.push(
                    removed
                        .relative_to(self.layout.root())
                        .unwrap_or_else(|| removed.to_string()),
                );
            }
        }

        tracing::info!(vendor = %plan.vendor, files = removed_files, "Removed vendor");
        Ok(RemovalReport {
            vendor: plan.vendor.clone(),
            removed_files,
            pruned_dirs: pruned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(temp: &TempDir, rel: &str, content: &str) {
        let path = temp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn reverse_deps_skip_self() {
        let temp = TempDir::new().unwrap();
        write(&temp, ".vendored/manifests/tool.deps", "tool\n");
        write(&temp, ".vendored/manifests/vendor-a.deps", "tool\n");
        write(&temp, ".vendored/manifests/vendor-b.deps", "other\n");

        let remover = Remover::new(ControlLayout::new(temp.path()));
        assert_eq!(remover.check_reverse_deps("tool").unwrap(), vec!["vendor-a".to_string()]);
    }

    #[test]
    fn files_to_remove_include_artifacts() {
        let temp = TempDir::new().unwrap();
        write(&temp, ".vendored/manifests/tool.files", ".tool/script.sh\n");
        write(&temp, ".vendored/manifests/tool.version", "1.0.0\n");

        let files = Remover::new(ControlLayout::new(temp.path()))
            .get_files_to_remove("tool")
            .unwrap();
        assert_eq!(
            files,
            vec![
                ".tool/script.sh".to_string(),
                ".vendored/manifests/tool.files".to_string(),
                ".vendored/manifests/tool.version".to_string(),
            ]
        );
    }

    #[test]
    fn no_manifest_is_refused() {
        let temp = TempDir::new().unwrap();
        let err = Remover::new(ControlLayout::new(temp.path()))
            .get_files_to_remove("tool")
            .unwrap_err();
        assert!(matches!(err, Error::NoManifest { .. }));
    }
}
