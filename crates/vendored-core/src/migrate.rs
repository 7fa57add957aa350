//! One-way migrations of the registry encoding
//!
//! Both migrations merge and never overwrite, and each is guarded by a
//! precondition that its own success falsifies, so re-running after a
//! partial or complete run converges on the same state.

use serde_json::{Map, Value};
use vendored_fs::constants::{VENDOR_KEY, VENDORS_KEY};
use vendored_fs::{ControlLayout, io, load_object, save_object};

use crate::{Error, Result};

pub struct ConfigMigrator {
    layout: ControlLayout,
}

impl ConfigMigrator {
    pub fn new(layout: ControlLayout) -> Self {
        Self { layout }
    }

    /// Run every migration whose precondition holds. Returns how many ran.
    pub fn run_pending(&self) -> Result<usize> {
        let mut ran = 0;
        if self.should_migrate_config()? {
            self.migrate_config()?;
            ran += 1;
        }
        if self.should_migrate_project_configs()? {
            self.migrate_project_configs()?;
            ran += 1;
        }
        Ok(ran)
    }

    fn monolithic_vendors(&self) -> Result<Option<(Map<String, Value>, Map<String, Value>)>> {
        let Some(mut object) = load_object(&self.layout.registry_file())? else {
            return Ok(None);
        };
        match object.remove(VENDORS_KEY) {
            Some(Value::Object(vendors)) if !vendors.is_empty() => Ok(Some((object, vendors))),
            _ => Ok(None),
        }
    }

    /// The monolithic file has vendors and no per-vendor file exists yet.
    pub fn should_migrate_config(&self) -> Result<bool> {
        Ok(self.monolithic_vendors()?.is_some() && !self.layout.uses_per_vendor_configs()?)
    }

    /// Split the monolithic vendor map into one file per vendor.
    pub fn migrate_config(&self) -> Result<Vec<String>> {
        let Some((rest, vendors)) = self.monolithic_vendors()? else {
            return Ok(Vec::new());
        };

        let mut migrated = Vec::with_capacity(vendors.len());
        for (name, descriptor) in vendors {
            let path = self.layout.vendor_config(&name);
            let mut object = load_object(&path)?.unwrap_or_default();
            object
                .entry(VENDOR_KEY.to_string())
                .or_insert(descriptor);
            save_object(&path, &object)?;
            tracing::info!("Migrated config: {name}");
            migrated.push(name);
        }

        save_object(&self.layout.registry_file(), &rest)?;
        tracing::info!("Config migration complete ({} vendors)", migrated.len());
        Ok(migrated)
    }

    /// Vendors with a per-vendor file and a leftover `.<vendor>/config.json`.
    fn legacy_candidates(&self) -> Result<Vec<String>> {
        let control = self.layout.control_dir();
        let mut names = Vec::new();
        for path in self.layout.per_vendor_config_files()? {
            let Some(name) = path.file_stem() else { continue };
            let legacy = self.layout.legacy_project_config(name);
            let inside_control = legacy.relative_to(&control).is_some();
            if legacy.is_file() && !inside_control {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub fn should_migrate_project_configs(&self) -> Result<bool> {
        Ok(!self.legacy_candidates()?.is_empty())
    }

    /// Fold legacy vendor-owned config files into the per-vendor files.
    ///
    /// Existing keys win, `_vendor` is never taken from the legacy file, and
    /// the legacy directory is removed only once it is completely empty.
    pub fn migrate_project_configs(&self) -> Result<Vec<String>> {
        let mut merged = Vec::new();
        for name in self.legacy_candidates()? {
            let legacy = self.layout.legacy_project_config(&name);
            let legacy_object = match load_object(&legacy) {
                Ok(object) => object.unwrap_or_default(),
                Err(e) => {
                    return Err(Error::LegacyConfigUnreadable {
                        path: legacy.to_native(),
                        message: e.to_string(),
                    });
                }
            };

            let target = self.layout.vendor_config(&name);
            let mut object = load_object(&target)?.unwrap_or_default();
            for (key, value) in legacy_object {
                if key == VENDOR_KEY {
                    continue;
                }
                object.entry(key).or_insert(value);
            }
            save_object(&target, &object)?;
            io::remove_file_if_exists(&legacy)?;

            let shown = legacy
                .relative_to(self.layout.root())
                .unwrap_or_else(|| legacy.to_string());
            tracing::info!("Merged project config {shown} into {}", self.layout.vendor_config(&name));

            if let Some(dir) = legacy.parent() {
                if io::is_empty_dir(&dir)? {
                    let native = dir.to_native();
                    std::fs::remove_dir(&native).map_err(|e| Error::io(&native, e))?;
                    tracing::info!("Removed empty directory .{name}/");
                }
            }
            merged.push(name);
        }
        Ok(merged)
    }
}
