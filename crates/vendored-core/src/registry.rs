//! Vendor registry
//!
//! The registry maps local vendor names to [`VendorDescriptor`]s. On disk it
//! is either the `vendors` map of `.vendored/config.json` (monolithic) or one
//! `.vendored/configs/<name>.json` per vendor, with the descriptor under
//! `_vendor` next to consumer-owned keys. [`RegistryStore`] normalizes both
//! into one [`Registry`] value and rewrites the whole encoding on save.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use vendored_fs::constants::{VENDOR_KEY, VENDORS_KEY};
use vendored_fs::{ControlLayout, NormalizedPath, io, load_object, save_object};

use crate::dependency::DependencyMode;
use crate::{Error, Result, VendorDescriptor};

/// Physical encoding of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryLayout {
    Monolithic,
    PerVendor,
}

/// In-memory registry, loaded at operation start and saved as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    layout: RegistryLayout,
    vendors: BTreeMap<String, VendorDescriptor>,
    consumer_keys: BTreeMap<String, Map<String, Value>>,
    settings: Map<String, Value>,
}

impl Registry {
    pub fn empty(layout: RegistryLayout) -> Self {
        Self {
            layout,
            vendors: BTreeMap::new(),
            consumer_keys: BTreeMap::new(),
            settings: Map::new(),
        }
    }

    pub fn layout(&self) -> RegistryLayout {
        self.layout
    }

    pub fn vendors(&self) -> &BTreeMap<String, VendorDescriptor> {
        &self.vendors
    }

    pub fn names(&self) -> Vec<String> {
        self.vendors.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&VendorDescriptor> {
        self.vendors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vendors.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: VendorDescriptor) {
        self.vendors.insert(name.into(), descriptor);
    }

    /// Drop a vendor together with its consumer keys.
    pub fn remove(&mut self, name: &str) -> Option<VendorDescriptor> {
        self.consumer_keys.remove(name);
        self.vendors.remove(name)
    }

    /// Local name under which `repo` is installed, if any.
    pub fn find_by_repo(&self, repo: &str) -> Option<&str> {
        self.vendors
            .iter()
            .find(|(_, descriptor)| descriptor.is_repo(repo))
            .map(|(name, _)| name.as_str())
    }

    pub fn consumer_keys(&self, name: &str) -> Option<&Map<String, Value>> {
        self.consumer_keys.get(name)
    }

    /// `dependency_mode` from the monolithic config file, if set.
    pub fn dependency_mode(&self) -> Result<Option<DependencyMode>> {
        match self.settings.get("dependency_mode") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(mode)) => mode.parse().map(Some),
            Some(other) => Err(Error::InvalidDependencyMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Loads and saves the registry under one control directory.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    layout: ControlLayout,
}

impl RegistryStore {
    pub fn new(layout: ControlLayout) -> Self {
        Self { layout }
    }

    pub fn control_layout(&self) -> &ControlLayout {
        &self.layout
    }

    /// Whether either registry encoding exists.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.layout.registry_file().is_file() || self.layout.uses_per_vendor_configs()?)
    }

    /// Load the registry; per-vendor files win over the monolithic map.
    pub fn load(&self) -> Result<Registry> {
        let monolithic = load_object(&self.layout.registry_file())?;

        if self.layout.uses_per_vendor_configs()? {
            let mut registry = Registry::empty(RegistryLayout::PerVendor);
            if let Some(mut object) = monolithic {
                object.remove(VENDORS_KEY);
                registry.settings = object;
            }
            for path in self.layout.per_vendor_config_files()? {
                let (name, descriptor, consumer) = self.read_vendor_file(&path)?;
                registry.vendors.insert(name.clone(), descriptor);
                registry.consumer_keys.insert(name, consumer);
            }
            return Ok(registry);
        }

        let Some(mut object) = monolithic else {
            return Err(Error::RegistryNotFound {
                path: self.layout.registry_file().to_native(),
            });
        };
        let mut registry = Registry::empty(RegistryLayout::Monolithic);
        registry.vendors = parse_vendor_map(object.remove(VENDORS_KEY))?;
        registry.settings = object;
        Ok(registry)
    }

    /// Every entry visible in either encoding, per-vendor files first.
    ///
    /// Install scripts predating per-vendor files may still register into
    /// `config.json`, so the before/after snapshot must see both.
    pub fn snapshot(&self) -> Result<BTreeMap<String, VendorDescriptor>> {
        let mut entries = match load_object(&self.layout.registry_file())? {
            Some(mut object) => parse_vendor_map(object.remove(VENDORS_KEY))?,
            None => BTreeMap::new(),
        };
        for path in self.layout.per_vendor_config_files()? {
            let (name, descriptor, _) = self.read_vendor_file(&path)?;
            entries.insert(name, descriptor);
        }
        Ok(entries)
    }

    /// Rewrite the registry in its own encoding.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        match registry.layout {
            RegistryLayout::Monolithic => self.save_monolithic(registry),
            RegistryLayout::PerVendor => self.save_per_vendor(registry),
        }
    }

    fn save_monolithic(&self, registry: &Registry) -> Result<()> {
        let mut object = registry.settings.clone();
        let vendors: Map<String, Value> = registry
            .vendors
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.to_value()))
            .collect();
        object.insert(VENDORS_KEY.to_string(), Value::Object(vendors));
        save_object(&self.layout.registry_file(), &object)?;
        Ok(())
    }

    fn save_per_vendor(&self, registry: &Registry) -> Result<()> {
        for (name, descriptor) in &registry.vendors {
            let mut object = registry
                .consumer_keys
                .get(name)
                .cloned()
                .unwrap_or_default();
            object.insert(VENDOR_KEY.to_string(), descriptor.to_value());
            save_object(&self.layout.vendor_config(name), &object)?;
        }

        for path in self.layout.per_vendor_config_files()? {
            let stale = path
                .file_stem()
                .is_some_and(|stem| !registry.vendors.contains_key(stem));
            if stale {
                io::remove_file_if_exists(&path)?;
            }
        }

        self.strip_migrated_from_monolithic(registry)
    }

    /// Remove entries now held in per-vendor files from `config.json`.
    fn strip_migrated_from_monolithic(&self, registry: &Registry) -> Result<()> {
        let path = self.layout.registry_file();
        let Some(mut object) = load_object(&path)? else {
            return Ok(());
        };
        let Some(Value::Object(vendors)) = object.get_mut(VENDORS_KEY) else {
            return Ok(());
        };
        let before = vendors.len();
        vendors.retain(|name, _| !registry.vendors.contains_key(name));
        if vendors.len() == before {
            return Ok(());
        }
        if vendors.is_empty() {
            object.remove(VENDORS_KEY);
        }
        save_object(&path, &object)?;
        Ok(())
    }

    /// Delete one entry from the `vendors` map of `config.json`.
    ///
    /// Used when a script registered a vendor there under a name that is
    /// then changed, so the old key does not resurface on the next load.
    pub fn drop_monolithic_entry(&self, name: &str) -> Result<bool> {
        let path = self.layout.registry_file();
        let Some(mut object) = load_object(&path)? else {
            return Ok(false);
        };
        let Some(Value::Object(vendors)) = object.get_mut(VENDORS_KEY) else {
            return Ok(false);
        };
        if vendors.remove(name).is_none() {
            return Ok(false);
        }
        if vendors.is_empty() {
            object.remove(VENDORS_KEY);
        }
        save_object(&path, &object)?;
        Ok(true)
    }

    fn read_vendor_file(
        &self,
        path: &NormalizedPath,
    ) -> Result<(String, VendorDescriptor, Map<String, Value>)> {
        let name = path.file_stem().unwrap_or_default().to_string();
        let mut object = load_object(path)?.unwrap_or_default();
        match object.remove(VENDOR_KEY) {
            Some(descriptor) => {
                let descriptor = VendorDescriptor::from_value(&name, descriptor)?;
                Ok((name, descriptor, object))
            }
            // Flat legacy file: the whole object is the descriptor.
            None => {
                let descriptor = VendorDescriptor::from_value(&name, Value::Object(object))?;
                Ok((name, descriptor, Map::new()))
            }
        }
    }
}

fn parse_vendor_map(value: Option<Value>) -> Result<BTreeMap<String, VendorDescriptor>> {
    let Some(Value::Object(map)) = value else {
        return Ok(BTreeMap::new());
    };
    map.into_iter()
        .map(|(name, value)| {
            let descriptor = VendorDescriptor::from_value(&name, value)?;
            Ok((name, descriptor))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> RegistryStore {
        RegistryStore::new(ControlLayout::new(temp.path()))
    }

    fn write_json(temp: &TempDir, rel: &str, value: Value) {
        let path = temp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn read_json(temp: &TempDir, rel: &str) -> Value {
        serde_json::from_str(&std::fs::read_to_string(temp.path().join(rel)).unwrap()).unwrap()
    }

    #[test]
    fn missing_registry_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(store(&temp).load(), Err(Error::RegistryNotFound { .. })));
        assert!(!store(&temp).exists().unwrap());
    }

    #[test]
    fn flat_per_vendor_file_is_read_as_descriptor() {
        let temp = TempDir::new().unwrap();
        write_json(
            &temp,
            ".vendored/configs/tool.json",
            json!({"repo": "owner/tool", "protected": [".tool/**"]}),
        );

        let registry = store(&temp).load().unwrap();
        assert_eq!(registry.layout(), RegistryLayout::PerVendor);
        assert_eq!(registry.get("tool").unwrap().repo(), "owner/tool");
        assert!(registry.consumer_keys("tool").unwrap().is_empty());
    }

    #[test]
    fn settings_survive_per_vendor_layout() {
        let temp = TempDir::new().unwrap();
        write_json(&temp, ".vendored/config.json", json!({"dependency_mode": "warn"}));
        write_json(
            &temp,
            ".vendored/configs/tool.json",
            json!({"_vendor": {"repo": "owner/tool", "protected": []}}),
        );

        let registry = store(&temp).load().unwrap();
        assert_eq!(registry.dependency_mode().unwrap(), Some(DependencyMode::Warn));
    }

    #[test]
    fn per_vendor_save_moves_entries_out_of_monolithic_file() {
        let temp = TempDir::new().unwrap();
        write_json(
            &temp,
            ".vendored/config.json",
            json!({"vendors": {"new-tool": {"repo": "owner/new-tool", "protected": []}}}),
        );
        write_json(
            &temp,
            ".vendored/configs/tool.json",
            json!({"_vendor": {"repo": "owner/tool", "protected": []}}),
        );
        let store = store(&temp);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);

        let mut registry = store.load().unwrap();
        registry.insert("new-tool", snapshot["new-tool"].clone());
        store.save(&registry).unwrap();

        assert_eq!(read_json(&temp, ".vendored/config.json"), json!({}));
        assert_eq!(
            read_json(&temp, ".vendored/configs/new-tool.json")["_vendor"]["repo"],
            "owner/new-tool"
        );
    }

    #[test]
    fn invalid_dependency_mode_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_json(
            &temp,
            ".vendored/config.json",
            json!({"vendors": {}, "dependency_mode": "sometimes"}),
        );
        let registry = store(&temp).load().unwrap();
        assert!(matches!(
            registry.dependency_mode(),
            Err(Error::InvalidDependencyMode { .. })
        ));
    }
}
