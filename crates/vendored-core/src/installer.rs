//! Installing and updating vendors
//!
//! An install moves through pre-validation (repository and script exist,
//! not already registered, not already in progress), dependency resolution,
//! script execution under the install contract, and capture. Capture either
//! reads the manifest the script wrote (`VENDOR_MANIFEST`) or, for scripts
//! that register themselves, diffs the registry before and after the run.

use std::collections::BTreeMap;
use std::fs;

use serde::Serialize;
use vendored_fs::{ControlLayout, escapes_root};
use vendored_host::SourceHost;

use crate::dependency::{parse_declared_deps, resolve_deps};
use crate::descriptor::repo_basename;
use crate::registry::RegistryLayout;
use crate::script::{ScriptEnv, ScriptRunner, read_script_manifest};
use crate::version::versions_match;
use crate::{
    DEPS_FILE, DependencyGraph, DependencyMode, Error, INSTALL_SCRIPT, ManifestStore,
    RegistryStore, Result, VendorDescriptor, VersionResolver, auth,
};

pub use crate::dependency::InstallingSet;

/// Version reported for a vendor that was not installed before.
pub const NO_VERSION: &str = "none";

/// Outcome of installing or updating one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallResult {
    pub vendor: String,
    pub old_version: String,
    pub new_version: String,
    pub changed: bool,
}

/// Caller choices shared by every install entry point.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Ref to install; `None` or `latest` resolves the newest version.
    pub reference: Option<String>,
    /// Local name for a new vendor.
    pub name: Option<String>,
    /// Re-run even when already at the target version.
    pub force: bool,
    pub dep_mode: DependencyMode,
}

/// What a script run needs to know about its vendor.
struct Execution<'x> {
    repo: &'x str,
    version: &'x str,
    vendor: &'x str,
    descriptor: Option<&'x VendorDescriptor>,
    token: Option<&'x str>,
}

pub struct Installer<'a> {
    layout: ControlLayout,
    registry: RegistryStore,
    manifests: ManifestStore,
    host: &'a dyn SourceHost,
    runner: ScriptRunner,
}

impl<'a> Installer<'a> {
    pub fn new(layout: ControlLayout, host: &'a dyn SourceHost) -> Self {
        Self {
            registry: RegistryStore::new(layout.clone()),
            manifests: ManifestStore::new(layout.clone()),
            layout,
            host,
            runner: ScriptRunner::default(),
        }
    }

    pub fn with_runner(mut self, runner: ScriptRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Relative scratch root for `vendor`, or `None` to install in place.
    pub fn install_root(&self, vendor: &str, descriptor: Option<&VendorDescriptor>) -> Option<String> {
        match descriptor {
            Some(d) if d.dogfood => None,
            _ => Some(self.layout.package_relative(vendor)),
        }
    }

    /// Add a vendor that is not yet registered.
    pub fn install_new_vendor(
        &self,
        repo: &str,
        options: &InstallOptions,
        token: Option<&str>,
        installing: &mut InstallingSet,
    ) -> Result<InstallResult> {
        if !self.host.repo_exists(repo, token)? {
            return Err(Error::RepoNotFound {
                repo: repo.to_string(),
            });
        }
        if !self.host.file_exists(repo, INSTALL_SCRIPT, token)? {
            return Err(Error::MissingInstallScript {
                repo: repo.to_string(),
            });
        }

        let registry = self.registry.load()?;
        if let Some(existing) = registry.find_by_repo(repo) {
            return Err(Error::AlreadyRegistered {
                repo: repo.to_string(),
                name: existing.to_string(),
            });
        }
        if installing.contains(repo) {
            return Err(Error::CircularDependency {
                repos: vec![repo.to_string()],
            });
        }

        let version = VersionResolver::new(self.host).resolve(repo, options.reference.as_deref(), token)?;

        installing.enter(repo);
        let outcome = self.add_vendor(repo, &version, options, token, installing);
        installing.leave(repo);
        outcome
    }

    fn add_vendor(
        &self,
        repo: &str,
        version: &str,
        options: &InstallOptions,
        token: Option<&str>,
        installing: &mut InstallingSet,
    ) -> Result<InstallResult> {
        let deps = self.resolve_declared(repo, version, token, options.dep_mode, installing)?;

        let requested = options.name.as_deref().unwrap_or_else(|| repo_basename(repo));
        let before = self.registry.snapshot()?;
        let files = self.fetch_and_run(&Execution {
            repo,
            version,
            vendor: requested,
            descriptor: None,
            token,
        })?;
        let after = self.registry.snapshot()?;

        let registered = pick_registration(repo, &before, &after)?;
        let (script_key, name, descriptor) = match (registered, &files) {
            (Some((key, descriptor)), _) => {
                let name = options.name.clone().unwrap_or_else(|| key.clone());
                descriptor.validate(&name)?;
                (Some(key), name, descriptor)
            }
            (None, Some(_)) => (
                None,
                requested.to_string(),
                VendorDescriptor::for_manifest_install(requested, repo),
            ),
            (None, None) => {
                return Err(Error::InstallDidNotRegister {
                    repo: repo.to_string(),
                });
            }
        };

        if let Some(files) = &files {
            self.check_manifest(&name, files)?;
        }

        let mut registry = self.registry.load()?;
        if let Some(key) = script_key.as_deref().filter(|key| *key != name) {
            registry.remove(key);
            if registry.layout() == RegistryLayout::PerVendor {
                self.registry.drop_monolithic_entry(key)?;
            }
        }
        registry.insert(name.clone(), descriptor);
        self.registry.save(&registry)?;

        self.record(&name, version, files.as_deref(), &deps)?;
        tracing::info!(vendor = %name, repo, version, "Added vendor");

        Ok(InstallResult {
            vendor: name,
            old_version: NO_VERSION.to_string(),
            new_version: version.to_string(),
            changed: true,
        })
    }

    /// Update a registered vendor to the requested version.
    ///
    /// At the target version already and not forced: nothing is fetched,
    /// run or written.
    pub fn install_existing_vendor(
        &self,
        name: &str,
        descriptor: &VendorDescriptor,
        options: &InstallOptions,
        token: Option<&str>,
    ) -> Result<InstallResult> {
        let repo = descriptor.repo();
        let current = self.manifests.get_current_version(name, descriptor)?;
        let target = VersionResolver::new(self.host).resolve(repo, options.reference.as_deref(), token)?;

        let up_to_date = current.as_deref().is_some_and(|c| versions_match(c, &target));
        if up_to_date && !options.force {
            tracing::debug!(vendor = name, version = %target, "Already up to date");
            return Ok(InstallResult {
                vendor: name.to_string(),
                old_version: current.unwrap_or_else(|| NO_VERSION.to_string()),
                new_version: target,
                changed: false,
            });
        }

        let mut installing = InstallingSet::new();
        installing.enter(repo);
        let deps = self.resolve_declared(repo, &target, token, options.dep_mode, &mut installing)?;

        let files = self.fetch_and_run(&Execution {
            repo,
            version: &target,
            vendor: name,
            descriptor: Some(descriptor),
            token,
        })?;

        match &files {
            Some(files) => self.check_manifest(name, files)?,
            None => self.reconcile_self_registration(name, descriptor)?,
        }
        self.record(name, &target, files.as_deref(), &deps)?;

        Ok(InstallResult {
            vendor: name.to_string(),
            old_version: current.unwrap_or_else(|| NO_VERSION.to_string()),
            new_version: target,
            changed: true,
        })
    }

    /// Update every registered vendor, dependencies before dependents.
    pub fn install_all(&self, options: &InstallOptions) -> Result<Vec<InstallResult>> {
        let registry = self.registry.load()?;
        let order = DependencyGraph::from_manifests(registry.names(), &self.manifests)?
            .topological_sort()?;

        let mut results = Vec::with_capacity(order.len());
        for name in order {
            let registry = self.registry.load()?;
            let Some(descriptor) = registry.get(&name) else {
                continue;
            };
            let token = auth::token_for(Some((&name, descriptor)))?;
            results.push(self.install_existing_vendor(&name, descriptor, options, token.as_deref())?);
        }
        Ok(results)
    }

    /// Fetch `deps.json` at the install ref and apply the dependency mode.
    fn resolve_declared(
        &self,
        repo: &str,
        version: &str,
        token: Option<&str>,
        mode: DependencyMode,
        installing: &mut InstallingSet,
    ) -> Result<Vec<String>> {
        let Some(bytes) = self.fetch_at_version(repo, DEPS_FILE, version, token)? else {
            return Ok(Vec::new());
        };
        let Some(declared) = parse_declared_deps(repo, &bytes) else {
            return Ok(Vec::new());
        };
        if declared.is_empty() {
            return Ok(Vec::new());
        }

        let registry = self.registry.load()?;
        let in_progress = installing.clone();
        resolve_deps(&declared, &registry, mode, &in_progress, |name, spec| {
            // An earlier dependency may have pulled this one in transitively.
            let current = self.registry.load()?;
            if let Some(local) = current.find_by_repo(&spec.repo) {
                tracing::debug!(dependency = %name, vendor = %local, "Dependency already installed");
                return Ok(local.to_string());
            }
            let dep_token = auth::token_for(None)?;
            let options = InstallOptions {
                dep_mode: mode,
                ..InstallOptions::default()
            };
            self.install_new_vendor(&spec.repo, &options, dep_token.as_deref(), installing)
                .map(|result| result.vendor)
        })
    }

    /// Try `v<version>` then `<version>`.
    fn fetch_at_version(
        &self,
        repo: &str,
        path: &str,
        version: &str,
        token: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        let mut refs = Vec::with_capacity(2);
        if !version.starts_with('v') {
            refs.push(format!("v{version}"));
        }
        refs.push(version.to_string());

        for reference in refs {
            if let Some(bytes) = self.host.file_at_ref(repo, path, Some(&reference), token)? {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    /// Download and run the install script; returns the manifest it wrote.
    fn fetch_and_run(&self, exec: &Execution<'_>) -> Result<Option<Vec<String>>> {
        let script = self
            .fetch_at_version(exec.repo, INSTALL_SCRIPT, exec.version, exec.token)?
            .ok_or_else(|| Error::ScriptUnavailable {
                repo: exec.repo.to_string(),
                version: exec.version.to_string(),
            })?;

        let scratch = tempfile::Builder::new()
            .prefix("vendored-install-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let script_path = scratch.path().join(INSTALL_SCRIPT);
        fs::write(&script_path, &script).map_err(|e| Error::io(&script_path, e))?;
        let manifest_path = scratch.path().join("manifest");

        let install_dir = self.install_root(exec.vendor, exec.descriptor);
        if let Some(dir) = &install_dir {
            let native = self.layout.resolve(dir).to_native();
            fs::create_dir_all(&native).map_err(|e| Error::io(&native, e))?;
        }

        let env = ScriptEnv {
            reference: exec.version.to_string(),
            repo: exec.repo.to_string(),
            install_dir,
            manifest: manifest_path.clone(),
            vendor_name: Some(exec.vendor.to_string()),
            token: exec.token.map(str::to_string),
        };
        let outcome = self
            .runner
            .run(&script_path, &self.layout.root().to_native(), &env)?;
        if !outcome.success() {
            return Err(Error::ScriptFailed {
                repo: exec.repo.to_string(),
                exit_code: outcome.exit_code,
            });
        }

        read_script_manifest(&manifest_path)
    }

    fn check_manifest(&self, vendor: &str, files: &[String]) -> Result<()> {
        let escaping: Vec<String> = files.iter().filter(|f| escapes_root(f)).cloned().collect();
        if !escaping.is_empty() {
            return Err(Error::ManifestPathEscapes {
                vendor: vendor.to_string(),
                files: escaping,
            });
        }
        let missing = self.manifests.missing_files(files);
        if !missing.is_empty() {
            return Err(Error::ManifestFilesMissing {
                vendor: vendor.to_string(),
                files: missing,
            });
        }
        if let Some((owner, shared)) = self.manifests.find_overlap(vendor, files)? {
            return Err(Error::ManifestConflict {
                vendor: vendor.to_string(),
                owner,
                files: shared,
            });
        }
        Ok(())
    }

    /// Persist what a self-registering script left in either registry encoding.
    fn reconcile_self_registration(&self, name: &str, previous: &VendorDescriptor) -> Result<()> {
        let mut registry = self.registry.load()?;
        let written = self.registry.snapshot()?.remove(name);
        let descriptor = written.unwrap_or_else(|| previous.clone());
        descriptor.validate(name)?;
        if registry.get(name) != Some(&descriptor) {
            registry.insert(name, descriptor);
            self.registry.save(&registry)?;
        }
        Ok(())
    }

    fn record(&self, vendor: &str, version: &str, files: Option<&[String]>, deps: &[String]) -> Result<()> {
        if let Some(files) = files {
            self.manifests.write_files(vendor, files)?;
        }
        self.manifests.write_version(vendor, version)?;
        if !deps.is_empty() {
            self.manifests.write_deps(vendor, deps)?;
        }
        Ok(())
    }
}

/// Find the single entry a script added to the registry.
///
/// Several new entries are tolerated only when exactly one of them points at
/// the repository being installed.
fn pick_registration(
    repo: &str,
    before: &BTreeMap<String, VendorDescriptor>,
    after: &BTreeMap<String, VendorDescriptor>,
) -> Result<Option<(String, VendorDescriptor)>> {
    let added: Vec<(&String, &VendorDescriptor)> = after
        .iter()
        .filter(|(name, _)| !before.contains_key(*name))
        .collect();

    match added.as_slice() {
        [] => Ok(None),
        [(name, descriptor)] => Ok(Some(((*name).clone(), (*descriptor).clone()))),
        many => {
            let matching: Vec<_> = many.iter().filter(|(_, d)| d.is_repo(repo)).collect();
            match matching.as_slice() {
                [(name, descriptor)] => Ok(Some(((*name).clone(), (*descriptor).clone()))),
                _ => Err(Error::AmbiguousRegistration {
                    repo: repo.to_string(),
                    names: many.iter().map(|(name, _)| (*name).clone()).collect(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(repo: &str) -> VendorDescriptor {
        VendorDescriptor {
            repo: Some(repo.into()),
            protected: Some(vec![]),
            ..VendorDescriptor::default()
        }
    }

    #[test]
    fn registration_diff_finds_new_entry() {
        let before = BTreeMap::from([("old".to_string(), entry("o/old"))]);
        let mut after = before.clone();
        after.insert("new-tool".into(), entry("owner/new-tool"));

        let (name, _) = pick_registration("owner/new-tool", &before, &after)
            .unwrap()
            .unwrap();
        assert_eq!(name, "new-tool");
    }

    #[test]
    fn registration_diff_without_change_is_none() {
        let before = BTreeMap::from([("old".to_string(), entry("o/old"))]);
        assert!(pick_registration("o/x", &before, &before).unwrap().is_none());
    }

    #[test]
    fn several_new_entries_resolved_by_repo() {
        let before = BTreeMap::new();
        let after = BTreeMap::from([
            ("helper".to_string(), entry("o/helper")),
            ("tool".to_string(), entry("o/tool")),
        ]);
        let (name, _) = pick_registration("o/tool", &before, &after).unwrap().unwrap();
        assert_eq!(name, "tool");

        let err = pick_registration("o/other", &before, &after).unwrap_err();
        assert!(matches!(err, Error::AmbiguousRegistration { names, .. } if names.len() == 2));
    }
}
