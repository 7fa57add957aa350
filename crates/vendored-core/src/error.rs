//! Error types for vendored-core

use std::path::PathBuf;

/// Result type for vendored-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing repository or script, unresolvable version
    Structural,
    /// The install ran but did not leave a usable registry entry
    Registration,
    /// Missing, circular or self dependencies
    Dependency,
    /// Staged edits to protected files
    Protection,
    /// Legacy config could not be migrated
    Migration,
    /// Filesystem, credentials, external tools
    Environment,
}

/// Errors that can occur in vendored-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Repository '{repo}' was not found on the source host")]
    RepoNotFound { repo: String },

    #[error("Repository '{repo}' has no install.sh at its root")]
    MissingInstallScript { repo: String },

    #[error("Cannot resolve a version for '{repo}': no release and no VERSION file")]
    VersionUnresolvable { repo: String },

    #[error("install.sh for '{repo}' could not be downloaded at version {version}")]
    ScriptUnavailable { repo: String, version: String },

    #[error("install.sh for '{repo}' failed with exit code {}", exit_code.map_or_else(|| "none (killed)".to_string(), |c| c.to_string()))]
    ScriptFailed { repo: String, exit_code: Option<i32> },

    #[error("'{repo}' is already installed as vendor '{name}'")]
    AlreadyRegistered { repo: String, name: String },

    #[error("install.sh for '{repo}' finished without registering a vendor")]
    InstallDidNotRegister { repo: String },

    #[error("install.sh for '{repo}' registered more than one vendor: {}", names.join(", "))]
    AmbiguousRegistration { repo: String, names: Vec<String> },

    #[error("Vendor '{name}' is missing required field(s): {}", fields.join(", "))]
    InvalidDescriptor { name: String, fields: Vec<String> },

    #[error("Registry entry '{name}' is malformed: {message}")]
    MalformedDescriptor { name: String, message: String },

    #[error("Manifest for '{vendor}' lists files that do not exist: {}", files.join(", "))]
    ManifestFilesMissing { vendor: String, files: Vec<String> },

    #[error("Manifest for '{vendor}' lists paths outside the repository: {}", files.join(", "))]
    ManifestPathEscapes { vendor: String, files: Vec<String> },

    #[error("Manifest for '{vendor}' claims files already owned by '{owner}': {}", files.join(", "))]
    ManifestConflict {
        vendor: String,
        owner: String,
        files: Vec<String>,
    },

    #[error("Circular dependency detected: {}", repos.join(", "))]
    CircularDependency { repos: Vec<String> },

    #[error("Missing dependencies: {}", missing.join(", "))]
    MissingDependencies { missing: Vec<String> },

    #[error("Dependency cycle among installed vendors: {}", participants.join(", "))]
    DependencyCycle { participants: Vec<String> },

    #[error("{count} protected file(s) staged for commit")]
    ProtectionViolations { count: usize },

    #[error("Vendor '{vendor}' has no manifest; refusing to guess which files it owns")]
    NoManifest { vendor: String },

    #[error("Unknown vendor '{name}'")]
    UnknownVendor { name: String, known: Vec<String> },

    #[error("No vendored registry found at {path}")]
    RegistryNotFound { path: PathBuf },

    #[error("Vendor '{vendor}' is private and VENDOR_PAT is not set")]
    MissingToken { vendor: String },

    #[error("Invalid dependency mode '{value}' (expected error, warn, install or skip)")]
    InvalidDependencyMode { value: String },

    #[error("Legacy config {path} could not be migrated: {message}")]
    LegacyConfigUnreadable { path: PathBuf, message: String },

    #[error("Pre-commit hook source not found at {path}")]
    HookSourceMissing { path: PathBuf },

    #[error(transparent)]
    Fs(#[from] vendored_fs::Error),

    #[error(transparent)]
    Host(#[from] vendored_host::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RepoNotFound { .. }
            | Self::MissingInstallScript { .. }
            | Self::VersionUnresolvable { .. }
            | Self::ScriptUnavailable { .. }
            | Self::ScriptFailed { .. }
            | Self::UnknownVendor { .. }
            | Self::NoManifest { .. } => ErrorCategory::Structural,
            Self::AlreadyRegistered { .. }
            | Self::InstallDidNotRegister { .. }
            | Self::AmbiguousRegistration { .. }
            | Self::InvalidDescriptor { .. }
            | Self::MalformedDescriptor { .. }
            | Self::ManifestFilesMissing { .. }
            | Self::ManifestPathEscapes { .. }
            | Self::ManifestConflict { .. } => ErrorCategory::Registration,
            Self::CircularDependency { .. }
            | Self::MissingDependencies { .. }
            | Self::DependencyCycle { .. }
            | Self::InvalidDependencyMode { .. } => ErrorCategory::Dependency,
            Self::ProtectionViolations { .. } => ErrorCategory::Protection,
            Self::LegacyConfigUnreadable { .. } => ErrorCategory::Migration,
            Self::RegistryNotFound { .. }
            | Self::MissingToken { .. }
            | Self::HookSourceMissing { .. }
            | Self::Fs(_)
            | Self::Host(_)
            | Self::Io { .. } => ErrorCategory::Environment,
        }
    }

    /// Actionable suggestion shown under the error message.
    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            Self::RepoNotFound { .. } => {
                "Check the owner/name spelling; private repositories need VENDOR_PAT".to_string()
            }
            Self::MissingInstallScript { .. } => {
                "The repository must ship an install.sh at its root to be vendored".to_string()
            }
            Self::VersionUnresolvable { .. } => {
                "Publish a release, add a VERSION file, or pass --version <ref>".to_string()
            }
            Self::ScriptUnavailable { version, .. } => {
                format!("Make sure tag v{version} (or {version}) exists upstream")
            }
            Self::ScriptFailed { .. } => {
                "Run `vendored validate <repo>` to dry-run the script in isolation".to_string()
            }
            Self::AlreadyRegistered { name, .. } => {
                format!("Update it with `vendored install {name}` instead")
            }
            Self::InstallDidNotRegister { .. } | Self::AmbiguousRegistration { .. } => {
                "install.sh must either write a manifest to $VENDOR_MANIFEST or add exactly one entry to the registry".to_string()
            }
            Self::InvalidDescriptor { .. } | Self::MalformedDescriptor { .. } => {
                "Every vendor entry needs at least \"repo\" and \"protected\"".to_string()
            }
            Self::ManifestFilesMissing { .. } => {
                "install.sh must only list files it actually created".to_string()
            }
            Self::ManifestPathEscapes { .. } => {
                "Manifest entries must be repository-relative paths without '..' segments".to_string()
            }
            Self::ManifestConflict { owner, .. } => {
                format!("Remove '{owner}' first or change the install paths so they do not overlap")
            }
            Self::CircularDependency { .. } | Self::DependencyCycle { .. } => {
                "Break the cycle by removing one of the declared dependencies".to_string()
            }
            Self::MissingDependencies { .. } => {
                "Install them first, or rerun with --deps install (or --deps warn)".to_string()
            }
            Self::InvalidDependencyMode { .. } => {
                "Set dependency_mode to one of: error, warn, install, skip".to_string()
            }
            Self::ProtectionViolations { .. } => {
                "Revert those edits (git restore --staged <path>) or make the change upstream and update via the vendor's install branch".to_string()
            }
            Self::NoManifest { vendor } => {
                format!("Reinstall '{vendor}' with --force to record a manifest, then remove it")
            }
            Self::UnknownVendor { known, .. } => {
                if known.is_empty() {
                    "No vendors are installed yet; pass an owner/name repo to add one".to_string()
                } else {
                    format!("Known vendors: {}", known.join(", "))
                }
            }
            Self::RegistryNotFound { .. } => {
                "Bootstrap the .vendored/ control directory first".to_string()
            }
            Self::MissingToken { .. } => {
                "Export VENDOR_PAT with read access to the private repository".to_string()
            }
            Self::LegacyConfigUnreadable { .. } => {
                "Fix or delete the legacy file; migration will resume on the next run".to_string()
            }
            Self::HookSourceMissing { .. } => {
                "Install the vendored tooling itself before installing the hook".to_string()
            }
            Self::Fs(_) | Self::Host(_) | Self::Io { .. } => return None,
        };
        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_errors_list_every_offender() {
        let err = Error::MissingDependencies {
            missing: vec!["a (o/a)".into(), "b (o/b)".into()],
        };
        assert_eq!(err.to_string(), "Missing dependencies: a (o/a), b (o/b)");
        assert_eq!(err.category(), ErrorCategory::Dependency);
        assert!(err.hint().unwrap().contains("--deps install"));
    }

    #[test]
    fn killed_script_has_no_exit_code() {
        let err = Error::ScriptFailed {
            repo: "o/t".into(),
            exit_code: None,
        };
        assert!(err.to_string().contains("none (killed)"));
    }

    #[test]
    fn escaping_manifest_is_a_registration_error() {
        let err = Error::ManifestPathEscapes {
            vendor: "tool".into(),
            files: vec!["../victim.txt".into()],
        };
        assert_eq!(
            err.to_string(),
            "Manifest for 'tool' lists paths outside the repository: ../victim.txt"
        );
        assert_eq!(err.category(), ErrorCategory::Registration);
        assert!(err.hint().unwrap().contains("'..'"));
    }
}
