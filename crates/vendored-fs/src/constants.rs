//! Names of the entries inside the `.vendored/` control directory.

use std::path::Path;

/// Reserved key wrapping the descriptor inside a per-vendor config file.
pub const VENDOR_KEY: &str = "_vendor";

/// Key holding the vendor map inside the monolithic registry.
pub const VENDORS_KEY: &str = "vendors";

/// Fixed entries of the control directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPath {
    /// The `.vendored` directory itself
    ControlDir,
    /// Monolithic registry file, `config.json`
    RegistryFile,
    /// Directory of per-vendor config files, `configs`
    ConfigsDir,
    /// Directory of per-vendor manifest artifacts, `manifests`
    ManifestsDir,
    /// Scratch install roots for non-dogfood vendors, `pkg`
    PackagesDir,
    /// Hook scripts shipped by the dogfood install, `hooks`
    HooksDir,
    /// The `.git` directory of the host repository
    GitDir,
}

impl ControlPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlDir => ".vendored",
            Self::RegistryFile => "config.json",
            Self::ConfigsDir => "configs",
            Self::ManifestsDir => "manifests",
            Self::PackagesDir => "pkg",
            Self::HooksDir => "hooks",
            Self::GitDir => ".git",
        }
    }
}

impl AsRef<Path> for ControlPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ControlPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ControlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Manifest artifact kinds stored under `manifests/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ManifestArtifact {
    Files,
    Version,
    Deps,
}

impl ManifestArtifact {
    pub const ALL: [ManifestArtifact; 3] = [Self::Files, Self::Version, Self::Deps];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Version => "version",
            Self::Deps => "deps",
        }
    }
}
