//! Core engine for vendored
//!
//! Installs versioned tool bundles from source-host repositories into the
//! host repository, records what each install produced, orders updates by
//! declared dependencies, guards vendored files against hand edits, and
//! vets install scripts before they are trusted.
//!
//! Every external effect goes through the [`SourceHost`](vendored_host::SourceHost)
//! and [`SourceControl`](vendored_host::SourceControl) seams, so orchestration
//! here is testable without a network.

pub mod auth;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod migrate;
pub mod protection;
pub mod publisher;
pub mod registry;
pub mod remover;
pub mod results;
pub mod script;
pub mod validator;
pub mod version;

pub use dependency::{DeclaredDeps, DependencyGraph, DependencyMode, DependencySpec};
pub use descriptor::VendorDescriptor;
pub use error::{Error, ErrorCategory, Result};
pub use installer::{InstallOptions, InstallResult, Installer, InstallingSet};
pub use manifest::ManifestStore;
pub use migrate::ConfigMigrator;
pub use protection::{GlobSet, ProtectedSet, ProtectionEngine, Violation};
pub use publisher::{PrMetadata, PrPublisher, PublishOutcome};
pub use registry::{Registry, RegistryLayout, RegistryStore};
pub use remover::{RemovalPlan, RemovalReport, Remover};
pub use script::{ScriptEnv, ScriptOutcome, ScriptRunner};
pub use validator::{CheckStatus, ValidationCheck, ValidationReport, Validator};
pub use version::VersionResolver;

/// Install script expected at the root of every vendored repository.
pub const INSTALL_SCRIPT: &str = "install.sh";

/// Fallback version file consulted when a repository has no releases.
pub const VERSION_FILE: &str = "VERSION";

/// Dependency declaration fetched alongside the install script.
pub const DEPS_FILE: &str = "deps.json";
