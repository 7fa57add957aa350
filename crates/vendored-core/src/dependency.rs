//! Inter-vendor dependencies
//!
//! A vendor declares dependencies in a `deps.json` file next to its install
//! script:
//!
//! ```json
//! {"git-semver": {"repo": "mangimangi/git-semver"}}
//! ```
//!
//! Declarations are satisfied by repository identity, not by local name, so
//! a dependency installed under a custom name still counts. After install the
//! local names are persisted in `.deps`, from which [`DependencyGraph`]
//! orders bulk updates dependency-first.
//!
//! # Example
//!
//! ```
//! use vendored_core::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("pearls");
//! graph.add_node("git-semver");
//! graph.add_edge("pearls", "git-semver");
//!
//! let order = graph.topological_sort().unwrap();
//! assert_eq!(order, vec!["git-semver", "pearls"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, ManifestStore, Registry, Result};

/// What to do about declared dependencies that are not installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyMode {
    /// Fail, listing every missing dependency.
    #[default]
    Error,
    /// Report missing dependencies and carry on.
    Warn,
    /// Install missing dependencies first.
    Install,
    /// Ignore declarations entirely.
    Skip,
}

impl DependencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Install => "install",
            Self::Skip => "skip",
        }
    }

    /// CLI flag first, then the registry setting, then `error`.
    pub fn resolve(flag: Option<DependencyMode>, registry: &Registry) -> Result<Self> {
        match flag {
            Some(mode) => Ok(mode),
            None => Ok(registry.dependency_mode()?.unwrap_or_default()),
        }
    }
}

impl FromStr for DependencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "install" => Ok(Self::Install),
            "skip" => Ok(Self::Skip),
            _ => Err(Error::InvalidDependencyMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub repo: String,
}

/// Declared dependencies keyed by their upstream display name.
pub type DeclaredDeps = BTreeMap<String, DependencySpec>;

/// Parse a `deps.json` payload. Malformed content counts as "no dependencies".
pub fn parse_declared_deps(repo: &str, bytes: &[u8]) -> Option<DeclaredDeps> {
    match serde_json::from_slice::<DeclaredDeps>(bytes) {
        Ok(deps) => Some(deps),
        Err(e) => {
            tracing::warn!(repo, error = %e, "Ignoring malformed deps.json");
            None
        }
    }
}

/// Repository identities being installed in the current invocation.
///
/// Threaded through nested installs so a dependency chain that leads back to
/// a repository already in progress is caught before anything runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallingSet {
    repos: BTreeSet<String>,
}

impl InstallingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, repo: &str) -> bool {
        self.repos.contains(&repo.to_ascii_lowercase())
    }

    /// Mark `repo` as in progress; `false` if it already was.
    pub fn enter(&mut self, repo: &str) -> bool {
        self.repos.insert(repo.to_ascii_lowercase())
    }

    pub fn leave(&mut self, repo: &str) {
        self.repos.remove(&repo.to_ascii_lowercase());
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Outcome of matching declarations against the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyCheck {
    /// Declared name and the local vendor name that satisfies it.
    pub satisfied: Vec<(String, String)>,
    pub missing: Vec<(String, DependencySpec)>,
}

impl DependencyCheck {
    fn describe_missing(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|(name, spec)| format!("{name} ({})", spec.repo))
            .collect()
    }
}

/// Split declarations into satisfied and missing, matching by repo identity.
pub fn check_deps(declared: &DeclaredDeps, registry: &Registry) -> DependencyCheck {
    let mut check = DependencyCheck::default();
    for (name, spec) in declared {
        match registry.find_by_repo(&spec.repo) {
            Some(local) => check.satisfied.push((name.clone(), local.to_string())),
            None => check.missing.push((name.clone(), spec.clone())),
        }
    }
    check
}

/// Apply `mode` to the declarations of one vendor.
///
/// `install_missing` installs one missing dependency and returns the local
/// name it was registered under. Returns the dependency names to persist in
/// `.deps`: local names where satisfied, declared names otherwise.
pub fn resolve_deps<F>(
    declared: &DeclaredDeps,
    registry: &Registry,
    mode: DependencyMode,
    installing: &InstallingSet,
    mut install_missing: F,
) -> Result<Vec<String>>
where
    F: FnMut(&str, &DependencySpec) -> Result<String>,
{
    let check = check_deps(declared, registry);
    let mut recorded: Vec<String> = check.satisfied.iter().map(|(_, local)| local.clone()).collect();

    if mode == DependencyMode::Skip {
        recorded.extend(check.missing.iter().map(|(name, _)| name.clone()));
        return Ok(recorded);
    }

    let mut cyclic: Vec<String> = declared
        .values()
        .filter(|spec| installing.contains(&spec.repo))
        .map(|spec| spec.repo.clone())
        .collect();
    if !cyclic.is_empty() {
        cyclic.sort();
        cyclic.dedup();
        return Err(Error::CircularDependency { repos: cyclic });
    }

    match mode {
        DependencyMode::Error if !check.missing.is_empty() => Err(Error::MissingDependencies {
            missing: check.describe_missing(),
        }),
        DependencyMode::Warn if !check.missing.is_empty() => {
            tracing::warn!(
                missing = %check.describe_missing().join(", "),
                "Warning: missing dependencies"
            );
            recorded.extend(check.missing.iter().map(|(name, _)| name.clone()));
            Ok(recorded)
        }
        DependencyMode::Install => {
            for (name, spec) in &check.missing {
                tracing::info!(dependency = %name, repo = %spec.repo, "Installing missing dependency");
                recorded.push(install_missing(name, spec)?);
            }
            Ok(recorded)
        }
        _ => Ok(recorded),
    }
}

/// Dependency graph over installed vendors.
///
/// Edges point from dependent to dependency: if A depends on B, the edge is
/// `A -> B` and B sorts before A.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeSet<String>,
    /// Adjacency list: key depends on each value.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of `vendors` with edges from their persisted `.deps`.
    ///
    /// Edges to names outside `vendors` are dropped; those dependencies are
    /// satisfied from elsewhere.
    pub fn from_manifests<I, S>(vendors: I, manifests: &ManifestStore) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for vendor in vendors {
            graph.add_node(vendor);
        }
        let names: Vec<String> = graph.nodes.iter().cloned().collect();
        for vendor in &names {
            for dep in manifests.read_deps(vendor)?.unwrap_or_default() {
                graph.add_edge(vendor, &dep);
            }
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.edges.entry(name.clone()).or_default();
        self.nodes.insert(name);
    }

    /// Declare that `from` depends on `to`. Ignored unless both are nodes.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if !self.nodes.contains(from) || !self.nodes.contains(to) {
            return;
        }
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Vendors that depend directly on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(name))
            .map(|(from, _)| from.as_str())
            .collect()
    }

    /// Kahn's algorithm, dependency-first, alphabetical among ready nodes.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` naming every vendor left unsorted.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), self.edges.get(n).map_or(0, BTreeSet::len)))
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(current) = ready.pop_first() {
            order.push(current.to_string());
            for dependent in self.dependents_of(current) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let participants = self
                .nodes
                .iter()
                .filter(|n| !order.contains(n))
                .cloned()
                .collect();
            return Err(Error::DependencyCycle { participants });
        }
        Ok(order)
    }
}
