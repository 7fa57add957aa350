//! Pre-commit protection of vendored files
//!
//! A vendor's protected set is its manifest file list when one exists, and
//! its `protected` glob patterns otherwise. Staged changes to protected paths
//! are violations unless an `allowed` pattern exempts them or the commit is
//! on that vendor's own install branch.
//!
//! Glob syntax: `*` and `?` stay within one path segment, `**` crosses
//! segments, `[...]` is a character class. A pattern also matches its exact
//! literal text.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use vendored_fs::{ControlLayout, NormalizedPath, normalize_relative};

use crate::{Error, ManifestStore, Registry, Result, VendorDescriptor};

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    regex.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    regex.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            '[' => match chars[i + 1..].iter().position(|c| *c == ']') {
                Some(len) if len > 0 => {
                    let class: String = chars[i + 1..i + 1 + len].iter().collect();
                    let class = class.strip_prefix('!').map_or(class.clone(), |rest| format!("^{rest}"));
                    regex.push('[');
                    regex.push_str(&class.replace('\\', "\\\\"));
                    regex.push(']');
                    i += len + 2;
                    continue;
                }
                _ => regex.push_str("\\["),
            },
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    regex.push('$');
    regex
}

pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    if path == pattern {
        return true;
    }
    Regex::new(&glob_to_regex(pattern)).is_ok_and(|re| re.is_match(path))
}

/// Patterns compiled once for matching many paths.
#[derive(Debug, Clone)]
pub struct GlobSet {
    globs: Vec<(String, Option<Regex>)>,
}

impl GlobSet {
    /// Patterns that do not compile still match their literal text.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let globs = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                (pattern.to_string(), Regex::new(&glob_to_regex(pattern)).ok())
            })
            .collect();
        Self { globs }
    }

    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.globs
            .iter()
            .find(|(pattern, regex)| {
                pattern == path || regex.as_ref().is_some_and(|re| re.is_match(path))
            })
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }
}

/// Whether `path` equals or glob-matches any of `patterns`.
pub fn matches_any_pattern<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    first_match(path, patterns).is_some()
}

/// The first pattern matching `path`.
pub fn first_match<'p, S: AsRef<str>>(path: &str, patterns: &'p [S]) -> Option<&'p str> {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .find(|pattern| matches_pattern(path, pattern))
}

/// Whether `branch` belongs to an install branch named `install_branch`.
///
/// Update branches are `<install_branch>-v<version>`, so the prefix must end
/// at a separator.
pub fn is_install_branch(branch: &str, install_branch: &str) -> bool {
    if install_branch.is_empty() {
        return false;
    }
    match branch.strip_prefix(install_branch) {
        Some(rest) => rest.is_empty() || rest.starts_with(['-', '/']),
        None => false,
    }
}

/// What one vendor protects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedSet {
    /// Literal paths from the manifest, including its own artifacts.
    Manifest(BTreeSet<String>),
    /// Glob patterns from the descriptor.
    Patterns(Vec<String>),
}

impl ProtectedSet {
    /// The rule under which `path` is protected, if any.
    pub fn rule_for(&self, path: &str) -> Option<String> {
        self.matcher().rule_for(path)
    }

    /// Compile the patterns for checking many paths.
    pub fn matcher(&self) -> ProtectedMatcher<'_> {
        match self {
            Self::Manifest(files) => ProtectedMatcher::Manifest(files),
            Self::Patterns(patterns) => ProtectedMatcher::Globs(GlobSet::new(patterns)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Manifest(files) => files.is_empty(),
            Self::Patterns(patterns) => patterns.is_empty(),
        }
    }
}

/// A [`ProtectedSet`] ready for matching.
#[derive(Debug)]
pub enum ProtectedMatcher<'a> {
    Manifest(&'a BTreeSet<String>),
    Globs(GlobSet),
}

impl ProtectedMatcher<'_> {
    pub fn rule_for(&self, path: &str) -> Option<String> {
        match self {
            Self::Manifest(files) => files
                .contains(path)
                .then(|| "manifest entry".to_string()),
            Self::Globs(globs) => globs.first_match(path).map(|p| format!("pattern '{p}'")),
        }
    }
}

/// A staged change to a protected path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub vendor: String,
    pub path: String,
    /// Manifest entry or the glob that matched.
    pub rule: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (protected by {}: {})", self.path, self.vendor, self.rule)
    }
}

pub struct ProtectionEngine<'a> {
    manifests: &'a ManifestStore,
}

impl<'a> ProtectionEngine<'a> {
    pub fn new(manifests: &'a ManifestStore) -> Self {
        Self { manifests }
    }

    pub fn get_protected_files(
        &self,
        vendor: &str,
        descriptor: &VendorDescriptor,
    ) -> Result<ProtectedSet> {
        match self.manifests.read_files(vendor)? {
            Some(files) => {
                let mut set: BTreeSet<String> = files.iter().map(|f| normalize_relative(f)).collect();
                set.extend(self.manifests.artifact_paths(vendor));
                Ok(ProtectedSet::Manifest(set))
            }
            None => Ok(ProtectedSet::Patterns(
                descriptor
                    .protected_patterns()
                    .iter()
                    .map(|p| normalize_relative(p))
                    .collect(),
            )),
        }
    }

    /// Violations of one vendor's protection among `changed` paths.
    pub fn check_vendor<S: AsRef<str>>(
        &self,
        name: &str,
        descriptor: &VendorDescriptor,
        changed: &[S],
        branch: Option<&str>,
    ) -> Result<Vec<Violation>> {
        if let Some(branch) = branch {
            if is_install_branch(branch, &descriptor.install_branch_or_default(name)) {
                tracing::debug!(vendor = name, branch, "On the vendor's install branch");
                return Ok(Vec::new());
            }
        }

        let protected = self.get_protected_files(name, descriptor)?;
        if protected.is_empty() {
            return Ok(Vec::new());
        }

        let allowed = GlobSet::new(&descriptor.allowed);
        let matcher = protected.matcher();
        let violations = changed
            .iter()
            .map(|path| normalize_relative(path.as_ref()))
            .filter(|path| !allowed.is_match(path))
            .filter_map(|path| {
                matcher.rule_for(&path).map(|rule| Violation {
                    vendor: name.to_string(),
                    path,
                    rule,
                })
            })
            .collect();
        Ok(violations)
    }

    /// Violations across every registered vendor, in vendor order.
    pub fn check_all<S: AsRef<str>>(
        &self,
        registry: &Registry,
        changed: &[S],
        branch: Option<&str>,
    ) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for (name, descriptor) in registry.vendors() {
            violations.extend(self.check_vendor(name, descriptor, changed, branch)?);
        }
        Ok(violations)
    }
}

/// Link `.git/hooks/pre-commit` to the shipped hook script.
///
/// Replaces any existing hook file or link.
pub fn install_hook(layout: &ControlLayout) -> Result<NormalizedPath> {
    let source = layout.hook_source();
    if !source.is_file() {
        return Err(Error::HookSourceMissing {
            path: source.to_native(),
        });
    }

    let hooks_dir = layout.git_hooks_dir().to_native();
    std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io(&hooks_dir, e))?;
    let hook = hooks_dir.join("pre-commit");
    if hook.symlink_metadata().is_ok() {
        std::fs::remove_file(&hook).map_err(|e| Error::io(&hook, e))?;
    }

    let target = std::path::Path::new("../../.vendored/hooks/pre-commit");
    link_hook(target, &hook)?;
    Ok(NormalizedPath::new(hook))
}

#[cfg(unix)]
fn link_hook(target: &std::path::Path, hook: &std::path::Path) -> Result<()> {
    std::os::unix::fs::symlink(target, hook).map_err(|e| Error::io(hook, e))
}

#[cfg(not(unix))]
fn link_hook(target: &std::path::Path, hook: &std::path::Path) -> Result<()> {
    let source = hook
        .parent()
        .map(|dir| dir.join(target))
        .unwrap_or_else(|| target.to_path_buf());
    std::fs::copy(&source, hook)
        .map(|_| ())
        .map_err(|e| Error::io(hook, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(".vendored/config.json", ".vendored/config.json", true)]
    #[case("README.md", ".vendored/**", false)]
    #[case(".vendored/install", ".vendored/*", true)]
    #[case(".vendored/a/b", ".vendored/*", false)]
    #[case(".pearls/archive/old.jsonl", ".pearls/**", true)]
    #[case(".vendored/a/b/c.py", ".vendored/**", true)]
    #[case(".pearls/archive/2024.jsonl", ".pearls/archive/*.jsonl", true)]
    #[case(".pearls/archive/2024.json", ".pearls/archive/*.jsonl", false)]
    #[case("docs/a/b/x.md", "docs/**/x.md", true)]
    #[case("docs/x.md", "docs/**/x.md", true)]
    #[case("a.txt", "?.txt", true)]
    #[case("ab.txt", "?.txt", false)]
    #[case("v1.log", "v[0-9].log", true)]
    #[case("vx.log", "v[!0-9].log", true)]
    #[case("file+name.txt", "file+name.txt", true)]
    fn glob_matching(#[case] path: &str, #[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(matches_pattern(path, pattern), expected);
    }

    #[rstest]
    #[case("chore/install-git-vendored-v1.0", "chore/install-git-vendored", true)]
    #[case("chore/install-git-vendored", "chore/install-git-vendored", true)]
    #[case("chore/install-pearls-v2.0", "chore/install-git-vendored", false)]
    #[case("chore/install-toolkit-v1", "chore/install-tool", false)]
    #[case("feature/x", "", false)]
    fn install_branch_prefix(#[case] branch: &str, #[case] install: &str, #[case] expected: bool) {
        assert_eq!(is_install_branch(branch, install), expected);
    }

    #[test]
    fn glob_set_agrees_with_single_pattern_matching() {
        let patterns = [".tool/**", "docs/*.md", "scripts/[a-z]*.sh", "[unclosed"];
        let set = GlobSet::new(&patterns);
        let paths = [
            ".tool/a/b.sh",
            "docs/readme.md",
            "docs/nested/readme.md",
            "scripts/run.sh",
            "scripts/Run.sh",
            "[unclosed",
            "other.txt",
        ];
        for path in paths {
            assert_eq!(set.first_match(path), first_match(path, &patterns), "{path}");
        }
        assert!(!GlobSet::new::<&str>(&[]).is_match("anything"));
    }

    #[test]
    fn glob_set_reports_first_matching_pattern() {
        let set = GlobSet::new(&[".tool/*.sh", ".tool/**"]);
        assert_eq!(set.first_match(".tool/run.sh"), Some(".tool/*.sh"));
        assert_eq!(set.first_match(".tool/lib/x.py"), Some(".tool/**"));
    }

    proptest! {
        #[test]
        fn double_star_matches_any_depth(segments in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
            let path = format!(".tool/{}", segments.join("/"));
            prop_assert!(matches_pattern(&path, ".tool/**"));
            prop_assert!(!matches_pattern(&path, ".other/**"));
        }

        #[test]
        fn single_star_stays_in_segment(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
            let nested = format!(".tool/{a}/{b}");
            let shallow = format!(".tool/{a}");
            prop_assert!(!matches_pattern(&nested, ".tool/*"));
            prop_assert!(matches_pattern(&shallow, ".tool/*"));
        }
    }
}
