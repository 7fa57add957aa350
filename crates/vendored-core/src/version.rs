//! Version resolution against the source host.

use vendored_host::SourceHost;

use crate::{Error, Result, VERSION_FILE};

/// Ref meaning "newest available".
pub const LATEST: &str = "latest";

/// Turns a user-supplied ref into a concrete version string.
pub struct VersionResolver<'a> {
    host: &'a dyn SourceHost,
}

impl<'a> VersionResolver<'a> {
    pub fn new(host: &'a dyn SourceHost) -> Self {
        Self { host }
    }

    /// Resolve `reference` for `repo`.
    ///
    /// Anything other than `latest` (or nothing) is returned as given. For
    /// `latest` the newest release tag wins, then the `VERSION` file at the
    /// default ref.
    pub fn resolve(&self, repo: &str, reference: Option<&str>, token: Option<&str>) -> Result<String> {
        match reference.map(str::trim) {
            Some(r) if !r.is_empty() && r != LATEST => return Ok(r.to_string()),
            _ => {}
        }

        if let Some(tag) = self.host.latest_release_tag(repo, token)? {
            let version = strip_v(&tag);
            if !version.is_empty() {
                return Ok(version.to_string());
            }
        }

        if let Some(bytes) = self.host.file_at_ref(repo, VERSION_FILE, None, token)? {
            let text = String::from_utf8_lossy(&bytes);
            let version = text.trim();
            if !version.is_empty() {
                return Ok(version.to_string());
            }
        }

        Err(Error::VersionUnresolvable {
            repo: repo.to_string(),
        })
    }
}

pub fn strip_v(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Whether two version strings name the same release.
///
/// Semver-shaped strings compare semantically after padding (`1.0` equals
/// `1.0.0`, a leading `v` is ignored); anything else compares literally.
pub fn versions_match(current: &str, target: &str) -> bool {
    match (parse_loose(current), parse_loose(target)) {
        (Some(a), Some(b)) => a == b,
        _ => strip_v(current) == strip_v(target),
    }
}

fn parse_loose(version: &str) -> Option<semver::Version> {
    let version = strip_v(version);
    let padded = match version.matches('.').count() {
        0 => format!("{version}.0.0"),
        1 => format!("{version}.0"),
        _ => version.to_string(),
    };
    semver::Version::parse(&padded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vendored_test_utils::FakeHost;

    #[rstest]
    #[case("1.0.0", "1.0.0", true)]
    #[case("1.0", "1.0.0", true)]
    #[case("v2.1.0", "2.1.0", true)]
    #[case("1.0.0", "1.0.1", false)]
    #[case("1.0.0-rc.1", "1.0.0", false)]
    #[case("nightly", "nightly", true)]
    #[case("nightly", "stable", false)]
    fn version_equality(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(versions_match(a, b), expected);
    }

    #[test]
    fn strip_v_only_strips_one_prefix() {
        assert_eq!(strip_v("v1.2.3"), "1.2.3");
        assert_eq!(strip_v("1.2.3"), "1.2.3");
        assert_eq!(strip_v(" v1.0\n"), "1.0");
    }

    #[test]
    fn release_tag_wins_over_version_file() {
        let host = FakeHost::new()
            .release("owner/tool", "v2.0.0")
            .file("owner/tool", None, "VERSION", "1.0.0\n");

        let version = VersionResolver::new(&host).resolve("owner/tool", None, None).unwrap();
        assert_eq!(version, "2.0.0");
    }

    #[test]
    fn version_file_is_used_without_a_release() {
        let host = FakeHost::new().file("owner/tool", None, "VERSION", " 1.0.0\n");

        let version = VersionResolver::new(&host)
            .resolve("owner/tool", Some(LATEST), None)
            .unwrap();
        assert_eq!(version, "1.0.0");
    }

    #[test]
    fn explicit_ref_is_returned_untouched() {
        let host = FakeHost::new().release("owner/tool", "v2.0.0");

        let version = VersionResolver::new(&host)
            .resolve("owner/tool", Some("feature/x"), None)
            .unwrap();
        assert_eq!(version, "feature/x");
    }

    #[test]
    fn nothing_to_resolve_is_an_error() {
        let host = FakeHost::new().repo("owner/tool");

        let err = VersionResolver::new(&host).resolve("owner/tool", None, None).unwrap_err();
        assert!(matches!(err, Error::VersionUnresolvable { repo } if repo == "owner/tool"));
    }
}
