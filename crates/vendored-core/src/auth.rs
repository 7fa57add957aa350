//! Credential selection from the environment.

use crate::{Error, Result, VendorDescriptor};

/// Credential for fetching `vendor`.
///
/// Private vendors require `VENDOR_PAT`. Public vendors use `GITHUB_TOKEN`,
/// then `GH_TOKEN`. Unknown vendors (new installs) also fall back to
/// `VENDOR_PAT`.
pub fn token_for(vendor: Option<(&str, &VendorDescriptor)>) -> Result<Option<String>> {
    token_for_with(vendor, |key| std::env::var(key).ok())
}

pub fn token_for_with<F>(
    vendor: Option<(&str, &VendorDescriptor)>,
    lookup: F,
) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    match vendor {
        Some((name, descriptor)) if descriptor.private => {
            get("VENDOR_PAT").map(Some).ok_or_else(|| Error::MissingToken {
                vendor: name.to_string(),
            })
        }
        Some(_) => Ok(get("GITHUB_TOKEN").or_else(|| get("GH_TOKEN"))),
        None => Ok(get("GITHUB_TOKEN")
            .or_else(|| get("GH_TOKEN"))
            .or_else(|| get("VENDOR_PAT"))),
    }
}

/// Credential for dry-run validation: `GH_TOKEN`, then `GITHUB_TOKEN`.
pub fn validator_token() -> Option<String> {
    validator_token_with(|key| std::env::var(key).ok())
}

pub fn validator_token_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("GH_TOKEN")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| lookup("GITHUB_TOKEN").filter(|v| !v.trim().is_empty()))
}

/// Credential for opening pull requests in the host repository.
pub fn publish_token_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("GITHUB_TOKEN")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| lookup("GH_TOKEN").filter(|v| !v.trim().is_empty()))
}

pub fn publish_token() -> Option<String> {
    publish_token_with(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn public() -> VendorDescriptor {
        VendorDescriptor {
            repo: Some("owner/tool".into()),
            ..VendorDescriptor::default()
        }
    }

    #[test]
    fn public_prefers_github_token() {
        let d = public();
        let token = token_for_with(Some(("tool", &d)), env(&[("GITHUB_TOKEN", "a"), ("GH_TOKEN", "b")]));
        assert_eq!(token.unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn public_falls_back_to_gh_token() {
        let d = public();
        let token = token_for_with(Some(("tool", &d)), env(&[("GH_TOKEN", "b")]));
        assert_eq!(token.unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn private_requires_vendor_pat() {
        let d = VendorDescriptor {
            private: true,
            ..public()
        };
        let token = token_for_with(Some(("tool", &d)), env(&[("VENDOR_PAT", "pat"), ("GITHUB_TOKEN", "a")]));
        assert_eq!(token.unwrap().as_deref(), Some("pat"));

        let err = token_for_with(Some(("tool", &d)), env(&[("GITHUB_TOKEN", "a")])).unwrap_err();
        assert!(matches!(err, Error::MissingToken { vendor } if vendor == "tool"));
    }

    #[test]
    fn unknown_vendor_uses_any_token() {
        assert_eq!(
            token_for_with(None, env(&[("VENDOR_PAT", "pat")])).unwrap().as_deref(),
            Some("pat")
        );
        assert_eq!(token_for_with(None, env(&[])).unwrap(), None);
    }

    #[test]
    fn validator_and_publisher_precedence_differ() {
        let both = env(&[("GITHUB_TOKEN", "repo"), ("GH_TOKEN", "pat")]);
        assert_eq!(validator_token_with(&both).as_deref(), Some("pat"));
        assert_eq!(publish_token_with(&both).as_deref(), Some("repo"));
    }
}
