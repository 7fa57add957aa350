//! Vendor descriptors as stored in the registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

fn is_false(value: &bool) -> bool {
    !*value
}

/// How one vendor is sourced, protected and updated.
///
/// Unknown keys are kept in `extra` so that re-saving never drops data a
/// newer install script wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorDescriptor {
    /// Source-host identity, `owner/name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Branch prefix used by this vendor's automated update PRs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_branch: Option<String>,

    /// Glob patterns protected when no manifest exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<Vec<String>>,

    /// Glob exceptions carved out of the protected set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub automerge: bool,

    /// This entry is vendored itself; installs write in place.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dogfood: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VendorDescriptor {
    /// Descriptor for a vendor registered by the framework rather than its script.
    pub fn for_manifest_install(name: &str, repo: &str) -> Self {
        Self {
            repo: Some(repo.to_string()),
            install_branch: Some(default_install_branch(name)),
            protected: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::MalformedDescriptor {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn repo(&self) -> &str {
        self.repo.as_deref().unwrap_or_default()
    }

    /// Install branch, defaulting to `chore/install-<name>`.
    pub fn install_branch_or_default(&self, name: &str) -> String {
        self.install_branch
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| default_install_branch(name))
    }

    pub fn protected_patterns(&self) -> &[String] {
        self.protected.as_deref().unwrap_or_default()
    }

    /// Whether this descriptor points at `repo` (host identities are case-insensitive).
    pub fn is_repo(&self, repo: &str) -> bool {
        self.repo
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(repo))
    }

    /// A descriptor is usable only with both `repo` and `protected` set.
    pub fn validate(&self, name: &str) -> Result<()> {
        let mut fields = Vec::new();
        if self.repo.as_deref().is_none_or(str::is_empty) {
            fields.push("repo".to_string());
        }
        if self.protected.is_none() {
            fields.push("protected".to_string());
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidDescriptor {
                name: name.to_string(),
                fields,
            })
        }
    }
}

pub fn default_install_branch(name: &str) -> String {
    format!("chore/install-{name}")
}

/// Last path segment of an `owner/name` identity.
pub fn repo_basename(repo: &str) -> &str {
    repo.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo)
}
