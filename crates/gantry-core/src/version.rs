//! Content-derived versions for modules, services, and tasks.
//!
//! A [`Version`] is computed from the unit's own content plus the versions of
//! the units it depends on. Dependencies are normalized by sorting on their
//! name before hashing, so the order in which a scheduler discovers them never
//! changes the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::{digest_bytes, digest_json};
use crate::error::{ContractError, Result};

/// Prefix of every version string.
pub const VERSION_PREFIX: &str = "v-";

/// Number of digest hex chars kept in a version string.
const VERSION_HEX_LEN: usize = 16;

/// Identity of a buildable unit.
///
/// `version_string` is printable and safe to use as a cache key or log field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version_string: String,
    #[serde(default)]
    pub dependency_versions: BTreeMap<String, String>,
    /// Modification time (ms since epoch) of uncommitted changes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty_timestamp: Option<i64>,
}

impl Version {
    /// Compute the version of `content` given its named dependencies.
    ///
    /// Fails when the same dependency name appears with two different versions.
    pub fn compute(content: &[u8], dependencies: &[(&str, &Version)]) -> Result<Self> {
        let dependency_versions = normalize_dependencies(dependencies)?;

        let mut material = String::new();
        material.push_str("content:");
        material.push_str(&digest_bytes(content));
        material.push('\n');
        for (name, version) in &dependency_versions {
            material.push_str(name);
            material.push('=');
            material.push_str(version);
            material.push('\n');
        }

        let digest = digest_bytes(material.as_bytes());
        Ok(Self {
            version_string: format!("{VERSION_PREFIX}{}", &digest[..VERSION_HEX_LEN]),
            dependency_versions,
            dirty_timestamp: None,
        })
    }

    /// Compute the version of structured content via its canonical JSON form.
    pub fn compute_from_value(content: &Value, dependencies: &[(&str, &Version)]) -> Result<Self> {
        let content_digest = digest_json(content)?;
        Self::compute(content_digest.as_bytes(), dependencies)
    }

    /// Same version, stamped with a working-tree modification time.
    pub fn dirty(&self, timestamp_ms: i64) -> Self {
        Self {
            dirty_timestamp: Some(timestamp_ms),
            ..self.clone()
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_timestamp.is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.version_string
    }

    /// Log-friendly prefix (first 10 chars).
    pub fn short(&self) -> &str {
        let s = &self.version_string;
        s.char_indices().nth(10).map_or(s.as_str(), |(end, _)| &s[..end])
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version_string)
    }
}

fn normalize_dependencies(dependencies: &[(&str, &Version)]) -> Result<BTreeMap<String, String>> {
    let mut normalized: BTreeMap<String, String> = BTreeMap::new();
    for (name, version) in dependencies {
        match normalized.get(*name) {
            Some(existing) if existing != &version.version_string => {
                return Err(ContractError::ConflictingDependency {
                    name: name.to_string(),
                    first: existing.clone(),
                    second: version.version_string.clone(),
                });
            }
            Some(_) => {}
            None => {
                normalized.insert(name.to_string(), version.version_string.clone());
            }
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(content: &str) -> Version {
        Version::compute(content.as_bytes(), &[]).unwrap()
    }

    #[test]
    fn test_compute_is_deterministic() {
        let dep = leaf("lib");
        let a = Version::compute(b"app", &[("lib", &dep)]).unwrap();
        let b = Version::compute(b"app", &[("lib", &dep)]).unwrap();
        assert_eq!(a, b);
        assert!(a.version_string.starts_with(VERSION_PREFIX));
        assert_eq!(a.version_string.len(), VERSION_PREFIX.len() + 16);
    }

    #[test]
    fn test_dependency_order_is_normalized() {
        let lib = leaf("lib");
        let util = leaf("util");
        let a = Version::compute(b"app", &[("lib", &lib), ("util", &util)]).unwrap();
        let b = Version::compute(b"app", &[("util", &util), ("lib", &lib)]).unwrap();
        assert_eq!(a.version_string, b.version_string);
    }

    #[test]
    fn test_content_change_changes_version() {
        assert_ne!(leaf("A\n").version_string, leaf("B\n").version_string);
    }

    #[test]
    fn test_dependency_change_changes_version() {
        let a = Version::compute(b"app", &[("lib", &leaf("lib-1"))]).unwrap();
        let b = Version::compute(b"app", &[("lib", &leaf("lib-2"))]).unwrap();
        assert_ne!(a.version_string, b.version_string);
    }

    #[test]
    fn test_conflicting_duplicate_dependency_fails() {
        let err = Version::compute(b"app", &[("lib", &leaf("1")), ("lib", &leaf("2"))])
            .unwrap_err();
        assert!(matches!(err, ContractError::ConflictingDependency { .. }));
    }

    #[test]
    fn test_identical_duplicate_dependency_is_accepted() {
        let lib = leaf("lib");
        let v = Version::compute(b"app", &[("lib", &lib), ("lib", &lib)]).unwrap();
        assert_eq!(v.dependency_versions.len(), 1);
    }

    #[test]
    fn test_compute_from_value_ignores_key_order() {
        let a = Version::compute_from_value(&json!({"a": 1, "b": 2}), &[]).unwrap();
        let b = Version::compute_from_value(&json!({"b": 2, "a": 1}), &[]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dirty_keeps_version_string() {
        let v = leaf("app");
        let dirty = v.dirty(1_700_000_000_000);
        assert!(dirty.is_dirty());
        assert!(!v.is_dirty());
        assert_eq!(dirty.version_string, v.version_string);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let lib = leaf("lib");
        let v = Version::compute(b"app", &[("lib", &lib)]).unwrap();
        let wire = serde_json::to_value(&v).unwrap();
        assert!(wire.get("versionString").is_some());
        assert_eq!(wire["dependencyVersions"]["lib"], json!(lib.version_string));
        assert!(wire.get("dirtyTimestamp").is_none());
    }

    #[test]
    fn test_short_counts_chars_not_bytes() {
        let v: Version =
            serde_json::from_value(json!({"versionString": "v-aéééééééééé"})).unwrap();
        assert_eq!(v.short(), "v-aééééééé");

        let tiny: Version = serde_json::from_value(json!({"versionString": "v-é"})).unwrap();
        assert_eq!(tiny.short(), "v-é");
    }
}
