use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The hosting platform whose account names appear in module paths.
pub const HOSTING_DOMAIN: &str = "github.com";

/// A fully-qualified package identifier from a dependency graph,
/// e.g. `github.com/user-b/toml@v0.3.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without any `@version` suffix.
    pub fn unversioned(&self) -> &str {
        strip_version(&self.0)
    }

    /// The second path segment, or `None` when the identifier has fewer
    /// than two segments and cannot be attributed to anyone.
    pub fn owner_segment(&self) -> Option<&str> {
        self.0.split('/').nth(1)
    }

    /// The owning account, only for identifiers rooted at [`HOSTING_DOMAIN`].
    pub fn hosting_account(&self) -> Option<&str> {
        let mut parts = self.0.split('/');
        if parts.next()? != HOSTING_DOMAIN {
            return None;
        }
        parts.next()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Drops everything from the first `@` on.
pub fn strip_version(id: &str) -> &str {
    id.split_once('@').map(|(base, _)| base).unwrap_or(id)
}

/// A module to scan: a local source tree or a remote coordinate such as
/// `github.com/owner/name@v1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleReference(String);

impl ModuleReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path when the reference names an existing directory.
    pub fn local_dir(&self) -> Option<&Path> {
        let path = Path::new(&self.0);
        path.is_dir().then_some(path)
    }

    /// The coordinate handed to the download tool; defaults to `@latest`.
    pub fn download_target(&self) -> String {
        if self.0.contains('@') {
            self.0.clone()
        } else {
            format!("{}@latest", self.0)
        }
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_parts() {
        let id = PackageId::new("github.com/user-d/kingpin@v2.2.6+incompatible");
        assert_eq!(id.unversioned(), "github.com/user-d/kingpin");
        assert_eq!(id.owner_segment(), Some("user-d"));
        assert_eq!(id.hosting_account(), Some("user-d"));
    }

    #[test]
    fn test_non_hosting_domain_has_no_account() {
        let id = PackageId::new("golang.org/x/text@v0.3.0");
        assert_eq!(id.owner_segment(), Some("x"));
        assert_eq!(id.hosting_account(), None);
    }

    #[test]
    fn test_single_segment_is_unattributable() {
        let id = PackageId::new("mod");
        assert_eq!(id.owner_segment(), None);
        assert_eq!(id.hosting_account(), None);
        assert_eq!(PackageId::new("github.com").hosting_account(), None);
    }

    #[test]
    fn test_download_target_defaults_to_latest() {
        assert_eq!(
            ModuleReference::new("github.com/user-a/noms").download_target(),
            "github.com/user-a/noms@latest"
        );
        assert_eq!(
            ModuleReference::new("github.com/user-a/noms@v1.0.0").download_target(),
            "github.com/user-a/noms@v1.0.0"
        );
    }

    #[test]
    fn test_local_dir_detection() {
        let dir = tempfile::tempdir().unwrap();
        let local = ModuleReference::new(dir.path().to_string_lossy());
        assert!(local.local_dir().is_some());
        assert!(ModuleReference::new("github.com/user-a/noms").local_dir().is_none());
    }
}
