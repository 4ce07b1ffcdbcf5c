use super::{ModuleReference, PackageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a single module reference fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModuleStatus {
    Scanned,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub reference: ModuleReference,
    #[serde(flatten)]
    pub status: ModuleStatus,
    /// Dependencies owned by accounts that no longer exist.
    pub vulnerable: BTreeSet<PackageId>,
}

impl ModuleReport {
    pub fn scanned(reference: ModuleReference, vulnerable: BTreeSet<PackageId>) -> Self {
        Self {
            reference,
            status: ModuleStatus::Scanned,
            vulnerable,
        }
    }

    pub fn failed(reference: ModuleReference, reason: impl Into<String>) -> Self {
        Self {
            reference,
            status: ModuleStatus::Failed {
                reason: reason.into(),
            },
            vulnerable: BTreeSet::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ModuleStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub scan_time: DateTime<Utc>,
    pub modules: Vec<ModuleReport>,
}

impl ScanResult {
    pub fn new(modules: Vec<ModuleReport>) -> Self {
        Self {
            scan_time: Utc::now(),
            modules,
        }
    }

    /// Union of the vulnerable sets across every scanned module.
    pub fn vulnerable_packages(&self) -> BTreeSet<&PackageId> {
        self.modules
            .iter()
            .flat_map(|module| module.vulnerable.iter())
            .collect()
    }

    /// References that could not be scanned at all.
    pub fn failed(&self) -> impl Iterator<Item = &ModuleReport> {
        self.modules.iter().filter(|module| module.is_failed())
    }

    /// References whose dependencies were actually analyzed.
    pub fn scanned(&self) -> impl Iterator<Item = &ModuleReport> {
        self.modules.iter().filter(|module| !module.is_failed())
    }

    /// True when at least one module was analyzed.
    pub fn is_conclusive(&self) -> bool {
        self.scanned().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.modules.iter().all(|module| module.vulnerable.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<PackageId> {
        ids.iter().map(|id| PackageId::new(*id)).collect()
    }

    #[test]
    fn test_vulnerable_packages_is_union() {
        let result = ScanResult::new(vec![
            ModuleReport::scanned(
                ModuleReference::new("github.com/a/one"),
                set(&["github.com/ghost/x@v1.0.0", "github.com/ghost/y@v0.1.0"]),
            ),
            ModuleReport::scanned(
                ModuleReference::new("github.com/a/two"),
                set(&["github.com/ghost/x@v1.0.0"]),
            ),
            ModuleReport::failed(ModuleReference::new("github.com/a/three"), "boom"),
        ]);

        let union: Vec<&str> = result
            .vulnerable_packages()
            .into_iter()
            .map(PackageId::as_str)
            .collect();
        assert_eq!(union, vec!["github.com/ghost/x@v1.0.0", "github.com/ghost/y@v0.1.0"]);
        assert_eq!(result.failed().count(), 1);
        assert!(!result.is_clean());
    }

    #[test]
    fn test_report_serializes_status_inline() {
        let report = ModuleReport::failed(ModuleReference::new("github.com/a/b"), "no go.mod");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "no go.mod");
        assert_eq!(json["reference"], "github.com/a/b");
    }

    #[test]
    fn test_all_failed_is_inconclusive() {
        let result = ScanResult::new(vec![
            ModuleReport::failed(ModuleReference::new("github.com/a/one"), "boom"),
            ModuleReport::failed(ModuleReference::new("github.com/a/two"), "boom"),
        ]);
        assert!(result.is_clean());
        assert!(!result.is_conclusive());
        assert_eq!(result.scanned().count(), 0);

        let result = ScanResult::new(vec![
            ModuleReport::failed(ModuleReference::new("github.com/a/one"), "boom"),
            ModuleReport::scanned(ModuleReference::new("github.com/a/two"), BTreeSet::new()),
        ]);
        assert!(result.is_conclusive());
    }
}
