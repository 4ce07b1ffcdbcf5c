//! SARIF (Static Analysis Results Interchange Format) output for GitHub Actions integration.
//!
//! Every vulnerable package becomes one `error` result under a single rule, so
//! uploads to GitHub Code Scanning fail the check when anything is found.

use crate::model::{ModuleReference, ScanResult};
use anyhow::Result;
use reqwest::Url;
use serde::Serialize;

const RULE_ID: &str = "chainjacking/deleted-account";

/// SARIF v2.1.0 schema root
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    full_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifRuleConfiguration,
}

#[derive(Serialize)]
struct SarifRuleConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

fn rule() -> SarifRule {
    SarifRule {
        id: RULE_ID,
        name: "DependencyOwnedByDeletedAccount",
        short_description: SarifMessage {
            text: "Dependency owned by a deleted GitHub account".to_string(),
        },
        full_description: SarifMessage {
            text: "The account that published this dependency no longer exists. Anyone can \
                   register the name again and publish a malicious version under the same path."
                .to_string(),
        },
        default_configuration: SarifRuleConfiguration { level: "error" },
    }
}

/// Local trees become `file://` URIs; remote coordinates are kept as given.
fn artifact_uri(reference: &ModuleReference) -> String {
    reference
        .local_dir()
        .and_then(|dir| std::fs::canonicalize(dir).ok())
        .and_then(|dir| Url::from_directory_path(dir).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| reference.to_string())
}

pub fn render_sarif(result: &ScanResult) -> Result<String> {
    let results = result
        .modules
        .iter()
        .flat_map(|module| {
            module.vulnerable.iter().map(move |package| SarifResult {
                rule_id: RULE_ID,
                level: "error",
                message: SarifMessage {
                    text: format!(
                        "Go package \"{}\" is vulnerable to ChainJacking attack",
                        package
                    ),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: artifact_uri(&module.reference),
                        },
                    },
                }],
            })
        })
        .collect();

    let report = SarifReport {
        schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        version: "2.1.0",
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "chainjacking",
                    version: env!("CARGO_PKG_VERSION"),
                    rules: vec![rule()],
                },
            },
            results,
        }],
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleReference, ModuleReport, PackageId};

    #[test]
    fn test_sarif_has_one_result_per_package() {
        let result = ScanResult::new(vec![ModuleReport::scanned(
            ModuleReference::new("github.com/a/app"),
            [
                PackageId::new("github.com/ghost/toml@v0.3.1"),
                PackageId::new("github.com/ghost/util@v0.2.0"),
            ]
            .into_iter()
            .collect(),
        )]);

        let sarif: serde_json::Value = serde_json::from_str(&render_sarif(&result).unwrap()).unwrap();
        let results = sarif["runs"][0]["results"].as_array().unwrap();

        assert_eq!(sarif["version"], "2.1.0");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[0]["ruleId"], RULE_ID);
        assert_eq!(
            results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "github.com/a/app"
        );
    }

    #[test]
    fn test_local_module_location_is_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ModuleReference::new(dir.path().to_string_lossy());

        let uri = artifact_uri(&reference);
        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with('/'));
        assert_eq!(
            Url::parse(&uri).unwrap().to_file_path().unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}
