//! Parsing of `go mod graph` output.
//!
//! Each line is an edge `<parent> <child>`. Only the child is a dependency.
//! A line with fewer than two tokens fails the whole parse: a truncated dump
//! would otherwise under-report risk.

use crate::error::{ChainjackError, Result};
use crate::model::PackageId;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// The deduplicated dependencies of one module and the hosting accounts
/// they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub packages: BTreeSet<PackageId>,
    pub accounts: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn parse(graph_output: &str) -> Result<Self> {
        let mut graph = DependencyGraph::default();

        for (index, line) in graph_output.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let child = match (tokens.next(), tokens.next()) {
                (Some(_parent), Some(child)) => PackageId::new(child),
                _ => {
                    return Err(ChainjackError::Parse {
                        line_number: index + 1,
                        line: line.to_string(),
                    })
                }
            };

            if let Some(account) = child.hosting_account() {
                graph.accounts.insert(account.to_string());
            }
            graph.packages.insert(child);
        }

        Ok(graph)
    }

    /// Packages hosted on GitHub whose owner is one of `vulnerable_accounts`.
    /// The same name on another host belongs to someone else.
    pub fn vulnerable_packages(&self, vulnerable_accounts: &HashSet<String>) -> BTreeSet<PackageId> {
        filter_vulnerable_packages(
            self.packages
                .iter()
                .filter(|package| package.hosting_account().is_some()),
            vulnerable_accounts,
        )
    }
}

/// Keeps identifiers with at least two path segments whose second segment
/// is in `vulnerable_accounts`.
pub fn filter_vulnerable_packages<'a, I>(
    packages: I,
    vulnerable_accounts: &HashSet<String>,
) -> BTreeSet<PackageId>
where
    I: IntoIterator<Item = &'a PackageId>,
{
    packages
        .into_iter()
        .filter(|package| match package.owner_segment() {
            None => {
                debug!(
                    "Ignoring go package=\"{}\" as it does not appear to be a valid record",
                    package
                );
                false
            }
            Some(owner) if !vulnerable_accounts.contains(owner) => false,
            Some(_) => {
                debug!("{} can be hijacked", package);
                true
            }
        })
        .cloned()
        .collect()
}
