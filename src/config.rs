//! Configuration file handling.
//!
//! Settings are read from a TOML file; every key is optional.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/chainjacking/config.toml`
//! - macOS: `~/Library/Application Support/chainjacking/config.toml`
//! - Windows: `%APPDATA%\chainjacking\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! api_url = "https://api.github.com"
//! rate_limit_backoff_seconds = 20
//! max_rate_limit_attempts = 5
//! go_binary = "go"
//! concurrency = 1
//! default_format = "table"
//!
//! [ignore]
//! accounts = ["retired-bot"]
//! packages = ["github.com/old-org/*"]
//! ```

use crate::checker::{RetryPolicy, DEFAULT_API_URL};
use crate::model::PackageId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use chainjacking::Config;
///
/// let config = Config::load().unwrap();
/// println!("Retrying rate limits {} times", config.max_rate_limit_attempts);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GitHub REST API.
    pub api_url: String,

    /// Seconds to wait after a rate-limited account lookup.
    ///
    /// Default: 20
    pub rate_limit_backoff_seconds: u64,

    /// Attempts per account lookup before giving up on a rate limit.
    ///
    /// Default: 5
    pub max_rate_limit_attempts: u32,

    /// The `go` executable used to download modules and dump graphs.
    pub go_binary: String,

    /// Modules scanned at the same time.
    ///
    /// Default: 1 (sequential)
    pub concurrency: usize,

    /// Valid values: "table", "json", "sarif"
    pub default_format: String,

    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Accepted risks that should not be reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Account names that are never looked up or reported.
    pub accounts: Vec<String>,

    /// Package patterns to drop from findings. Matched against both the
    /// versioned and unversioned identifier; `*` is a wildcard.
    pub packages: Vec<String>,
}

impl IgnoreConfig {
    pub fn should_ignore_account(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }

    pub fn should_ignore_package(&self, package: &PackageId) -> bool {
        self.packages.iter().any(|pattern| {
            glob_match(pattern, package.as_str()) || glob_match(pattern, package.unversioned())
        })
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let rest: Vec<&str> = parts.collect();
    let Some((last, middle)) = rest.split_last() else {
        // No wildcard at all.
        return remaining.is_empty();
    };

    for part in middle.iter().filter(|p| !p.is_empty()) {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }

    remaining.ends_with(last)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            rate_limit_backoff_seconds: RetryPolicy::DEFAULT_BACKOFF.as_secs(),
            max_rate_limit_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            go_binary: "go".to_string(),
            concurrency: 1,
            default_format: "table".to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Same as [`Config::load`] for an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chainjacking")
            .join("config.toml")
    }

    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_rate_limit_attempts,
            Duration::from_secs(self.rate_limit_backoff_seconds),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("github.com/a/b", "github.com/a/b"));
        assert!(!glob_match("github.com/a/b", "github.com/a/bc"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("github.com/old-org/*", "github.com/old-org/lib"));
        assert!(glob_match("github.com/old-org/*", "github.com/old-org/lib@v1.0.0"));
        assert!(!glob_match("github.com/old-org/*", "github.com/new-org/lib"));
    }

    #[test]
    fn test_glob_match_suffix_and_contains() {
        assert!(glob_match("*/toml", "github.com/ghost/toml"));
        assert!(!glob_match("*/toml", "github.com/ghost/toml-x"));
        assert!(glob_match("*ghost*", "github.com/ghost/toml"));
        assert!(glob_match("github.com/*/toml*", "github.com/ghost/toml@v0.3.1"));
        assert!(!glob_match("*ghost*", "github.com/alive/toml"));
    }

    #[test]
    fn test_ignore_config_packages() {
        let config = IgnoreConfig {
            accounts: vec![],
            packages: vec!["github.com/ghost/toml".to_string(), "github.com/old-org/*".to_string()],
        };

        assert!(config.should_ignore_package(&PackageId::new("github.com/ghost/toml@v0.3.1")));
        assert!(config.should_ignore_package(&PackageId::new("github.com/old-org/x@v1.0.0")));
        assert!(!config.should_ignore_package(&PackageId::new("github.com/ghost/util@v0.2.0")));
    }

    #[test]
    fn test_ignore_config_accounts() {
        let config = IgnoreConfig {
            accounts: vec!["retired-bot".to_string()],
            packages: vec![],
        };
        assert!(config.should_ignore_account("retired-bot"));
        assert!(!config.should_ignore_account("retired"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.rate_limit_backoff_seconds, 20);
        assert_eq!(config.max_rate_limit_attempts, 5);
        assert_eq!(config.go_binary, "go");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.default_format, "table");
        assert!(config.ignore.packages.is_empty());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_toml(
            "concurrency = 4\n\n[ignore]\naccounts = [\"retired-bot\"]\n",
        )
        .unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_rate_limit_attempts, 5);
        assert_eq!(config.ignore.accounts, vec!["retired-bot"]);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_default_config_round_trips() {
        let rendered = Config::generate_default_config();
        let parsed = Config::from_toml(&rendered).unwrap();
        assert_eq!(parsed.api_url, Config::default().api_url);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = \"https://ghe.corp/api/v3\"\nconcurrency = \"two\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
