//! Error taxonomy for the scan pipeline.
//!
//! Only [`ChainjackError::Authentication`] is fatal to a whole run. Every
//! other variant is contained at the module boundary by
//! [`ModuleScanner`](crate::scanner::ModuleScanner) and turns that module's
//! result into a failed report.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ChainjackError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ChainjackError {
    /// An external tool ran but exited with a nonzero status.
    #[error("Failed executing command=\"{command}\" exit code=\"{exit_code}\" stderr=\"{stderr}\" stdout=\"{stdout}\"")]
    Execution {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("Failed to launch command=\"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Your GitHub token is invalid (HTTP 401)")]
    Authentication,

    #[error("Rate limited while checking account \"{account}\"; gave up after {attempts} attempts. Try increasing the number of attempts allowed")]
    RateLimitExhausted { account: String, attempts: u32 },

    #[error("Unexpected HTTP status {status} while checking account \"{account}\"")]
    Http { account: String, status: u16 },

    #[error("Request for account \"{account}\" failed: {source}")]
    Transport {
        account: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client for account lookups could not be built.
    #[error("Failed to set up the GitHub API client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed dependency graph line {line_number}: \"{line}\"")]
    Parse { line_number: usize, line: String },

    #[error("Could not find downloaded module \"{module}\" under {}", root.display())]
    Resolution { module: String, root: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ChainjackError {
    /// Returns true for errors that invalidate every remaining check in the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChainjackError::Authentication)
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ChainjackError::Io {
            path: path.into(),
            source,
        }
    }
}
