//! Account existence checks against the hosting platform.

mod github;

pub use github::{GithubAccountChecker, DEFAULT_API_URL};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Answers whether an account name is currently registered.
///
/// `Ok(false)` means the platform proved the account absent. Anything the
/// platform could not answer is an error, never a guess either way.
#[async_trait]
pub trait AccountChecker: Send + Sync {
    fn name(&self) -> &'static str;
    async fn exists(&self, account: &str) -> Result<bool>;
}

/// Bounded retry for rate-limited lookups. Each check owns its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(20);

    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BACKOFF)
    }
}
