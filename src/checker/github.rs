use super::{AccountChecker, RetryPolicy};
use crate::error::{ChainjackError, Result};
use async_trait::async_trait;
use reqwest::{redirect, StatusCode};
use tracing::{debug, error};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Looks accounts up with `HEAD /users/{name}` on the GitHub REST API.
pub struct GithubAccountChecker {
    client: reqwest::Client,
    api_url: String,
    token: String,
    retry: RetryPolicy,
}

impl GithubAccountChecker {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, token, RetryPolicy::default())
    }

    pub fn with_api_url(
        api_url: impl Into<String>,
        token: impl Into<String>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        // A redirect is an answer in itself; following it would hide renames.
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(concat!("chainjacking/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ChainjackError::Client { source })?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            retry,
        })
    }

    async fn lookup(&self, account: &str) -> Result<StatusCode> {
        let url = format!("{}/users/{}", self.api_url, account);
        let response = self
            .client
            .head(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ChainjackError::Transport {
                account: account.to_string(),
                source,
            })?;
        Ok(response.status())
    }
}

#[async_trait]
impl AccountChecker for GithubAccountChecker {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn exists(&self, account: &str) -> Result<bool> {
        for attempt in 1..=self.retry.max_attempts {
            let status = self.lookup(account).await?;

            match status {
                StatusCode::NOT_FOUND => return Ok(false),
                StatusCode::UNAUTHORIZED => {
                    error!("Your GitHub token is invalid");
                    return Err(ChainjackError::Authentication);
                }
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    debug!(
                        "Reached GitHub's rate limit (attempt {}/{}). waiting for a few seconds and resuming with username - \"{}\"",
                        attempt, self.retry.max_attempts, account
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
                s if s.is_success() => return Ok(true),
                s => {
                    return Err(ChainjackError::Http {
                        account: account.to_string(),
                        status: s.as_u16(),
                    })
                }
            }
        }

        Err(ChainjackError::RateLimitExhausted {
            account: account.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::{Duration, Instant};

    fn checker(url: &str, attempts: u32) -> GithubAccountChecker {
        GithubAccountChecker::with_api_url(url, "test-token", RetryPolicy::immediate(attempts))
            .unwrap()
    }

    #[tokio::test]
    async fn test_existing_account() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/users/octocat")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .create_async()
            .await;

        assert!(checker(&server.url(), 3).exists("octocat").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_account_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/users/ghost-user")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        assert!(!checker(&server.url(), 3).exists("ghost-user").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/users/octocat")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let err = checker(&server.url(), 3).exists("octocat").await.unwrap_err();
        assert!(matches!(err, ChainjackError::Authentication));
        assert!(err.is_fatal());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sustained_rate_limit_exhausts_retries() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/users/octocat")
            .with_status(403)
            .expect(3)
            .create_async()
            .await;

        let err = checker(&server.url(), 3).exists("octocat").await.unwrap_err();
        match err {
            ChainjackError::RateLimitExhausted { account, attempts } => {
                assert_eq!(account, "octocat");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("HEAD", "/users/octocat")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let found = server
            .mock("HEAD", "/users/octocat")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        assert!(checker(&server.url(), 3).exists("octocat").await.unwrap());
        limited.assert_async().await;
        found.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_then_missing() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("HEAD", "/users/ghost-user")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let missing = server
            .mock("HEAD", "/users/ghost-user")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        assert!(!checker(&server.url(), 3).exists("ghost-user").await.unwrap());
        limited.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_backoff_between_attempts() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/users/octocat")
            .with_status(403)
            .expect(3)
            .create_async()
            .await;
        let backoff = Duration::from_millis(150);
        let checker = GithubAccountChecker::with_api_url(
            server.url(),
            "test-token",
            RetryPolicy::new(3, backoff),
        )
        .unwrap();

        let started = Instant::now();
        let err = checker.exists("octocat").await.unwrap_err();

        assert!(matches!(err, ChainjackError::RateLimitExhausted { attempts: 3, .. }));
        // Two waits: none after the final attempt.
        assert!(started.elapsed() >= backoff * 2);
    }

    #[tokio::test]
    async fn test_unexpected_status_is_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Regex("^/users/".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let err = checker(&server.url(), 3).exists("octocat").await.unwrap_err();
        assert!(matches!(err, ChainjackError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/users/renamed")
            .with_status(301)
            .with_header("location", "/users/new-name")
            .create_async()
            .await;

        let err = checker(&server.url(), 3).exists("renamed").await.unwrap_err();
        assert!(matches!(err, ChainjackError::Http { status: 301, .. }));
    }
}
