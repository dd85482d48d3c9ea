use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:54.0) Gecko/20100101 Firefox/54.0";

/// Reduces whatever happens when fetching a URL to a single yes/no answer.
#[async_trait]
pub(crate) trait ReachabilityCheck: Send + Sync {
    /// Returns `true` only when the URL answered with a non-error status.
    async fn check(&self, url: &str) -> bool;
}

/// `HttpChecker` issues exactly one GET per check, with a fixed timeout and a browser `User-Agent`.
#[derive(Clone, Debug)]
pub(crate) struct HttpChecker {
    client: Client,
}

impl HttpChecker {
    pub(crate) fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityCheck for HttpChecker {
    #[tracing::instrument(level = "trace", skip(self))]
    async fn check(&self, url: &str) -> bool {
        let outcome = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match outcome {
            Ok(response) => {
                info!("URL {} returned HTTP {}", url, response.status());
                true
            }
            Err(err) => {
                error!("URL {} is unreachable: {:?}", url, err);
                false
            }
        }
    }
}
