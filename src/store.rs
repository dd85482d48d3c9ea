use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{error, info};

use crate::config::DatabaseCredentials;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A privacy policy URL together with the active flag stored for it.
/// `None` means the flag was never recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PolicyUrl {
    pub(crate) url: String,
    pub(crate) previously_active: Option<bool>,
}

impl PolicyUrl {
    pub(crate) fn new(url: impl Into<String>, previously_active: bool) -> Self {
        Self {
            url: url.into(),
            previously_active: Some(previously_active),
        }
    }

    #[cfg(test)]
    pub(crate) fn unknown(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            previously_active: None,
        }
    }
}

/// Persistence for policy URLs and their active flags.
#[async_trait]
pub(crate) trait PolicyStore: Send + Sync {
    /// Every stored URL, in the order the store returns them.
    async fn policy_urls_and_active(&self) -> Result<Vec<PolicyUrl>>;

    /// Updates the flag for `url`, inserting the row when it does not exist yet.
    async fn insert_policy(&self, url: &str, is_url_active: bool) -> Result<()>;
}

/// MySQL backed store over the `policy` table:
///
/// ```sql
/// CREATE TABLE policy (
///     url VARCHAR(768) NOT NULL PRIMARY KEY,
///     is_url_active BOOL NULL
/// );
/// ```
///
/// Upserts use the `INSERT ... AS new` row alias, so the server must be MySQL 8.0.19 or newer.
///
/// A value of this type always holds an established connection; `init` is the only way to get one.
#[derive(Clone, Debug)]
pub(crate) struct MySqlPolicyStore {
    pool: MySqlPool,
}

fn connect_options(credentials: &DatabaseCredentials) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port())
        .database(&credentials.database)
        .username(&credentials.user)
        .password(&credentials.password)
}

impl MySqlPolicyStore {
    #[tracing::instrument(level = "info", skip_all)]
    pub(crate) async fn init(credentials: &DatabaseCredentials) -> Result<Self> {
        // One connection, shared by the bulk read and every update
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(connect_options(credentials))
            .await;

        match pool {
            Ok(pool) => {
                info!(
                    "Database initialization (host={}, db={}, user={}) successful",
                    credentials.host, credentials.database, credentials.user
                );
                Ok(Self { pool })
            }
            Err(err) => {
                error!(
                    "Database initialization (host={}, db={}, user={}) failed: {:?}",
                    credentials.host, credentials.database, credentials.user, err
                );
                Err(err).with_context(|| {
                    format!(
                        "Failed to connect to database {} on {}:{}",
                        credentials.database,
                        credentials.host,
                        credentials.port()
                    )
                })
            }
        }
    }
}

#[async_trait]
impl PolicyStore for MySqlPolicyStore {
    #[tracing::instrument(level = "info", skip_all)]
    async fn policy_urls_and_active(&self) -> Result<Vec<PolicyUrl>> {
        let rows: Vec<(String, Option<i64>)> =
            sqlx::query_as("SELECT url, CAST(is_url_active AS SIGNED) FROM policy")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read policy URLs")?;

        Ok(rows
            .into_iter()
            .map(|(url, active)| PolicyUrl {
                url,
                previously_active: active.map(|active| active != 0),
            })
            .collect())
    }

    #[tracing::instrument(level = "info", skip(self))]
    async fn insert_policy(&self, url: &str, is_url_active: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO policy (url, is_url_active) VALUES (?, ?) AS new \
             ON DUPLICATE KEY UPDATE is_url_active = new.is_url_active",
        )
        .bind(url)
        .bind(is_url_active)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update policy {}", url))?;

        Ok(())
    }
}
