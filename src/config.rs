use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap_serde_derive::ClapSerde;
use serde::Deserialize;
use tracing::info;

use crate::checker::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Settings for the reachability checks, overridable from the command line
#[derive(ClapSerde, Debug)]
pub struct Config {
    /// Seconds to wait for a URL before treating it as unreachable
    #[default(DEFAULT_TIMEOUT_SECS)]
    #[arg(long, env = "URL_CHECKER_TIMEOUT_SECS")]
    pub(crate) timeout_secs: u64,

    /// User-Agent header sent with every check
    #[default(DEFAULT_USER_AGENT.to_string())]
    #[arg(long, env = "URL_CHECKER_USER_AGENT")]
    pub(crate) user_agent: String,
}

impl Config {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, PartialEq, Eq)]
pub(crate) struct DatabaseCredentials {
    pub(crate) host: String,
    pub(crate) port: Option<u16>,
    pub(crate) database: String,
    pub(crate) user: String,
    pub(crate) password: String,
}

impl DatabaseCredentials {
    pub(crate) fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_MYSQL_PORT)
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port())
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    database: Option<DatabaseCredentials>,
    checker: Option<<Config as ClapSerde>::Opt>,
}

#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) database: DatabaseCredentials,
    pub(crate) checker: Config,
}

impl Settings {
    pub(crate) fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let file: ConfigFile =
            toml::from_str(&str).with_context(|| format!("Invalid config file {}", path))?;

        let Some(database) = file.database else {
            bail!("No [database] section found in config file {}", path)
        };
        info!(
            "Found database credentials for host={}, database={}, user={}",
            database.host, database.database, database.user
        );

        let checker = match file.checker {
            Some(opt) => Config::from(opt),
            None => Config::default(),
        };
        if checker.timeout_secs == 0 {
            bail!("timeout_secs in config file {} must be greater than zero", path)
        }

        Ok(Settings { database, checker })
    }

    /// Command line values win over the file.
    pub(crate) fn merge(self, opt: <Config as ClapSerde>::Opt) -> Result<Self> {
        let checker = self.checker.merge(opt);
        if checker.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero")
        }
        Ok(Settings { checker, ..self })
    }
}
