use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::da::PollPolicy;

/// Configuration loaded from config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub da: DaConfig,
}

/// Which transport the adapter talks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Plain HTTP store/fetch
    Store,
    /// gRPC disperser with confirmation polling
    Disperser,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" => Ok(TransportKind::Store),
            "disperser" => Ok(TransportKind::Disperser),
            other => bail!("Unknown transport '{other}', expected 'store' or 'disperser'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaConfig {
    pub transport: TransportKind,
    /// Disperser `host:port` or storage base URL
    pub rpc: String,
    /// Total time spent waiting for the disperser to confirm a blob
    pub status_query_timeout_secs: u64,
    /// Time to wait between status queries of a newly dispersed blob
    pub status_query_retry_interval_secs: u64,
    /// Consecutive failed status queries before giving up (0 = never)
    #[serde(default)]
    pub max_transient_status_errors: u32,
}

impl DaConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_secs(self.status_query_timeout_secs),
            retry_interval: Duration::from_secs(self.status_query_retry_interval_secs),
            max_transient_errors: match self.max_transient_status_errors {
                0 => None,
                n => Some(n),
            },
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.trim().is_empty() {
            bail!("da.rpc must not be empty");
        }
        if self.status_query_timeout_secs == 0 {
            bail!("da.status_query_timeout_secs must be greater than zero");
        }
        if self.status_query_retry_interval_secs == 0 {
            bail!("da.status_query_retry_interval_secs must be greater than zero");
        }
        Ok(())
    }
}

impl Config {
    /// Read `path`, apply `DA_*` environment overrides, then validate
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.apply_env(|key| env::var(key).ok())?;
        config.da.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let da = &mut self.da;
        if let Some(v) = lookup("DA_TRANSPORT") {
            da.transport = v.parse()?;
        }
        if let Some(v) = lookup("DA_RPC") {
            da.rpc = v;
        }
        if let Some(v) = lookup("DA_STATUS_QUERY_TIMEOUT_SECS") {
            da.status_query_timeout_secs = v
                .parse()
                .context("DA_STATUS_QUERY_TIMEOUT_SECS must be an integer")?;
        }
        if let Some(v) = lookup("DA_STATUS_QUERY_RETRY_INTERVAL_SECS") {
            da.status_query_retry_interval_secs = v
                .parse()
                .context("DA_STATUS_QUERY_RETRY_INTERVAL_SECS must be an integer")?;
        }
        if let Some(v) = lookup("DA_MAX_TRANSIENT_STATUS_ERRORS") {
            da.max_transient_status_errors = v
                .parse()
                .context("DA_MAX_TRANSIENT_STATUS_ERRORS must be an integer")?;
        }
        Ok(())
    }
}
