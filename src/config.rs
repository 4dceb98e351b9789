use derive_builder::Builder;
use reqwest::Url;
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

const ADDR_VAR: &str = "CUCKOO_ADDR";
const TIMEOUT_VAR: &str = "CUCKOO_TIMEOUT_MS";

#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into))]
pub struct ClientConfig {
    /// `host:port` of the filter service, optionally with an http(s) scheme
    #[builder(default = "DEFAULT_ADDR.to_string()")]
    pub addr: String,

    /// Bounds both dialing and every individual call
    #[builder(default = "DEFAULT_TIMEOUT")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `CUCKOO_ADDR` and `CUCKOO_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None, None)
    }

    /// Like [`from_env`](Self::from_env), but explicit values win and the
    /// matching variable is never read.
    pub fn from_env_with(
        addr: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(addr, timeout, |name| std::env::var(name).ok())
    }

    fn resolve(
        addr: Option<String>,
        timeout: Option<Duration>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let addr = addr
            .or_else(|| lookup(ADDR_VAR))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let timeout = match timeout {
            Some(timeout) => timeout,
            None => match lookup(TIMEOUT_VAR) {
                Some(value) => parse_timeout_ms(&value)?,
                None => DEFAULT_TIMEOUT,
            },
        };

        let config = Self { addr, timeout };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "Address must not be empty".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "Timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Address as a base URL; a bare `host:port` is served over plain http.
    pub fn base_url(&self) -> Result<Url> {
        let addr = self.addr.trim();
        let raw = if addr.starts_with("http://") || addr.starts_with("https://")
        {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let url = Url::parse(&raw).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid address '{addr}': {e}"))
        })?;
        if url.host_str().is_none() {
            return Err(ClientError::InvalidConfig(format!(
                "Address '{addr}' has no host"
            )));
        }
        // procedure paths are absolute, a prefix would be ignored
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some()
        {
            return Err(ClientError::InvalidConfig(format!(
                "Address '{addr}' must not carry a path, query or fragment"
            )));
        }
        Ok(url)
    }
}

fn parse_timeout_ms(value: &str) -> Result<Duration> {
    value
        .trim()
        .parse()
        .map(Duration::from_millis)
        .map_err(|e: std::num::ParseIntError| ClientError::EnvParseError {
            var_name: TIMEOUT_VAR.to_string(),
            value: value.to_string(),
            error: e.to_string(),
        })
}
