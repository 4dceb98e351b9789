use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::wire::HEALTH_PATH;

/// An established link to the filter service.
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct Connection {
    http: reqwest::Client,
    base_url: Url,
    addr: String,
}

impl Connection {
    pub fn new(http: reqwest::Client, base_url: Url, addr: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            addr: addr.into(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid request path {path}: {e}"))
        })
    }

    /// Blocks until the peer answers `GET /health` or `timeout` elapses.
    pub async fn check_health(&self, timeout: Duration) -> Result<()> {
        let url = self.url(HEALTH_PATH)?;
        debug!("Health check against {}", url);
        self.http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| ClientError::from_request(e, "Dial", &self.addr, timeout))?;
        Ok(())
    }
}

/// Produces connections for a [`Client`](crate::Client).
///
/// Supply your own to control TLS, proxies or connection pooling.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, config: &ClientConfig) -> Result<Connection>;
}

/// Default dialer: plain `reqwest` client plus a blocking health check.
#[derive(Debug, Clone, Default)]
pub struct HttpDialer;

#[async_trait]
impl Dialer for HttpDialer {
    async fn dial(&self, config: &ClientConfig) -> Result<Connection> {
        let base_url = config.base_url()?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;

        let conn = Connection::new(http, base_url, config.addr.clone());
        conn.check_health(config.timeout).await?;
        Ok(conn)
    }
}
