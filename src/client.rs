use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::dialer::{Connection, Dialer, HttpDialer};
use crate::error::{ClientError, Result};
use crate::wire::{
    CountElementsResponse, CreateFilterRequest, ElementRequest, ElementsRequest,
    FilterRequest, InsertElementsResponse, ListFiltersRequest,
    ListFiltersResponse, LookupElementsResponse, RpcMethod, Status,
    StatusResponse,
};

/// Split result of a batch lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupOutcome {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}

/// Client for a remote cuckoo filter service.
///
/// Every operation is a single round trip bounded by
/// [`ClientConfig::timeout`]. Nothing is retried or cached.
///
/// ```no_run
/// use cuckoofilter_client::{Client, ClientConfigBuilder};
///
/// # async fn run() -> cuckoofilter_client::Result<()> {
/// let config = ClientConfigBuilder::default()
///     .addr("localhost:50051")
///     .build()
///     .expect("valid config");
/// let client = Client::connect(config).await?;
///
/// client.create_filter("users", 1_000_000).await?;
/// client.insert_element("users", "alice").await?;
/// assert!(client.lookup_element("users", "alice").await?);
///
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    config: ClientConfig,
    dialer: Arc<dyn Dialer>,
    conn: RwLock<Option<Connection>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with(config, Arc::new(HttpDialer)).await
    }

    pub async fn connect_with(
        config: ClientConfig,
        dialer: Arc<dyn Dialer>,
    ) -> Result<Self> {
        config.validate()?;
        let conn = dialer.dial(&config).await?;
        info!("Connected to cuckoo filter service at {}", config.addr);

        Ok(Self {
            config,
            dialer,
            conn: RwLock::new(Some(conn)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dial the service again to verify it is alive.
    ///
    /// On success the fresh connection replaces the current one.
    pub async fn ping(&self) -> Result<()> {
        if self.is_closed().await {
            return Err(ClientError::Closed);
        }
        let fresh = self.dialer.dial(&self.config).await?;

        let mut guard = self.conn.write().await;
        // close() may have won the race while we were dialing
        if guard.is_none() {
            return Err(ClientError::Closed);
        }
        *guard = Some(fresh);
        Ok(())
    }

    /// Release the connection. Safe to call any number of times.
    pub async fn close(&self) {
        if self.conn.write().await.take().is_some() {
            info!("Closed connection to {}", self.config.addr);
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.conn.read().await.is_none()
    }

    pub async fn create_filter(
        &self,
        filter_name: &str,
        capacity: u64,
    ) -> Result<bool> {
        let req = CreateFilterRequest {
            filter_name: filter_name.to_string(),
            capacity,
        };
        let resp: StatusResponse = self.call(RpcMethod::CreateFilter, &req).await?;
        Ok(accepted(RpcMethod::CreateFilter, &resp.status))
    }

    pub async fn insert_element(
        &self,
        filter_name: &str,
        element: &str,
    ) -> Result<bool> {
        let req = element_request(filter_name, element);
        let resp: StatusResponse =
            self.call(RpcMethod::InsertElement, &req).await?;
        Ok(accepted(RpcMethod::InsertElement, &resp.status))
    }

    /// Insert a batch and return the elements the service could not store.
    pub async fn insert_elements<S: AsRef<str>>(
        &self,
        filter_name: &str,
        elements: &[S],
    ) -> Result<Vec<String>> {
        let req = elements_request(filter_name, elements);
        let resp: InsertElementsResponse =
            self.call(RpcMethod::InsertElements, &req).await?;
        into_result(RpcMethod::InsertElements, resp.status)?;
        Ok(resp.failed_elements)
    }

    pub async fn lookup_element(
        &self,
        filter_name: &str,
        element: &str,
    ) -> Result<bool> {
        let req = element_request(filter_name, element);
        let resp: StatusResponse =
            self.call(RpcMethod::LookupElement, &req).await?;
        Ok(accepted(RpcMethod::LookupElement, &resp.status))
    }

    pub async fn lookup_elements<S: AsRef<str>>(
        &self,
        filter_name: &str,
        elements: &[S],
    ) -> Result<LookupOutcome> {
        let req = elements_request(filter_name, elements);
        let resp: LookupElementsResponse =
            self.call(RpcMethod::LookupElements, &req).await?;
        into_result(RpcMethod::LookupElements, resp.status)?;
        Ok(LookupOutcome {
            matched: resp.matched_elements,
            unmatched: resp.unmatched_elements,
        })
    }

    pub async fn delete_element(
        &self,
        filter_name: &str,
        element: &str,
    ) -> Result<bool> {
        let req = element_request(filter_name, element);
        let resp: StatusResponse =
            self.call(RpcMethod::DeleteElement, &req).await?;
        Ok(accepted(RpcMethod::DeleteElement, &resp.status))
    }

    pub async fn delete_filter(&self, filter_name: &str) -> Result<bool> {
        let req = filter_request(filter_name);
        let resp: StatusResponse =
            self.call(RpcMethod::DeleteFilter, &req).await?;
        Ok(accepted(RpcMethod::DeleteFilter, &resp.status))
    }

    pub async fn reset_filter(&self, filter_name: &str) -> Result<bool> {
        let req = filter_request(filter_name);
        let resp: StatusResponse =
            self.call(RpcMethod::ResetFilter, &req).await?;
        Ok(accepted(RpcMethod::ResetFilter, &resp.status))
    }

    pub async fn count_elements(&self, filter_name: &str) -> Result<u64> {
        let req = filter_request(filter_name);
        let resp: CountElementsResponse =
            self.call(RpcMethod::CountElements, &req).await?;
        into_result(RpcMethod::CountElements, resp.status)?;
        Ok(resp.len)
    }

    pub async fn list_filters(&self) -> Result<Vec<String>> {
        let resp: ListFiltersResponse = self
            .call(RpcMethod::ListFilters, &ListFiltersRequest::default())
            .await?;
        into_result(RpcMethod::ListFilters, resp.status)?;
        Ok(resp.filters)
    }

    async fn connection(&self) -> Result<Connection> {
        self.conn.read().await.clone().ok_or(ClientError::Closed)
    }

    /// One bounded round trip for `method`.
    async fn call<Req, Resp>(&self, method: RpcMethod, req: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let conn = self.connection().await?;
        let url = conn.url(method.path())?;
        let timeout = self.config.timeout;
        let classify = |e: reqwest::Error| {
            ClientError::from_request(e, method.name(), conn.addr(), timeout)
        };

        debug!("Calling {} on {}", method.name(), conn.addr());
        let resp = conn
            .http()
            .post(url)
            .timeout(timeout)
            .json(req)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                operation: method.name(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body).map_err(|e| {
            ClientError::Decode(format!("{} response: {e}", method.name()))
        })
    }
}

fn accepted(method: RpcMethod, status: &Status) -> bool {
    if !status.is_ok() {
        log_status(method, status);
    }
    status.is_ok()
}

fn into_result(method: RpcMethod, status: Status) -> Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        log_status(method, &status);
        Err(ClientError::Status {
            code: status.code(),
            message: status.message,
        })
    }
}

fn log_status(method: RpcMethod, status: &Status) {
    debug!(
        "{} returned status {}: {}",
        method.name(),
        status.code(),
        status.message
    );
}

fn element_request(filter_name: &str, element: &str) -> ElementRequest {
    ElementRequest {
        filter_name: filter_name.to_string(),
        element: element.to_string(),
    }
}

fn elements_request<S: AsRef<str>>(
    filter_name: &str,
    elements: &[S],
) -> ElementsRequest {
    ElementsRequest {
        filter_name: filter_name.to_string(),
        elements: elements.iter().map(|e| e.as_ref().to_string()).collect(),
    }
}

fn filter_request(filter_name: &str) -> FilterRequest {
    FilterRequest {
        filter_name: filter_name.to_string(),
    }
}
