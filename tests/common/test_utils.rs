use cuckoofilter_client::api::serve;
use cuckoofilter_client::{
    AppState, ClientConfig, ClientConfigBuilder, ServerConfigBuilder,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// Reference server on an ephemeral port, shut down when dropped
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_max_capacity(1_000_000).await
    }

    pub async fn with_max_capacity(max_capacity: u64) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let config = ServerConfigBuilder::default()
            .server_port(addr.port())
            .max_capacity(max_capacity)
            .build()
            .expect("Failed to build server config");
        let state = Arc::new(AppState::new(&config));

        let handle = tokio::spawn(async move {
            let _ = serve(listener, state).await;
        });

        Self { addr, handle }
    }

    /// Client configuration pointing at this server
    pub fn client_config(&self) -> ClientConfig {
        ClientConfigBuilder::default()
            .addr(self.addr.to_string())
            .timeout(Duration::from_secs(2))
            .build()
            .expect("Failed to build client config")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
