use cuckoofilter_client::api::create_router;
use cuckoofilter_client::{AppState, ServerConfig};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    let config = ServerConfig::from_env().expect("Failed to load configuration");
    let state = Arc::new(AppState::new(&config));

    let app = create_router(state).layer(
        tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "rpc_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    tracing::info!(
                        status = %response.status(),
                        latency = ?latency,
                        "response generated"
                    );
                },
            ),
    );

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    info!(
        r#"
    Cuckoo Filter Server Starting

    Filter Limits:
       • Max capacity per filter: {:>12} items

    Server Information:
       • Listening on:  http://{}
       • Swagger UI:    http://{}/swagger-ui/
       • Health Check:  http://{}/health

    RPC Endpoints (POST, JSON body):
       • /rpc/CreateFilter     /rpc/DeleteFilter    /rpc/ResetFilter
       • /rpc/InsertElement    /rpc/InsertElements
       • /rpc/LookupElement    /rpc/LookupElements
       • /rpc/DeleteElement    /rpc/CountElements   /rpc/ListFilters

    Performance Mode: {}
    "#,
        config.max_capacity,
        addr,
        addr,
        addr,
        if cfg!(debug_assertions) {
            "DEBUG"
        } else {
            "RELEASE"
        }
    );

    info!("Starting server on {}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
