use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::registry::RegistryResult;
use crate::types::AppState;
use crate::wire::{
    Code, CountElementsResponse, CreateFilterRequest, ElementRequest,
    ElementsRequest, FilterRequest, HEALTH_PATH, InsertElementsResponse,
    ListFiltersRequest, ListFiltersResponse, LookupElementsResponse, RpcMethod,
    Status, StatusResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        create_filter,
        insert_element,
        insert_elements,
        lookup_element,
        lookup_elements,
        delete_element,
        delete_filter,
        reset_filter,
        count_elements,
        list_filters,
    ),
    components(
        schemas(
            Status,
            StatusResponse,
            CreateFilterRequest,
            ElementRequest,
            ElementsRequest,
            FilterRequest,
            ListFiltersRequest,
            InsertElementsResponse,
            LookupElementsResponse,
            CountElementsResponse,
            ListFiltersResponse,
        )
    ),
    tags(
        (name = "cuckoo-filter", description = "Cuckoo Filter RPC API")
    )
)]
struct ApiDoc;

fn status_of<T>(result: &RegistryResult<T>) -> Status {
    match result {
        Ok(_) => Status::ok(),
        Err(e) => Status::from(e),
    }
}

/// `Ok(false)` from a membership probe means the element is absent
fn presence_status(result: RegistryResult<bool>, element: &str) -> Status {
    match result {
        Ok(true) => Status::ok(),
        Ok(false) => Status::new(
            Code::ElementNotFound,
            format!("element '{element}' not found"),
        ),
        Err(e) => Status::from(&e),
    }
}

/// Check API health
#[utoipa::path(
    get,
    path = "/health",
    tag = "cuckoo-filter",
    responses(
        (status = 200, description = "API is healthy")
    )
)]
async fn health_check() -> impl IntoResponse {
    debug!("Health check");
    StatusCode::OK
}

/// Create a named filter sized for `capacity` elements
#[utoipa::path(
    post,
    path = "/rpc/CreateFilter",
    tag = "cuckoo-filter",
    request_body = CreateFilterRequest,
    responses(
        (status = 200, description = "Status of the create", body = StatusResponse)
    )
)]
async fn create_filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateFilterRequest>,
) -> impl IntoResponse {
    debug!(
        "Creating filter {} with capacity {}",
        &request.filter_name, request.capacity
    );
    let result = state
        .registry
        .create(&request.filter_name, request.capacity)
        .await;
    Json(StatusResponse {
        status: status_of(&result),
    })
}

/// Insert one element
#[utoipa::path(
    post,
    path = "/rpc/InsertElement",
    tag = "cuckoo-filter",
    request_body = ElementRequest,
    responses(
        (status = 200, description = "Status of the insert", body = StatusResponse)
    )
)]
async fn insert_element(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementRequest>,
) -> impl IntoResponse {
    debug!("Inserting {} into {}", &request.element, &request.filter_name);
    let result = state
        .registry
        .insert(&request.filter_name, &request.element)
        .await;
    Json(StatusResponse {
        status: status_of(&result),
    })
}

/// Insert a batch, reporting the elements that did not fit
#[utoipa::path(
    post,
    path = "/rpc/InsertElements",
    tag = "cuckoo-filter",
    request_body = ElementsRequest,
    responses(
        (status = 200, description = "Failed elements", body = InsertElementsResponse)
    )
)]
async fn insert_elements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementsRequest>,
) -> impl IntoResponse {
    debug!(
        "Inserting {} elements into {}",
        request.elements.len(),
        &request.filter_name
    );
    let result = state
        .registry
        .insert_many(&request.filter_name, &request.elements)
        .await;
    let status = status_of(&result);
    Json(InsertElementsResponse {
        status,
        failed_elements: result.unwrap_or(request.elements),
    })
}

/// Check membership of one element
#[utoipa::path(
    post,
    path = "/rpc/LookupElement",
    tag = "cuckoo-filter",
    request_body = ElementRequest,
    responses(
        (status = 200, description = "Code 0 if present", body = StatusResponse)
    )
)]
async fn lookup_element(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementRequest>,
) -> impl IntoResponse {
    debug!("Looking up {} in {}", &request.element, &request.filter_name);
    let result = state
        .registry
        .lookup(&request.filter_name, &request.element)
        .await;
    Json(StatusResponse {
        status: presence_status(result, &request.element),
    })
}

/// Check membership of a batch
#[utoipa::path(
    post,
    path = "/rpc/LookupElements",
    tag = "cuckoo-filter",
    request_body = ElementsRequest,
    responses(
        (status = 200, description = "Matched and unmatched elements", body = LookupElementsResponse)
    )
)]
async fn lookup_elements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementsRequest>,
) -> impl IntoResponse {
    debug!(
        "Looking up {} elements in {}",
        request.elements.len(),
        &request.filter_name
    );
    let result = state
        .registry
        .lookup_many(&request.filter_name, &request.elements)
        .await;
    let status = status_of(&result);
    let (matched_elements, unmatched_elements) = result.unwrap_or_default();
    Json(LookupElementsResponse {
        status,
        matched_elements,
        unmatched_elements,
    })
}

/// Delete one element
#[utoipa::path(
    post,
    path = "/rpc/DeleteElement",
    tag = "cuckoo-filter",
    request_body = ElementRequest,
    responses(
        (status = 200, description = "Code 0 if the element was removed", body = StatusResponse)
    )
)]
async fn delete_element(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementRequest>,
) -> impl IntoResponse {
    debug!("Deleting {} from {}", &request.element, &request.filter_name);
    let result = state
        .registry
        .delete_element(&request.filter_name, &request.element)
        .await;
    Json(StatusResponse {
        status: presence_status(result, &request.element),
    })
}

/// Drop a whole filter
#[utoipa::path(
    post,
    path = "/rpc/DeleteFilter",
    tag = "cuckoo-filter",
    request_body = FilterRequest,
    responses(
        (status = 200, description = "Status of the delete", body = StatusResponse)
    )
)]
async fn delete_filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    debug!("Deleting filter {}", &request.filter_name);
    let result = state.registry.delete_filter(&request.filter_name).await;
    Json(StatusResponse {
        status: status_of(&result),
    })
}

/// Empty a filter, keeping its capacity
#[utoipa::path(
    post,
    path = "/rpc/ResetFilter",
    tag = "cuckoo-filter",
    request_body = FilterRequest,
    responses(
        (status = 200, description = "Status of the reset", body = StatusResponse)
    )
)]
async fn reset_filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    debug!("Resetting filter {}", &request.filter_name);
    let result = state.registry.reset(&request.filter_name).await;
    Json(StatusResponse {
        status: status_of(&result),
    })
}

/// Number of stored elements
#[utoipa::path(
    post,
    path = "/rpc/CountElements",
    tag = "cuckoo-filter",
    request_body = FilterRequest,
    responses(
        (status = 200, description = "Element count", body = CountElementsResponse)
    )
)]
async fn count_elements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    let result = state.registry.count(&request.filter_name).await;
    let status = status_of(&result);
    Json(CountElementsResponse {
        status,
        len: result.unwrap_or(0),
    })
}

/// Names of all filters
#[utoipa::path(
    post,
    path = "/rpc/ListFilters",
    tag = "cuckoo-filter",
    request_body = ListFiltersRequest,
    responses(
        (status = 200, description = "Filter names", body = ListFiltersResponse)
    )
)]
async fn list_filters(
    State(state): State<Arc<AppState>>,
    Json(_request): Json<ListFiltersRequest>,
) -> impl IntoResponse {
    Json(ListFiltersResponse {
        status: Status::ok(),
        filters: state.registry.list().await,
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi),
        )
        .route(HEALTH_PATH, get(health_check))
        .route(RpcMethod::CreateFilter.path(), post(create_filter))
        .route(RpcMethod::InsertElement.path(), post(insert_element))
        .route(RpcMethod::InsertElements.path(), post(insert_elements))
        .route(RpcMethod::LookupElement.path(), post(lookup_element))
        .route(RpcMethod::LookupElements.path(), post(lookup_elements))
        .route(RpcMethod::DeleteElement.path(), post(delete_element))
        .route(RpcMethod::DeleteFilter.path(), post(delete_filter))
        .route(RpcMethod::ResetFilter.path(), post(reset_filter))
        .route(RpcMethod::CountElements.path(), post(count_elements))
        .route(RpcMethod::ListFilters.path(), post(list_filters))
        .with_state(state)
}

/// Serve the API on an already bound listener until the task is dropped.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}
