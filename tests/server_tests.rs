#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use cuckoofilter_client::api::create_router;
    use cuckoofilter_client::{AppState, ServerConfigBuilder};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn setup_test_app() -> Router {
        let config = ServerConfigBuilder::default()
            .max_capacity(10_000)
            .build()
            .unwrap();
        let state = Arc::new(AppState::new(&config));

        create_router(state)
    }

    async fn rpc(app: &Router, method: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/rpc/{method}"))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body_bytes = body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_insert_and_lookup() {
        let app = setup_test_app();

        let (status, body) = rpc(
            &app,
            "CreateFilter",
            json!({ "filter_name": "f", "capacity": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["code"], 0);

        let (_, body) = rpc(
            &app,
            "InsertElement",
            json!({ "filter_name": "f", "element": "test_item" }),
        )
        .await;
        assert_eq!(body["status"]["code"], 0);

        let (_, body) = rpc(
            &app,
            "LookupElement",
            json!({ "filter_name": "f", "element": "test_item" }),
        )
        .await;
        assert_eq!(body["status"]["code"], 0);

        let (_, body) = rpc(
            &app,
            "LookupElement",
            json!({ "filter_name": "f", "element": "nonexistent" }),
        )
        .await;
        assert_eq!(body["status"]["code"], 3);
    }

    #[tokio::test]
    async fn test_application_errors_are_status_codes() {
        let app = setup_test_app();

        let (status, body) = rpc(
            &app,
            "InsertElement",
            json!({ "filter_name": "ghost", "element": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["code"], 1);
        assert!(
            body["status"]["message"]
                .as_str()
                .unwrap()
                .contains("ghost")
        );

        let (_, body) = rpc(
            &app,
            "CreateFilter",
            json!({ "filter_name": "too-big", "capacity": 10_001 }),
        )
        .await;
        assert_eq!(body["status"]["code"], 5);
    }

    #[tokio::test]
    async fn test_batch_responses() {
        let app = setup_test_app();
        rpc(
            &app,
            "CreateFilter",
            json!({ "filter_name": "b", "capacity": 1000 }),
        )
        .await;

        let (_, body) = rpc(
            &app,
            "InsertElements",
            json!({ "filter_name": "b", "elements": ["a", "b"] }),
        )
        .await;
        assert_eq!(body["status"]["code"], 0);
        assert_eq!(body["failed_elements"], json!([]));

        let (_, body) = rpc(
            &app,
            "LookupElements",
            json!({ "filter_name": "b", "elements": ["a", "zzz"] }),
        )
        .await;
        assert_eq!(body["matched_elements"], json!(["a"]));
        assert_eq!(body["unmatched_elements"], json!(["zzz"]));

        let (_, body) =
            rpc(&app, "CountElements", json!({ "filter_name": "b" })).await;
        assert_eq!(body["len"], 2);

        let (_, body) = rpc(&app, "ListFilters", json!({})).await;
        assert_eq!(body["filters"], json!(["b"]));
    }

    #[tokio::test]
    async fn test_batch_on_missing_filter_reports_all_failed() {
        let app = setup_test_app();

        let (_, body) = rpc(
            &app,
            "InsertElements",
            json!({ "filter_name": "ghost", "elements": ["a", "b"] }),
        )
        .await;
        assert_eq!(body["status"]["code"], 1);
        assert_eq!(body["failed_elements"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let app = setup_test_app();
        rpc(
            &app,
            "CreateFilter",
            json!({ "filter_name": "d", "capacity": 100 }),
        )
        .await;
        rpc(
            &app,
            "InsertElement",
            json!({ "filter_name": "d", "element": "x" }),
        )
        .await;

        let (_, body) =
            rpc(&app, "ResetFilter", json!({ "filter_name": "d" })).await;
        assert_eq!(body["status"]["code"], 0);
        let (_, body) =
            rpc(&app, "CountElements", json!({ "filter_name": "d" })).await;
        assert_eq!(body["len"], 0);

        let (_, body) =
            rpc(&app, "DeleteFilter", json!({ "filter_name": "d" })).await;
        assert_eq!(body["status"]["code"], 0);
        let (_, body) =
            rpc(&app, "DeleteFilter", json!({ "filter_name": "d" })).await;
        assert_eq!(body["status"]["code"], 1);
    }

    #[tokio::test]
    async fn test_malformed_request_is_rejected() {
        let app = setup_test_app();

        let (status, _) =
            rpc(&app, "CreateFilter", json!({ "capacity": "lots" })).await;
        assert!(status.is_client_error());
    }
}
