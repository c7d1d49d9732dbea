// API Integration Tests
//
// Purpose: Exercise every endpoint against in-memory reference data
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use ci_scorer_rust::test_support::{fixture_store, sample_batch, sample_feature};
    use ci_scorer_rust::{create_router, AppState, CiCalculator};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt; // for oneshot

    const KEY: &str = "test-key";

    // Helper: Create test app with a configured key
    fn create_test_app(api_key: Option<&str>) -> axum::Router {
        let calculator = CiCalculator::new(Arc::new(fixture_store()));
        let state = AppState::with_calculator(calculator, api_key.map(str::to_string), true);
        create_router(state)
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    // =========================================================================
    // Section 1: Health Check and Greeting
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(Some(KEY));
        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_response(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_greeting_with_key() {
        let app = create_test_app(Some(KEY));
        let response = app.oneshot(get("/?key=test-key")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_response(response).await;
        assert_eq!(json["message"], "Hello, This is the GREET Calculator API!");
    }

    // =========================================================================
    // Section 2: API Key Checks
    // =========================================================================

    #[tokio::test]
    async fn test_missing_key_is_forbidden() {
        let app = create_test_app(Some(KEY));
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_response(response).await["detail"], "No API key provided");
    }

    #[tokio::test]
    async fn test_wrong_key_is_forbidden() {
        let app = create_test_app(Some(KEY));
        let body = sample_batch(vec![sample_feature("P-1", "Corn")], false, "CIS");
        let response = app.oneshot(post_json("/calculate?key=nope", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_response(response).await["detail"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_unconfigured_key_is_server_error() {
        let app = create_test_app(None);
        let response = app.oneshot(get("/?key=anything")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // =========================================================================
    // Section 3: Calculation
    // =========================================================================

    #[tokio::test]
    async fn test_calculate_batch() {
        let app = create_test_app(Some(KEY));
        let body = sample_batch(
            vec![sample_feature("P-1", "Corn"), sample_feature("P-2", "Oats")],
            true,
            "CIS",
        );
        let response = app.oneshot(post_json("/calculate?key=test-key", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_response(response).await;
        let collection = &json["ResultsCollection"];
        assert_eq!(collection["Data"].as_array().unwrap().len(), 1);
        assert_eq!(collection["Rejected Records"][0]["Planting ID"], "P-2");
        assert_eq!(json["Certificates"][0]["CIS_ID"], "CIS-P-1");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = create_test_app(Some(KEY));
        let body = serde_json::json!({ "Season": "2024", "GeoJSON": "not a collection" });
        let response = app.oneshot(post_json("/calculate?key=test-key", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_response(response).await;
        assert!(json["detail"].as_str().unwrap().starts_with("Invalid request body"));
    }
}
