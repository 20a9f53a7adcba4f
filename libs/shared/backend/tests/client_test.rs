use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::AppError;

fn client_for(server: &MockServer) -> BackendClient {
    let config = AppConfig {
        api_base_url: server.uri(),
        api_token: "test-token".to_string(),
        preferences_path: std::env::temp_dir().join("unused-preferences.json"),
    };
    BackendClient::new(&config)
}

#[tokio::test]
async fn sends_bearer_token_and_parses_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body: serde_json::Value = client.request(Method::GET, "/ping", None).await.unwrap();

    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn error_message_field_wins_over_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Start time must be before end time"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .request::<serde_json::Value>(Method::GET, "/boom", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Api(_)));
    assert_eq!(err.user_message(), "Start time must be before end time");
}

#[tokio::test]
async fn raw_body_is_used_when_no_message_field() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rows/1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("schedule overlaps"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.execute(Method::DELETE, "/rows/1", None).await.unwrap_err();

    assert_eq!(err.user_message(), "schedule overlaps");
}

#[tokio::test]
async fn auth_statuses_map_to_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .request::<serde_json::Value>(Method::GET, "/private", None)
        .await
        .unwrap_err();

    assert!(err.is_auth());
}

#[tokio::test]
async fn missing_resources_map_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such row"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .request::<serde_json::Value>(Method::GET, "/gone", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let config = AppConfig {
        // Nothing listens here
        api_base_url: "http://127.0.0.1:9".to_string(),
        api_token: "test-token".to_string(),
        preferences_path: std::env::temp_dir().join("unused-preferences.json"),
    };
    let client = BackendClient::new(&config);

    let err = client
        .request::<serde_json::Value>(Method::GET, "/anything", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Network(_)));
}
