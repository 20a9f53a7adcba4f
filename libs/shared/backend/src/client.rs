use reqwest::{
    Client, Method, StatusCode,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::AppError;

/// JSON client for the reservation backend. Owns the base URL and bearer
/// token; every wrapper in the workspace goes through `request`/`execute`
/// so failures are normalized in exactly one place.
pub struct BackendClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !self.api_token.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    /// Issue a request and deserialize the JSON response body.
    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Api(format!("Invalid response body: {}", e)))
    }

    /// Issue a request and discard the response body. Used for deletes and
    /// actions whose payload the client never consumes.
    pub async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), AppError> {
        self.send(method, path, body).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url).headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = normalize_error_body(&error_text, status);
            error!("API error ({}): {}", status, message);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(message),
                StatusCode::NOT_FOUND => AppError::NotFound(message),
                _ => AppError::Api(message),
            });
        }

        Ok(response)
    }
}

/// Normalize an error body into a single user-facing message: the JSON
/// `message` field when present, else the raw body, else the status line.
fn normalize_error_body(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_message_field() {
        let body = r#"{"message": "Start time must be before end time"}"#;
        assert_eq!(
            normalize_error_body(body, StatusCode::BAD_REQUEST),
            "Start time must be before end time"
        );
    }

    #[test]
    fn error_body_falls_back_to_raw_text() {
        assert_eq!(
            normalize_error_body("schedule overlaps", StatusCode::CONFLICT),
            "schedule overlaps"
        );
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        assert_eq!(
            normalize_error_body("", StatusCode::BAD_GATEWAY),
            "502 Bad Gateway"
        );
    }
}
