//! Gemini `generateContent` backend.
//!
//! One prompt in, one text out: the prompt is sent as a single user part and
//! the first text part of the first candidate is returned. The API key is
//! passed as the `key` query parameter and never appears in errors or logs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use stepwise_application::ports::model_backend::{GatewayError, ModelBackend};
use tracing::{debug, info};

use crate::config::FileModelConfig;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini model backend
#[derive(Clone)]
pub struct GeminiBackend {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Build a backend from the `[model]` section, reading the API key from
    /// the configured environment variable.
    pub fn from_config(config: &FileModelConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::AuthenticationError(format!(
                    "environment variable {} is not set",
                    config.api_key_env
                ))
            })?;

        let backend = Self::new(&config.name, api_key);
        Ok(match &config.endpoint {
            Some(endpoint) => backend.with_endpoint(endpoint),
            None => backend,
        })
    }

    fn model_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        format!("{base}/v1beta/models/{}:generateContent", self.model)
    }

    fn map_status(status: StatusCode, body: &str) -> GatewayError {
        let detail = error_detail(body).unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GatewayError::AuthenticationError(detail)
            }
            StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(detail),
            _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status.as_u16(), detail)),
        }
    }

    fn map_transport(e: reqwest::Error) -> GatewayError {
        let e = e.without_url();
        if e.is_connect() || e.is_timeout() {
            GatewayError::ConnectionError(e.to_string())
        } else {
            GatewayError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        info!(model = self.model.as_str(), bytes = prompt.len(), "Sending request to Gemini");

        let response = self
            .http
            .post(self.model_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(Self::map_transport)?;
        if !status.is_success() {
            return Err(Self::map_status(status, &body));
        }

        debug!(bytes = body.len(), "Received response from Gemini");
        extract_text(&body)
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// First text part of the first candidate.
fn extract_text(body: &str) -> Result<String, GatewayError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Other(format!("invalid Gemini response: {}", e)))?;

    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|text| !text.is_empty())
        .ok_or(GatewayError::EmptyResponse)
}

/// `error.message` from a Google API error body.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port, returning its base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // The request body is the JSON payload, which ends with `}]}]}`.
            while !request.ends_with(b"}]}]}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"plan\":1}"},{"text":"ignored"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{\"plan\":1}");
    }

    #[test]
    fn test_extract_text_empty() {
        assert_eq!(extract_text(r#"{"candidates":[]}"#), Err(GatewayError::EmptyResponse));
        assert_eq!(extract_text("{}"), Err(GatewayError::EmptyResponse));
        assert_eq!(
            extract_text(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Err(GatewayError::EmptyResponse)
        );
        assert!(matches!(extract_text("not json"), Err(GatewayError::Other(_))));
    }

    #[test]
    fn test_model_url() {
        let backend = GeminiBackend::new("gemini-2.0-flash", "k").with_endpoint("http://host/");
        assert_eq!(
            backend.model_url(),
            "http://host/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"code":403,"message":"API key not valid"}}"#;
        assert_eq!(
            GeminiBackend::map_status(StatusCode::FORBIDDEN, body),
            GatewayError::AuthenticationError("API key not valid".to_string())
        );
        assert!(matches!(
            GeminiBackend::map_status(StatusCode::NOT_FOUND, ""),
            GatewayError::ModelNotAvailable(_)
        ));
        assert_eq!(
            GeminiBackend::map_status(StatusCode::TOO_MANY_REQUESTS, "{}"),
            GatewayError::RequestFailed("HTTP 429: 429 Too Many Requests".to_string())
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = FileModelConfig {
            api_key_env: "STEPWISE_TEST_UNSET_GEMINI_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            GeminiBackend::from_config(&config),
            Err(GatewayError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_against_local_server() {
        let base = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"}],"role":"model"}}]}"#,
        )
        .await;
        let backend = GeminiBackend::new("m", "secret").with_endpoint(base);
        assert_eq!(backend.generate("hi").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_generate_maps_http_errors() {
        let base = serve_once("404 Not Found", r#"{"error":{"message":"model m not found"}}"#).await;
        let backend = GeminiBackend::new("m", "secret").with_endpoint(base);
        assert_eq!(
            backend.generate("hi").await,
            Err(GatewayError::ModelNotAvailable("model m not found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = GeminiBackend::new("m", "secret").with_endpoint(format!("http://{}", addr));
        match backend.generate("hi").await {
            Err(GatewayError::ConnectionError(message)) => assert!(!message.contains("secret")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
