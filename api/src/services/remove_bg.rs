use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;

use super::BackgroundRemover;
use crate::error::RemoveBgError;

const API_KEY_HEADER: &str = "x-api-key";
const IMAGE_FIELD: &str = "image_file";
const IMAGE_FILE_NAME: &str = "image.png";
const BACKGROUND_REMOVAL_FAILED: &str = "Background removal failed";

#[derive(Deserialize)]
struct ClipdropErrorBody {
    error: Option<String>,
}

/// Client for the Clipdrop remove-background endpoint.
///
/// The API key is checked on every call rather than at construction, so the
/// server still starts (and serves deletes) without it.
#[derive(Clone)]
pub struct ClipdropClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl ClipdropClient {
    pub fn new(client: Client, api_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url,
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

#[async_trait]
impl BackgroundRemover for ClipdropClient {
    async fn remove_background(&self, image: Bytes) -> Result<Bytes, RemoveBgError> {
        let api_key = self.api_key.as_deref().ok_or(RemoveBgError::NotConfigured)?;

        let part = multipart::Part::bytes(image.to_vec()).file_name(IMAGE_FILE_NAME);
        let form = multipart::Form::new().part(IMAGE_FIELD, part);

        tracing::debug!(url = %self.api_url, "sending image to background removal API");
        let response = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            let message = upstream_error_message(&body);
            tracing::warn!(status = %status, error = %message, "background removal API rejected the image");
            return Err(RemoveBgError::Upstream(message));
        }

        Ok(body)
    }
}

fn upstream_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ClipdropErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| BACKGROUND_REMOVAL_FAILED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> ClipdropClient {
        ClipdropClient::new(
            Client::new(),
            format!("{}/remove-background/v1", server.uri()),
            api_key.map(str::to_string),
        )
    }

    fn input() -> Bytes {
        Bytes::from_static(b"test-image-data")
    }

    #[tokio::test]
    async fn test_successful_removal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/remove-background/v1"))
            .and(header("x-api-key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"processed-image-data".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, Some("test-api-key"))
            .remove_background(input())
            .await
            .unwrap();

        assert_eq!(result.as_ref(), b"processed-image-data");
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        for key in [None, Some("")] {
            let err = client_for(&server, key)
                .remove_background(input())
                .await
                .unwrap_err();
            assert!(matches!(err, RemoveBgError::NotConfigured));
            assert_eq!(err.to_string(), "CLIPDROP_API_KEY is not configured");
        }
    }

    #[tokio::test]
    async fn test_upstream_json_error_is_surfaced() {
        let cases = [
            (400, "Invalid image format"),
            (401, "Invalid API key"),
            (429, "Rate limit exceeded"),
        ];

        for (status, message) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(status)
                        .set_body_string(serde_json::json!({ "error": message }).to_string()),
                )
                .mount(&server)
                .await;

            let err = client_for(&server, Some("test-api-key"))
                .remove_background(input())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_non_json_error_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("plain text error"))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("test-api-key"))
            .remove_background(input())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Background removal failed");
    }

    #[tokio::test]
    async fn test_server_error_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("test-api-key"))
            .remove_background(input())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoveBgError::Upstream(ref m) if m == "Background removal failed"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/remove-background/v1", listener.local_addr().unwrap());
        drop(listener);

        let client = ClipdropClient::new(Client::new(), url, Some("test-api-key".to_string()));
        let err = client.remove_background(input()).await.unwrap_err();

        assert!(matches!(err, RemoveBgError::Transport(..)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_empty_error_field_uses_generic_message() {
        assert_eq!(upstream_error_message(br#"{"error":""}"#), "Background removal failed");
        assert_eq!(upstream_error_message(br#"{"code":1}"#), "Background removal failed");
    }
}
