use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::types::{DocumentImage, VisionClient};
use super::ExtractionError;
use crate::config::AppConfig;

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Gemini `generateContent` client.
///
/// One blocking call per document, no streaming and no retry. The timeout is
/// explicit so a stalled upstream cannot hold a worker indefinitely.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ExtractionError> {
        Self::new(
            &config.api_base_url,
            &config.api_key,
            &config.model,
            config.request_timeout_secs,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    /// 0.0 for deterministic document extraction.
    temperature: f32,
}

/// Response body from `generateContent`. Only the text parts are used.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn build_request<'a>(prompt: &'a str, image: &DocumentImage) -> GenerateContentRequest<'a> {
    let data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text { text: prompt },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.format.mime_type(),
                        data,
                    },
                },
            ],
        }],
        generation_config: GenerationConfig { temperature: 0.0 },
    }
}

/// Concatenate the text parts of the first candidate.
///
/// No candidates (for example a safety block) yields an empty reply, which the
/// parser then reports as unstructured.
fn reply_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Prefer the API's own message over the raw envelope; cap the length.
fn provider_error_message(body: &str) -> String {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    if message.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}…")
    } else {
        message
    }
}

impl VisionClient for GeminiClient {
    fn generate_with_image(
        &self,
        prompt: &str,
        image: &DocumentImage,
    ) -> Result<String, ExtractionError> {
        let url = self.endpoint();
        let body = build_request(prompt, image);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractionError::Timeout(self.timeout_secs)
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::ProviderError {
                status: status.as_u16(),
                body: provider_error_message(&body),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| ExtractionError::ResponseParsing(e.to_string()))?;

        Ok(reply_text(parsed))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// What a [`MockVisionClient`] answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    ProviderError { status: u16, body: String },
    Timeout(u64),
}

/// Mock vision client for testing: returns a configurable reply and counts calls.
pub struct MockVisionClient {
    reply: MockReply,
    model: String,
    calls: AtomicUsize,
}

impl MockVisionClient {
    pub fn new(response: &str) -> Self {
        Self::with_reply(MockReply::Text(response.to_string()))
    }

    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            model: "gemini-mock".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionClient for MockVisionClient {
    fn generate_with_image(
        &self,
        _prompt: &str,
        _image: &DocumentImage,
    ) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::ProviderError { status, body } => Err(ExtractionError::ProviderError {
                status: *status,
                body: body.clone(),
            }),
            MockReply::Timeout(secs) => Err(ExtractionError::Timeout(*secs)),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::types::ImageFormat;

    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    fn sample_image() -> DocumentImage {
        DocumentImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
            format: ImageFormat::Jpeg,
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeminiClient::new("http://localhost:9000/v1beta/", "k", "gemini-x", 30).unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/v1beta");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/v1beta",
            "k",
            "gemini-flash-latest",
            60,
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-flash-latest");
    }

    #[test]
    fn request_carries_prompt_then_inline_image() {
        let request = build_request("extract please", &sample_image());
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "extract please");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(
            parts[1]["inlineData"]["data"],
            base64::engine::general_purpose::STANDARD.encode(sample_image().bytes)
        );
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn reply_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
              "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Here: "}, {"text": "{\"a\":1}"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
              ],
              "usageMetadata": {"totalTokenCount": 12}
            }"#,
        )
        .unwrap();
        assert_eq!(reply_text(response), "Here: {\"a\":1}");
    }

    #[test]
    fn reply_without_candidates_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_eq!(reply_text(response), "");
    }

    #[test]
    fn candidate_without_content_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(reply_text(response), "");
    }

    #[test]
    fn provider_error_prefers_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            provider_error_message(body),
            "API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn provider_error_falls_back_to_raw_body() {
        assert_eq!(provider_error_message("  upstream exploded \n"), "upstream exploded");
    }

    #[test]
    fn provider_error_is_truncated() {
        let long = "x".repeat(2_000);
        let message = provider_error_message(&long);
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockVisionClient::new("test response");
        let result = client.generate_with_image("prompt", &sample_image()).unwrap();
        assert_eq!(result, "test response");
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn mock_client_returns_configured_error() {
        let client = MockVisionClient::with_reply(MockReply::ProviderError {
            status: 429,
            body: "Quota exceeded".into(),
        });
        let err = client.generate_with_image("prompt", &sample_image()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Model API returned error (status 429): Quota exceeded"
        );
    }

    const STUB_KEY: &str = "stub-key";

    /// Minimal `generateContent` stand-in. Echoes the call path and the image
    /// MIME type so the request shape can be checked from the reply.
    async fn stub_generate(
        Path(call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
        if key != Some(STUB_KEY) {
            return (
                StatusCode::FORBIDDEN,
                r#"{"error": {"code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED"}}"#.into(),
            );
        }

        match call.split(':').next() {
            Some("missing-model") => (
                StatusCode::BAD_REQUEST,
                r#"{"error": {"code": 400, "message": "models/missing-model is not found", "status": "INVALID_ARGUMENT"}}"#.into(),
            ),
            Some("html-model") => (StatusCode::OK, "<html>gateway page</html>".into()),
            _ => {
                let parts = &body["contents"][0]["parts"];
                let mime = parts[1]["inlineData"]["mimeType"].as_str().unwrap_or("none");
                let reply = serde_json::json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{"text": format!("{call} ")}, {"text": mime}]
                        }
                    }]
                });
                (StatusCode::OK, reply.to_string())
            }
        }
    }

    async fn start_stub() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/models/:call", post(stub_generate));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Build and call the blocking client off the async runtime.
    async fn call_blocking(
        base_url: String,
        api_key: &'static str,
        model: &'static str,
    ) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || {
            let client = GeminiClient::new(&base_url, api_key, model, 5)?;
            client.generate_with_image("extract", &sample_image())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn live_call_joins_reply_parts() {
        let base = start_stub().await;
        let reply = call_blocking(base, STUB_KEY, "gemini-test").await.unwrap();
        assert_eq!(reply, "gemini-test:generateContent image/jpeg");
    }

    #[tokio::test]
    async fn live_call_maps_error_envelope() {
        let base = start_stub().await;
        let err = call_blocking(base, STUB_KEY, "missing-model").await.unwrap_err();
        match err {
            ExtractionError::ProviderError { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "models/missing-model is not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn live_call_sends_api_key_header() {
        let base = start_stub().await;
        let err = call_blocking(base, "wrong-key", "gemini-test").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::ProviderError { status: 403, ref body } if body == "API key not valid."
        ));
    }

    #[tokio::test]
    async fn live_call_reports_undecodable_envelope() {
        let base = start_stub().await;
        let err = call_blocking(base, STUB_KEY, "html-model").await.unwrap_err();
        assert!(matches!(err, ExtractionError::ResponseParsing(_)));
    }

    #[tokio::test]
    async fn closed_port_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = call_blocking(base.clone(), STUB_KEY, "gemini-test").await.unwrap_err();
        match err {
            ExtractionError::Connection(url) => assert_eq!(url, base),
            other => panic!("unexpected {other:?}"),
        }
    }
}
