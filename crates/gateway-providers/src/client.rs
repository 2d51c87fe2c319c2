//! OpenAI-compatible chat completion client.
//!
//! One [`ProviderClient`] is built per route step. It overrides `model`, strips
//! the field named by the step's conflict resolution, and POSTs the result to
//! `{base_url}/chat/completions`. No retries happen here; falling back to the
//! next step is the execution manager's job.

use crate::traits::ChatProvider;
use async_trait::async_trait;
use gateway_core::{
    ChatRequest, ChatResponse, ConflictResolution, GatewayError, GatewayResult, Provider,
    FALLBACK_TIMEOUT,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::debug;

/// Client for a single provider/model attempt
#[derive(Debug, Clone)]
pub struct ProviderClient {
    provider: Provider,
    model: String,
    timeout: Duration,
    conflict_resolution: ConflictResolution,
    http: Client,
}

impl ProviderClient {
    /// Create a client that sends `model` to `provider` over `http`
    #[must_use]
    pub fn new(provider: Provider, model: impl Into<String>, http: Client) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout: FALLBACK_TIMEOUT,
            conflict_resolution: ConflictResolution::None,
            http,
        }
    }

    /// Set the request deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the conflict resolution directive
    #[must_use]
    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict_resolution = resolution;
        self
    }

    /// Target model
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Chat completions URL for this provider
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.provider.base_url.trim_end_matches('/'))
    }

    /// The request as it will be sent upstream
    #[must_use]
    pub fn prepare(&self, request: &ChatRequest) -> ChatRequest {
        let mut outbound = request.clone();
        outbound.set_model(self.model.clone());
        outbound.apply_conflict_resolution(self.conflict_resolution);
        outbound
    }

    fn transport_error(&self, err: &reqwest::Error) -> GatewayError {
        let timed_out = err.is_timeout();
        let message = if timed_out {
            format!("request timed out after {:?}: {err}", self.timeout)
        } else {
            format!("request failed: {err}")
        };
        GatewayError::transport(&self.provider.name, message, timed_out)
    }
}

#[async_trait]
impl ChatProvider for ProviderClient {
    async fn call(&self, request: &ChatRequest) -> GatewayResult<ChatResponse> {
        let body = self.prepare(request).to_vec()?;
        let url = self.endpoint();

        debug!(
            provider = %self.provider.name,
            model = %self.model,
            url = %url,
            timeout_ms = self.timeout.as_millis() as u64,
            conflict_resolution = %self.conflict_resolution,
            "Sending request to provider"
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.provider.api_key.expose_secret()),
            )
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(GatewayError::UpstreamStatus {
                provider: self.provider.name.clone(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        ChatResponse::from_slice(&bytes)
    }

    fn name(&self) -> &str {
        &self.provider.name
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(model: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "ok"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        })
    }

    fn request() -> ChatRequest {
        ChatRequest::from_value(json!({
            "model": "client-model",
            "messages": [{"role": "user", "content": "hi"}],
            "tools": [{"type": "function", "function": {"name": "f"}}],
            "response_format": {"type": "json_object"},
            "x_vendor": {"keep": true}
        }))
        .expect("request")
    }

    fn client(base_url: &str) -> ProviderClient {
        ProviderClient::new(Provider::new("p1", "sk-test", base_url), "gpt-4o", Client::new())
    }

    async fn received_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        serde_json::from_slice(&requests[0].body).expect("json body")
    }

    #[tokio::test]
    async fn test_call_overrides_model_and_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("gpt-4o")))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/v1", server.uri());
        let response = client(&base).call(&request()).await.expect("call");
        assert_eq!(response.id(), "chatcmpl-test");

        let sent = received_body(&server).await;
        assert_eq!(sent["model"], "gpt-4o");
        assert_eq!(sent["x_vendor"], json!({"keep": true}));
        assert!(sent.get("tools").is_some());
        assert!(sent.get("response_format").is_some());
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("gpt-4o")))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/v1/", server.uri());
        assert!(client(&base).call(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_conflict_resolution_applies_to_copy_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("gpt-4o")))
            .mount(&server)
            .await;

        let original = request();
        let client = client(&server.uri())
            .with_conflict_resolution(ConflictResolution::RemoveResponseFormat);
        client.call(&original).await.expect("call");

        let sent = received_body(&server).await;
        assert!(sent.get("tools").is_some());
        assert!(sent.get("response_format").is_none());

        assert_eq!(original.model(), "client-model");
        assert!(original.contains_field("response_format"));
    }

    #[tokio::test]
    async fn test_response_passes_through_verbatim() {
        let body = r#"{"id":"x","object":"chat.completion","choices":[],"vendor":{"b":2,"a":1}}"#;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let response = client(&server.uri()).call(&request()).await.expect("call");
        assert_eq!(response.as_str(), body);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).call(&request()).await.expect_err("503");
        match err {
            GatewayError::UpstreamStatus { provider, status, body } => {
                assert_eq!(provider, "p1");
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).call(&request()).await.expect_err("parse");
        assert!(matches!(err, GatewayError::Parse { target: "response", .. }));
    }

    #[tokio::test]
    async fn test_null_summary_fields_still_succeed() {
        let server = MockServer::start().await;
        let body = r#"{"id":null,"object":"chat.completion","created":null,"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":null,"total_tokens":null}}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let response = client(&server.uri()).call(&request()).await.expect("success");
        assert_eq!(response.id(), "");
        assert_eq!(response.usage().map(|u| u.prompt_tokens), Some(1));
        assert_eq!(response.as_str(), body);
    }

    #[tokio::test]
    async fn test_timeout_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("gpt-4o"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .with_timeout(Duration::from_millis(50))
            .call(&request())
            .await
            .expect_err("timeout");

        assert!(matches!(err, GatewayError::Transport { timed_out: true, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let err = client("http://127.0.0.1:1")
            .call(&request())
            .await
            .expect_err("refused");
        assert!(matches!(err, GatewayError::Transport { timed_out: false, .. }));
    }

    #[test]
    fn test_availability_and_endpoint() {
        let c = client("http://localhost:9999/v1/");
        assert!(c.is_available());
        assert_eq!(c.name(), "p1");
        assert_eq!(c.endpoint(), "http://localhost:9999/v1/chat/completions");
        assert_eq!(c.timeout(), FALLBACK_TIMEOUT);

        let unconfigured =
            ProviderClient::new(Provider::new("p2", "", "http://x"), "m", Client::new());
        assert!(!unconfigured.is_available());
    }
}
