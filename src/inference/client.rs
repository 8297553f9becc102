//! HTTP client for a llama.cpp server.
//!
//! One method per server operation. Each call builds its own request and
//! waits for it to finish; nothing is retried and no state is shared between
//! calls beyond the immutable [`ClientConfig`].

use std::time::Duration;

use reqwest::{Client as HttpClient, Response, StatusCode};

use super::config::ClientConfig;
use super::errors::InferenceError;
use super::streaming::{
    into_token_stream, parse_chat_response, parse_completion_response, TokenStream,
};
use super::types::{
    ChatCompletionRequest, ChatMessage, CompletionRequest, HealthResponse, ModelDescriptor,
    SamplingParams,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Bound on the liveness probe. The other operations use the configured
/// request timeout, which is unset by default.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const HEALTH_PATH: &str = "/health";
const CHAT_PATH: &str = "/v1/chat/completions";
const COMPLETION_PATH: &str = "/completion";
const MODELS_PATH: &str = "/v1/models";

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of a chat request.
pub enum ChatReply {
    /// Non-streaming: the first choice's message content.
    Complete(String),
    /// Streaming: fragments decoded lazily from the response body.
    Stream(TokenStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Complete(content) => f.debug_tuple("Complete").field(content).finish(),
            ChatReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// What a reachable server said about itself on `/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    /// Answered 200 but with some other status, e.g. `"loading model"`.
    NotReady { status: Option<String> },
}

// ─── LlamaClient ─────────────────────────────────────────────────────────────

/// Client for the inference server at `config.base_url`.
pub struct LlamaClient {
    http: HttpClient,
    config: ClientConfig,
}

impl LlamaClient {
    /// Build a client. Does not contact the server.
    pub fn new(config: ClientConfig) -> Result<Self, InferenceError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| InferenceError::ConfigError {
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ─── Health ──────────────────────────────────────────────────────────

    /// Query `GET /health`, keeping the failure kind.
    ///
    /// Unreachable servers come back as `ConnectionFailed`/`Timeout`, a
    /// non-200 status as `HttpError`, an unparsable body as `ResponseFormat`.
    pub async fn probe_health(&self) -> Result<HealthStatus, InferenceError> {
        let url = self.config.endpoint(HEALTH_PATH);

        let response = self
            .http
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_error(e, &url, Some(HEALTH_TIMEOUT)))?;

        let status = response.status();
        let body = read_body(response, &url, Some(HEALTH_TIMEOUT)).await?;
        if status != StatusCode::OK {
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        parse_health_response(&body)
    }

    /// `true` only when the server answered 200 with `{"status":"ok"}`.
    pub async fn health_check(&self) -> bool {
        match self.probe_health().await {
            Ok(HealthStatus::Ok) => true,
            Ok(HealthStatus::NotReady { status }) => {
                tracing::info!(status = ?status, "server is up but not ready");
                false
            }
            Err(e) if e.is_unreachable() => {
                tracing::warn!(error = %e, "server unreachable");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                false
            }
        }
    }

    // ─── Chat Completion ─────────────────────────────────────────────────

    /// Send a chat completion request for the whole message sequence.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
        stream: bool,
    ) -> Result<ChatReply, InferenceError> {
        if stream {
            self.chat_completion_stream(messages, sampling)
                .await
                .map(ChatReply::Stream)
        } else {
            self.chat_completion(messages, sampling)
                .await
                .map(ChatReply::Complete)
        }
    }

    /// Non-streaming chat: returns `choices[0].message.content`.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, InferenceError> {
        let response = self.send_chat(messages, sampling, false).await?;
        let url = response.url().to_string();
        let body = read_body(response, &url, self.config.request_timeout).await?;
        parse_chat_response(&body)
    }

    /// Streaming chat: returns the lazy fragment sequence over the body.
    pub async fn chat_completion_stream(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<TokenStream, InferenceError> {
        let response = self.send_chat(messages, sampling, true).await?;
        Ok(into_token_stream(Box::pin(response.bytes_stream())))
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
        stream: bool,
    ) -> Result<Response, InferenceError> {
        let url = self.config.endpoint(CHAT_PATH);
        let body = ChatCompletionRequest {
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            stream,
        };

        tracing::info!(
            url = %url,
            message_count = body.messages.len(),
            temperature = body.temperature,
            max_tokens = body.max_tokens,
            stream = body.stream,
            "chat request"
        );

        let mut request = self.http.post(&url).json(&body);
        if stream {
            request = request.header(reqwest::header::ACCEPT, "text/event-stream");
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, &url, self.config.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(response)
    }

    // ─── Raw Completion ──────────────────────────────────────────────────

    /// llama.cpp `POST /completion`. Returns the `content` field, or empty
    /// text when the body does not carry one.
    pub async fn completion(
        &self,
        prompt: &str,
        sampling: SamplingParams,
    ) -> Result<String, InferenceError> {
        let url = self.config.endpoint(COMPLETION_PATH);
        let body = CompletionRequest {
            prompt,
            temperature: sampling.temperature,
            n_predict: sampling.max_tokens,
        };

        tracing::info!(
            url = %url,
            prompt_len = prompt.len(),
            n_predict = body.n_predict,
            "completion request"
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, &url, self.config.request_timeout))?;

        let status = response.status();
        let body_text = read_body(response, &url, self.config.request_timeout).await?;
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %body_text,
                "completion returned an error status"
            );
        }

        Ok(parse_completion_response(&body_text))
    }

    // ─── Models ──────────────────────────────────────────────────────────

    /// Query `GET /v1/models`, keeping the failure kind.
    pub async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, InferenceError> {
        let url = self.config.endpoint(MODELS_PATH);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(e, &url, self.config.request_timeout))?;

        let status = response.status();
        let body = read_body(response, &url, self.config.request_timeout).await?;
        if !status.is_success() {
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        parse_model_list(&body)
    }

    /// Model descriptors, or an empty list on any failure.
    pub async fn list_models(&self) -> Vec<ModelDescriptor> {
        match self.fetch_models().await {
            Ok(models) => models,
            Err(e) if e.is_unreachable() => {
                tracing::warn!(error = %e, "server unreachable, no models listed");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "model listing failed");
                Vec::new()
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn transport_error(e: reqwest::Error, url: &str, timeout: Option<Duration>) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout {
            duration_secs: timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }
    } else {
        InferenceError::ConnectionFailed {
            endpoint: url.to_string(),
            reason: e.to_string(),
        }
    }
}

async fn read_body(
    response: Response,
    url: &str,
    timeout: Option<Duration>,
) -> Result<String, InferenceError> {
    response
        .text()
        .await
        .map_err(|e| transport_error(e, url, timeout))
}

fn parse_health_response(body: &str) -> Result<HealthStatus, InferenceError> {
    let health: HealthResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::ResponseFormat {
            reason: format!("failed to parse health response: {e}"),
        })?;

    match health.status.as_deref() {
        Some("ok") => Ok(HealthStatus::Ok),
        _ => Ok(HealthStatus::NotReady {
            status: health.status,
        }),
    }
}

/// Accept either a bare array or the OpenAI `{"object":"list","data":[...]}`
/// envelope that llama.cpp serves.
fn parse_model_list(body: &str) -> Result<Vec<ModelDescriptor>, InferenceError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| InferenceError::ResponseFormat {
            reason: format!("failed to parse model list: {e}"),
        })?;

    match value {
        serde_json::Value::Array(models) => Ok(models),
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(serde_json::Value::Array(models)) => Ok(models),
            _ => Err(InferenceError::ResponseFormat {
                reason: "model list has no data array".into(),
            }),
        },
        _ => Err(InferenceError::ResponseFormat {
            reason: "model list is neither an array nor an object".into(),
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_config() {
        let config = ClientConfig::new("http://127.0.0.1:9/")
            .with_request_timeout(Some(Duration::from_secs(30)));
        let client = LlamaClient::new(config).unwrap();
        assert_eq!(client.config().base_url, "http://127.0.0.1:9");
        assert_eq!(client.config().request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_health_ok() {
        assert_eq!(
            parse_health_response(r#"{"status":"ok"}"#).unwrap(),
            HealthStatus::Ok
        );
    }

    #[test]
    fn test_parse_health_not_ready() {
        assert_eq!(
            parse_health_response(r#"{"status":"loading model"}"#).unwrap(),
            HealthStatus::NotReady {
                status: Some("loading model".into())
            }
        );
        assert_eq!(
            parse_health_response("{}").unwrap(),
            HealthStatus::NotReady { status: None }
        );
    }

    #[test]
    fn test_parse_health_malformed() {
        let err = parse_health_response("OK").unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[test]
    fn test_parse_model_list_envelope() {
        let body = r#"{"object":"list","data":[{"id":"qwen2.5-7b.gguf","object":"model"}]}"#;
        let models = parse_model_list(body).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0]["id"], "qwen2.5-7b.gguf");
    }

    #[test]
    fn test_parse_model_list_bare_array() {
        let models = parse_model_list(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn test_parse_model_list_rejects_other_shapes() {
        assert!(parse_model_list(r#"{"object":"list"}"#).is_err());
        assert!(parse_model_list("42").is_err());
        assert!(parse_model_list("nope").is_err());
    }

    #[test]
    fn test_chat_reply_debug() {
        let reply = ChatReply::Complete("hi".into());
        assert_eq!(format!("{reply:?}"), r#"Complete("hi")"#);
    }
}
