use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::OracleError;
use crate::model::{OracleConfig, OracleProvider};

/// Raw chat-completion call: one system prompt, one user prompt, free text back.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError>;
}

/// OpenAI-compatible `/chat/completions` transport (OpenAI, OpenRouter, proxies).
pub struct ChatCompletionTransport {
    client: Client,
    config: OracleConfig,
}

impl ChatCompletionTransport {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if !config.is_configured() {
            return Err(OracleError::Unconfigured);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| OracleError::Client(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn request(&self, key: &str, body: &ChatCompletionRequest) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(key)
            .json(body);
        if self.config.provider == OracleProvider::OpenRouter {
            if let Some(site_url) = self.config.site_url.as_deref().filter(|v| !v.is_empty()) {
                request = request.header("HTTP-Referer", site_url);
            }
            if let Some(title) = self.config.site_title.as_deref().filter(|v| !v.is_empty()) {
                request = request.header("X-Title", title);
            }
        }
        request
    }
}

#[async_trait]
impl CompletionPort for ChatCompletionTransport {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let keys: Vec<&String> = self
            .config
            .api_keys
            .iter()
            .filter(|key| !key.trim().is_empty())
            .collect();

        let mut last_error: Option<OracleError> = None;
        for (index, key) in keys.iter().enumerate() {
            let response = match self.request(key, &body).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(OracleError::Transport(err.to_string()));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 && index + 1 < keys.len() {
                    let friendly = rate_limit_message(&text);
                    warn!(
                        target: "oracle",
                        message = %friendly,
                        attempt = index + 1,
                        remaining = keys.len() - index - 1,
                        "Oracle rate limited request; switching API key"
                    );
                    last_error = Some(OracleError::RateLimited(friendly));
                    continue;
                }
                if status.as_u16() == 429 {
                    return Err(OracleError::RateLimited(rate_limit_message(&text)));
                }
                return Err(OracleError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| OracleError::InvalidResponse(err.to_string()))?;

            return response
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_ref())
                .and_then(ChatCompletionContent::as_text)
                .ok_or(OracleError::MissingContent);
        }

        Err(last_error.unwrap_or(OracleError::Unconfigured))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<ChatCompletionContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_ref())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

fn rate_limit_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return format!("rate limit exceeded: {}", message.trim());
        }
    }
    "rate limit exceeded; retry later or reduce usage".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, keys: &[&str]) -> OracleConfig {
        OracleConfig::new(
            OracleProvider::OpenAi,
            keys.iter().map(|k| k.to_string()).collect(),
        )
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model("test-model")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn refuses_to_build_without_keys() {
        let config = OracleConfig::new(OracleProvider::OpenAi, Vec::new());
        assert!(matches!(
            ChatCompletionTransport::new(config),
            Err(OracleError::Unconfigured)
        ));
    }

    #[tokio::test]
    async fn returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("[\"3\"]")))
            .mount(&server)
            .await;

        let transport = ChatCompletionTransport::new(config_for(&server, &["key-1"])).unwrap();
        let content = transport.complete("system", "user").await.unwrap();
        assert_eq!(content, "[\"3\"]");
    }

    #[tokio::test]
    async fn joins_content_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": [{ "type": "text", "text": "[\"a\"," }, { "type": "text", "text": "\"b\"]" }] } }]
            })))
            .mount(&server)
            .await;

        let transport = ChatCompletionTransport::new(config_for(&server, &["k"])).unwrap();
        let content = transport.complete("s", "u").await.unwrap();
        assert_eq!(content, "[\"a\",\n\"b\"]");
    }

    #[tokio::test]
    async fn rotates_keys_on_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer first"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "slow down" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer second"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Yes")))
            .mount(&server)
            .await;

        let transport =
            ChatCompletionTransport::new(config_for(&server, &["first", "second"])).unwrap();
        assert_eq!(transport.complete("s", "u").await.unwrap(), "Yes");
    }

    #[tokio::test]
    async fn surfaces_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = ChatCompletionTransport::new(config_for(&server, &["k"])).unwrap();
        match transport.complete("s", "u").await {
            Err(OracleError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sends_openrouter_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("HTTP-Referer", "https://example.dev"))
            .and(header_exists("X-Title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let mut config = OracleConfig::new(OracleProvider::OpenRouter, vec!["k".into()])
            .with_api_base(server.uri());
        config.site_url = Some("https://example.dev".into());
        config.site_title = Some("EasyApply".into());
        let transport = ChatCompletionTransport::new(config).unwrap();
        assert_eq!(transport.complete("s", "u").await.unwrap(), "ok");
    }
}
