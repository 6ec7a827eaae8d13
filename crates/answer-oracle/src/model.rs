use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_MODEL: &str = "openai/gpt-oss-120b:free";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    OpenRouter,
    OpenAi,
}

impl OracleProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            OracleProvider::OpenRouter => OPENROUTER_BASE_URL,
            OracleProvider::OpenAi => OPENAI_BASE_URL,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            OracleProvider::OpenRouter => OPENROUTER_MODEL,
            OracleProvider::OpenAi => OPENAI_MODEL,
        }
    }
}

/// Resolved transport settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    pub api_keys: Vec<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    /// Sent as `HTTP-Referer` when talking to OpenRouter.
    pub site_url: Option<String>,
    /// Sent as `X-Title` when talking to OpenRouter.
    pub site_title: Option<String>,
}

impl OracleConfig {
    pub fn new(provider: OracleProvider, api_keys: Vec<String>) -> Self {
        Self {
            provider,
            api_keys,
            api_base: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(30),
            site_url: None,
            site_title: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_keys.iter().any(|key| !key.trim().is_empty())
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}
