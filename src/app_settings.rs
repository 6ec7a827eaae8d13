use std::path::PathBuf;
use std::time::Duration;

use answer_oracle::{OracleConfig, OracleProvider};
use apply_flow::FlowPolicy;
use dialog_driver::{BrowserOptions, SelectorSet};
use serde::{Deserialize, Serialize};

/// Application configuration, read from YAML.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub oracle: OracleSettings,
    /// Flat JSON object of profile fields; missing file means an empty profile.
    pub profile_path: Option<PathBuf>,
    pub browser: BrowserOptions,
    pub selectors: SelectorSet,
    pub flow: FlowPolicy,
    pub batch: BatchSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OracleSettings {
    /// Provider used for keys given in this file. Environment keys pick their own provider.
    pub provider: OracleProvider,
    pub api_keys: Vec<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub site_url: Option<String>,
    pub site_title: Option<String>,
    /// Persona text prefixed to every system prompt.
    pub user_context: Option<String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: OracleProvider::OpenRouter,
            api_keys: Vec::new(),
            api_base: None,
            model: None,
            temperature: 0.1,
            timeout_secs: 30,
            site_url: None,
            site_title: None,
            user_context: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BatchSettings {
    /// Upper bound of the random pause between two jobs.
    pub jitter_ms: u64,
    pub report_path: Option<PathBuf>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            jitter_ms: 700,
            report_path: None,
        }
    }
}

impl BatchSettings {
    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl OracleSettings {
    /// Resolves transport settings from the process environment and this section.
    pub fn resolve(&self) -> Option<OracleConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// OpenRouter keys from the environment win, then OpenAI keys, then keys from the file.
    /// `None` when no key is available anywhere.
    pub fn resolve_with<F>(&self, lookup: F) -> Option<OracleConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (provider, keys, prefix) = {
            let openrouter = split_keys(env_value("OPENROUTER_API_KEY"));
            let openai = split_keys(env_value("OPENAI_API_KEY"));
            if !openrouter.is_empty() {
                (OracleProvider::OpenRouter, openrouter, Some("OPENROUTER"))
            } else if !openai.is_empty() {
                (OracleProvider::OpenAi, openai, Some("OPENAI"))
            } else {
                let keys: Vec<String> = self
                    .api_keys
                    .iter()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
                    .collect();
                if keys.is_empty() {
                    return None;
                }
                (self.provider, keys, None)
            }
        };

        let from_env = |suffix: &str| prefix.and_then(|p| env_value(&format!("{p}_{suffix}")));
        let same_provider = provider == self.provider;

        let mut config = OracleConfig::new(provider, keys)
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)));
        config.temperature = self.temperature;
        if let Some(base) = from_env("BASE_URL")
            .or_else(|| self.api_base.clone().filter(|_| same_provider))
        {
            config = config.with_api_base(base);
        }
        if let Some(model) =
            from_env("MODEL").or_else(|| self.model.clone().filter(|_| same_provider))
        {
            config = config.with_model(model);
        }
        if provider == OracleProvider::OpenRouter {
            config.site_url = env_value("OPENROUTER_SITE_URL").or_else(|| self.site_url.clone());
            config.site_title =
                env_value("OPENROUTER_SITE_TITLE").or_else(|| self.site_title.clone());
        }
        Some(config)
    }
}

/// Comma-separated keys, so several can be rotated on rate limits.
fn split_keys(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.flow.repair_attempts, 3);
        assert_eq!(config.flow.step_limit, 25);
        assert_eq!(config.batch.jitter_ms, 700);
        assert!((config.oracle.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "flow:\n  repair_attempts: 5\nbatch:\n  jitter_ms: 0\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.flow.repair_attempts, 5);
        assert_eq!(config.flow.settle_delay_ms, 500);
        assert_eq!(config.batch.jitter_ms, 0);
        assert!(!config.browser.headless);
    }

    #[test]
    fn no_keys_means_unconfigured() {
        assert!(OracleSettings::default().resolve_with(env(&[])).is_none());
        assert!(OracleSettings::default()
            .resolve_with(env(&[("OPENAI_API_KEY", "  ")]))
            .is_none());
    }

    #[test]
    fn openrouter_environment_is_preferred() {
        let resolved = OracleSettings::default()
            .resolve_with(env(&[
                ("OPENROUTER_API_KEY", "k1, k2"),
                ("OPENROUTER_MODEL", "vendor/model"),
                ("OPENROUTER_SITE_TITLE", "EasyApply"),
                ("OPENAI_API_KEY", "sk-openai"),
            ]))
            .unwrap();
        assert_eq!(resolved.provider, OracleProvider::OpenRouter);
        assert_eq!(resolved.api_keys, vec!["k1".to_string(), "k2".to_string()]);
        assert_eq!(resolved.model, "vendor/model");
        assert_eq!(resolved.site_title.as_deref(), Some("EasyApply"));
    }

    #[test]
    fn openai_environment_uses_its_own_defaults() {
        let settings = OracleSettings {
            model: Some("vendor/model".into()),
            ..OracleSettings::default()
        };
        let resolved = settings
            .resolve_with(env(&[("OPENAI_API_KEY", "sk-openai")]))
            .unwrap();
        assert_eq!(resolved.provider, OracleProvider::OpenAi);
        assert_eq!(resolved.model, OracleProvider::OpenAi.default_model());
        assert_eq!(resolved.api_base, OracleProvider::OpenAi.default_base_url());
        assert!(resolved.site_url.is_none());
    }

    #[test]
    fn file_keys_are_used_without_environment() {
        let settings = OracleSettings {
            provider: OracleProvider::OpenAi,
            api_keys: vec!["sk-file".into(), "".into()],
            api_base: Some("http://localhost:8080/v1".into()),
            ..OracleSettings::default()
        };
        let resolved = settings.resolve_with(env(&[])).unwrap();
        assert_eq!(resolved.provider, OracleProvider::OpenAi);
        assert_eq!(resolved.api_keys, vec!["sk-file".to_string()]);
        assert_eq!(resolved.api_base, "http://localhost:8080/v1");
    }
}
