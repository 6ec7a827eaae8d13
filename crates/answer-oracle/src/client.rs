use std::sync::Arc;

use async_trait::async_trait;
use easyapply_core_types::AnswerItem;
use tracing::{debug, instrument, warn};

use crate::errors::OracleError;
use crate::model::OracleConfig;
use crate::normalize::{fallback_answer, normalize_choice};
use crate::parse::{parse_answer_array, sanitize};
use crate::prompt::PromptBuilder;
use crate::transport::{ChatCompletionTransport, CompletionPort};

/// Source of values for form questions.
///
/// Both calls are infallible: when the backing service fails the caller still receives
/// a deterministic answer for every item.
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    async fn ask(&self, item: &AnswerItem) -> String;

    /// One answer per item, in the same order.
    async fn ask_batch(&self, items: &[AnswerItem]) -> Vec<String>;
}

/// Oracle backed by a chat-completion endpoint.
pub struct ChatAnswerOracle {
    port: Option<Arc<dyn CompletionPort>>,
    prompt: PromptBuilder,
}

impl ChatAnswerOracle {
    pub fn new(port: Arc<dyn CompletionPort>, prompt: PromptBuilder) -> Self {
        Self {
            port: Some(port),
            prompt,
        }
    }

    /// Oracle with no service behind it: every answer is the fallback.
    pub fn unconfigured(prompt: PromptBuilder) -> Self {
        Self { port: None, prompt }
    }

    /// Builds the HTTP transport when the config carries a key, otherwise falls back.
    pub fn from_config(config: OracleConfig, prompt: PromptBuilder) -> Self {
        match ChatCompletionTransport::new(config) {
            Ok(transport) => Self::new(Arc::new(transport), prompt),
            Err(OracleError::Unconfigured) => {
                warn!("no oracle API key configured; answers will use the fallback policy");
                Self::unconfigured(prompt)
            }
            Err(err) => {
                warn!(error = %err, "oracle transport unavailable; answers will use the fallback policy");
                Self::unconfigured(prompt)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.port.is_some()
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    fn finalize(item: &AnswerItem, raw: Option<&str>) -> String {
        let answer = raw.map(sanitize).unwrap_or_default();
        if answer.is_empty() {
            return fallback_answer(&item.choices);
        }
        if item.choices.is_empty() {
            answer
        } else {
            normalize_choice(&answer, &item.choices)
        }
    }
}

#[async_trait]
impl AnswerOracle for ChatAnswerOracle {
    #[instrument(skip_all, fields(question = %item.question, kind = %item.kind))]
    async fn ask(&self, item: &AnswerItem) -> String {
        let Some(port) = self.port.as_ref() else {
            return fallback_answer(&item.choices);
        };
        let system = self.prompt.system_prompt(false);
        let user = self.prompt.single_prompt(item);
        match port.complete(&system, &user).await {
            Ok(raw) => Self::finalize(item, Some(&raw)),
            Err(err) => {
                warn!(error = %err, "oracle call failed; using fallback answer");
                fallback_answer(&item.choices)
            }
        }
    }

    #[instrument(skip_all, fields(items = items.len()))]
    async fn ask_batch(&self, items: &[AnswerItem]) -> Vec<String> {
        if items.is_empty() {
            return Vec::new();
        }
        let Some(port) = self.port.as_ref() else {
            return items
                .iter()
                .map(|item| fallback_answer(&item.choices))
                .collect();
        };

        let system = self.prompt.system_prompt(true);
        let user = self.prompt.batch_prompt(items);
        let answers = match port.complete(&system, &user).await {
            Ok(raw) => match parse_answer_array(&sanitize(&raw)) {
                Ok(answers) => {
                    if answers.len() != items.len() {
                        debug!(
                            expected = items.len(),
                            received = answers.len(),
                            "oracle answer count mismatch; padding with fallbacks"
                        );
                    }
                    answers
                }
                Err(failure) => {
                    warn!(reason = %failure, "oracle batch output unusable; using fallbacks");
                    Vec::new()
                }
            },
            Err(err) => {
                warn!(error = %err, "oracle batch call failed; using fallbacks");
                Vec::new()
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::finalize(item, answers.get(index).map(String::as_str)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyapply_core_types::ValueKind;
    use std::sync::Mutex;

    struct ScriptedPort {
        reply: Result<String, OracleError>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedPort {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: OracleError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionPort for ScriptedPort {
        async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.reply.clone()
        }
    }

    fn items() -> Vec<AnswerItem> {
        vec![
            AnswerItem::new("Years of experience", ValueKind::Number),
            AnswerItem::new("Willing to relocate?", ValueKind::Radio)
                .with_choices(vec!["No".into(), "Yes".into()]),
            AnswerItem::new("Portfolio", ValueKind::Url),
        ]
    }

    #[tokio::test]
    async fn batch_answers_are_normalized_in_order() {
        let port = ScriptedPort::replying(r#"["4", "yes please", "https://me.dev"]"#);
        let oracle = ChatAnswerOracle::new(port.clone(), PromptBuilder::new());
        let answers = oracle.ask_batch(&items()).await;
        assert_eq!(answers, vec!["4", "Yes", "https://me.dev"]);

        let prompts = port.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Return JSON only."));
    }

    #[tokio::test]
    async fn short_batch_is_padded_with_fallbacks() {
        let port = ScriptedPort::replying(r#"["7"]"#);
        let oracle = ChatAnswerOracle::new(port, PromptBuilder::new());
        let answers = oracle.ask_batch(&items()).await;
        assert_eq!(answers, vec!["7", "Yes", "NA"]);
    }

    #[tokio::test]
    async fn malformed_output_falls_back_per_item() {
        for reply in ["I cannot help with that", "[broken", "{\"a\": 1}", ""] {
            let oracle = ChatAnswerOracle::new(ScriptedPort::replying(reply), PromptBuilder::new());
            let answers = oracle.ask_batch(&items()).await;
            assert_eq!(answers, vec!["NA", "Yes", "NA"], "reply {reply:?}");
        }
    }

    #[tokio::test]
    async fn transport_failure_falls_back_per_item() {
        let port = ScriptedPort::failing(OracleError::Transport("connection refused".into()));
        let oracle = ChatAnswerOracle::new(port, PromptBuilder::new());
        let answers = oracle.ask_batch(&items()).await;
        assert_eq!(answers.len(), 3);
        assert_eq!(answers, vec!["NA", "Yes", "NA"]);
    }

    #[tokio::test]
    async fn unconfigured_oracle_never_calls_out() {
        let oracle = ChatAnswerOracle::unconfigured(PromptBuilder::new());
        assert!(!oracle.is_configured());
        assert!(oracle.ask_batch(&[]).await.is_empty());
        let choice = AnswerItem::new("Shift", ValueKind::Select)
            .with_choices(vec!["Day".into(), "Night".into()]);
        assert_eq!(oracle.ask(&choice).await, "Day");
    }

    #[tokio::test]
    async fn single_answer_is_sanitized_and_constrained() {
        let port = ScriptedPort::replying("<|channel|>final<|message|>\"night\"");
        let oracle = ChatAnswerOracle::new(port.clone(), PromptBuilder::new());
        let item = AnswerItem::new("Shift", ValueKind::Select)
            .with_choices(vec!["Day".into(), "Night".into()]);
        // "final" prefix survives sanitizing, so containment decides.
        assert_eq!(oracle.ask(&item).await, "Night");

        let free = AnswerItem::new("City", ValueKind::Text);
        let oracle = ChatAnswerOracle::new(ScriptedPort::replying("  Pune \n"), PromptBuilder::new());
        assert_eq!(oracle.ask(&free).await, "Pune");
    }

    #[tokio::test]
    async fn choice_answers_stay_within_choices_for_any_reply() {
        let choices = vec!["Immediate".to_string(), "15 days".into(), "30 days".into()];
        let item = AnswerItem::new("Notice period", ValueKind::Select).with_choices(choices.clone());
        for reply in ["[\"2 months\"]", "[42]", "[null]", "nonsense", "[\"15\"]"] {
            let oracle = ChatAnswerOracle::new(ScriptedPort::replying(reply), PromptBuilder::new());
            let answers = oracle.ask_batch(std::slice::from_ref(&item)).await;
            assert_eq!(answers.len(), 1);
            assert!(choices.contains(&answers[0]), "{reply:?} -> {:?}", answers[0]);
        }
    }
}
