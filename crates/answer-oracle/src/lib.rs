//! Answer oracle for application form questions.
//!
//! Sends one or many `(question, kind, choices)` items to an OpenAI-compatible
//! chat-completion endpoint and always hands back one normalized answer per item,
//! substituting a deterministic fallback whenever the service is unavailable or
//! its output is unusable.

pub mod client;
pub mod errors;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod profile;
pub mod prompt;
pub mod transport;

pub use client::{AnswerOracle, ChatAnswerOracle};
pub use easyapply_core_types::{AnswerItem, ValueKind};
pub use errors::{OracleError, ProfileError};
pub use model::{OracleConfig, OracleProvider};
pub use normalize::{fallback_answer, normalize_choice, FALLBACK_SENTINEL};
pub use parse::{parse_answer_array, sanitize, ParseFailure};
pub use profile::ProfileRecord;
pub use prompt::PromptBuilder;
pub use transport::{ChatCompletionTransport, CompletionPort};
