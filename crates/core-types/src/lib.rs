use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Opaque handle to one interactive control, minted by a dialog driver.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub String);

impl ControlId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ControlId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one application attempt in logs and reports.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unicode case-insensitive equality, used wherever labels and answers are compared.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Semantic kind of value a form control expects.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    PositiveNumber,
    Email,
    Phone,
    Url,
    Select,
    Radio,
    CheckboxGroup,
    File,
}

impl ValueKind {
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::PositiveNumber => "positive_number",
            ValueKind::Email => "email",
            ValueKind::Phone => "phone",
            ValueKind::Url => "url",
            ValueKind::Select => "select",
            ValueKind::Radio => "radio",
            ValueKind::CheckboxGroup => "checkbox",
            ValueKind::File => "file",
        }
    }

    /// Kinds whose answer is typed as free text.
    pub fn is_free_text(self) -> bool {
        matches!(
            self,
            ValueKind::Text
                | ValueKind::Number
                | ValueKind::PositiveNumber
                | ValueKind::Email
                | ValueKind::Phone
                | ValueKind::Url
        )
    }
}

impl Default for ValueKind {
    fn default() -> Self {
        ValueKind::Text
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown value kind: {0}")]
pub struct UnknownValueKind(pub String);

impl FromStr for ValueKind {
    type Err = UnknownValueKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "textarea" => Ok(ValueKind::Text),
            "number" => Ok(ValueKind::Number),
            "positive_number" => Ok(ValueKind::PositiveNumber),
            "email" => Ok(ValueKind::Email),
            "phone" | "tel" => Ok(ValueKind::Phone),
            "url" => Ok(ValueKind::Url),
            "select" => Ok(ValueKind::Select),
            "radio" => Ok(ValueKind::Radio),
            "checkbox" | "checkbox_group" => Ok(ValueKind::CheckboxGroup),
            "file" => Ok(ValueKind::File),
            other => Err(UnknownValueKind(other.to_string())),
        }
    }
}

/// One question sent to the answer oracle.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnswerItem {
    pub question: String,
    pub kind: ValueKind,
    pub choices: Vec<String>,
}

impl AnswerItem {
    pub fn new(question: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            question: question.into(),
            kind,
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }
}
