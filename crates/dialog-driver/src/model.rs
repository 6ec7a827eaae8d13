use std::fmt;

use easyapply_core_types::{eq_ignore_case, ControlId};
use serde::{Deserialize, Serialize};

/// What a lookup is for. Drivers map each intent onto their own selector syntax.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorIntent {
    Dialog,
    ApplyButton,
    ErrorIndicators,
    Labels,
    SubmitButton,
    AdvanceButtons,
    DismissButton,
}

impl SelectorIntent {
    pub fn label(self) -> &'static str {
        match self {
            SelectorIntent::Dialog => "dialog",
            SelectorIntent::ApplyButton => "apply_button",
            SelectorIntent::ErrorIndicators => "error_indicators",
            SelectorIntent::Labels => "labels",
            SelectorIntent::SubmitButton => "submit_button",
            SelectorIntent::AdvanceButtons => "advance_buttons",
            SelectorIntent::DismissButton => "dismiss_button",
        }
    }

    /// Intents resolved inside the open dialog rather than the whole page.
    pub fn is_dialog_scoped(self) -> bool {
        !matches!(self, SelectorIntent::Dialog | SelectorIntent::ApplyButton)
    }
}

impl fmt::Display for SelectorIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlTag {
    Input,
    TextArea,
    Select,
    Button,
    #[default]
    Other,
}

/// Group marker of the element (or its nearest grouping ancestor).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    #[default]
    None,
    RadioGroup,
    CheckboxGroup,
}

/// Observable attributes of one control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInfo {
    pub id: ControlId,
    pub tag: ControlTag,
    /// Lowercased `type` attribute for inputs.
    pub input_type: Option<String>,
    /// Associated label text (own label, legend or aria label).
    pub label: String,
    pub group: GroupKind,
    pub name: Option<String>,
    pub enabled: bool,
    pub visible: bool,
}

impl ControlInfo {
    pub fn is_input_type(&self, ty: &str) -> bool {
        self.input_type
            .as_deref()
            .is_some_and(|value| eq_ignore_case(value, ty))
    }

    pub fn is_actionable(&self) -> bool {
        self.enabled && self.visible
    }
}

/// One selectable option of a select, radio group or checkbox group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub control: ControlId,
    pub label: String,
    pub value: String,
    pub selected: bool,
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitCondition {
    Present(SelectorIntent),
    Absent(SelectorIntent),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present(intent) => write!(f, "{intent} present"),
            WaitCondition::Absent(intent) => write!(f, "{intent} absent"),
        }
    }
}

/// CSS selectors per intent for DOM-backed drivers.
///
/// Defaults are generic ARIA patterns; real sites need their own values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub dialog: String,
    pub apply_button: String,
    pub error_indicators: String,
    pub labels: String,
    pub submit_button: String,
    pub advance_buttons: String,
    pub dismiss_button: String,
    /// Enclosing field container used when an error has no explicit linkage.
    pub field_container: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            dialog: r#"[role="dialog"]"#.into(),
            apply_button: r#"button[aria-label*="apply" i]"#.into(),
            error_indicators: r#"[role="alert"]"#.into(),
            labels: "label".into(),
            submit_button: r#"button[aria-label*="submit" i]"#.into(),
            advance_buttons: r#"button[aria-label*="continue" i], button[aria-label*="next" i], button[aria-label*="review" i]"#.into(),
            dismiss_button: r#"button[aria-label*="dismiss" i], button[aria-label*="close" i]"#.into(),
            field_container: r#"fieldset, [role="group"], [role="radiogroup"], .form-field"#.into(),
        }
    }
}

impl SelectorSet {
    pub fn for_intent(&self, intent: SelectorIntent) -> &str {
        match intent {
            SelectorIntent::Dialog => &self.dialog,
            SelectorIntent::ApplyButton => &self.apply_button,
            SelectorIntent::ErrorIndicators => &self.error_indicators,
            SelectorIntent::Labels => &self.labels,
            SelectorIntent::SubmitButton => &self.submit_button,
            SelectorIntent::AdvanceButtons => &self.advance_buttons,
            SelectorIntent::DismissButton => &self.dismiss_button,
        }
    }
}
