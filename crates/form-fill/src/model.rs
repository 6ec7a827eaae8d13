use std::fmt;

use dialog_driver::{ControlId, ControlInfo, ControlTag, GroupKind};
use easyapply_core_types::{AnswerItem, ValueKind};
use serde::Serialize;

/// Which fields a pass targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Only controls flagged by a visible validation error.
    ErrorRepair,
    /// Every labelled control that holds no value yet.
    FillEmpty,
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMode::ErrorRepair => f.write_str("error_repair"),
            FillMode::FillEmpty => f.write_str("fill_empty"),
        }
    }
}

/// How an answer is applied to a control.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlShape {
    TextLike,
    Select,
    RadioGroup,
    CheckboxGroup,
    File,
    Unsupported,
}

impl ControlShape {
    pub fn of(info: &ControlInfo) -> Self {
        if info.group == GroupKind::RadioGroup || info.is_input_type("radio") {
            return ControlShape::RadioGroup;
        }
        if info.group == GroupKind::CheckboxGroup || info.is_input_type("checkbox") {
            return ControlShape::CheckboxGroup;
        }
        match info.tag {
            ControlTag::Select => ControlShape::Select,
            ControlTag::TextArea => ControlShape::TextLike,
            ControlTag::Input if info.is_input_type("file") => ControlShape::File,
            ControlTag::Input => ControlShape::TextLike,
            ControlTag::Button | ControlTag::Other => ControlShape::Unsupported,
        }
    }

    pub fn has_choices(self) -> bool {
        matches!(
            self,
            ControlShape::Select | ControlShape::RadioGroup | ControlShape::CheckboxGroup
        )
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldValue {
    #[default]
    Unset,
    Set(String),
}

impl FieldValue {
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.trim().is_empty() => FieldValue::Set(value),
            _ => FieldValue::Unset,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, FieldValue::Set(_))
    }
}

/// One control discovered during a fill pass. Never outlives the pass.
#[derive(Clone, Debug)]
pub struct FormField {
    pub control: ControlId,
    /// The control's own label; may be empty.
    pub label: String,
    /// Text sent to the oracle: the label, or the error message for unlabelled controls.
    pub question: String,
    pub kind: ValueKind,
    pub shape: ControlShape,
    pub choices: Vec<String>,
    pub current_value: FieldValue,
}

impl FormField {
    /// Key under which tried answers are recorded. Unlabelled controls are keyed by id.
    pub fn key(&self) -> &str {
        let label = self.label.trim();
        if label.is_empty() {
            self.control.as_str()
        } else {
            label
        }
    }

    pub fn answer_item(&self) -> AnswerItem {
        AnswerItem::new(self.question.clone(), self.kind).with_choices(self.choices.clone())
    }

    /// Fields the engine may hand to the oracle.
    pub fn is_fillable(&self) -> bool {
        match self.shape {
            ControlShape::File | ControlShape::Unsupported => false,
            shape if shape.has_choices() => !self.choices.is_empty(),
            _ => self.kind != ValueKind::File,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FillReport {
    pub mode: Option<FillMode>,
    /// Fields sent to the oracle.
    pub queued: usize,
    pub applied: usize,
    /// Fields passed over: already filled, unfillable, or a failed apply.
    pub skipped: usize,
}

impl FillReport {
    pub fn new(mode: FillMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn mutated(&self) -> bool {
        self.applied > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(tag: ControlTag, input_type: Option<&str>, group: GroupKind) -> ControlInfo {
        ControlInfo {
            tag,
            input_type: input_type.map(str::to_string),
            group,
            ..ControlInfo::default()
        }
    }

    #[test]
    fn shape_follows_control_structure() {
        assert_eq!(
            ControlShape::of(&info(ControlTag::Other, None, GroupKind::RadioGroup)),
            ControlShape::RadioGroup
        );
        assert_eq!(
            ControlShape::of(&info(ControlTag::Input, Some("file"), GroupKind::None)),
            ControlShape::File
        );
        assert_eq!(
            ControlShape::of(&info(ControlTag::TextArea, None, GroupKind::None)),
            ControlShape::TextLike
        );
        assert_eq!(
            ControlShape::of(&info(ControlTag::Button, None, GroupKind::None)),
            ControlShape::Unsupported
        );
    }

    #[test]
    fn key_falls_back_to_control_id() {
        let field = FormField {
            control: ControlId::from("s0-f2"),
            label: "  ".into(),
            question: "Please enter a valid answer".into(),
            kind: ValueKind::Text,
            shape: ControlShape::TextLike,
            choices: Vec::new(),
            current_value: FieldValue::Unset,
        };
        assert_eq!(field.key(), "s0-f2");
    }

    #[test]
    fn blank_values_count_as_unset() {
        assert_eq!(FieldValue::from_option(Some("  ".into())), FieldValue::Unset);
        assert!(FieldValue::from_option(Some("3".into())).is_set());
    }

    #[test]
    fn choice_controls_without_choices_are_not_fillable() {
        let field = FormField {
            control: ControlId::from("s0-f0"),
            label: "Degree".into(),
            question: "Degree".into(),
            kind: ValueKind::Select,
            shape: ControlShape::Select,
            choices: Vec::new(),
            current_value: FieldValue::Unset,
        };
        assert!(!field.is_fillable());
    }
}
