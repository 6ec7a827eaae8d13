//! Value-kind inference for a single control.

use dialog_driver::{ControlInfo, ControlTag, GroupKind};
use easyapply_core_types::ValueKind;

const URL_TERMS: &[&str] = &["url", "link", "portfolio", "github", "linkedin"];
const NUMBER_TERMS: &[&str] = &[
    "year",
    "experience",
    "ctc",
    "salary",
    "compensation",
    "notice",
    "day",
];

/// Infers the value kind of `control` from its attributes plus label and error text.
///
/// Rules are checked in priority order and the first hit wins, so type attributes beat
/// text heuristics: an `email` input labelled "phone" stays `Email`.
pub fn classify(control: &ControlInfo, error_text: Option<&str>) -> ValueKind {
    let context = format!("{} {}", control.label, error_text.unwrap_or_default()).to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|term| context.contains(term));

    if control.group == GroupKind::CheckboxGroup || control.is_input_type("checkbox") {
        return ValueKind::CheckboxGroup;
    }
    if control.tag == ControlTag::Select {
        return ValueKind::Select;
    }
    if control.is_input_type("number") || control.is_input_type("range") {
        return ValueKind::Number;
    }
    if context.contains("decimal") && mentions(&["larger than 0", "greater than 0"]) {
        return ValueKind::PositiveNumber;
    }
    if control.is_input_type("email") || context.contains("email") {
        return ValueKind::Email;
    }
    if control.is_input_type("tel") || mentions(&["phone", "mobile"]) {
        return ValueKind::Phone;
    }
    if mentions(URL_TERMS) {
        return ValueKind::Url;
    }
    if mentions(NUMBER_TERMS) {
        return ValueKind::Number;
    }
    if control.is_input_type("file") {
        return ValueKind::File;
    }
    if control.group == GroupKind::RadioGroup || control.is_input_type("radio") {
        return ValueKind::Radio;
    }
    ValueKind::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(input_type: &str, label: &str) -> ControlInfo {
        ControlInfo {
            tag: ControlTag::Input,
            input_type: Some(input_type.to_string()),
            label: label.to_string(),
            enabled: true,
            visible: true,
            ..ControlInfo::default()
        }
    }

    fn group(kind: GroupKind, label: &str) -> ControlInfo {
        ControlInfo {
            label: label.to_string(),
            group: kind,
            ..ControlInfo::default()
        }
    }

    #[test]
    fn checkbox_group_wins_first() {
        let control = group(GroupKind::CheckboxGroup, "Email preferences");
        assert_eq!(classify(&control, None), ValueKind::CheckboxGroup);
        assert_eq!(classify(&input("checkbox", "I agree"), None), ValueKind::CheckboxGroup);
    }

    #[test]
    fn select_beats_text_rules() {
        let control = ControlInfo {
            tag: ControlTag::Select,
            label: "Years of experience".into(),
            ..ControlInfo::default()
        };
        assert_eq!(classify(&control, None), ValueKind::Select);
    }

    #[test]
    fn numeric_types_and_decimal_errors() {
        assert_eq!(classify(&input("number", "Email count"), None), ValueKind::Number);
        assert_eq!(classify(&input("range", ""), None), ValueKind::Number);
        assert_eq!(
            classify(
                &input("text", "Expected CTC"),
                Some("Enter a decimal number larger than 0.0")
            ),
            ValueKind::PositiveNumber
        );
        assert_eq!(
            classify(&input("text", ""), Some("Must be a decimal greater than 0")),
            ValueKind::PositiveNumber
        );
    }

    #[test]
    fn email_type_beats_phone_label() {
        assert_eq!(classify(&input("email", "Phone"), None), ValueKind::Email);
        assert_eq!(classify(&input("text", "Work email"), None), ValueKind::Email);
    }

    #[test]
    fn phone_by_type_or_text() {
        assert_eq!(classify(&input("tel", ""), None), ValueKind::Phone);
        assert_eq!(classify(&input("text", "Mobile number"), None), ValueKind::Phone);
    }

    #[test]
    fn url_terms() {
        for label in ["Portfolio", "GitHub profile", "LinkedIn", "Website URL", "Link to work"] {
            assert_eq!(classify(&input("text", label), None), ValueKind::Url, "{label}");
        }
    }

    #[test]
    fn numeric_terms() {
        for label in [
            "Years of experience",
            "Current CTC",
            "Expected salary",
            "Notice period (days)",
            "Total compensation",
        ] {
            assert_eq!(classify(&input("text", label), None), ValueKind::Number, "{label}");
        }
    }

    #[test]
    fn error_text_contributes_to_inference() {
        assert_eq!(
            classify(&input("text", "Answer"), Some("Enter a whole number of years")),
            ValueKind::Number
        );
    }

    #[test]
    fn file_then_radio_then_text() {
        assert_eq!(classify(&input("file", "Resume"), None), ValueKind::File);
        assert_eq!(
            classify(&group(GroupKind::RadioGroup, "Willing to relocate?"), None),
            ValueKind::Radio
        );
        assert_eq!(classify(&input("radio", "Sponsorship?"), None), ValueKind::Radio);
        assert_eq!(classify(&input("text", "City"), None), ValueKind::Text);
    }

    #[test]
    fn text_rules_outrank_file_and_radio() {
        // Rule order is a priority list, not a grammar.
        assert_eq!(classify(&input("file", "Cover letter link"), None), ValueKind::Url);
        assert_eq!(
            classify(&group(GroupKind::RadioGroup, "Can you start today?"), None),
            ValueKind::Number
        );
    }
}
