use easyapply_core_types::AnswerItem;

const PERSONA: &str = "You are an assistant that fills job application forms realistically and concisely. Always return only the final answer without explanations.";

/// Builds the system and user prompts sent to the oracle.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    user_context: Option<String>,
    profile_summary: Option<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text persona context supplied by the operator.
    pub fn with_user_context(mut self, context: impl Into<String>) -> Self {
        self.user_context = non_empty(context.into());
        self
    }

    /// Flattened profile record, see [`crate::ProfileRecord::summary`].
    pub fn with_profile_summary(mut self, summary: impl Into<String>) -> Self {
        self.profile_summary = non_empty(summary.into());
        self
    }

    pub fn profile_summary(&self) -> Option<&str> {
        self.profile_summary.as_deref()
    }

    pub fn system_prompt(&self, batch: bool) -> String {
        let mut prompt = String::new();
        if let Some(context) = self.user_context.as_deref() {
            prompt.push_str(&format!("User Context: --- {context}\n ---"));
        }
        prompt.push_str(PERSONA);
        if batch {
            prompt.push_str(" Return JSON only.");
        }
        if let Some(profile) = self.profile_summary.as_deref() {
            prompt.push_str(&format!(" User Profile: {profile}."));
        }
        prompt
    }

    pub fn single_prompt(&self, item: &AnswerItem) -> String {
        let question = item.question.trim();
        let kind = item.kind.label();
        if item.choices.is_empty() {
            return format!(
                "Question: {question}\nType: {kind}\nRespond with a concise, realistic value only."
            );
        }
        let choices = item
            .choices
            .iter()
            .map(|choice| format!("- {choice}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Question: {question}\nType: {kind}\nChoices (select exactly one):\n{choices}\nRespond with exactly one of the choices."
        )
    }

    pub fn batch_prompt(&self, items: &[AnswerItem]) -> String {
        let mut lines = vec![
            "Answer the following questions strictly as a JSON array of strings, same order as listed.".to_string(),
            "Do not include any keys or explanations. For radio/select, answer must be exactly one of the provided choices.".to_string(),
            "Questions:".to_string(),
        ];
        for (index, item) in items.iter().enumerate() {
            lines.push(format!(
                "{}. question={} | type={}",
                index + 1,
                item.question.trim(),
                item.kind.label()
            ));
            if !item.choices.is_empty() {
                lines.push(format!("   choices=[{}]", item.choices.join(" | ")));
            }
        }
        lines.push("Respond with only the JSON array, e.g., [\"A\", \"B\"].".to_string());
        lines.join("\n")
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyapply_core_types::ValueKind;

    #[test]
    fn system_prompt_embeds_context_and_profile() {
        let builder = PromptBuilder::new()
            .with_user_context("Senior engineer, open to remote")
            .with_profile_summary("Total Experience: 6 years");
        let prompt = builder.system_prompt(true);
        assert!(prompt.starts_with("User Context: --- Senior engineer, open to remote"));
        assert!(prompt.contains("Return JSON only."));
        assert!(prompt.ends_with("User Profile: Total Experience: 6 years."));
    }

    #[test]
    fn system_prompt_without_profile_is_persona_only() {
        let prompt = PromptBuilder::new().with_profile_summary("   ").system_prompt(false);
        assert_eq!(prompt, PERSONA);
    }

    #[test]
    fn batch_prompt_numbers_questions_and_lists_choices() {
        let items = vec![
            AnswerItem::new("Years of experience", ValueKind::Number),
            AnswerItem::new("Authorized to work?", ValueKind::Radio)
                .with_choices(vec!["Yes".into(), "No".into()]),
        ];
        let prompt = PromptBuilder::new().batch_prompt(&items);
        assert!(prompt.contains("1. question=Years of experience | type=number"));
        assert!(prompt.contains("2. question=Authorized to work? | type=radio"));
        assert!(prompt.contains("   choices=[Yes | No]"));
        assert!(prompt.ends_with("Respond with only the JSON array, e.g., [\"A\", \"B\"]."));
    }

    #[test]
    fn single_prompt_with_choices_demands_one_of_them() {
        let item = AnswerItem::new("Notice period", ValueKind::Select)
            .with_choices(vec!["Immediate".into(), "30 days".into()]);
        let prompt = PromptBuilder::new().single_prompt(&item);
        assert!(prompt.contains("- Immediate\n- 30 days"));
        assert!(prompt.ends_with("Respond with exactly one of the choices."));
    }
}
