use std::collections::{HashMap, HashSet};

use easyapply_core_types::eq_ignore_case;

/// Answers already applied per question key, for one open dialog.
#[derive(Debug, Default, Clone)]
pub struct TriedAnswers {
    entries: HashMap<String, HashSet<String>>,
}

impl TriedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank keys are not tracked.
    pub fn mark(&mut self, key: &str, value: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(value.trim().to_string());
    }

    /// Case-insensitive membership test.
    pub fn has_tried(&self, key: &str, value: &str) -> bool {
        let value = value.trim();
        self.entries
            .get(key.trim())
            .is_some_and(|tried| tried.iter().any(|t| eq_ignore_case(t, value)))
    }

    pub fn get(&self, key: &str) -> Option<&HashSet<String>> {
        self.entries.get(key.trim())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_and_queries() {
        let mut tried = TriedAnswers::new();
        tried.mark("Relocate?", "No");
        assert!(tried.has_tried("Relocate?", "no"));
        assert!(!tried.has_tried("Relocate?", "Yes"));
        assert!(!tried.has_tried("Other", "No"));
        assert_eq!(tried.len(), 1);
    }

    #[test]
    fn non_ascii_values_compare_without_case() {
        let mut tried = TriedAnswers::new();
        tried.mark("Language", "Español");
        assert!(tried.has_tried("Language", "ESPAÑOL"));
    }

    #[test]
    fn blank_keys_are_ignored() {
        let mut tried = TriedAnswers::new();
        tried.mark("   ", "Yes");
        assert!(tried.is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let mut tried = TriedAnswers::new();
        tried.mark("Years", "3");
        tried.clear();
        assert!(tried.get("Years").is_none());
    }
}
