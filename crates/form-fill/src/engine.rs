use std::collections::HashSet;
use std::sync::Arc;

use answer_oracle::AnswerOracle;
use dialog_driver::{ControlId, DialogDriver, DriverError, DriverResult, SelectorIntent};
use easyapply_core_types::{eq_ignore_case, AnswerItem};
use tracing::{debug, info, instrument, warn};

use crate::classify::classify;
use crate::model::{ControlShape, FieldValue, FillMode, FillReport, FormField};
use crate::radio::select_radio;
use crate::tried::TriedAnswers;

/// One fill pass over the open dialog: discover, classify, ask once, apply.
pub struct DialogFillEngine {
    driver: Arc<dyn DialogDriver>,
    oracle: Arc<dyn AnswerOracle>,
}

impl DialogFillEngine {
    pub fn new(driver: Arc<dyn DialogDriver>, oracle: Arc<dyn AnswerOracle>) -> Self {
        Self { driver, oracle }
    }

    pub fn driver(&self) -> &Arc<dyn DialogDriver> {
        &self.driver
    }

    /// Repairs errored fields when any error indicator is visible, otherwise fills
    /// every empty field.
    pub async fn fill_pass(&self, tried: &mut TriedAnswers) -> FillReport {
        let errors = self.error_indicators().await;
        if errors.is_empty() {
            self.fill_empty(tried).await
        } else {
            self.repair(errors, tried).await
        }
    }

    pub async fn fill_with_mode(&self, mode: FillMode, tried: &mut TriedAnswers) -> FillReport {
        match mode {
            FillMode::ErrorRepair => {
                let errors = self.error_indicators().await;
                if errors.is_empty() {
                    FillReport::new(mode)
                } else {
                    self.repair(errors, tried).await
                }
            }
            FillMode::FillEmpty => self.fill_empty(tried).await,
        }
    }

    /// Mode the dialog currently calls for, or `None` when nothing is pending.
    pub async fn pending_mode(&self) -> Option<FillMode> {
        if !self.error_indicators().await.is_empty() {
            return Some(FillMode::ErrorRepair);
        }
        let (fields, _) = self.collect_empty_fields().await;
        (!fields.is_empty()).then_some(FillMode::FillEmpty)
    }

    async fn error_indicators(&self) -> Vec<ControlId> {
        match self.driver.find_controls(SelectorIntent::ErrorIndicators).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "error indicator lookup failed");
                Vec::new()
            }
        }
    }

    #[instrument(skip_all, fields(mode = %FillMode::ErrorRepair, errors = errors.len()))]
    async fn repair(&self, errors: Vec<ControlId>, tried: &mut TriedAnswers) -> FillReport {
        let mut report = FillReport::new(FillMode::ErrorRepair);
        let mut seen = HashSet::new();
        let mut fields = Vec::new();

        for indicator in errors {
            let error_text = self.driver.text(&indicator).await.unwrap_or_default();
            let control = match self.driver.control_for_error(&indicator).await {
                Ok(Some(control)) => control,
                Ok(None) => {
                    debug!(indicator = %indicator, "error indicator has no associated control");
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    debug!(indicator = %indicator, error = %err, "error indicator unresolved");
                    report.skipped += 1;
                    continue;
                }
            };
            if !seen.insert(control.clone()) {
                continue;
            }
            match self.inspect(&control, &error_text, Some(error_text.as_str())).await {
                Ok(field) if field.is_fillable() => fields.push(field),
                Ok(field) => {
                    debug!(question = %field.question, kind = %field.kind, "errored field is not fillable");
                    report.skipped += 1;
                }
                Err(err) => {
                    debug!(control = %control, error = %err, "errored field unreadable");
                    report.skipped += 1;
                }
            }
        }

        self.answer_and_apply(fields, FillMode::ErrorRepair, tried, &mut report)
            .await;
        report
    }

    #[instrument(skip_all, fields(mode = %FillMode::FillEmpty))]
    async fn fill_empty(&self, tried: &mut TriedAnswers) -> FillReport {
        let mut report = FillReport::new(FillMode::FillEmpty);
        let (fields, skipped) = self.collect_empty_fields().await;
        report.skipped += skipped;
        self.answer_and_apply(fields, FillMode::FillEmpty, tried, &mut report)
            .await;
        report
    }

    /// Unfilled, fillable controls reachable from dialog labels, plus the count passed over.
    async fn collect_empty_fields(&self) -> (Vec<FormField>, usize) {
        let labels = match self.driver.find_controls(SelectorIntent::Labels).await {
            Ok(labels) => labels,
            Err(err) => {
                warn!(error = %err, "label lookup failed");
                return (Vec::new(), 0);
            }
        };

        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        let mut skipped = 0;
        for label in labels {
            let control = match self.driver.control_for_label(&label).await {
                Ok(Some(control)) => control,
                Ok(None) => continue,
                Err(err) => {
                    debug!(label = %label, error = %err, "label target unresolved");
                    continue;
                }
            };
            if !seen.insert(control.clone()) {
                continue;
            }
            let label_text = self.driver.text(&label).await.unwrap_or_default();
            match self.inspect(&control, &label_text, None).await {
                Ok(field) if field.current_value.is_set() => skipped += 1,
                Ok(field) if !field.is_fillable() => {
                    debug!(question = %field.question, kind = %field.kind, "empty field is not fillable");
                    skipped += 1;
                }
                Ok(field) => fields.push(field),
                Err(err) => {
                    debug!(control = %control, error = %err, "field unreadable");
                    skipped += 1;
                }
            }
        }
        (fields, skipped)
    }

    /// Reads, classifies and gathers choices for one control.
    async fn inspect(
        &self,
        control: &ControlId,
        fallback_question: &str,
        error_text: Option<&str>,
    ) -> DriverResult<FormField> {
        let info = self.driver.describe(control).await?;
        let shape = ControlShape::of(&info);
        let kind = classify(&info, error_text);
        let choices = if shape.has_choices() {
            self.driver
                .options(control)
                .await?
                .into_iter()
                .filter(|option| shape != ControlShape::Select || !option.value.trim().is_empty())
                .map(|option| option.label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        let current_value = FieldValue::from_option(self.driver.current_value(control).await?);
        let label = info.label.trim().to_string();
        let question = if label.is_empty() {
            fallback_question.trim().to_string()
        } else {
            label.clone()
        };
        Ok(FormField {
            control: control.clone(),
            label,
            question,
            kind,
            shape,
            choices,
            current_value,
        })
    }

    async fn answer_and_apply(
        &self,
        fields: Vec<FormField>,
        mode: FillMode,
        tried: &mut TriedAnswers,
        report: &mut FillReport,
    ) {
        if fields.is_empty() {
            return;
        }
        let items: Vec<AnswerItem> = fields.iter().map(FormField::answer_item).collect();
        report.queued = items.len();
        let answers = self.oracle.ask_batch(&items).await;

        for (field, answer) in fields.iter().zip(answers) {
            match self.apply(field, &answer, mode, tried).await {
                Ok(true) => {
                    debug!(question = %field.question, kind = %field.kind, answer = %answer, "field applied");
                    report.applied += 1;
                }
                Ok(false) => {
                    debug!(question = %field.question, "no applicable choice");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(question = %field.question, error = %err, "apply failed; skipping field");
                    report.skipped += 1;
                }
            }
        }
        info!(
            mode = %mode,
            queued = report.queued,
            applied = report.applied,
            skipped = report.skipped,
            "fill pass finished"
        );
    }

    async fn apply(
        &self,
        field: &FormField,
        answer: &str,
        mode: FillMode,
        tried: &mut TriedAnswers,
    ) -> DriverResult<bool> {
        let key = field.key();
        match field.shape {
            ControlShape::TextLike => {
                self.driver.clear(&field.control).await?;
                self.driver.type_into(&field.control, answer).await?;
                if mode == FillMode::ErrorRepair {
                    if let Err(err) = self.driver.press_tab(&field.control).await {
                        debug!(error = %err, "tab after repair failed");
                    }
                }
                tried.mark(key, answer);
                Ok(true)
            }
            ControlShape::Select => {
                let options = self.driver.options(&field.control).await?;
                let wanted = answer.trim();
                let picked = options
                    .iter()
                    .find(|option| {
                        eq_ignore_case(option.value.trim(), wanted)
                            || eq_ignore_case(option.label.trim(), wanted)
                    })
                    .or_else(|| options.iter().find(|option| !option.value.trim().is_empty()));
                let Some(option) = picked else {
                    return Ok(false);
                };
                self.driver.select_option(&field.control, &option.value).await?;
                tried.mark(key, &option.value);
                Ok(true)
            }
            ControlShape::RadioGroup => Ok(select_radio(
                self.driver.as_ref(),
                &field.control,
                key,
                Some(answer),
                tried,
            )
            .await),
            ControlShape::CheckboxGroup => {
                let options = self.driver.options(&field.control).await?;
                let wanted = answer.trim();
                let picked = options
                    .iter()
                    .find(|option| eq_ignore_case(option.label.trim(), wanted))
                    .or_else(|| options.iter().find(|option| option.enabled && !option.selected))
                    .or_else(|| options.first());
                let Some(option) = picked else {
                    return Ok(false);
                };
                // Clicking a checked box would uncheck it.
                if !option.selected {
                    self.driver.click(&option.control).await?;
                }
                tried.mark(key, option.label.trim());
                Ok(true)
            }
            ControlShape::File | ControlShape::Unsupported => {
                Err(DriverError::NotInteractable(field.control.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answer_oracle::fallback_answer;
    use async_trait::async_trait;
    use dialog_driver::{DriverAction, InMemoryDialogDriver, MemoryField, MemoryStep};
    use easyapply_core_types::ValueKind;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedOracle {
        batches: Mutex<VecDeque<Vec<String>>>,
        seen: Mutex<Vec<Vec<AnswerItem>>>,
    }

    impl ScriptedOracle {
        fn with_batches(batches: &[&[&str]]) -> Arc<Self> {
            let batches = batches
                .iter()
                .map(|batch| batch.iter().map(|a| a.to_string()).collect())
                .collect();
            Arc::new(Self {
                batches: Mutex::new(batches),
                seen: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<Vec<AnswerItem>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerOracle for ScriptedOracle {
        async fn ask(&self, item: &AnswerItem) -> String {
            self.ask_batch(std::slice::from_ref(item)).await.remove(0)
        }

        async fn ask_batch(&self, items: &[AnswerItem]) -> Vec<String> {
            self.seen.lock().unwrap().push(items.to_vec());
            let scripted = self.batches.lock().unwrap().pop_front().unwrap_or_default();
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    scripted
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| fallback_answer(&item.choices))
                })
                .collect()
        }
    }

    fn engine(
        driver: &Arc<InMemoryDialogDriver>,
        oracle: &Arc<ScriptedOracle>,
    ) -> DialogFillEngine {
        DialogFillEngine::new(driver.clone(), oracle.clone())
    }

    #[tokio::test]
    async fn empty_experience_field_gets_numeric_answer() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit().field(MemoryField::text("Years of experience")),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["3"]]);
        let mut tried = TriedAnswers::new();

        let report = engine(&driver, &oracle).fill_pass(&mut tried).await;

        assert_eq!(report.mode, Some(FillMode::FillEmpty));
        assert_eq!(report.applied, 1);
        let calls = oracle.calls();
        assert_eq!(calls[0][0].kind, ValueKind::Number);
        assert_eq!(calls[0][0].question, "Years of experience");
        assert_eq!(driver.field_value("Years of experience").as_deref(), Some("3"));
        let set = tried.get("Years of experience").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("3"));
    }

    #[tokio::test]
    async fn second_fill_empty_pass_changes_nothing() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::text("City"))
                .field(MemoryField::select("Degree", &["BSc", "MSc"]))
                .field(MemoryField::radio("Relocate?", &["Yes", "No"]))
                .field(MemoryField::checkboxes("Shifts", &["Day", "Night"])),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["Pune", "MSc", "No", "Night"]]);
        let engine = engine(&driver, &oracle);
        let mut tried = TriedAnswers::new();

        let first = engine.fill_pass(&mut tried).await;
        assert_eq!(first.applied, 4);
        driver.clear_actions();

        let second = engine.fill_pass(&mut tried).await;
        assert_eq!(second.applied, 0);
        assert_eq!(second.skipped, 4);
        assert_eq!(driver.mutation_count(), 0);
        assert_eq!(oracle.calls().len(), 1);
    }

    #[tokio::test]
    async fn prefilled_fields_are_left_alone() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::text("City").with_value("Pune"))
                .field(MemoryField::input("Contact email", "email")),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["me@example.com"]]);
        let mut tried = TriedAnswers::new();

        engine(&driver, &oracle).fill_pass(&mut tried).await;

        let calls = oracle.calls();
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].kind, ValueKind::Email);
        assert_eq!(driver.field_value("City").as_deref(), Some("Pune"));
        assert_eq!(driver.field_value("Contact email").as_deref(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn repeated_radio_repair_moves_past_rejected_choice() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit().field(
                MemoryField::radio("Require sponsorship?", &["Yes", "No"])
                    .required()
                    .showing_error(),
            ),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["No"], &["No"]]);
        let engine = engine(&driver, &oracle);
        let mut tried = TriedAnswers::new();

        let first = engine.fill_pass(&mut tried).await;
        assert_eq!(first.mode, Some(FillMode::ErrorRepair));
        assert_eq!(driver.field_value("Require sponsorship?").as_deref(), Some("No"));

        engine.fill_pass(&mut tried).await;
        assert_eq!(driver.field_value("Require sponsorship?").as_deref(), Some("Yes"));
        assert_eq!(oracle.calls()[1][0].choices, vec!["Yes", "No"]);
    }

    #[tokio::test]
    async fn repair_touches_only_errored_fields_and_tabs_out() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(
                    MemoryField::text("Expected CTC")
                        .with_value("abc")
                        .with_error("Enter a decimal number larger than 0.0")
                        .showing_error(),
                )
                .field(MemoryField::text("City")),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["12.5"]]);
        let mut tried = TriedAnswers::new();

        let report = engine(&driver, &oracle).fill_pass(&mut tried).await;

        assert_eq!(report.queued, 1);
        let calls = oracle.calls();
        assert_eq!(calls[0][0].kind, ValueKind::PositiveNumber);
        assert_eq!(driver.field_value("Expected CTC").as_deref(), Some("12.5"));
        assert_eq!(driver.field_value("City"), None);
        let actions = driver.actions();
        let control = ControlId::from("s0-f0");
        assert_eq!(
            actions,
            vec![
                DriverAction::Clear(control.clone()),
                DriverAction::Type(control.clone(), "12.5".into()),
                DriverAction::Tab(control),
            ]
        );
    }

    #[tokio::test]
    async fn unlabelled_groups_with_the_same_error_keep_separate_tried_sets() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::radio("", &["Yes", "No"]).showing_error())
                .field(MemoryField::radio("", &["Yes", "No"]).showing_error()),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["No", "No"]]);
        let mut tried = TriedAnswers::new();

        let report = engine(&driver, &oracle).fill_pass(&mut tried).await;

        assert_eq!(report.applied, 2);
        assert_eq!(tried.len(), 2);
        for key in ["s0-f0", "s0-f1"] {
            let set = tried.get(key).unwrap();
            assert_eq!(set.len(), 1);
            assert!(set.contains("No"));
        }
    }

    #[tokio::test]
    async fn fill_empty_does_not_tab() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit().field(MemoryField::text("City")),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["Pune"]]);
        let mut tried = TriedAnswers::new();
        engine(&driver, &oracle).fill_pass(&mut tried).await;
        assert!(!driver
            .actions()
            .iter()
            .any(|action| matches!(action, DriverAction::Tab(_))));
    }

    #[tokio::test]
    async fn select_matches_label_or_falls_back_to_first_real_option() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::select("Degree", &["BSc", "MSc"]))
                .field(MemoryField::select("Shift", &["Day", "Night"])),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["msc", "Whatever works"]]);
        let mut tried = TriedAnswers::new();
        engine(&driver, &oracle).fill_pass(&mut tried).await;

        assert_eq!(driver.field_value("Degree").as_deref(), Some("MSc"));
        assert_eq!(driver.field_value("Shift").as_deref(), Some("Day"));
        assert!(tried.has_tried("Shift", "Day"));
        // Placeholder options never reach the oracle.
        assert_eq!(oracle.calls()[0][0].choices, vec!["BSc", "MSc"]);
    }

    #[tokio::test]
    async fn checkbox_group_exact_match_or_first_option() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::checkboxes("Languages", &["English", "Hindi"]))
                .field(MemoryField::checkboxes("Benefits", &["Health", "Dental"])),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["hindi", "Stock"]]);
        let mut tried = TriedAnswers::new();
        engine(&driver, &oracle).fill_pass(&mut tried).await;

        assert_eq!(driver.field_value("Languages").as_deref(), Some("Hindi"));
        assert_eq!(driver.field_value("Benefits").as_deref(), Some("Health"));
        assert!(tried.has_tried("Benefits", "Health"));
    }

    #[tokio::test]
    async fn file_fields_are_never_sent_to_the_oracle() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit()
                .field(MemoryField::file("Resume").required().showing_error()),
        ));
        let oracle = ScriptedOracle::with_batches(&[]);
        let engine = engine(&driver, &oracle);
        let mut tried = TriedAnswers::new();

        let repair = engine.fill_pass(&mut tried).await;
        assert_eq!(repair.mode, Some(FillMode::ErrorRepair));
        assert_eq!(repair.skipped, 1);

        let empty = engine.fill_with_mode(FillMode::FillEmpty, &mut tried).await;
        assert_eq!(empty.skipped, 1);
        assert!(oracle.calls().is_empty());
        assert_eq!(driver.mutation_count(), 0);
    }

    #[tokio::test]
    async fn pending_mode_reflects_dialog_state() {
        let driver = Arc::new(InMemoryDialogDriver::with_open_dialog(
            MemoryStep::submit().field(MemoryField::text("City").required()),
        ));
        let oracle = ScriptedOracle::with_batches(&[&["Pune"]]);
        let engine = engine(&driver, &oracle);
        assert_eq!(engine.pending_mode().await, Some(FillMode::FillEmpty));

        driver.click(&ControlId::from("submit")).await.unwrap();
        assert_eq!(engine.pending_mode().await, Some(FillMode::ErrorRepair));

        let mut tried = TriedAnswers::new();
        engine.fill_pass(&mut tried).await;
        // Tab re-validated the field, clearing its error.
        assert_eq!(engine.pending_mode().await, None);
    }
}
