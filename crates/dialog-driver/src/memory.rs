//! Scriptable in-process driver.
//!
//! Models a job page with an apply button and a multi-step dialog whose fields validate
//! when submit or advance is clicked. Ids are deterministic (`s0-f1`, `s0-f1-label`,
//! `s0-f1-error`, `s0-f1-o2`, `submit`, ...) so tests can assert on the action log.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use easyapply_core_types::{eq_ignore_case, ControlId};
use parking_lot::Mutex;

use crate::errors::{DriverError, DriverResult};
use crate::model::{ChoiceOption, ControlInfo, ControlTag, GroupKind, SelectorIntent, WaitCondition};
use crate::ports::DialogDriver;

/// Url of the page installed by [`InMemoryDialogDriver::single`].
pub const MEMORY_URL: &str = "memory://job";

const PLACEHOLDER: &str = "Select an option";
const DEFAULT_ERROR: &str = "Please enter a valid answer";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldShape {
    Text,
    TextArea,
    Select,
    RadioGroup,
    CheckboxGroup,
    File,
}

#[derive(Clone, Debug)]
pub struct MemoryOption {
    pub label: String,
    pub value: String,
    pub enabled: bool,
}

impl MemoryOption {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            value: label.to_string(),
            enabled: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MemoryField {
    label: String,
    shape: FieldShape,
    input_type: Option<String>,
    options: Vec<MemoryOption>,
    value: String,
    selected: BTreeSet<usize>,
    required: bool,
    accepts: Option<Vec<String>>,
    error_message: Option<String>,
    error_visible: bool,
}

impl MemoryField {
    fn with_shape(label: &str, shape: FieldShape, input_type: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            shape,
            input_type: input_type.map(str::to_string),
            options: Vec::new(),
            value: String::new(),
            selected: BTreeSet::new(),
            required: false,
            accepts: None,
            error_message: None,
            error_visible: false,
        }
    }

    pub fn text(label: &str) -> Self {
        Self::with_shape(label, FieldShape::Text, Some("text"))
    }

    /// Text input with an explicit `type` attribute (`number`, `email`, `tel`, ...).
    pub fn input(label: &str, input_type: &str) -> Self {
        Self::with_shape(label, FieldShape::Text, Some(input_type))
    }

    pub fn textarea(label: &str) -> Self {
        Self::with_shape(label, FieldShape::TextArea, None)
    }

    /// Dropdown; a placeholder option with an empty value comes first.
    pub fn select(label: &str, options: &[&str]) -> Self {
        let mut field = Self::with_shape(label, FieldShape::Select, None);
        field.options.push(MemoryOption {
            label: PLACEHOLDER.to_string(),
            value: String::new(),
            enabled: true,
        });
        field.options.extend(options.iter().map(|label| MemoryOption::new(label)));
        field
    }

    pub fn radio(label: &str, options: &[&str]) -> Self {
        let mut field = Self::with_shape(label, FieldShape::RadioGroup, None);
        field.options = options.iter().map(|label| MemoryOption::new(label)).collect();
        field
    }

    pub fn checkboxes(label: &str, options: &[&str]) -> Self {
        let mut field = Self::with_shape(label, FieldShape::CheckboxGroup, None);
        field.options = options.iter().map(|label| MemoryOption::new(label)).collect();
        field
    }

    pub fn file(label: &str) -> Self {
        Self::with_shape(label, FieldShape::File, Some("file"))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Only these values (case-insensitive) pass validation.
    pub fn accepting(mut self, values: &[&str]) -> Self {
        self.accepts = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Pre-filled value; for groups and selects the matching option is selected.
    pub fn with_value(mut self, value: &str) -> Self {
        match self.shape {
            FieldShape::RadioGroup | FieldShape::CheckboxGroup => {
                if let Some(index) = self.option_index(value) {
                    self.selected.insert(index);
                }
            }
            _ => self.value = value.to_string(),
        }
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    /// Error indicator already showing when the dialog opens.
    pub fn showing_error(mut self) -> Self {
        self.error_visible = true;
        self
    }

    pub fn disable_option(mut self, label: &str) -> Self {
        if let Some(index) = self.option_index(label) {
            self.options[index].enabled = false;
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn option_index(&self, label: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|option| eq_ignore_case(&option.label, label))
    }

    fn is_text_like(&self) -> bool {
        matches!(self.shape, FieldShape::Text | FieldShape::TextArea)
    }

    pub fn value(&self) -> Option<String> {
        let value = match self.shape {
            FieldShape::RadioGroup | FieldShape::CheckboxGroup => self
                .selected
                .iter()
                .filter_map(|index| self.options.get(*index))
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => self.value.clone(),
        };
        (!value.is_empty()).then_some(value)
    }

    fn violates(&self) -> bool {
        match self.value() {
            None => self.required,
            Some(value) => self.accepts.as_ref().is_some_and(|accepted| {
                !accepted
                    .iter()
                    .any(|candidate| eq_ignore_case(candidate, value.trim()))
            }),
        }
    }

    fn error_text(&self) -> &str {
        self.error_message.as_deref().unwrap_or(DEFAULT_ERROR)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepAction {
    Advance,
    Submit,
}

#[derive(Clone, Debug)]
pub struct MemoryStep {
    fields: Vec<MemoryField>,
    action: StepAction,
    stuck: bool,
}

impl MemoryStep {
    pub fn advance() -> Self {
        Self {
            fields: Vec::new(),
            action: StepAction::Advance,
            stuck: false,
        }
    }

    pub fn submit() -> Self {
        Self {
            fields: Vec::new(),
            action: StepAction::Submit,
            stuck: false,
        }
    }

    pub fn field(mut self, field: MemoryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Clicking the step's button never leaves the step, and no error is shown.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct MemoryPage {
    steps: Vec<MemoryStep>,
    has_apply: bool,
    opens_dialog: bool,
    opened: bool,
}

impl MemoryPage {
    pub fn new(steps: Vec<MemoryStep>) -> Self {
        Self {
            steps,
            has_apply: true,
            opens_dialog: true,
            opened: false,
        }
    }

    pub fn without_apply_button(mut self) -> Self {
        self.has_apply = false;
        self
    }

    /// Apply button present, but clicking it never opens the dialog.
    pub fn without_dialog(mut self) -> Self {
        self.opens_dialog = false;
        self
    }

    /// Dialog already open on load.
    pub fn opened(mut self) -> Self {
        self.opened = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverAction {
    Navigate(String),
    Press(ControlId),
    Toggle(ControlId),
    Clear(ControlId),
    Type(ControlId, String),
    Tab(ControlId),
    Select(ControlId, String),
}

impl DriverAction {
    /// Actions that change a field's value.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            DriverAction::Toggle(_)
                | DriverAction::Clear(_)
                | DriverAction::Type(..)
                | DriverAction::Select(..)
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Target {
    Dialog,
    Apply,
    Submit,
    Advance,
    Dismiss,
    Field(usize, usize),
    Label(usize, usize),
    Error(usize, usize),
    Option(usize, usize, usize),
}

impl Target {
    fn parse(id: &ControlId) -> Option<Self> {
        match id.as_str() {
            "dialog" => return Some(Target::Dialog),
            "apply" => return Some(Target::Apply),
            "submit" => return Some(Target::Submit),
            "advance" => return Some(Target::Advance),
            "dismiss" => return Some(Target::Dismiss),
            _ => {}
        }
        let mut parts = id.as_str().split('-');
        let step = parts.next()?.strip_prefix('s')?.parse().ok()?;
        let field = parts.next()?.strip_prefix('f')?.parse().ok()?;
        let target = match parts.next() {
            None => Target::Field(step, field),
            Some("label") => Target::Label(step, field),
            Some("error") => Target::Error(step, field),
            Some(option) => Target::Option(step, field, option.strip_prefix('o')?.parse().ok()?),
        };
        parts.next().is_none().then_some(target)
    }

    fn id(self) -> ControlId {
        let raw = match self {
            Target::Dialog => "dialog".to_string(),
            Target::Apply => "apply".to_string(),
            Target::Submit => "submit".to_string(),
            Target::Advance => "advance".to_string(),
            Target::Dismiss => "dismiss".to_string(),
            Target::Field(s, f) => format!("s{s}-f{f}"),
            Target::Label(s, f) => format!("s{s}-f{f}-label"),
            Target::Error(s, f) => format!("s{s}-f{f}-error"),
            Target::Option(s, f, o) => format!("s{s}-f{f}-o{o}"),
        };
        ControlId(raw)
    }

    fn step(self) -> Option<usize> {
        match self {
            Target::Field(s, _)
            | Target::Label(s, _)
            | Target::Error(s, _)
            | Target::Option(s, _, _) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct JobState {
    page: MemoryPage,
    step: usize,
    open: bool,
    submitted: bool,
    dismissals: usize,
}

impl JobState {
    fn new(page: MemoryPage) -> Self {
        let open = page.opened;
        Self {
            page,
            step: 0,
            open,
            submitted: false,
            dismissals: 0,
        }
    }

    fn current_step(&self) -> Option<&MemoryStep> {
        self.page.steps.get(self.step)
    }

    fn field(&self, step: usize, field: usize) -> DriverResult<&MemoryField> {
        self.page
            .steps
            .get(step)
            .and_then(|s| s.fields.get(field))
            .ok_or_else(|| DriverError::NotFound(Target::Field(step, field).id().to_string()))
    }

    fn field_mut(&mut self, step: usize, field: usize) -> DriverResult<&mut MemoryField> {
        self.page
            .steps
            .get_mut(step)
            .and_then(|s| s.fields.get_mut(field))
            .ok_or_else(|| DriverError::NotFound(Target::Field(step, field).id().to_string()))
    }

    fn find(&self, intent: SelectorIntent) -> Vec<ControlId> {
        if intent.is_dialog_scoped() && !self.open {
            return Vec::new();
        }
        let step = self.step;
        match intent {
            SelectorIntent::Dialog => {
                if self.open {
                    vec![Target::Dialog.id()]
                } else {
                    Vec::new()
                }
            }
            SelectorIntent::ApplyButton => {
                if self.page.has_apply && !self.open && !self.submitted {
                    vec![Target::Apply.id()]
                } else {
                    Vec::new()
                }
            }
            SelectorIntent::DismissButton => vec![Target::Dismiss.id()],
            SelectorIntent::SubmitButton | SelectorIntent::AdvanceButtons => {
                let wanted = if intent == SelectorIntent::SubmitButton {
                    StepAction::Submit
                } else {
                    StepAction::Advance
                };
                match self.current_step() {
                    Some(current) if current.action == wanted => {
                        vec![if wanted == StepAction::Submit {
                            Target::Submit.id()
                        } else {
                            Target::Advance.id()
                        }]
                    }
                    _ => Vec::new(),
                }
            }
            SelectorIntent::Labels => self
                .current_step()
                .map(|current| {
                    (0..current.fields.len())
                        .map(|index| Target::Label(step, index).id())
                        .collect()
                })
                .unwrap_or_default(),
            SelectorIntent::ErrorIndicators => self
                .current_step()
                .map(|current| {
                    current
                        .fields
                        .iter()
                        .enumerate()
                        .filter(|(_, field)| field.error_visible)
                        .map(|(index, _)| Target::Error(step, index).id())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Shows an error on every violating field of the current step; true when all pass.
    fn validate_step(&mut self) -> bool {
        let Some(current) = self.page.steps.get_mut(self.step) else {
            return true;
        };
        let mut valid = true;
        for field in &mut current.fields {
            field.error_visible = field.violates();
            valid &= !field.error_visible;
        }
        valid
    }

    fn press(&mut self, target: Target) -> DriverResult<()> {
        match target {
            Target::Apply => {
                if !self.page.has_apply || self.open {
                    return Err(DriverError::NotFound("apply".into()));
                }
                if self.page.opens_dialog {
                    self.open = true;
                    self.step = 0;
                }
            }
            Target::Submit | Target::Advance => {
                let expected = if target == Target::Submit {
                    StepAction::Submit
                } else {
                    StepAction::Advance
                };
                let (action, stuck) = match self.current_step() {
                    Some(current) if self.open => (current.action, current.stuck),
                    _ => return Err(DriverError::NotFound(target.id().to_string())),
                };
                if action != expected {
                    return Err(DriverError::Stale(target.id().to_string()));
                }
                if !self.validate_step() || stuck {
                    return Ok(());
                }
                match action {
                    StepAction::Advance => self.step += 1,
                    StepAction::Submit => {
                        self.open = false;
                        self.submitted = true;
                    }
                }
            }
            Target::Dismiss => {
                if !self.open {
                    return Err(DriverError::NotFound("dismiss".into()));
                }
                self.open = false;
                self.step = 0;
                self.dismissals += 1;
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    jobs: BTreeMap<String, JobState>,
    current: Option<String>,
    actions: Vec<DriverAction>,
    /// Errors handed out by the next `find_controls` calls for an intent.
    faults: Vec<(SelectorIntent, DriverError)>,
}

impl MemoryState {
    fn job(&self) -> DriverResult<&JobState> {
        self.current
            .as_ref()
            .and_then(|url| self.jobs.get(url))
            .ok_or_else(|| DriverError::NotFound("no page loaded".into()))
    }

    fn job_mut(&mut self) -> DriverResult<&mut JobState> {
        let url = self
            .current
            .clone()
            .ok_or_else(|| DriverError::NotFound("no page loaded".into()))?;
        self.jobs
            .get_mut(&url)
            .ok_or_else(|| DriverError::NotFound(url))
    }

    /// Resolves an id against the current step; ids from earlier steps are stale.
    fn resolve(&self, id: &ControlId) -> DriverResult<Target> {
        let target = Target::parse(id).ok_or_else(|| DriverError::NotFound(id.to_string()))?;
        if let Some(step) = target.step() {
            let job = self.job()?;
            if !job.open || step != job.step {
                return Err(DriverError::Stale(id.to_string()));
            }
        }
        Ok(target)
    }
}

/// In-process [`DialogDriver`] backed by scripted pages.
#[derive(Debug, Default)]
pub struct InMemoryDialogDriver {
    state: Mutex<MemoryState>,
}

impl InMemoryDialogDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(self, url: impl Into<String>, page: MemoryPage) -> Self {
        self.state.lock().jobs.insert(url.into(), JobState::new(page));
        self
    }

    /// One page at [`MEMORY_URL`], already loaded.
    pub fn single(page: MemoryPage) -> Self {
        let driver = Self::new().with_job(MEMORY_URL, page);
        driver.state.lock().current = Some(MEMORY_URL.to_string());
        driver
    }

    /// One page whose dialog is open on `step`.
    pub fn with_open_dialog(step: MemoryStep) -> Self {
        Self::single(MemoryPage::new(vec![step]).opened())
    }

    /// Queues `error` as the result of the next `find_controls(intent)` call.
    pub fn failing_find(self, intent: SelectorIntent, error: DriverError) -> Self {
        self.state.lock().faults.push((intent, error));
        self
    }

    pub fn actions(&self) -> Vec<DriverAction> {
        self.state.lock().actions.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .actions
            .iter()
            .filter(|action| action.is_mutation())
            .count()
    }

    pub fn clear_actions(&self) {
        self.state.lock().actions.clear();
    }

    /// Current value of the first field with `label` on the loaded page.
    pub fn field_value(&self, label: &str) -> Option<String> {
        let state = self.state.lock();
        let job = state.job().ok()?;
        job.page
            .steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .find(|field| field.label == label)
            .and_then(MemoryField::value)
    }

    pub fn dialog_open(&self) -> bool {
        self.state.lock().job().map(|job| job.open).unwrap_or(false)
    }

    pub fn submitted(&self, url: &str) -> bool {
        self.state
            .lock()
            .jobs
            .get(url)
            .map(|job| job.submitted)
            .unwrap_or(false)
    }

    pub fn dismissals(&self, url: &str) -> usize {
        self.state
            .lock()
            .jobs
            .get(url)
            .map(|job| job.dismissals)
            .unwrap_or(0)
    }

    pub fn current_step(&self) -> Option<usize> {
        self.state.lock().job().ok().map(|job| job.step)
    }

    fn record(state: &mut MemoryState, action: DriverAction) {
        state.actions.push(action);
    }
}

fn describe_field(target: Target, field: &MemoryField) -> ControlInfo {
    let (tag, group) = match field.shape {
        FieldShape::Text | FieldShape::File => (ControlTag::Input, GroupKind::None),
        FieldShape::TextArea => (ControlTag::TextArea, GroupKind::None),
        FieldShape::Select => (ControlTag::Select, GroupKind::None),
        FieldShape::RadioGroup => (ControlTag::Other, GroupKind::RadioGroup),
        FieldShape::CheckboxGroup => (ControlTag::Other, GroupKind::CheckboxGroup),
    };
    ControlInfo {
        id: target.id(),
        tag,
        input_type: field.input_type.clone(),
        label: field.label.clone(),
        group,
        name: Some(target.id().to_string()),
        enabled: true,
        visible: true,
    }
}

#[async_trait]
impl DialogDriver for InMemoryDialogDriver {
    async fn find_controls(&self, intent: SelectorIntent) -> DriverResult<Vec<ControlId>> {
        let mut state = self.state.lock();
        if let Some(index) = state.faults.iter().position(|(target, _)| *target == intent) {
            return Err(state.faults.remove(index).1);
        }
        Ok(state.job().map(|job| job.find(intent)).unwrap_or_default())
    }

    async fn describe(&self, control: &ControlId) -> DriverResult<ControlInfo> {
        let state = self.state.lock();
        let target = state.resolve(control)?;
        let job = state.job()?;
        let info = match target {
            Target::Field(s, f) => describe_field(target, job.field(s, f)?),
            Target::Option(s, f, o) => {
                let field = job.field(s, f)?;
                let option = field
                    .options
                    .get(o)
                    .ok_or_else(|| DriverError::NotFound(control.to_string()))?;
                let (input_type, group) = match field.shape {
                    FieldShape::RadioGroup => (Some("radio".to_string()), GroupKind::RadioGroup),
                    FieldShape::CheckboxGroup => {
                        (Some("checkbox".to_string()), GroupKind::CheckboxGroup)
                    }
                    _ => (None, GroupKind::None),
                };
                ControlInfo {
                    id: control.clone(),
                    tag: ControlTag::Input,
                    input_type,
                    label: option.label.clone(),
                    group,
                    name: Some(Target::Field(s, f).id().to_string()),
                    enabled: option.enabled,
                    visible: true,
                }
            }
            Target::Apply | Target::Submit | Target::Advance | Target::Dismiss => ControlInfo {
                id: control.clone(),
                tag: ControlTag::Button,
                label: button_text(target).to_string(),
                enabled: true,
                visible: true,
                ..ControlInfo::default()
            },
            Target::Dialog | Target::Label(..) | Target::Error(..) => ControlInfo {
                id: control.clone(),
                enabled: true,
                visible: true,
                ..ControlInfo::default()
            },
        };
        Ok(info)
    }

    async fn text(&self, control: &ControlId) -> DriverResult<String> {
        let state = self.state.lock();
        let target = state.resolve(control)?;
        let job = state.job()?;
        let text = match target {
            Target::Label(s, f) => job.field(s, f)?.label.clone(),
            Target::Error(s, f) => job.field(s, f)?.error_text().to_string(),
            Target::Field(s, f) => job.field(s, f)?.value().unwrap_or_default(),
            Target::Option(s, f, o) => job
                .field(s, f)?
                .options
                .get(o)
                .map(|option| option.label.clone())
                .ok_or_else(|| DriverError::NotFound(control.to_string()))?,
            Target::Dialog => String::new(),
            other => button_text(other).to_string(),
        };
        Ok(text)
    }

    async fn control_for_label(&self, label: &ControlId) -> DriverResult<Option<ControlId>> {
        let state = self.state.lock();
        match state.resolve(label)? {
            Target::Label(s, f) => {
                state.job()?.field(s, f)?;
                Ok(Some(Target::Field(s, f).id()))
            }
            _ => Ok(None),
        }
    }

    async fn control_for_error(&self, indicator: &ControlId) -> DriverResult<Option<ControlId>> {
        let state = self.state.lock();
        match state.resolve(indicator)? {
            Target::Error(s, f) => {
                state.job()?.field(s, f)?;
                Ok(Some(Target::Field(s, f).id()))
            }
            _ => Ok(None),
        }
    }

    async fn options(&self, control: &ControlId) -> DriverResult<Vec<ChoiceOption>> {
        let state = self.state.lock();
        let Target::Field(s, f) = state.resolve(control)? else {
            return Ok(Vec::new());
        };
        let field = state.job()?.field(s, f)?;
        let options = field
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| ChoiceOption {
                control: Target::Option(s, f, index).id(),
                label: option.label.clone(),
                value: option.value.clone(),
                selected: match field.shape {
                    FieldShape::Select => !field.value.is_empty() && field.value == option.value,
                    _ => field.selected.contains(&index),
                },
                enabled: option.enabled,
            })
            .collect();
        Ok(options)
    }

    async fn current_value(&self, control: &ControlId) -> DriverResult<Option<String>> {
        let state = self.state.lock();
        let job = state.job()?;
        match state.resolve(control)? {
            Target::Field(s, f) => Ok(job.field(s, f)?.value()),
            Target::Option(s, f, o) => {
                let field = job.field(s, f)?;
                Ok(field
                    .selected
                    .contains(&o)
                    .then(|| field.options[o].label.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, control: &ControlId) -> DriverResult<()> {
        let mut state = self.state.lock();
        let target = state.resolve(control)?;
        match target {
            Target::Apply | Target::Submit | Target::Advance | Target::Dismiss => {
                state.job_mut()?.press(target)?;
                Self::record(&mut state, DriverAction::Press(control.clone()));
            }
            Target::Option(s, f, o) => {
                let field = state.job_mut()?.field_mut(s, f)?;
                let option = field
                    .options
                    .get(o)
                    .ok_or_else(|| DriverError::NotFound(control.to_string()))?;
                if !option.enabled {
                    return Err(DriverError::NotInteractable(control.to_string()));
                }
                match field.shape {
                    FieldShape::RadioGroup => {
                        field.selected.clear();
                        field.selected.insert(o);
                    }
                    FieldShape::CheckboxGroup => {
                        if !field.selected.remove(&o) {
                            field.selected.insert(o);
                        }
                    }
                    FieldShape::Select => field.value = option.value.clone(),
                    _ => {}
                }
                Self::record(&mut state, DriverAction::Toggle(control.clone()));
            }
            Target::Field(s, f) => {
                if state.job()?.field(s, f)?.shape == FieldShape::File {
                    return Err(DriverError::NotInteractable(control.to_string()));
                }
            }
            Target::Dialog | Target::Label(..) | Target::Error(..) => {}
        }
        Ok(())
    }

    async fn clear(&self, control: &ControlId) -> DriverResult<()> {
        let mut state = self.state.lock();
        let Target::Field(s, f) = state.resolve(control)? else {
            return Err(DriverError::NotInteractable(control.to_string()));
        };
        let field = state.job_mut()?.field_mut(s, f)?;
        if !field.is_text_like() {
            return Err(DriverError::NotInteractable(control.to_string()));
        }
        field.value.clear();
        Self::record(&mut state, DriverAction::Clear(control.clone()));
        Ok(())
    }

    async fn type_into(&self, control: &ControlId, text: &str) -> DriverResult<()> {
        let mut state = self.state.lock();
        let Target::Field(s, f) = state.resolve(control)? else {
            return Err(DriverError::NotInteractable(control.to_string()));
        };
        let field = state.job_mut()?.field_mut(s, f)?;
        if !field.is_text_like() {
            return Err(DriverError::NotInteractable(control.to_string()));
        }
        field.value.push_str(text);
        Self::record(&mut state, DriverAction::Type(control.clone(), text.to_string()));
        Ok(())
    }

    async fn press_tab(&self, control: &ControlId) -> DriverResult<()> {
        let mut state = self.state.lock();
        let target = state.resolve(control)?;
        if let Target::Field(s, f) = target {
            // Blur re-validates the field.
            let field = state.job_mut()?.field_mut(s, f)?;
            field.error_visible = field.violates();
        }
        Self::record(&mut state, DriverAction::Tab(control.clone()));
        Ok(())
    }

    async fn select_option(&self, control: &ControlId, value: &str) -> DriverResult<()> {
        let mut state = self.state.lock();
        let Target::Field(s, f) = state.resolve(control)? else {
            return Err(DriverError::NotInteractable(control.to_string()));
        };
        let field = state.job_mut()?.field_mut(s, f)?;
        if field.shape != FieldShape::Select {
            return Err(DriverError::NotInteractable(control.to_string()));
        }
        let option = field
            .options
            .iter()
            .find(|option| option.value == value)
            .ok_or_else(|| DriverError::OptionMissing(value.to_string()))?;
        field.value = option.value.clone();
        Self::record(&mut state, DriverAction::Select(control.clone(), value.to_string()));
        Ok(())
    }

    async fn wait_until(&self, condition: WaitCondition, _timeout: Duration) -> DriverResult<()> {
        let state = self.state.lock();
        let present = |intent: SelectorIntent| {
            state
                .job()
                .map(|job| !job.find(intent).is_empty())
                .unwrap_or(false)
        };
        let met = match condition {
            WaitCondition::Present(intent) => present(intent),
            WaitCondition::Absent(intent) => !present(intent),
        };
        if met {
            Ok(())
        } else {
            Err(DriverError::Timeout(condition.to_string()))
        }
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.state.lock();
        Self::record(&mut state, DriverAction::Navigate(url.to_string()));
        let job = state
            .jobs
            .get_mut(url)
            .ok_or_else(|| DriverError::Protocol(format!("net::ERR_NAME_NOT_RESOLVED at {url}")))?;
        job.open = job.page.opened && !job.submitted;
        job.step = 0;
        state.current = Some(url.to_string());
        Ok(())
    }
}

fn button_text(target: Target) -> &'static str {
    match target {
        Target::Apply => "Apply",
        Target::Submit => "Submit application",
        Target::Advance => "Continue to next step",
        Target::Dismiss => "Dismiss",
        _ => "",
    }
}
