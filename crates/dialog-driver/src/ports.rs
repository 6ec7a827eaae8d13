use std::time::Duration;

use async_trait::async_trait;
use easyapply_core_types::ControlId;

use crate::errors::DriverResult;
use crate::model::{ChoiceOption, ControlInfo, SelectorIntent, WaitCondition};

/// Browser/DOM operations consumed by the fill engine and the submission machine.
///
/// Handles are only valid for the page state they were minted in; any call may fail
/// with a transient [`crate::DriverError`] after the page re-renders.
#[async_trait]
pub trait DialogDriver: Send + Sync {
    /// Elements matching `intent`, in document order.
    async fn find_controls(&self, intent: SelectorIntent) -> DriverResult<Vec<ControlId>>;

    async fn describe(&self, control: &ControlId) -> DriverResult<ControlInfo>;

    /// Visible text of the element.
    async fn text(&self, control: &ControlId) -> DriverResult<String>;

    /// Control a label points at. Radio and checkbox inputs resolve to their group.
    async fn control_for_label(&self, label: &ControlId) -> DriverResult<Option<ControlId>>;

    /// Control a validation-error indicator belongs to.
    async fn control_for_error(&self, indicator: &ControlId) -> DriverResult<Option<ControlId>>;

    /// Options of a select, radio group or checkbox group, in display order.
    async fn options(&self, control: &ControlId) -> DriverResult<Vec<ChoiceOption>>;

    /// `None` when the control is empty, unselected or unchecked.
    async fn current_value(&self, control: &ControlId) -> DriverResult<Option<String>>;

    async fn click(&self, control: &ControlId) -> DriverResult<()>;

    async fn clear(&self, control: &ControlId) -> DriverResult<()>;

    async fn type_into(&self, control: &ControlId, text: &str) -> DriverResult<()>;

    async fn press_tab(&self, control: &ControlId) -> DriverResult<()>;

    /// Selects the option whose value equals `value`.
    async fn select_option(&self, control: &ControlId, value: &str) -> DriverResult<()>;

    /// Polls until `condition` holds; `Err(Timeout)` when the deadline passes first.
    async fn wait_until(&self, condition: WaitCondition, timeout: Duration) -> DriverResult<()>;

    async fn navigate(&self, url: &str) -> DriverResult<()>;
}
