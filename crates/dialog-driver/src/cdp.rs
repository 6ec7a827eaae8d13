use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use easyapply_core_types::ControlId;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use crate::errors::{DriverError, DriverResult};
use crate::model::{ChoiceOption, ControlInfo, SelectorIntent, SelectorSet, WaitCondition};
use crate::ports::DialogDriver;
use crate::script;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// [`DialogDriver`] over one Chromium tab.
pub struct CdpDialogDriver {
    page: Page,
    selectors: SelectorSet,
    poll_interval: Duration,
}

impl CdpDialogDriver {
    pub fn new(page: Page, selectors: SelectorSet) -> Self {
        Self {
            page,
            selectors,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    async fn eval<T: DeserializeOwned>(&self, expression: String) -> DriverResult<T> {
        let result = self.page.evaluate(expression).await.map_err(map_cdp_error)?;
        let raw: String = result
            .into_value()
            .map_err(|err| DriverError::Protocol(format!("script returned no string: {err}")))?;
        serde_json::from_str(&raw)
            .map_err(|err| DriverError::Protocol(format!("unexpected script result: {err}")))
    }

    async fn element(&self, control: &ControlId) -> DriverResult<Element> {
        self.page
            .find_element(script::css_for(control))
            .await
            .map_err(|err| match map_cdp_error(err) {
                DriverError::Protocol(_) => DriverError::Stale(control.to_string()),
                other => other,
            })
    }

    async fn native_click(&self, element: &Element) -> Result<(), CdpError> {
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }
}

/// Maps protocol failures onto the driver taxonomy by message.
fn map_cdp_error(err: CdpError) -> DriverError {
    classify_message(err.to_string())
}

fn classify_message(message: String) -> DriverError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("intercept") || lowered.contains("obscured") {
        DriverError::ClickIntercepted(message)
    } else if lowered.contains("could not find node") || lowered.contains("no node") {
        DriverError::NotFound(message)
    } else if lowered.contains("detached") || lowered.contains("stale") {
        DriverError::Stale(message)
    } else if lowered.contains("not visible") || lowered.contains("not interactable") {
        DriverError::NotInteractable(message)
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        DriverError::Timeout(message)
    } else {
        DriverError::Protocol(message)
    }
}

#[async_trait]
impl DialogDriver for CdpDialogDriver {
    async fn find_controls(&self, intent: SelectorIntent) -> DriverResult<Vec<ControlId>> {
        let scope = intent
            .is_dialog_scoped()
            .then(|| self.selectors.dialog.as_str());
        let selector = self.selectors.for_intent(intent);
        self.eval(script::find(scope, selector)).await
    }

    async fn describe(&self, control: &ControlId) -> DriverResult<ControlInfo> {
        let info: Option<ControlInfo> = self.eval(script::describe(control)).await?;
        info.ok_or_else(|| DriverError::Stale(control.to_string()))
    }

    async fn text(&self, control: &ControlId) -> DriverResult<String> {
        let text: Option<String> = self.eval(script::text(control)).await?;
        text.ok_or_else(|| DriverError::Stale(control.to_string()))
    }

    async fn control_for_label(&self, label: &ControlId) -> DriverResult<Option<ControlId>> {
        self.eval(script::label_target(label)).await
    }

    async fn control_for_error(&self, indicator: &ControlId) -> DriverResult<Option<ControlId>> {
        self.eval(script::error_target(
            indicator,
            &self.selectors.field_container,
        ))
        .await
    }

    async fn options(&self, control: &ControlId) -> DriverResult<Vec<ChoiceOption>> {
        let options: Option<Vec<ChoiceOption>> = self.eval(script::options(control)).await?;
        options.ok_or_else(|| DriverError::Stale(control.to_string()))
    }

    async fn current_value(&self, control: &ControlId) -> DriverResult<Option<String>> {
        self.eval(script::current_value(control)).await
    }

    /// Native click, then the option's label, then a scripted `click()`.
    #[instrument(skip_all, fields(control = %control))]
    async fn click(&self, control: &ControlId) -> DriverResult<()> {
        let element = self.element(control).await?;
        let native_err = match self.native_click(&element).await {
            Ok(()) => return Ok(()),
            Err(err) => map_cdp_error(err),
        };
        debug!(error = %native_err, "native click failed; trying fallbacks");

        let label: Option<ControlId> = self.eval(script::option_label(control)).await?;
        if let Some(label) = label {
            if let Ok(label_element) = self.element(&label).await {
                if self.native_click(&label_element).await.is_ok() {
                    return Ok(());
                }
            }
        }

        let clicked: bool = self.eval(script::scripted_click(control)).await?;
        if clicked {
            Ok(())
        } else {
            Err(native_err)
        }
    }

    async fn clear(&self, control: &ControlId) -> DriverResult<()> {
        let cleared: bool = self.eval(script::clear(control)).await?;
        if cleared {
            Ok(())
        } else {
            Err(DriverError::NotInteractable(control.to_string()))
        }
    }

    async fn type_into(&self, control: &ControlId, text: &str) -> DriverResult<()> {
        let element = self.element(control).await?;
        element.focus().await.map_err(map_cdp_error)?;
        element.type_str(text).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn press_tab(&self, control: &ControlId) -> DriverResult<()> {
        let element = self.element(control).await?;
        element.press_key("Tab").await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn select_option(&self, control: &ControlId, value: &str) -> DriverResult<()> {
        let selected: bool = self.eval(script::select(control, value)).await?;
        if selected {
            Ok(())
        } else {
            Err(DriverError::OptionMissing(value.to_string()))
        }
    }

    async fn wait_until(&self, condition: WaitCondition, timeout: Duration) -> DriverResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let (intent, want_present) = match condition {
                WaitCondition::Present(intent) => (intent, true),
                WaitCondition::Absent(intent) => (intent, false),
            };
            // A failed probe counts as "nothing found".
            let present = self
                .find_controls(intent)
                .await
                .map(|found| !found.is_empty())
                .unwrap_or(false);
            if present == want_present {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(condition.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }

    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page.goto(url).await.map_err(|err| {
            DriverError::Protocol(format!("navigation to {url} failed: {err}"))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_messages_map_to_driver_errors() {
        assert!(matches!(
            classify_message("Element is intercepted by <div class=overlay>".into()),
            DriverError::ClickIntercepted(_)
        ));
        assert!(matches!(
            classify_message("Could not find node with given id".into()),
            DriverError::NotFound(_)
        ));
        assert!(matches!(
            classify_message("Node is detached from document".into()),
            DriverError::Stale(_)
        ));
        assert!(matches!(
            classify_message("Request timed out.".into()),
            DriverError::Timeout(_)
        ));
        assert!(matches!(
            classify_message("websocket closed".into()),
            DriverError::Protocol(_)
        ));
    }
}
