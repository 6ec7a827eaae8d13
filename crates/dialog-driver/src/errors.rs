//! Error types for dialog driver operations

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// No element matched, or the handle no longer resolves
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Handle points at a node detached by a re-render
    #[error("Stale element: {0}")]
    Stale(String),

    /// Element is hidden, disabled or otherwise not interactable
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// Another element received the click
    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    /// Wait condition was not met before the deadline
    #[error("Wait timeout: {0}")]
    Timeout(String),

    /// Requested option does not exist on the control
    #[error("Option not found: {0}")]
    OptionMissing(String),

    /// Browser protocol or script evaluation failure
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Errors a caller recovers from by skipping the current action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::NotFound(_)
                | DriverError::Stale(_)
                | DriverError::NotInteractable(_)
                | DriverError::ClickIntercepted(_)
                | DriverError::Timeout(_)
        )
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_errors_are_transient() {
        assert!(DriverError::Stale("s0-f1".into()).is_transient());
        assert!(DriverError::ClickIntercepted("submit".into()).is_transient());
        assert!(!DriverError::Protocol("socket closed".into()).is_transient());
        assert!(!DriverError::OptionMissing("Blue".into()).is_transient());
    }
}
