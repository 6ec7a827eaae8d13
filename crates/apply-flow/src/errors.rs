//! Step-level error types

use dialog_driver::{DriverError, SelectorIntent};
use thiserror::Error;

/// Failure of a single step. Never escapes a job; the machine turns it into a transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// No visible, enabled element for the affordance
    #[error("Affordance unavailable: {0}")]
    AffordanceMissing(SelectorIntent),

    #[error("Dialog did not open")]
    DialogNotOpened,
}

pub type FlowResult<T> = Result<T, FlowError>;
