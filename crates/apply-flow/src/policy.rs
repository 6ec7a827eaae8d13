use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry bounds and pacing for one application attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowPolicy {
    /// Repair iterations after a submit or advance click that left the dialog unresolved.
    pub repair_attempts: u32,
    /// Pause before each inspection so the UI can settle.
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for the dialog to close after a click.
    pub post_click_delay_ms: u64,
    pub dialog_wait_ms: u64,
    pub apply_wait_ms: u64,
    /// Outer iterations per job before giving up.
    pub step_limit: u32,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            repair_attempts: 3,
            settle_delay_ms: 500,
            post_click_delay_ms: 800,
            dialog_wait_ms: 2_000,
            apply_wait_ms: 2_000,
            step_limit: 25,
        }
    }
}

impl FlowPolicy {
    /// Same bounds with every delay zeroed.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            post_click_delay_ms: 0,
            dialog_wait_ms: 0,
            apply_wait_ms: 0,
            ..Self::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn post_click_delay(&self) -> Duration {
        Duration::from_millis(self.post_click_delay_ms)
    }

    pub fn dialog_wait(&self) -> Duration {
        Duration::from_millis(self.dialog_wait_ms)
    }

    pub fn apply_wait(&self) -> Duration {
        Duration::from_millis(self.apply_wait_ms)
    }
}
