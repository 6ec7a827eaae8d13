use std::fmt;

use serde::Serialize;

/// Position of one application attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    NoDialog,
    AwaitingFill,
    Submitting,
    Advancing,
    Submitted,
    Abandoned,
}

impl DialogState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DialogState::Submitted | DialogState::Abandoned)
    }

    pub fn label(self) -> &'static str {
        match self {
            DialogState::NoDialog => "no_dialog",
            DialogState::AwaitingFill => "awaiting_fill",
            DialogState::Submitting => "submitting",
            DialogState::Advancing => "advancing",
            DialogState::Submitted => "submitted",
            DialogState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    /// Dialog stayed open through every submit retry.
    SubmitRetriesExhausted,
    /// Fields stayed pending through every advance retry.
    AdvanceRetriesExhausted,
    /// Neither submit nor advance was actionable.
    Blocked,
    /// Dialog disappeared without a submit.
    DialogClosed,
    /// Per-job step limit reached.
    StepLimit,
}

impl AbandonReason {
    pub fn label(self) -> &'static str {
        match self {
            AbandonReason::SubmitRetriesExhausted => "submit_retries_exhausted",
            AbandonReason::AdvanceRetriesExhausted => "advance_retries_exhausted",
            AbandonReason::Blocked => "blocked",
            AbandonReason::DialogClosed => "dialog_closed",
            AbandonReason::StepLimit => "step_limit",
        }
    }
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final result of one job.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Submitted,
    Abandoned(AbandonReason),
    /// Apply trigger missing or dialog never appeared.
    NoDialog,
    NavigationFailed(String),
}

impl ApplyOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ApplyOutcome::Submitted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplyOutcome::Submitted => "submitted",
            ApplyOutcome::Abandoned(_) => "abandoned",
            ApplyOutcome::NoDialog => "no_dialog",
            ApplyOutcome::NavigationFailed(_) => "navigation_failed",
        }
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Abandoned(reason) => write!(f, "abandoned ({reason})"),
            ApplyOutcome::NavigationFailed(reason) => write!(f, "navigation_failed ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}
