//! Submission state machine for multi-step application dialogs.
//!
//! `NoDialog -> AwaitingFill` when the apply trigger opens a dialog, then repeated
//! submit or advance attempts with bounded repair loops until `Submitted` or
//! `Abandoned`. Step failures are absorbed into the job outcome and never propagate.

pub mod errors;
pub mod machine;
pub mod policy;
pub mod state;

pub use errors::{FlowError, FlowResult};
pub use machine::{JobReport, SubmissionMachine};
pub use policy::FlowPolicy;
pub use state::{AbandonReason, ApplyOutcome, DialogState};
