//! Browser/DOM driver port for application dialogs.
//!
//! [`DialogDriver`] is the only surface the fill engine and the submission machine see.
//! Two backends ship here: [`InMemoryDialogDriver`] (scripted pages for tests and dry
//! runs) and [`CdpDialogDriver`] (a Chromium tab via chromiumoxide).

pub mod cdp;
pub mod errors;
pub mod memory;
pub mod model;
pub mod ports;
pub mod session;

mod script;

pub use cdp::CdpDialogDriver;
pub use easyapply_core_types::ControlId;
pub use errors::{DriverError, DriverResult};
pub use memory::{
    DriverAction, FieldShape, InMemoryDialogDriver, MemoryField, MemoryPage, MemoryStep,
    StepAction, MEMORY_URL,
};
pub use model::{
    ChoiceOption, ControlInfo, ControlTag, GroupKind, SelectorIntent, SelectorSet, WaitCondition,
};
pub use ports::DialogDriver;
pub use session::{BrowserOptions, BrowserSession};
