//! Field classification and oracle-driven fill passes.
//!
//! A pass either repairs the fields flagged by validation errors or fills every empty
//! field, batching all questions into one oracle call. Answers already applied are
//! recorded in [`TriedAnswers`] so a rejected radio choice is not picked again while the
//! same dialog stays open.

pub mod classify;
pub mod engine;
pub mod model;
pub mod radio;
pub mod tried;

pub use classify::classify;
pub use engine::DialogFillEngine;
pub use model::{ControlShape, FieldValue, FillMode, FillReport, FormField};
pub use radio::select_radio;
pub use tried::TriedAnswers;
