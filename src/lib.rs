//! EasyApply library
//!
//! Configuration, batch runner and CLI surfaces around the form-filling crates.

pub mod app_settings;
pub mod batch;
pub mod cli;

pub use app_settings::{BatchSettings, Config, OracleSettings};
pub use batch::{collect_jobs, parse_job_list, BatchReport, BatchRunner, BatchSummary};
