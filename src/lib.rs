#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod actions;
pub mod assertions;
pub mod config;
pub mod driver;
pub mod error;
pub mod poll;
pub mod scenarios;
pub mod store;
pub mod verify;

pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use scenarios::{Orchestrator, ScenarioResult, ScenarioStatus, SuiteReport};
