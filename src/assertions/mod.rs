//! Named assertions over store and UI evidence.
//!
//! Every assertion returns what it observed or fails with
//! [`HarnessError::Assertion`], and logs one confirmation line on success.

mod checks;
mod state;
mod store;
mod ui;

pub use checks::SoftCheck;
pub use state::ProjectExpectations;

use crate::driver::UiDriver;
use crate::store::ProjectStore;
use std::time::Duration;

pub struct Assertions<'h> {
    store: &'h dyn ProjectStore,
    ui: &'h dyn UiDriver,
    ui_timeout: Duration,
}

impl<'h> Assertions<'h> {
    pub fn new(store: &'h dyn ProjectStore, ui: &'h dyn UiDriver, ui_timeout: Duration) -> Self {
        Self {
            store,
            ui,
            ui_timeout,
        }
    }
}
