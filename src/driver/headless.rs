use super::{UiDriver, UiFuture};
use crate::error::UiError;
use std::path::Path;
use std::time::Duration;

/// Driver for runs without a browser.
///
/// Nothing is ever visible and every interaction fails fast, so each
/// dual-path action takes its control-plane path.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessDriver;

fn unavailable<T>() -> Result<T, UiError> {
    Err(UiError::Unavailable("headless mode".into()))
}

impl UiDriver for HeadlessDriver {
    fn name(&self) -> &str {
        "headless"
    }

    fn interactive(&self) -> bool {
        false
    }

    fn goto<'a>(&'a self, _url: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }

    fn is_visible<'a>(&'a self, _selector: &'a str) -> UiFuture<'a, bool> {
        Box::pin(async { Ok(false) })
    }

    fn text_of<'a>(&'a self, _selector: &'a str) -> UiFuture<'a, String> {
        Box::pin(async { unavailable() })
    }

    fn click<'a>(&'a self, _selector: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }

    fn fill<'a>(&'a self, _selector: &'a str, _value: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }

    fn set_input_files<'a>(&'a self, _selector: &'a str, _file: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }

    fn screenshot<'a>(&'a self, _path: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }

    fn page_load_ms(&self) -> UiFuture<'_, Option<u64>> {
        Box::pin(async { Ok(None) })
    }

    fn accessibility_violations(&self) -> UiFuture<'_, Vec<String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn wait_for_visible<'a>(&'a self, _selector: &'a str, _timeout: Duration) -> UiFuture<'a, ()> {
        Box::pin(async { unavailable() })
    }
}
