//! Action Interface: the UI driver and the control-plane HTTP client.

pub mod browser;
pub mod control;
pub mod headless;
pub mod scripted;
pub mod selectors;

pub use browser::AgentBrowserDriver;
pub use control::{ControlClient, ReviewDecision};
pub use headless::HeadlessDriver;
pub use scripted::ScriptedDriver;

use crate::error::UiError;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

pub type UiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UiError>> + Send + 'a>>;

/// One browser session. Selectors are CSS or agent-browser refs.
pub trait UiDriver: Send + Sync {
    fn name(&self) -> &str;

    /// False when no real page exists behind the driver.
    fn interactive(&self) -> bool {
        true
    }

    fn goto<'a>(&'a self, url: &'a str) -> UiFuture<'a, ()>;

    fn is_visible<'a>(&'a self, selector: &'a str) -> UiFuture<'a, bool>;

    fn text_of<'a>(&'a self, selector: &'a str) -> UiFuture<'a, String>;

    fn click<'a>(&'a self, selector: &'a str) -> UiFuture<'a, ()>;

    fn fill<'a>(&'a self, selector: &'a str, value: &'a str) -> UiFuture<'a, ()>;

    fn set_input_files<'a>(&'a self, selector: &'a str, file: &'a Path) -> UiFuture<'a, ()>;

    fn screenshot<'a>(&'a self, path: &'a Path) -> UiFuture<'a, ()>;

    /// Navigation-to-load time of the current page, if the browser reports it.
    fn page_load_ms(&self) -> UiFuture<'_, Option<u64>>;

    /// Human-readable accessibility findings for the current page.
    fn accessibility_violations(&self) -> UiFuture<'_, Vec<String>>;

    /// Block until `selector` is visible or `timeout` elapses.
    fn wait_for_visible<'a>(&'a self, selector: &'a str, timeout: Duration) -> UiFuture<'a, ()> {
        Box::pin(async move {
            let started = tokio::time::Instant::now();
            loop {
                if self.is_visible(selector).await.unwrap_or(false) {
                    return Ok(());
                }
                if started.elapsed() >= timeout {
                    return Err(UiError::NotVisible {
                        selector: selector.to_string(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                tokio::time::sleep(VISIBILITY_POLL_INTERVAL.min(timeout)).await;
            }
        })
    }
}

const VISIBILITY_POLL_INTERVAL: Duration = Duration::from_millis(250);
