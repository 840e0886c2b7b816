use super::{UiDriver, UiFuture};
use crate::error::UiError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type ClickHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Page {
    visible: HashSet<String>,
    texts: HashMap<String, String>,
    hooks: HashMap<String, ClickHook>,
    visited: Vec<String>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    uploads: Vec<(String, PathBuf)>,
    screenshots: Vec<PathBuf>,
    page_load_ms: Option<u64>,
    violations: Vec<String>,
}

/// In-process driver over a scripted page.
///
/// Elements are visible once [`show`](Self::show)n. Clicking an element runs its
/// hook, which is how a simulated app reacts to UI actions. Clones share the page.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    page: Arc<Mutex<Page>>,
}

impl std::fmt::Debug for ScriptedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedDriver").finish_non_exhaustive()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn page(&self) -> Result<MutexGuard<'_, Page>, UiError> {
        self.page
            .lock()
            .map_err(|_| UiError::Unavailable("scripted page lock poisoned".into()))
    }

    fn with_page<T>(&self, f: impl FnOnce(&mut Page) -> T) -> Option<T> {
        self.page.lock().ok().map(|mut page| f(&mut page))
    }

    pub fn show(&self, selector: impl Into<String>) -> &Self {
        self.with_page(|p| p.visible.insert(selector.into()));
        self
    }

    pub fn hide(&self, selector: &str) -> &Self {
        self.with_page(|p| p.visible.remove(selector));
        self
    }

    /// Make `selector` visible with `text` as its content.
    pub fn set_text(&self, selector: impl Into<String>, text: impl Into<String>) -> &Self {
        let selector = selector.into();
        self.with_page(|p| {
            p.visible.insert(selector.clone());
            p.texts.insert(selector, text.into());
        });
        self
    }

    pub fn on_click(&self, selector: impl Into<String>, hook: impl Fn() + Send + Sync + 'static) {
        self.with_page(|p| p.hooks.insert(selector.into(), Arc::new(hook)));
    }

    pub fn set_page_load_ms(&self, ms: Option<u64>) {
        self.with_page(|p| p.page_load_ms = ms);
    }

    pub fn set_violations(&self, violations: Vec<String>) {
        self.with_page(|p| p.violations = violations);
    }

    pub fn visited(&self) -> Vec<String> {
        self.with_page(|p| p.visited.clone()).unwrap_or_default()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.with_page(|p| p.clicks.clone()).unwrap_or_default()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.with_page(|p| p.fills.clone()).unwrap_or_default()
    }

    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.with_page(|p| p.uploads.clone()).unwrap_or_default()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.with_page(|p| p.screenshots.clone()).unwrap_or_default()
    }

    fn require_visible(&self, selector: &str) -> Result<(), UiError> {
        if self.page()?.visible.contains(selector) {
            Ok(())
        } else {
            Err(UiError::Command {
                command: "locate".into(),
                message: format!("element not found: {selector}"),
            })
        }
    }
}

impl UiDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn goto<'a>(&'a self, url: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.page()?.visited.push(url.to_string());
            Ok(())
        })
    }

    fn is_visible<'a>(&'a self, selector: &'a str) -> UiFuture<'a, bool> {
        Box::pin(async move { Ok(self.page()?.visible.contains(selector)) })
    }

    fn text_of<'a>(&'a self, selector: &'a str) -> UiFuture<'a, String> {
        Box::pin(async move {
            self.require_visible(selector)?;
            Ok(self.page()?.texts.get(selector).cloned().unwrap_or_default())
        })
    }

    fn click<'a>(&'a self, selector: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.require_visible(selector)?;
            let hook = {
                let mut page = self.page()?;
                page.clicks.push(selector.to_string());
                page.hooks.get(selector).cloned()
            };
            if let Some(hook) = hook {
                hook();
            }
            Ok(())
        })
    }

    fn fill<'a>(&'a self, selector: &'a str, value: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.require_visible(selector)?;
            self.page()?
                .fills
                .push((selector.to_string(), value.to_string()));
            Ok(())
        })
    }

    fn set_input_files<'a>(&'a self, selector: &'a str, file: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.require_visible(selector)?;
            self.page()?
                .uploads
                .push((selector.to_string(), file.to_path_buf()));
            Ok(())
        })
    }

    fn screenshot<'a>(&'a self, path: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.page()?.screenshots.push(path.to_path_buf());
            Ok(())
        })
    }

    fn page_load_ms(&self) -> UiFuture<'_, Option<u64>> {
        Box::pin(async move { Ok(self.page()?.page_load_ms) })
    }

    fn accessibility_violations(&self) -> UiFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.page()?.violations.clone()) })
    }
}
