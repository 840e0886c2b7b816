use super::types::{
    AgentBrowserResponse, BrowserCommand, decode_output, parse_eval, parse_text, parse_visible,
};
use crate::driver::{UiDriver, UiFuture};
use crate::error::UiError;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const DEFAULT_BINARY: &str = "agent-browser";

const PAGE_LOAD_SCRIPT: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.loadEventEnd > 0 ? Math.round(nav.loadEventEnd - nav.startTime) : null; \
})()";

const ACCESSIBILITY_SCRIPT: &str = "(() => { \
    const found = []; \
    document.querySelectorAll('img:not([alt])').forEach((el) => \
        found.push('image without alt text: ' + (el.getAttribute('src') || '?'))); \
    document.querySelectorAll('button').forEach((el) => { \
        if (!el.textContent.trim() && !el.getAttribute('aria-label')) \
            found.push('button without accessible name'); \
    }); \
    document.querySelectorAll('input:not([type=hidden]):not([aria-label])').forEach((el) => { \
        if (!el.id || !document.querySelector('label[for=\"' + el.id + '\"]')) \
            found.push('input without label: ' + (el.getAttribute('name') || el.type)); \
    }); \
    return found; \
})()";

/// UI driver backed by the agent-browser CLI.
///
/// Each call spawns one `agent-browser <command> --json`; the named session
/// keeps the page alive between calls.
pub struct AgentBrowserDriver {
    binary: String,
    session: Option<String>,
}

impl AgentBrowserDriver {
    pub fn new(session: Option<String>) -> Self {
        Self::with_binary(DEFAULT_BINARY, session)
    }

    pub fn with_binary(binary: impl Into<String>, session: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            session,
        }
    }

    /// True when the binary answers `--version`.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    fn invocation(&self, command: &BrowserCommand) -> Vec<String> {
        let mut argv = Vec::new();
        if let Some(session) = &self.session {
            argv.extend(["--session".to_string(), session.clone()]);
        }
        argv.extend(command.args());
        argv.push("--json".into());
        argv
    }

    async fn run_command(&self, command: &BrowserCommand) -> Result<AgentBrowserResponse, UiError> {
        let argv = self.invocation(command);
        debug!(binary = %self.binary, argv = ?argv, "agent-browser");

        let output = Command::new(&self.binary)
            .args(&argv)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| UiError::Unavailable(format!("{}: {e}", self.binary)))?;

        Ok(decode_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ))
    }

    /// Run `command` and turn an unsuccessful response into an error.
    async fn execute(&self, command: BrowserCommand) -> Result<Option<Value>, UiError> {
        let response = self.run_command(&command).await?;
        if response.success {
            Ok(response.data)
        } else {
            Err(UiError::Command {
                command: command.label().to_string(),
                message: response
                    .error
                    .unwrap_or_else(|| "agent-browser reported failure".into()),
            })
        }
    }

    pub async fn close(&self) -> Result<(), UiError> {
        self.execute(BrowserCommand::Close).await.map(|_| ())
    }
}

impl UiDriver for AgentBrowserDriver {
    fn name(&self) -> &str {
        "agent-browser"
    }

    fn goto<'a>(&'a self, url: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.execute(BrowserCommand::Open { url: url.into() })
                .await
                .map(|_| ())
        })
    }

    fn is_visible<'a>(&'a self, selector: &'a str) -> UiFuture<'a, bool> {
        Box::pin(async move {
            let response = self
                .run_command(&BrowserCommand::IsVisible {
                    selector: selector.into(),
                })
                .await?;
            // A missing element is reported as a failed command, not an error.
            Ok(response.success && parse_visible(response.data.as_ref()))
        })
    }

    fn text_of<'a>(&'a self, selector: &'a str) -> UiFuture<'a, String> {
        Box::pin(async move {
            let data = self
                .execute(BrowserCommand::GetText {
                    selector: selector.into(),
                })
                .await?;
            Ok(parse_text(data.as_ref()))
        })
    }

    fn click<'a>(&'a self, selector: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.execute(BrowserCommand::Click {
                selector: selector.into(),
            })
            .await
            .map(|_| ())
        })
    }

    fn fill<'a>(&'a self, selector: &'a str, value: &'a str) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.execute(BrowserCommand::Fill {
                selector: selector.into(),
                value: value.into(),
            })
            .await
            .map(|_| ())
        })
    }

    fn set_input_files<'a>(&'a self, selector: &'a str, file: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async move {
            self.execute(BrowserCommand::Upload {
                selector: selector.into(),
                file: file.display().to_string(),
            })
            .await
            .map(|_| ())
        })
    }

    fn screenshot<'a>(&'a self, path: &'a Path) -> UiFuture<'a, ()> {
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            self.execute(BrowserCommand::Screenshot {
                path: path.display().to_string(),
            })
            .await
            .map(|_| ())
        })
    }

    fn page_load_ms(&self) -> UiFuture<'_, Option<u64>> {
        Box::pin(async move {
            let data = self
                .execute(BrowserCommand::Eval {
                    script: PAGE_LOAD_SCRIPT.into(),
                })
                .await?;
            Ok(parse_eval(data.as_ref()).as_u64())
        })
    }

    fn accessibility_violations(&self) -> UiFuture<'_, Vec<String>> {
        Box::pin(async move {
            let data = self
                .execute(BrowserCommand::Eval {
                    script: ACCESSIBILITY_SCRIPT.into(),
                })
                .await?;
            Ok(match parse_eval(data.as_ref()) {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => text,
                        other => other.to_string(),
                    })
                    .collect(),
                _ => Vec::new(),
            })
        })
    }
}
