use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Response from agent-browser --json commands
#[derive(Debug, Deserialize)]
pub struct AgentBrowserResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

/// Browser commands the harness issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    /// Navigate to a URL
    Open { url: String },
    /// Check if element is visible
    IsVisible { selector: String },
    /// Get text content of element
    GetText { selector: String },
    /// Click an element by ref or selector
    Click { selector: String },
    /// Fill a form field
    Fill { selector: String, value: String },
    /// Set files on a file input or drop target
    Upload { selector: String, file: String },
    /// Take screenshot
    Screenshot { path: String },
    /// Evaluate a script in the page
    Eval { script: String },
    /// Close browser
    Close,
}

impl BrowserCommand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::IsVisible { .. } => "is visible",
            Self::GetText { .. } => "get text",
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::Upload { .. } => "upload",
            Self::Screenshot { .. } => "screenshot",
            Self::Eval { .. } => "eval",
            Self::Close => "close",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Open { url } => vec!["open".to_string(), url.clone()],
            Self::IsVisible { selector } => {
                vec!["is".to_string(), "visible".to_string(), selector.clone()]
            }
            Self::GetText { selector } => {
                vec!["get".to_string(), "text".to_string(), selector.clone()]
            }
            Self::Click { selector } => vec!["click".to_string(), selector.clone()],
            Self::Fill { selector, value } => {
                vec!["fill".to_string(), selector.clone(), value.clone()]
            }
            Self::Upload { selector, file } => {
                vec!["upload".to_string(), selector.clone(), file.clone()]
            }
            Self::Screenshot { path } => vec!["screenshot".to_string(), path.clone()],
            Self::Eval { script } => vec!["eval".to_string(), script.clone()],
            Self::Close => vec!["close".to_string()],
        }
    }
}

/// JSON output wins; otherwise plain stdout counts as success and stderr as the
/// failure message.
pub(super) fn decode_output(exited_ok: bool, stdout: &str, stderr: &str) -> AgentBrowserResponse {
    if !stderr.trim().is_empty() {
        debug!(stderr = stderr.trim(), "agent-browser stderr");
    }
    if let Ok(response) = serde_json::from_str::<AgentBrowserResponse>(stdout.trim()) {
        return response;
    }
    if exited_ok {
        AgentBrowserResponse {
            success: true,
            data: Some(json!({ "output": stdout.trim() })),
            error: None,
        }
    } else {
        let message = if stderr.trim().is_empty() { stdout } else { stderr };
        AgentBrowserResponse {
            success: false,
            data: None,
            error: Some(message.trim().to_string()),
        }
    }
}

/// `data[key]` when `data` is an object carrying it, otherwise `data` itself.
pub(super) fn payload<'a>(data: &'a Value, key: &str) -> &'a Value {
    match data.get(key) {
        Some(inner) => inner,
        None => data.get("output").unwrap_or(data),
    }
}

pub(super) fn parse_visible(data: Option<&Value>) -> bool {
    let Some(data) = data else {
        return false;
    };
    match payload(data, "visible") {
        Value::Bool(visible) => *visible,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub(super) fn parse_text(data: Option<&Value>) -> String {
    let Some(data) = data else {
        return String::new();
    };
    match payload(data, "text") {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(super) fn parse_eval(data: Option<&Value>) -> Value {
    data.map_or(Value::Null, |data| payload(data, "result").clone())
}
