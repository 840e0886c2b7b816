use super::HarnessConfig;

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl HarnessConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("HITL_BASE_URL").or_else(|_| std::env::var("BASE_URL"))
            && !url.is_empty()
        {
            self.orchestrator.base_url = url;
        }

        if let Ok(name) = std::env::var("HITL_PROJECT_NAME")
            && !name.is_empty()
        {
            self.orchestrator.project_name = Some(name);
        }

        if let Ok(url) = std::env::var("HITL_DATABASE_URL")
            && !url.is_empty()
        {
            self.store.database_url = url;
        }

        if let Some(enabled) = env_flag("HITL_ENABLE_EDIT_TESTS") {
            self.orchestrator.enable_edit_tests = enabled;
        }

        if let Some(enabled) = env_flag("HITL_ENABLE_A11Y_TESTS") {
            self.orchestrator.enable_accessibility_tests = enabled;
        }

        if let Some(enabled) = env_flag("HITL_SCREENSHOTS") {
            self.orchestrator.screenshot_on_failure = enabled;
        }

        if let Some(enabled) = env_flag("HITL_BROWSER") {
            self.browser.enabled = enabled;
        }
    }
}
