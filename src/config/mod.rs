mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use schema::{
    BrowserConfig, FixturesConfig, HarnessConfig, HttpConfig, OrchestratorConfig, PollConfig,
    StoreConfig,
};
