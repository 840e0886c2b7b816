mod driver;
mod types;

pub use driver::AgentBrowserDriver;
pub use types::{AgentBrowserResponse, BrowserCommand};
