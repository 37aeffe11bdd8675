pub mod config;
pub mod error;
pub mod oracle;
pub mod paths;
pub mod types;

pub use config::{BrowserConfig, Config, ScopeConfig, ScopeOverride};
pub use error::{Error, OracleError, Result};
pub use oracle::{Oracle, OracleResult};
pub use paths::Paths;
pub use types::{ElementHandle, Location, Size};
