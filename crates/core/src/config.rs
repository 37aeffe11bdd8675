use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths::Paths;

/// Selector expressions bounding element enumeration.
///
/// Both are opaque to the relation layer and handed to the oracle as-is.
/// `root` drives top-level enumeration, `child` drives descendant
/// enumeration beneath a given element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeConfig {
    #[serde(default = "default_root_scope")]
    pub root: String,
    #[serde(default = "default_child_scope")]
    pub child: String,
}

fn default_root_scope() -> String {
    "*".to_string()
}

fn default_child_scope() -> String {
    "*".to_string()
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            root: default_root_scope(),
            child: default_child_scope(),
        }
    }
}

impl ScopeConfig {
    /// Returns a copy with the given override applied.
    pub fn overridden(&self, over: &ScopeOverride) -> Self {
        Self {
            root: over.root.clone().unwrap_or_else(|| self.root.clone()),
            child: over.child.clone().unwrap_or_else(|| self.child.clone()),
        }
    }
}

/// Partial scope replacement for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeOverride {
    pub root: Option<String>,
    pub child: Option<String>,
}

impl ScopeOverride {
    pub fn root(selector: impl Into<String>) -> Self {
        Self {
            root: Some(selector.into()),
            child: None,
        }
    }

    pub fn child(selector: impl Into<String>) -> Self {
        Self {
            root: None,
            child: Some(selector.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.child.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// "chrome", "edge" or "firefox".
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default)]
    pub headed: bool,
    /// Attach to an existing page target instead of launching a browser.
    #[serde(default)]
    pub ws_endpoint: Option<String>,
    #[serde(default)]
    pub user_data_dir: Option<String>,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_engine() -> String {
    "chrome".to_string()
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_startup_timeout_secs() -> u64 {
    15
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            headed: false,
            ws_endpoint: None,
            user_data_dir: None,
            command_timeout_secs: default_command_timeout_secs(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.scope.root.trim().is_empty() {
            return Err(Error::Config("scope.root must not be empty".to_string()));
        }
        if self.scope.child.trim().is_empty() {
            return Err(Error::Config("scope.child must not be empty".to_string()));
        }
        if self.browser.command_timeout_secs == 0 {
            return Err(Error::Config(
                "browser.commandTimeoutSecs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
