//! Bridge configuration parsing.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use hybrid_abi::{ConfinedContext, ContextError, HostContext, InlineContext};

/// Bridge configuration loaded from a TOML file.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Proxy behavior.
    pub proxy: ProxyConfig,
    /// Where objects created by registered factories run.
    pub context: ContextConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Proxy behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Memoize resolved host member handles per proxy until release.
    pub cache_member_handles: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            cache_member_handles: true,
        }
    }
}

/// How the host execution context is set up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Host code runs on the calling thread.
    #[default]
    Inline,
    /// Host code runs on one dedicated thread.
    Confined,
}

/// Host execution context settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub mode: ContextMode,
    /// Thread name for the confined context.
    pub thread_name: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            mode: ContextMode::Inline,
            thread_name: "hybrid-host".to_string(),
        }
    }
}

impl ContextConfig {
    /// Create the host context this configuration describes.
    pub fn build(&self) -> Result<Arc<dyn HostContext>, ContextError> {
        match self.mode {
            ContextMode::Inline => Ok(Arc::new(InlineContext)),
            ContextMode::Confined => {
                let context: Arc<dyn HostContext> = ConfinedContext::spawn(self.thread_name.clone())?;
                Ok(context)
            }
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "hybrid_bridge=debug".
    pub level: String,
    pub format: LogFormat,
    /// "stdout", "stderr" or a file path.
    pub output: String,
    pub timestamps: bool,
    /// Include the event target (module path).
    pub target: bool,
    /// ANSI colors when writing to a terminal.
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            output: "stderr".to_string(),
            timestamps: true,
            target: false,
            color: true,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(String, std::io::Error),
    /// TOML parse error.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read config file '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
