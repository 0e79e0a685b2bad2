//! MCP tools configuration and validation.
//!
//! A config file names the target framework once and lists the MCP servers an
//! agent should be wired to:
//!
//! ```json
//! {
//!   "framework": "langchain",
//!   "servers": [
//!     {"command": "uvx", "args": ["mcp-server-fetch"], "tools": ["fetch"]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{AgentFramework, ServerSpec};

/// Environment variable that overrides the configured framework.
pub const FRAMEWORK_ENV_VAR: &str = "ANYAGENT_FRAMEWORK";

/// Framework plus the MCP servers to attach to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolsConfig {
    /// Framework whose adapter launches every server.
    pub framework: AgentFramework,

    /// Servers to launch, in order.
    #[serde(default)]
    pub servers: Vec<ServerSpec>,
}

/// Configuration loading/validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse MCP tools config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid ANYAGENT_FRAMEWORK value: {0}")]
    UnknownFramework(String),

    #[error("MCP server #{index} is invalid: {reason}")]
    InvalidServer { index: usize, reason: String },
}

impl McpToolsConfig {
    /// Create a config with no servers.
    pub const fn new(framework: AgentFramework) -> Self {
        Self {
            framework,
            servers: Vec::new(),
        }
    }

    /// Add a server.
    #[must_use]
    pub fn with_server(mut self, spec: ServerSpec) -> Self {
        self.servers.push(spec);
        self
    }

    /// Parse a config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a config file, apply the environment override and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_json_str(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            framework = %config.framework,
            server_count = config.servers.len(),
            "Loaded MCP tools config"
        );

        Ok(config)
    }

    /// Apply `ANYAGENT_FRAMEWORK` if it is set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_framework_override(std::env::var(FRAMEWORK_ENV_VAR).ok().as_deref())
    }

    /// Replace the framework with `value` when present and non-empty.
    pub fn apply_framework_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(());
        };

        let framework = value
            .parse::<AgentFramework>()
            .map_err(ConfigError::UnknownFramework)?;

        if framework != self.framework {
            tracing::info!(
                from = %self.framework,
                to = %framework,
                "Framework overridden from environment"
            );
            self.framework = framework;
        }

        Ok(())
    }

    /// Validate every server spec.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, spec) in self.servers.iter().enumerate() {
            spec.validate()
                .map_err(|reason| ConfigError::InvalidServer { index, reason })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "framework": "google",
        "servers": [
            {"command": "echo-server", "args": ["--port", "0"], "tools": ["search", "fetch"]},
            {"command": "uvx", "args": ["mcp-server-time"]}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = McpToolsConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.framework, AgentFramework::Google);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].args, vec!["--port", "0"]);
        assert_eq!(config.servers[0].allow_list().map(|t| t.len()), Some(2));
        assert!(config.servers[1].allow_list().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = McpToolsConfig::load(file.path()).unwrap();
        assert_eq!(config.servers[1].command, "uvx");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = McpToolsConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_unknown_framework_is_parse_error() {
        let err = McpToolsConfig::from_json_str(r#"{"framework": "crewai"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_framework_override() {
        let mut config = McpToolsConfig::new(AgentFramework::OpenAi);

        config.apply_framework_override(None).unwrap();
        assert_eq!(config.framework, AgentFramework::OpenAi);

        config.apply_framework_override(Some("  ")).unwrap();
        assert_eq!(config.framework, AgentFramework::OpenAi);

        config.apply_framework_override(Some("agno")).unwrap();
        assert_eq!(config.framework, AgentFramework::Agno);

        let err = config.apply_framework_override(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFramework(_)));
    }

    #[test]
    fn test_validate_reports_index() {
        let config = McpToolsConfig::new(AgentFramework::Smolagents)
            .with_server(ServerSpec::new("ok", Vec::<String>::new()))
            .with_server(ServerSpec::new("", Vec::<String>::new()));

        match config.validate() {
            Err(ConfigError::InvalidServer { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidServer, got {other:?}"),
        }
    }
}
