//! Declarative MCP server specification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How to launch (or reach) an MCP server and which of its tools to use.
///
/// The spec is plain data: building one performs no I/O and no adapter ever
/// mutates it. Framework-specific shapes (a joined command line, a URL client)
/// are derived from it inside the adapter that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Executable to launch (e.g. "npx"), or a URL for HTTP-capable adapters.
    pub command: String,

    /// Arguments passed to the executable, in order.
    #[serde(default)]
    pub args: Vec<String>,

    /// Tool names to expose. `None` (or an empty set) means every tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<BTreeSet<String>>,
}

impl ServerSpec {
    /// Create a spec that exposes every tool the server advertises.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            tools: None,
        }
    }

    /// Restrict the spec to the given tool names.
    #[must_use]
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// The effective allow-list, if any.
    ///
    /// An empty set is treated the same as no allow-list.
    pub fn allow_list(&self) -> Option<&BTreeSet<String>> {
        self.tools.as_ref().filter(|tools| !tools.is_empty())
    }

    /// Whether `command` names a remote endpoint rather than an executable.
    pub fn is_remote(&self) -> bool {
        self.command.starts_with("http://") || self.command.starts_with("https://")
    }

    /// Command and arguments joined by single spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check the spec for structural problems.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.trim().is_empty() {
            return Err("MCP server command cannot be empty".to_string());
        }

        if self
            .allow_list()
            .is_some_and(|tools| tools.iter().any(|t| t.trim().is_empty()))
        {
            return Err("MCP tool names cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_means_all_tools() {
        let spec = ServerSpec::new("npx", ["-y", "server"]).with_tools(Vec::<String>::new());
        assert!(spec.tools.is_some());
        assert!(spec.allow_list().is_none());
    }

    #[test]
    fn test_command_line_joins_args() {
        let spec = ServerSpec::new("uvx", ["mcp-server-fetch", "--verbose"]);
        assert_eq!(spec.command_line(), "uvx mcp-server-fetch --verbose");
        assert_eq!(ServerSpec::new("srv", Vec::<String>::new()).command_line(), "srv");
    }

    #[test]
    fn test_validate_rejects_blank_command() {
        assert!(ServerSpec::new("  ", ["x"]).validate().is_err());
        assert!(ServerSpec::new("npx", ["x"]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_tool_name() {
        let spec = ServerSpec::new("npx", ["x"]).with_tools(["search", ""]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_is_remote() {
        assert!(ServerSpec::new("https://example.com/mcp", Vec::<String>::new()).is_remote());
        assert!(!ServerSpec::new("npx", Vec::<String>::new()).is_remote());
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let spec: ServerSpec = serde_json::from_str(r#"{"command": "echo-server"}"#).unwrap();
        assert!(spec.args.is_empty());
        assert!(spec.tools.is_none());

        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("tools"));
    }
}
