//! Agent framework tags and the capabilities of their native MCP clients.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent orchestration framework an MCP server is being wired into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFramework {
    /// OpenAI Agents SDK
    #[serde(rename = "openai")]
    OpenAi,
    /// Hugging Face smolagents
    Smolagents,
    /// LangChain / LangGraph
    Langchain,
    /// Google Agent Development Kit
    Google,
    /// LlamaIndex
    LlamaIndex,
    /// Agno
    Agno,
}

/// How an adapter's native client handles tool allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFiltering {
    /// The full list is fetched and filtered by the shared lifecycle logic.
    Shared,
    /// The allow-list is handed to the native client, which filters itself;
    /// the shared logic only verifies the result.
    Native,
    /// The native client cannot filter. Every tool is exposed and a warning
    /// is emitted.
    Unsupported,
}

/// Shape of the native connection object an adapter manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportShape {
    /// One server object owning both the session and the child process.
    StdioServer,
    /// A stdio client and a separately opened client session.
    ClientSession,
    /// A higher-level toolset object that manages its own session.
    ManagedToolset,
    /// A basic client that speaks stdio or HTTP depending on the command.
    StdioOrHttp,
}

/// Static description of what a framework's native MCP client supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkCapabilities {
    /// Native connection shape.
    pub transport: TransportShape,
    /// Allow-list handling.
    pub filtering: ToolFiltering,
    /// Whether listed tools need an explicit conversion step before the
    /// framework's agents can use them.
    pub converts_tools: bool,
    /// Whether the native client takes a single command line string instead of
    /// a command plus argument vector.
    pub joins_command_line: bool,
}

impl AgentFramework {
    /// Every supported framework, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::OpenAi,
        Self::Smolagents,
        Self::Langchain,
        Self::Google,
        Self::LlamaIndex,
        Self::Agno,
    ];

    /// Stable identifier used in config files and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Smolagents => "smolagents",
            Self::Langchain => "langchain",
            Self::Google => "google",
            Self::LlamaIndex => "llama_index",
            Self::Agno => "agno",
        }
    }

    /// Cargo feature of `anyagent-mcp` that compiles this framework's adapter.
    pub const fn feature_name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Smolagents => "smolagents",
            Self::Langchain => "langchain",
            Self::Google => "google",
            Self::LlamaIndex => "llama-index",
            Self::Agno => "agno",
        }
    }

    /// Capabilities of this framework's native MCP client.
    pub const fn capabilities(self) -> FrameworkCapabilities {
        match self {
            Self::OpenAi => FrameworkCapabilities {
                transport: TransportShape::StdioServer,
                filtering: ToolFiltering::Unsupported,
                converts_tools: false,
                joins_command_line: false,
            },
            Self::Smolagents => FrameworkCapabilities {
                transport: TransportShape::StdioServer,
                filtering: ToolFiltering::Shared,
                converts_tools: false,
                joins_command_line: false,
            },
            Self::Langchain => FrameworkCapabilities {
                transport: TransportShape::ClientSession,
                filtering: ToolFiltering::Shared,
                converts_tools: true,
                joins_command_line: false,
            },
            Self::Google => FrameworkCapabilities {
                transport: TransportShape::ManagedToolset,
                filtering: ToolFiltering::Shared,
                converts_tools: true,
                joins_command_line: false,
            },
            Self::LlamaIndex => FrameworkCapabilities {
                transport: TransportShape::StdioOrHttp,
                filtering: ToolFiltering::Native,
                converts_tools: false,
                joins_command_line: false,
            },
            Self::Agno => FrameworkCapabilities {
                transport: TransportShape::StdioServer,
                filtering: ToolFiltering::Native,
                converts_tools: false,
                joins_command_line: true,
            },
        }
    }
}

impl fmt::Display for AgentFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|framework| framework.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                format!("Unknown agent framework '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_identifiers() {
        for framework in AgentFramework::ALL {
            assert_eq!(framework.as_str().parse::<AgentFramework>(), Ok(framework));
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_dashes() {
        assert_eq!("LLAMA-INDEX".parse::<AgentFramework>(), Ok(AgentFramework::LlamaIndex));
        assert_eq!(" OpenAI ".parse::<AgentFramework>(), Ok(AgentFramework::OpenAi));
    }

    #[test]
    fn test_parse_unknown_lists_choices() {
        let err = "crewai".parse::<AgentFramework>().unwrap_err();
        assert!(err.contains("crewai"));
        assert!(err.contains("smolagents"));
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&AgentFramework::LlamaIndex).unwrap();
        assert_eq!(json, "\"llama_index\"");
        let parsed: AgentFramework = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(parsed, AgentFramework::OpenAi);
    }

    #[test]
    fn test_only_openai_lacks_filtering() {
        let unsupported: Vec<_> = AgentFramework::ALL
            .into_iter()
            .filter(|f| f.capabilities().filtering == ToolFiltering::Unsupported)
            .collect();
        assert_eq!(unsupported, vec![AgentFramework::OpenAi]);
    }
}
