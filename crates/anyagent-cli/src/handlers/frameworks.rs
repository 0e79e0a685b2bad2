//! Frameworks command handler.

use anyagent_core::{AgentFramework, ToolFiltering, TransportShape};
use anyagent_mcp::is_available;
use anyhow::Result;
use serde_json::{Value, json};

use crate::presentation::{print_separator, yes_no};

/// Print every framework with its native MCP client capabilities.
pub fn execute(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&to_json())?);
        return Ok(());
    }

    println!(
        "{:<12} {:<18} {:<12} {:<8} {:<9}",
        "Framework", "Transport", "Filtering", "Converts", "Available"
    );
    print_separator(63);

    for framework in AgentFramework::ALL {
        let caps = framework.capabilities();
        println!(
            "{:<12} {:<18} {:<12} {:<8} {:<9}",
            framework.as_str(),
            transport_label(caps.transport),
            filtering_label(caps.filtering),
            yes_no(caps.converts_tools),
            yes_no(is_available(framework)),
        );
    }

    Ok(())
}

fn to_json() -> Value {
    AgentFramework::ALL
        .iter()
        .map(|framework| {
            json!({
                "framework": framework,
                "capabilities": framework.capabilities(),
                "available": is_available(*framework),
                "feature": framework.feature_name(),
            })
        })
        .collect()
}

const fn transport_label(shape: TransportShape) -> &'static str {
    match shape {
        TransportShape::StdioServer => "stdio server",
        TransportShape::ClientSession => "client + session",
        TransportShape::ManagedToolset => "managed toolset",
        TransportShape::StdioOrHttp => "stdio or http",
    }
}

const fn filtering_label(filtering: ToolFiltering) -> &'static str {
    match filtering {
        ToolFiltering::Shared => "shared",
        ToolFiltering::Native => "native",
        ToolFiltering::Unsupported => "unsupported",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lists_every_framework() {
        let value = to_json();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), AgentFramework::ALL.len());
        assert_eq!(entries[0]["framework"], "openai");
        assert_eq!(entries[0]["capabilities"]["filtering"], "unsupported");
        assert_eq!(entries[4]["framework"], "llama_index");
        assert_eq!(entries[4]["feature"], "llama-index");
    }
}
