//! Agno: the native client takes one command line string and the allow-list.

use anyagent_core::{AgentFramework, LaunchTarget, McpError};
use async_trait::async_trait;

use super::{FrameworkAdapter, NativeTools, OpenContext, handshake, native_filter, open_server};

pub(crate) struct AgnoAdapter;

#[async_trait]
impl FrameworkAdapter for AgnoAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::Agno
    }

    async fn open<'a>(&self, mut ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let target = command_line_target(&ctx.spec.command_line())?;
        let session = open_server(&mut ctx, "agno mcp tools", &target).await?;
        let tools = handshake(&session).await?;

        Ok(NativeTools {
            session,
            tools: native_filter(tools, ctx.spec.allow_list()),
        })
    }
}

/// Split a joined command line back into program and arguments.
///
/// Arguments containing whitespace do not survive the round trip.
fn command_line_target(line: &str) -> Result<LaunchTarget, McpError> {
    let mut parts = line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| McpError::InvalidSpec("MCP server command cannot be empty".to_string()))?;
    Ok(LaunchTarget::stdio(program, parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_is_split_on_whitespace() {
        let target = command_line_target("npx -y  @scope/server --flag").unwrap();
        let LaunchTarget::Stdio { program, args, .. } = target else {
            panic!("expected stdio target");
        };
        assert_eq!(program, "npx");
        assert_eq!(args, vec!["-y", "@scope/server", "--flag"]);
    }

    #[test]
    fn test_blank_command_line_is_rejected() {
        assert!(matches!(
            command_line_target("   "),
            Err(McpError::InvalidSpec(_))
        ));
    }
}
