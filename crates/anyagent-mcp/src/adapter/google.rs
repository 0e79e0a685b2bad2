//! Google ADK: a managed toolset that owns its own session.

use anyagent_core::{AgentFramework, McpError};
use async_trait::async_trait;

use super::{
    FrameworkAdapter, NativeTools, OpenContext, convert_tools, handshake, open_server,
    stdio_target,
};

pub(crate) struct GoogleAdapter;

#[async_trait]
impl FrameworkAdapter for GoogleAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::Google
    }

    async fn open<'a>(&self, mut ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let target = stdio_target(ctx.spec);
        let session = open_server(&mut ctx, "google mcp toolset", &target).await?;
        let tools = handshake(&session).await?;

        Ok(NativeTools {
            session,
            tools: convert_tools(tools),
        })
    }
}
