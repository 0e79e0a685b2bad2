//! OpenAI Agents SDK: one stdio server object owning session and process.
//!
//! The SDK's stdio server has no way to restrict the tools it exposes, so the
//! allow-list is ignored here and reported by the handle.

use anyagent_core::{AgentFramework, McpError};
use async_trait::async_trait;

use super::{FrameworkAdapter, NativeTools, OpenContext, handshake, open_server, stdio_target};

pub(crate) struct OpenAiAdapter;

#[async_trait]
impl FrameworkAdapter for OpenAiAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::OpenAi
    }

    async fn open<'a>(&self, mut ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let target = stdio_target(ctx.spec);
        let session = open_server(&mut ctx, "openai mcp server", &target).await?;
        let tools = handshake(&session).await?;

        Ok(NativeTools { session, tools })
    }
}
