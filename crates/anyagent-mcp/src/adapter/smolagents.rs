//! smolagents: a tool collection context opened from stdio parameters.

use anyagent_core::{AgentFramework, McpError};
use async_trait::async_trait;

use super::{FrameworkAdapter, NativeTools, OpenContext, handshake, open_server, stdio_target};

pub(crate) struct SmolagentsAdapter;

#[async_trait]
impl FrameworkAdapter for SmolagentsAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::Smolagents
    }

    async fn open<'a>(&self, mut ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let target = stdio_target(ctx.spec);
        let session = open_server(&mut ctx, "smolagents tool collection", &target).await?;
        let tools = handshake(&session).await?;

        Ok(NativeTools { session, tools })
    }
}
