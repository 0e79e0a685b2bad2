//! LlamaIndex: a basic client that talks stdio, or HTTP when the command is a
//! URL, and takes the allow-list in its constructor.

use anyagent_core::{AgentFramework, LaunchTarget, McpError};
use async_trait::async_trait;

use super::{
    FrameworkAdapter, NativeTools, OpenContext, handshake, native_filter, open_server,
    stdio_target,
};

pub(crate) struct LlamaIndexAdapter;

#[async_trait]
impl FrameworkAdapter for LlamaIndexAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::LlamaIndex
    }

    async fn open<'a>(&self, mut ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let target = if ctx.spec.is_remote() {
            LaunchTarget::http(ctx.spec.command.as_str())
        } else {
            stdio_target(ctx.spec)
        };

        let session = open_server(&mut ctx, "llama_index mcp client", &target).await?;
        let tools = handshake(&session).await?;

        Ok(NativeTools {
            session,
            tools: native_filter(tools, ctx.spec.allow_list()),
        })
    }
}
