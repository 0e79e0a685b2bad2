//! LangChain: a stdio client and a client session opened on top of it.
//!
//! The two are separate resources. Teardown closes the session first, then
//! the client (and with it the process).

use anyagent_core::{AgentFramework, McpError};
use async_trait::async_trait;
use std::sync::Arc;

use super::{FrameworkAdapter, NativeTools, OpenContext, convert_tools, handshake, stdio_target};
use crate::client::McpSession;
use crate::lifecycle::{SessionResource, TransportResource};

pub(crate) struct LangchainAdapter;

#[async_trait]
impl FrameworkAdapter for LangchainAdapter {
    fn framework(&self) -> AgentFramework {
        AgentFramework::Langchain
    }

    async fn open<'a>(&self, ctx: OpenContext<'a>) -> Result<NativeTools, McpError> {
        let transport = ctx.connector.connect(&stdio_target(ctx.spec)).await?;
        ctx.resources
            .push(TransportResource::new("stdio client", Arc::clone(&transport)));

        let session = Arc::new(McpSession::new(transport));
        ctx.resources
            .push(SessionResource::new("client session", Arc::clone(&session)));

        let tools = handshake(&session).await?;
        tracing::debug!(
            handle = %ctx.handle,
            count = tools.len(),
            "Converting MCP tools for LangChain"
        );

        Ok(NativeTools {
            session,
            tools: convert_tools(tools),
        })
    }
}
