//! Per-framework adapters.
//!
//! Each agent framework wires an MCP server in through its own native client
//! shape. An adapter reproduces that shape: which transport gets opened, which
//! resources are held (and so released on teardown), whether the allow-list is
//! applied natively and whether tools need converting. Everything else, the
//! allow-list semantics, events and state transitions, lives once in
//! [`ServerHandle`](crate::ServerHandle).
//!
//! Adapters are compiled per cargo feature. Asking for one that was compiled
//! out fails with [`McpError::DependencyMissing`] before anything is spawned.

use anyagent_core::{
    AgentFramework, HandleId, LaunchTarget, McpError, McpTool, ServerSpec, TransportConnector,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::client::McpSession;
use crate::lifecycle::{ResourceStack, ServerResource};

#[cfg(feature = "agno")]
mod agno;
#[cfg(feature = "google")]
mod google;
#[cfg(feature = "langchain")]
mod langchain;
#[cfg(feature = "llama-index")]
mod llama_index;
#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "smolagents")]
mod smolagents;

/// Everything an adapter needs while opening a server.
///
/// Resources must be pushed onto `resources` as soon as they are acquired so
/// that an abandoned setup still leaves them reachable by teardown.
pub(crate) struct OpenContext<'a> {
    pub handle: HandleId,
    pub spec: &'a ServerSpec,
    pub connector: &'a dyn TransportConnector,
    pub resources: &'a mut ResourceStack,
}

/// What an adapter hands back: a live session and the tools its native client
/// would expose.
pub(crate) struct NativeTools {
    pub session: Arc<McpSession>,
    pub tools: Vec<McpTool>,
}

/// Framework-specific way of opening an MCP server.
#[async_trait]
pub(crate) trait FrameworkAdapter: Send + Sync {
    fn framework(&self) -> AgentFramework;

    /// Open the transport, run the handshake and list tools.
    async fn open<'a>(&self, ctx: OpenContext<'a>) -> Result<NativeTools, McpError>;
}

/// Select the adapter for a framework.
pub(crate) fn adapter_for(
    framework: AgentFramework,
) -> Result<Box<dyn FrameworkAdapter>, McpError> {
    require_adapter(framework, compiled_adapter(framework))
}

/// The adapter built into this binary, if its feature was enabled.
fn compiled_adapter(framework: AgentFramework) -> Option<Box<dyn FrameworkAdapter>> {
    match framework {
        #[cfg(feature = "openai")]
        AgentFramework::OpenAi => Some(Box::new(openai::OpenAiAdapter)),
        #[cfg(feature = "smolagents")]
        AgentFramework::Smolagents => Some(Box::new(smolagents::SmolagentsAdapter)),
        #[cfg(feature = "langchain")]
        AgentFramework::Langchain => Some(Box::new(langchain::LangchainAdapter)),
        #[cfg(feature = "google")]
        AgentFramework::Google => Some(Box::new(google::GoogleAdapter)),
        #[cfg(feature = "llama-index")]
        AgentFramework::LlamaIndex => Some(Box::new(llama_index::LlamaIndexAdapter)),
        #[cfg(feature = "agno")]
        AgentFramework::Agno => Some(Box::new(agno::AgnoAdapter)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn require_adapter(
    framework: AgentFramework,
    adapter: Option<Box<dyn FrameworkAdapter>>,
) -> Result<Box<dyn FrameworkAdapter>, McpError> {
    adapter.ok_or_else(|| McpError::DependencyMissing {
        framework,
        feature: framework.feature_name(),
    })
}

/// Whether support for `framework` was compiled into this build.
pub fn is_available(framework: AgentFramework) -> bool {
    adapter_for(framework).is_ok()
}

/// Stdio launch target for the spec's command and arguments.
pub(crate) fn stdio_target(spec: &ServerSpec) -> LaunchTarget {
    LaunchTarget::stdio(spec.command.as_str(), spec.args.iter().cloned())
}

/// Connect and record a server object that owns both session and transport.
pub(crate) async fn open_server(
    ctx: &mut OpenContext<'_>,
    label: &'static str,
    target: &LaunchTarget,
) -> Result<Arc<McpSession>, McpError> {
    let transport = ctx.connector.connect(target).await?;
    let session = Arc::new(McpSession::new(transport));
    ctx.resources.push(ServerResource::new(label, Arc::clone(&session)));
    Ok(session)
}

/// Run the MCP handshake and fetch the full tool list.
///
/// JSON-RPC errors at this stage mean the server could not be brought up, so
/// they surface as transport errors.
pub(crate) async fn handshake(session: &McpSession) -> Result<Vec<McpTool>, McpError> {
    let into_transport = |e: McpError| match e {
        McpError::Rpc { code, message } => McpError::transport(
            session.server_label(),
            format!("JSON-RPC error {code} during setup: {message}"),
        ),
        other => other,
    };

    session.initialize().await.map_err(into_transport)?;
    session.list_tools().await.map_err(into_transport)
}

/// Filtering as done by clients that take the allow-list up front: unknown
/// names are silently dropped.
pub(crate) fn native_filter(
    tools: Vec<McpTool>,
    allow_list: Option<&BTreeSet<String>>,
) -> Vec<McpTool> {
    match allow_list {
        Some(allow) => tools
            .into_iter()
            .filter(|tool| allow.contains(&tool.name))
            .collect(),
        None => tools,
    }
}

/// Normalize tools for frameworks that convert them into native tool objects.
///
/// The input schema always ends up as a JSON object schema.
pub(crate) fn convert_tools(tools: Vec<McpTool>) -> Vec<McpTool> {
    tools
        .into_iter()
        .map(|mut tool| {
            tool.input_schema = Some(normalize_schema(tool.input_schema.take()));
            tool
        })
        .collect()
}

fn normalize_schema(schema: Option<Value>) -> Value {
    match schema {
        Some(Value::Object(mut map)) => {
            map.entry("type").or_insert_with(|| json!("object"));
            if map.get("type") == Some(&json!("object")) {
                map.entry("properties").or_insert_with(|| json!({}));
            }
            Value::Object(map)
        }
        _ => json!({"type": "object", "properties": {}}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(
        feature = "openai",
        feature = "smolagents",
        feature = "langchain",
        feature = "google",
        feature = "llama-index",
        feature = "agno"
    ))]
    fn test_default_build_has_every_adapter() {
        for framework in AgentFramework::ALL {
            assert!(is_available(framework), "{framework} should be available");
            assert_eq!(
                adapter_for(framework).ok().map(|a| a.framework()),
                Some(framework)
            );
        }
    }

    #[test]
    fn test_missing_adapter_names_its_feature() {
        for framework in AgentFramework::ALL {
            match require_adapter(framework, None) {
                Err(McpError::DependencyMissing {
                    framework: missing,
                    feature,
                }) => {
                    assert_eq!(missing, framework);
                    assert_eq!(feature, framework.feature_name());
                }
                Err(other) => panic!("expected DependencyMissing, got {other:?}"),
                Ok(_) => panic!("{framework} resolved without an adapter"),
            }
        }
    }

    #[test]
    fn test_native_filter_drops_unknown_names() {
        let tools = vec![McpTool::new("a"), McpTool::new("b"), McpTool::new("c")];
        let allow: BTreeSet<String> = ["c".to_string(), "a".to_string(), "zzz".to_string()].into();

        let filtered = native_filter(tools, Some(&allow));
        let names: Vec<_> = filtered.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_convert_tools_normalizes_schema() {
        let tools = vec![
            McpTool::new("bare"),
            McpTool::new("typed").with_input_schema(json!({
                "type": "object",
                "properties": {"q": {"type": "string"}},
                "required": ["q"]
            })),
            McpTool::new("untyped").with_input_schema(json!({"properties": {}})),
            McpTool::new("bogus").with_input_schema(json!("not a schema")),
        ];

        let converted = convert_tools(tools);

        assert_eq!(
            converted[0].input_schema,
            Some(json!({"type": "object", "properties": {}}))
        );
        assert_eq!(converted[1].input_schema.as_ref().unwrap()["required"], json!(["q"]));
        assert_eq!(converted[2].input_schema.as_ref().unwrap()["type"], "object");
        assert_eq!(
            converted[3].input_schema,
            Some(json!({"type": "object", "properties": {}}))
        );
    }
}
