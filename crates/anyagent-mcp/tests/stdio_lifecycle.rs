//! End-to-end lifecycle against a real child process speaking MCP over stdio.
#![cfg(unix)]

use anyagent_mcp::{AgentFramework, LifecycleState, McpError, ServerHandle, ServerSpec};
use serde_json::{Map, json};
use std::io::Write;
use tempfile::NamedTempFile;

/// Minimal MCP server: answers by method, echoes the request id back and puts
/// `CARGO_PKG_NAME` from its own environment into the first tool description.
const SERVER_SCRIPT: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      echo "{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{\"protocolVersion\":\"2024-11-05\",\"serverInfo\":{\"name\":\"sh-server\",\"version\":\"0.1.0\"},\"capabilities\":{\"tools\":{}}}}"
      ;;
    *'"method":"tools/list"'*)
      echo "{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{\"tools\":[{\"name\":\"search\",\"description\":\"$CARGO_PKG_NAME\"},{\"name\":\"fetch\"},{\"name\":\"summarize\"}]}}"
      ;;
    *'"method":"tools/call"'*)
      echo "{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"found it\"}]}}"
      ;;
  esac
done
"#;

fn server_script() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("mcp-server")
        .suffix(".sh")
        .tempfile()
        .unwrap();
    file.write_all(SERVER_SCRIPT.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn spec(script: &NamedTempFile) -> ServerSpec {
    ServerSpec::new("sh", [script.path().to_string_lossy().into_owned()])
}

#[tokio::test]
async fn test_full_lifecycle_over_stdio() {
    let script = server_script();
    let mut handle = ServerHandle::new(
        spec(&script).with_tools(["fetch", "search"]),
        AgentFramework::Langchain,
    )
    .unwrap();

    let tools = handle.setup().await.unwrap();

    let names: Vec<_> = tools.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["search", "fetch"]);
    assert_eq!(handle.state(), LifecycleState::Ready);

    // The child saw the host environment
    let expected = std::env::var("CARGO_PKG_NAME").unwrap_or_default();
    assert_eq!(tools[0].description(), Some(expected.as_str()));

    let mut args = Map::new();
    args.insert("query".into(), json!("rust"));
    let result = tools[0].invoke(args).await.unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()[0]["text"], "found it");

    handle.teardown().await.unwrap();
    assert_eq!(handle.state(), LifecycleState::Closed);
    assert!(!tools[0].is_live());
    handle.teardown().await.unwrap();
}

#[tokio::test]
async fn test_joined_command_line_adapter() {
    let script = server_script();
    let mut handle = ServerHandle::new(spec(&script), AgentFramework::Agno).unwrap();

    let tools = handle.setup().await.unwrap();
    assert_eq!(tools.len(), 3);

    handle.teardown().await.unwrap();
}

#[tokio::test]
async fn test_missing_tool_keeps_process_until_teardown() {
    let script = server_script();
    let mut handle = ServerHandle::new(
        spec(&script).with_tools(["search", "translate"]),
        AgentFramework::Smolagents,
    )
    .unwrap();

    let err = handle.setup().await.unwrap_err();
    assert!(err.to_string().contains("translate"));
    assert_eq!(handle.state(), LifecycleState::Starting);

    // The session is still usable for inspection
    let session = handle.session().unwrap().clone();
    assert_eq!(session.server_info().unwrap().name, "sh-server");
    assert!(!session.list_tools().await.unwrap().is_empty());

    handle.teardown().await.unwrap();
    assert!(session.is_closed());
}

#[tokio::test]
async fn test_server_that_exits_is_transport_error() {
    let mut handle = ServerHandle::new(
        ServerSpec::new("sh", ["-c", "exit 0"]),
        AgentFramework::OpenAi,
    )
    .unwrap();

    let err = handle.setup().await.unwrap_err();

    assert!(matches!(err, McpError::Transport { .. }));
    assert_eq!(handle.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_missing_executable_is_transport_error() {
    let mut handle = ServerHandle::new(
        ServerSpec::new("anyagent-no-such-mcp-server", Vec::<String>::new()),
        AgentFramework::Google,
    )
    .unwrap();

    let err = handle.setup().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(handle.state(), LifecycleState::Closed);
    handle.teardown().await.unwrap();
}
