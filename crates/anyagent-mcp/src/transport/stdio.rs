//! JSON-RPC over a child process's stdio.
//!
//! One JSON object per line in each direction. Lines that are not JSON-RPC
//! responses to the pending request (startup chatter from `npx`, server
//! notifications) are skipped. Requests the server sends while we wait are
//! answered: `ping` with an empty result, anything else with an error.

use anyagent_core::{McpError, McpTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::jsonrpc::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, encode_line,
};

/// Time a server gets to exit on its own after stdin closes.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Both pipe ends, locked together so one request/response exchange is never
/// interleaved with another.
struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Transport over a spawned MCP server process.
pub struct StdioTransport {
    label: String,
    pipes: Mutex<Option<Pipes>>,
    child: Mutex<Option<Child>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl StdioTransport {
    /// Spawn `program` with exactly the given environment.
    ///
    /// The child is killed if the transport is dropped without being closed.
    pub fn spawn(
        program: &str,
        args: &[String],
        env: &[(OsString, OsString)],
    ) -> Result<Self, McpError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Windows: prevent console window from appearing for child processes
        #[cfg(target_os = "windows")]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command.spawn().map_err(|e| {
            McpError::transport(program, format!("failed to spawn '{program}' {args:?}: {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::transport(program, "failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::transport(program, "failed to capture stdout"))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(program.to_string(), stderr));
        }

        tracing::debug!(
            server = program,
            pid = ?child.id(),
            "Spawned MCP server process"
        );

        Ok(Self {
            label: program.to_string(),
            pipes: Mutex::new(Some(Pipes {
                stdin,
                stdout: BufReader::new(stdout),
            })),
            child: Mutex::new(Some(child)),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    fn error(&self, reason: impl std::fmt::Display) -> McpError {
        McpError::transport(&self.label, reason)
    }

    async fn write_line(&self, stdin: &mut ChildStdin, line: &str) -> Result<(), McpError> {
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.error(format!("failed to write to stdin: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| self.error(format!("failed to flush stdin: {e}")))
    }

    /// Wait for the child to exit after stdin closed, killing it on timeout.
    async fn reap(&self, mut child: Child) -> Result<(), McpError> {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(server = %self.label, %status, "MCP server process exited");
                Ok(())
            }
            Ok(Err(e)) => Err(self.error(format!("failed to wait for process: {e}"))),
            Err(_) => {
                tracing::debug!(
                    server = %self.label,
                    "MCP server did not exit after stdin closed; killing"
                );
                child
                    .kill()
                    .await
                    .map_err(|e| self.error(format!("failed to kill process: {e}")))
            }
        }
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.error("transport is closed"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = encode_line(&JsonRpcRequest::new(id, method, params), &self.label)?;

        let mut guard = self.pipes.lock().await;
        let pipes = guard
            .as_mut()
            .ok_or_else(|| self.error("transport is closed"))?;

        self.write_line(&mut pipes.stdin, &line).await?;

        let mut buf = String::new();
        loop {
            buf.clear();
            let read = pipes
                .stdout
                .read_line(&mut buf)
                .await
                .map_err(|e| self.error(format!("failed to read from stdout: {e}")))?;

            if read == 0 {
                return Err(self.error("server stdout closed (process may have exited)"));
            }

            let trimmed = buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                Ok(message) if message.response_id() == Some(id) => return message.into_result(),
                Ok(message) => {
                    if let Some((request_id, request_method)) = message.server_request() {
                        tracing::debug!(
                            server = %self.label,
                            method = request_method,
                            "Answering server request"
                        );
                        let reply = JsonRpcResponse::answer(request_id, request_method);
                        let reply = encode_line(&reply, &self.label)?;
                        self.write_line(&mut pipes.stdin, &reply).await?;
                        continue;
                    }

                    tracing::debug!(server = %self.label, line = trimmed, "Skipping unrelated message");
                }
                Err(_) => {
                    tracing::debug!(server = %self.label, line = trimmed, "Skipping non-JSON-RPC output");
                }
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.error("transport is closed"));
        }

        let line = encode_line(&JsonRpcNotification::new(method, params), &self.label)?;

        let mut guard = self.pipes.lock().await;
        let pipes = guard
            .as_mut()
            .ok_or_else(|| self.error("transport is closed"))?;
        self.write_line(&mut pipes.stdin, &line).await
    }

    async fn close(&self) -> Result<(), McpError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Dropping stdin signals EOF. If a request is mid-flight the pipes stay
        // with it and the process is terminated underneath instead.
        match self.pipes.try_lock() {
            Ok(mut pipes) => drop(pipes.take()),
            Err(_) => {
                tracing::debug!(
                    server = %self.label,
                    "Request in flight during close; terminating process directly"
                );
                if let Some(child) = self.child.lock().await.as_mut() {
                    child
                        .start_kill()
                        .map_err(|e| self.error(format!("failed to kill process: {e}")))?;
                }
            }
        }

        let child = self.child.lock().await.take();
        match child {
            Some(child) => self.reap(child).await,
            None => Ok(()),
        }
    }

    fn server_label(&self) -> &str {
        &self.label
    }
}

/// Forward the server's stderr into the log until the pipe closes.
async fn drain_stderr(server: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(server = %server, stderr = %line, "MCP server stderr");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> Vec<(OsString, OsString)> {
        std::env::vars_os().collect()
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_transport_error() {
        let err = StdioTransport::spawn("definitely-not-a-real-mcp-server", &[], &env())
            .err()
            .unwrap();
        assert!(err.is_transport());
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn test_request_skips_noise_and_matches_id() {
        let script = r#"read -r _req
echo 'booting...'
echo '{"jsonrpc":"2.0","method":"notifications/message","params":{}}'
echo '{"jsonrpc":"2.0","id":1,"result":{"ok":true}}'
read -r _rest"#;
        let args = vec!["-c".to_string(), script.to_string()];
        let transport = StdioTransport::spawn("sh", &args, &env()).unwrap();

        let result = transport.request("ping", None).await.unwrap();
        assert_eq!(result, json!({"ok": true}));

        transport.close().await.unwrap();
        assert!(transport.request("ping", None).await.is_err());
    }

    #[tokio::test]
    async fn test_server_ping_is_answered_while_waiting() {
        let script = r#"read -r _req
echo '{"jsonrpc":"2.0","id":"srv-1","method":"ping"}'
read -r pong
case "$pong" in
  *'"id":"srv-1"'*'"result":{}'*) echo '{"jsonrpc":"2.0","id":1,"result":{"pong":true}}' ;;
  *) echo '{"jsonrpc":"2.0","id":1,"result":{"pong":false}}' ;;
esac
read -r _rest"#;
        let args = vec!["-c".to_string(), script.to_string()];
        let transport = StdioTransport::spawn("sh", &args, &env()).unwrap();

        let result = transport.request("tools/list", None).await.unwrap();
        assert_eq!(result, json!({"pong": true}));

        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_request_reports_exited_server() {
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let transport = StdioTransport::spawn("sh", &args, &env()).unwrap();

        let err = transport.request("initialize", None).await.unwrap_err();
        assert!(err.is_transport());

        // Closing after the process already exited is still clean
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }
}
