//! JSON-RPC 2.0 message framing shared by every transport.

use anyagent_core::McpError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl<'a> JsonRpcRequest<'a> {
    pub(crate) const fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 notification (no id, no response).
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcNotification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl<'a> JsonRpcNotification<'a> {
    pub(crate) const fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 response to a request the server sent us.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcResponse<'a> {
    jsonrpc: &'static str,
    id: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl<'a> JsonRpcResponse<'a> {
    /// Reply to a server-initiated request. Only `ping` is supported; anything
    /// else gets a method-not-found error so the server is never left waiting.
    pub(crate) fn answer(id: &'a Value, method: &str) -> Self {
        let (result, error) = if method == "ping" {
            (Some(json!({})), None)
        } else {
            let error = json!({"code": -32601, "message": format!("Method not found: {method}")});
            (None, Some(error))
        };
        Self {
            jsonrpc: "2.0",
            id,
            result,
            error,
        }
    }
}

/// Any message a server may send: a response, a request or a notification.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcMessage {
    /// Id of this message if it is a response to one of our requests.
    ///
    /// Server-initiated requests carry an id too, but also a method.
    pub(crate) fn response_id(&self) -> Option<u64> {
        if self.method.is_some() {
            return None;
        }
        self.id.as_ref().and_then(Value::as_u64)
    }

    /// Id and method of a request sent by the server.
    pub(crate) fn server_request(&self) -> Option<(&Value, &str)> {
        Some((self.id.as_ref()?, self.method.as_deref()?))
    }

    /// Convert a response into its result, mapping error responses.
    pub(crate) fn into_result(self) -> Result<Value, McpError> {
        if let Some(err) = self.error {
            return Err(McpError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Serialize a message as one newline-terminated line.
pub(crate) fn encode_line<T: Serialize>(message: &T, server: &str) -> Result<String, McpError> {
    serde_json::to_string(message)
        .map(|json| json + "\n")
        .map_err(|e| McpError::transport(server, format!("failed to serialize message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let line = encode_line(&JsonRpcRequest::new(7, "tools/list", None), "srv").unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains("\"jsonrpc\":\"2.0\""));
        assert!(line.contains("\"id\":7"));
        assert!(!line.contains("params")); // Omitted when None
    }

    #[test]
    fn test_notification_has_no_id() {
        let line = encode_line(
            &JsonRpcNotification::new("notifications/initialized", None),
            "srv",
        )
        .unwrap();
        assert!(!line.contains("\"id\""));
    }

    #[test]
    fn test_response_id_ignores_server_requests() {
        let response: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 3, "result": {}})).unwrap();
        assert_eq!(response.response_id(), Some(3));

        let ping: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"})).unwrap();
        assert_eq!(ping.response_id(), None);
    }

    #[test]
    fn test_server_requests_get_answered() {
        let ping: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"}))
                .unwrap();
        let (id, method) = ping.server_request().unwrap();
        let reply = serde_json::to_value(JsonRpcResponse::answer(id, method)).unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": "srv-1", "result": {}}));

        let id = json!(4);
        let reply =
            serde_json::to_value(JsonRpcResponse::answer(&id, "sampling/createMessage")).unwrap();
        assert_eq!(reply["error"]["code"], -32601);
        assert!(reply.get("result").is_none());

        let notification: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/message"}))
                .unwrap();
        assert!(notification.server_request().is_none());
    }

    #[test]
    fn test_error_response_maps_to_rpc_error() {
        let message: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();

        match message.into_result() {
            Err(McpError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn test_null_result_is_ok() {
        let message: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert_eq!(message.into_result().unwrap(), Value::Null);
    }
}
