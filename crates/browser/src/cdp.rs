//! Low-level Chrome DevTools Protocol (CDP) client over WebSocket.
//!
//! Communicates with a page target via its debugging WebSocket endpoint.
//! Only the DOM and Runtime commands the oracle needs are wrapped here.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CdpError {
    /// The browser answered with an error object.
    #[error("CDP error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("CDP transport error: {0}")]
    Transport(String),

    #[error("CDP command '{method}' timed out after {secs}s")]
    Timeout { method: String, secs: u64 },

    #[error("Malformed CDP response: {0}")]
    Malformed(String),
}

/// A CDP WebSocket client that sends commands and awaits their responses.
pub struct CdpClient {
    /// Sender to write messages to the WebSocket.
    ws_tx: mpsc::Sender<String>,
    /// Pending command responses, keyed by request ID.
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    /// Auto-incrementing command ID.
    next_id: AtomicU64,
    timeout: Duration,
    _reader_handle: tokio::task::JoinHandle<()>,
    _writer_handle: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a CDP WebSocket endpoint.
    pub async fn connect(ws_url: &str, timeout: Duration) -> Result<Self, CdpError> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let (ws_stream, _) = connect_async(ws_url).await.map_err(|e| {
            CdpError::Transport(format!("Failed to connect to CDP endpoint {}: {}", ws_url, e))
        })?;

        let (mut ws_sink, mut ws_stream_read) = ws_stream.split();

        // Channel for outgoing messages
        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(256);

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let pending_clone = pending.clone();

        // Writer task: owns the sink, forwards messages from channel
        let writer_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(msg)).await {
                    error!("CDP WebSocket write error: {}", e);
                    break;
                }
            }
        });

        // Reader task: dispatches responses; events are not consumed
        let reader_handle = tokio::spawn(async move {
            while let Some(msg_result) = ws_stream_read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        let Ok(val) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        if let Some(id) = val.get("id").and_then(|v| v.as_u64()) {
                            let mut pending = pending_clone.lock().await;
                            if let Some(tx) = pending.remove(&id) {
                                let _ = tx.send(val);
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("CDP WebSocket closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!("CDP WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            // Dropping the senders wakes every waiter with a closed channel.
            pending_clone.lock().await.clear();
        });

        Ok(Self {
            ws_tx,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            _reader_handle: reader_handle,
            _writer_handle: writer_handle,
        })
    }

    /// Send a CDP command and wait for the response.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let msg = json!({
            "id": id,
            "method": method,
            "params": params,
        });

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        self.ws_tx
            .send(msg.to_string())
            .await
            .map_err(|e| CdpError::Transport(format!("Failed to send CDP command: {}", e)))?;

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => {
                if let Some(error) = response.get("error") {
                    Err(CdpError::Protocol {
                        code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
                        message: error
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                } else {
                    Ok(response.get("result").cloned().unwrap_or(Value::Null))
                }
            }
            Ok(Err(_)) => Err(CdpError::Transport("CDP response channel closed".to_string())),
            Err(_) => {
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                Err(CdpError::Timeout {
                    method: method.to_string(),
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    /// Enable a CDP domain (e.g., "Page", "Runtime", "DOM").
    pub async fn enable_domain(&self, domain: &str) -> Result<(), CdpError> {
        self.send_command(&format!("{}.enable", domain), json!({}))
            .await?;
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<Value, CdpError> {
        let result = self
            .send_command("Page.navigate", json!({"url": url}))
            .await?;
        if let Some(reason) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(CdpError::Protocol {
                code: 0,
                message: format!("Navigation to {} failed: {}", url, reason),
            });
        }
        Ok(result)
    }

    /// Evaluate an expression in the page and return its value.
    pub async fn evaluate_js(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        remote_value(result)
    }

    /// Fetch the whole document tree (`DOM.getDocument` with unlimited depth).
    ///
    /// Invalidates every `nodeId` handed out before the call.
    pub async fn get_document(&self) -> Result<Value, CdpError> {
        let result = self
            .send_command("DOM.getDocument", json!({"depth": -1}))
            .await?;
        result
            .get("root")
            .cloned()
            .ok_or_else(|| CdpError::Malformed("DOM.getDocument without root".to_string()))
    }

    /// Query a CSS selector below `node_id` and return node IDs.
    pub async fn query_selector_all(
        &self,
        node_id: i64,
        selector: &str,
    ) -> Result<Vec<i64>, CdpError> {
        let result = self
            .send_command(
                "DOM.querySelectorAll",
                json!({
                    "nodeId": node_id,
                    "selector": selector,
                }),
            )
            .await?;
        let ids = result
            .get("nodeIds")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();
        Ok(ids)
    }

    /// Map backend node IDs to frontend node IDs; `0` marks a node that no longer exists.
    pub async fn push_nodes_by_backend_ids(
        &self,
        backend_node_ids: &[i64],
    ) -> Result<Vec<i64>, CdpError> {
        let result = self
            .send_command(
                "DOM.pushNodesByBackendIdsToFrontend",
                json!({"backendNodeIds": backend_node_ids}),
            )
            .await?;
        result
            .get("nodeIds")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .ok_or_else(|| CdpError::Malformed("pushNodesByBackendIdsToFrontend".to_string()))
    }

    pub async fn describe_backend_id(&self, node_id: i64) -> Result<i64, CdpError> {
        let result = self
            .send_command("DOM.describeNode", json!({"nodeId": node_id}))
            .await?;
        result
            .get("node")
            .and_then(|n| n.get("backendNodeId"))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| CdpError::Malformed("DOM.describeNode without backendNodeId".to_string()))
    }

    /// Resolve a backend node to a Runtime object for JS interaction.
    pub async fn resolve_backend_node(
        &self,
        backend_node_id: i64,
        object_group: &str,
    ) -> Result<String, CdpError> {
        let result = self
            .send_command(
                "DOM.resolveNode",
                json!({"backendNodeId": backend_node_id, "objectGroup": object_group}),
            )
            .await?;
        result
            .get("object")
            .and_then(|o| o.get("objectId"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::Malformed("DOM.resolveNode without objectId".to_string()))
    }

    /// Call a function with `this` bound to a remote object and return its value.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let args: Vec<Value> = arguments.into_iter().map(|v| json!({"value": v})).collect();
        let result = self
            .send_command(
                "Runtime.callFunctionOn",
                json!({
                    "objectId": object_id,
                    "functionDeclaration": function_declaration,
                    "arguments": args,
                    "returnByValue": true,
                }),
            )
            .await?;
        remote_value(result)
    }

    pub async fn release_object_group(&self, object_group: &str) -> Result<(), CdpError> {
        self.send_command(
            "Runtime.releaseObjectGroup",
            json!({"objectGroup": object_group}),
        )
        .await?;
        Ok(())
    }

    pub async fn close_browser(&self) -> Result<(), CdpError> {
        self.send_command("Browser.close", json!({})).await?;
        Ok(())
    }
}

/// Unwrap a `Runtime.RemoteObject` result, turning a thrown exception into an error.
///
/// Exceptions surface as `Protocol` errors with code `-1` so callers can tell
/// them apart from errors reported by the browser itself.
fn remote_value(result: Value) -> Result<Value, CdpError> {
    if let Some(details) = result.get("exceptionDetails") {
        let message = details
            .get("exception")
            .and_then(|e| e.get("description"))
            .and_then(|d| d.as_str())
            .or_else(|| details.get("text").and_then(|t| t.as_str()))
            .unwrap_or("JavaScript exception")
            .to_string();
        return Err(CdpError::Protocol {
            code: JS_EXCEPTION_CODE,
            message,
        });
    }
    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}

pub const JS_EXCEPTION_CODE: i64 = -1;

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._reader_handle.abort();
        self._writer_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_value_unwraps() {
        let v = remote_value(json!({"result": {"type": "string", "value": "Ministache"}})).unwrap();
        assert_eq!(v, json!("Ministache"));
        let undefined = remote_value(json!({"result": {"type": "undefined"}})).unwrap();
        assert_eq!(undefined, Value::Null);
    }

    #[test]
    fn test_remote_value_exception() {
        let err = remote_value(json!({
            "result": {"type": "object"},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "TypeError: x is null"}}
        }))
        .unwrap_err();
        assert_eq!(
            err,
            CdpError::Protocol {
                code: JS_EXCEPTION_CODE,
                message: "TypeError: x is null".to_string()
            }
        );
    }
}
