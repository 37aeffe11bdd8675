//! Blocking [`Oracle`] over a CDP page session.
//!
//! Element handles carry the node's `backendNodeId`, which stays the same
//! across repeated `DOM.getDocument` calls and dies with the document, so
//! identity comparison and staleness both come for free.

use crate::cdp::{CdpClient, CdpError, JS_EXCEPTION_CODE};
use crate::session::BrowserSession;
use domlogic_core::{
    BrowserConfig, ElementHandle, Error, Location, Oracle, OracleError, OracleResult, Paths,
    Result, Size,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const OBJECT_GROUP: &str = "domlogic";

/// Protocol error fragments that mean the node (or its document) is gone.
const STALE_MARKERS: &[&str] = &[
    "no node with given id",
    "could not find node with given id",
    "no node found for given backend id",
    "node with given id does not belong to the document",
    "node is detached",
    "cannot find context with specified id",
    "could not find object with given id",
];

const TAG_JS: &str = "function() { return this.tagName.toLowerCase(); }";
const TEXT_JS: &str = "function() { return (this.innerText || this.textContent || '').trim(); }";
const ATTRIBUTE_JS: &str = "function(name) { return this.getAttribute(name); }";
const SIZE_JS: &str = "function() { const r = this.getBoundingClientRect(); \
    return { width: Math.round(r.width), height: Math.round(r.height) }; }";
const LOCATION_JS: &str = "function() { const r = this.getBoundingClientRect(); \
    return { x: Math.round(r.left + window.scrollX), y: Math.round(r.top + window.scrollY) }; }";
const DISPLAYED_JS: &str = "function() { if (!this.isConnected) return false; \
    for (let e = this; e; e = e.parentElement) { \
      if (window.getComputedStyle(e).display === 'none') return false; } \
    if (window.getComputedStyle(this).visibility !== 'visible') return false; \
    return this.getClientRects().length > 0; }";
const VISIBLE_JS: &str = "function() { if (!this.isConnected) return false; \
    for (let e = this; e; e = e.parentElement) { const s = window.getComputedStyle(e); \
      if (s.display === 'none' || parseFloat(s.opacity) === 0) return false; } \
    if (window.getComputedStyle(this).visibility !== 'visible') return false; \
    const r = this.getBoundingClientRect(); return r.width > 0 && r.height > 0; }";
const ENABLED_JS: &str = "function() { return !this.disabled; }";
const EXISTS_JS: &str = "function() { return this.isConnected; }";
const SELECTED_JS: &str = "function() { return !!(this.selected || this.checked); }";

/// Map a CDP failure onto the oracle fault taxonomy.
///
/// Missing nodes and exceptions thrown while evaluating on an element are
/// invalid-element-state; any other error the browser reports is
/// unknown-server; transport trouble is unexpected.
pub fn classify(err: CdpError) -> OracleError {
    match err {
        CdpError::Protocol { code, message } => {
            let lower = message.to_lowercase();
            if code == JS_EXCEPTION_CODE || STALE_MARKERS.iter().any(|m| lower.contains(m)) {
                OracleError::InvalidElementState(message)
            } else {
                OracleError::UnknownServer(format!("{} (code {})", message, code))
            }
        }
        other => OracleError::Unexpected(other.to_string()),
    }
}

fn backend_id(element: &ElementHandle) -> OracleResult<i64> {
    element.id().parse::<i64>().map_err(|_| {
        OracleError::InvalidElementState(format!("{} is not a CDP element handle", element))
    })
}

/// `nodeId -> backendNodeId` for one snapshot of the document.
#[derive(Debug, Default)]
struct DocumentIndex {
    root: i64,
    backend_ids: HashMap<i64, i64>,
}

impl DocumentIndex {
    async fn fetch(cdp: &CdpClient) -> std::result::Result<Self, CdpError> {
        let root = cdp.get_document().await?;
        Self::from_root(&root)
    }

    fn from_root(root: &Value) -> std::result::Result<Self, CdpError> {
        let root_id = root
            .get("nodeId")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| CdpError::Malformed("document root without nodeId".to_string()))?;
        let mut index = Self {
            root: root_id,
            backend_ids: HashMap::new(),
        };
        index.visit(root);
        Ok(index)
    }

    fn visit(&mut self, node: &Value) {
        if let (Some(id), Some(backend)) = (
            node.get("nodeId").and_then(|v| v.as_i64()),
            node.get("backendNodeId").and_then(|v| v.as_i64()),
        ) {
            self.backend_ids.insert(id, backend);
        }
        for key in ["children", "shadowRoots", "pseudoElements"] {
            if let Some(children) = node.get(key).and_then(|v| v.as_array()) {
                for child in children {
                    self.visit(child);
                }
            }
        }
        for key in ["contentDocument", "templateContent"] {
            if let Some(inner) = node.get(key) {
                self.visit(inner);
            }
        }
    }

    async fn handles(
        &self,
        cdp: &CdpClient,
        node_ids: &[i64],
    ) -> std::result::Result<Vec<ElementHandle>, CdpError> {
        let mut handles = Vec::with_capacity(node_ids.len());
        for id in node_ids {
            let backend = match self.backend_ids.get(id) {
                Some(b) => *b,
                None => cdp.describe_backend_id(*id).await?,
            };
            handles.push(ElementHandle::new(backend.to_string()));
        }
        Ok(handles)
    }
}

pub struct CdpOracle {
    session: BrowserSession,
    command_timeout: Duration,
    // Declared last so the session is torn down while the runtime still exists.
    runtime: tokio::runtime::Runtime,
}

impl CdpOracle {
    /// Attach to `browser.wsEndpoint` when configured, otherwise launch a browser.
    pub fn from_config(config: &BrowserConfig, paths: &Paths) -> Result<Self> {
        match &config.ws_endpoint {
            Some(ws_url) => Self::attach(ws_url, Duration::from_secs(config.command_timeout_secs)),
            None => Self::launch(config, paths),
        }
    }

    pub fn launch(config: &BrowserConfig, paths: &Paths) -> Result<Self> {
        let runtime = build_runtime()?;
        let session = runtime.block_on(BrowserSession::launch(config, paths))?;
        Ok(Self {
            session,
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            runtime,
        })
    }

    pub fn attach(ws_url: &str, command_timeout: Duration) -> Result<Self> {
        let runtime = build_runtime()?;
        let session = runtime.block_on(BrowserSession::attach(ws_url, command_timeout))?;
        Ok(Self {
            session,
            command_timeout,
            runtime,
        })
    }

    /// Load `url` and wait until the document reports `complete`.
    pub fn navigate(&self, url: &str) -> Result<()> {
        let cdp = &self.session.cdp;
        let deadline = Instant::now() + self.command_timeout;
        info!(url = %url, "Navigating");
        self.block_on(async {
            cdp.navigate(url).await?;
            loop {
                let state = cdp.evaluate_js("document.readyState").await?;
                if state.as_str() == Some("complete") {
                    return Ok(());
                }
                if Instant::now() > deadline {
                    return Err(CdpError::Timeout {
                        method: "document.readyState".to_string(),
                        secs: self.command_timeout.as_secs(),
                    });
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .map_err(|e| Error::Session(e.to_string()))
    }

    pub fn close(mut self) {
        let session = &mut self.session;
        self.runtime.block_on(session.close());
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    fn call_on(
        &self,
        element: &ElementHandle,
        declaration: &str,
        arguments: Vec<Value>,
    ) -> OracleResult<Value> {
        let backend = backend_id(element)?;
        let cdp = &self.session.cdp;
        self.block_on(async {
            let object_id = cdp.resolve_backend_node(backend, OBJECT_GROUP).await?;
            let value = cdp.call_function_on(&object_id, declaration, arguments).await;
            if let Err(e) = cdp.release_object_group(OBJECT_GROUP).await {
                debug!(error = %e, "Failed to release object group");
            }
            value
        })
        .map_err(classify)
    }

    fn call_bool(&self, element: &ElementHandle, declaration: &str) -> OracleResult<bool> {
        let value = self.call_on(element, declaration, Vec::new())?;
        value
            .as_bool()
            .ok_or_else(|| OracleError::Unexpected(format!("expected a boolean, got {}", value)))
    }

    fn call_string(&self, element: &ElementHandle, declaration: &str) -> OracleResult<String> {
        let value = self.call_on(element, declaration, Vec::new())?;
        as_string(value)
    }

    fn evaluate_string(&self, expression: &str) -> OracleResult<String> {
        let cdp = &self.session.cdp;
        let value = self
            .block_on(cdp.evaluate_js(expression))
            .map_err(classify)?;
        as_string(value)
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?)
}

fn as_string(value: Value) -> OracleResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(OracleError::Unexpected(format!("expected a string, got {}", other))),
    }
}

fn int_field(value: &Value, name: &str) -> OracleResult<i64> {
    let field = value.get(name);
    field
        .and_then(|v| v.as_i64())
        .or_else(|| field.and_then(|v| v.as_f64()).map(|f| f.round() as i64))
        .ok_or_else(|| OracleError::Unexpected(format!("missing numeric field '{}' in {}", name, value)))
}

impl Oracle for CdpOracle {
    fn enumerate(&self, scope: &str) -> OracleResult<Vec<ElementHandle>> {
        let cdp = &self.session.cdp;
        self.block_on(async {
            let doc = DocumentIndex::fetch(cdp).await?;
            let ids = cdp.query_selector_all(doc.root, scope).await?;
            doc.handles(cdp, &ids).await
        })
        .map_err(classify)
    }

    fn enumerate_children(
        &self,
        parent: &ElementHandle,
        scope: &str,
    ) -> OracleResult<Vec<ElementHandle>> {
        let backend = backend_id(parent)?;
        let cdp = &self.session.cdp;
        let found = self
            .block_on(async {
                let doc = DocumentIndex::fetch(cdp).await?;
                let pushed = cdp.push_nodes_by_backend_ids(&[backend]).await?;
                match pushed.first().copied() {
                    Some(parent_id) if parent_id != 0 => {
                        let ids = cdp.query_selector_all(parent_id, scope).await?;
                        doc.handles(cdp, &ids).await.map(Some)
                    }
                    _ => Ok(None),
                }
            })
            .map_err(classify)?;
        found.ok_or_else(|| {
            OracleError::InvalidElementState(format!("{} is no longer in the document", parent))
        })
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> OracleResult<Option<String>> {
        match self.call_on(element, ATTRIBUTE_JS, vec![json!(name)])? {
            Value::Null => Ok(None),
            other => as_string(other).map(Some),
        }
    }

    fn tag_name(&self, element: &ElementHandle) -> OracleResult<String> {
        self.call_string(element, TAG_JS)
    }

    fn text(&self, element: &ElementHandle) -> OracleResult<String> {
        self.call_string(element, TEXT_JS)
    }

    fn size(&self, element: &ElementHandle) -> OracleResult<Size> {
        let value = self.call_on(element, SIZE_JS, Vec::new())?;
        Ok(Size::new(int_field(&value, "width")?, int_field(&value, "height")?))
    }

    fn location(&self, element: &ElementHandle) -> OracleResult<Location> {
        let value = self.call_on(element, LOCATION_JS, Vec::new())?;
        Ok(Location::new(int_field(&value, "x")?, int_field(&value, "y")?))
    }

    fn is_displayed(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.call_bool(element, DISPLAYED_JS)
    }

    fn is_enabled(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.call_bool(element, ENABLED_JS)
    }

    fn exists(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.call_bool(element, EXISTS_JS)
    }

    fn is_selected(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.call_bool(element, SELECTED_JS)
    }

    fn is_visible(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.call_bool(element, VISIBLE_JS)
    }

    fn title(&self) -> OracleResult<String> {
        self.evaluate_string("document.title")
    }

    fn current_url(&self) -> OracleResult<String> {
        self.evaluate_string("window.location.href")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_stale_node() {
        let err = classify(CdpError::Protocol {
            code: -32000,
            message: "No node with given id found".to_string(),
        });
        assert!(matches!(err, OracleError::InvalidElementState(_)));
    }

    #[test]
    fn test_classify_js_exception() {
        let err = classify(CdpError::Protocol {
            code: JS_EXCEPTION_CODE,
            message: "TypeError: Cannot read properties of null".to_string(),
        });
        assert!(matches!(err, OracleError::InvalidElementState(_)));
    }

    #[test]
    fn test_classify_other_protocol_error() {
        let err = classify(CdpError::Protocol {
            code: -32000,
            message: "DOM Error while querying".to_string(),
        });
        assert!(matches!(err, OracleError::UnknownServer(_)));
        assert!(err.is_recognized());
    }

    #[test]
    fn test_classify_transport_is_unexpected() {
        let err = classify(CdpError::Timeout {
            method: "Runtime.callFunctionOn".to_string(),
            secs: 30,
        });
        assert!(!err.is_recognized());
        let err = classify(CdpError::Transport("CDP response channel closed".to_string()));
        assert!(matches!(err, OracleError::Unexpected(_)));
    }

    #[test]
    fn test_document_index_walks_nested_nodes() {
        let root = json!({
            "nodeId": 1, "backendNodeId": 100,
            "children": [{
                "nodeId": 2, "backendNodeId": 200,
                "children": [{"nodeId": 3, "backendNodeId": 300}],
                "contentDocument": {"nodeId": 4, "backendNodeId": 400}
            }]
        });
        let index = DocumentIndex::from_root(&root).unwrap();
        assert_eq!(index.root, 1);
        assert_eq!(index.backend_ids.get(&3), Some(&300));
        assert_eq!(index.backend_ids.get(&4), Some(&400));
        assert!(DocumentIndex::from_root(&json!({})).is_err());
    }

    #[test]
    fn test_backend_id_parsing() {
        assert_eq!(backend_id(&ElementHandle::new("17")).unwrap(), 17);
        assert!(backend_id(&ElementHandle::new("node-3")).is_err());
    }

    #[test]
    fn test_int_field_accepts_floats() {
        let v = json!({"width": 566.6, "height": 105});
        assert_eq!(int_field(&v, "width").unwrap(), 567);
        assert_eq!(int_field(&v, "height").unwrap(), 105);
        assert!(int_field(&v, "x").is_err());
    }
}
