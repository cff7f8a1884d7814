//! CDP wire types used by the session adapter

use serde::{Deserialize, Serialize};

use crate::session::Rect;

/// `Runtime.evaluate` parameters
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none", rename = "awaitPromise")]
    pub await_promise: Option<bool>,
    /// Whether to return as value
    #[serde(skip_serializing_if = "Option::is_none", rename = "returnByValue")]
    pub return_by_value: Option<bool>,
}

impl EvaluateParams {
    /// Evaluate `expression` and return its result as JSON
    pub fn by_value(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            await_promise: Some(false),
            return_by_value: Some(true),
        }
    }
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Line number
    #[serde(default)]
    pub line_number: i32,
    /// Column number
    #[serde(default)]
    pub column_number: i32,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Human-readable summary: the thrown value's description when present
    pub fn message(&self) -> String {
        let thrown = self.exception.as_ref().and_then(|e| e.description.clone());
        match (thrown, &self.text) {
            (Some(thrown), _) => thrown,
            (None, Some(text)) => format!("{} at {}:{}", text, self.line_number, self.column_number),
            (None, None) => "uncaught exception".to_string(),
        }
    }
}

/// `Runtime.evaluate` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Outcome every element script reports
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScriptEnvelope {
    /// The referenced element is gone or detached
    #[serde(default)]
    pub stale: bool,
    /// The locator was rejected by the page's query engine
    #[serde(default)]
    pub invalid: Option<String>,
    /// Script result
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Where a pointer event for an element would land
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointerTarget {
    pub x: f64,
    pub y: f64,
    /// The element has a rendered box
    pub displayed: bool,
    /// The element (or a descendant) is topmost at `(x, y)`
    pub hit: bool,
}

/// Bounding rectangle as reported by `getBoundingClientRect`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClientRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<ClientRect> for Rect {
    fn from(r: ClientRect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

/// `Input.dispatchMouseEvent` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventParams {
    pub r#type: &'static str,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
}

/// `Input.dispatchKeyEvent` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEventParams {
    pub r#type: &'static str,
    pub key: &'static str,
    pub code: &'static str,
    pub windows_virtual_key_code: u32,
}

/// `Input.insertText` parameters
#[derive(Debug, Clone, Serialize)]
pub struct InsertTextParams {
    pub text: String,
}
