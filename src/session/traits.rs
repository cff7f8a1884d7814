//! Session capability traits
//!
//! This module defines the abstract interface to an already-connected remote
//! automation session. Everything above it re-queries through this trait;
//! nothing caches live handles across calls.

use async_trait::async_trait;
use std::fmt;

use crate::locator::Locator;

/// Opaque handle to a live element.
///
/// Valid until the DOM subtree it points into is replaced; after that every
/// operation on it fails with [`crate::Error::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Session-specific element reference
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element({})", self.id)
    }
}

/// Element rectangle, measured from the top-left of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center point, used for pointer events
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Argument passed to [`AutomationSession::execute_script`]
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Element(ElementHandle),
    Value(serde_json::Value),
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Object(serde_json::Value),
}

impl EvaluationResult {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EvaluationResult::Number(n) => Some(*n),
            EvaluationResult::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvaluationResult::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Remote automation session
///
/// Element-level operations return `StaleElement` when the handle's node has
/// been detached, and `NotInteractable` when a pointer interaction cannot be
/// delivered to the element yet.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Find all elements matching `locator`, searching inside `scope` or the
    /// whole document. An empty result is not an error.
    async fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, crate::Error>;

    /// Rendered text of the element and its descendants
    async fn text(&self, element: &ElementHandle) -> Result<String, crate::Error>;

    /// Attribute value (falls back to the live property, e.g. `value`)
    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, crate::Error>;

    /// Computed CSS property value
    async fn css_value(&self, element: &ElementHandle, property: &str) -> Result<String, crate::Error>;

    /// Lower-case tag name
    async fn tag_name(&self, element: &ElementHandle) -> Result<String, crate::Error>;

    /// Bounding rectangle
    async fn rect(&self, element: &ElementHandle) -> Result<Rect, crate::Error>;

    /// Whether the element is rendered visibly
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, crate::Error>;

    /// Left click
    async fn click(&self, element: &ElementHandle) -> Result<(), crate::Error>;

    /// Left click at `(dx, dy)` from the element's top-left corner, for
    /// when something else covers its center
    async fn click_at_offset(&self, element: &ElementHandle, dx: f64, dy: f64) -> Result<(), crate::Error>;

    /// Double click
    async fn double_click(&self, element: &ElementHandle) -> Result<(), crate::Error>;

    /// Right click (context menu)
    async fn context_click(&self, element: &ElementHandle) -> Result<(), crate::Error>;

    /// Move the pointer over the element
    async fn hover(&self, element: &ElementHandle) -> Result<(), crate::Error>;

    /// Type keys into the element; see [`crate::session::keys`] for special keys
    async fn send_keys(&self, element: &ElementHandle, keys: &str) -> Result<(), crate::Error>;

    /// Execute a script with `arguments[i]` bound to `args`
    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<EvaluationResult, crate::Error>;

    /// URL of the current document, `None` when the session cannot report one
    async fn current_url(&self) -> Result<Option<String>, crate::Error>;
}
