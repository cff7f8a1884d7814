//! CDP client trait
//!
//! The adapter only needs request/response calls on an already-attached
//! page target. Connecting, target discovery and event streams belong to
//! whatever owns the connection.

use async_trait::async_trait;
use serde_json::Value;

/// A connected CDP page target
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Call a raw CDP method and return its `result` object.
    ///
    /// Protocol-level errors (the response's `error` member) are reported as
    /// [`crate::Error::Session`].
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;
}
