//! Perspective-POM: page-object element resolution and wait/retry engine
//!
//! Page objects are built from [`component::ComponentPiece`]s. Each piece
//! owns a locator composed under its parent's chain and resolves it against
//! the live DOM on every call, polling until the element appears, retrying
//! once when a re-render invalidates a handle, and verifying that mutating
//! interactions took effect.
//!
//! The browser is reached through [`session::AutomationSession`];
//! [`cdp::CdpSession`] drives a Chrome DevTools Protocol target and
//! [`session::MockSession`] provides an in-memory DOM for tests.

pub mod error;
pub mod config;
pub mod logging;

pub mod locator;
pub mod session;
pub mod wait;
pub mod component;
pub mod widgets;
pub mod cdp;

// Re-exports
pub use error::{Error, Result};

/// Perspective-POM library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
