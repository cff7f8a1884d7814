//! Common test utilities
//!
//! Shared fixtures for the integration tests: an in-memory session with a
//! small application shell, and pieces with short waits.

#![allow(dead_code)]

use perspective_pom::component::ComponentPiece;
use perspective_pom::config::WaitConfig;
use perspective_pom::locator::Locator;
use perspective_pom::logging;
use perspective_pom::session::{MockNode, MockSession, NodeId};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Poll interval used by every fixture piece
pub const POLL: Duration = Duration::from_millis(20);

/// Wait settings small enough to keep the suite fast
pub fn short_waits(timeout: Duration) -> WaitConfig {
    WaitConfig {
        wait_timeout_ms: timeout.as_millis() as u64,
        poll_interval_ms: POLL.as_millis() as u64,
        settle_ms: 0,
        text_prefill_wait_ms: 20,
        text_verify_grace_ms: 150,
    }
}

/// Fresh in-memory session with logging set up
pub fn setup_session() -> Arc<MockSession> {
    logging::init(Level::DEBUG);
    Arc::new(MockSession::new())
}

/// `div#app` application root
pub fn setup_app(session: &MockSession) -> NodeId {
    session.append(None, MockNode::new("div").id("app"))
}

/// A root-level piece using [`short_waits`]
pub fn piece(session: &Arc<MockSession>, locator: Locator, timeout: Duration) -> ComponentPiece {
    ComponentPiece::builder(locator, session.clone())
        .config(&short_waits(timeout))
        .build()
}
