//! # Session layer
//!
//! The capability boundary between the resolution engine and a remote,
//! already-connected browser automation session.
//!
//! ## Main pieces
//! - **AutomationSession**: find elements by strategy and selector inside an
//!   optional scope, read element state, deliver pointer and keyboard input,
//!   execute scripts
//! - **ElementHandle**: opaque live reference, invalidated when its node is
//!   re-rendered
//! - **keys**: WebDriver-style special key code points
//! - **mock**: in-memory DOM session for tests
//!
//! ## Example
//! ```rust,no_run
//! use perspective_pom::locator::Locator;
//! use perspective_pom::session::AutomationSession;
//! use std::sync::Arc;
//!
//! # async fn example(session: Arc<dyn AutomationSession>) -> Result<(), perspective_pom::Error> {
//! let buttons = session.find_elements(None, &Locator::css("button.submit")).await?;
//! for button in &buttons {
//!     println!("{}", session.text(button).await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod keys;
pub mod mock;
pub mod traits;

pub use traits::{AutomationSession, ElementHandle, EvaluationResult, Rect, ScriptArg};

pub use mock::{MockDom, MockMutation, MockNode, MockSession, NodeId};
