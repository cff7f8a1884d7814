//! # Chrome DevTools Protocol adapter
//!
//! [`CdpSession`] implements [`AutomationSession`](crate::session::AutomationSession)
//! on top of an already-connected [`CdpClient`]. Elements are found and read
//! through `Runtime.evaluate`; pointer and keyboard input go through the
//! `Input` domain so the page sees trusted events.
//!
//! ## Module layout
//! - `traits`: the client interface the adapter needs
//! - `types`: wire parameter and response types
//! - `scripts`: page-side scripts and the element registry
//! - `input`: key string to Input event translation
//! - `session`: the adapter itself
//! - `mock`: a scripted client for tests
//!
//! ## Example
//! ```rust,no_run
//! use perspective_pom::cdp::{CdpClient, CdpSession};
//! use perspective_pom::component::ComponentPiece;
//! use perspective_pom::locator::Locator;
//! use std::sync::Arc;
//!
//! # async fn example(client: Arc<dyn CdpClient>) -> perspective_pom::Result<()> {
//! let session = Arc::new(CdpSession::new(client));
//! let title = ComponentPiece::new(Locator::css("h1.title"), session);
//! println!("{}", title.get_text().await?);
//! # Ok(())
//! # }
//! ```

pub mod input;
pub mod mock;
pub mod scripts;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod tests;

pub use mock::ScriptedCdpClient;
pub use session::CdpSession;
pub use traits::CdpClient;
