//! # Component layer
//!
//! [`ComponentPiece`] is what page objects are made of: a locator slot
//! composed under a parent chain, resolved through the poller on every
//! call, with reads that retry once on staleness and interactions that
//! settle and verify.
//!
//! ## Example
//! ```rust,no_run
//! use perspective_pom::component::{ComponentPiece, SetTextOptions};
//! use perspective_pom::locator::Locator;
//! use perspective_pom::session::AutomationSession;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(session: Arc<dyn AutomationSession>) -> perspective_pom::Result<()> {
//! let form = ComponentPiece::builder(Locator::css("form#login"), session)
//!     .wait_timeout(Duration::from_secs(5))
//!     .description("Login form")
//!     .build();
//! let user = form.child(Locator::name("user")).build();
//! user.set_text("admin", SetTextOptions::default()).await?;
//! form.child(Locator::css("button.submit")).build().click().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod interaction;
pub mod piece;
pub mod resolver;
pub mod scripts;


pub use cache::PieceFamily;
pub use interaction::{ClickOptions, SetTextOptions, INTERCEPTED_CLICK_OFFSET};
pub use piece::{ComponentPiece, PieceBuilder, Point, TextSource};
pub use resolver::ElementResolver;
