//! Locator segments, chains and per-component slots
//!
//! A component declares its own [`Locator`] and is built under a parent
//! [`LocatorChain`]; the composed chain is what every read resolves.

pub mod chain;
pub mod segment;
pub mod slot;

pub use chain::{LocatorChain, ResolutionPlan};
pub use segment::{Locator, Strategy};
pub use slot::LocatorSlot;
