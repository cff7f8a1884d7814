//! Per-component locator slot

use super::chain::LocatorChain;
use super::segment::Locator;

/// A component's own segment plus the parent chain it was built under.
///
/// Retargeting builds a fresh chain for this slot only. Children that copied
/// the previous chain keep resolving through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSlot {
    parent: LocatorChain,
    own: Locator,
    chain: LocatorChain,
}

impl LocatorSlot {
    /// Slot for `own` under `parent`, or under the document root
    pub fn new(own: Locator, parent: Option<&LocatorChain>) -> Self {
        let parent = parent.cloned().unwrap_or_default();
        let chain = parent.child(own.clone());
        Self { parent, own, chain }
    }

    /// Current trailing segment
    pub fn own(&self) -> &Locator {
        &self.own
    }

    /// Chain this slot was built under; never changes
    pub fn parent(&self) -> &LocatorChain {
        &self.parent
    }

    /// The composed `parent ++ [own]` chain
    pub fn chain(&self) -> &LocatorChain {
        &self.chain
    }

    /// Swap the trailing segment, rebuilding the composed chain
    pub fn replace(&mut self, own: Locator) {
        self.chain = self.parent.child(own.clone());
        self.own = own;
    }
}
