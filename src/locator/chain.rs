//! Root-to-leaf locator chains

use super::segment::{Locator, Strategy};
use crate::{Error, Result};
use std::fmt;

/// Ordered sequence of segments from the document root down to a target.
///
/// Chains are values: deriving a child copies the parent's segments, so
/// siblings built from the same parent never alias each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocatorChain {
    segments: Vec<Locator>,
}

/// How a chain is turned into session queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
    /// One query from the document root
    Single(Locator),
    /// Resolve each ancestor to its first match, then search the leaf inside it
    Scoped(Vec<Locator>),
}

impl LocatorChain {
    /// The empty chain, meaning "search from the document root"
    pub fn root() -> Self {
        Self::default()
    }

    /// Chain over `segments`, root first
    pub fn new(segments: Vec<Locator>) -> Self {
        Self { segments }
    }

    /// `self ++ [segment]`, leaving `self` untouched
    pub fn child(&self, segment: Locator) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    /// Segments in root-to-leaf order
    pub fn segments(&self) -> &[Locator] {
        &self.segments
    }

    /// The target's own segment, `None` for the root chain
    pub fn leaf(&self) -> Option<&Locator> {
        self.segments.last()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root chain
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fully composed CSS selector, descendant-joined
    pub fn to_css(&self) -> Result<Locator> {
        self.ensure_resolvable()?;
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let fragment = segment.css_fragment().ok_or_else(|| {
                Error::invalid_locator(format!(
                    "Locator: {} has a strategy of {} which is incompatible with the css selector builder",
                    segment,
                    segment.strategy()
                ))
            })?;
            parts.push(fragment);
        }
        Ok(Locator::css(parts.join(" ")))
    }

    /// Fully composed XPath expression
    pub fn to_xpath(&self) -> Result<Locator> {
        self.ensure_resolvable()?;
        let mut xpath = String::new();
        for segment in &self.segments {
            let fragment = segment.xpath_fragment().ok_or_else(|| {
                Error::invalid_locator(format!(
                    "Locator: {} has a strategy of {} which is incompatible with the xpath builder",
                    segment,
                    segment.strategy()
                ))
            })?;
            xpath.push_str(&fragment);
        }
        Ok(Locator::xpath(xpath))
    }

    /// Pick the cheapest way to resolve this chain.
    ///
    /// A single segment is queried as-is. Longer chains are composed into
    /// one CSS selector when every segment allows it, otherwise one XPath,
    /// otherwise resolved step by step.
    pub fn plan(&self) -> Result<ResolutionPlan> {
        self.ensure_resolvable()?;
        if self.segments.len() == 1 {
            return Ok(ResolutionPlan::Single(self.segments[0].clone()));
        }
        if self.segments.iter().all(|s| s.strategy().renders_as_css()) {
            return self.to_css().map(ResolutionPlan::Single);
        }
        if self.segments.iter().all(|s| s.strategy().renders_as_xpath()) {
            return self.to_xpath().map(ResolutionPlan::Single);
        }
        Ok(ResolutionPlan::Scoped(self.segments.clone()))
    }

    fn ensure_resolvable(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(Error::invalid_locator("cannot resolve an empty locator chain"));
        }
        Ok(())
    }

    /// True when any segment would need XPath to be expressed
    pub fn requires_xpath(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s.strategy(), Strategy::XPath | Strategy::LinkText | Strategy::PartialLinkText))
    }
}

impl From<Locator> for LocatorChain {
    fn from(segment: Locator) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<document root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
