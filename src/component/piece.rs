//! Component piece: a locator slot bound to a session and a wait policy

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::resolver::ElementResolver;
use crate::config::WaitConfig;
use crate::locator::{Locator, LocatorChain, LocatorSlot};
use crate::session::{AutomationSession, ElementHandle};
use crate::wait::{Comparison, Condition, ConditionExt, ElementPresent, Polled, Poller, SettleWait, WaitPolicy};
use crate::{Error, Result};

/// Where a piece reads its text from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextSource {
    /// Rendered text of the element and its descendants
    #[default]
    Rendered,
    /// An attribute, falling back to an empty string when absent
    Attribute(String),
}

impl TextSource {
    /// The live `value` of an input
    pub fn value() -> Self {
        TextSource::Attribute("value".to_string())
    }
}

/// A point in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The unit every page object is built from.
///
/// A piece owns its [`LocatorSlot`] and re-resolves it on every call; live
/// handles are never kept between calls.
#[derive(Clone)]
pub struct ComponentPiece {
    pub(super) session: Arc<dyn AutomationSession>,
    slot: LocatorSlot,
    pub(super) policy: WaitPolicy,
    pub(super) settle: SettleWait,
    text_source: TextSource,
    pub(super) text_prefill_wait: Duration,
    pub(super) text_verify_grace: Duration,
    description: Option<String>,
}

impl fmt::Debug for ComponentPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPiece")
            .field("chain", self.slot.chain())
            .field("policy", &self.policy)
            .field("settle", &self.settle)
            .field("text_source", &self.text_source)
            .field("description", &self.description)
            .finish()
    }
}

/// Builder for [`ComponentPiece`]
pub struct PieceBuilder {
    session: Arc<dyn AutomationSession>,
    locator: Locator,
    parent: Option<LocatorChain>,
    policy: WaitPolicy,
    settle: SettleWait,
    text_source: TextSource,
    text_prefill_wait: Duration,
    text_verify_grace: Duration,
    description: Option<String>,
}

impl PieceBuilder {
    fn new(locator: Locator, session: Arc<dyn AutomationSession>) -> Self {
        let defaults = WaitConfig::default();
        Self {
            session,
            locator,
            parent: None,
            policy: defaults.policy(),
            settle: defaults.settle(),
            text_source: TextSource::default(),
            text_prefill_wait: defaults.text_prefill_wait(),
            text_verify_grace: defaults.text_verify_grace(),
            description: None,
        }
    }

    /// Chain of the enclosing component; omitted means the document root
    pub fn parent(mut self, chain: &LocatorChain) -> Self {
        self.parent = Some(chain.clone());
        self
    }

    /// Take every wait setting from a configuration
    pub fn config(mut self, config: &WaitConfig) -> Self {
        self.policy = config.policy();
        self.settle = config.settle();
        self.text_prefill_wait = config.text_prefill_wait();
        self.text_verify_grace = config.text_verify_grace();
        self
    }

    /// Timeout and poll interval for reads
    pub fn policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default read timeout, keeping the poll interval
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.policy = self.policy.with_timeout(timeout);
        self
    }

    /// Default pause between attempts, keeping the timeout
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.policy = self.policy.with_poll_interval(interval);
        self
    }

    /// Default settle wait after mutating interactions
    pub fn settle(mut self, settle: impl Into<SettleWait>) -> Self {
        self.settle = settle.into();
        self
    }

    /// Where `get_text` reads from
    pub fn text_source(mut self, source: TextSource) -> Self {
        self.text_source = source;
        self
    }

    /// Diagnostic label, reported in `NotFound` errors
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Compose the chain and build the piece
    pub fn build(self) -> ComponentPiece {
        ComponentPiece {
            session: self.session,
            slot: LocatorSlot::new(self.locator, self.parent.as_ref()),
            policy: self.policy,
            settle: self.settle,
            text_source: self.text_source,
            text_prefill_wait: self.text_prefill_wait,
            text_verify_grace: self.text_verify_grace,
            description: self.description,
        }
    }
}

impl ComponentPiece {
    /// Builder for a root-level piece with default waits
    pub fn builder(locator: Locator, session: Arc<dyn AutomationSession>) -> PieceBuilder {
        PieceBuilder::new(locator, session)
    }

    /// A root-level piece with default waits
    pub fn new(locator: Locator, session: Arc<dyn AutomationSession>) -> Self {
        Self::builder(locator, session).build()
    }

    /// Builder for a piece nested under this one, inheriting the session and
    /// wait settings
    pub fn child(&self, locator: Locator) -> PieceBuilder {
        PieceBuilder {
            session: self.session.clone(),
            locator,
            parent: Some(self.chain().clone()),
            policy: self.policy,
            settle: self.settle,
            text_source: TextSource::default(),
            text_prefill_wait: self.text_prefill_wait,
            text_verify_grace: self.text_verify_grace,
            description: None,
        }
    }

    /// The composed chain every call resolves
    pub fn chain(&self) -> &LocatorChain {
        self.slot.chain()
    }

    /// This piece's own trailing segment
    pub fn locator(&self) -> &Locator {
        self.slot.own()
    }

    /// Chain of the enclosing component
    pub fn parent_chain(&self) -> &LocatorChain {
        self.slot.parent()
    }

    /// Diagnostic label, if one was given
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Default wait policy for reads
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Default settle wait after mutating interactions
    pub fn settle(&self) -> SettleWait {
        self.settle
    }

    /// Where `get_text` reads from
    pub fn text_source(&self) -> &TextSource {
        &self.text_source
    }

    /// Session this piece queries
    pub fn session(&self) -> &Arc<dyn AutomationSession> {
        &self.session
    }

    /// Retarget this piece. Pieces already built from the old chain keep it.
    pub fn set_locator(&mut self, locator: Locator) {
        debug!(from = %self.slot.own(), to = %locator, "Replacing locator");
        self.slot.replace(locator);
    }

    /// Resolver over this piece's session
    pub fn resolver(&self) -> ElementResolver {
        ElementResolver::new(self.session.clone())
    }

    /// First element matching the chain, waiting up to `timeout` (the
    /// piece's default when `None`; zero means a single attempt)
    pub async fn find(&self, timeout: Option<Duration>) -> Result<ElementHandle> {
        self.find_with_policy(self.policy.overridden(timeout, None)).await
    }

    pub async fn find_with_policy(&self, policy: WaitPolicy) -> Result<ElementHandle> {
        self.resolver()
            .resolve_one(self.chain(), policy, self.description())
            .await
    }

    /// Every element matching the chain, once at least one is present
    pub async fn find_all(&self, timeout: Option<Duration>) -> Result<Vec<ElementHandle>> {
        self.find_all_with_policy(self.policy.overridden(timeout, None)).await
    }

    pub async fn find_all_with_policy(&self, policy: WaitPolicy) -> Result<Vec<ElementHandle>> {
        self.resolver()
            .resolve_all(self.chain(), policy, self.description())
            .await
    }

    /// Whether the chain resolves within `timeout`. Absence is `false`, not
    /// an error.
    pub async fn is_present(&self, timeout: Option<Duration>) -> Result<bool> {
        let policy = self.policy.overridden(timeout, None);
        Ok(self.resolver().poll_one(self.chain(), policy).await?.is_satisfied())
    }

    /// Whether the element is present within `timeout` and rendered visibly
    pub async fn is_displayed(&self, timeout: Option<Duration>) -> Result<bool> {
        let policy = self.policy.overridden(timeout, None);
        let Some(element) = self.resolver().poll_one(self.chain(), policy).await?.satisfied() else {
            return Ok(false);
        };
        let session = self.session.as_ref();
        match self
            .with_element(element, "is_displayed", move |el| async move { session.is_displayed(&el).await })
            .await
        {
            Err(e) if e.is_not_found() => Ok(false),
            other => other,
        }
    }

    /// Resolve, then run `operation` on the element, resolving once more if
    /// the handle went stale
    pub(crate) async fn retry_on_stale<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: Fn(ElementHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let element = self.find(None).await?;
        self.with_element(element, operation, f).await
    }

    async fn with_element<T, F, Fut>(&self, element: ElementHandle, operation: &'static str, f: F) -> Result<T>
    where
        F: Fn(ElementHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match f(element).await {
            Err(e) if e.is_stale() => {
                warn!(chain = %self.chain(), operation, "Stale element, resolving again");
                let fresh = self.find(None).await?;
                f(fresh).await
            }
            other => other,
        }
    }

    /// Text of this piece, from its configured [`TextSource`]
    pub async fn get_text(&self) -> Result<String> {
        self.read_source(&self.text_source).await
    }

    pub(crate) async fn read_source(&self, source: &TextSource) -> Result<String> {
        let session = self.session.as_ref();
        match source {
            TextSource::Rendered => {
                self.retry_on_stale("get_text", move |el| async move { session.text(&el).await })
                    .await
            }
            TextSource::Attribute(name) => {
                let name = name.as_str();
                self.retry_on_stale("get_text", move |el| async move {
                    Ok(session.attribute(&el, name).await?.unwrap_or_default())
                })
                .await
            }
        }
    }

    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let session = self.session.as_ref();
        self.retry_on_stale("get_attribute", move |el| async move { session.attribute(&el, name).await })
            .await
    }

    pub async fn get_css_property(&self, property: &str) -> Result<String> {
        let session = self.session.as_ref();
        self.retry_on_stale("get_css_property", move |el| async move {
            session.css_value(&el, property).await
        })
        .await
    }

    pub async fn tag_name(&self) -> Result<String> {
        let session = self.session.as_ref();
        self.retry_on_stale("tag_name", move |el| async move { session.tag_name(&el).await })
            .await
    }

    /// Upper-left corner
    pub async fn get_origin(&self) -> Result<Point> {
        let session = self.session.as_ref();
        let rect = self
            .retry_on_stale("get_origin", move |el| async move { session.rect(&el).await })
            .await?;
        Ok(Point { x: rect.x, y: rect.y })
    }

    /// Lower-right corner
    pub async fn get_termination(&self) -> Result<Point> {
        let session = self.session.as_ref();
        let rect = self
            .retry_on_stale("get_termination", move |el| async move { session.rect(&el).await })
            .await?;
        Ok(Point {
            x: rect.x + rect.width,
            y: rect.y + rect.height,
        })
    }

    /// Computed CSS width, `px` stripped unless `include_units`. Flex items
    /// report `auto`, in which case the rendered width is used.
    pub async fn computed_width(&self, include_units: bool) -> Result<String> {
        self.computed_dimension("width", include_units).await
    }

    /// Computed CSS height; see [`computed_width`](Self::computed_width)
    pub async fn computed_height(&self, include_units: bool) -> Result<String> {
        self.computed_dimension("height", include_units).await
    }

    async fn computed_dimension(&self, property: &'static str, include_units: bool) -> Result<String> {
        let session = self.session.as_ref();
        let (value, rect) = self
            .retry_on_stale(property, move |el| async move {
                let value = session.css_value(&el, property).await?;
                let rect = if value == "auto" {
                    Some(session.rect(&el).await?)
                } else {
                    None
                };
                Ok((value, rect))
            })
            .await?;

        if let Some(rect) = rect {
            let size = if property == "width" { rect.width } else { rect.height };
            return Ok(size.to_string());
        }
        if include_units {
            return Ok(value);
        }
        Ok(value.split("px").next().unwrap_or_default().to_string())
    }

    /// First element of the collection whose rendered text is exactly `text`
    pub async fn find_with_text(&self, text: &str, timeout: Option<Duration>) -> Result<ElementHandle> {
        for element in self.find_all(timeout).await? {
            match self.session.text(&element).await {
                Ok(found) if found == text => return Ok(element),
                Ok(_) => {}
                Err(e) if e.is_stale() => debug!(%element, "Skipping stale element during text lookup"),
                Err(e) => return Err(e),
            }
        }
        Err(Error::lookup(format!(
            "No element matching {} has the text {:?}",
            self.chain(),
            text
        )))
    }

    /// Text of this piece after waiting up to `timeout` for it to satisfy
    /// `comparison` against `expected`.
    ///
    /// With no `expected` the text is read once and returned. Failing to
    /// resolve the piece propagates `NotFound`; a comparison that never holds
    /// returns the last text read so the caller can assert on it.
    pub async fn wait_on_text_condition(
        &self,
        expected: Option<&str>,
        comparison: impl Into<Comparison>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.wait_on_source(&self.text_source, expected, comparison.into(), timeout)
            .await
    }

    pub(crate) async fn wait_on_source(
        &self,
        source: &TextSource,
        expected: Option<&str>,
        comparison: Comparison,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let Some(expected) = expected else {
            return self.read_source(source).await;
        };

        let last = Mutex::new(String::new());
        let last_ref = &last;
        let outcome = Poller::new(self.policy.overridden(timeout, None))
            .poll(move || async move {
                let text = match self.read_source(source).await {
                    Ok(text) => text,
                    Err(e) if e.is_stale() => {
                        trace!(chain = %self.chain(), error = %e, "Stale element during text wait");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                let matched = comparison.matches(&text, expected);
                *last_ref.lock().unwrap_or_else(PoisonError::into_inner) = text;
                Ok(matched.then_some(()))
            })
            .await?;

        let text = last.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Polled::TimedOut(t) = outcome {
            debug!(chain = %self.chain(), %comparison, expected, observed = %text, attempts = t.attempts, "Text condition not met");
        }
        Ok(text)
    }

    /// Wait for any condition against this piece's session
    pub async fn wait_on_condition<C>(&self, condition: &C, timeout: Option<Duration>) -> Result<Polled<C::Output>>
    where
        C: Condition + ?Sized,
    {
        Poller::new(self.policy.overridden(timeout, None))
            .until(self.session.as_ref(), condition)
            .await
    }

    /// Like [`wait_on_condition`](Self::wait_on_condition), failing with
    /// `Timeout` when the condition never holds
    pub async fn wait_until<C>(&self, condition: &C, timeout: Option<Duration>) -> Result<C::Output>
    where
        C: Condition + ?Sized,
    {
        self.wait_on_condition(condition, timeout).await?.ok_or_else(|t| {
            Error::timeout(format!(
                "{} not met after {:?} ({} attempts)",
                condition.describe(),
                t.elapsed,
                t.attempts
            ))
        })
    }

    /// Wait for the chain to stop matching; `true` once nothing matches
    pub async fn wait_until_absent(&self, timeout: Option<Duration>) -> Result<bool> {
        let gone = ElementPresent::new(self.chain().clone()).negate();
        Ok(self.wait_on_condition(&gone, timeout).await?.is_satisfied())
    }
}
