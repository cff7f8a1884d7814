//! Built-in condition predicates

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

use super::comparison::{Comparison, TextCondition};
use super::condition::Condition;
use crate::component::resolver::query;
use crate::locator::{Locator, LocatorChain};
use crate::session::{AutomationSession, ElementHandle, EvaluationResult};
use crate::Result;

/// Script returning `[innerWidth, innerHeight]`
pub const VIEWPORT_SIZE_SCRIPT: &str = "return [window.innerWidth, window.innerHeight];";

/// Script returning `document.readyState`
pub const READY_STATE_SCRIPT: &str = "return document.readyState;";

async fn first(session: &dyn AutomationSession, chain: &LocatorChain) -> Result<Option<ElementHandle>> {
    Ok(query(session, chain).await?.into_iter().next())
}

/// The chain matches at least one element; yields the first
#[derive(Debug, Clone)]
pub struct ElementPresent {
    chain: LocatorChain,
}

impl ElementPresent {
    pub fn new(chain: impl Into<LocatorChain>) -> Self {
        Self { chain: chain.into() }
    }
}

#[async_trait]
impl Condition for ElementPresent {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        first(session, &self.chain).await
    }

    fn describe(&self) -> String {
        format!("element present: {}", self.chain)
    }
}

/// The chain matches one or more elements; yields all of them
#[derive(Debug, Clone)]
pub struct AllElementsPresent {
    chain: LocatorChain,
}

impl AllElementsPresent {
    pub fn new(chain: impl Into<LocatorChain>) -> Self {
        Self { chain: chain.into() }
    }
}

#[async_trait]
impl Condition for AllElementsPresent {
    type Output = Vec<ElementHandle>;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<Vec<ElementHandle>>> {
        let found = query(session, &self.chain).await?;
        Ok((!found.is_empty()).then_some(found))
    }

    fn describe(&self) -> String {
        format!("elements present: {}", self.chain)
    }
}

/// The first element's rendered text satisfies a comparison; yields the
/// element
#[derive(Debug, Clone)]
pub struct TextMatches {
    chain: LocatorChain,
    expected: String,
    comparison: Comparison,
}

impl TextMatches {
    pub fn new(chain: impl Into<LocatorChain>, expected: impl Into<String>, comparison: impl Into<Comparison>) -> Self {
        Self {
            chain: chain.into(),
            expected: expected.into(),
            comparison: comparison.into(),
        }
    }

    pub fn equals(chain: impl Into<LocatorChain>, expected: impl Into<String>) -> Self {
        Self::new(chain, expected, TextCondition::Equals)
    }

    pub fn contains(chain: impl Into<LocatorChain>, expected: impl Into<String>) -> Self {
        Self::new(chain, expected, TextCondition::Contains)
    }

    pub fn does_not_equal(chain: impl Into<LocatorChain>, expected: impl Into<String>) -> Self {
        Self::new(chain, expected, TextCondition::DoesNotEqual)
    }
}

#[async_trait]
impl Condition for TextMatches {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        let Some(element) = first(session, &self.chain).await? else {
            return Ok(None);
        };
        let text = session.text(&element).await?;
        Ok(self.comparison.matches(&text, &self.expected).then_some(element))
    }

    fn describe(&self) -> String {
        format!("text of {} {} {:?}", self.chain, self.comparison, self.expected)
    }
}

/// Some element in the matched collection has exactly this text
#[derive(Debug, Clone)]
pub struct AnyElementHasText {
    chain: LocatorChain,
    text: String,
}

impl AnyElementHasText {
    pub fn new(chain: impl Into<LocatorChain>, text: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl Condition for AnyElementHasText {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        for element in query(session, &self.chain).await? {
            if session.text(&element).await? == self.text {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        format!("an element of {} has text {:?}", self.chain, self.text)
    }
}

/// The first element's attribute equals a value; `value` is the usual one
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    chain: LocatorChain,
    name: String,
    expected: String,
}

impl AttributeEquals {
    pub fn new(chain: impl Into<LocatorChain>, name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            name: name.into(),
            expected: expected.into(),
        }
    }

    pub fn value(chain: impl Into<LocatorChain>, expected: impl Into<String>) -> Self {
        Self::new(chain, "value", expected)
    }
}

#[async_trait]
impl Condition for AttributeEquals {
    type Output = String;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<String>> {
        let Some(element) = first(session, &self.chain).await? else {
            return Ok(None);
        };
        let actual = session.attribute(&element, &self.name).await?;
        Ok((actual.as_deref() == Some(self.expected.as_str())).then(|| self.expected.clone()))
    }

    fn describe(&self) -> String {
        format!("{} of {} equals {:?}", self.name, self.chain, self.expected)
    }
}

/// The `class` attribute is exactly this string
#[derive(Debug, Clone)]
pub struct HasExactClass {
    chain: LocatorChain,
    class: String,
}

impl HasExactClass {
    pub fn new(chain: impl Into<LocatorChain>, class: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            class: class.into(),
        }
    }
}

#[async_trait]
impl Condition for HasExactClass {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        let Some(element) = first(session, &self.chain).await? else {
            return Ok(None);
        };
        let class = session.attribute(&element, "class").await?;
        Ok((class.as_deref() == Some(self.class.as_str())).then_some(element))
    }

    fn describe(&self) -> String {
        format!("class of {} is exactly {:?}", self.chain, self.class)
    }
}

/// A child of the first matched element has `partial` inside its `class`
/// attribute; yields the parent
#[derive(Debug, Clone)]
pub struct ChildHasPartialClass {
    parent: LocatorChain,
    child: Locator,
    partial: String,
}

impl ChildHasPartialClass {
    pub fn new(parent: impl Into<LocatorChain>, child: Locator, partial: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child,
            partial: partial.into(),
        }
    }
}

#[async_trait]
impl Condition for ChildHasPartialClass {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        let Some(parent) = first(session, &self.parent).await? else {
            return Ok(None);
        };
        let child_locator = self.child.relative_to_scope();
        let Some(child) = session.find_elements(Some(&parent), &child_locator).await?.into_iter().next() else {
            return Ok(None);
        };
        let class = session.attribute(&child, "class").await?.unwrap_or_default();
        Ok(class.contains(self.partial.as_str()).then_some(parent))
    }

    fn describe(&self) -> String {
        format!(
            "child {} of {} has class containing {:?}",
            self.child, self.parent, self.partial
        )
    }
}

/// The first matched element lies entirely inside the viewport
#[derive(Debug, Clone)]
pub struct FullyInViewport {
    chain: LocatorChain,
}

impl FullyInViewport {
    pub fn new(chain: impl Into<LocatorChain>) -> Self {
        Self { chain: chain.into() }
    }
}

fn viewport_size(result: &EvaluationResult) -> Option<(f64, f64)> {
    let EvaluationResult::Object(value) = result else {
        return None;
    };
    let dims = value.as_array()?;
    Some((dims.first()?.as_f64()?, dims.get(1)?.as_f64()?))
}

#[async_trait]
impl Condition for FullyInViewport {
    type Output = ElementHandle;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<ElementHandle>> {
        let Some(element) = first(session, &self.chain).await? else {
            return Ok(None);
        };
        let rect = session.rect(&element).await?;
        let Some((width, height)) = viewport_size(&session.execute_script(VIEWPORT_SIZE_SCRIPT, &[]).await?) else {
            return Ok(None);
        };
        let inside = rect.x >= 0.0
            && rect.y >= 0.0
            && rect.x + rect.width <= width
            && rect.y + rect.height <= height;
        Ok(inside.then_some(element))
    }

    fn describe(&self) -> String {
        format!("{} fully in viewport", self.chain)
    }
}

/// The session reports a current URL and a fully loaded document
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReady;

#[async_trait]
impl Condition for SessionReady {
    type Output = String;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<String>> {
        let Some(url) = session.current_url().await? else {
            return Ok(None);
        };
        let state = session.execute_script(READY_STATE_SCRIPT, &[]).await?;
        Ok(matches!(state, EvaluationResult::String(ref s) if s == "complete").then_some(url))
    }

    fn describe(&self) -> String {
        "session ready".to_string()
    }
}

/// Future returned by a [`Predicate`] check
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// A caller-supplied boolean check
pub struct Predicate<F> {
    description: String,
    check: F,
}

impl<F> Predicate<F>
where
    F: for<'a> Fn(&'a dyn AutomationSession) -> CheckFuture<'a> + Send + Sync,
{
    pub fn new(description: impl Into<String>, check: F) -> Self {
        Self {
            description: description.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> Condition for Predicate<F>
where
    F: for<'a> Fn(&'a dyn AutomationSession) -> CheckFuture<'a> + Send + Sync,
{
    type Output = ();

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<()>> {
        Ok((self.check)(session).await?.then_some(()))
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockMutation, MockNode, MockSession, Rect};
    use crate::wait::{ConditionExt, Poller, WaitPolicy};
    use std::time::Duration;

    fn policy() -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(300), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_text_matches_waits_for_update() {
        let session = MockSession::new();
        let label = session.append(None, MockNode::new("span").id("status").text("Loading"));
        session.schedule(Duration::from_millis(40), MockMutation::SetText(label, "Ready".into()));

        let condition = TextMatches::equals(Locator::id("status"), "Ready");
        let outcome = Poller::new(policy()).until(&session, &condition).await.unwrap();
        assert!(outcome.is_satisfied());
    }

    #[tokio::test]
    async fn test_any_element_has_text() {
        let session = MockSession::new();
        let list = session.append(None, MockNode::new("ul"));
        session.append(Some(list), MockNode::new("li").text("one"));
        session.append(Some(list), MockNode::new("li").text("two"));

        let hit = AnyElementHasText::new(Locator::css("ul li"), "two");
        assert!(hit.check(&session).await.unwrap().is_some());
        let miss = AnyElementHasText::new(Locator::css("ul li"), "tw");
        assert!(miss.check(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_class_conditions() {
        let session = MockSession::new();
        let row = session.append(None, MockNode::new("div").class("row selected"));
        session.append(Some(row), MockNode::new("span").class("icon-warning-large"));

        assert!(HasExactClass::new(Locator::css("div.row"), "row selected")
            .check(&session)
            .await
            .unwrap()
            .is_some());
        assert!(HasExactClass::new(Locator::css("div.row"), "row")
            .check(&session)
            .await
            .unwrap()
            .is_none());
        assert!(ChildHasPartialClass::new(Locator::css("div.row"), Locator::tag("span"), "warning")
            .check(&session)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_attribute_equals_value() {
        let session = MockSession::new();
        session.append(None, MockNode::new("input").id("qty").value("3"));
        let condition = AttributeEquals::value(Locator::id("qty"), "3");
        assert_eq!(condition.check(&session).await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_fully_in_viewport() {
        let session = MockSession::new();
        session.set_viewport(800.0, 600.0);
        session.append(None, MockNode::new("div").id("in").rect(Rect::new(10.0, 10.0, 100.0, 100.0)));
        session.append(None, MockNode::new("div").id("out").rect(Rect::new(750.0, 10.0, 100.0, 100.0)));

        assert!(FullyInViewport::new(Locator::id("in")).check(&session).await.unwrap().is_some());
        assert!(FullyInViewport::new(Locator::id("out")).check(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_ready() {
        let session = MockSession::new();
        session.set_ready_state("loading");
        assert!(SessionReady.check(&session).await.unwrap().is_none());
        session.set_ready_state("complete");
        assert_eq!(SessionReady.check(&session).await.unwrap().as_deref(), Some("about:blank"));
    }

    #[tokio::test]
    async fn test_negation_waits_for_removal() {
        let session = MockSession::new();
        let toast = session.append(None, MockNode::new("div").class("toast"));
        session.schedule(Duration::from_millis(30), MockMutation::Remove(toast));

        let gone = ElementPresent::new(Locator::css("div.toast")).negate();
        assert_eq!(gone.describe(), "not (element present: css=div.toast)");
        let outcome = Poller::new(policy()).until(&session, &gone).await.unwrap();
        assert!(outcome.is_satisfied());
    }

    #[tokio::test]
    async fn test_predicate_from_closure() {
        let session = MockSession::new();
        session.append(None, MockNode::new("p"));
        let predicate = Predicate::new("two paragraphs", |s| {
            Box::pin(async move { Ok(s.find_elements(None, &Locator::tag("p")).await?.len() == 2) })
        });
        assert!(predicate.check(&session).await.unwrap().is_none());
        session.append(None, MockNode::new("p"));
        assert!(predicate.check(&session).await.unwrap().is_some());
    }
}
