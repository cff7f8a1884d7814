//! Element resolution through the poller
//!
//! Query, return on a hit, sleep and retry on a miss, give up at the
//! deadline. The query itself follows the chain's [`ResolutionPlan`].

use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::locator::{LocatorChain, ResolutionPlan};
use crate::session::{AutomationSession, ElementHandle};
use crate::wait::{Polled, Poller, WaitPolicy};
use crate::{Error, Result};

/// One immediate query for `chain`, no waiting.
///
/// Scoped plans resolve each ancestor to its first match and search the
/// next segment inside it; a missing ancestor yields no elements.
pub async fn query(session: &dyn AutomationSession, chain: &LocatorChain) -> Result<Vec<ElementHandle>> {
    match chain.plan()? {
        ResolutionPlan::Single(locator) => session.find_elements(None, &locator).await,
        ResolutionPlan::Scoped(segments) => {
            let Some((leaf, ancestors)) = segments.split_last() else {
                return Ok(Vec::new());
            };
            let mut scope: Option<ElementHandle> = None;
            for segment in ancestors {
                let segment = match scope {
                    Some(_) => segment.relative_to_scope(),
                    None => segment.clone(),
                };
                let first = session.find_elements(scope.as_ref(), &segment).await?.into_iter().next();
                match first {
                    Some(found) => scope = Some(found),
                    None => {
                        trace!(%segment, "Scope segment not present");
                        return Ok(Vec::new());
                    }
                }
            }
            let leaf = match scope {
                Some(_) => leaf.relative_to_scope(),
                None => leaf.clone(),
            };
            session.find_elements(scope.as_ref(), &leaf).await
        }
    }
}

/// Query that treats a scope going stale mid-query as "nothing yet"
async fn attempt(session: &dyn AutomationSession, chain: &LocatorChain) -> Result<Vec<ElementHandle>> {
    match query(session, chain).await {
        Err(e) if e.is_stale() => {
            trace!(%chain, "Scope went stale during query");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Resolves locator chains to live handles
#[derive(Clone)]
pub struct ElementResolver {
    session: Arc<dyn AutomationSession>,
}

impl ElementResolver {
    pub fn new(session: Arc<dyn AutomationSession>) -> Self {
        Self { session }
    }

    /// Session queries run against
    pub fn session(&self) -> &Arc<dyn AutomationSession> {
        &self.session
    }

    /// Single query, no waiting
    pub async fn query(&self, chain: &LocatorChain) -> Result<Vec<ElementHandle>> {
        query(self.session.as_ref(), chain).await
    }

    /// Wait for at least one match, returning all of them
    pub async fn poll_all(&self, chain: &LocatorChain, policy: WaitPolicy) -> Result<Polled<Vec<ElementHandle>>> {
        let session = self.session.as_ref();
        Poller::new(policy)
            .poll(move || async move {
                let found = attempt(session, chain).await?;
                Ok((!found.is_empty()).then_some(found))
            })
            .await
    }

    /// Wait for the first match in document order
    pub async fn poll_one(&self, chain: &LocatorChain, policy: WaitPolicy) -> Result<Polled<ElementHandle>> {
        let session = self.session.as_ref();
        Poller::new(policy)
            .poll(move || async move { Ok(attempt(session, chain).await?.into_iter().next()) })
            .await
    }

    /// Like [`poll_one`](Self::poll_one), failing with `NotFound` on timeout
    #[instrument(level = "debug", skip(self, chain, policy, description), fields(chain = %chain))]
    pub async fn resolve_one(
        &self,
        chain: &LocatorChain,
        policy: WaitPolicy,
        description: Option<&str>,
    ) -> Result<ElementHandle> {
        let element = self
            .poll_one(chain, policy)
            .await?
            .ok_or_else(|_| not_found(chain, policy, description))?;
        debug!(%element, "Resolved element");
        Ok(element)
    }

    /// Like [`poll_all`](Self::poll_all), failing with `NotFound` on timeout
    #[instrument(level = "debug", skip(self, chain, policy, description), fields(chain = %chain))]
    pub async fn resolve_all(
        &self,
        chain: &LocatorChain,
        policy: WaitPolicy,
        description: Option<&str>,
    ) -> Result<Vec<ElementHandle>> {
        let elements = self
            .poll_all(chain, policy)
            .await?
            .ok_or_else(|_| not_found(chain, policy, description))?;
        debug!(count = elements.len(), "Resolved elements");
        Ok(elements)
    }
}

fn not_found(chain: &LocatorChain, policy: WaitPolicy, description: Option<&str>) -> Error {
    Error::not_found(chain.to_string(), description.map(str::to_string), policy.timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::session::{MockNode, MockSession};
    use std::time::Duration;

    fn session_with_menu() -> Arc<MockSession> {
        let session = Arc::new(MockSession::new());
        let menu = session.append(None, MockNode::new("div").class("menu"));
        session.append(Some(menu), MockNode::new("a").text("Home"));
        session.append(None, MockNode::new("a").text("Home"));
        session
    }

    #[tokio::test]
    async fn test_scoped_plan_stays_inside_scope() {
        let session = session_with_menu();
        let chain = LocatorChain::from(Locator::css("div.menu")).child(Locator::link_text("Home"));
        let found = query(session.as_ref(), &chain).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_scoped_plan_missing_ancestor() {
        let session = session_with_menu();
        let chain = LocatorChain::from(Locator::css("div.sidebar")).child(Locator::link_text("Home"));
        assert!(query(session.as_ref(), &chain).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_one_not_found_carries_chain() {
        let session = session_with_menu();
        let resolver = ElementResolver::new(session);
        let chain = LocatorChain::from(Locator::css("span.never"));
        let err = resolver
            .resolve_one(&chain, WaitPolicy::immediate(), Some("missing span"))
            .await
            .unwrap_err();
        match err {
            Error::NotFound { chain, description, timeout } => {
                assert_eq!(chain, "css=span.never");
                assert_eq!(description.as_deref(), Some("missing span"));
                assert_eq!(timeout, Duration::ZERO);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_all_returns_every_match() {
        let session = session_with_menu();
        let resolver = ElementResolver::new(session);
        let all = resolver
            .resolve_all(&LocatorChain::from(Locator::tag("a")), WaitPolicy::immediate(), None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_selector_is_an_error_not_a_timeout() {
        let session = session_with_menu();
        let resolver = ElementResolver::new(session);
        let policy = WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(10));
        let err = resolver
            .resolve_one(&LocatorChain::from(Locator::css("a:hover")), policy, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLocator(_)));
    }
}
