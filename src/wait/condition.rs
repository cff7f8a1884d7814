//! Condition predicate protocol

use async_trait::async_trait;
use std::fmt;

use crate::session::AutomationSession;
use crate::Result;

/// A repeatedly evaluated check against the live session.
///
/// `check` returns `Some(output)` once the condition holds (often the
/// element it matched, so callers need not resolve it again) and `None`
/// while it does not. Implementations capture everything they compare
/// against at construction and keep no state between checks.
#[async_trait]
pub trait Condition: Send + Sync {
    type Output: Send;

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<Self::Output>>;

    /// Human-readable summary for logs and timeout messages
    fn describe(&self) -> String;
}

/// Holds when the wrapped condition does not
#[derive(Debug, Clone)]
pub struct Not<C>(pub C);

#[async_trait]
impl<C: Condition> Condition for Not<C> {
    type Output = ();

    async fn check(&self, session: &dyn AutomationSession) -> Result<Option<()>> {
        Ok(match self.0.check(session).await? {
            Some(_) => None,
            None => Some(()),
        })
    }

    fn describe(&self) -> String {
        format!("not ({})", self.0.describe())
    }
}

/// Combinators available on every condition
pub trait ConditionExt: Condition + Sized {
    fn negate(self) -> Not<Self> {
        Not(self)
    }
}

impl<C: Condition> ConditionExt for C {}

impl<C: Condition> fmt::Display for Not<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
