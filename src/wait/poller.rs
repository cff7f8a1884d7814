//! Bounded polling loop

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::condition::Condition;
use crate::session::AutomationSession;
use crate::Result;

/// Default time a read waits for its element
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Smallest pause the poller will sleep between attempts
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timeout and poll interval for one wait.
///
/// Components hold one as their defaults; per-call overrides build a new
/// policy and never touch the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl WaitPolicy {
    /// The poll interval is clamped to [`MIN_POLL_INTERVAL`]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Exactly one attempt, no sleeping
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, DEFAULT_POLL_INTERVAL)
    }

    /// Total time a wait may take
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pause between attempts
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Same interval, different timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::new(timeout, self.poll_interval)
    }

    /// Same timeout, different interval (clamped like [`WaitPolicy::new`])
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self::new(self.timeout, poll_interval)
    }

    /// Policy for one call, keeping `self` for anything not overridden
    pub fn overridden(&self, timeout: Option<Duration>, poll_interval: Option<Duration>) -> Self {
        Self::new(
            timeout.unwrap_or(self.timeout),
            poll_interval.unwrap_or(self.poll_interval),
        )
    }
}

/// Why a wait gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    /// Time spent before giving up
    pub elapsed: Duration,
    /// Number of attempts made, at least one
    pub attempts: u32,
}

/// Outcome of a wait that did not fail outright
#[derive(Debug, Clone, PartialEq)]
pub enum Polled<T> {
    Satisfied(T),
    TimedOut(TimedOut),
}

impl<T> Polled<T> {
    /// Whether the wait found a value
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Polled::Satisfied(_))
    }

    /// The found value, `None` on timeout
    pub fn satisfied(self) -> Option<T> {
        match self {
            Polled::Satisfied(value) => Some(value),
            Polled::TimedOut(_) => None,
        }
    }

    /// Transform the found value, keeping a timeout as-is
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Polled<U> {
        match self {
            Polled::Satisfied(value) => Polled::Satisfied(f(value)),
            Polled::TimedOut(t) => Polled::TimedOut(t),
        }
    }

    /// Turn a timeout into the caller's error
    pub fn ok_or_else<E>(self, err: impl FnOnce(TimedOut) -> E) -> std::result::Result<T, E> {
        match self {
            Polled::Satisfied(value) => Ok(value),
            Polled::TimedOut(t) => Err(err(t)),
        }
    }
}

/// Re-evaluates an attempt until it yields a value or the policy's timeout
/// elapses.
///
/// Every attempt runs at least once. After a miss the poller stops if the
/// timeout has been reached, otherwise it sleeps the poll interval (cut
/// short to the time remaining) and tries again.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    policy: WaitPolicy,
}

impl Poller {
    pub fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// Policy this poller runs with
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Poll `attempt`. `Ok(None)` means "not yet"; an `Err` ends the wait
    /// immediately and is returned as-is.
    pub async fn poll<T, F, Fut>(&self, mut attempt: F) -> Result<Polled<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let timeout = self.policy.timeout;
        let interval = self.policy.poll_interval;
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(value) = attempt().await? {
                debug!(attempts, elapsed = ?start.elapsed(), "Wait satisfied");
                return Ok(Polled::Satisfied(value));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(attempts, ?elapsed, ?timeout, "Wait timed out");
                return Ok(Polled::TimedOut(TimedOut { elapsed, attempts }));
            }

            let pause = interval.min(timeout - elapsed);
            trace!(attempt = attempts, ?pause, "Condition not met, sleeping");
            tokio::time::sleep(pause).await;
        }
    }

    /// Wait for a condition against the live session. A stale handle during
    /// a check counts as "not yet".
    pub async fn until<C>(&self, session: &dyn AutomationSession, condition: &C) -> Result<Polled<C::Output>>
    where
        C: Condition + ?Sized,
    {
        trace!(condition = %condition.describe(), "Waiting on condition");
        self.poll(move || async move {
            match condition.check(session).await {
                Ok(outcome) => Ok(outcome),
                Err(e) if e.is_stale() => {
                    trace!(error = %e, "Stale element during condition check");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
    }
}
