//! Named settle wait

use std::time::Duration;
use tracing::debug;

/// Pause after a mutating interaction so asynchronous UI effects (a
/// re-render, a binding round-trip) can land before the caller continues.
///
/// The UI gives no completion signal, so this is a bounded sleep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SettleWait(Duration);

impl SettleWait {
    pub const fn none() -> Self {
        Self(Duration::ZERO)
    }

    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Negative or non-finite values mean no wait
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(Duration::from_secs_f64(secs))
        } else {
            Self::none()
        }
    }

    /// Length of the pause
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// True when no pause is taken
    pub fn is_none(&self) -> bool {
        self.0.is_zero()
    }

    /// Sleep for the settle duration
    pub async fn observe(&self) {
        if self.is_none() {
            return;
        }
        debug!(settle = ?self.0, "Waiting for UI to settle");
        tokio::time::sleep(self.0).await;
    }
}

impl From<Duration> for SettleWait {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}
