//! Unified error types for Perspective-POM

use std::time::Duration;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Perspective-POM
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The poller exhausted its wait without locating the chain
    #[error("Unable to locate element within {timeout:?} with locator: {chain}{}", describe(.description))]
    NotFound {
        chain: String,
        description: Option<String>,
        timeout: Duration,
    },

    /// A resolved handle no longer points into the live DOM
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// An interaction completed but its effect was never observed
    #[error("Postcondition failed for {chain}: expected {expected:?}, observed {observed:?}")]
    Postcondition {
        chain: String,
        expected: String,
        observed: String,
    },

    /// The element was found but never accepted the interaction
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// A collection search found no matching member
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// The locator cannot be used as requested
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// A condition wait that was asked to raise expired
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Remote session / protocol errors
    #[error("Session error: {0}")]
    Session(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn describe(description: &Option<String>) -> String {
    match description {
        Some(d) => format!("\nDescription: {}", d),
        None => String::new(),
    }
}

impl Error {
    /// Create a new not found error
    pub fn not_found<S: Into<String>>(chain: S, description: Option<String>, timeout: Duration) -> Self {
        Error::NotFound {
            chain: chain.into(),
            description,
            timeout,
        }
    }

    /// Create a new stale element error
    pub fn stale<S: Into<String>>(msg: S) -> Self {
        Error::StaleElement(msg.into())
    }

    /// Create a new postcondition error
    pub fn postcondition<C, E, O>(chain: C, expected: E, observed: O) -> Self
    where
        C: Into<String>,
        E: Into<String>,
        O: Into<String>,
    {
        Error::Postcondition {
            chain: chain.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Create a new not interactable error
    pub fn not_interactable<S: Into<String>>(msg: S) -> Self {
        Error::NotInteractable(msg.into())
    }

    /// Create a new lookup error
    pub fn lookup<S: Into<String>>(msg: S) -> Self {
        Error::Lookup(msg.into())
    }

    /// Create a new invalid locator error
    pub fn invalid_locator<S: Into<String>>(msg: S) -> Self {
        Error::InvalidLocator(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new session error
    pub fn session<S: Into<String>>(msg: S) -> Self {
        Error::Session(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// True for the recoverable "never appeared" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True when the handle was invalidated by a re-render
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleElement(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_description() {
        let err = Error::not_found(
            "css=div#app > css=button.submit",
            Some("Submit button".to_string()),
            Duration::from_secs(2),
        );
        let msg = err.to_string();
        assert!(msg.contains("css=div#app > css=button.submit"));
        assert!(msg.ends_with("\nDescription: Submit button"));
        assert!(err.is_not_found());
        assert!(!err.is_stale());
    }

    #[test]
    fn test_not_found_message_without_description() {
        let err = Error::not_found("css=span", None, Duration::ZERO);
        assert!(!err.to_string().contains("Description"));
    }

    #[test]
    fn test_postcondition_message() {
        let err = Error::postcondition("css=input", "ab", "a");
        assert_eq!(
            err.to_string(),
            "Postcondition failed for css=input: expected \"ab\", observed \"a\""
        );
    }
}
