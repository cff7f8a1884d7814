//! Waiting primitives
//!
//! - [`Poller`] re-evaluates an attempt under a [`WaitPolicy`] and reports
//!   [`Polled::Satisfied`] or [`Polled::TimedOut`]; errors are reserved for
//!   real failures
//! - [`Condition`] is the predicate protocol the poller drives, with the
//!   built-ins in [`conditions`]
//! - [`SettleWait`] is the named pause after mutating interactions
//! - [`Comparison`] holds the text and numeric comparison semantics

pub mod comparison;
pub mod condition;
pub mod conditions;
pub mod poller;
pub mod settle;

pub use comparison::{normalize_input_text, strip_separators, Comparison, NumericCondition, TextCondition};
pub use condition::{Condition, ConditionExt, Not};
pub use conditions::{
    AllElementsPresent, AnyElementHasText, AttributeEquals, CheckFuture, ChildHasPartialClass, ElementPresent,
    FullyInViewport, HasExactClass, Predicate, SessionReady, TextMatches,
};
pub use poller::{Polled, Poller, TimedOut, WaitPolicy};
pub use settle::SettleWait;
