//! Text and numeric comparison semantics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::keys;

/// Plain text comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCondition {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
}

/// Comparisons that ignore thousands separators, since numeric fields
/// render `1000` as `1,000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericCondition {
    Equals,
    DoesNotEqual,
}

/// Any supported comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Text(TextCondition),
    Numeric(NumericCondition),
}

impl Comparison {
    /// Compare an observed value with the expected one
    pub fn matches(&self, observed: &str, expected: &str) -> bool {
        match self {
            Comparison::Text(TextCondition::Equals) => observed == expected,
            Comparison::Text(TextCondition::DoesNotEqual) => observed != expected,
            Comparison::Text(TextCondition::Contains) => observed.contains(expected),
            Comparison::Text(TextCondition::DoesNotContain) => !observed.contains(expected),
            Comparison::Numeric(NumericCondition::Equals) => {
                strip_separators(observed) == strip_separators(expected)
            }
            Comparison::Numeric(NumericCondition::DoesNotEqual) => {
                strip_separators(observed) != strip_separators(expected)
            }
        }
    }
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::Text(TextCondition::Equals)
    }
}

impl From<TextCondition> for Comparison {
    fn from(condition: TextCondition) -> Self {
        Comparison::Text(condition)
    }
}

impl From<NumericCondition> for Comparison {
    fn from(condition: NumericCondition) -> Self {
        Comparison::Numeric(condition)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Comparison::Text(TextCondition::Equals) => "equals",
            Comparison::Text(TextCondition::DoesNotEqual) => "does not equal",
            Comparison::Text(TextCondition::Contains) => "contains",
            Comparison::Text(TextCondition::DoesNotContain) => "does not contain",
            Comparison::Numeric(NumericCondition::Equals) => "numerically equals",
            Comparison::Numeric(NumericCondition::DoesNotEqual) => "numerically differs from",
        };
        f.write_str(name)
    }
}

/// Drop thousands separators
pub fn strip_separators(value: &str) -> String {
    value.chars().filter(|c| *c != ',').collect()
}

/// The value a field is expected to show after typing `input`: control
/// characters and special keys cannot be rendered and are dropped, while
/// spaces and punctuation stay.
///
/// Tab and newline count as control characters here. Sessions deliver them
/// as the Tab and Enter keys, which move focus or submit rather than
/// insert text.
pub fn normalize_input_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() && !keys::is_special(*c))
        .collect()
}
