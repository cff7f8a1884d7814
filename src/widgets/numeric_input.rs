//! Numeric entry field
//!
//! These fields reformat on commit: an empty entry becomes `0` and large
//! values gain thousands separators, so the typed value is verified with a
//! numeric comparison.

use std::fmt::Display;
use std::sync::Arc;

use crate::component::{ComponentPiece, SetTextOptions, TextSource};
use crate::locator::Locator;
use crate::session::AutomationSession;
use crate::wait::NumericCondition;
use crate::Result;

/// What an emptied numeric field commits to
pub const EMPTY_NUMERIC_VALUE: &str = "0";

#[derive(Debug, Clone)]
pub struct NumericInput {
    piece: ComponentPiece,
}

impl NumericInput {
    pub fn new(locator: Locator, session: Arc<dyn AutomationSession>) -> Self {
        Self::from_piece(ComponentPiece::new(locator, session))
    }

    pub fn from_piece(piece: ComponentPiece) -> Self {
        Self { piece }
    }

    pub fn piece(&self) -> &ComponentPiece {
        &self.piece
    }

    /// Displayed value, separators included
    pub async fn get_value(&self) -> Result<String> {
        self.piece.input_field().await?.read_source(&TextSource::value()).await
    }

    /// Type `value` and verify it committed
    pub async fn set_value(&self, value: impl Display) -> Result<()> {
        self.set_text(&value.to_string()).await
    }

    /// Type raw text; an empty string clears the field to `0`
    pub async fn set_text(&self, text: &str) -> Result<()> {
        let options = SetTextOptions::default()
            .comparison(NumericCondition::Equals)
            .empty_value(EMPTY_NUMERIC_VALUE);
        self.piece.set_text(text, options).await
    }
}
