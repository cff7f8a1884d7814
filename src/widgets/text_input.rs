//! Free-text input field
//!
//! Works with a bare `<input>`/`<textarea>` or with a wrapper that has an
//! `<input>` somewhere inside it.

use std::sync::Arc;

use crate::component::{ComponentPiece, SetTextOptions, TextSource};
use crate::locator::Locator;
use crate::session::AutomationSession;
use crate::Result;

#[derive(Debug, Clone)]
pub struct TextInput {
    piece: ComponentPiece,
}

impl TextInput {
    pub fn new(locator: Locator, session: Arc<dyn AutomationSession>) -> Self {
        Self::from_piece(ComponentPiece::new(locator, session))
    }

    pub fn from_piece(piece: ComponentPiece) -> Self {
        Self { piece }
    }

    pub fn piece(&self) -> &ComponentPiece {
        &self.piece
    }

    /// Current value of the underlying field
    pub async fn get_value(&self) -> Result<String> {
        self.piece.input_field().await?.read_source(&TextSource::value()).await
    }

    /// Replace the value, blur, and verify
    pub async fn set_text(&self, text: &str) -> Result<()> {
        self.piece.set_text(text, SetTextOptions::default()).await
    }

    pub async fn set_text_with(&self, text: &str, options: SetTextOptions) -> Result<()> {
        self.piece.set_text(text, options).await
    }

    /// The field's placeholder, empty when it has none
    pub async fn placeholder(&self) -> Result<String> {
        let field = self.piece.input_field().await?;
        Ok(field.get_attribute("placeholder").await?.unwrap_or_default())
    }

    /// True while the field is empty and has a placeholder to show
    pub async fn placeholder_is_displayed(&self) -> Result<bool> {
        Ok(self.get_value().await?.is_empty() && !self.placeholder().await?.is_empty())
    }
}
