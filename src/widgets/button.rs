//! Clickable button

use std::sync::Arc;

use crate::component::{ClickOptions, ComponentPiece};
use crate::locator::Locator;
use crate::session::AutomationSession;
use crate::wait::SettleWait;
use crate::Result;

/// A button, or anything else whose job is to be clicked
#[derive(Debug, Clone)]
pub struct Button {
    piece: ComponentPiece,
}

impl Button {
    pub fn new(locator: Locator, session: Arc<dyn AutomationSession>) -> Self {
        Self::from_piece(ComponentPiece::new(locator, session))
    }

    pub fn from_piece(piece: ComponentPiece) -> Self {
        Self { piece }
    }

    pub fn piece(&self) -> &ComponentPiece {
        &self.piece
    }

    /// Click, then wait out the piece's settle
    pub async fn click(&self) -> Result<()> {
        self.piece.click().await
    }

    /// Click, then wait `settle` instead of the piece's default
    pub async fn click_and_settle(&self, settle: impl Into<SettleWait>) -> Result<()> {
        self.piece.click_with(ClickOptions::new().settle(settle)).await
    }

    pub async fn text(&self) -> Result<String> {
        self.piece.get_text().await
    }

    /// False when the button carries a `disabled` attribute
    pub async fn is_enabled(&self) -> Result<bool> {
        Ok(self.piece.get_attribute("disabled").await?.is_none())
    }
}
