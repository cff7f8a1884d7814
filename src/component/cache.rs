//! Memoized parameterized piece definitions

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use super::piece::ComponentPiece;
use crate::locator::Locator;
use crate::session::AutomationSession;

type LocatorFn<K> = dyn Fn(&K) -> Locator + Send + Sync;

/// A family of pieces that differ only by a selector parameter, such as
/// "the cell at row N, column C".
///
/// Definitions are built once per key and handed out as clones. Only the
/// definition is cached; every call on a returned piece still resolves the
/// live DOM.
pub struct PieceFamily<K> {
    parent: Option<ComponentPiece>,
    session: Arc<dyn AutomationSession>,
    locator_for: Box<LocatorFn<K>>,
    pieces: Mutex<HashMap<K, ComponentPiece>>,
}

impl<K> PieceFamily<K>
where
    K: Eq + Hash + Clone,
{
    /// Family rooted at the document
    pub fn new(
        session: Arc<dyn AutomationSession>,
        locator_for: impl Fn(&K) -> Locator + Send + Sync + 'static,
    ) -> Self {
        Self {
            parent: None,
            session,
            locator_for: Box::new(locator_for),
            pieces: Mutex::new(HashMap::new()),
        }
    }

    /// Family nested under `parent`, inheriting its waits
    pub fn under(
        parent: &ComponentPiece,
        locator_for: impl Fn(&K) -> Locator + Send + Sync + 'static,
    ) -> Self {
        Self {
            parent: Some(parent.clone()),
            session: parent.session().clone(),
            locator_for: Box::new(locator_for),
            pieces: Mutex::new(HashMap::new()),
        }
    }

    /// The piece for `key`, building it on first use
    pub fn get(&self, key: &K) -> ComponentPiece {
        let mut pieces = self.pieces.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(piece) = pieces.get(key) {
            return piece.clone();
        }
        let locator = (self.locator_for)(key);
        let piece = match &self.parent {
            Some(parent) => parent.child(locator).build(),
            None => ComponentPiece::new(locator, self.session.clone()),
        };
        pieces.insert(key.clone(), piece.clone());
        piece
    }

    /// Number of definitions built so far
    pub fn len(&self) -> usize {
        self.pieces.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every built definition
    pub fn clear(&self) {
        self.pieces.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockNode, MockSession};

    #[tokio::test]
    async fn test_family_memoizes_definitions_not_handles() {
        let session = Arc::new(MockSession::new());
        let table = session.append(None, MockNode::new("table").id("grid"));
        for row in 0..3 {
            let tr = session.append(Some(table), MockNode::new("tr").attr("data-row-index", row.to_string()));
            session.append(Some(tr), MockNode::new("td").text(format!("r{}", row)));
        }

        let grid = ComponentPiece::new(Locator::id("grid"), session.clone());
        let rows = PieceFamily::under(&grid, |row: &usize| {
            Locator::css(format!("tr[data-row-index=\"{}\"] td", row))
        });

        let second = rows.get(&1);
        assert_eq!(second.get_text().await.unwrap(), "r1");
        assert_eq!(rows.get(&1).chain(), second.chain());
        assert_eq!(rows.len(), 1);

        rows.get(&2);
        assert_eq!(rows.len(), 2);
        rows.clear();
        assert!(rows.is_empty());
    }
}
