use super::manager::FoldManager;
use crate::document::PositionService;
use crate::forest::FoldId;
use crate::models::FoldType;
use tracing::debug;

/// Collapses every fold of a chosen set of types, e.g. all comments when a
/// file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldCollapser {
    types: Vec<FoldType>,
}

impl FoldCollapser {
    /// Collapses comments only
    pub fn new() -> Self {
        Self::with_types([FoldType::Comment])
    }

    pub fn with_types(types: impl IntoIterator<Item = FoldType>) -> Self {
        let mut collapser = Self { types: Vec::new() };
        for fold_type in types {
            collapser.add_type_to_collapse(fold_type);
        }
        collapser
    }

    pub fn add_type_to_collapse(&mut self, fold_type: FoldType) {
        if !self.types.contains(&fold_type) {
            self.types.push(fold_type);
        }
    }

    pub fn should_collapse(&self, fold_type: FoldType) -> bool {
        self.types.contains(&fold_type)
    }

    pub fn types(&self) -> &[FoldType] {
        &self.types
    }

    /// Collapse every matching fold, children of folds already collapsed
    /// included. Returns how many folds changed state.
    pub fn collapse_folds<D: PositionService + ?Sized>(
        &self,
        manager: &mut FoldManager,
        doc: &D,
    ) -> usize {
        let targets: Vec<FoldId> = manager
            .forest()
            .iter()
            .filter(|(_, fold)| self.should_collapse(fold.fold_type()))
            .map(|(id, _)| id)
            .collect();
        let collapsed = targets
            .into_iter()
            .filter(|&id| manager.set_collapsed(id, true, doc))
            .count();
        debug!(collapsed, types = ?self.types, "Collapsed folds by type");
        collapsed
    }
}

impl Default for FoldCollapser {
    fn default() -> Self {
        Self::new()
    }
}
