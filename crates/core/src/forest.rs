//! Arena-backed fold forest.
//!
//! Every [`Fold`] lives in one `Vec` owned by its [`FoldForest`] and is
//! addressed by a [`FoldId`]. Parents keep their children as sorted id lists
//! and children point back at their parent, so upward walks (collapsed line
//! bookkeeping) and downward walks (queries) never fight the borrow checker.

use crate::document::{Position, PositionService};
use crate::models::{FoldOutline, FoldType};
use std::cmp::Ordering;
use std::ops::Index;

/// Index of a fold inside its forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoldId(usize);

impl FoldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A foldable region of a document.
///
/// Line queries take the document because start and end are sticky
/// positions; the lines they fall on change as the text is edited.
#[derive(Debug, Clone)]
pub struct Fold {
    fold_type: FoldType,
    start: Position,
    /// `None` while the fold runs to the end of the document
    end: Option<Position>,
    parent: Option<FoldId>,
    children: Vec<FoldId>,
    collapsed: bool,
    child_collapsed_line_count: usize,
}

impl Fold {
    pub fn fold_type(&self) -> FoldType {
        self.fold_type
    }

    pub fn start_offset(&self) -> usize {
        self.start.offset()
    }

    /// End offset, `None` for a fold that was never closed
    pub fn end_offset(&self) -> Option<usize> {
        self.end.as_ref().map(Position::offset)
    }

    pub fn is_unterminated(&self) -> bool {
        self.end.is_none()
    }

    pub fn parent(&self) -> Option<FoldId> {
        self.parent
    }

    pub fn children(&self) -> &[FoldId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_child_folds(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn last_child(&self) -> Option<FoldId> {
        self.children.last().copied()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Lines hidden by collapsed descendants while this fold is expanded
    pub fn child_collapsed_line_count(&self) -> usize {
        self.child_collapsed_line_count
    }

    pub fn start_line<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        doc.line_of_offset(self.start_offset())
    }

    /// Last line of the fold; the last document line when unterminated.
    pub fn end_line<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        match self.end_offset() {
            Some(end) => doc.line_of_offset(end),
            None => doc.line_count().saturating_sub(1),
        }
    }

    /// Lines hidden when this fold is collapsed. The start line stays visible.
    pub fn line_count<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        self.end_line(doc).saturating_sub(self.start_line(doc))
    }

    pub fn collapsed_line_count<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        if self.collapsed {
            self.line_count(doc)
        } else {
            self.child_collapsed_line_count
        }
    }

    /// Whether `line` is one of the lines this fold hides when collapsed
    pub fn contains_line<D: PositionService + ?Sized>(&self, line: usize, doc: &D) -> bool {
        line > self.start_line(doc) && line <= self.end_line(doc)
    }

    pub fn contains_or_starts_on_line<D: PositionService + ?Sized>(
        &self,
        line: usize,
        doc: &D,
    ) -> bool {
        line >= self.start_line(doc) && line <= self.end_line(doc)
    }

    pub fn contains_offset<D: PositionService + ?Sized>(&self, offset: usize, doc: &D) -> bool {
        offset > self.start_offset() && doc.line_of_offset(offset) <= self.end_line(doc)
    }

    pub fn is_on_single_line<D: PositionService + ?Sized>(&self, doc: &D) -> bool {
        self.start_line(doc) == self.end_line(doc)
    }
}

impl PartialEq for Fold {
    fn eq(&self, other: &Self) -> bool {
        self.start_offset() == other.start_offset()
    }
}

impl Eq for Fold {}

impl PartialOrd for Fold {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fold {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_offset().cmp(&other.start_offset())
    }
}

/// All folds of one document: sorted top-level folds and their descendants.
///
/// Nodes are stored in pre-order, so iterating the arena visits parents
/// before children and siblings in document order.
#[derive(Debug, Clone, Default)]
pub struct FoldForest {
    nodes: Vec<Fold>,
    roots: Vec<FoldId>,
}

impl FoldForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of folds at every depth
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level folds, sorted by start offset
    pub fn roots(&self) -> &[FoldId] {
        &self.roots
    }

    pub fn get(&self, id: FoldId) -> Option<&Fold> {
        self.nodes.get(id.0)
    }

    /// Every fold in pre-order
    pub fn iter(&self) -> impl Iterator<Item = (FoldId, &Fold)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, fold)| (FoldId(index), fold))
    }

    /// Ids of every fold in pre-order
    pub fn ids(&self) -> impl Iterator<Item = FoldId> {
        (0..self.nodes.len()).map(FoldId)
    }

    /// Depth of a fold; top-level folds are at depth 0.
    pub fn depth(&self, id: FoldId) -> usize {
        self.ancestors(id).count()
    }

    /// Strict ancestors of `id`, innermost first
    pub fn ancestors(&self, id: FoldId) -> impl Iterator<Item = FoldId> + '_ {
        let mut next = self.get(id).and_then(Fold::parent);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.nodes[current.0].parent;
            Some(current)
        })
    }

    /// Append a node; nodes must arrive in pre-order.
    pub(crate) fn push_node(
        &mut self,
        fold_type: FoldType,
        start: Position,
        end: Option<Position>,
        parent: Option<FoldId>,
    ) -> FoldId {
        let id = FoldId(self.nodes.len());
        self.nodes.push(Fold {
            fold_type,
            start,
            end,
            parent,
            children: Vec::new(),
            collapsed: false,
            child_collapsed_line_count: 0,
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Binary search `siblings` by start offset
    pub(crate) fn search_siblings(
        &self,
        siblings: &[FoldId],
        offset: usize,
    ) -> Result<usize, usize> {
        siblings.binary_search_by(|id| self.nodes[id.0].start_offset().cmp(&offset))
    }

    /// Collapse or expand a fold, keeping every ancestor's hidden line count
    /// current. Returns whether the state changed.
    pub fn set_collapsed<D: PositionService + ?Sized>(
        &mut self,
        id: FoldId,
        collapsed: bool,
        doc: &D,
    ) -> bool {
        let Some(fold) = self.nodes.get(id.0) else {
            return false;
        };
        if fold.collapsed == collapsed {
            return false;
        }

        let shown = fold.line_count(doc) as isize - fold.child_collapsed_line_count as isize;
        let delta = if collapsed { shown } else { -shown };
        let parent = fold.parent;
        self.nodes[id.0].collapsed = collapsed;
        if let Some(parent) = parent {
            self.update_child_collapsed_line_count(parent, delta);
        }
        true
    }

    pub fn toggle_collapsed<D: PositionService + ?Sized>(&mut self, id: FoldId, doc: &D) -> bool {
        match self.get(id) {
            Some(fold) => {
                let collapsed = !fold.collapsed;
                self.set_collapsed(id, collapsed, doc)
            }
            None => false,
        }
    }

    fn update_child_collapsed_line_count(&mut self, mut id: FoldId, delta: isize) {
        loop {
            let node = &mut self.nodes[id.0];
            node.child_collapsed_line_count =
                node.child_collapsed_line_count.saturating_add_signed(delta);
            // A collapsed fold already hides everything below it
            if node.collapsed {
                return;
            }
            match node.parent {
                Some(parent) => id = parent,
                None => return,
            }
        }
    }

    /// Lines hidden by every collapsed fold in the forest
    pub fn hidden_line_count<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        self.roots
            .iter()
            .map(|id| self.nodes[id.0].collapsed_line_count(doc))
            .sum()
    }

    pub fn deepest_fold_containing<D: PositionService + ?Sized>(
        &self,
        offset: usize,
        doc: &D,
    ) -> Option<FoldId> {
        self.deepest_containing(offset, doc, false)
    }

    /// Like [`deepest_fold_containing`](Self::deepest_fold_containing) but
    /// stops above the first collapsed fold on the way down.
    pub fn deepest_open_fold_containing<D: PositionService + ?Sized>(
        &self,
        offset: usize,
        doc: &D,
    ) -> Option<FoldId> {
        self.deepest_containing(offset, doc, true)
    }

    fn deepest_containing<D: PositionService + ?Sized>(
        &self,
        offset: usize,
        doc: &D,
        open_only: bool,
    ) -> Option<FoldId> {
        let mut found = None;
        let mut level = self.roots.as_slice();
        while let Some(&id) = level
            .iter()
            .find(|id| self.nodes[id.0].contains_offset(offset, doc))
        {
            let fold = &self.nodes[id.0];
            if open_only && fold.collapsed {
                break;
            }
            found = Some(id);
            level = &fold.children;
        }
        found
    }

    /// Serializable snapshot of the whole forest
    pub fn outline<D: PositionService + ?Sized>(&self, doc: &D) -> Vec<FoldOutline> {
        self.roots.iter().map(|&id| self.outline_of(id, doc)).collect()
    }

    fn outline_of<D: PositionService + ?Sized>(&self, id: FoldId, doc: &D) -> FoldOutline {
        let fold = &self.nodes[id.0];
        FoldOutline {
            fold_type: fold.fold_type,
            start_offset: fold.start_offset(),
            end_offset: fold.end_offset(),
            start_line: fold.start_line(doc),
            end_line: fold.end_line(doc),
            line_count: fold.line_count(doc),
            collapsed: fold.collapsed,
            children: fold
                .children
                .iter()
                .map(|&child| self.outline_of(child, doc))
                .collect(),
        }
    }
}

impl Index<FoldId> for FoldForest {
    type Output = Fold;

    fn index(&self, id: FoldId) -> &Fold {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, ids_of_type, parse};

    const NESTED: &str = "class A {\n  void a() {\n    x();\n  }\n  void b() {\n    y();\n  }\n}";

    #[test]
    fn test_nodes_are_pre_order() {
        let doc = doc("text/java", NESTED);
        let forest = parse(&doc);
        assert_eq!(forest.len(), 3);
        assert_eq!(forest.roots().len(), 1);
        let outer = forest.roots()[0];
        assert_eq!(forest[outer].child_count(), 2);
        let offsets: Vec<usize> = forest.iter().map(|(_, f)| f.start_offset()).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert_eq!(forest.depth(forest[outer].children()[1]), 1);
    }

    #[test]
    fn test_line_queries() {
        let doc = doc("text/java", NESTED);
        let forest = parse(&doc);
        let outer = &forest[forest.roots()[0]];
        assert_eq!(outer.start_line(&doc), 0);
        assert_eq!(outer.end_line(&doc), 7);
        assert_eq!(outer.line_count(&doc), 7);
        assert!(!outer.contains_line(0, &doc));
        assert!(outer.contains_or_starts_on_line(0, &doc));
        assert!(outer.contains_line(7, &doc));
        assert!(!outer.contains_offset(outer.start_offset(), &doc));
        assert!(outer.contains_offset(outer.start_offset() + 1, &doc));
    }

    #[test]
    fn test_collapse_propagates_to_ancestors() {
        let doc = doc("text/java", NESTED);
        let mut forest = parse(&doc);
        let outer = forest.roots()[0];
        let first = forest[outer].children()[0];
        let second = forest[outer].children()[1];

        assert!(forest.set_collapsed(first, true, &doc));
        assert!(!forest.set_collapsed(first, true, &doc));
        assert_eq!(forest[outer].child_collapsed_line_count(), 2);
        assert_eq!(forest.hidden_line_count(&doc), 2);

        forest.set_collapsed(outer, true, &doc);
        assert_eq!(forest.hidden_line_count(&doc), 7);

        // Changes below a collapsed fold stop at that fold
        forest.set_collapsed(second, true, &doc);
        assert_eq!(forest[outer].child_collapsed_line_count(), 4);
        assert_eq!(forest.hidden_line_count(&doc), 7);

        forest.set_collapsed(outer, false, &doc);
        assert_eq!(forest.hidden_line_count(&doc), 4);
        forest.toggle_collapsed(first, &doc);
        forest.toggle_collapsed(second, &doc);
        assert_eq!(forest.hidden_line_count(&doc), 0);
    }

    #[test]
    fn test_deepest_fold_containing() {
        let doc = doc("text/java", NESTED);
        let mut forest = parse(&doc);
        let outer = forest.roots()[0];
        let first = forest[outer].children()[0];
        let offset = doc.text().find("x()").unwrap();

        assert_eq!(forest.deepest_fold_containing(offset, &doc), Some(first));
        assert_eq!(forest.deepest_open_fold_containing(offset, &doc), Some(first));

        forest.set_collapsed(first, true, &doc);
        assert_eq!(forest.deepest_open_fold_containing(offset, &doc), Some(outer));
        forest.set_collapsed(outer, true, &doc);
        assert_eq!(forest.deepest_open_fold_containing(offset, &doc), None);
        assert_eq!(forest.deepest_fold_containing(offset, &doc), Some(first));
        assert_eq!(forest.deepest_fold_containing(0, &doc), None);
    }

    #[test]
    fn test_equality_is_by_start_offset() {
        let doc = doc("text/java", "/*\n*/\na {\n}");
        let forest = parse(&doc);
        let comments = ids_of_type(&forest, FoldType::Comment);
        let code = ids_of_type(&forest, FoldType::Code);
        assert_ne!(forest[comments[0]], forest[code[0]]);
        assert!(forest[comments[0]] < forest[code[0]]);
        let again = parse(&doc);
        assert_eq!(forest[code[0]], again[ids_of_type(&again, FoldType::Code)[0]]);
    }

    #[test]
    fn test_outline_snapshot() {
        let doc = doc("text/java", NESTED);
        let forest = parse(&doc);
        let outline = forest.outline(&doc);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].fold_count(), 3);
        assert_eq!(outline[0].children[1].start_line, 4);
        assert_eq!(outline[0].children[1].line_count, 2);
    }

    #[test]
    fn test_unterminated_fold_runs_to_last_line() {
        let doc = doc("text/java", "{\n{\n");
        let forest = parse(&doc);
        assert_eq!(forest.len(), 2);
        let outer = &forest[forest.roots()[0]];
        assert!(outer.is_unterminated());
        assert_eq!(outer.end_offset(), None);
        assert_eq!(outer.end_line(&doc), 2);
    }
}
