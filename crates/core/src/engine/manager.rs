use crate::document::{DocumentEvent, FoldSource, PositionService};
use crate::error::FoldError;
use crate::forest::{FoldForest, FoldId};
use crate::models::FoldOutline;
use crate::parsers::{FoldParser, FoldParserRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Notifications queued by a [`FoldManager`] for the host to drain.
#[derive(Debug, Clone)]
pub enum FoldEvent {
    /// The forest was rebuilt or cleared; `previous` is the forest it replaced
    FoldsUpdated { previous: FoldForest },
    /// A fold changed state. `caret` is set when collapsing hid the tracked
    /// selection and the caret should move to the end of the fold's first line.
    FoldToggled {
        fold: FoldId,
        start_offset: usize,
        collapsed: bool,
        caret: Option<usize>,
    },
}

/// Caret (`dot`) and selection anchor (`mark`) offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub dot: usize,
    pub mark: usize,
}

impl Selection {
    pub fn caret(offset: usize) -> Self {
        Self {
            dot: offset,
            mark: offset,
        }
    }
}

/// Keeps the folds of one document current and answers structural
/// questions about them.
///
/// The manager never reads the document on its own: every call that needs
/// line information takes the document, and every reparse is triggered by
/// the host, typically through [`handle_document_event`](Self::handle_document_event).
pub struct FoldManager {
    registry: Arc<FoldParserRegistry>,
    language: String,
    parser: Option<Arc<dyn FoldParser>>,
    enabled: bool,
    forest: FoldForest,
    events: Vec<FoldEvent>,
    selection: Option<Selection>,
}

impl FoldManager {
    pub fn new(registry: Arc<FoldParserRegistry>, language: impl Into<String>) -> Self {
        let language = language.into();
        let parser = resolve_parser(&registry, &language);
        Self {
            registry,
            language,
            parser,
            enabled: true,
            forest: FoldForest::new(),
            events: Vec::new(),
            selection: None,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the parser in use, if the language has one
    pub fn parser_name(&self) -> Option<&'static str> {
        self.parser.as_ref().map(|parser| parser.name())
    }

    pub fn forest(&self) -> &FoldForest {
        &self.forest
    }

    /// Rebuild the forest from the document, carrying the collapsed state of
    /// every fold that still starts at the same offset.
    pub fn reparse(&mut self, doc: &dyn FoldSource) -> Result<(), FoldError> {
        if !self.enabled {
            self.clear();
            return Ok(());
        }

        let mut forest = match &self.parser {
            Some(parser) => parser.parse(doc)?,
            None => FoldForest::new(),
        };
        let kept = keep_fold_states(&mut forest, &self.forest, doc);
        debug!(
            language = %self.language,
            folds = forest.len(),
            top_level = forest.roots().len(),
            kept_collapsed = kept,
            "Reparsed folds"
        );

        let previous = std::mem::replace(&mut self.forest, forest);
        self.events.push(FoldEvent::FoldsUpdated { previous });
        Ok(())
    }

    fn clear(&mut self) {
        let previous = std::mem::take(&mut self.forest);
        self.events.push(FoldEvent::FoldsUpdated { previous });
    }

    /// Turn folding on or off. Enabling reparses right away; disabling drops
    /// every fold.
    pub fn set_enabled(&mut self, enabled: bool, doc: &dyn FoldSource) -> Result<(), FoldError> {
        if enabled == self.enabled {
            return Ok(());
        }
        self.enabled = enabled;
        if enabled {
            self.reparse(doc)
        } else {
            self.clear();
            Ok(())
        }
    }

    /// Switch to the parser registered for `language` and reparse.
    pub fn set_language(
        &mut self,
        language: impl Into<String>,
        doc: &dyn FoldSource,
    ) -> Result<(), FoldError> {
        self.language = language.into();
        self.parser = resolve_parser(&self.registry, &self.language);
        self.reparse(doc)
    }

    /// React to an edit or style change that has already been applied to
    /// `doc`.
    ///
    /// Text entered across lines at, or removed from, the first line of a
    /// collapsed fold expands that fold so the change is not hidden.
    pub fn handle_document_event(
        &mut self,
        event: &DocumentEvent,
        doc: &dyn FoldSource,
    ) -> Result<(), FoldError> {
        match event {
            DocumentEvent::Inserted { start, end } => {
                let start_line = doc.line_of_offset(*start);
                if start_line != doc.line_of_offset(*end) {
                    self.expand_fold_starting_on(start_line, doc);
                }
                self.reparse(doc)
            }
            DocumentEvent::Removed { start, .. } => {
                let line = doc.line_of_offset(*start);
                self.expand_fold_starting_on(line, doc);
                self.reparse(doc)
            }
            DocumentEvent::StyleChanged { language } => self.set_language(language.clone(), doc),
        }
    }

    fn expand_fold_starting_on(&mut self, line: usize, doc: &dyn FoldSource) {
        if let Some(id) = self.fold_for_line(line, doc) {
            if self.forest[id].is_collapsed() {
                trace!(line, "Expanding edited fold");
                self.set_collapsed(id, false, doc);
            }
        }
    }

    /// Number of top-level folds
    pub fn fold_count(&self) -> usize {
        self.forest.roots().len()
    }

    /// The top-level fold at `index`
    pub fn fold(&self, index: usize) -> Option<FoldId> {
        self.forest.roots().get(index).copied()
    }

    /// The fold whose first line is `line`.
    ///
    /// A fold's last line is searched among later siblings too, since the
    /// next block may open on the line the previous one closed.
    pub fn fold_for_line<D: PositionService + ?Sized>(
        &self,
        line: usize,
        doc: &D,
    ) -> Option<FoldId> {
        let forest = &self.forest;
        let mut siblings = forest.roots();
        'levels: loop {
            let (mut low, mut high) = (0, siblings.len());
            while low < high {
                let mid = (low + high) / 2;
                let fold = &forest[siblings[mid]];
                let start_line = fold.start_line(doc);
                if line == start_line {
                    return Some(siblings[mid]);
                } else if line < start_line {
                    high = mid;
                } else if line >= fold.end_line(doc) {
                    low = mid + 1;
                } else {
                    siblings = fold.children();
                    continue 'levels;
                }
            }
            return None;
        }
    }

    pub fn is_fold_start_line<D: PositionService + ?Sized>(&self, line: usize, doc: &D) -> bool {
        self.fold_for_line(line, doc).is_some()
    }

    pub fn deepest_fold_containing<D: PositionService + ?Sized>(
        &self,
        offset: usize,
        doc: &D,
    ) -> Option<FoldId> {
        self.forest.deepest_fold_containing(offset, doc)
    }

    pub fn deepest_open_fold_containing<D: PositionService + ?Sized>(
        &self,
        offset: usize,
        doc: &D,
    ) -> Option<FoldId> {
        self.forest.deepest_open_fold_containing(offset, doc)
    }

    /// Expand every collapsed fold hiding `offset`. Returns whether any fold
    /// changed.
    pub fn ensure_offset_not_in_closed_fold<D: PositionService + ?Sized>(
        &mut self,
        offset: usize,
        doc: &D,
    ) -> bool {
        let Some(deepest) = self.forest.deepest_fold_containing(offset, doc) else {
            return false;
        };
        let chain: Vec<FoldId> = std::iter::once(deepest)
            .chain(self.forest.ancestors(deepest))
            .collect();
        let mut opened = false;
        for id in chain {
            if self.forest[id].is_collapsed() {
                opened |= self.set_collapsed(id, false, doc);
            }
        }
        opened
    }

    /// Whether some collapsed fold hides `line`
    pub fn is_line_hidden<D: PositionService + ?Sized>(&self, line: usize, doc: &D) -> bool {
        let forest = &self.forest;
        let mut level = forest.roots();
        while let Some(&id) = level
            .iter()
            .find(|&&id| forest[id].contains_line(line, doc))
        {
            if forest[id].is_collapsed() {
                return true;
            }
            level = forest[id].children();
        }
        false
    }

    /// Lines hidden by all collapsed folds
    pub fn hidden_line_count<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        self.forest.hidden_line_count(doc)
    }

    /// Hidden lines above `line`.
    ///
    /// With `physical` set, `line` is a visible row (lines hidden above it
    /// are not counted in it), otherwise a document line.
    pub fn hidden_line_count_above<D: PositionService + ?Sized>(
        &self,
        line: usize,
        physical: bool,
        doc: &D,
    ) -> usize {
        self.hidden_above_in(self.forest.roots(), line, physical, doc)
    }

    fn hidden_above_in<D: PositionService + ?Sized>(
        &self,
        siblings: &[FoldId],
        line: usize,
        physical: bool,
        doc: &D,
    ) -> usize {
        let mut count = 0;
        for &id in siblings {
            let threshold = if physical { line + count } else { line };
            let fold = &self.forest[id];
            let start_line = fold.start_line(doc);
            if start_line >= threshold {
                break;
            }
            count += if fold.end_line(doc) < threshold || fold.is_collapsed() {
                fold.collapsed_line_count(doc)
            } else {
                self.hidden_above_in(fold.children(), threshold, physical, doc)
            };
        }
        count
    }

    /// Last document line that is not hidden
    pub fn last_visible_line<D: PositionService + ?Sized>(&self, doc: &D) -> usize {
        let last_line = doc.line_count().saturating_sub(1);
        let Some(&last) = self.forest.roots().last() else {
            return last_line;
        };
        let mut fold = &self.forest[last];
        if !fold.contains_line(last_line, doc) {
            return last_line;
        }
        if fold.is_collapsed() {
            return fold.start_line(doc);
        }
        while let Some(child) = fold.last_child() {
            fold = &self.forest[child];
            if !fold.contains_line(last_line, doc) {
                break;
            }
            if fold.is_collapsed() {
                return fold.start_line(doc);
            }
        }
        last_line
    }

    /// Closest visible line above `line`; `None` at the top of the document
    /// or for lines past its end.
    pub fn visible_line_above<D: PositionService + ?Sized>(
        &self,
        line: usize,
        doc: &D,
    ) -> Option<usize> {
        if line == 0 || line >= doc.line_count() {
            return None;
        }
        (0..line).rev().find(|&above| !self.is_line_hidden(above, doc))
    }

    /// Closest visible line below `line`; `None` at the end of the document.
    pub fn visible_line_below<D: PositionService + ?Sized>(
        &self,
        line: usize,
        doc: &D,
    ) -> Option<usize> {
        let line_count = doc.line_count();
        if line + 1 >= line_count {
            return None;
        }
        (line + 1..line_count).find(|&below| !self.is_line_hidden(below, doc))
    }

    /// Track the host's caret and selection anchor so collapsing can report
    /// where the caret has to go.
    pub fn set_selection(&mut self, dot: usize, mark: usize) {
        self.selection = Some(Selection { dot, mark });
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Collapse or expand a fold, queueing a [`FoldEvent::FoldToggled`] when
    /// its state changes.
    pub fn set_collapsed<D: PositionService + ?Sized>(
        &mut self,
        id: FoldId,
        collapsed: bool,
        doc: &D,
    ) -> bool {
        if !self.forest.set_collapsed(id, collapsed, doc) {
            return false;
        }
        let fold = &self.forest[id];
        let caret = if collapsed {
            self.selection.and_then(|selection| {
                let hides = |offset: usize| fold.contains_line(doc.line_of_offset(offset), doc);
                if !hides(selection.dot) && !hides(selection.mark) {
                    return None;
                }
                let end_of_start_line = doc
                    .line_start_offset(fold.start_line(doc) + 1)
                    .map_or(doc.len(), |next| next - 1);
                Some(end_of_start_line)
            })
        } else {
            None
        };
        let start_offset = fold.start_offset();
        if let Some(caret) = caret {
            self.selection = Some(Selection::caret(caret));
        }
        self.events.push(FoldEvent::FoldToggled {
            fold: id,
            start_offset,
            collapsed,
            caret,
        });
        true
    }

    pub fn toggle_collapsed<D: PositionService + ?Sized>(&mut self, id: FoldId, doc: &D) -> bool {
        match self.forest.get(id) {
            Some(fold) => {
                let collapsed = !fold.is_collapsed();
                self.set_collapsed(id, collapsed, doc)
            }
            None => false,
        }
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<FoldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn outline<D: PositionService + ?Sized>(&self, doc: &D) -> Vec<FoldOutline> {
        self.forest.outline(doc)
    }
}

impl fmt::Debug for FoldManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldManager")
            .field("language", &self.language)
            .field("parser", &self.parser_name())
            .field("enabled", &self.enabled)
            .field("folds", &self.forest.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

fn resolve_parser(registry: &FoldParserRegistry, language: &str) -> Option<Arc<dyn FoldParser>> {
    let parser = registry.get(language);
    if parser.is_none() {
        warn!(language, "No fold parser registered for language");
    }
    parser
}

/// Copy the collapsed flag of every fold in `old` onto the fold of `new`
/// that starts at the same offset. Returns how many folds were collapsed.
fn keep_fold_states<D: PositionService + ?Sized>(
    new: &mut FoldForest,
    old: &FoldForest,
    doc: &D,
) -> usize {
    if old.is_empty() {
        return 0;
    }
    let mut kept = 0;
    let ids: Vec<FoldId> = new.ids().collect();
    for id in ids {
        let offset = new[id].start_offset();
        let collapsed =
            previous_fold(old, offset, doc).map_or(false, |previous| old[previous].is_collapsed());
        if collapsed && new.set_collapsed(id, true, doc) {
            trace!(offset, "Kept collapsed fold");
            kept += 1;
        }
    }
    kept
}

/// The fold of `forest` starting at `offset`, searching top-level folds and
/// then the children of whichever fold contains `offset`.
fn previous_fold<D: PositionService + ?Sized>(
    forest: &FoldForest,
    offset: usize,
    doc: &D,
) -> Option<FoldId> {
    let mut siblings = forest.roots();
    loop {
        match forest.search_siblings(siblings, offset) {
            Ok(index) => return Some(siblings[index]),
            Err(0) => return None,
            Err(insertion) => {
                let candidate = &forest[siblings[insertion - 1]];
                if !candidate.contains_offset(offset, doc) {
                    return None;
                }
                siblings = candidate.children();
            }
        }
    }
}
