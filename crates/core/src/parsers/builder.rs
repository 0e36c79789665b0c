use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::{FoldForest, FoldId};
use crate::models::FoldType;

/// A fold that has been opened but is not yet part of a forest
#[derive(Debug)]
struct PendingFold {
    fold_type: FoldType,
    start: usize,
    end: Option<usize>,
    children: Vec<PendingFold>,
}

impl PendingFold {
    fn new(fold_type: FoldType, start: usize) -> Self {
        Self {
            fold_type,
            start,
            end: None,
            children: Vec::new(),
        }
    }
}

/// Cursor shared by every fold parser.
///
/// Open folds sit on an explicit stack; the top is the fold new children go
/// into. Closing a fold moves it into its parent (or the top level) unless it
/// starts and ends on the same line, in which case it is dropped. Folds still
/// open when [`finish`](Self::finish) is called run to the end of the document.
pub struct FoldBuilder<'a> {
    doc: &'a dyn FoldSource,
    roots: Vec<PendingFold>,
    open: Vec<PendingFold>,
    /// The last fold attached was closed by `close` and may be reopened
    reopenable: bool,
}

impl<'a> FoldBuilder<'a> {
    pub fn new(doc: &'a dyn FoldSource) -> Self {
        Self {
            doc,
            roots: Vec::new(),
            open: Vec::new(),
            reopenable: false,
        }
    }

    /// Open a fold as a child of the current fold, or at the top level.
    pub fn open(&mut self, fold_type: FoldType, start: usize) {
        self.open.push(PendingFold::new(fold_type, start));
        self.reopenable = false;
    }

    /// Close the current fold at `end`. Returns whether a fold was kept;
    /// closing with nothing open is a no-op.
    pub fn close(&mut self, end: usize) -> Result<bool, FoldError> {
        let Some(mut fold) = self.open.pop() else {
            return Ok(false);
        };
        if end < fold.start {
            return Err(FoldError::EndBeforeStart {
                start: fold.start,
                end,
            });
        }
        if self.doc.line_of_offset(fold.start) == self.doc.line_of_offset(end) {
            self.reopenable = false;
            return Ok(false);
        }
        fold.end = Some(end);
        self.attach(fold);
        self.reopenable = true;
        Ok(true)
    }

    /// Drop the current fold and everything opened inside it.
    pub fn discard(&mut self) -> bool {
        self.reopenable = false;
        self.open.pop().is_some()
    }

    /// Add an already-delimited fold under the current one.
    pub fn add_closed(
        &mut self,
        fold_type: FoldType,
        start: usize,
        end: usize,
    ) -> Result<bool, FoldError> {
        self.open(fold_type, start);
        let kept = self.close(end)?;
        self.reopenable = false;
        Ok(kept)
    }

    /// Make the fold closed by the last `close` current again, so a block
    /// that continues on the line it ended (`} else {`) stays one fold.
    pub fn reopen_last_closed(&mut self) -> bool {
        if !self.reopenable {
            return false;
        }
        self.reopenable = false;
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        match siblings.pop() {
            Some(fold) => {
                self.open.push(fold);
                true
            }
            None => false,
        }
    }

    pub fn has_open_fold(&self) -> bool {
        !self.open.is_empty()
    }

    /// Number of folds currently open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn attach(&mut self, fold: PendingFold) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(fold),
            None => self.roots.push(fold),
        }
    }

    /// Flatten everything built so far into a forest, creating a sticky
    /// position for every fold boundary.
    pub fn finish(mut self) -> Result<FoldForest, FoldError> {
        while let Some(fold) = self.open.pop() {
            self.attach(fold);
        }

        let mut forest = FoldForest::new();
        let mut stack: Vec<(PendingFold, Option<FoldId>)> =
            self.roots.into_iter().rev().map(|fold| (fold, None)).collect();
        while let Some((fold, parent)) = stack.pop() {
            let start = self.doc.create_position(fold.start)?;
            let end = fold
                .end
                .map(|end| self.doc.create_position(end))
                .transpose()?;
            let id = forest.push_node(fold.fold_type, start, end, parent);
            stack.extend(fold.children.into_iter().rev().map(|child| (child, Some(id))));
        }
        Ok(forest)
    }
}
