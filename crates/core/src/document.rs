//! Interfaces the engine consumes from the hosting text surface, plus a small
//! sticky-position layer for hosts that do not have one.

use crate::error::FoldError;
use crate::token::Token;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Per-line classified tokens
pub trait TokenSource {
    /// Tokens of `line` in left-to-right order. Lines past the end yield an
    /// empty list.
    fn tokens_for_line(&self, line: usize) -> Vec<Token>;
}

/// Line/offset bookkeeping and sticky positions of a document
pub trait PositionService {
    /// Number of lines; an empty document has one line.
    fn line_count(&self) -> usize;

    /// Length of the document in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Line containing `offset`, clamped to the last line.
    fn line_of_offset(&self, offset: usize) -> usize;

    /// Byte offset of the first character of `line`
    fn line_start_offset(&self, line: usize) -> Option<usize>;

    /// A position that tracks edits made elsewhere in the document
    fn create_position(&self, offset: usize) -> Result<Position, FoldError>;
}

/// Everything a fold parser reads from a document
pub trait FoldSource: TokenSource + PositionService {}

impl<T: TokenSource + PositionService + ?Sized> FoldSource for T {}

/// A document offset that moves as text is inserted or removed before it.
#[derive(Clone)]
pub struct Position(Rc<Cell<usize>>);

impl Position {
    /// A position that never moves; useful for hosts without edit tracking.
    pub fn fixed(offset: usize) -> Self {
        Position(Rc::new(Cell::new(offset)))
    }

    pub fn offset(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.offset())
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.offset() == other.offset()
    }
}

impl Eq for Position {}

/// Keeps every live [`Position`] it created in step with document edits.
#[derive(Default)]
pub struct PositionTracker {
    positions: RefCell<Vec<Weak<Cell<usize>>>>,
    /// Tracked count right after the last sweep of dropped positions
    swept: Cell<usize>,
}

/// Tracked count below which `create` never sweeps
const MIN_SWEEP: usize = 32;

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, offset: usize) -> Position {
        let cell = Rc::new(Cell::new(offset));
        let mut positions = self.positions.borrow_mut();
        if positions.len() >= (2 * self.swept.get()).max(MIN_SWEEP) {
            positions.retain(|weak| weak.strong_count() > 0);
            self.swept.set(positions.len());
        }
        positions.push(Rc::downgrade(&cell));
        Position(cell)
    }

    /// Shift positions at or after `offset` by `len`.
    pub fn insert(&self, offset: usize, len: usize) {
        self.update(|pos| if pos >= offset { pos + len } else { pos });
    }

    /// Collapse positions inside `[start, end)` onto `start` and shift the
    /// ones after it back.
    pub fn remove(&self, start: usize, end: usize) {
        let len = end.saturating_sub(start);
        self.update(|pos| {
            if pos >= end {
                pos - len
            } else if pos > start {
                start
            } else {
                pos
            }
        });
    }

    /// Number of positions still referenced somewhere
    pub fn live_count(&self) -> usize {
        self.positions
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Number of positions held, including dropped ones not yet swept
    pub fn tracked_count(&self) -> usize {
        self.positions.borrow().len()
    }

    fn update(&self, shift: impl Fn(usize) -> usize) {
        let mut positions = self.positions.borrow_mut();
        positions.retain(|weak| match weak.upgrade() {
            Some(cell) => {
                cell.set(shift(cell.get()));
                true
            }
            None => false,
        });
        self.swept.set(positions.len());
    }
}

impl fmt::Debug for PositionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionTracker")
            .field("live", &self.live_count())
            .field("tracked", &self.tracked_count())
            .finish()
    }
}

/// Edit and style notifications from the text surface.
///
/// Offsets are byte offsets; `Inserted` and `Removed` describe the half-open
/// range `[start, end)` before the edit was applied (for removals) or after it
/// (for insertions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Inserted { start: usize, end: usize },
    Removed { start: usize, end: usize },
    StyleChanged { language: String },
}
