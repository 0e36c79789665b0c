use thiserror::Error;

/// Errors raised by the folding engine.
///
/// Malformed source text never produces one of these; they signal a broken
/// contract between the engine and its token source or position service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoldError {
    #[error("Bad location: offset {offset} is outside a document of length {len}")]
    BadLocation { offset: usize, len: usize },
    #[error("Fold end offset {end} precedes its start offset {start}")]
    EndBeforeStart { start: usize, end: usize },
    #[error("User-defined fold types must be >= {min}, got {value}")]
    InvalidUserFoldType { value: u32, min: u32 },
}
