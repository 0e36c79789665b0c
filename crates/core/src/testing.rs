//! Shared helpers for unit tests

use crate::engine::FoldManager;
use crate::forest::{FoldForest, FoldId};
use crate::models::FoldType;
use crate::parsers::FoldParserRegistry;
use crate::text::TextDocument;
use std::sync::Arc;

/// Java source with an import group, a class and a method
pub(crate) const SCENARIO_ONE: &str =
    "import a.B;\nimport a.C;\nclass X {\n  void m() {\n    // comment\n  }\n}";

pub(crate) fn doc(language: &str, text: &str) -> TextDocument {
    TextDocument::new(text, language)
}

/// Parse with the built-in parser for the document's language
pub(crate) fn parse(doc: &TextDocument) -> FoldForest {
    match FoldParserRegistry::with_builtins().get(doc.language()) {
        Some(parser) => parser.parse(doc).unwrap(),
        None => FoldForest::new(),
    }
}

/// A manager over the built-in registry, already parsed, with no events queued
pub(crate) fn manager(doc: &TextDocument) -> FoldManager {
    let registry = Arc::new(FoldParserRegistry::with_builtins());
    let mut manager = FoldManager::new(registry, doc.language());
    manager.reparse(doc).unwrap();
    manager.drain_events();
    manager
}

/// `(type, depth, start line, end line)` of every fold in pre-order
pub(crate) fn spans(
    forest: &FoldForest,
    doc: &TextDocument,
) -> Vec<(FoldType, usize, usize, usize)> {
    forest
        .iter()
        .map(|(id, fold)| {
            (
                fold.fold_type(),
                forest.depth(id),
                fold.start_line(doc),
                fold.end_line(doc),
            )
        })
        .collect()
}

pub(crate) fn ids_of_type(forest: &FoldForest, fold_type: FoldType) -> Vec<FoldId> {
    forest
        .iter()
        .filter(|(_, fold)| fold.fold_type() == fold_type)
        .map(|(id, _)| id)
        .collect()
}
