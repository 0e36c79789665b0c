//! Foldline Core Library
//!
//! A token-driven code folding engine. Language parsers scan a tokenized
//! document and build a forest of nested foldable regions; a per-document
//! manager answers line visibility questions and keeps collapsed folds
//! collapsed as the document is edited and reparsed.
//!
//! # Features
//!
//! - Brace, bracket, tag, environment and keyword-block folding for C-like
//!   languages, Lisp, JSON, XML, HTML/PHP/JSP, LaTeX and NSIS
//! - Multi-line comment folds and Java import groups
//! - Sticky fold positions that follow edits, with collapse state carried
//!   across reparses
//! - Hidden line, visible line and caret bookkeeping for gutters and navigation
//! - Project scanning with statistics in JSON, YAML or terminal format
//!
//! # Example
//!
//! ```
//! use foldline_core::{FoldManager, FoldParserRegistry, TextDocument};
//! use std::sync::Arc;
//!
//! let mut doc = TextDocument::new("class A {\n  void a() {\n  }\n}", "text/java");
//! let registry = Arc::new(FoldParserRegistry::with_builtins());
//! let mut manager = FoldManager::new(registry, doc.language());
//! manager.reparse(&doc).unwrap();
//!
//! let class = manager.fold(0).unwrap();
//! manager.set_collapsed(class, true, &doc);
//! assert!(manager.is_line_hidden(2, &doc));
//!
//! let event = doc.insert(0, "// header\n").unwrap();
//! manager.handle_document_event(&event, &doc).unwrap();
//! assert!(manager.is_line_hidden(3, &doc));
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod forest;
pub mod lexer;
pub mod models;
pub mod output;
pub mod parsers;
pub mod text;
pub mod token;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::{ConfigError, FoldConfig, IgnoreFilter, ScanConfig};
pub use document::{
    DocumentEvent, FoldSource, Position, PositionService, PositionTracker, TokenSource,
};
pub use engine::{
    render_file, render_file_ansi, FoldCollapser, FoldEvent, FoldManager, FoldScanner,
    FoldedDocument, Renderer, ScanError, Selection,
};
pub use error::FoldError;
pub use forest::{Fold, FoldForest, FoldId};
pub use models::*;
pub use output::{
    format_file, format_output, format_output_grouped, format_summary, FormatError, OutputFormat,
};
pub use parsers::{create_parser, FoldBuilder, FoldParser, FoldParserRegistry};
pub use text::TextDocument;
pub use token::{Token, TokenType};
