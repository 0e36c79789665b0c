mod builder;
mod curly;
mod html;
mod json;
mod latex;
mod lisp;
mod nsis;
mod registry;
mod xml;

pub use builder::FoldBuilder;
pub use curly::CurlyFoldParser;
pub use html::{HtmlFlavor, HtmlFoldParser};
pub use json::JsonFoldParser;
pub use latex::LatexFoldParser;
pub use lisp::LispFoldParser;
pub use nsis::NsisFoldParser;
pub use registry::FoldParserRegistry;
pub use xml::XmlFoldParser;

use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::Language;
use std::sync::Arc;

/// Trait for language-specific fold parsers.
///
/// Parsers are stateless between calls and shared across documents, so they
/// must be `Send + Sync`. Malformed input never fails a parse; errors only
/// come from the document's position service.
pub trait FoldParser: Send + Sync {
    /// Scan every line of `source` once and build its fold forest
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Create the built-in parser for a language
pub fn create_parser(language: Language) -> Option<Arc<dyn FoldParser>> {
    let parser: Arc<dyn FoldParser> = match language {
        Language::C
        | Language::Cpp
        | Language::CSharp
        | Language::Css
        | Language::Groovy
        | Language::JavaScript
        | Language::Perl
        | Language::Scala => Arc::new(CurlyFoldParser::new()),
        Language::Java => Arc::new(CurlyFoldParser::java()),
        Language::Clojure | Language::Lisp => Arc::new(LispFoldParser::new()),
        Language::Html => Arc::new(HtmlFoldParser::html()),
        Language::Php => Arc::new(HtmlFoldParser::php()),
        Language::Jsp => Arc::new(HtmlFoldParser::jsp()),
        Language::Json => Arc::new(JsonFoldParser::new()),
        Language::Latex => Arc::new(LatexFoldParser::new()),
        Language::Mxml | Language::Xml => Arc::new(XmlFoldParser::new()),
        Language::Nsis => Arc::new(NsisFoldParser::new()),
        Language::PlainText => return None,
    };
    Some(parser)
}
