use super::{create_parser, FoldParser};
use crate::models::Language;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps syntax-style ids (`text/java`, ...) to fold parsers.
///
/// Built once at startup and shared between documents behind an `Arc`.
/// Registering an id that is already present replaces its parser.
#[derive(Clone, Default)]
pub struct FoldParserRegistry {
    parsers: HashMap<String, Arc<dyn FoldParser>>,
}

impl FoldParserRegistry {
    /// A registry with no parsers
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with a parser for every built-in language
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for language in Language::ALL {
            if let Some(parser) = create_parser(language) {
                registry.register(language.id(), parser);
            }
        }
        registry
    }

    /// Register `parser` for `language`, returning the parser it replaces
    pub fn register(
        &mut self,
        language: impl Into<String>,
        parser: Arc<dyn FoldParser>,
    ) -> Option<Arc<dyn FoldParser>> {
        let language = language.into();
        debug!(language = %language, parser = parser.name(), "Registering fold parser");
        self.parsers.insert(language, parser)
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn FoldParser>> {
        self.parsers.get(language).cloned()
    }

    pub fn contains(&self, language: &str) -> bool {
        self.parsers.contains_key(language)
    }

    /// Registered ids in sorted order
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for FoldParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldParserRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FoldSource;
    use crate::error::FoldError;
    use crate::forest::FoldForest;
    use crate::parsers::XmlFoldParser;

    struct NothingParser;

    impl FoldParser for NothingParser {
        fn parse(&self, _source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
            Ok(FoldForest::new())
        }

        fn name(&self) -> &'static str {
            "nothing"
        }
    }

    #[test]
    fn test_builtin_languages() {
        let registry = FoldParserRegistry::with_builtins();
        assert_eq!(
            registry.languages(),
            vec![
                "text/c",
                "text/clojure",
                "text/cpp",
                "text/cs",
                "text/css",
                "text/groovy",
                "text/html",
                "text/java",
                "text/javascript",
                "text/json",
                "text/jsp",
                "text/latex",
                "text/lisp",
                "text/mxml",
                "text/nsis",
                "text/perl",
                "text/php",
                "text/scala",
                "text/xml",
            ]
        );
        assert_eq!(registry.get("text/mxml").map(|p| p.name()), Some("xml"));
        assert_eq!(registry.get("text/clojure").map(|p| p.name()), Some("lisp"));
        assert!(registry.get("text/plain").is_none());
    }

    #[test]
    fn test_later_registration_overrides() {
        let mut registry = FoldParserRegistry::with_builtins();
        let previous = registry.register("text/java", Arc::new(NothingParser));
        assert_eq!(previous.map(|p| p.name()), Some("curly"));
        assert_eq!(registry.get("text/java").map(|p| p.name()), Some("nothing"));
    }

    #[test]
    fn test_custom_language() {
        let mut registry = FoldParserRegistry::new();
        assert!(registry.is_empty());
        registry.register("text/svg", Arc::new(XmlFoldParser::new()));
        assert!(registry.contains("text/svg"));
        assert_eq!(registry.len(), 1);
    }
}
