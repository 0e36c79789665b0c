use super::curly::CurlyFoldParser;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;

/// Folds parenthesized forms in Lisp dialects, plus `#| |#` block comments.
#[derive(Debug, Clone)]
pub struct LispFoldParser {
    inner: CurlyFoldParser,
}

impl LispFoldParser {
    pub fn new() -> Self {
        Self {
            inner: CurlyFoldParser::with_delimiters('(', ')', "|#"),
        }
    }
}

impl Default for LispFoldParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FoldParser for LispFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        self.inner.parse(source)
    }

    fn name(&self) -> &'static str {
        "lisp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoldType;
    use crate::testing::{doc, spans};

    #[test]
    fn test_forms_fold_on_parens() {
        let text = "(defun f (x)\n  (let ((y 1))\n    (+ x y)))\n(g)";
        let doc = doc("text/lisp", text);
        let forest = LispFoldParser::new().parse(&doc).unwrap();
        assert_eq!(
            spans(&forest, &doc),
            vec![(FoldType::Code, 0, 0, 2), (FoldType::Code, 1, 1, 2)]
        );
    }

    #[test]
    fn test_block_comment() {
        let text = "#| first\n   second |#\n; one line";
        let doc = doc("text/clojure", text);
        let forest = LispFoldParser::new().parse(&doc).unwrap();
        assert_eq!(spans(&forest, &doc), vec![(FoldType::Comment, 0, 0, 1)]);
    }

    #[test]
    fn test_braces_do_not_fold() {
        let doc = doc("text/clojure", "{:a 1\n :b 2}");
        assert!(LispFoldParser::new().parse(&doc).unwrap().is_empty());
    }
}
