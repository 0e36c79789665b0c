use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::TokenType;

const MLC_START: &str = "<!--";
const MLC_END: &str = "-->";

/// Folds XML elements that span lines, and multi-line comments.
///
/// Every start tag opens a fold and every end tag closes the innermost one;
/// tag names are not compared. Self-closing tags open nothing.
#[derive(Debug, Clone, Default)]
pub struct XmlFoldParser;

impl XmlFoldParser {
    pub fn new() -> Self {
        Self
    }
}

impl FoldParser for XmlFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut comment_start: Option<usize> = None;

        for line in 0..source.line_count() {
            let tokens = source.tokens_for_line(line);
            for token in tokens.iter().take_while(|t| t.is_paintable()) {
                if token.is_comment() {
                    match comment_start {
                        Some(start) if token.ends_with(MLC_END) => {
                            builder.add_closed(FoldType::Comment, start, token.end_offset() - 1)?;
                            comment_start = None;
                        }
                        Some(_) => {}
                        None => {
                            if token.starts_with(MLC_START) && !token.ends_with(MLC_END) {
                                comment_start = Some(token.offset);
                            }
                        }
                    }
                } else if token.token_type == TokenType::MarkupTagDelimiter {
                    match token.lexeme() {
                        "<" => builder.open(FoldType::Code, token.offset),
                        "/>" => {
                            builder.discard();
                        }
                        "</" => {
                            builder.close(token.offset)?;
                        }
                        _ => {}
                    }
                }
            }
        }

        builder.finish()
    }

    fn name(&self) -> &'static str {
        "xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, spans};

    fn folds(text: &str) -> Vec<(FoldType, usize, usize, usize)> {
        let doc = doc("text/xml", text);
        let forest = XmlFoldParser::new().parse(&doc).unwrap();
        spans(&forest, &doc)
    }

    #[test]
    fn test_self_closing_tag_is_not_folded() {
        assert_eq!(folds("<a>\n<b/>\n</a>"), vec![(FoldType::Code, 0, 0, 2)]);
    }

    #[test]
    fn test_nested_elements_and_comment() {
        let text = "<?xml version=\"1.0\"?>\n<root>\n  <!-- a\n  b -->\n  <item>\n    x\n  </item>\n  <one>y</one>\n</root>";
        assert_eq!(
            folds(text),
            vec![
                (FoldType::Code, 0, 1, 8),
                (FoldType::Comment, 1, 2, 3),
                (FoldType::Code, 1, 4, 6),
            ]
        );
    }

    #[test]
    fn test_comment_ends_on_last_character() {
        let text = "<!--\n-->";
        let doc = doc("text/xml", text);
        let forest = XmlFoldParser::new().parse(&doc).unwrap();
        assert_eq!(forest[forest.roots()[0]].end_offset(), Some(text.len() - 1));
    }

    #[test]
    fn test_unclosed_element_runs_to_end() {
        let doc = doc("text/mxml", "<a>\n<b>\n</b>\n");
        let forest = XmlFoldParser::new().parse(&doc).unwrap();
        assert_eq!(forest.len(), 2);
        assert!(forest[forest.roots()[0]].is_unterminated());
    }
}
