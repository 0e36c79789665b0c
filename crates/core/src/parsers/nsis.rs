use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::TokenType;

const MLC_END: &str = "*/";

/// Block keywords and the keyword that ends each of them
const BLOCKS: &[(&str, &str)] = &[
    ("Function", "FunctionEnd"),
    ("Section", "SectionEnd"),
    ("SectionGroup", "SectionGroupEnd"),
    ("PageEx", "PageExEnd"),
];

/// Folds NSIS installer scripts: functions, sections, section groups,
/// `PageEx` blocks and multi-line comments.
#[derive(Debug, Clone, Default)]
pub struct NsisFoldParser;

impl NsisFoldParser {
    pub fn new() -> Self {
        Self
    }
}

impl FoldParser for NsisFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut expected_ends: Vec<&'static str> = Vec::new();
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
                            if token.token_type != TokenType::CommentEol
                                && !token.ends_with(MLC_END)
                            {
                                comment_start = Some(token.offset);
                            }
                        }
                    }
                    continue;
                }

                if token.token_type != TokenType::ReservedWord {
                    continue;
                }
                if let Some(&(_, end)) = BLOCKS.iter().find(|(start, _)| token.lexeme() == *start) {
                    builder.open(FoldType::Code, token.offset);
                    expected_ends.push(end);
                } else if expected_ends.last().copied() == Some(token.lexeme()) {
                    expected_ends.pop();
                    builder.close(token.offset)?;
                }
            }
        }

        builder.finish()
    }

    fn name(&self) -> &'static str {
        "nsis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, spans};

    fn folds(text: &str) -> Vec<(FoldType, usize, usize, usize)> {
        let doc = doc("text/nsis", text);
        let forest = NsisFoldParser::new().parse(&doc).unwrap();
        spans(&forest, &doc)
    }

    #[test]
    fn test_sections_and_functions() {
        let text = "Section \"Main\"\n  SetOutPath $INSTDIR\nSectionEnd\nFunction .onInit\n  Call Setup\nFunctionEnd";
        assert_eq!(
            folds(text),
            vec![(FoldType::Code, 0, 0, 2), (FoldType::Code, 0, 3, 5)]
        );
    }

    #[test]
    fn test_section_group_nests_sections() {
        let text = "SectionGroup \"All\"\nSection \"A\"\nFile a\nSectionEnd\nSectionGroupEnd";
        assert_eq!(
            folds(text),
            vec![(FoldType::Code, 0, 0, 4), (FoldType::Code, 1, 1, 3)]
        );
    }

    #[test]
    fn test_wrong_end_keyword_closes_nothing() {
        let doc = doc("text/nsis", "Function f\nSectionEnd\n");
        let forest = NsisFoldParser::new().parse(&doc).unwrap();
        assert_eq!(forest.len(), 1);
        assert!(forest[forest.roots()[0]].is_unterminated());
    }

    #[test]
    fn test_block_comment() {
        let text = "/* installer\n   script */\n; line comment\n# another";
        assert_eq!(folds(text), vec![(FoldType::Comment, 0, 0, 1)]);
    }
}
