use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::{Token, TokenType};

/// A run of `import` statements waiting to become one fold
#[derive(Debug)]
struct ImportGroup {
    start_line: usize,
    last_line: usize,
    start: usize,
    end: usize,
}

/// Folds brace-delimited blocks in C-like languages.
///
/// Optionally folds multi-line comments and groups consecutive Java-style
/// `import` statements into a single fold. A block that reopens on the line
/// where the previous one closed (`} else {`) extends that fold.
#[derive(Debug, Clone)]
pub struct CurlyFoldParser {
    fold_comments: bool,
    fold_imports: bool,
    open: char,
    close: char,
    comment_end: &'static str,
}

impl CurlyFoldParser {
    /// Braces and multi-line comments
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    /// Braces, multi-line comments and import groups
    pub fn java() -> Self {
        Self::with_options(true, true)
    }

    pub fn with_options(fold_comments: bool, fold_imports: bool) -> Self {
        Self {
            fold_comments,
            fold_imports,
            open: '{',
            close: '}',
            comment_end: "*/",
        }
    }

    /// Same algorithm over a different delimiter pair and block comment end
    pub(crate) fn with_delimiters(open: char, close: char, comment_end: &'static str) -> Self {
        Self {
            fold_comments: true,
            fold_imports: false,
            open,
            close,
            comment_end,
        }
    }

    pub fn folds_comments(&self) -> bool {
        self.fold_comments
    }

    pub fn folds_imports(&self) -> bool {
        self.fold_imports
    }

    fn is_left(&self, token: &Token) -> bool {
        token.is_single_char_of(TokenType::Separator, self.open)
    }

    fn is_right(&self, token: &Token) -> bool {
        token.is_single_char_of(TokenType::Separator, self.close)
    }

    fn flush_imports(
        builder: &mut FoldBuilder<'_>,
        group: &mut Option<ImportGroup>,
    ) -> Result<(), FoldError> {
        if let Some(imports) = group.take() {
            if imports.last_line > imports.start_line {
                builder.add_closed(FoldType::Imports, imports.start, imports.end)?;
            }
        }
        Ok(())
    }
}

impl Default for CurlyFoldParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FoldParser for CurlyFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut comment_start: Option<usize> = None;
        let mut imports: Option<ImportGroup> = None;
        let mut last_close_line: Option<usize> = None;

        for line in 0..source.line_count() {
            let tokens = source.tokens_for_line(line);
            for token in tokens.iter().take_while(|t| t.is_paintable()) {
                if self.fold_comments && token.is_comment() {
                    Self::flush_imports(&mut builder, &mut imports)?;
                    match comment_start {
                        Some(start) if token.ends_with(self.comment_end) => {
                            builder.add_closed(FoldType::Comment, start, token.end_offset() - 1)?;
                            comment_start = None;
                        }
                        Some(_) => {}
                        None => {
                            if token.token_type != TokenType::CommentEol
                                && !token.ends_with(self.comment_end)
                            {
                                comment_start = Some(token.offset);
                            }
                        }
                    }
                } else if self.is_left(token) {
                    Self::flush_imports(&mut builder, &mut imports)?;
                    let continues = last_close_line == Some(line) && builder.reopen_last_closed();
                    if !continues {
                        builder.open(FoldType::Code, token.offset);
                    }
                    last_close_line = None;
                } else if self.is_right(token) {
                    Self::flush_imports(&mut builder, &mut imports)?;
                    if builder.close(token.offset)? {
                        last_close_line = Some(line);
                    }
                } else if self.fold_imports && token.is(TokenType::ReservedWord, "import") {
                    match imports.as_mut() {
                        Some(group) => {
                            group.last_line = line;
                            group.end = token.offset;
                        }
                        None => {
                            imports = Some(ImportGroup {
                                start_line: line,
                                last_line: line,
                                start: token.offset,
                                end: token.offset,
                            });
                        }
                    }
                } else if token.is_single_char_of(TokenType::Separator, ';') {
                    if let Some(group) = imports.as_mut() {
                        group.end = token.offset;
                    }
                }
            }
        }

        Self::flush_imports(&mut builder, &mut imports)?;
        builder.finish()
    }

    fn name(&self) -> &'static str {
        "curly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, spans};

    fn folds(
        parser: &CurlyFoldParser,
        language: &str,
        text: &str,
    ) -> Vec<(FoldType, usize, usize, usize)> {
        let doc = doc(language, text);
        let forest = parser.parse(&doc).unwrap();
        spans(&forest, &doc)
    }

    #[test]
    fn test_java_imports_and_nested_blocks() {
        let text = "import a.B;\nimport a.C;\nclass X {\n  void m() {\n    // comment\n  }\n}";
        assert_eq!(
            folds(&CurlyFoldParser::java(), "text/java", text),
            vec![
                (FoldType::Imports, 0, 0, 1),
                (FoldType::Code, 0, 2, 6),
                (FoldType::Code, 1, 3, 5),
            ]
        );
    }

    #[test]
    fn test_single_import_is_not_folded() {
        let text = "import a.B;\nclass X {\n}";
        assert_eq!(
            folds(&CurlyFoldParser::java(), "text/java", text),
            vec![(FoldType::Code, 0, 1, 2)]
        );
    }

    #[test]
    fn test_import_group_at_end_of_document() {
        let text = "package p;\nimport a.B;\nimport a.C;\nimport a.D;";
        let doc = doc("text/java", text);
        let forest = CurlyFoldParser::java().parse(&doc).unwrap();
        assert_eq!(spans(&forest, &doc), vec![(FoldType::Imports, 0, 1, 3)]);
        let fold = &forest[forest.roots()[0]];
        assert_eq!(fold.start_offset(), text.find("import").unwrap());
        assert_eq!(fold.end_offset(), Some(text.rfind(';').unwrap()));
    }

    #[test]
    fn test_imports_ignored_without_import_folding() {
        let text = "import a.B;\nimport a.C;";
        assert!(folds(&CurlyFoldParser::new(), "text/java", text).is_empty());
    }

    #[test]
    fn test_multiline_comment_fold() {
        let text = "/*\n * doc\n */\nint f() {\n  /* one line */\n}";
        let doc = doc("text/c", text);
        let forest = CurlyFoldParser::new().parse(&doc).unwrap();
        assert_eq!(
            spans(&forest, &doc),
            vec![(FoldType::Comment, 0, 0, 2), (FoldType::Code, 0, 3, 5)]
        );
        let comment = &forest[forest.roots()[0]];
        assert_eq!(comment.end_offset(), Some(text.find("*/").unwrap() + 1));
    }

    #[test]
    fn test_comment_folding_can_be_disabled() {
        let text = "/*\n*/";
        let parser = CurlyFoldParser::with_options(false, false);
        assert!(folds(&parser, "text/c", text).is_empty());
    }

    #[test]
    fn test_else_continues_the_if_block() {
        let text = "if (a) {\n  x();\n} else {\n  y();\n}";
        assert_eq!(
            folds(&CurlyFoldParser::new(), "text/c", text),
            vec![(FoldType::Code, 0, 0, 4)]
        );
    }

    #[test]
    fn test_single_line_block_then_new_block() {
        let text = "if (a) { x(); } else {\n  y();\n}";
        assert_eq!(
            folds(&CurlyFoldParser::new(), "text/c", text),
            vec![(FoldType::Code, 0, 0, 2)]
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        let doc = doc("text/java", "{\n{\n");
        let forest = CurlyFoldParser::new().parse(&doc).unwrap();
        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|(_, f)| f.is_unterminated()));

        assert!(folds(&CurlyFoldParser::new(), "text/c", "}\n}\n").is_empty());
    }

    #[test]
    fn test_braces_in_strings_are_ignored() {
        let text = "s = \"{\";\nt = '}';\nu = 1;";
        assert!(folds(&CurlyFoldParser::new(), "text/javascript", text).is_empty());
    }
}
