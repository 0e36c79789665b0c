use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::{Token, TokenType};

/// Block-level tags worth folding; everything else is too small to matter.
const FOLDABLE_TAGS: &[&str] = &[
    "body", "canvas", "div", "form", "head", "html", "ol", "pre", "script", "span", "style",
    "table", "tfoot", "thead", "tr", "td", "ul",
];

/// Comment delimiters: markup, JSP, and script/style block comments
const COMMENTS: &[(&str, &str)] = &[("<!--", "-->"), ("<%--", "--%>"), ("/*", "*/")];

/// Which server-side language, if any, is embedded in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlFlavor {
    Html,
    Php,
    Jsp,
}

impl HtmlFlavor {
    fn sublanguage(self) -> Option<(&'static str, &'static str)> {
        match self {
            HtmlFlavor::Html => None,
            HtmlFlavor::Php => Some(("<?", "?>")),
            HtmlFlavor::Jsp => Some(("<%", "%>")),
        }
    }
}

/// Where a start tag ends, possibly on a later line
struct TagClose {
    line: usize,
    /// Tokens of `line` when it differs from the line the tag started on
    tokens: Option<Vec<Token>>,
    index: usize,
    self_closing: bool,
}

/// Folds the big structural elements of HTML pages, plus comments and
/// embedded PHP or JSP blocks.
///
/// Tags are matched by name against a stack. Only one level of embedded
/// code is tracked, and markup inside it is ignored.
#[derive(Debug, Clone)]
pub struct HtmlFoldParser {
    flavor: HtmlFlavor,
}

impl HtmlFoldParser {
    pub fn new(flavor: HtmlFlavor) -> Self {
        Self { flavor }
    }

    pub fn html() -> Self {
        Self::new(HtmlFlavor::Html)
    }

    pub fn php() -> Self {
        Self::new(HtmlFlavor::Php)
    }

    pub fn jsp() -> Self {
        Self::new(HtmlFlavor::Jsp)
    }

    pub fn flavor(&self) -> HtmlFlavor {
        self.flavor
    }
}

fn is_foldable_tag(token: Option<&Token>) -> bool {
    token.map_or(false, |t| {
        t.token_type == TokenType::MarkupTagName
            && FOLDABLE_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(t.lexeme()))
    })
}

/// Index of the first `>` or `/>` at or after `from`
fn tag_close_in(tokens: &[Token], from: usize) -> Option<(usize, bool)> {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .take_while(|(_, t)| t.is_paintable())
        .find_map(|(index, t)| {
            if t.is(TokenType::MarkupTagDelimiter, ">") {
                Some((index, false))
            } else if t.is(TokenType::MarkupTagDelimiter, "/>") {
                Some((index, true))
            } else {
                None
            }
        })
}

/// Find the end of a start tag, searching later lines if needed. `None`
/// when the document ends first.
fn find_tag_close(
    source: &dyn FoldSource,
    line: usize,
    tokens: &[Token],
    from: usize,
) -> Option<TagClose> {
    if let Some((index, self_closing)) = tag_close_in(tokens, from) {
        return Some(TagClose {
            line,
            tokens: None,
            index,
            self_closing,
        });
    }
    ((line + 1)..source.line_count()).find_map(|next| {
        let next_tokens = source.tokens_for_line(next);
        tag_close_in(&next_tokens, 0).map(|(index, self_closing)| TagClose {
            line: next,
            tokens: Some(next_tokens),
            index,
            self_closing,
        })
    })
}

impl FoldParser for HtmlFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut tag_names: Vec<String> = Vec::new();
        let mut in_sublanguage = false;
        let mut comment_end: Option<&'static str> = None;
        let sublanguage = self.flavor.sublanguage();

        let line_count = source.line_count();
        let mut line = 0;
        while line < line_count {
            let mut tokens = source.tokens_for_line(line);
            let mut i = 0;
            while i < tokens.len() && tokens[i].is_paintable() {
                let token = &tokens[i];

                if let Some((start, end)) = sublanguage {
                    if token.token_type == TokenType::Separator {
                        if token.starts_with(start) {
                            builder.open(FoldType::Code, token.offset);
                            in_sublanguage = true;
                        } else if in_sublanguage && token.starts_with(end) {
                            builder.close(token.end_offset() - 1)?;
                            in_sublanguage = false;
                            i += 1;
                            continue;
                        }
                    }
                }

                if in_sublanguage {
                    i += 1;
                    continue;
                }

                if token.is_comment() {
                    match comment_end {
                        Some(end) => {
                            if token.ends_with(end) {
                                builder.close(token.end_offset() - 1)?;
                                comment_end = None;
                            }
                        }
                        None => {
                            if let Some(&(_, end)) = COMMENTS
                                .iter()
                                .find(|(start, end)| {
                                    token.starts_with(start) && !token.ends_with(end)
                                })
                            {
                                builder.open(FoldType::Comment, token.offset);
                                comment_end = Some(end);
                            }
                        }
                    }
                } else if token.is(TokenType::MarkupTagDelimiter, "<") {
                    let name = tokens.get(i + 1);
                    if is_foldable_tag(name) {
                        let start = token.offset;
                        let name = name.map(|t| t.lexeme().to_string()).unwrap_or_default();
                        let Some(close) = find_tag_close(source, line, &tokens, i + 2) else {
                            // The tag never ends
                            return builder.finish();
                        };
                        if !close.self_closing {
                            builder.open(FoldType::Code, start);
                            tag_names.push(name);
                        }
                        if let Some(next_tokens) = close.tokens {
                            line = close.line;
                            tokens = next_tokens;
                        }
                        i = close.index;
                    }
                } else if token.is(TokenType::MarkupTagDelimiter, "</") {
                    let name = tokens.get(i + 1);
                    let matches_open = match (name, tag_names.last()) {
                        (Some(name), Some(open)) => {
                            is_foldable_tag(Some(name)) && open.eq_ignore_ascii_case(name.lexeme())
                        }
                        _ => false,
                    };
                    if matches_open {
                        tag_names.pop();
                        builder.close(token.offset)?;
                        i += 1;
                    }
                }

                i += 1;
            }
            line += 1;
        }

        builder.finish()
    }

    fn name(&self) -> &'static str {
        match self.flavor {
            HtmlFlavor::Html => "html",
            HtmlFlavor::Php => "php",
            HtmlFlavor::Jsp => "jsp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, spans};

    fn folds(
        parser: HtmlFoldParser,
        language: &str,
        text: &str,
    ) -> Vec<(FoldType, usize, usize, usize)> {
        let doc = doc(language, text);
        let forest = parser.parse(&doc).unwrap();
        spans(&forest, &doc)
    }

    #[test]
    fn test_block_tags_fold_and_inline_tags_do_not() {
        let text = "<html>\n<body>\n<p>\ntext\n</p>\n<div class=\"a\">\n<b>x</b>\n</div>\n</body>\n</html>";
        assert_eq!(
            folds(HtmlFoldParser::html(), "text/html", text),
            vec![
                (FoldType::Code, 0, 0, 9),
                (FoldType::Code, 1, 1, 8),
                (FoldType::Code, 2, 5, 7),
            ]
        );
    }

    #[test]
    fn test_tag_names_match_case_insensitively() {
        let text = "<DIV>\n<Span>\n</span>\n</div>";
        assert_eq!(
            folds(HtmlFoldParser::html(), "text/html", text),
            vec![(FoldType::Code, 0, 0, 3), (FoldType::Code, 1, 1, 2)]
        );
    }

    #[test]
    fn test_mismatched_end_tag_closes_nothing() {
        let text = "<div>\n</table>\n</div>";
        assert_eq!(
            folds(HtmlFoldParser::html(), "text/html", text),
            vec![(FoldType::Code, 0, 0, 2)]
        );
    }

    #[test]
    fn test_start_tag_spanning_lines() {
        let text = "<div\n  id=\"a\"\n  class=\"b\">\n  x\n</div>\n<div\n/>";
        assert_eq!(
            folds(HtmlFoldParser::html(), "text/html", text),
            vec![(FoldType::Code, 0, 0, 4)]
        );
    }

    #[test]
    fn test_unfinished_start_tag_stops_parsing() {
        let text = "<table>\n<tr>\n</tr>\n<div class=\"x\"";
        let doc = doc("text/html", text);
        let forest = HtmlFoldParser::html().parse(&doc).unwrap();
        assert_eq!(
            spans(&forest, &doc),
            vec![(FoldType::Code, 0, 0, 3), (FoldType::Code, 1, 1, 2)]
        );
        assert!(forest[forest.roots()[0]].is_unterminated());
    }

    #[test]
    fn test_comments_and_script_comments() {
        let text = "<!-- a\nb -->\n<script>\n/* c\nd */\nf();\n</script>";
        assert_eq!(
            folds(HtmlFoldParser::html(), "text/html", text),
            vec![
                (FoldType::Comment, 0, 0, 1),
                (FoldType::Code, 0, 2, 6),
                (FoldType::Comment, 1, 3, 4),
            ]
        );
    }

    #[test]
    fn test_php_blocks() {
        let text = "<div>\n<?php\nif ($a) {\n}\n?>\n</div>";
        let doc = doc("text/php", text);
        let forest = HtmlFoldParser::php().parse(&doc).unwrap();
        assert_eq!(
            spans(&forest, &doc),
            vec![(FoldType::Code, 0, 0, 5), (FoldType::Code, 1, 1, 4)]
        );
        let php = forest[forest.roots()[0]].children()[0];
        assert_eq!(forest[php].end_offset(), Some(text.find("?>").unwrap() + 1));
    }

    #[test]
    fn test_markup_inside_php_is_ignored() {
        let text = "<?php\necho '<div>';\n?>\n<div>\n</div>";
        let doc = doc("text/php", text);
        let forest = HtmlFoldParser::php().parse(&doc).unwrap();
        assert_eq!(
            spans(&forest, &doc),
            vec![(FoldType::Code, 0, 0, 2), (FoldType::Code, 0, 3, 4)]
        );
    }

    #[test]
    fn test_jsp_scriptlets_and_comments() {
        let text = "<%--\n note\n--%>\n<%\n int x = 1;\n%>";
        assert_eq!(
            folds(HtmlFoldParser::jsp(), "text/jsp", text),
            vec![(FoldType::Comment, 0, 0, 2), (FoldType::Code, 0, 3, 5)]
        );
    }

    #[test]
    fn test_stray_sublanguage_end_is_ignored() {
        // `?>` is plain text in HTML, and in PHP closes only an open block
        let text = "<div>\n?>\n</div>";
        assert_eq!(
            folds(HtmlFoldParser::php(), "text/php", text),
            vec![(FoldType::Code, 0, 0, 2)]
        );
    }
}
