use super::code::{self, CodeContext, CodeSyntax};
use super::{close_len, Closer, CommentKind, Embed, LexState};
use crate::token::{Token, TokenType};
use logos::Logos;

/// Markup languages differ in which code they embed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkupFlavor {
    Xml,
    Html,
    Php,
    Jsp,
}

/// What a `<?` opens in the current flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    Code,
    Instruction,
}

/// Text between tags
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(extras = MarkupFlavor)]
enum Content {
    #[regex(r"[ \t\x0B\x0C\r]+")]
    Whitespace,

    #[regex(r"&[a-zA-Z0-9#\x{80}-\x{10FFFF}]+;")]
    Entity,

    #[token("<!--")]
    CommentOpen,

    #[token("<%--", jsp_only)]
    JspCommentOpen,

    #[token("<%", jsp_only)]
    #[token("<%!", jsp_only)]
    #[token("<%=", jsp_only)]
    #[token("<%@", jsp_only)]
    JspOpen,

    #[token("<?", question)]
    #[token("<?=", question)]
    #[regex("<[?][pP][hH][pP]", question)]
    Question(Question),

    #[token("<![CDATA[")]
    CdataOpen,

    #[token("<!", dtd)]
    Dtd,

    #[token("</")]
    #[regex(r"</[a-zA-Z_:\x{80}-\x{10FFFF}][a-zA-Z0-9_:.\-\x{80}-\x{10FFFF}]*")]
    CloseTag,

    #[regex(r"<[a-zA-Z_:\x{80}-\x{10FFFF}][a-zA-Z0-9_:.\-\x{80}-\x{10FFFF}]*")]
    OpenTag,

    #[regex(r"[^ \t\x0B\x0C\r<&]+", allow_greedy = true)]
    Text,
}

fn jsp_only(lex: &mut logos::Lexer<Content>) -> bool {
    lex.extras == MarkupFlavor::Jsp
}

fn question(lex: &mut logos::Lexer<Content>) -> Question {
    if lex.extras == MarkupFlavor::Php {
        Question::Code
    } else {
        Question::Instruction
    }
}

fn dtd(lex: &mut logos::Lexer<Content>) {
    let rest = lex.remainder();
    lex.bump(rest.find('>').map_or(rest.len(), |at| at + 1));
}

/// Inside `<name ... >`
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TagToken {
    #[regex(r"[ \t\x0B\x0C\r]+")]
    Whitespace,

    #[token("/>")]
    SelfClose,

    #[token(">")]
    Close,

    #[regex(r#""[^"]*"?"#, allow_greedy = true)]
    #[regex(r"'[^']*'?", allow_greedy = true)]
    Value,

    #[regex(r"[a-zA-Z0-9_:.\-\x{80}-\x{10FFFF}]+")]
    Attribute,
}

fn embedded_syntax(embed: Embed) -> &'static CodeSyntax {
    match embed {
        Embed::Php => &code::PHP,
        Embed::Jsp => &code::JAVA,
        Embed::Script => &code::JAVASCRIPT,
        Embed::Style => &code::CSS,
    }
}

fn tag_embed(flavor: MarkupFlavor, name: &str) -> Option<Embed> {
    match flavor {
        MarkupFlavor::Xml => None,
        _ if name.eq_ignore_ascii_case("script") => Some(Embed::Script),
        _ if name.eq_ignore_ascii_case("style") => Some(Embed::Style),
        _ => None,
    }
}

/// A construct that runs from its opener to a close marker, possibly across
/// lines
struct Delimited {
    close: Closer,
    token_type: TokenType,
    open: LexState,
}

const COMMENT: Delimited = Delimited {
    close: Closer::MarkupComment,
    token_type: TokenType::MarkupComment,
    open: LexState::MarkupComment,
};

const JSP_COMMENT: Delimited = Delimited {
    close: Closer::JspComment,
    token_type: TokenType::MarkupComment,
    open: LexState::JspComment,
};

const CDATA: Delimited = Delimited {
    close: Closer::Cdata,
    token_type: TokenType::MarkupCdata,
    open: LexState::Cdata,
};

const INSTRUCTION: Delimited = Delimited {
    close: Closer::Instruction,
    token_type: TokenType::MarkupProcessingInstruction,
    open: LexState::Instruction,
};

/// Push `line[start..]` up to and including the close marker as one token,
/// searching for the marker from `body`. Without one the token runs to the
/// end of the line and the construct stays open.
fn delimited(
    line: &str,
    start: usize,
    body: usize,
    what: &Delimited,
    base: usize,
    out: &mut Vec<Token>,
) -> (usize, LexState) {
    let end = close_len(&line[body..], what.close).map(|len| body + len);
    let stop = end.unwrap_or(line.len());
    if stop > start {
        out.push(Token::new(what.token_type, base + start, &line[start..stop]));
    }
    match end {
        Some(end) => (end, LexState::Normal),
        None => (line.len(), what.open),
    }
}

pub(crate) fn scan_markup(
    flavor: MarkupFlavor,
    line: &str,
    base: usize,
    mut state: LexState,
    out: &mut Vec<Token>,
) -> LexState {
    let mut i = 0;

    while i < line.len() {
        let (end, next) = match state {
            LexState::MarkupComment => delimited(line, i, i, &COMMENT, base, out),
            LexState::JspComment => delimited(line, i, i, &JSP_COMMENT, base, out),
            LexState::Cdata => delimited(line, i, i, &CDATA, base, out),
            LexState::Instruction => delimited(line, i, i, &INSTRUCTION, base, out),
            LexState::Embedded { embed, comment } => {
                scan_embedded(line, i, base, embed, comment, out)
            }
            LexState::Tag { embed } => scan_tag(line, i, base, embed, out),
            LexState::Normal | LexState::BlockComment(_) => {
                scan_content(flavor, line, i, base, out)
            }
        };
        i = end;
        state = next;
    }

    state
}

fn scan_embedded(
    line: &str,
    start: usize,
    base: usize,
    embed: Embed,
    comment: Option<CommentKind>,
    out: &mut Vec<Token>,
) -> (usize, LexState) {
    let ctx = CodeContext::embedded(embedded_syntax(embed), embed);
    let scan = code::scan_code(ctx, line, start, base, comment, out);
    if scan.comment.is_some() || scan.stop >= line.len() {
        let state = LexState::Embedded {
            embed,
            comment: scan.comment,
        };
        return (line.len(), state);
    }
    // `</script` and `</style` are left for the content lexer
    let mut end = scan.stop;
    if matches!(embed, Embed::Php | Embed::Jsp) {
        end += embed.close_marker().len();
        out.push(Token::new(TokenType::Separator, base + scan.stop, &line[scan.stop..end]));
    }
    (end, LexState::Normal)
}

fn scan_content(
    flavor: MarkupFlavor,
    line: &str,
    start: usize,
    base: usize,
    out: &mut Vec<Token>,
) -> (usize, LexState) {
    let mut lex = Content::lexer_with_extras(&line[start..], flavor);

    while let Some(token) = lex.next() {
        let from = start + lex.span().start;
        let to = start + lex.span().end;
        let text = lex.slice();
        let token_type = match token {
            Ok(Content::CommentOpen) => return delimited(line, from, to, &COMMENT, base, out),
            Ok(Content::JspCommentOpen) => {
                return delimited(line, from, to, &JSP_COMMENT, base, out);
            }
            Ok(Content::CdataOpen) => return delimited(line, from, to, &CDATA, base, out),
            Ok(Content::Question(Question::Instruction)) => {
                return delimited(line, from, to, &INSTRUCTION, base, out);
            }
            Ok(Content::Question(Question::Code)) | Ok(Content::JspOpen) => {
                let embed = if flavor == MarkupFlavor::Jsp {
                    Embed::Jsp
                } else {
                    Embed::Php
                };
                out.push(Token::new(TokenType::Separator, base + from, text));
                let state = LexState::Embedded {
                    embed,
                    comment: None,
                };
                return (to, state);
            }
            Ok(Content::CloseTag) => {
                out.push(Token::new(TokenType::MarkupTagDelimiter, base + from, "</"));
                if text.len() > 2 {
                    out.push(Token::new(TokenType::MarkupTagName, base + from + 2, &text[2..]));
                }
                return (to, LexState::Tag { embed: None });
            }
            Ok(Content::OpenTag) => {
                let name = &text[1..];
                out.push(Token::new(TokenType::MarkupTagDelimiter, base + from, "<"));
                out.push(Token::new(TokenType::MarkupTagName, base + from + 1, name));
                let embed = tag_embed(flavor, name);
                return (to, LexState::Tag { embed });
            }
            Ok(Content::Whitespace) => TokenType::Whitespace,
            Ok(Content::Entity) => TokenType::MarkupEntityReference,
            Ok(Content::Dtd) => TokenType::MarkupDtd,
            Ok(Content::Text) | Err(()) => TokenType::Identifier,
        };
        out.push(Token::new(token_type, base + from, text));
    }

    (line.len(), LexState::Normal)
}

fn scan_tag(
    line: &str,
    start: usize,
    base: usize,
    embed: Option<Embed>,
    out: &mut Vec<Token>,
) -> (usize, LexState) {
    let mut lex = TagToken::lexer(&line[start..]);

    while let Some(token) = lex.next() {
        let from = start + lex.span().start;
        let to = start + lex.span().end;
        let text = lex.slice();
        let token_type = match token {
            Ok(TagToken::SelfClose) => {
                out.push(Token::new(TokenType::MarkupTagDelimiter, base + from, text));
                return (to, LexState::Normal);
            }
            Ok(TagToken::Close) => {
                out.push(Token::new(TokenType::MarkupTagDelimiter, base + from, text));
                let next = match embed {
                    Some(embed) => LexState::Embedded {
                        embed,
                        comment: None,
                    },
                    None => LexState::Normal,
                };
                return (to, next);
            }
            Ok(TagToken::Whitespace) => TokenType::Whitespace,
            Ok(TagToken::Value) => TokenType::MarkupTagAttributeValue,
            Ok(TagToken::Attribute) => TokenType::MarkupTagAttribute,
            Err(()) => TokenType::Operator,
        };
        out.push(Token::new(token_type, base + from, text));
    }

    (line.len(), LexState::Tag { embed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(flavor: MarkupFlavor, text: &str) -> Vec<Vec<Token>> {
        let mut state = LexState::Normal;
        let mut base = 0;
        let mut lines = Vec::new();
        for line in text.split('\n') {
            let mut out = Vec::new();
            state = scan_markup(flavor, line, base, state, &mut out);
            lines.push(out);
            base += line.len() + 1;
        }
        lines
    }

    fn kinds(tokens: &[Token]) -> Vec<(TokenType, &str)> {
        tokens
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| (t.token_type, t.lexeme()))
            .collect()
    }

    #[test]
    fn test_xml_tags() {
        let lines = scan_all(MarkupFlavor::Xml, "<a href=\"x\"><b/></a>");
        assert_eq!(
            kinds(&lines[0]),
            vec![
                (TokenType::MarkupTagDelimiter, "<"),
                (TokenType::MarkupTagName, "a"),
                (TokenType::MarkupTagAttribute, "href"),
                (TokenType::Operator, "="),
                (TokenType::MarkupTagAttributeValue, "\"x\""),
                (TokenType::MarkupTagDelimiter, ">"),
                (TokenType::MarkupTagDelimiter, "<"),
                (TokenType::MarkupTagName, "b"),
                (TokenType::MarkupTagDelimiter, "/>"),
                (TokenType::MarkupTagDelimiter, "</"),
                (TokenType::MarkupTagName, "a"),
                (TokenType::MarkupTagDelimiter, ">"),
            ]
        );
    }

    #[test]
    fn test_markup_comment_spans_lines() {
        let lines = scan_all(MarkupFlavor::Xml, "<!-- one\ntwo\nthree --> <x>");
        assert_eq!(lines[0][0].token_type, TokenType::MarkupComment);
        assert_eq!(lines[0][0].lexeme(), "<!-- one");
        assert_eq!(lines[1][0].lexeme(), "two");
        assert_eq!(lines[2][0].lexeme(), "three -->");
        assert!(lines[2]
            .iter()
            .any(|t| t.is(TokenType::MarkupTagName, "x")));
    }

    #[test]
    fn test_open_tag_split_across_lines() {
        let lines = scan_all(MarkupFlavor::Html, "<div\n  class=\"a\">");
        assert!(lines[1].iter().any(|t| t.is(TokenType::MarkupTagAttribute, "class")));
        assert!(lines[1].iter().any(|t| t.is(TokenType::MarkupTagDelimiter, ">")));
    }

    #[test]
    fn test_script_body_is_javascript() {
        let lines = scan_all(MarkupFlavor::Html, "<script>\n/* a\nb */ f();\n</script>");
        assert_eq!(lines[1][0].token_type, TokenType::CommentMultiline);
        assert_eq!(lines[2][0].lexeme(), "b */");
        assert!(lines[2].iter().any(|t| t.is(TokenType::Separator, ";")));
        assert_eq!(
            kinds(&lines[3]),
            vec![
                (TokenType::MarkupTagDelimiter, "</"),
                (TokenType::MarkupTagName, "script"),
                (TokenType::MarkupTagDelimiter, ">"),
            ]
        );
    }

    #[test]
    fn test_php_blocks_are_separators() {
        let lines = scan_all(MarkupFlavor::Php, "<p><?php if ($x) { ?>\n<?php } ?></p>");
        assert!(lines[0].iter().any(|t| t.is(TokenType::Separator, "<?php")));
        assert!(lines[0].iter().any(|t| t.is_left_curly()));
        assert!(lines[0].iter().any(|t| t.is(TokenType::Separator, "?>")));
        assert!(lines[1].iter().any(|t| t.is_right_curly()));
        assert!(lines[1].iter().any(|t| t.is(TokenType::MarkupTagName, "p")));
    }

    #[test]
    fn test_xml_processing_instruction_is_not_embedded() {
        let lines = scan_all(MarkupFlavor::Xml, "<?xml version=\"1.0\"?>");
        assert_eq!(lines[0].len(), 1);
        assert_eq!(lines[0][0].token_type, TokenType::MarkupProcessingInstruction);
    }

    #[test]
    fn test_jsp_comment_and_scriptlet() {
        let lines = scan_all(MarkupFlavor::Jsp, "<%-- a\nb --%>\n<% int x; %>");
        assert_eq!(lines[0][0].token_type, TokenType::MarkupComment);
        assert!(lines[1][0].ends_with("--%>"));
        assert!(lines[2].iter().any(|t| t.is(TokenType::Separator, "<%")));
        assert!(lines[2].iter().any(|t| t.is(TokenType::ReservedWord, "int")));
        assert!(lines[2].iter().any(|t| t.is(TokenType::Separator, "%>")));
    }

    #[test]
    fn test_entity_reference() {
        let lines = scan_all(MarkupFlavor::Html, "a &amp; b & c");
        assert!(lines[0].iter().any(|t| t.is(TokenType::MarkupEntityReference, "&amp;")));
        assert!(lines[0].iter().any(|t| t.is(TokenType::Identifier, "&")));
    }

    #[test]
    fn test_cdata_and_doctype() {
        let lines = scan_all(MarkupFlavor::Xml, "<!DOCTYPE x>\n<![CDATA[ a\n]]><y/>");
        assert_eq!(lines[0][0].token_type, TokenType::MarkupDtd);
        assert_eq!(lines[0][0].lexeme(), "<!DOCTYPE x>");
        assert_eq!(lines[1][0].token_type, TokenType::MarkupCdata);
        assert_eq!(lines[2][0].lexeme(), "]]>");
        assert!(lines[2].iter().any(|t| t.is(TokenType::MarkupTagName, "y")));
    }

    #[test]
    fn test_jsp_markers_are_text_outside_jsp() {
        let lines = scan_all(MarkupFlavor::Html, "<% x %>");
        assert!(lines[0].iter().all(|t| t.token_type != TokenType::Separator));
        assert!(lines[0].iter().all(|t| t.token_type != TokenType::MarkupTagName));
    }
}
