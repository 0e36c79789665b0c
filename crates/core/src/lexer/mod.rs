//! Reference line tokenizer.
//!
//! The folding engine only consumes classified tokens; hosts with their own
//! syntax highlighter never need this module. It exists so documents can be
//! folded without an editor around them (the CLI, the scanner, tests) and it
//! classifies exactly what the fold parsers look at: separators, comments,
//! markup delimiters, tag names, reserved words.

mod code;
mod latex;
mod markup;

use crate::models::Language;
use crate::token::{Token, TokenType};
use code::CodeSyntax;
use logos::Logos;
use markup::MarkupFlavor;

/// Which kind of block comment is still open at the end of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Block,
    Doc,
}

/// Code embedded in markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embed {
    Php,
    Jsp,
    Script,
    Style,
}

impl Embed {
    /// Lowercase marker that hands control back to the markup
    pub(crate) fn close_marker(self) -> &'static str {
        match self {
            Embed::Php => "?>",
            Embed::Jsp => "%>",
            Embed::Script => "</script",
            Embed::Style => "</style",
        }
    }
}

/// Tokenizer state carried from the end of one line to the start of the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexState {
    #[default]
    Normal,
    BlockComment(CommentKind),
    MarkupComment,
    JspComment,
    Cdata,
    Instruction,
    /// Inside a start or end tag; `embed` is the language of the tag body
    Tag { embed: Option<Embed> },
    Embedded {
        embed: Embed,
        comment: Option<CommentKind>,
    },
}

/// Close markers of constructs that may span lines
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Closer {
    #[token("*/")]
    Star,
    #[token("|#")]
    Bar,
    #[token("-->")]
    MarkupComment,
    #[token("--%>")]
    JspComment,
    #[token("]]>")]
    Cdata,
    #[token("?>")]
    Instruction,
    #[regex(r"[^*|\-\]?]+", allow_greedy = true)]
    Text,
    #[regex(r"[*|\-\]?]")]
    Punct,
}

/// Length of `text` up to and including the first `close`
pub(crate) fn close_len(text: &str, close: Closer) -> Option<usize> {
    Closer::lexer(text)
        .spanned()
        .find_map(|(token, span)| (token == Ok(close)).then_some(span.end))
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum PlainToken {
    #[regex(r"\s+")]
    Whitespace,
    #[regex(r"\S+", allow_greedy = true)]
    Word,
}

#[derive(Debug, Clone, Copy)]
enum Dialect {
    Code(&'static CodeSyntax),
    Markup(MarkupFlavor),
    Latex,
    Plain,
}

/// Line-oriented tokenizer for one language
#[derive(Debug, Clone, Copy)]
pub struct Lexer {
    dialect: Dialect,
}

impl Lexer {
    /// Tokenizer for a syntax-style id such as `text/java`. Unknown ids get
    /// a plain-text tokenizer that produces no structure.
    pub fn for_language(id: &str) -> Self {
        let dialect = match Language::from_id(id) {
            Some(Language::C) | Some(Language::Cpp) => Dialect::Code(&code::C),
            Some(Language::CSharp) => Dialect::Code(&code::CSHARP),
            Some(Language::Clojure) | Some(Language::Lisp) => Dialect::Code(&code::LISP),
            Some(Language::Css) => Dialect::Code(&code::CSS),
            Some(Language::Groovy) | Some(Language::Java) | Some(Language::Scala) => {
                Dialect::Code(&code::JAVA)
            }
            Some(Language::JavaScript) => Dialect::Code(&code::JAVASCRIPT),
            Some(Language::Json) => Dialect::Code(&code::JSON),
            Some(Language::Nsis) => Dialect::Code(&code::NSIS),
            Some(Language::Perl) => Dialect::Code(&code::PERL),
            Some(Language::Html) => Dialect::Markup(MarkupFlavor::Html),
            Some(Language::Jsp) => Dialect::Markup(MarkupFlavor::Jsp),
            Some(Language::Php) => Dialect::Markup(MarkupFlavor::Php),
            Some(Language::Mxml) | Some(Language::Xml) => Dialect::Markup(MarkupFlavor::Xml),
            Some(Language::Latex) => Dialect::Latex,
            Some(Language::PlainText) | None => Dialect::Plain,
        };
        Self { dialect }
    }

    /// Tokenize one line (without its line terminator) starting at document
    /// offset `base`.
    pub fn tokenize_line(
        &self,
        line: &str,
        base: usize,
        state: LexState,
    ) -> (Vec<Token>, LexState) {
        let mut out = Vec::new();
        let next = match self.dialect {
            Dialect::Code(syntax) => {
                let comment = match state {
                    LexState::BlockComment(kind) => Some(kind),
                    _ => None,
                };
                let ctx = code::CodeContext::new(syntax);
                let scan = code::scan_code(ctx, line, 0, base, comment, &mut out);
                scan.comment.map_or(LexState::Normal, LexState::BlockComment)
            }
            Dialect::Markup(flavor) => markup::scan_markup(flavor, line, base, state, &mut out),
            Dialect::Latex => {
                latex::scan_latex(line, base, &mut out);
                LexState::Normal
            }
            Dialect::Plain => {
                scan_plain(line, base, &mut out);
                LexState::Normal
            }
        };
        (out, next)
    }

    /// Tokenize a whole text, one token list per `\n`-separated line.
    pub fn tokenize(&self, text: &str) -> Vec<Vec<Token>> {
        let mut state = LexState::Normal;
        let mut base = 0;
        let mut lines = Vec::new();
        for raw in text.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let (tokens, next) = self.tokenize_line(line, base, state);
            lines.push(tokens);
            state = next;
            base += raw.len() + 1;
        }
        lines
    }
}

fn scan_plain(line: &str, base: usize, out: &mut Vec<Token>) {
    let mut lex = PlainToken::lexer(line);
    while let Some(token) = lex.next() {
        let token_type = match token {
            Ok(PlainToken::Whitespace) => TokenType::Whitespace,
            Ok(PlainToken::Word) | Err(()) => TokenType::Identifier,
        };
        out.push(Token::new(token_type, base + lex.span().start, lex.slice()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_span_lines() {
        let lines = Lexer::for_language("text/java").tokenize("a {\r\n}");
        assert_eq!(lines.len(), 2);
        assert!(lines[0][2].is_left_curly());
        assert_eq!(lines[0][2].offset, 2);
        assert!(lines[1][0].is_right_curly());
        assert_eq!(lines[1][0].offset, 5);
    }

    #[test]
    fn test_block_comment_state_carries_across_lines() {
        let lines = Lexer::for_language("text/c").tokenize("/* a\nb\nc */ x");
        assert_eq!(lines[1][0].token_type, TokenType::CommentMultiline);
        assert_eq!(lines[1][0].lexeme(), "b");
        assert_eq!(lines[2][0].lexeme(), "c */");
        assert_eq!(lines[2].last().unwrap().lexeme(), "x");
    }

    #[test]
    fn test_unknown_language_is_plain() {
        let lines = Lexer::for_language("text/unknown").tokenize("{ }");
        assert!(lines[0].iter().all(|t| !t.is_left_curly() && !t.is_right_curly()));
    }

    #[test]
    fn test_close_len() {
        assert_eq!(close_len("a */ b */", Closer::Star), Some(4));
        assert_eq!(close_len("a **/", Closer::Star), Some(5));
        assert_eq!(close_len("x --->", Closer::MarkupComment), Some(6));
        assert_eq!(close_len("x --%> y -->", Closer::MarkupComment), Some(12));
        assert_eq!(close_len("é ]]>", Closer::Cdata), Some(6));
        assert_eq!(close_len("no close here", Closer::Bar), None);
    }

    #[test]
    fn test_plain_words() {
        let lines = Lexer::for_language("text/plain").tokenize("ab  cd");
        let kinds: Vec<_> = lines[0].iter().map(|t| (t.token_type, t.lexeme())).collect();
        assert_eq!(
            kinds,
            vec![
                (TokenType::Identifier, "ab"),
                (TokenType::Whitespace, "  "),
                (TokenType::Identifier, "cd"),
            ]
        );
    }

    #[test]
    fn test_empty_line_has_no_tokens() {
        let lines = Lexer::for_language("text/java").tokenize("a\n\nb");
        assert!(lines[1].is_empty());
    }
}
