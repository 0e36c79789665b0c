use super::{close_len, Closer, CommentKind, Embed};
use crate::token::{Token, TokenType};
use logos::Logos;

/// Token grammar a code syntax is lexed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Braces,
    Lisp,
}

/// Lexical rules of a brace/paren based programming language
#[derive(Debug)]
pub(crate) struct CodeSyntax {
    pub family: Family,
    pub line_comments: &'static [&'static str],
    /// `/* */` comments
    pub block_comment: bool,
    /// `/** */` comments are documentation
    pub doc_comment: bool,
    pub keywords: &'static [&'static str],
    pub separators: &'static str,
    pub variable_sigils: &'static str,
    /// `#` at the start of a line begins a preprocessor directive
    pub preprocessor: bool,
}

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "class", "const", "continue", "default", "delete", "do",
    "double", "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long",
    "namespace", "new", "private", "protected", "public", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "template", "this", "typedef", "union",
    "unsigned", "using", "virtual", "void", "volatile", "while",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "def", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "object", "package", "private", "protected", "public", "return", "short",
    "static", "super", "switch", "synchronized", "this", "throw", "throws", "trait", "try",
    "val", "var", "void", "volatile", "while",
];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "base", "bool", "break", "case", "catch", "class", "const", "continue",
    "default", "do", "else", "enum", "finally", "for", "foreach", "if", "in", "int",
    "interface", "namespace", "new", "override", "private", "protected", "public", "return",
    "static", "string", "struct", "switch", "this", "throw", "try", "using", "var", "virtual",
    "void", "while",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "return", "switch", "this", "throw", "try",
    "typeof", "var", "void", "while", "yield",
];

const PERL_KEYWORDS: &[&str] = &[
    "else", "elsif", "for", "foreach", "if", "last", "local", "my", "next", "our", "package",
    "return", "sub", "unless", "until", "use", "while",
];

const PHP_KEYWORDS: &[&str] = &[
    "array", "as", "break", "case", "class", "const", "continue", "default", "echo", "else",
    "elseif", "extends", "for", "foreach", "function", "if", "include", "namespace", "new",
    "private", "protected", "public", "require", "return", "static", "switch", "use", "while",
];

const NSIS_KEYWORDS: &[&str] = &[
    "Call", "Delete", "File", "Function", "FunctionEnd", "Goto", "InstallDir", "MessageBox",
    "Name", "OutFile", "Page", "PageEx", "PageExEnd", "Pop", "Push", "Quit", "Return",
    "RMDir", "Section", "SectionEnd", "SectionGroup", "SectionGroupEnd", "SetOutPath",
    "StrCmp", "UninstPage", "WriteRegStr", "WriteUninstaller",
];

pub(crate) const C: CodeSyntax = CodeSyntax {
    family: Family::Braces,
    line_comments: &["//"],
    block_comment: true,
    doc_comment: true,
    keywords: C_KEYWORDS,
    separators: "{}()[];,",
    variable_sigils: "",
    preprocessor: true,
};

pub(crate) const CSHARP: CodeSyntax = CodeSyntax {
    keywords: CSHARP_KEYWORDS,
    ..C
};

pub(crate) const JAVA: CodeSyntax = CodeSyntax {
    keywords: JAVA_KEYWORDS,
    preprocessor: false,
    ..C
};

pub(crate) const JAVASCRIPT: CodeSyntax = CodeSyntax {
    keywords: JS_KEYWORDS,
    preprocessor: false,
    ..C
};

pub(crate) const CSS: CodeSyntax = CodeSyntax {
    family: Family::Braces,
    line_comments: &[],
    block_comment: true,
    doc_comment: false,
    keywords: &[],
    separators: "{}()[];:,",
    variable_sigils: "",
    preprocessor: false,
};

pub(crate) const PERL: CodeSyntax = CodeSyntax {
    family: Family::Braces,
    line_comments: &["#"],
    block_comment: false,
    doc_comment: false,
    keywords: PERL_KEYWORDS,
    separators: "{}()[];,",
    variable_sigils: "$@",
    preprocessor: false,
};

pub(crate) const PHP: CodeSyntax = CodeSyntax {
    line_comments: &["//", "#"],
    keywords: PHP_KEYWORDS,
    variable_sigils: "$",
    preprocessor: false,
    ..C
};

pub(crate) const JSON: CodeSyntax = CodeSyntax {
    family: Family::Braces,
    line_comments: &["//"],
    block_comment: true,
    doc_comment: false,
    keywords: &["true", "false", "null"],
    separators: "{}[]:,",
    variable_sigils: "",
    preprocessor: false,
};

pub(crate) const LISP: CodeSyntax = CodeSyntax {
    family: Family::Lisp,
    line_comments: &[";"],
    block_comment: false,
    doc_comment: false,
    keywords: &["defun", "defmacro", "defn", "def", "lambda", "let", "if", "cond", "ns"],
    separators: "()[]{}",
    variable_sigils: "",
    preprocessor: false,
};

pub(crate) const NSIS: CodeSyntax = CodeSyntax {
    family: Family::Braces,
    line_comments: &[";", "#"],
    block_comment: true,
    doc_comment: false,
    keywords: NSIS_KEYWORDS,
    separators: "{}()[],",
    variable_sigils: "$",
    preprocessor: false,
};

/// What the lexer needs to know besides the text
#[derive(Debug, Clone, Copy)]
pub(crate) struct CodeContext {
    pub syntax: &'static CodeSyntax,
    /// Set when the code is embedded in markup and ends at the host's marker
    pub embed: Option<Embed>,
}

impl CodeContext {
    pub fn new(syntax: &'static CodeSyntax) -> Self {
        Self {
            syntax,
            embed: None,
        }
    }

    pub fn embedded(syntax: &'static CodeSyntax, embed: Embed) -> Self {
        Self {
            syntax,
            embed: Some(embed),
        }
    }
}

/// How a `//`, `#` or `;` was read in the current syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerKind {
    Comment,
    Preprocessor,
    Plain,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(extras = CodeContext)]
enum BraceToken {
    #[regex(r"[ \t\x0B\x0C\r]+")]
    Whitespace,

    #[token("//", |lex| marker(lex, "//"))]
    #[token("#", |lex| marker(lex, "#"))]
    #[token(";", |lex| marker(lex, ";"))]
    Marker(MarkerKind),

    /// `true` when the comment closes on this line
    #[token("/*", block_comment)]
    BlockComment(bool),

    #[regex(r#""([^"\\]|\\.)*"?"#, allow_greedy = true)]
    #[regex(r"'([^'\\]|\\.)*'?", allow_greedy = true)]
    #[regex(r"`([^`\\]|\\.)*`?", allow_greedy = true)]
    Str,

    #[regex(r"[0-9][a-zA-Z0-9_.]*")]
    Number,

    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*", priority = 3)]
    Word,

    #[regex(r"[$@][a-zA-Z0-9_]*", priority = 3)]
    Sigil,

    #[token("?>", |_| Embed::Php)]
    #[token("%>", |_| Embed::Jsp)]
    #[regex("</[sS][cC][rR][iI][pP][tT]", |_| Embed::Script)]
    #[regex("</[sS][tT][yY][lL][eE]", |_| Embed::Style)]
    EmbedClose(Embed),

    #[regex(r"[!-/:-@\[-`{-~]", priority = 1)]
    Punct,
}

fn marker(lex: &mut logos::Lexer<BraceToken>, marker: &str) -> MarkerKind {
    let ctx = lex.extras;
    if ctx.syntax.line_comments.contains(&marker) {
        // The host's close marker still ends a line comment
        let rest = lex.remainder();
        let end = ctx
            .embed
            .and_then(|embed| rest.to_ascii_lowercase().find(embed.close_marker()))
            .unwrap_or(rest.len());
        lex.bump(end);
        MarkerKind::Comment
    } else if marker == "#"
        && ctx.syntax.preprocessor
        && lex.source()[..lex.span().start].trim().is_empty()
    {
        lex.bump(lex.remainder().len());
        MarkerKind::Preprocessor
    } else {
        MarkerKind::Plain
    }
}

fn block_comment(lex: &mut logos::Lexer<BraceToken>) -> Option<bool> {
    if !lex.extras.syntax.block_comment {
        return None;
    }
    let rest = lex.remainder();
    match close_len(rest, Closer::Star) {
        Some(len) => {
            lex.bump(len);
            Some(true)
        }
        None => {
            lex.bump(rest.len());
            Some(false)
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum LispToken {
    #[regex(r"[ \t\x0B\x0C\r]+")]
    Whitespace,

    #[regex(r";[^\n]*", allow_greedy = true)]
    LineComment,

    #[token("#|", lisp_block_comment)]
    BlockComment(bool),

    #[regex(r#""([^"\\]|\\.)*"?"#, allow_greedy = true)]
    Str,

    #[regex(r"[()\[\]{}]")]
    Delimiter,

    #[regex(r#"[^ \t\x0B\x0C\r\n()\[\]{};"|]+"#, allow_greedy = true)]
    Atom,
}

fn lisp_block_comment(lex: &mut logos::Lexer<LispToken>) -> bool {
    let rest = lex.remainder();
    match close_len(rest, Closer::Bar) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => {
            lex.bump(rest.len());
            false
        }
    }
}

/// Where a code scan stopped and which comment, if any, is still open
pub(crate) struct CodeScan {
    pub stop: usize,
    pub comment: Option<CommentKind>,
}

impl CodeScan {
    fn finished(line: &str, comment: Option<CommentKind>) -> Self {
        Self {
            stop: line.len(),
            comment,
        }
    }
}

impl CodeSyntax {
    fn closer(&self) -> Closer {
        match self.family {
            Family::Braces => Closer::Star,
            Family::Lisp => Closer::Bar,
        }
    }

    fn word_type(&self, word: &str) -> TokenType {
        if self.keywords.contains(&word) {
            TokenType::ReservedWord
        } else {
            TokenType::Identifier
        }
    }

    fn punct_type(&self, text: &str) -> TokenType {
        if text.len() == 1 && self.separators.contains(text) {
            TokenType::Separator
        } else {
            TokenType::Operator
        }
    }

    fn sigil_type(&self, text: &str) -> TokenType {
        match text.chars().next() {
            _ if text.len() == 1 => TokenType::Operator,
            Some(sigil) if self.variable_sigils.contains(sigil) => TokenType::Variable,
            _ => TokenType::Identifier,
        }
    }

    fn comment_kind(&self, text: &str) -> CommentKind {
        if self.doc_comment && text.starts_with("/**") && !text.starts_with("/**/") {
            CommentKind::Doc
        } else {
            CommentKind::Block
        }
    }
}

fn comment_type(kind: CommentKind) -> TokenType {
    match kind {
        CommentKind::Block => TokenType::CommentMultiline,
        CommentKind::Doc => TokenType::CommentDocumentation,
    }
}

/// Tokenize `line[start..]` as code, continuing a block comment left open by
/// the previous line.
///
/// Embedded code stops right before the host's close marker; `stop` is where
/// the host takes over.
pub(crate) fn scan_code(
    ctx: CodeContext,
    line: &str,
    start: usize,
    base: usize,
    comment: Option<CommentKind>,
    out: &mut Vec<Token>,
) -> CodeScan {
    let mut i = start;

    if let Some(kind) = comment {
        let rest = &line[i..];
        match close_len(rest, ctx.syntax.closer()) {
            Some(len) => {
                out.push(Token::new(comment_type(kind), base + i, &rest[..len]));
                i += len;
            }
            None => {
                if !rest.is_empty() {
                    out.push(Token::new(comment_type(kind), base + i, rest));
                }
                return CodeScan::finished(line, Some(kind));
            }
        }
    }

    match ctx.syntax.family {
        Family::Braces => scan_braces(ctx, line, i, base, out),
        Family::Lisp => scan_lisp(ctx.syntax, line, i, base, out),
    }
}

fn scan_braces(
    ctx: CodeContext,
    line: &str,
    start: usize,
    base: usize,
    out: &mut Vec<Token>,
) -> CodeScan {
    let syntax = ctx.syntax;
    let mut lex = BraceToken::lexer_with_extras(line, ctx);
    lex.bump(start);

    while let Some(token) = lex.next() {
        let span = lex.span();
        let text = lex.slice();
        let token_type = match token {
            Ok(BraceToken::EmbedClose(embed)) if ctx.embed == Some(embed) => {
                return CodeScan {
                    stop: span.start,
                    comment: None,
                };
            }
            Ok(BraceToken::BlockComment(closed)) => {
                let kind = syntax.comment_kind(text);
                out.push(Token::new(comment_type(kind), base + span.start, text));
                if !closed {
                    return CodeScan::finished(line, Some(kind));
                }
                continue;
            }
            Ok(BraceToken::Whitespace) => TokenType::Whitespace,
            Ok(BraceToken::Marker(MarkerKind::Comment)) => TokenType::CommentEol,
            Ok(BraceToken::Marker(MarkerKind::Preprocessor)) => TokenType::Preprocessor,
            Ok(BraceToken::Marker(MarkerKind::Plain)) | Ok(BraceToken::Punct) => {
                syntax.punct_type(text)
            }
            Ok(BraceToken::Str) => TokenType::LiteralString,
            Ok(BraceToken::Number) => TokenType::LiteralNumber,
            Ok(BraceToken::Word) => syntax.word_type(text),
            Ok(BraceToken::Sigil) => syntax.sigil_type(text),
            Ok(BraceToken::EmbedClose(_)) | Err(()) => TokenType::Operator,
        };
        out.push(Token::new(token_type, base + span.start, text));
    }

    CodeScan::finished(line, None)
}

fn scan_lisp(
    syntax: &CodeSyntax,
    line: &str,
    start: usize,
    base: usize,
    out: &mut Vec<Token>,
) -> CodeScan {
    let mut lex = LispToken::lexer(line);
    lex.bump(start);

    while let Some(token) = lex.next() {
        let span = lex.span();
        let text = lex.slice();
        let token_type = match token {
            Ok(LispToken::BlockComment(closed)) => {
                out.push(Token::new(TokenType::CommentMultiline, base + span.start, text));
                if !closed {
                    return CodeScan::finished(line, Some(CommentKind::Block));
                }
                continue;
            }
            Ok(LispToken::Whitespace) => TokenType::Whitespace,
            Ok(LispToken::LineComment) => TokenType::CommentEol,
            Ok(LispToken::Str) => TokenType::LiteralString,
            Ok(LispToken::Delimiter) => TokenType::Separator,
            Ok(LispToken::Atom) if text.starts_with(|c: char| c.is_ascii_digit()) => {
                TokenType::LiteralNumber
            }
            Ok(LispToken::Atom) => syntax.word_type(text),
            Err(()) => TokenType::Operator,
        };
        out.push(Token::new(token_type, base + span.start, text));
    }

    CodeScan::finished(line, None)
}
