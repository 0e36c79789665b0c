use crate::token::{Token, TokenType};
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum LatexToken {
    #[regex(r"%[^\n]*", allow_greedy = true)]
    Comment,

    #[regex(r"[ \t\x0B\x0C\r]+")]
    Whitespace,

    #[regex(r"\\[a-zA-Z]+")]
    Command,

    /// Control symbol such as `\%` or `\\`
    #[regex(r"\\[^a-zA-Z]")]
    Symbol,

    #[regex(r"[{}\[\]]")]
    Delimiter,

    #[regex(r"[^\\%{}\[\] \t\x0B\x0C\r]+", allow_greedy = true)]
    Text,
}

/// Progress through `\begin{name}` / `\end{name}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Environment {
    Outside,
    Command,
    Brace,
}

pub(crate) fn scan_latex(line: &str, base: usize, out: &mut Vec<Token>) {
    let mut lex = LatexToken::lexer(line);
    let mut env = Environment::Outside;

    while let Some(token) = lex.next() {
        let text = lex.slice();
        let (token_type, next) = match token {
            Ok(LatexToken::Command) if text == "\\begin" || text == "\\end" => {
                (TokenType::ReservedWord, Environment::Command)
            }
            Ok(LatexToken::Delimiter) if env == Environment::Command && text == "{" => {
                (TokenType::Separator, Environment::Brace)
            }
            Ok(LatexToken::Text) if env == Environment::Brace => {
                (TokenType::ReservedWord, Environment::Outside)
            }
            Ok(LatexToken::Command) => (TokenType::Function, Environment::Outside),
            Ok(LatexToken::Comment) => (TokenType::CommentEol, Environment::Outside),
            Ok(LatexToken::Whitespace) => (TokenType::Whitespace, Environment::Outside),
            Ok(LatexToken::Delimiter) => (TokenType::Separator, Environment::Outside),
            Ok(LatexToken::Symbol) | Ok(LatexToken::Text) | Err(()) => {
                (TokenType::Identifier, Environment::Outside)
            }
        };
        out.push(Token::new(token_type, base + lex.span().start, text));
        env = next;
    }
}
