//! Classified lexical units consumed by the fold parsers.

use serde::Serialize;

/// Classification of a token, as produced by a syntax highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Marks the end of a line's token list; never painted
    Null,
    Whitespace,
    Identifier,
    ReservedWord,
    Function,
    Variable,
    Operator,
    Separator,
    Preprocessor,
    LiteralString,
    LiteralChar,
    LiteralNumber,
    CommentEol,
    CommentMultiline,
    CommentDocumentation,
    MarkupTagDelimiter,
    MarkupTagName,
    MarkupTagAttribute,
    MarkupTagAttributeValue,
    MarkupComment,
    MarkupProcessingInstruction,
    MarkupCdata,
    MarkupDtd,
    MarkupEntityReference,
}

/// A classified lexical unit on a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Byte offset of the first character in the document
    pub offset: usize,
    pub token_type: TokenType,
    pub text: String,
}

impl Token {
    pub fn new(token_type: TokenType, offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            token_type,
            text: text.into(),
        }
    }

    pub fn lexeme(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Offset one past the token's last byte
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is_paintable(&self) -> bool {
        self.token_type != TokenType::Null
    }

    pub fn is_whitespace(&self) -> bool {
        self.token_type == TokenType::Whitespace
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::CommentEol
                | TokenType::CommentMultiline
                | TokenType::CommentDocumentation
                | TokenType::MarkupComment
        )
    }

    pub fn is_single_char(&self, c: char) -> bool {
        let mut chars = self.text.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }

    pub fn is_single_char_of(&self, token_type: TokenType, c: char) -> bool {
        self.token_type == token_type && self.is_single_char(c)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text.starts_with(prefix)
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.text.ends_with(suffix)
    }

    /// Whether this token has the given type and exact lexeme
    pub fn is(&self, token_type: TokenType, lexeme: &str) -> bool {
        self.token_type == token_type && self.text == lexeme
    }

    pub fn is_left_curly(&self) -> bool {
        self.is_single_char_of(TokenType::Separator, '{')
    }

    pub fn is_right_curly(&self) -> bool {
        self.is_single_char_of(TokenType::Separator, '}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexeme_helpers() {
        let t = Token::new(TokenType::CommentMultiline, 10, "/* done */");
        assert!(t.is_comment());
        assert!(t.starts_with("/*"));
        assert!(t.ends_with("*/"));
        assert_eq!(t.end_offset(), 20);
        assert!(!t.is_single_char('/'));
    }

    #[test]
    fn test_curly_requires_separator() {
        let sep = Token::new(TokenType::Separator, 0, "{");
        let op = Token::new(TokenType::Operator, 0, "{");
        assert!(sep.is_left_curly());
        assert!(!op.is_left_curly());
        assert!(Token::new(TokenType::Separator, 3, "}").is_right_curly());
    }

    #[test]
    fn test_null_is_not_paintable() {
        assert!(!Token::new(TokenType::Null, 0, "").is_paintable());
        assert!(Token::new(TokenType::Whitespace, 0, " ").is_paintable());
    }
}
