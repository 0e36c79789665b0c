//! Rope-backed reference document.

use crate::document::{DocumentEvent, Position, PositionService, PositionTracker, TokenSource};
use crate::error::FoldError;
use crate::lexer::{LexState, Lexer};
use crate::token::Token;
use ropey::Rope;

/// An editable document that tokenizes itself with the reference lexer and
/// hands out sticky positions.
///
/// Offsets are byte offsets. Tokens are recomputed after every edit.
#[derive(Debug)]
pub struct TextDocument {
    rope: Rope,
    language: String,
    lexer: Lexer,
    lines: Vec<Vec<Token>>,
    positions: PositionTracker,
}

impl TextDocument {
    pub fn new(text: &str, language: &str) -> Self {
        let mut doc = Self {
            rope: Rope::from_str(text),
            language: language.to_string(),
            lexer: Lexer::for_language(language),
            lines: Vec::new(),
            positions: PositionTracker::new(),
        };
        doc.retokenize();
        doc
    }

    /// Positions the document still tracks, see [`PositionTracker::tracked_count`]
    pub fn tracked_positions(&self) -> usize {
        self.positions.tracked_count()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Syntax-style id of the document, e.g. `text/java`
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: &str) -> DocumentEvent {
        self.language = language.to_string();
        self.lexer = Lexer::for_language(language);
        self.retokenize();
        DocumentEvent::StyleChanged {
            language: self.language.clone(),
        }
    }

    /// Text of `line` without its line terminator
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let text = self.rope.line(line).to_string();
        Some(strip_line_break(&text).to_string())
    }

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<DocumentEvent, FoldError> {
        let char_idx = self.char_index(offset)?;
        self.rope.insert(char_idx, text);
        self.positions.insert(offset, text.len());
        self.retokenize();
        Ok(DocumentEvent::Inserted {
            start: offset,
            end: offset + text.len(),
        })
    }

    /// Remove the bytes in `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<DocumentEvent, FoldError> {
        let end = end.max(start);
        let start_char = self.char_index(start)?;
        let end_char = self.char_index(end)?;
        self.rope.remove(start_char..end_char);
        self.positions.remove(start, end);
        self.retokenize();
        Ok(DocumentEvent::Removed { start, end })
    }

    /// Char index of a byte offset that must fall on a char boundary
    fn char_index(&self, offset: usize) -> Result<usize, FoldError> {
        let len = self.rope.len_bytes();
        if offset > len {
            return Err(FoldError::BadLocation { offset, len });
        }
        let char_idx = self.rope.byte_to_char(offset);
        if self.rope.char_to_byte(char_idx) != offset {
            return Err(FoldError::BadLocation { offset, len });
        }
        Ok(char_idx)
    }

    fn retokenize(&mut self) {
        let mut state = LexState::Normal;
        let mut lines = Vec::with_capacity(self.rope.len_lines());
        for (index, line) in self.rope.lines().enumerate() {
            let text = line.to_string();
            let base = self.rope.line_to_byte(index);
            let (tokens, next) = self.lexer.tokenize_line(strip_line_break(&text), base, state);
            lines.push(tokens);
            state = next;
        }
        self.lines = lines;
    }
}

fn strip_line_break(line: &str) -> &str {
    line.trim_end_matches(|c| {
        matches!(
            c,
            '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
        )
    })
}

impl TokenSource for TextDocument {
    fn tokens_for_line(&self, line: usize) -> Vec<Token> {
        self.lines.get(line).cloned().unwrap_or_default()
    }
}

impl PositionService for TextDocument {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.byte_to_line(offset.min(self.rope.len_bytes()))
    }

    fn line_start_offset(&self, line: usize) -> Option<usize> {
        (line < self.rope.len_lines()).then(|| self.rope.line_to_byte(line))
    }

    fn create_position(&self, offset: usize) -> Result<Position, FoldError> {
        let len = self.rope.len_bytes();
        if offset > len {
            return Err(FoldError::BadLocation { offset, len });
        }
        Ok(self.positions.create(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn test_line_bookkeeping() {
        let doc = TextDocument::new("ab\ncd\n", "text/plain");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.len(), 6);
        assert_eq!(doc.line_of_offset(0), 0);
        assert_eq!(doc.line_of_offset(2), 0);
        assert_eq!(doc.line_of_offset(3), 1);
        assert_eq!(doc.line_of_offset(99), 2);
        assert_eq!(doc.line_start_offset(1), Some(3));
        assert_eq!(doc.line_start_offset(3), None);
        assert_eq!(doc.line_text(1).as_deref(), Some("cd"));
    }

    #[test]
    fn test_tokens_use_document_offsets() {
        let doc = TextDocument::new("a {\r\n  }", "text/java");
        let second = doc.tokens_for_line(1);
        let close = second.iter().find(|t| t.is_right_curly()).unwrap();
        assert_eq!(close.offset, 7);
        assert!(doc.tokens_for_line(5).is_empty());
    }

    #[test]
    fn test_positions_follow_edits() {
        let mut doc = TextDocument::new("x {\n}\n", "text/java");
        let brace = doc.create_position(2).unwrap();
        let event = doc.insert(0, "// hi\n").unwrap();
        assert_eq!(event, DocumentEvent::Inserted { start: 0, end: 6 });
        assert_eq!(brace.offset(), 8);
        assert_eq!(doc.tokens_for_line(0)[0].token_type, TokenType::CommentEol);

        doc.remove(0, 6).unwrap();
        assert_eq!(brace.offset(), 2);
        assert_eq!(doc.text(), "x {\n}\n");
    }

    #[test]
    fn test_bad_locations_are_errors() {
        let mut doc = TextDocument::new("é", "text/plain");
        assert!(matches!(
            doc.create_position(5),
            Err(FoldError::BadLocation { offset: 5, len: 2 })
        ));
        assert!(doc.insert(1, "x").is_err());
        assert!(doc.insert(2, "x").is_ok());
    }

    #[test]
    fn test_language_change_retokenizes() {
        let mut doc = TextDocument::new("{\n}", "text/plain");
        assert!(!doc.tokens_for_line(0).iter().any(Token::is_left_curly));
        let event = doc.set_language("text/c");
        assert_eq!(
            event,
            DocumentEvent::StyleChanged {
                language: "text/c".to_string()
            }
        );
        assert!(doc.tokens_for_line(0).iter().any(Token::is_left_curly));
    }
}
