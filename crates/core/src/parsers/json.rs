use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Object,
    Array,
}

/// Folds JSON objects and arrays.
///
/// A closer only ends the innermost block when the kinds agree, so `]` never
/// closes an object.
#[derive(Debug, Clone, Default)]
pub struct JsonFoldParser;

impl JsonFoldParser {
    pub fn new() -> Self {
        Self
    }
}

impl FoldParser for JsonFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut blocks: Vec<Block> = Vec::new();

        for line in 0..source.line_count() {
            let tokens = source.tokens_for_line(line);
            for token in tokens.iter().take_while(|t| t.is_paintable()) {
                if token.token_type != TokenType::Separator {
                    continue;
                }
                let (opens, block) = match token.lexeme() {
                    "{" => (true, Block::Object),
                    "[" => (true, Block::Array),
                    "}" => (false, Block::Object),
                    "]" => (false, Block::Array),
                    _ => continue,
                };
                if opens {
                    builder.open(FoldType::Code, token.offset);
                    blocks.push(block);
                } else if blocks.last() == Some(&block) {
                    blocks.pop();
                    builder.close(token.offset)?;
                }
            }
        }

        builder.finish()
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
