use super::builder::FoldBuilder;
use super::FoldParser;
use crate::document::FoldSource;
use crate::error::FoldError;
use crate::forest::FoldForest;
use crate::models::FoldType;
use crate::token::{Token, TokenType};

const BEGIN: &str = "\\begin";
const END: &str = "\\end";

/// Folds `\begin{env}` ... `\end{env}` environments.
#[derive(Debug, Clone, Default)]
pub struct LatexFoldParser;

impl LatexFoldParser {
    pub fn new() -> Self {
        Self
    }
}

/// Environment name in `{name}` right after the token at `index`
fn environment_name(tokens: &[Token], index: usize) -> Option<&str> {
    let brace = tokens.get(index + 1)?;
    let name = tokens.get(index + 2)?;
    (brace.is_left_curly() && name.token_type == TokenType::ReservedWord).then(|| name.lexeme())
}

impl FoldParser for LatexFoldParser {
    fn parse(&self, source: &dyn FoldSource) -> Result<FoldForest, FoldError> {
        let mut builder = FoldBuilder::new(source);
        let mut environments: Vec<String> = Vec::new();

        for line in 0..source.line_count() {
            let tokens = source.tokens_for_line(line);
            let mut i = 0;
            while i < tokens.len() && tokens[i].is_paintable() {
                let token = &tokens[i];
                if token.is(TokenType::ReservedWord, BEGIN) {
                    if let Some(name) = environment_name(&tokens, i) {
                        builder.open(FoldType::Code, token.offset);
                        environments.push(name.to_string());
                        i += 2;
                    }
                } else if token.is(TokenType::ReservedWord, END) && builder.has_open_fold() {
                    let name = environment_name(&tokens, i);
                    if name.is_some() && name == environments.last().map(String::as_str) {
                        environments.pop();
                        builder.close(token.offset)?;
                        i += 2;
                    }
                }
                i += 1;
            }
        }

        builder.finish()
    }

    fn name(&self) -> &'static str {
        "latex"
    }
}
