pub mod default;

use log::debug;
use thiserror::Error;

use crate::ast::AstNode;
use crate::lexer::{self, LexError, Lexer, ValidationError};
use default::DefaultParser;

pub trait Parser {
    fn parse(&mut self) -> Result<AstNode, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected command but found '{found}' at position {pos}")]
    ExpectedCommand { found: String, pos: usize },
    #[error("expected filename after '{operator}' at position {pos}")]
    ExpectedFilename { operator: &'static str, pos: usize },
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("empty expression")]
    EmptyExpression,
    #[error("unexpected token '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },
}

impl From<ValidationError> for ParseError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::UnclosedQuote { quote, pos } => {
                ParseError::Lex(LexError::UnterminatedQuote { quote, pos })
            }
            ValidationError::ImbalancedParens { pos } => ParseError::UnmatchedParen { pos },
        }
    }
}

/// Validates, tokenizes and parses one command line.
pub fn parse_line(line: &str) -> Result<AstNode, ParseError> {
    lexer::validate(line)?;
    let tokens = Lexer::new(line).tokenize_all()?;
    let ast = DefaultParser::new(&tokens).parse()?;
    debug!("parsed {:?} into {:?}", line, ast);
    Ok(ast)
}
