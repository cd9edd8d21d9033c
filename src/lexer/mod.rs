mod lexer;
mod token;
pub mod validator;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};
pub use validator::{ValidationError, validate};
