pub mod ast;
pub mod config;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod prompt;
pub mod repl;
