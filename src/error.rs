use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("input: {0}")]
    Io(#[from] io::Error),
    #[error("input: line is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

impl ShellError {
    /// Status recorded for a line that failed before or during execution.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Parse(_) | ShellError::Config(_) => 2,
            ShellError::Exec(_) | ShellError::Io(_) | ShellError::Encoding(_) => 1,
        }
    }
}
