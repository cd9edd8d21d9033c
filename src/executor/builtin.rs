pub mod commands;
pub mod manager;

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("cd: {path}: {source}")]
    ChangeDirectoryFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{name}: too many arguments")]
    TooManyArguments { name: &'static str },
    #[error("{name}: {source}")]
    Output {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}
