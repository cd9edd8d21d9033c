use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub log_level: LevelFilter,
    pub notify_jobs: bool,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub const ENV_VAR: &'static str = "MINISH_CONFIG";
    pub const RC_FILE: &'static str = ".minishrc";

    pub fn default_config() -> Config {
        Config {
            prompt: "$ ".to_string(),
            log_level: LevelFilter::Warn,
            notify_jobs: true,
        }
    }

    /// Picks the config file: an explicit path, then `$MINISH_CONFIG`,
    /// then `~/.minishrc` if it exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = env::var_os(Self::ENV_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        let rc = PathBuf::from(env::var_os("HOME")?).join(Self::RC_FILE);
        rc.is_file().then_some(rc)
    }

    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match Self::locate(explicit) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default_config()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line_no = lineno + 1;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line_no,
                    message: format!("no '=' found: {}", line),
                });
            };

            // The prompt keeps its whitespace so "prompt=$ " ends in a space.
            match key.trim() {
                "prompt" => config.prompt = value.to_string(),
                "log_level" => {
                    config.log_level =
                        value.trim().parse().map_err(|_| ConfigError::Parse {
                            line: line_no,
                            message: format!("invalid log level: {}", value.trim()),
                        })?;
                }
                "notify_jobs" => {
                    config.notify_jobs = parse_bool(value.trim()).ok_or_else(|| {
                        ConfigError::Parse {
                            line: line_no,
                            message: format!("expected true or false: {}", value.trim()),
                        }
                    })?;
                }
                other => {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        message: format!("unknown key: {}", other),
                    });
                }
            }
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
