//! Shared CLI utilities for reading input and reporting failures

use moonlet_core::{LuaError, RuntimeConfig};
use std::fs;
use std::io::{self, Read};
use std::process;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed RON in '{path}': {source}")]
    Ron {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("{0}")]
    Lua(#[from] LuaError),
    #[error("invalid option '{0}' (expected letters from \"flnStuLr\")")]
    InvalidOption(String),
    #[error("level {level} is outside the stack (depth {depth})")]
    LevelOutOfRange { level: usize, depth: usize },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Read source text from a file or stdin.
/// If `file` is "-", reads from stdin. Otherwise reads from the specified file.
pub fn read_source(file: &str) -> Result<String, CliError> {
    let result = if file == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source).map(|_| source)
    } else {
        fs::read_to_string(file)
    };
    result.map_err(|source| CliError::Io {
        path: file.to_string(),
        source,
    })
}

/// Parse a RON document, attributing errors to `path`
pub fn parse_ron<T: serde::de::DeserializeOwned>(text: &str, path: &str) -> Result<T, CliError> {
    ron::from_str(text).map_err(|source| CliError::Ron {
        path: path.to_string(),
        source,
    })
}

/// Runtime configuration from `--config`, or the defaults
pub fn load_config(path: Option<&str>) -> Result<RuntimeConfig, CliError> {
    match path {
        Some(path) => parse_ron(&read_source(path)?, path),
        None => Ok(RuntimeConfig::default()),
    }
}

/// Print an error to stderr and exit with status 1
pub fn exit_with(err: CliError) -> ! {
    tracing::debug!(error = ?err, "command failed");
    eprintln!("Error: {err}");
    process::exit(1);
}
