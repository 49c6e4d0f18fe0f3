use std::fmt;
use std::path::PathBuf;

/// What the partial-sum store was doing to a record file when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Stat,
    Create,
    Open,
    Read,
    Write,
    Truncate,
    Sync,
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            RecordAction::Stat => "get file stat",
            RecordAction::Create => "create temporary file",
            RecordAction::Open => "open temporary file",
            RecordAction::Read => "read from file",
            RecordAction::Write => "write to file",
            RecordAction::Truncate => "truncate file",
            RecordAction::Sync => "close file",
        };
        f.write_str(verb)
    }
}

#[derive(Debug)]
pub enum CountError {
    Config(String),
    Input { path: PathBuf, source: std::io::Error },
    Scratch { path: PathBuf, source: std::io::Error },
    Record { token: String, action: RecordAction, source: std::io::Error },
    Parse { token: String, detail: String },
    Collision { token: String, stored: String },
    Overflow { token: String },
    Merge { path: PathBuf, source: std::io::Error },
    Output { path: PathBuf, source: std::io::Error },
    Other(String),
}

impl CountError {
    pub fn record(token: &[u8], action: RecordAction, source: std::io::Error) -> Self {
        CountError::Record { token: display_token(token), action, source }
    }

    pub fn parse(token: &[u8], detail: impl Into<String>) -> Self {
        CountError::Parse { token: display_token(token), detail: detail.into() }
    }
}

/// Tokens are raw bytes; error messages show them lossily.
pub fn display_token(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

impl fmt::Display for CountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountError::Config(e) => write!(f, "Configuration error: {}", e),
            CountError::Input { path, source } => {
                write!(f, "could not read input {}: {}", path.display(), source)
            }
            CountError::Scratch { path, source } => {
                write!(f, "could not create directory {}: {}", path.display(), source)
            }
            CountError::Record { token, action, source } => {
                write!(f, "could not {} for request {:?}: {}", action, token, source)
            }
            CountError::Parse { token, detail } => {
                write!(f, "could not parse value for request {:?}: {}", token, detail)
            }
            CountError::Collision { token, stored } => write!(
                f,
                "digest collision: request {:?} maps to the record of {:?}",
                token, stored
            ),
            CountError::Overflow { token } => {
                write!(f, "count overflow for request {:?}", token)
            }
            CountError::Merge { path, source } => {
                write!(f, "could not read {}: {}", path.display(), source)
            }
            CountError::Output { path, source } => {
                write!(f, "could not write output {}: {}", path.display(), source)
            }
            CountError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CountError::Input { source, .. }
            | CountError::Scratch { source, .. }
            | CountError::Record { source, .. }
            | CountError::Merge { source, .. }
            | CountError::Output { source, .. } => Some(source),
            _ => None,
        }
    }
}
