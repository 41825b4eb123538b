//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::embed::EncodeError;

/// Everything that can go wrong while embedding, extracting or converting.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad arguments or missing inputs.
    #[error("{0}")]
    Config(String),

    #[error("can't {action} `{}`: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A child process could not be started or exited unsuccessfully.
    #[error("command `{command}` {reason}")]
    Process { command: String, reason: String },

    #[error("embedded resource not found: {0}")]
    UnknownResource(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("invalid options file `{}`: {source}", .path.display())]
    Options {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
