//! Error types for the protocol engine.

use std::path::PathBuf;

/// A user command line for a known verb that is missing arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{command}: missing <{argument}>; usage: {usage}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
        usage: &'static str,
    },
}

/// Failure to decode a game event from a MESSAGE body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("event body is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("event time is not an integer: {0:?}")]
    InvalidTime(String),
}

/// Failure to load a JSON events file for `report`.
#[derive(Debug, thiserror::Error)]
pub enum EventsFileError {
    #[error("failed to read events file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed events file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Errors surfaced to the caller of the protocol engine.
///
/// Malformed wire input, unknown receipts and undecodable MESSAGE bodies are
/// never errors; they are absorbed by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    EventsFile(#[from] EventsFileError),

    #[error("failed to write summary to {path}")]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("session is closed")]
    SessionClosed,
}
