use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Operation;

/// Category of a backend failure as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandErrorKind {
    Io,
    Utf8,
    InvalidPath,
    UnknownEncoderFormat,
    NoDefaultTrackFound,
    NoAudioData,
    PlaybackError,
    Decode,
    /// Transport failure between front-end and backend.
    Disconnected,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for CommandErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommandErrorKind::Io => "io",
            CommandErrorKind::Utf8 => "utf8",
            CommandErrorKind::InvalidPath => "invalidPath",
            CommandErrorKind::UnknownEncoderFormat => "unknownEncoderFormat",
            CommandErrorKind::NoDefaultTrackFound => "noDefaultTrackFound",
            CommandErrorKind::NoAudioData => "noAudioData",
            CommandErrorKind::PlaybackError => "playbackError",
            CommandErrorKind::Decode => "decode",
            CommandErrorKind::Disconnected => "disconnected",
            CommandErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed backend command.  Wire shape: `{"kind": "io", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct CommandError {
    pub kind: CommandErrorKind,
    #[serde(default)]
    pub message: String,
}

impl CommandError {
    pub fn new(kind: CommandErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(CommandErrorKind::Disconnected, message)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        Self::new(CommandErrorKind::Io, e.to_string())
    }
}

impl From<std::str::Utf8Error> for CommandError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::new(CommandErrorKind::Utf8, e.to_string())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(CommandErrorKind::Decode, e.to_string())
    }
}

/// Everything that can go wrong at the front-end/backend boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to decode path as utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// Event from a run that has been superseded or cancelled.  Never shown
    /// to the user; the event is dropped.
    #[error("stale {operation} event from run {run} (current: {current:?})")]
    StaleEvent {
        operation: Operation,
        run: u64,
        current: Option<u64>,
    },

    #[error("channel closed")]
    ChannelClosed,
}
