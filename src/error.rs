//! Centralized error types for mail2blog.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mail2blog library.
#[derive(Error, Debug)]
pub enum Mail2BlogError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Connecting to or talking to the mailbox failed.
    #[error("Mailbox error: {0}")]
    Mailbox(String),

    /// The message has no Message-ID header, so it cannot be deduplicated.
    #[error("Message has no Message-ID header")]
    MissingMessageId,

    /// An attachment payload could not be decoded as an image.
    #[error("Not a decodable image: {0}")]
    ImageDecode(String),

    /// Re-encoding a transcoded image failed.
    #[error("Image encoding error: {0}")]
    ImageEncode(String),

    /// The delivery ledger exists but cannot be parsed.
    #[error("Corrupt delivery ledger '{path}': {reason}")]
    InvalidLedger { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, Mail2BlogError>`.
pub type Result<T> = std::result::Result<T, Mail2BlogError>;

impl Mail2BlogError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<imap::Error> for Mail2BlogError {
    fn from(source: imap::Error) -> Self {
        Self::Mailbox(source.to_string())
    }
}

impl From<native_tls::Error> for Mail2BlogError {
    fn from(source: native_tls::Error) -> Self {
        Self::Mailbox(source.to_string())
    }
}
