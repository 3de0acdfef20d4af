//! Error types returned by message composition and delivery.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::transport::ClientError;

/// Errors that can occur while building or sending a [`Message`](crate::Message).
#[derive(Error, Debug)]
pub enum Error {
    /// An address list could not be parsed.
    ///
    /// The message the address was destined for is left unmodified.
    #[error("Malformed address for {field}: '{input}' ({reason})")]
    MalformedAddress {
        field: &'static str,
        input: String,
        reason: String,
    },

    /// `add_header` was called with a key that is already present.
    #[error("Header '{key}' is already set")]
    DuplicateHeader { key: String },

    /// The message has no sender address.
    #[error("Message has no sender")]
    MissingSender,

    /// The message has no `To` recipients.
    #[error("Message has no recipients")]
    MissingRecipient,

    /// An attached file no longer exists.
    #[error("Attachment not found: {}", path.display())]
    MissingAttachment { path: PathBuf },

    /// An attached file exists but could not be read.
    #[error("Failed to read attachment {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The relay refused or could not perform authentication.
    #[error("Authentication failed: {0}")]
    Auth(#[source] ClientError),

    /// Connecting to or talking with the relay failed.
    #[error("Transport error: {0}")]
    Transport(#[source] ClientError),

    /// A profile configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the error happened before any network I/O.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        !matches!(self, Self::Auth(_) | Self::Transport(_))
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        if err.is_auth_error() {
            Self::Auth(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// Specialized `Result` type for composing and sending mail.
pub type Result<T> = std::result::Result<T, Error>;
