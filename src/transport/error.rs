//! Error types for the SMTP transport.

use std::io;

use thiserror::Error;

/// Errors that can occur while talking to the relay.
#[derive(Error, Debug)]
pub enum ClientError {
    /// IO error occurred during network operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse an SMTP response from the server.
    #[error("Failed to parse SMTP response: {0}")]
    ParseError(String),

    /// The server returned an unexpected SMTP status code.
    #[error("Unexpected SMTP status code: {code} - {message}")]
    UnexpectedResponse { code: u16, message: String },

    /// The server returned an error status code (4xx or 5xx).
    #[error("SMTP error: {code} - {message}")]
    SmtpError { code: u16, message: String },

    /// TLS/SSL error occurred.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// TLS is required but the server does not offer STARTTLS.
    #[error("Server does not support STARTTLS")]
    TlsUnavailable,

    /// Connection was closed unexpectedly.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// An operation did not complete within its configured timeout.
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// The blocking transport was driven from inside an async runtime.
    #[error("Invalid calling context: {0}")]
    InvalidContext(&'static str),

    /// An envelope address contained a CR or LF.
    #[error("Envelope address contains CR or LF: {0:?}")]
    InvalidLine(String),

    /// The server rejected the credentials.
    #[error("AUTH {mechanism} rejected: {code} - {message}")]
    AuthRejected {
        mechanism: &'static str,
        code: u16,
        message: String,
    },

    /// The server does not offer a required authentication capability.
    #[error("Server does not support {0}")]
    AuthUnsupported(&'static str),

    /// Refused to send a password over an unencrypted connection.
    #[error("Refusing to send credentials over an unencrypted connection")]
    InsecureAuth,

    /// The relay name does not match the host the credentials belong to.
    #[error("Credentials for {expected} offered to {actual}")]
    WrongHost { expected: String, actual: String },
}

impl ClientError {
    /// Returns `true` if the error arose while authenticating.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthRejected { .. }
                | Self::AuthUnsupported(_)
                | Self::InsecureAuth
                | Self::WrongHost { .. }
        )
    }
}

/// Specialized `Result` type for SMTP transport operations.
pub type Result<T> = std::result::Result<T, ClientError>;
