//! Authentication strategies offered to the relay.
//!
//! Supports PLAIN and CRAM-MD5.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};

/// How to authenticate against the relay.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// SMTP `AUTH PLAIN`.
    ///
    /// `host` is the relay the credentials are meant for; they are never
    /// offered to a server with a different name.
    Plain {
        identity: String,
        username: String,
        password: String,
        host: String,
    },
    /// SMTP `AUTH CRAM-MD5` keyed with a shared secret.
    CramMd5 { username: String, secret: String },
}

impl Auth {
    #[must_use]
    pub fn plain(
        identity: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self::Plain {
            identity: identity.into(),
            username: username.into(),
            password: password.into(),
            host: host.into(),
        }
    }

    #[must_use]
    pub fn cram_md5(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::CramMd5 {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// The SASL mechanism name.
    #[must_use]
    pub const fn mechanism(&self) -> &'static str {
        match self {
            Self::Plain { .. } => "PLAIN",
            Self::CramMd5 { .. } => "CRAM-MD5",
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain {
                identity,
                username,
                host,
                ..
            } => f
                .debug_struct("Plain")
                .field("identity", identity)
                .field("username", username)
                .field("password", &"<redacted>")
                .field("host", host)
                .finish(),
            Self::CramMd5 { username, .. } => f
                .debug_struct("CramMd5")
                .field("username", username)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Builds the base64 `AUTH PLAIN` initial response: `identity\0username\0password`.
#[must_use]
pub fn plain_payload(identity: &str, username: &str, password: &str) -> String {
    STANDARD.encode(format!("{identity}\0{username}\0{password}").as_bytes())
}

/// Computes the hex encoded HMAC-MD5 of `challenge` keyed with `secret`.
#[must_use]
pub fn cram_md5_digest(secret: &str, challenge: &[u8]) -> String {
    type HmacMd5 = Hmac<md5::Md5>;

    // HMAC accepts keys of any length, so this cannot fail
    let Ok(mut mac) = HmacMd5::new_from_slice(secret.as_bytes()) else {
        unreachable!("HMAC can take a key of any size")
    };
    mac.update(challenge);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds the base64 CRAM-MD5 reply to a decoded server `challenge`.
#[must_use]
pub fn cram_md5_response(username: &str, secret: &str, challenge: &[u8]) -> String {
    let digest = cram_md5_digest(secret, challenge);
    STANDARD.encode(format!("{username} {digest}").as_bytes())
}
