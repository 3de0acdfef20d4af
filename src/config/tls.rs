//! TLS settings for the relay connection.

use serde::{Deserialize, Serialize};

/// When to upgrade the relay connection with STARTTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Use STARTTLS when the relay offers it, otherwise stay in plaintext.
    #[default]
    Opportunistic,

    /// Fail unless the relay offers STARTTLS.
    Required,

    /// Never use STARTTLS.
    ///
    /// PLAIN authentication is then only possible against localhost.
    Disabled,
}

/// TLS negotiation and certificate validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub policy: TlsPolicy,

    /// Whether to accept invalid certificates (self-signed, expired, etc.).
    ///
    /// **SECURITY WARNING**: only set this for testing.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl TlsConfig {
    /// Opportunistic STARTTLS with certificate validation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: TlsPolicy::Opportunistic,
            accept_invalid_certs: false,
        }
    }

    /// Mandatory STARTTLS with certificate validation.
    #[must_use]
    pub const fn required() -> Self {
        Self {
            policy: TlsPolicy::Required,
            accept_invalid_certs: false,
        }
    }

    /// Plaintext only.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            policy: TlsPolicy::Disabled,
            accept_invalid_certs: false,
        }
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.policy, TlsPolicy::Required)
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self.policy, TlsPolicy::Disabled)
    }
}
