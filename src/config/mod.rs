//! Relay profiles loaded from TOML.
//!
//! ```toml
//! host = "smtp.example.com"
//! port = 587
//! username = "reports"
//! password = "hunter2"
//!
//! [transport]
//! helo_name = "reports.example.com"
//!
//! [transport.tls]
//! policy = "required"
//!
//! [transport.timeouts]
//! connect_secs = 10
//! command_secs = 30
//! ```
//!
//! Setting `secret` instead of `password` selects CRAM-MD5.

pub mod timeouts;
pub mod tls;

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

pub use timeouts::ClientTimeouts;
pub use tls::{TlsConfig, TlsPolicy};

use crate::{
    error::{Error, Result},
    profile::ServerProfile,
    transport::SmtpTransport,
};

/// Settings for [`SmtpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpTransportConfig {
    /// Name announced in EHLO/HELO.
    pub helo_name: String,
    pub tls: TlsConfig,
    pub timeouts: ClientTimeouts,
}

impl Default for SmtpTransportConfig {
    fn default() -> Self {
        Self {
            helo_name: "localhost".to_string(),
            tls: TlsConfig::default(),
            timeouts: ClientTimeouts::default(),
        }
    }
}

const fn default_port() -> u16 {
    587
}

/// A relay profile as written in a configuration file.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub transport: SmtpTransportConfig,
}

impl ProfileConfig {
    /// Reads a profile from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        contents.parse()
    }

    /// Builds the profile, delivering through an [`SmtpTransport`] configured
    /// from the `[transport]` table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is empty.
    pub fn into_profile(self) -> Result<ServerProfile> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }

        let profile = if self.secret.is_empty() {
            ServerProfile::plain_with_identity(
                self.host,
                self.port,
                self.username,
                self.password,
                self.identity,
            )
        } else {
            ServerProfile::cram_md5(self.host, self.port, self.username, self.secret)
        };

        Ok(profile.with_transport(SmtpTransport::new(self.transport)))
    }
}

impl FromStr for ProfileConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }
}

impl fmt::Debug for ProfileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("identity", &self.identity)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
