//! Timeouts applied by the SMTP transport.
//!
//! Every timeout is optional and unset by default, in which case the
//! operation blocks until the relay answers or the connection drops.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTimeouts {
    /// Timeout for establishing the TCP connection.
    #[serde(default)]
    pub connect_secs: Option<u64>,

    /// Timeout for each reply to a command (greeting, EHLO, AUTH, MAIL, ...).
    #[serde(default)]
    pub command_secs: Option<u64>,

    /// Timeout for transmitting the message body.
    #[serde(default)]
    pub data_secs: Option<u64>,
}

impl ClientTimeouts {
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn data_timeout(&self) -> Option<Duration> {
        self.data_secs.map(Duration::from_secs)
    }
}
