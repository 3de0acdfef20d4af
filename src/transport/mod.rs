//! Delivery of serialized messages to a relay.
//!
//! [`Transport`] is the seam between message composition and the network.
//! [`SmtpTransport`] is the default implementation; tests and applications
//! with their own delivery path can supply another.

mod client;
mod error;
mod response;
mod smtp;

pub use client::{dot_stuff, SmtpClient};
pub use error::{ClientError, Result};
pub use response::{Extensions, Response, ResponseLine};
pub use smtp::SmtpTransport;

use crate::auth::Auth;

/// Authenticates against a relay and delivers raw message bytes.
pub trait Transport: Send + Sync {
    /// Delivers `message` to `recipients` through the relay at `addr`
    /// (`host:port`), announcing `from` as the envelope sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be reached, refuses the
    /// credentials, or rejects the sender, a recipient or the message.
    fn send_mail(
        &self,
        addr: &str,
        auth: &Auth,
        from: &str,
        recipients: &[String],
        message: &[u8],
    ) -> Result<()>;
}
