//! Compose MIME mail and hand it to an SMTP relay.
//!
//! A [`ServerProfile`] describes the relay and how to authenticate against
//! it. It hands out [`Message`] builders which, once populated, serialize
//! themselves into a `multipart/mixed` message and deliver it through the
//! profile's [`Transport`].
//!
//! ```no_run
//! use empath_mailer::ServerProfile;
//!
//! # fn example() -> Result<(), empath_mailer::Error> {
//! let profile = ServerProfile::plain("smtp.example.com", 587, "user", "hunter2");
//!
//! let mut message = profile.new_message("Quarterly report", "See attached.");
//! message.set_from("Reports <reports@example.com>")?;
//! message.add_to("alice@example.com, Bob <bob@example.com>")?;
//! message.attach("/var/reports/q3.pdf");
//! message.send()?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod auth;
pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod message;
pub mod profile;
pub mod transport;

pub use tracing;

pub use address::{parse_address_list, Mailbox};
pub use auth::Auth;
pub use config::ProfileConfig;
pub use error::{Error, Result};
pub use message::{ContentType, Message, DEFAULT_BOUNDARY};
pub use profile::ServerProfile;
pub use transport::{ClientError, SmtpTransport, Transport};
