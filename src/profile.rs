use std::{fmt, sync::Arc};

use crate::{
    auth::Auth,
    error::Result,
    message::{ContentType, Message},
    transport::{SmtpTransport, Transport},
};

/// Connection and authentication parameters for one relay.
///
/// A profile is read-only once built and may be shared between threads; it
/// hands out any number of [`Message`]s bound to it.
#[derive(Clone)]
pub struct ServerProfile {
    host: String,
    port: u16,
    username: String,
    password: String,
    secret: String,
    identity: String,
    transport: Arc<dyn Transport>,
}

impl ServerProfile {
    fn new(
        host: String,
        port: u16,
        username: String,
        password: String,
        secret: String,
        identity: String,
    ) -> Self {
        debug_assert!(!host.trim().is_empty(), "relay host must not be empty");
        Self {
            host,
            port,
            username,
            password,
            secret,
            identity,
            transport: Arc::new(SmtpTransport::default()),
        }
    }

    /// A relay using `AUTH PLAIN` with an empty authorization identity.
    ///
    /// `host` must not be empty. Debug builds assert this; release builds
    /// fail when connecting. [`ProfileConfig`](crate::ProfileConfig)
    /// rejects an empty host with [`Error::Config`](crate::Error::Config).
    #[must_use]
    pub fn plain(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::plain_with_identity(host, port, username, password, "")
    }

    /// A relay using `AUTH PLAIN` acting on behalf of `identity`.
    ///
    /// `host` must not be empty, see [`plain`](Self::plain).
    #[must_use]
    pub fn plain_with_identity(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self::new(
            host.into(),
            port,
            username.into(),
            password.into(),
            String::new(),
            identity.into(),
        )
    }

    /// A relay using `AUTH CRAM-MD5` with a shared secret.
    ///
    /// `host` must not be empty, see [`plain`](Self::plain).
    #[must_use]
    pub fn cram_md5(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self::new(
            host.into(),
            port,
            username.into(),
            String::new(),
            secret.into(),
            String::new(),
        )
    }

    /// Replaces the transport used to deliver messages.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The relay address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The authentication strategy for this relay.
    ///
    /// A non-empty secret selects CRAM-MD5 regardless of the password.
    #[must_use]
    pub fn auth(&self) -> Auth {
        if self.secret.is_empty() {
            Auth::plain(
                self.identity.as_str(),
                self.username.as_str(),
                self.password.as_str(),
                self.host.as_str(),
            )
        } else {
            Auth::cram_md5(self.username.as_str(), self.secret.as_str())
        }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// A plain text message.
    #[must_use]
    pub fn new_message(&self, subject: impl Into<String>, body: impl Into<String>) -> Message<'_> {
        Message::new(self, subject.into(), body.into(), ContentType::Plain)
    }

    /// An HTML message.
    #[must_use]
    pub fn new_html_message(
        &self,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Message<'_> {
        Message::new(self, subject.into(), body.into(), ContentType::Html)
    }

    /// Builds and sends a plain text message in one go.
    ///
    /// # Errors
    ///
    /// Fails if either address is malformed or sending fails, see
    /// [`Message::send`].
    pub fn easy_send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut message = self.new_message(subject, body);
        message.set_from(from)?;
        message.add_to(to)?;
        message.send()
    }
}

impl fmt::Debug for ServerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("identity", &self.identity)
            .field("auth", &self.auth().mechanism())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_profile_auth() {
        let profile = ServerProfile::plain("smtp.example.com", 587, "u", "p");
        assert_eq!(profile.address(), "smtp.example.com:587");
        assert_eq!(profile.auth(), Auth::plain("", "u", "p", "smtp.example.com"));
    }

    #[test]
    fn test_identity_is_passed_through() {
        let profile = ServerProfile::plain_with_identity("smtp.example.com", 25, "u", "p", "boss");
        assert_eq!(
            profile.auth(),
            Auth::plain("boss", "u", "p", "smtp.example.com")
        );
    }

    #[test]
    fn test_cram_md5_profile_auth() {
        let profile = ServerProfile::cram_md5("smtp.example.com", 587, "u", "s");
        assert_eq!(profile.auth(), Auth::cram_md5("u", "s"));
    }

    #[test]
    fn test_message_factories() {
        let profile = ServerProfile::plain("smtp.example.com", 587, "u", "p");
        assert_eq!(
            profile.new_message("s", "b").content_type(),
            ContentType::Plain
        );
        assert_eq!(
            profile.new_html_message("s", "<p>b</p>").content_type(),
            ContentType::Html
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "relay host must not be empty")]
    fn test_empty_host_is_rejected() {
        let _ = ServerProfile::cram_md5("", 587, "u", "s");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let debug = format!("{:?}", ServerProfile::plain("h", 25, "u", "hunter2"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("PLAIN"));
    }
}
