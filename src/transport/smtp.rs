//! Blocking SMTP delivery.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::{
    client::SmtpClient,
    error::{ClientError, Result},
    Transport,
};
use crate::{
    auth::{cram_md5_response, plain_payload, Auth},
    config::SmtpTransportConfig,
    internal,
};

/// Delivers mail over SMTP, one connection per message.
///
/// Each call to [`send_mail`](Transport::send_mail) drives the session on a
/// private current-thread runtime and blocks until the relay has accepted or
/// refused the message. Called from within an async runtime it fails with
/// [`ClientError::InvalidContext`]; use `spawn_blocking` there instead.
#[derive(Debug, Clone, Default)]
pub struct SmtpTransport {
    config: SmtpTransportConfig,
}

impl SmtpTransport {
    #[must_use]
    pub const fn new(config: SmtpTransportConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SmtpTransportConfig {
        &self.config
    }

    async fn deliver(
        &self,
        addr: &str,
        auth: &Auth,
        from: &str,
        recipients: &[String],
        message: &[u8],
    ) -> Result<()> {
        validate_line(from)?;
        for recipient in recipients {
            validate_line(recipient)?;
        }

        let timeouts = &self.config.timeouts;
        let mut client = SmtpClient::connect(addr, host_of(addr), timeouts.connect_timeout())
            .await?
            .accept_invalid_certs(self.config.tls.accept_invalid_certs)
            .command_timeout(timeouts.command_timeout());

        client.read_greeting().await?;
        client.hello(&self.config.helo_name).await?;

        let tls = &self.config.tls;
        if tls.is_disabled() {
            internal!(level = DEBUG, "STARTTLS disabled by configuration");
        } else if client.extensions().has("STARTTLS") {
            client.starttls().await?;
            client.hello(&self.config.helo_name).await?;
        } else if tls.is_required() {
            return Err(ClientError::TlsUnavailable);
        } else {
            internal!(level = DEBUG, "Relay does not offer STARTTLS, continuing in plaintext");
        }

        if !client.extensions().has("AUTH") {
            return Err(ClientError::AuthUnsupported("AUTH"));
        }
        if !client.extensions().supports_auth(auth.mechanism()) {
            return Err(ClientError::AuthUnsupported(auth.mechanism()));
        }
        authenticate(&mut client, auth).await?;

        client.mail_from(from).await?;
        for recipient in recipients {
            client.rcpt_to(recipient).await?;
        }
        client.data(message, timeouts.data_timeout()).await?;

        internal!(
            level = DEBUG,
            "Relay accepted message from {from} for {} recipient(s)",
            recipients.len()
        );

        // The relay has already accepted the message at this point
        if let Err(err) = client.quit().await {
            internal!(level = DEBUG, "QUIT failed: {err}");
        }

        Ok(())
    }
}

impl Transport for SmtpTransport {
    fn send_mail(
        &self,
        addr: &str,
        auth: &Auth,
        from: &str,
        recipients: &[String],
        message: &[u8],
    ) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ClientError::InvalidContext(
                "blocking send called from within an async runtime",
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(self.deliver(addr, auth, from, recipients, message))
    }
}

async fn authenticate(client: &mut SmtpClient, auth: &Auth) -> Result<()> {
    internal!(level = DEBUG, "Authenticating with {}", auth.mechanism());

    match auth {
        Auth::Plain {
            identity,
            username,
            password,
            host,
        } => {
            if !client.is_tls() && !is_localhost(client.server_domain()) {
                return Err(ClientError::InsecureAuth);
            }
            if client.server_domain() != host {
                return Err(ClientError::WrongHost {
                    expected: host.clone(),
                    actual: client.server_domain().to_string(),
                });
            }

            let payload = plain_payload(identity, username, password);
            let response = client
                .secret_command(&format!("AUTH PLAIN {payload}"))
                .await?;

            if response.code == 235 {
                return Ok(());
            }
            if response.is_intermediate() {
                client.command("*").await?;
            }
            Err(ClientError::AuthRejected {
                mechanism: "PLAIN",
                code: response.code,
                message: response.message(),
            })
        }
        Auth::CramMd5 { username, secret } => {
            let response = client.command("AUTH CRAM-MD5").await?;
            if response.code != 334 {
                return Err(ClientError::AuthRejected {
                    mechanism: "CRAM-MD5",
                    code: response.code,
                    message: response.message(),
                });
            }

            let challenge = response.lines.first().map(String::as_str).unwrap_or_default();
            let Ok(challenge) = STANDARD.decode(challenge.trim()) else {
                client.command("*").await?;
                return Err(ClientError::ParseError(format!(
                    "Invalid CRAM-MD5 challenge: '{challenge}'"
                )));
            };

            let response = client
                .secret_command(&cram_md5_response(username, secret, &challenge))
                .await?;

            if response.code == 235 {
                Ok(())
            } else {
                Err(ClientError::AuthRejected {
                    mechanism: "CRAM-MD5",
                    code: response.code,
                    message: response.message(),
                })
            }
        }
    }
}

/// The host part of a `host:port` address, without IPv6 brackets.
fn host_of(addr: &str) -> &str {
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

fn validate_line(line: &str) -> Result<()> {
    if line.contains(['\r', '\n']) {
        return Err(ClientError::InvalidLine(line.to_string()));
    }
    Ok(())
}
