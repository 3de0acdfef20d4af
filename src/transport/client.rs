//! SMTP client connection with STARTTLS support.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::{
    rustls::{pki_types::ServerName, ClientConfig, RootCertStore},
    TlsConnector,
};

use super::{
    error::{ClientError, Result},
    response::{Extensions, Response},
};
use crate::{incoming, internal, outgoing};

/// Initial size of the read buffer for SMTP responses.
const BUFFER_SIZE: usize = 8192;

/// Maximum size of the read buffer to prevent unbounded growth (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Runs `future`, failing with [`ClientError::Timeout`] if `limit` elapses first.
pub(crate) async fn with_timeout<T>(
    limit: Option<Duration>,
    operation: &'static str,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| ClientError::Timeout(operation))?,
        None => future.await,
    }
}

/// A connection that is either plain TCP or TLS-wrapped.
enum ClientConnection {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl ClientConnection {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.flush().await?,
            Self::Tls(stream) => stream.flush().await?,
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
        };
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(n)
    }

    async fn upgrade_to_tls(self, domain: &str, accept_invalid_certs: bool) -> Result<Self> {
        let Self::Plain(stream) = self else {
            return Err(ClientError::TlsError(
                "Connection is already TLS".to_string(),
            ));
        };

        let mut root_store = RootCertStore::empty();

        let certs = rustls_native_certs::load_native_certs();
        for cert in certs.certs {
            root_store.add(cert).map_err(|e| {
                ClientError::TlsError(format!("Failed to add certificate: {e}"))
            })?;
        }
        if !certs.errors.is_empty() {
            tracing::warn!(?certs.errors, "Some certificates could not be loaded");
        }

        let mut config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        if accept_invalid_certs {
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(NoVerifier));
        }

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| ClientError::TlsError(format!("Invalid domain: {e}")))?;

        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ClientError::TlsError(e.to_string()))?;

        Ok(Self::Tls(Box::new(tls_stream)))
    }
}

/// A certificate verifier that accepts all certificates (for testing only).
#[derive(Debug)]
struct NoVerifier;

impl tokio_rustls::rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[tokio_rustls::rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: tokio_rustls::rustls::pki_types::UnixTime,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::ServerCertVerified,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<tokio_rustls::rustls::SignatureScheme> {
        vec![
            tokio_rustls::rustls::SignatureScheme::RSA_PKCS1_SHA256,
            tokio_rustls::rustls::SignatureScheme::RSA_PSS_SHA256,
            tokio_rustls::rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            tokio_rustls::rustls::SignatureScheme::ED25519,
        ]
    }
}

/// One SMTP session with a relay.
pub struct SmtpClient {
    connection: Option<ClientConnection>,
    buffer: Vec<u8>,
    buffer_pos: usize,
    server_domain: String,
    accept_invalid_certs: bool,
    command_timeout: Option<Duration>,
    extensions: Extensions,
}

impl SmtpClient {
    /// Opens a TCP connection to `addr`.
    ///
    /// `server_domain` is used for SNI and certificate verification after
    /// STARTTLS, and as the server name checked by PLAIN authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or times out.
    pub async fn connect(
        addr: &str,
        server_domain: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self> {
        let stream = with_timeout(connect_timeout, "connect", async {
            TcpStream::connect(addr).await.map_err(ClientError::Io)
        })
        .await?;

        internal!(level = DEBUG, "Connected to {addr}");

        Ok(Self {
            connection: Some(ClientConnection::Plain(stream)),
            buffer: vec![0u8; BUFFER_SIZE],
            buffer_pos: 0,
            server_domain: server_domain.into(),
            accept_invalid_certs: false,
            command_timeout: None,
            extensions: Extensions::default(),
        })
    }

    /// Sets whether to accept invalid TLS certificates.
    ///
    /// Default is `false`. Set to `true` for testing only.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Limits how long to wait for each reply.
    #[must_use]
    pub const fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// The name of the server this client is talking to.
    #[must_use]
    pub fn server_domain(&self) -> &str {
        &self.server_domain
    }

    /// Returns `true` once the connection has been upgraded to TLS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self.connection, Some(ClientConnection::Tls(_)))
    }

    /// Extensions advertised by the last successful EHLO.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Reads the initial server greeting, which must be a 220.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the greeting is not a 220.
    pub async fn read_greeting(&mut self) -> Result<Response> {
        self.read_response().await?.require(220)
    }

    /// Sends a command and reads the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or reading fails.
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        outgoing!("{command}");
        self.write_line(command).await?;
        self.read_response().await
    }

    /// Like [`command`](Self::command), but keeps the command out of the logs.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or reading fails.
    pub async fn secret_command(&mut self, command: &str) -> Result<Response> {
        outgoing!("<credentials>");
        self.write_line(command).await?;
        self.read_response().await
    }

    /// Sends EHLO, falling back to HELO if the server rejects it, and
    /// records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings are refused.
    pub async fn hello(&mut self, domain: &str) -> Result<Response> {
        let response = self.command(&format!("EHLO {domain}")).await?;
        if response.is_success() {
            self.extensions = Extensions::from_ehlo(&response);
            return Ok(response);
        }

        internal!(level = DEBUG, "EHLO refused with {}, trying HELO", response.code);
        self.extensions = Extensions::default();
        self.command(&format!("HELO {domain}")).await?.require(250)
    }

    /// Sends STARTTLS and upgrades the connection.
    ///
    /// The caller must greet the server again afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is refused or the handshake fails.
    pub async fn starttls(&mut self) -> Result<Response> {
        let response = self.command("STARTTLS").await?.require(220)?;

        let Some(connection) = self.connection.take() else {
            return Err(ClientError::ConnectionClosed);
        };
        self.connection = Some(
            connection
                .upgrade_to_tls(&self.server_domain, self.accept_invalid_certs)
                .await?,
        );

        // Nothing received before the handshake may be trusted
        self.buffer_pos = 0;
        self.extensions = Extensions::default();

        internal!(level = DEBUG, "Upgraded connection to TLS");
        Ok(response)
    }

    /// Sends MAIL FROM.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server replies 250.
    pub async fn mail_from(&mut self, from: &str) -> Result<Response> {
        self.command(&format!("MAIL FROM:<{from}>")).await?.require(250)
    }

    /// Sends RCPT TO.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server replies 250 or 251.
    pub async fn rcpt_to(&mut self, to: &str) -> Result<Response> {
        let response = self.command(&format!("RCPT TO:<{to}>")).await?;
        if response.code == 251 {
            return Ok(response);
        }
        response.require(250)
    }

    /// Sends DATA, the dot-stuffed message and the terminating `.`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not accept the message.
    pub async fn data(&mut self, message: &[u8], timeout: Option<Duration>) -> Result<Response> {
        self.command("DATA").await?.require(354)?;

        let encoded = dot_stuff(message);
        outgoing!(level = DEBUG, "<{} bytes of message data>", encoded.len());

        with_timeout(timeout, "DATA", async {
            let connection = self
                .connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?;
            connection.send(&encoded).await?;
            connection.flush().await
        })
        .await?;

        self.read_response().await?.require(250)
    }

    /// Sends QUIT.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn quit(&mut self) -> Result<Response> {
        self.command("QUIT").await
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{line}\r\n");
        self.connection
            .as_mut()
            .ok_or(ClientError::ConnectionClosed)?
            .send(data.as_bytes())
            .await
    }

    /// Reads a complete SMTP reply from the server.
    async fn read_response(&mut self) -> Result<Response> {
        let limit = self.command_timeout;
        let response = with_timeout(limit, "reply", self.read_response_inner()).await?;
        incoming!("{} {}", response.code, response.message());
        Ok(response)
    }

    async fn read_response_inner(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) =
                Response::parse_response(&self.buffer[..self.buffer_pos])?
            {
                self.buffer.copy_within(consumed..self.buffer_pos, 0);
                self.buffer_pos -= consumed;
                return Ok(response);
            }

            if self.buffer_pos >= self.buffer.len() {
                let new_size = self.buffer.len() * 2;
                if new_size > MAX_BUFFER_SIZE {
                    return Err(ClientError::ParseError(format!(
                        "Response too large (exceeds {MAX_BUFFER_SIZE} bytes)"
                    )));
                }
                self.buffer.resize(new_size, 0);
            }

            let connection = self
                .connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?;
            let n = connection.read(&mut self.buffer[self.buffer_pos..]).await?;
            self.buffer_pos += n;
        }
    }
}

/// Prepares message bytes for the DATA phase.
///
/// Bare `\n` and `\r` are turned into CRLF, a `.` starting a line is doubled,
/// and the data is terminated with `CRLF.CRLF`.
#[must_use]
pub fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
    let mut at_line_start = true;
    let mut bytes = message.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        match byte {
            b'\r' => {
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
                out.extend_from_slice(b"\r\n");
                at_line_start = true;
            }
            b'\n' => {
                out.extend_from_slice(b"\r\n");
                at_line_start = true;
            }
            _ => {
                if at_line_start && byte == b'.' {
                    out.push(b'.');
                }
                out.push(byte);
                at_line_start = false;
            }
        }
    }

    if !at_line_start {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}
