//! Message builder and MIME serialization.

use std::{
    borrow::Cow,
    fmt::Display,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Local, TimeZone};

use crate::{
    address::{self, parse_address_list_for, Mailbox},
    encoding::{base64_wrapped, encoded_word},
    error::{Error, Result},
    internal,
    profile::ServerProfile,
};

/// A fixed multipart boundary for reproducible output.
pub const DEFAULT_BOUNDARY: &str = "0141caffe046497";

/// `Date` header layout, RFC 1123 with a numeric zone.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

const OCTET_STREAM: &str = "application/octet-stream";

/// The media type of the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Plain,
    Html,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing message bound to the [`ServerProfile`] that created it.
///
/// Subject, body and body type are fixed at creation; everything else is
/// filled in through the setters before calling [`send`](Self::send).
#[derive(Debug, Clone)]
pub struct Message<'a> {
    profile: &'a ServerProfile,
    from: Mailbox,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Mailbox,
    subject: String,
    body: String,
    content_type: ContentType,
    headers: Vec<(String, String)>,
    attachments: Vec<(String, PathBuf)>,
    boundary: Option<String>,
}

impl<'a> Message<'a> {
    pub(crate) fn new(
        profile: &'a ServerProfile,
        subject: String,
        body: String,
        content_type: ContentType,
    ) -> Self {
        Self {
            profile,
            from: Mailbox::default(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Mailbox::default(),
            subject,
            body,
            content_type,
            headers: Vec::new(),
            attachments: Vec::new(),
            boundary: None,
        }
    }

    /// Sets the sender.
    ///
    /// Only the first mailbox is kept if `from` lists several.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedAddress`] if `from` does not parse; the
    /// message is left unchanged.
    pub fn set_from(&mut self, from: &str) -> Result<()> {
        if let Some(first) = parse_address_list_for("from", from)?.into_iter().next() {
            self.from = first;
        }
        Ok(())
    }

    /// Appends every mailbox in `to` to the `To` recipients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedAddress`] if `to` does not parse; the
    /// message is left unchanged.
    pub fn add_to(&mut self, to: &str) -> Result<()> {
        self.to.extend(parse_address_list_for("to", to)?);
        Ok(())
    }

    /// Appends every mailbox in `cc` to the `Cc` recipients.
    ///
    /// # Errors
    ///
    /// See [`add_to`](Self::add_to).
    pub fn add_cc(&mut self, cc: &str) -> Result<()> {
        self.cc.extend(parse_address_list_for("cc", cc)?);
        Ok(())
    }

    /// Appends every mailbox in `bcc` to the blind recipients.
    ///
    /// Blind recipients only appear in the SMTP envelope.
    ///
    /// # Errors
    ///
    /// See [`add_to`](Self::add_to).
    pub fn add_bcc(&mut self, bcc: &str) -> Result<()> {
        self.bcc.extend(parse_address_list_for("bcc", bcc)?);
        Ok(())
    }

    /// Sets the `Reply-To` mailbox, keeping only the first if several are given.
    ///
    /// # Errors
    ///
    /// See [`set_from`](Self::set_from).
    pub fn set_reply_to(&mut self, reply_to: &str) -> Result<()> {
        if let Some(first) = parse_address_list_for("reply-to", reply_to)?
            .into_iter()
            .next()
        {
            self.reply_to = first;
        }
        Ok(())
    }

    /// Adds a custom header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHeader`] if `key` is already set.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.header(&key).is_some() {
            return Err(Error::DuplicateHeader { key });
        }
        self.headers.push((key, value.into()));
        Ok(())
    }

    /// Adds a custom header, replacing any existing value in place.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.headers.push((key, value)),
        }
    }

    /// Attaches the file at `path` under its file name.
    ///
    /// The file is read when the message is serialized. Attaching another
    /// file with the same name replaces the earlier path.
    pub fn attach(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let filename = path.file_name().map_or_else(
            || path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        );

        match self.attachments.iter_mut().find(|(name, _)| *name == filename) {
            Some((_, existing)) => *existing = path.to_path_buf(),
            None => self.attachments.push((filename, path.to_path_buf())),
        }
    }

    /// Fixes the multipart boundary instead of generating one per
    /// serialization. The caller must ensure it does not occur in the body.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) {
        self.boundary = Some(boundary.into());
    }

    #[must_use]
    pub const fn profile(&self) -> &'a ServerProfile {
        self.profile
    }

    #[must_use]
    pub const fn from(&self) -> &Mailbox {
        &self.from
    }

    #[must_use]
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    #[must_use]
    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    #[must_use]
    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    #[must_use]
    pub const fn reply_to(&self) -> &Mailbox {
        &self.reply_to
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Looks up a custom header.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Custom headers in the order they were added.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attachments as `(file name, path)` in the order they were added.
    pub fn attachments(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.attachments
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Envelope recipients: `To`, then `Cc`, then `Bcc` addresses.
    #[must_use]
    pub fn envelope_recipients(&self) -> Vec<String> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|mailbox| mailbox.addr_spec().into_owned())
            .collect()
    }

    /// Serializes the message, dated now.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.render(&Local::now())
    }

    /// Serializes the message with the given `Date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSender`] or [`Error::MissingRecipient`] when
    /// the required addresses are absent, [`Error::MissingAttachment`] if an
    /// attached file no longer exists and [`Error::Io`] if one cannot be read.
    pub fn render<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> Result<Vec<u8>>
    where
        Tz::Offset: Display,
    {
        let mut out = String::with_capacity(self.body.len() + 1024);

        if self.from.is_empty() {
            return Err(Error::MissingSender);
        }
        header(&mut out, "From", &self.from);
        header(&mut out, "Date", date.format(DATE_FORMAT));

        if self.to.is_empty() {
            return Err(Error::MissingRecipient);
        }
        header(&mut out, "To", address::join(&self.to));

        if !self.cc.is_empty() {
            header(&mut out, "Cc", address::join(&self.cc));
        }

        header(&mut out, "Subject", encoded_word(&self.subject));

        if !self.reply_to.is_empty() {
            header(&mut out, "Reply-To", &self.reply_to);
        }

        for (key, value) in &self.headers {
            header(&mut out, &single_line(key), single_line(value));
        }

        if self.attachments.is_empty() {
            self.write_body(&mut out);
            return Ok(out.into_bytes());
        }

        let boundary = self
            .boundary
            .clone()
            .unwrap_or_else(|| generate_boundary(&self.body));

        header(
            &mut out,
            "Content-Type",
            format!("multipart/mixed; boundary={boundary}"),
        );
        out.push_str("\r\n--");
        out.push_str(&boundary);
        out.push_str("\r\n");

        self.write_body(&mut out);

        for (filename, path) in &self.attachments {
            if !path.exists() {
                return Err(Error::MissingAttachment { path: path.clone() });
            }

            out.push_str("\r\n--");
            out.push_str(&boundary);
            out.push_str("\r\n");

            let mime = mime_guess::from_path(filename)
                .first_raw()
                .unwrap_or(OCTET_STREAM);
            header(&mut out, "Content-Type", mime);
            header(&mut out, "Content-Transfer-Encoding", "base64");
            header(
                &mut out,
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", encoded_word(filename)),
            );
            out.push_str("\r\n");

            let data = std::fs::read(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            internal!("Attaching {filename} ({} bytes) as {mime}", data.len());
            out.push_str(&base64_wrapped(&data));
        }

        out.push_str("\r\n--");
        out.push_str(&boundary);
        out.push_str("--\r\n");

        Ok(out.into_bytes())
    }

    fn write_body(&self, out: &mut String) {
        header(
            out,
            "Content-Type",
            format!("{}; charset=utf-8", self.content_type),
        );
        out.push_str("\r\n");
        out.push_str(&self.body);
        out.push_str("\r\n");
    }

    /// Serializes the message and delivers it through the profile's
    /// transport.
    ///
    /// Nothing touches the network unless serialization succeeds.
    ///
    /// # Errors
    ///
    /// Any error from [`render`](Self::render), or [`Error::Auth`] /
    /// [`Error::Transport`] as reported by the transport.
    pub fn send(&self) -> Result<()> {
        let data = self.to_bytes()?;
        let from = self.from.addr_spec();
        let recipients = self.envelope_recipients();
        let addr = self.profile.address();

        internal!(
            level = DEBUG,
            "Sending {} byte message from {from} to {} recipient(s) via {addr}",
            data.len(),
            recipients.len()
        );

        self.profile.transport().send_mail(
            &addr,
            &self.profile.auth(),
            &from,
            &recipients,
            &data,
        )?;

        Ok(())
    }
}

fn header(out: &mut String, name: &str, value: impl Display) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(&value.to_string());
    out.push_str("\r\n");
}

/// Folds CR and LF into spaces so a custom header cannot start another.
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// A boundary unique to this moment that does not occur in `body`.
///
/// Base64 never produces `_`, so attachment data cannot collide with it.
fn generate_boundary(body: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let base = format!("_Part_{nanos:x}");
    let mut boundary = base.clone();
    let mut suffix = 0u32;
    while body.contains(boundary.as_str()) {
        suffix += 1;
        boundary = format!("{base}_{suffix}");
    }
    boundary
}
