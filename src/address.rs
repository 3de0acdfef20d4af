use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use mailparse::{MailAddr, SingleInfo};
use serde::{Deserialize, Serialize};

use crate::{
    encoding::{encoded_word, is_printable_ascii, quoted_string},
    error::{Error, Result},
};

/// A display name and an address, as in RFC 5322 section 3.4.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: String,
    pub address: String,
}

impl Mailbox {
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Returns `true` when no address has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }

    /// The address as an RFC 5322 addr-spec, quoting the local part when it
    /// is not a dot-atom.
    #[must_use]
    pub fn addr_spec(&self) -> Cow<'_, str> {
        match self.address.rsplit_once('@') {
            Some((local, domain)) if !local.starts_with('"') && needs_quoting(local) => {
                Cow::Owned(format!("{}@{domain}", quoted_string(local)))
            }
            _ => Cow::Borrowed(&self.address),
        }
    }
}

/// `true` unless `local` is a dot-atom. Non-ASCII is allowed unquoted as in
/// RFC 6532.
fn needs_quoting(local: &str) -> bool {
    local.is_empty()
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local.chars().any(|c| {
            c.is_ascii() && !(c.is_ascii_alphanumeric() || ".!#$%&'*+-/=?^_`{|}~".contains(c))
        })
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return write!(f, "<{}>", self.addr_spec());
        }

        if is_printable_ascii(&self.name) {
            write!(f, "{} <{}>", quoted_string(&self.name), self.addr_spec())
        } else {
            write!(f, "{} <{}>", encoded_word(&self.name), self.addr_spec())
        }
    }
}

impl From<SingleInfo> for Mailbox {
    fn from(info: SingleInfo) -> Self {
        Self {
            name: info.display_name.unwrap_or_default(),
            address: info.addr,
        }
    }
}

/// Joins formatted mailboxes with `,` for use in a header value.
#[must_use]
pub fn join(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a comma separated RFC 5322 address list.
///
/// Group members are flattened in order. An empty list is an error, as is
/// any entry whose address lacks a local part or domain.
///
/// # Errors
///
/// Returns [`Error::MalformedAddress`] if `text` does not parse or contains
/// an invalid address. `field` names the destination for the error message.
pub fn parse_address_list_for(field: &'static str, text: &str) -> Result<Vec<Mailbox>> {
    let malformed = |reason: String| Error::MalformedAddress {
        field,
        input: text.to_string(),
        reason,
    };

    let parsed = mailparse::addrparse(text).map_err(|err| malformed(err.to_string()))?;

    let mut mailboxes = Vec::with_capacity(parsed.len());
    for addr in parsed.iter() {
        match addr {
            MailAddr::Single(single) => mailboxes.push(Mailbox::from(single.clone())),
            MailAddr::Group(group) => {
                mailboxes.extend(group.addrs.iter().cloned().map(Mailbox::from));
            }
        }
    }

    if mailboxes.is_empty() {
        return Err(malformed("no address".to_string()));
    }

    for mailbox in &mailboxes {
        validate(&mailbox.address).map_err(|reason| malformed(reason.to_string()))?;
    }

    Ok(mailboxes)
}

/// Parses a comma separated RFC 5322 address list.
///
/// # Errors
///
/// See [`parse_address_list_for`].
pub fn parse_address_list(text: &str) -> Result<Vec<Mailbox>> {
    parse_address_list_for("address", text)
}

fn validate(address: &str) -> std::result::Result<(), &'static str> {
    if address.chars().any(char::is_control) {
        return Err("address contains control characters");
    }

    match address.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        Some(_) => Err("missing local part or domain"),
        None => Err("missing @ in address"),
    }
}
