//! SMTP reply parsing and representation.

use super::error::{ClientError, Result};

/// A single line of an SMTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    /// The SMTP status code (e.g., 220, 250, 550).
    pub code: u16,
    /// Whether this is the last line in a multi-line reply.
    pub is_last: bool,
    /// The text following the status code.
    pub message: String,
}

/// A complete SMTP reply, which may span several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Response {
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// All reply lines joined by newlines.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    /// Returns `true` for a 2xx reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Returns `true` for a 3xx reply (e.g. `334` during AUTH, `354` after DATA).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Returns `true` for a 4xx or 5xx reply.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.code >= 400 && self.code < 600
    }

    /// Converts an error reply into [`ClientError::SmtpError`] and any other
    /// reply whose code differs from `expected` into
    /// [`ClientError::UnexpectedResponse`].
    ///
    /// # Errors
    ///
    /// See above.
    pub fn require(self, expected: u16) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else if self.is_error() {
            Err(ClientError::SmtpError {
                code: self.code,
                message: self.message(),
            })
        } else {
            Err(ClientError::UnexpectedResponse {
                code: self.code,
                message: self.message(),
            })
        }
    }

    /// Parses a single reply line, without its line terminator.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ParseError` if the line doesn't match SMTP format.
    pub fn parse_line(line: &str) -> Result<ResponseLine> {
        let code = line
            .get(..3)
            .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| ClientError::ParseError(format!("Invalid status code: '{line}'")))?;

        let is_last = match line.as_bytes().get(3) {
            None | Some(b' ') => true,
            Some(b'-') => false,
            Some(&c) => {
                return Err(ClientError::ParseError(format!(
                    "Invalid separator character: '{}'",
                    char::from(c)
                )))
            }
        };

        Ok(ResponseLine {
            code,
            is_last,
            message: line.get(4..).unwrap_or_default().to_string(),
        })
    }

    /// Parses a complete, possibly multi-line, reply from the front of
    /// `buffer`.
    ///
    /// Returns the reply and the number of bytes consumed, or `None` when
    /// more data is needed.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ParseError` if the reply is malformed.
    pub fn parse_response(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let mut consumed = 0;
        let mut code = None;
        let mut lines = Vec::new();

        while let Some(end) = buffer[consumed..].iter().position(|&b| b == b'\n') {
            let raw = &buffer[consumed..consumed + end];
            consumed += end + 1;

            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.is_empty() {
                continue;
            }

            let parsed = Self::parse_line(std::str::from_utf8(raw)?)?;
            match code {
                Some(code) if code != parsed.code => {
                    return Err(ClientError::ParseError(format!(
                        "Status code mismatch in multi-line response: expected {code}, got {}",
                        parsed.code
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed.code),
            }

            lines.push(parsed.message);

            if parsed.is_last {
                return Ok(code.map(|code| (Self::new(code, lines), consumed)));
            }
        }

        Ok(None)
    }
}

/// Service extensions advertised in an EHLO reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    keywords: Vec<(String, String)>,
}

impl Extensions {
    /// Reads the extension lines of an EHLO reply. The first line is the
    /// server greeting and is skipped.
    #[must_use]
    pub fn from_ehlo(response: &Response) -> Self {
        let keywords = response
            .lines
            .iter()
            .skip(1)
            .map(|line| {
                let (keyword, params) = line.split_once(' ').unwrap_or((line.as_str(), ""));
                (keyword.to_ascii_uppercase(), params.trim().to_string())
            })
            .collect();

        Self { keywords }
    }

    /// Returns `true` if `keyword` was advertised.
    #[must_use]
    pub fn has(&self, keyword: &str) -> bool {
        self.params(keyword).is_some()
    }

    /// The parameters following `keyword`, if it was advertised.
    #[must_use]
    pub fn params(&self, keyword: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, params)| params.as_str())
    }

    /// Returns `true` if `AUTH` lists `mechanism`.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.params("AUTH").is_some_and(|mechanisms| {
            mechanisms
                .split_whitespace()
                .any(|m| m.eq_ignore_ascii_case(mechanism))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let line = ResponseLine {
            code: 220,
            is_last: true,
            message: "mail.example.com ESMTP".to_string(),
        };
        assert_eq!(
            Response::parse_line("220 mail.example.com ESMTP").unwrap(),
            line
        );
    }

    #[test]
    fn test_parse_multi_line_indicator() {
        let line = Response::parse_line("250-mail.example.com").unwrap();
        assert!(!line.is_last);
        assert_eq!(line.message, "mail.example.com");
    }

    #[test]
    fn test_parse_bare_code() {
        let line = Response::parse_line("354").unwrap();
        assert_eq!(line.code, 354);
        assert!(line.is_last);
        assert!(line.message.is_empty());
    }

    #[test]
    fn test_parse_invalid_line() {
        assert!(Response::parse_line("OK").is_err());
        assert!(Response::parse_line("250?what").is_err());
    }

    #[test]
    fn test_parse_complete_response() {
        let (response, consumed) = Response::parse_response(b"250 OK\r\n").unwrap().unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(response.lines, vec!["OK"]);
        assert_eq!(consumed, 8);
    }

    #[test]
    fn test_parse_multi_line_response() {
        let data = b"250-mail.example.com\r\n250-SIZE 10000000\r\n250 HELP\r\n";
        let (response, consumed) = Response::parse_response(data).unwrap().unwrap();
        assert_eq!(
            response.lines,
            vec!["mail.example.com", "SIZE 10000000", "HELP"]
        );
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn test_parse_leaves_following_reply() {
        let data = b"250 OK\r\n221 Bye\r\n";
        let (_, consumed) = Response::parse_response(data).unwrap().unwrap();
        let (next, _) = Response::parse_response(&data[consumed..]).unwrap().unwrap();
        assert_eq!(next.code, 221);
    }

    #[test]
    fn test_parse_incomplete_response() {
        let data = b"250-mail.example.com\r\n250-SIZE";
        assert!(Response::parse_response(data).unwrap().is_none());
    }

    #[test]
    fn test_code_mismatch() {
        let data = b"250-first\r\n251 second\r\n";
        assert!(Response::parse_response(data).is_err());
    }

    #[test]
    fn test_expect() {
        assert!(Response::new(250, vec!["OK".into()]).require(250).is_ok());
        assert!(matches!(
            Response::new(550, vec!["No".into()]).require(250),
            Err(ClientError::SmtpError { code: 550, .. })
        ));
        assert!(matches!(
            Response::new(251, vec!["Forwarded".into()]).require(250),
            Err(ClientError::UnexpectedResponse { code: 251, .. })
        ));
    }

    #[test]
    fn test_extensions() {
        let ehlo = Response::new(
            250,
            vec![
                "mail.example.com Hello".to_string(),
                "SIZE 10000000".to_string(),
                "STARTTLS".to_string(),
                "AUTH PLAIN LOGIN CRAM-MD5".to_string(),
            ],
        );
        let extensions = Extensions::from_ehlo(&ehlo);

        assert!(extensions.has("starttls"));
        assert_eq!(extensions.params("SIZE"), Some("10000000"));
        assert!(extensions.supports_auth("cram-md5"));
        assert!(!extensions.supports_auth("XOAUTH2"));
        assert!(!extensions.has("8BITMIME"));
    }
}
