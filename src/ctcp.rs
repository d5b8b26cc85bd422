//! CTCP message framing.
//!
//! PRIVMSG and NOTICE bodies can carry a Client-To-Client Protocol
//! request or reply: the text is wrapped in `\x01` delimiters, with the
//! command word first and any parameters after a single space. The
//! tracker treats a body as CTCP only when both delimiters are present;
//! a stray leading `\x01` with no closing mate stays ordinary message
//! text.
//!
//! ```
//! use skua::ctcp::{Ctcp, CtcpKind};
//!
//! let me = Ctcp::parse("\x01ACTION sighs\x01").unwrap();
//! assert_eq!(me.kind, CtcpKind::Action);
//! assert_eq!(me.params, Some("sighs"));
//!
//! assert_eq!(Ctcp::ping("1722600000").to_string(), "\x01PING 1722600000\x01");
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub(crate) const CTCP_DELIM: char = '\x01';

/// CTCP command words the engine reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION, the `/me` emote.
    Action,
    /// VERSION, a client software query.
    Version,
    /// PING, a latency probe carrying an opaque timestamp.
    Ping,
    /// TIME, a local-time query.
    Time,
    /// Any other command word, kept uppercased.
    Unknown(String),
}

impl CtcpKind {
    /// Map a command token to its kind, case-insensitively.
    pub fn from_token(token: &str) -> Self {
        let upper = token.to_ascii_uppercase();
        match upper.as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            _ => Self::Unknown(upper),
        }
    }

    /// The uppercase command word.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Unknown(word) => word,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CTCP frame, borrowed from the enclosing message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The command word.
    pub kind: CtcpKind,
    /// Parameters after the command word, when non-empty.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Extract a CTCP frame from a message body.
    ///
    /// Returns `None` unless the body opens with `\x01` and a closing
    /// `\x01` follows somewhere after it. The text between the
    /// outermost delimiters splits at the first space into the command
    /// word and its parameters; an empty parameter run counts as none.
    pub fn parse(body: &'a str) -> Option<Self> {
        if !Self::is_ctcp(body) {
            return None;
        }
        let inner = &body[1..body.rfind(CTCP_DELIM)?];

        let (word, params) = match inner.split_once(' ') {
            Some((word, rest)) => (word, (!rest.is_empty()).then_some(rest)),
            None => (inner, None),
        };
        if word.is_empty() {
            return None;
        }

        Some(Self {
            kind: CtcpKind::from_token(word),
            params,
        })
    }

    /// Whether a body is CTCP-framed: an opening delimiter with a
    /// closing mate after it.
    #[inline]
    pub fn is_ctcp(body: &str) -> bool {
        body.starts_with(CTCP_DELIM) && body[1..].contains(CTCP_DELIM)
    }

    /// Build an ACTION frame.
    pub fn action(text: &'a str) -> Self {
        Self {
            kind: CtcpKind::Action,
            params: Some(text),
        }
    }

    /// Build a PING frame echoing the peer's timestamp.
    pub fn ping(timestamp: &'a str) -> Self {
        Self {
            kind: CtcpKind::Ping,
            params: Some(timestamp),
        }
    }

    /// Build a frame from an arbitrary command word.
    pub fn custom(word: &str, params: Option<&'a str>) -> Self {
        Self {
            kind: CtcpKind::from_token(word),
            params,
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params {
            Some(params) => write!(f, "\x01{} {}\x01", self.kind, params),
            None => write!(f, "\x01{}\x01", self.kind),
        }
    }
}
