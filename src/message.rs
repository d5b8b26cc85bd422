//! Wire-line parsing for server messages.
//!
//! This module decodes a single CRLF-delimited line into a structured
//! [`Message`] using the nom parser combinator library: optional `:`
//! prefix, command token, space-separated parameters, and a `:`-marked
//! trailing parameter that consumes the remainder of the line.
//!
//! Three-digit numerics are aliased to canonical names via
//! [`Numeric::alias`], and user prefixes are decomposed into
//! nick/user/host when they carry both `!` and `@`.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::opt,
    error::Error as NomError,
    sequence::preceded,
    IResult,
};

use crate::colors::FormattedStringExt;
use crate::error::MessageParseError;
use crate::response::{CommandKind, Numeric};

type ParseResult<I, O> = IResult<I, O, NomError<I>>;

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command name (alphanumeric characters).
fn parse_command(input: &str) -> ParseResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric())(input)
}

/// Parse a line into its raw components: prefix, command, params.
fn parse_line(input: &str) -> ParseResult<&str, (Option<&str>, &str, Vec<&str>)> {
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;

    let mut params: Vec<&str> = Vec::new();
    let mut rest = input;

    while let Some(b' ') = rest.as_bytes().first().copied() {
        rest = &rest[1..];

        if let Some(b':') = rest.as_bytes().first().copied() {
            // Trailing parameter - everything after `:` until line end
            params.push(&rest[1..]);
            rest = "";
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        let param = &rest[..end];
        if param.is_empty() {
            break;
        }
        params.push(param);
        rest = &rest[end..];
    }

    Ok((rest, (prefix, command, params)))
}

/// A parsed server message.
///
/// `command` carries the canonical name (numerics aliased, e.g. `001` →
/// `rpl_welcome`); `raw_command` keeps the literal token. The final
/// argument is a trailing parameter iff the wire line marked it with `:`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Full prefix string, without the leading `:`.
    pub prefix: Option<String>,
    /// Nickname, when the prefix is a `nick!user@host` mask.
    pub nick: Option<String>,
    /// Username, when the prefix is a user mask.
    pub user: Option<String>,
    /// Hostname, when the prefix is a user mask.
    pub host: Option<String>,
    /// Canonical command name.
    pub command: String,
    /// Literal command token as received.
    pub raw_command: String,
    /// Reply/error classification of the command.
    pub kind: CommandKind,
    /// Ordered argument list, trailing parameter last.
    pub args: Vec<String>,
    /// The line as parsed (after color stripping, if requested).
    pub raw: String,
    trailing: bool,
}

impl Message {
    /// Parse one line (no CRLF) into a `Message`.
    ///
    /// With `strip_colors`, mIRC color and style codes are removed from
    /// the line before parsing, so argument text arrives clean.
    pub fn parse(line: &str, strip_colors: bool) -> Result<Self, MessageParseError> {
        let line = if strip_colors {
            line.strip_formatting().into_owned()
        } else {
            line.to_owned()
        };

        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (prefix, raw_command, params) = match parse_line(&line) {
            Ok((_rest, parts)) => parts,
            Err(_) => return Err(MessageParseError::InvalidCommand),
        };

        // Once ` :` appears the grammar makes everything after it the
        // final argument, so its presence is exactly the trailing marker.
        let trailing = !params.is_empty() && line.contains(" :");

        let (nick, user, host) = split_user_prefix(prefix);

        let command = Numeric::alias(raw_command)
            .map(str::to_owned)
            .unwrap_or_else(|| raw_command.to_owned());

        Ok(Message {
            prefix: prefix.map(str::to_owned),
            nick,
            user,
            host,
            command,
            kind: CommandKind::of(raw_command),
            raw_command: raw_command.to_owned(),
            args: params.into_iter().map(str::to_owned).collect(),
            raw: line,
            trailing,
        })
    }

    /// Whether the final argument was a `:`-marked trailing parameter.
    pub fn has_trailing(&self) -> bool {
        self.trailing
    }

    /// First argument, if any.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Trailing text: the last argument, or empty when there is none.
    pub fn text(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or("")
    }

    /// Re-serialize into wire form (no CRLF).
    ///
    /// The trailing parameter keeps its `:` marker; args that would be
    /// ambiguous on the wire (whitespace, empty, leading `:`) are also
    /// `:`-marked, which is the only normalization applied.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        if let Some(ref prefix) = self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(&self.raw_command);
        for (i, arg) in self.args.iter().enumerate() {
            out.push(' ');
            let last = i + 1 == self.args.len();
            if last && (self.trailing || needs_trailing(arg)) {
                out.push(':');
            }
            out.push_str(arg);
        }
        out
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl std::str::FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s.trim_end_matches(['\r', '\n']), false)
    }
}

/// Whether an argument must be sent as a trailing parameter.
pub(crate) fn needs_trailing(arg: &str) -> bool {
    arg.is_empty() || arg.starts_with(':') || arg.contains(' ')
}

/// Decompose a prefix into nick/user/host when it is a full user mask.
fn split_user_prefix(prefix: Option<&str>) -> (Option<String>, Option<String>, Option<String>) {
    let Some(p) = prefix else {
        return (None, None, None);
    };
    if !p.contains('!') || !p.contains('@') {
        // Server name, or a bare nick: no decomposition.
        return (None, None, None);
    }

    let (nick, rest) = match p.split_once('!') {
        Some(parts) => parts,
        None => return (None, None, None),
    };
    let (user, host) = match rest.split_once('@') {
        Some(parts) => parts,
        None => return (None, None, None),
    };

    (
        Some(nick.to_owned()),
        Some(user.to_owned()),
        Some(host.to_owned()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let msg = Message::parse("PING", false).unwrap();
        assert_eq!(msg.command, "PING");
        assert!(msg.prefix.is_none());
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_parse_command_with_params() {
        let msg = Message::parse("PRIVMSG #channel :Hello, world!", false).unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.args, vec!["#channel", "Hello, world!"]);
        assert!(msg.has_trailing());
    }

    #[test]
    fn test_parse_with_user_prefix() {
        let msg = Message::parse(":nick!user@host PRIVMSG #channel :Hello", false).unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("nick!user@host"));
        assert_eq!(msg.nick.as_deref(), Some("nick"));
        assert_eq!(msg.user.as_deref(), Some("user"));
        assert_eq!(msg.host.as_deref(), Some("host"));
    }

    #[test]
    fn test_parse_with_server_prefix() {
        let msg = Message::parse(":irc.example.com NOTICE * :Looking up your hostname", false)
            .unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("irc.example.com"));
        assert!(msg.nick.is_none());
        assert!(msg.host.is_none());
    }

    #[test]
    fn test_numeric_aliasing() {
        let msg = Message::parse(":localhost 001 testbot :Welcome", false).unwrap();
        assert_eq!(msg.command, "rpl_welcome");
        assert_eq!(msg.raw_command, "001");
        assert_eq!(msg.kind, CommandKind::Normal);

        let msg = Message::parse(":localhost 433 * testbot :Nickname is already in use.", false)
            .unwrap();
        assert_eq!(msg.command, "err_nicknameinuse");
        assert_eq!(msg.kind, CommandKind::Error);

        let msg = Message::parse(":localhost 353 me = #c :a b", false).unwrap();
        assert_eq!(msg.command, "rpl_namreply");
        assert_eq!(msg.kind, CommandKind::Reply);
    }

    #[test]
    fn test_unknown_numeric_passes_through() {
        let msg = Message::parse(":localhost 999 x :y", false).unwrap();
        assert_eq!(msg.command, "999");
        assert_eq!(msg.raw_command, "999");
    }

    #[test]
    fn test_parse_multiple_params() {
        let msg = Message::parse("USER guest 0 * :Real Name", false).unwrap();
        assert_eq!(msg.args, vec!["guest", "0", "*", "Real Name"]);
    }

    #[test]
    fn test_parse_empty_trailing() {
        let msg = Message::parse("PRIVMSG #channel :", false).unwrap();
        assert_eq!(msg.args, vec!["#channel", ""]);
        assert!(msg.has_trailing());
    }

    #[test]
    fn test_no_trailing_marker() {
        let msg = Message::parse(":nick!u@h JOIN #channel", false).unwrap();
        assert_eq!(msg.args, vec!["#channel"]);
        assert!(!msg.has_trailing());
    }

    #[test]
    fn test_strip_colors() {
        let msg = Message::parse(
            ":nick!u@h PRIVMSG #c :\u{3}14,01\u{1f}neither are colors or styles\u{1f}\u{3}",
            true,
        )
        .unwrap();
        assert_eq!(msg.args, vec!["#c", "neither are colors or styles"]);
    }

    #[test]
    fn test_serialize_round_trip() {
        for line in [
            "PING :irc.example.com",
            ":nick!user@host PRIVMSG #channel :Hello, world!",
            ":server 001 nick :Welcome to the IRC Network",
            ":nick!u@h JOIN #channel",
            "PRIVMSG #channel :",
            ":ChanServ!s@s MODE #auditorium +o user",
        ] {
            let msg = Message::parse(line, false).unwrap();
            assert_eq!(msg.serialize(), line, "round trip failed for {line:?}");
            let reparsed = Message::parse(&msg.serialize(), false).unwrap();
            assert_eq!(msg, reparsed);
        }
    }

    #[test]
    fn test_empty_line_rejected() {
        assert_eq!(
            Message::parse("", false).unwrap_err(),
            MessageParseError::EmptyMessage
        );
    }
}
