//! ISUPPORT (RPL_ISUPPORT, numeric 005) feature advertisement.
//!
//! Servers describe their dialect with `KEY[=VALUE]` tokens on 005 lines.
//! [`IrcSupported`] is the client's accumulated view of those tokens;
//! the parse helpers ([`PrefixSpec`], [`ChanModeClasses`], char-limit
//! maps) mirror the token grammar.
//!
//! # Reference
//! - <https://modern.ircdocs.horse/#rplisupport-005>

use std::collections::HashMap;

use crate::casemap::CaseMapping;

/// Channel-mode characters split into the four CHANMODES parameter
/// classes: `a` list modes, `b` always-parameter, `c` parameter on set
/// only, `d` never-parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChanModeClasses {
    /// List modes (bans, invites, exceptions).
    pub a: String,
    /// Modes that always take a parameter.
    pub b: String,
    /// Modes that take a parameter only when set.
    pub c: String,
    /// Flag modes that never take a parameter.
    pub d: String,
}

impl ChanModeClasses {
    /// Merge a `CHANMODES=a,b,c,d` value, keeping each char at most once.
    pub fn merge(&mut self, value: &str) {
        let mut parts = value.split(',');
        for slot in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
            if let Some(part) = parts.next() {
                for c in part.chars() {
                    if !slot.contains(c) {
                        slot.push(c);
                    }
                }
            }
        }
    }

    /// Add one mode char to the always-parameter class.
    pub fn add_param_mode(&mut self, mode: char) {
        if !self.b.contains(mode) {
            self.b.push(mode);
        }
    }

    /// Which class a mode char belongs to, if any.
    pub fn class_of(&self, mode: char) -> Option<ModeClass> {
        if self.a.contains(mode) {
            Some(ModeClass::List)
        } else if self.b.contains(mode) {
            Some(ModeClass::AlwaysParam)
        } else if self.c.contains(mode) {
            Some(ModeClass::SetParam)
        } else if self.d.contains(mode) {
            Some(ModeClass::Flag)
        } else {
            None
        }
    }
}

/// Parameter class of a channel mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeClass {
    /// Class a: list mode, parameter on both set and unset.
    List,
    /// Class b: parameter on both set and unset, single value.
    AlwaysParam,
    /// Class c: parameter only when set.
    SetParam,
    /// Class d: never a parameter.
    Flag,
}

/// Channel-related ISUPPORT values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSupport {
    /// Channel sigils the server accepts (`CHANTYPES`).
    pub types: String,
    /// Maximum channel name length (`CHANNELLEN`).
    pub length: usize,
    /// Per-sigil join limits (`CHANLIMIT`).
    pub limit: HashMap<char, usize>,
    /// Per-sigil id lengths for `!`-style channels (`IDCHAN`).
    pub idlength: HashMap<char, usize>,
    /// Mode chars split into the four parameter classes (`CHANMODES`).
    pub modes: ChanModeClasses,
}

impl Default for ChannelSupport {
    fn default() -> Self {
        Self {
            types: "&#".to_owned(),
            length: 200,
            limit: HashMap::new(),
            idlength: HashMap::new(),
            modes: ChanModeClasses::default(),
        }
    }
}

/// The server dialect negotiated via 005 numerics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IrcSupported {
    /// Channel-related values.
    pub channel: ChannelSupport,
    /// Maximum KICK reason length (`KICKLEN`).
    pub kicklength: usize,
    /// Per-mode list size limits (`MAXLIST`).
    pub maxlist: HashMap<char, usize>,
    /// Per-command target limits (`TARGMAX`); `None` means unlimited.
    pub maxtargets: HashMap<String, Option<usize>>,
    /// Variable modes per MODE command (`MODES`).
    pub modes: usize,
    /// Maximum nickname length (`NICKLEN`).
    pub nicklength: usize,
    /// Maximum topic length (`TOPICLEN`).
    pub topiclength: usize,
    /// User mode chars advertised via `PREFIX`.
    pub usermodes: String,
    /// The same mode chars ordered most-powerful first.
    pub usermodepriority: String,
    /// Nick/channel comparison rule (`CASEMAPPING`).
    pub casemapping: CaseMapping,
    /// Unrecognized tokens, deduplicated, in arrival order.
    pub extra: Vec<String>,
}

impl Default for IrcSupported {
    fn default() -> Self {
        Self {
            channel: ChannelSupport::default(),
            kicklength: 0,
            maxlist: HashMap::new(),
            maxtargets: HashMap::new(),
            modes: 3,
            nicklength: 9,
            topiclength: 0,
            usermodes: String::new(),
            usermodepriority: String::new(),
            casemapping: CaseMapping::Ascii,
            extra: Vec::new(),
        }
    }
}

impl IrcSupported {
    /// Record an unknown token once.
    pub fn push_extra(&mut self, token: &str) {
        if !self.extra.iter().any(|t| t == token) {
            self.extra.push(token.to_owned());
        }
    }
}

/// A parsed `PREFIX=(modes)prefixes` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    /// Mode letters, most powerful first (e.g. `ov`).
    pub modes: &'a str,
    /// Prefix sigils in the same order (e.g. `@+`).
    pub prefixes: &'a str,
}

impl<'a> PrefixSpec<'a> {
    /// Parse a PREFIX value. Returns `None` when the bijection is
    /// malformed or the two halves disagree in length.
    pub fn parse(s: &'a str) -> Option<Self> {
        let open = s.find('(')?;
        let close = s[open + 1..].find(')')? + open + 1;
        let modes = &s[open + 1..close];
        let prefixes = &s[close + 1..];
        if modes.is_empty() || modes.chars().count() != prefixes.chars().count() {
            return None;
        }
        Some(PrefixSpec { modes, prefixes })
    }

    /// Iterate `(mode, prefix)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (char, char)> + 'a {
        self.modes.chars().zip(self.prefixes.chars())
    }
}

/// Parse a `pfx:n[,pfx:n...]` value into a char-keyed limit map.
///
/// Used by CHANLIMIT, MAXLIST, and IDCHAN. A group like `be:100` fans
/// out to every listed char.
pub fn parse_char_limits(value: &str, into: &mut HashMap<char, usize>) {
    for part in value.split(',') {
        let Some((chars, limit)) = part.split_once(':') else {
            continue;
        };
        let Ok(limit) = limit.parse::<usize>() else {
            continue;
        };
        for c in chars.chars() {
            into.insert(c, limit);
        }
    }
}

/// Parse a `TARGMAX=cmd:n,cmd:,...` value.
///
/// A missing number means the command is unlimited.
pub fn parse_targmax(value: &str, into: &mut HashMap<String, Option<usize>>) {
    for part in value.split(',') {
        if part.is_empty() {
            continue;
        }
        let (cmd, num) = match part.split_once(':') {
            Some((cmd, num)) => (cmd, num.parse::<usize>().ok()),
            None => (part, None),
        };
        if !cmd.is_empty() {
            into.insert(cmd.to_owned(), num);
        }
    }
}
