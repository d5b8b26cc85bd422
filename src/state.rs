//! Persistable session state.
//!
//! [`ClientState`] is the single mutable record of one session: the
//! confirmed nick, the hostmask, joined channels with their member
//! prefixes, WHOIS accumulators, negotiated capabilities, and the
//! server's ISUPPORT dialect. It may be supplied by the embedder and is
//! mutated in place; a [`StateSink`] hook is invoked after each coherent
//! batch of changes so a second client can be constructed over the same
//! connection and state to resume mid-session.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use crate::caps::CapabilityTracker;
use crate::casemap::CaseMapping;
use crate::isupport::{parse_char_limits, parse_targmax, IrcSupported, PrefixSpec};
use crate::message::Message;

/// Flush hook invoked after coherent state mutations.
///
/// Implementations typically persist the state somewhere a replacement
/// process can find it. Invocations are at-most-once per triggering
/// message; implementations may debounce further.
pub trait StateSink: Send {
    /// Persist (or otherwise observe) the current state.
    fn flush(&mut self, state: &ClientState);
}

/// Per-channel tracked data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChanData {
    /// Lowercased (casemapped) channel key.
    pub key: String,
    /// Channel name in its first-seen original case.
    pub server_name: String,
    /// nick → prefix chars (e.g. `"@+"`).
    pub users: HashMap<String, String>,
    /// Flag modes currently set (class d chars).
    pub mode: String,
    /// Mode char → ordered parameter list (lists for class-a modes).
    pub mode_params: HashMap<char, Vec<String>>,
    /// Channel topic.
    pub topic: Option<String>,
    /// Who set the topic.
    pub topic_by: Option<String>,
    /// Channel creation time (329), as reported.
    pub created: Option<String>,
}

/// Accumulating WHOIS record for one nick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhoisResponse {
    /// The nick being queried.
    pub nick: String,
    /// Username (ident).
    pub user: Option<String>,
    /// Displayed host.
    pub host: Option<String>,
    /// Real name / GECOS.
    pub realname: Option<String>,
    /// Channels the user is in, with prefixes.
    pub channels: Vec<String>,
    /// Idle seconds.
    pub idle: Option<String>,
    /// Server the user is attached to.
    pub server: Option<String>,
    /// Server description.
    pub serverinfo: Option<String>,
    /// Operator description line, when the user is an operator.
    pub operator: Option<String>,
    /// Services account name.
    pub account: Option<String>,
    /// Account description line.
    pub accountinfo: Option<String>,
    /// Actual host behind a cloak (338).
    pub real_host: Option<String>,
    /// TLS certificate fingerprint line (276).
    pub certfp: Option<String>,
    /// Away message (301).
    pub away: Option<String>,
    /// Whether the user is on a TLS connection (671).
    pub secure: bool,
}

/// The session's mutable, persistable state.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientState {
    /// Whether SASL reported us logged in.
    pub logged_in: bool,
    /// Whether registration (001) completed on the current socket.
    pub registered: bool,
    /// The server's most recent confirmation of our nick.
    pub current_nick: String,
    /// In-flight WHOIS accumulators, keyed by nick.
    pub whois_data: HashMap<String, WhoisResponse>,
    /// Counter for nick-collision suffixes.
    pub nick_mod: u32,
    /// prefix sigil → mode char (`@` → `o`).
    pub mode_for_prefix: HashMap<char, char>,
    /// mode char → prefix sigil (`o` → `@`).
    pub prefix_for_mode: HashMap<char, char>,
    /// CAP negotiation state.
    pub capabilities: CapabilityTracker,
    /// ISUPPORT dialect view.
    pub supported: IrcSupported,
    /// Our `nick!user@host` as the server sees it.
    pub host_mask: String,
    /// Joined channels, keyed by casemapped name.
    pub chans: HashMap<String, ChanData>,
    /// When the last line was written, for flood protection.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub last_send_time: Option<Instant>,
    #[cfg_attr(feature = "serde", serde(skip))]
    sink: Option<Box<dyn StateSink>>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            logged_in: false,
            registered: false,
            current_nick: String::new(),
            whois_data: HashMap::new(),
            nick_mod: 0,
            mode_for_prefix: HashMap::new(),
            prefix_for_mode: HashMap::new(),
            capabilities: CapabilityTracker::new(),
            supported: IrcSupported::default(),
            host_mask: String::new(),
            chans: HashMap::new(),
            last_send_time: None,
            sink: None,
        }
    }
}

impl fmt::Debug for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientState")
            .field("logged_in", &self.logged_in)
            .field("registered", &self.registered)
            .field("current_nick", &self.current_nick)
            .field("nick_mod", &self.nick_mod)
            .field("host_mask", &self.host_mask)
            .field("chans", &self.chans)
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

impl ClientState {
    /// Fresh state for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a flush hook.
    pub fn set_sink(&mut self, sink: Box<dyn StateSink>) {
        self.sink = Some(sink);
    }

    /// Invoke the flush hook, if any.
    pub fn flush(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.flush(self);
            self.sink = Some(sink);
        }
    }

    /// Active case mapping (from ISUPPORT).
    pub fn casemapping(&self) -> CaseMapping {
        self.supported.casemapping
    }

    /// Lowercase a channel name under the active case mapping.
    pub fn chan_key(&self, name: &str) -> String {
        self.casemapping().lower(name)
    }

    /// Look up a channel by any-case name.
    pub fn chan(&self, name: &str) -> Option<&ChanData> {
        self.chans.get(&self.chan_key(name))
    }

    /// Mutable channel lookup by any-case name.
    pub fn chan_mut(&mut self, name: &str) -> Option<&mut ChanData> {
        let key = self.chan_key(name);
        self.chans.get_mut(&key)
    }

    /// Get or create the channel record, keeping the first-seen case.
    pub fn ensure_chan(&mut self, name: &str) -> &mut ChanData {
        let key = self.chan_key(name);
        self.chans.entry(key.clone()).or_insert_with(|| ChanData {
            key,
            server_name: name.to_owned(),
            ..ChanData::default()
        })
    }

    /// Drop a channel record.
    pub fn remove_chan(&mut self, name: &str) -> Option<ChanData> {
        let key = self.chan_key(name);
        self.chans.remove(&key)
    }

    /// Get or create the WHOIS accumulator for a nick.
    pub fn whois_entry(&mut self, nick: &str) -> &mut WhoisResponse {
        self.whois_data
            .entry(nick.to_owned())
            .or_insert_with(|| WhoisResponse {
                nick: nick.to_owned(),
                ..WhoisResponse::default()
            })
    }

    /// Longest line the server will relay for us without truncation.
    pub fn max_line_length(&self) -> usize {
        497usize
            .saturating_sub(self.current_nick.len())
            .saturating_sub(self.host_mask.len())
    }

    /// Apply one ISUPPORT (005) line.
    pub fn apply_isupport(&mut self, msg: &Message) {
        let args = &msg.args;
        if args.len() < 2 {
            return;
        }
        // args[0] is our nick; the trailing "are supported by this
        // server" text is not a token.
        let end = if msg.has_trailing() {
            args.len() - 1
        } else {
            args.len()
        };

        for token in &args[1..end] {
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k, v),
                None => (token.as_str(), ""),
            };

            match key {
                "CASEMAPPING" => {
                    if let Ok(mapping) = value.parse() {
                        self.supported.casemapping = mapping;
                    }
                }
                "CHANLIMIT" => parse_char_limits(value, &mut self.supported.channel.limit),
                "CHANMODES" => self.supported.channel.modes.merge(value),
                "CHANTYPES" => self.supported.channel.types = value.to_owned(),
                "CHANNELLEN" => {
                    if let Ok(n) = value.parse() {
                        self.supported.channel.length = n;
                    }
                }
                "IDCHAN" => parse_char_limits(value, &mut self.supported.channel.idlength),
                "KICKLEN" => {
                    if let Ok(n) = value.parse() {
                        self.supported.kicklength = n;
                    }
                }
                "MAXLIST" => parse_char_limits(value, &mut self.supported.maxlist),
                "NICKLEN" => {
                    if let Ok(n) = value.parse() {
                        self.supported.nicklength = n;
                    }
                }
                "PREFIX" => {
                    if let Some(spec) = PrefixSpec::parse(value) {
                        self.supported.usermodepriority = spec.modes.to_owned();
                        self.mode_for_prefix.clear();
                        self.prefix_for_mode.clear();
                        for (mode, prefix) in spec.pairs() {
                            self.mode_for_prefix.insert(prefix, mode);
                            self.prefix_for_mode.insert(mode, prefix);
                            self.supported.channel.modes.add_param_mode(mode);
                        }
                    }
                }
                // Parsed and dropped.
                "STATUSMSG" => {}
                "TARGMAX" => parse_targmax(value, &mut self.supported.maxtargets),
                "TOPICLEN" => {
                    if let Ok(n) = value.parse() {
                        self.supported.topiclength = n;
                    }
                }
                _ => self.supported.push_extra(token),
            }
        }
    }
}
