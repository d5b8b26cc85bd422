//! Connection and behavior options.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::sasl::SaslMechanism;

/// Minimum useful inter-send delay for flood protection.
pub const MIN_FLOOD_DELAY: Duration = Duration::from_millis(33);

/// Socket inactivity timeout; its expiry is treated like a close.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(180);

/// Address family preference for connecting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddrFamily {
    /// Use whatever resolution returns first.
    #[default]
    Any,
    /// IPv4 only.
    V4,
    /// IPv6 only.
    V6,
}

/// WEBIRC gateway credentials, sent before registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebIrc {
    /// Gateway password.
    pub pass: String,
    /// Gateway username.
    pub user: String,
    /// The proxied client's real IP.
    pub ip: String,
    /// The proxied client's hostname; the IP is used when absent.
    pub host: Option<String>,
}

/// Callback computing the next nick after a collision.
///
/// Receives the configured nick, the collision counter (1 on the first
/// conflict), and the effective maximum length.
pub type NickConflictFn = dyn FnMut(&str, u32, usize) -> String + Send + Sync;

/// Options for one client instance.
pub struct Config {
    /// Server hostname or address.
    pub server: String,
    /// Desired nickname.
    pub nick: String,
    /// Server port.
    pub port: u16,
    /// Address family restriction.
    pub family: AddrFamily,
    /// Local address to bind.
    pub local_address: Option<IpAddr>,
    /// Local port to bind.
    pub local_port: Option<u16>,
    /// Connect over TLS.
    pub secure: bool,
    /// Tolerate self-signed certificates.
    pub self_signed: bool,
    /// Tolerate expired certificates.
    pub cert_expired: bool,
    /// Shuffle resolved addresses to spread load across round-robin
    /// DNS records.
    pub bust_rfc3484: bool,
    /// Server password (PASS), skipped when SASL authenticates instead.
    pub password: Option<String>,
    /// Username (ident) for USER.
    pub user_name: String,
    /// Real name (GECOS) for USER.
    pub real_name: String,
    /// Channels to join once the MOTD completes.
    pub channels: Vec<String>,
    /// Rejoin a channel after being kicked from it.
    pub auto_rejoin: bool,
    /// Reconnect attempts before giving up; `None` is unbounded.
    pub retry_count: Option<u32>,
    /// Delay between reconnect attempts.
    pub retry_delay: Duration,
    /// Enforce a minimum delay between outbound lines.
    pub flood_protection: bool,
    /// The inter-send delay when flood protection is on.
    pub flood_protection_delay: Duration,
    /// Authenticate via SASL during CAP negotiation.
    pub sasl: bool,
    /// SASL mechanism to use.
    pub sasl_type: SaslMechanism,
    /// Extra capabilities to request beyond what SASL needs.
    pub request_caps: Vec<String>,
    /// Strip mIRC color/style codes from inbound messages.
    pub strip_colors: bool,
    /// Channel sigils assumed before ISUPPORT arrives.
    pub channel_prefixes: String,
    /// Ceiling for outbound message splitting, in bytes.
    pub message_split: usize,
    /// Target encoding; enables inbound charset detection.
    pub encoding: Option<String>,
    /// Charset used to decode inbound bytes that are not valid UTF-8.
    pub encoding_fallback: Option<String>,
    /// Custom nick-collision strategy.
    pub on_nick_conflict: Option<Box<NickConflictFn>>,
    /// WEBIRC gateway credentials.
    pub webirc: Option<WebIrc>,
    /// Time allowed for the socket to connect.
    pub connection_timeout: Duration,
    /// QUIT message used by `disconnect`.
    pub quit_message: String,
}

impl Config {
    /// Options for `nick` on `server`, defaults everywhere else.
    pub fn new(server: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            nick: nick.into(),
            port: 6667,
            family: AddrFamily::Any,
            local_address: None,
            local_port: None,
            secure: false,
            self_signed: false,
            cert_expired: false,
            bust_rfc3484: false,
            password: None,
            user_name: "nodebot".to_owned(),
            real_name: "nodeJS IRC client".to_owned(),
            channels: Vec::new(),
            auto_rejoin: false,
            retry_count: None,
            retry_delay: Duration::from_secs(2),
            flood_protection: false,
            flood_protection_delay: Duration::from_secs(1),
            sasl: false,
            sasl_type: SaslMechanism::Plain,
            request_caps: Vec::new(),
            strip_colors: false,
            channel_prefixes: "&#".to_owned(),
            message_split: 512,
            encoding: None,
            encoding_fallback: None,
            on_nick_conflict: None,
            webirc: None,
            connection_timeout: Duration::from_secs(10),
            quit_message: "node-irc says goodbye".to_owned(),
        }
    }

    /// Flood delay clamped to the practical minimum.
    pub fn flood_delay(&self) -> Duration {
        self.flood_protection_delay.max(MIN_FLOOD_DELAY)
    }

    /// Capabilities to put in `CAP REQ`, with `sasl` added when SASL is
    /// configured.
    pub fn requested_caps(&self) -> Vec<String> {
        let mut caps = self.request_caps.clone();
        if self.sasl && !caps.iter().any(|c| c == "sasl") {
            caps.push("sasl".to_owned());
        }
        caps
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("nick", &self.nick)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("sasl", &self.sasl)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
