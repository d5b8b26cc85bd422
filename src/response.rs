//! IRC numeric response codes and their canonical names.
//!
//! Servers report command results as three-digit numerics. The parser
//! aliases the numerics it understands to canonical lowercase names
//! (`001` → `rpl_welcome`) so dispatch and event payloads never deal in
//! bare digits.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

/// Classification of a command token.
///
/// Numerics in 200-399 are replies, 400-599 are errors; everything else
/// (including named commands) is normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// Named command or an informational numeric.
    #[default]
    Normal,
    /// Command reply numeric (2xx/3xx).
    Reply,
    /// Error numeric (4xx/5xx).
    Error,
}

impl CommandKind {
    /// Classify a raw command token.
    pub fn of(raw: &str) -> Self {
        match raw.as_bytes().first().copied() {
            Some(b'2' | b'3') if is_numeric(raw) => Self::Reply,
            Some(b'4' | b'5') if is_numeric(raw) => Self::Error,
            _ => Self::Normal,
        }
    }
}

fn is_numeric(raw: &str) -> bool {
    raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric response codes the engine gives canonical names to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
#[non_exhaustive]
pub enum Numeric {
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,

    /// 276 - WHOIS certificate fingerprint
    RPL_WHOISCERTFP = 276,
    /// 301 - User is away
    RPL_AWAY = 301,
    /// 311 - WHOIS user info
    RPL_WHOISUSER = 311,
    /// 312 - WHOIS server info
    RPL_WHOISSERVER = 312,
    /// 313 - WHOIS operator flag
    RPL_WHOISOPERATOR = 313,
    /// 317 - WHOIS idle time
    RPL_WHOISIDLE = 317,
    /// 318 - End of WHOIS
    RPL_ENDOFWHOIS = 318,
    /// 319 - WHOIS channel list
    RPL_WHOISCHANNELS = 319,
    /// 321 - LIST header
    RPL_LISTSTART = 321,
    /// 322 - LIST entry
    RPL_LIST = 322,
    /// 323 - End of LIST
    RPL_LISTEND = 323,
    /// 324 - Channel mode string
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time
    RPL_CREATIONTIME = 329,
    /// 330 - WHOIS logged-in account
    RPL_WHOISACCOUNT = 330,
    /// 331 - No topic set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Topic author and timestamp
    RPL_TOPICWHOTIME = 333,
    /// 338 - WHOIS actual host
    RPL_WHOISACTUALLY = 338,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,

    /// 422 - No MOTD available
    ERR_NOMOTD = 422,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname already in use
    ERR_NICKNAMEINUSE = 433,
    /// 437 - Nick/channel temporarily unavailable
    ERR_UNAVAILRESOURCE = 437,

    /// 671 - WHOIS secure connection
    RPL_WHOISSECURE = 671,

    /// 900 - SASL logged in
    RPL_LOGGEDIN = 900,
    /// 901 - SASL logged out
    RPL_LOGGEDOUT = 901,
    /// 903 - SASL authentication successful
    RPL_SASLSUCCESS = 903,
    /// 904 - SASL authentication failed
    ERR_SASLFAIL = 904,
    /// 905 - SASL message too long
    ERR_SASLTOOLONG = 905,
    /// 906 - SASL aborted
    ERR_SASLABORTED = 906,
    /// 907 - SASL already authenticated
    ERR_SASLALREADY = 907,
}

impl Numeric {
    /// Look up a numeric from its three-digit wire form.
    pub fn from_code(code: u16) -> Option<Self> {
        use Numeric::*;
        Some(match code {
            1 => RPL_WELCOME,
            2 => RPL_YOURHOST,
            3 => RPL_CREATED,
            4 => RPL_MYINFO,
            5 => RPL_ISUPPORT,
            276 => RPL_WHOISCERTFP,
            301 => RPL_AWAY,
            311 => RPL_WHOISUSER,
            312 => RPL_WHOISSERVER,
            313 => RPL_WHOISOPERATOR,
            317 => RPL_WHOISIDLE,
            318 => RPL_ENDOFWHOIS,
            319 => RPL_WHOISCHANNELS,
            321 => RPL_LISTSTART,
            322 => RPL_LIST,
            323 => RPL_LISTEND,
            324 => RPL_CHANNELMODEIS,
            329 => RPL_CREATIONTIME,
            330 => RPL_WHOISACCOUNT,
            331 => RPL_NOTOPIC,
            332 => RPL_TOPIC,
            333 => RPL_TOPICWHOTIME,
            338 => RPL_WHOISACTUALLY,
            353 => RPL_NAMREPLY,
            366 => RPL_ENDOFNAMES,
            372 => RPL_MOTD,
            375 => RPL_MOTDSTART,
            376 => RPL_ENDOFMOTD,
            422 => ERR_NOMOTD,
            432 => ERR_ERRONEUSNICKNAME,
            433 => ERR_NICKNAMEINUSE,
            437 => ERR_UNAVAILRESOURCE,
            671 => RPL_WHOISSECURE,
            900 => RPL_LOGGEDIN,
            901 => RPL_LOGGEDOUT,
            903 => RPL_SASLSUCCESS,
            904 => ERR_SASLFAIL,
            905 => ERR_SASLTOOLONG,
            906 => ERR_SASLABORTED,
            907 => ERR_SASLALREADY,
            _ => return None,
        })
    }

    /// Canonical lowercase name (`rpl_welcome`, `err_nomotd`, ...).
    pub fn name(&self) -> &'static str {
        use Numeric::*;
        match self {
            RPL_WELCOME => "rpl_welcome",
            RPL_YOURHOST => "rpl_yourhost",
            RPL_CREATED => "rpl_created",
            RPL_MYINFO => "rpl_myinfo",
            RPL_ISUPPORT => "rpl_isupport",
            RPL_WHOISCERTFP => "rpl_whoiscertfp",
            RPL_AWAY => "rpl_away",
            RPL_WHOISUSER => "rpl_whoisuser",
            RPL_WHOISSERVER => "rpl_whoisserver",
            RPL_WHOISOPERATOR => "rpl_whoisoperator",
            RPL_WHOISIDLE => "rpl_whoisidle",
            RPL_ENDOFWHOIS => "rpl_endofwhois",
            RPL_WHOISCHANNELS => "rpl_whoischannels",
            RPL_LISTSTART => "rpl_liststart",
            RPL_LIST => "rpl_list",
            RPL_LISTEND => "rpl_listend",
            RPL_CHANNELMODEIS => "rpl_channelmodeis",
            RPL_CREATIONTIME => "rpl_creationtime",
            RPL_WHOISACCOUNT => "rpl_whoisaccount",
            RPL_NOTOPIC => "rpl_notopic",
            RPL_TOPIC => "rpl_topic",
            RPL_TOPICWHOTIME => "rpl_topicwhotime",
            RPL_WHOISACTUALLY => "rpl_whoisactually",
            RPL_NAMREPLY => "rpl_namreply",
            RPL_ENDOFNAMES => "rpl_endofnames",
            RPL_MOTD => "rpl_motd",
            RPL_MOTDSTART => "rpl_motdstart",
            RPL_ENDOFMOTD => "rpl_endofmotd",
            ERR_NOMOTD => "err_nomotd",
            ERR_ERRONEUSNICKNAME => "err_erroneusnickname",
            ERR_NICKNAMEINUSE => "err_nicknameinuse",
            ERR_UNAVAILRESOURCE => "err_unavailresource",
            RPL_WHOISSECURE => "rpl_whoissecure",
            RPL_LOGGEDIN => "rpl_loggedin",
            RPL_LOGGEDOUT => "rpl_loggedout",
            RPL_SASLSUCCESS => "rpl_saslsuccess",
            ERR_SASLFAIL => "err_saslfail",
            ERR_SASLTOOLONG => "err_sasltoolong",
            ERR_SASLABORTED => "err_saslaborted",
            ERR_SASLALREADY => "err_saslalready",
        }
    }

    /// Alias a raw command token to its canonical name.
    ///
    /// Unknown numerics and named commands pass through unchanged.
    pub fn alias(raw: &str) -> Option<&'static str> {
        if !is_numeric(raw) {
            return None;
        }
        raw.parse::<u16>()
            .ok()
            .and_then(Self::from_code)
            .map(|n| n.name())
    }
}
