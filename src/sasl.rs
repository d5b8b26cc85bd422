//! SASL credential encoding.
//!
//! During CAP negotiation the session engine answers an `AUTHENTICATE +`
//! challenge with a payload built here. Two mechanisms are driveable:
//!
//! - **PLAIN** packs the account name (twice, as authzid and authcid)
//!   and the password into one NUL-separated, base64-encoded payload
//!   (RFC 4616).
//! - **EXTERNAL** sends the bare `+` marker and lets the TLS client
//!   certificate carry the identity.
//!
//! # Reference
//! - IRCv3 SASL: <https://ircv3.net/specs/extensions/sasl-3.2>
//! - RFC 4616 (PLAIN): <https://tools.ietf.org/html/rfc4616>

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Longest AUTHENTICATE argument the protocol allows on one line.
///
/// A payload beyond this length continues across further AUTHENTICATE
/// commands.
pub const SASL_CHUNK_SIZE: usize = 400;

/// SASL authentication mechanisms.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SaslMechanism {
    /// Account name and password in one payload (RFC 4616).
    Plain,
    /// Identity taken from the TLS client certificate.
    External,
    /// A mechanism this engine cannot drive.
    Unknown(String),
}

impl SaslMechanism {
    /// Parse a mechanism name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "PLAIN" => Self::Plain,
            "EXTERNAL" => Self::External,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Canonical (uppercase) mechanism name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain => "PLAIN",
            Self::External => "EXTERNAL",
            Self::Unknown(s) => s,
        }
    }

    /// Whether the session engine can answer challenges for this
    /// mechanism.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Plain | Self::External)
    }
}

impl std::fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the PLAIN response: `authzid NUL authcid NUL password`, with
/// the account name standing in for both identities, base64-encoded.
pub fn encode_plain(username: &str, password: &str) -> String {
    let payload = format!("{}\0{}\0{}", username, username, password);
    BASE64.encode(payload.as_bytes())
}

/// Build the EXTERNAL response.
///
/// The certificate already names us, so the body is the empty marker.
pub fn encode_external() -> String {
    "+".to_owned()
}

/// Break an encoded payload into AUTHENTICATE-sized pieces.
pub fn chunk_response(encoded: &str) -> impl Iterator<Item = &str> {
    encoded.as_bytes().chunks(SASL_CHUNK_SIZE).map(|chunk| {
        // base64 output is ASCII, so any byte split lands on a char
        // boundary
        std::str::from_utf8(chunk).unwrap()
    })
}
