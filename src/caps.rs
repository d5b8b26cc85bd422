//! IRCv3 capability negotiation tracking.
//!
//! Accumulates multi-line `CAP LS` / `CAP ACK` responses, normalizes the
//! `sasl=METHOD[,METHOD...]` token into the `sasl` capability plus its
//! method set, and reports negotiation readiness to the session engine.
//!
//! # Reference
//! - IRCv3 Capability Negotiation: <https://ircv3.net/specs/extensions/capability-negotiation>

use crate::message::Message;

/// Readiness transitions reported by [`CapabilityTracker::handle`].
///
/// Each fires at most once per connection: `ServerCapsReady` when the
/// final `CAP LS` chunk lands, `UserCapsReady` on the first `CAP ACK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapUpdate {
    /// Nothing newly ready.
    None,
    /// The server's advertised capability list is complete.
    ServerCapsReady,
    /// The server acknowledged our requested capabilities.
    UserCapsReady,
}

/// Serializable snapshot of negotiated capabilities.
///
/// Four plain string lists so an embedder can persist negotiation state
/// across process restarts and rebuild a client on a reused socket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapSnapshot {
    /// Capabilities the server advertised.
    pub server_caps: Vec<String>,
    /// SASL methods the server advertised.
    pub server_sasl_methods: Vec<String>,
    /// Capabilities acknowledged for this client.
    pub user_caps: Vec<String>,
    /// SASL methods in effect for this client.
    pub user_sasl_methods: Vec<String>,
}

/// Tracks CAP negotiation state for one connection.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapabilityTracker {
    snapshot: CapSnapshot,
    server_ready: bool,
    user_ready: bool,
}

impl CapabilityTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from a persisted snapshot.
    ///
    /// Readiness is re-derived from the lists: a snapshot with server
    /// caps is past LS, one with user caps is past ACK.
    pub fn from_snapshot(snapshot: CapSnapshot) -> Self {
        let server_ready = !snapshot.server_caps.is_empty();
        let user_ready = !snapshot.user_caps.is_empty();
        Self {
            snapshot,
            server_ready,
            user_ready,
        }
    }

    /// Current negotiation state, for persisting.
    pub fn snapshot(&self) -> &CapSnapshot {
        &self.snapshot
    }

    /// Capabilities the server advertised.
    pub fn server_caps(&self) -> &[String] {
        &self.snapshot.server_caps
    }

    /// Capabilities acknowledged for this client.
    pub fn user_caps(&self) -> &[String] {
        &self.snapshot.user_caps
    }

    /// Process a `CAP` message, returning any readiness transition.
    pub fn handle(&mut self, msg: &Message) -> CapUpdate {
        // args: [client, subcommand, ("*",)? token list]
        let subcmd = msg.arg(1).unwrap_or("");
        let more = msg.arg(2) == Some("*");
        let tokens = if more { msg.arg(3) } else { msg.arg(2) }.unwrap_or("");

        match subcmd {
            "LS" => {
                accumulate(
                    tokens,
                    &mut self.snapshot.server_caps,
                    &mut self.snapshot.server_sasl_methods,
                );
                if !more && !self.server_ready {
                    self.server_ready = true;
                    return CapUpdate::ServerCapsReady;
                }
                CapUpdate::None
            }
            "ACK" => {
                accumulate(
                    tokens,
                    &mut self.snapshot.user_caps,
                    &mut self.snapshot.user_sasl_methods,
                );
                if !more && !self.user_ready {
                    self.user_ready = true;
                    return CapUpdate::UserCapsReady;
                }
                CapUpdate::None
            }
            _ => CapUpdate::None,
        }
    }

    /// Whether the server advertised SASL at all.
    pub fn supports_sasl(&self) -> bool {
        self.snapshot.server_caps.iter().any(|c| c == "sasl")
    }

    /// Whether the server supports a specific SASL method.
    ///
    /// Some servers advertise bare `sasl` with no method list; for those,
    /// `allow_no_methods` decides the answer.
    pub fn supports_sasl_method(&self, method: &str, allow_no_methods: bool) -> bool {
        if !self.supports_sasl() {
            return false;
        }
        if self.snapshot.server_sasl_methods.is_empty() {
            return allow_no_methods;
        }
        self.snapshot
            .server_sasl_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Fold a space-separated token list into a cap list and sasl method set.
fn accumulate(tokens: &str, caps: &mut Vec<String>, sasl_methods: &mut Vec<String>) {
    for token in tokens.split_whitespace() {
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };

        if name == "sasl" {
            if let Some(methods) = value {
                for m in methods.split(',').filter(|m| !m.is_empty()) {
                    let m = m.to_ascii_uppercase();
                    if !sasl_methods.contains(&m) {
                        sasl_methods.push(m);
                    }
                }
            }
        }

        if !caps.iter().any(|c| c == name) {
            caps.push(name.to_owned());
        }
    }
}
