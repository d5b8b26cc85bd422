//! # skua
//!
//! A stateful IRC client protocol engine for bots and bridges.
//!
//! One [`Client`] manages one connection: it drives registration (IRCv3
//! `CAP` negotiation, SASL PLAIN/EXTERNAL, nick-collision recovery),
//! tracks the channels it is in and their member prefixes under the
//! server's ISUPPORT rules, splits outgoing messages against the
//! 512-byte line budget, and publishes a strongly-typed stream of
//! events. Session state is a plain value that can be persisted and
//! handed to a new client to resume over a reused socket.
//!
//! ## Features
//!
//! - Wire-line parsing with numeric aliasing and color stripping
//! - IRCv3 capability negotiation (CAP 302) and SASL PLAIN/EXTERNAL
//! - ISUPPORT (005) tracking: casemapping, PREFIX, CHANMODES classes
//! - Channel/user state deltas for JOIN/PART/KICK/QUIT/NICK/MODE/NAMES
//! - Grapheme-safe outbound message splitting
//! - Flood-protected, strictly ordered send pipeline
//! - Reconnect policy with idle-timeout detection
//!
//! ## Quick Start
//!
//! ```no_run
//! use skua::{Client, Config, EventKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::new("irc.libera.chat", "skuabot");
//! config.channels = vec!["#skua".to_owned()];
//!
//! let mut client = Client::new(config)?;
//! let handle = client.handle();
//! let (_id, mut messages) = client.subscribe(Some(EventKind::Message));
//!
//! tokio::spawn(client.run());
//!
//! while let Some(event) = messages.recv().await {
//!     if let skua::Event::Message { channel, text, .. } = event {
//!         if text.contains("ping") {
//!             handle.say(&channel, "pong");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod caps;
pub mod casemap;
pub mod client;
pub mod colors;
pub mod config;
pub mod conn;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod isupport;
pub mod line;
pub mod message;
pub mod pipeline;
pub mod response;
pub mod sasl;
pub mod session;
pub mod split;
pub mod state;
mod track;

pub use self::caps::{CapSnapshot, CapabilityTracker};
pub use self::casemap::CaseMapping;
pub use self::client::{Client, Handle};
pub use self::colors::FormattedStringExt;
pub use self::config::{AddrFamily, Config, WebIrc};
pub use self::conn::IrcStream;
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::event::{ChannelListItem, Event, EventKind, SubscriptionId};
pub use self::isupport::{ChanModeClasses, IrcSupported, ModeClass, PrefixSpec};
pub use self::message::Message;
pub use self::response::{CommandKind, Numeric};
pub use self::sasl::SaslMechanism;
pub use self::session::{Action, Session};
pub use self::split::{effective_budget, split_line, split_text};
pub use self::state::{ChanData, ClientState, StateSink, WhoisResponse};
