//! Typed events and the subscription bus.
//!
//! Everything the engine observes is published as an [`Event`]. Embedders
//! subscribe with an optional kind filter and an optional channel filter;
//! channel filters compare under the session's case mapping, so a
//! subscription to `#Chan` also sees events for `#chan`. One-shot
//! subscriptions detach themselves after the first delivery.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::casemap::CaseMapping;
use crate::ctcp::CtcpKind;
use crate::message::Message;
use crate::state::WhoisResponse;

/// One entry of a LIST (322) reply.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelListItem {
    /// Channel name.
    pub name: String,
    /// Visible user count.
    pub users: usize,
    /// Channel topic.
    pub topic: String,
}

/// Events published by the client engine.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Event {
    /// Registration completed (001 received).
    Registered {
        /// The welcome message.
        message: Message,
    },
    /// The socket connected (before registration).
    Connect,
    /// Reconnect policy gave up; carries the retry count reached.
    Abort {
        /// Attempts made before giving up (0 for unowned sockets).
        retries: u32,
    },
    /// The server sent an error numeric.
    Error {
        /// The offending message.
        message: Message,
    },
    /// A socket-level error.
    NetError {
        /// Error description.
        error: String,
    },

    /// NOTICE to a channel or to us.
    Notice {
        /// Sender nick, when the notice came from a user.
        from: Option<String>,
        /// Notice target.
        target: String,
        /// Notice text.
        text: String,
    },
    /// PRIVMSG to a channel.
    Message {
        /// Sender nick.
        from: String,
        /// Channel the message went to.
        channel: String,
        /// Message text.
        text: String,
    },
    /// PRIVMSG directly to us.
    Pm {
        /// Sender nick.
        from: String,
        /// Message text.
        text: String,
    },
    /// CTCP ACTION (`/me`).
    Action {
        /// Sender nick.
        from: String,
        /// Channel or our nick.
        target: String,
        /// Action text.
        text: String,
    },
    /// Any CTCP request or reply.
    Ctcp {
        /// Sender nick.
        from: String,
        /// Target of the enclosing PRIVMSG/NOTICE.
        target: String,
        /// CTCP command kind.
        kind: CtcpKind,
        /// Full CTCP body (command and parameters).
        text: String,
    },
    /// CTCP VERSION request over PRIVMSG.
    CtcpVersion {
        /// Sender nick.
        from: String,
        /// Target of the request.
        target: String,
    },
    /// Echo of a message we sent (emitted by `say`/`notice`/`action`).
    SelfMessage {
        /// Target we sent to.
        target: String,
        /// Text sent.
        text: String,
    },

    /// A user (possibly us) joined a channel.
    Join {
        /// Channel joined.
        channel: String,
        /// Joining nick.
        nick: String,
    },
    /// A user left a channel.
    Part {
        /// Channel parted.
        channel: String,
        /// Parting nick.
        nick: String,
        /// Part reason.
        reason: Option<String>,
    },
    /// A user was kicked from a channel.
    Kick {
        /// Channel.
        channel: String,
        /// Kicked nick.
        nick: String,
        /// Kicker nick.
        by: String,
        /// Kick reason.
        reason: Option<String>,
    },
    /// A user was killed from the network.
    Kill {
        /// Killed nick.
        nick: String,
        /// Kill reason.
        reason: Option<String>,
        /// Channels the nick was seen in.
        channels: Vec<String>,
    },
    /// A user quit the network.
    Quit {
        /// Quitting nick.
        nick: String,
        /// Quit reason.
        reason: Option<String>,
        /// Channels the nick was seen in.
        channels: Vec<String>,
    },
    /// A user changed nick.
    Nick {
        /// Previous nick.
        old: String,
        /// New nick.
        new: String,
        /// Channels the nick was seen in.
        channels: Vec<String>,
    },
    /// We were invited to a channel.
    Invite {
        /// Channel invited to.
        channel: String,
        /// Inviting nick.
        from: String,
    },
    /// Channel topic set or announced.
    Topic {
        /// Channel.
        channel: String,
        /// Topic text.
        topic: String,
        /// Who set it, when known.
        by: Option<String>,
    },
    /// NAMES listing completed for a channel.
    Names {
        /// Channel.
        channel: String,
        /// nick → prefix string (e.g. `"@+"`).
        users: HashMap<String, String>,
    },

    /// A channel mode was set.
    ModeAdd {
        /// Channel.
        channel: String,
        /// Who set it.
        by: Option<String>,
        /// Mode char.
        mode: char,
        /// Mode parameter, when the class takes one.
        param: Option<String>,
    },
    /// A channel mode was unset.
    ModeRemove {
        /// Channel.
        channel: String,
        /// Who unset it.
        by: Option<String>,
        /// Mode char.
        mode: char,
        /// Mode parameter, when the class takes one.
        param: Option<String>,
    },
    /// Reply to a MODE query (324).
    ModeIs {
        /// Channel.
        channel: String,
        /// Current mode string.
        mode: String,
    },

    /// MOTD completed (or the server reported none).
    Motd {
        /// Accumulated MOTD text, newline-joined.
        motd: String,
    },

    /// LIST started (321).
    ChannelListStart,
    /// One LIST entry (322).
    ChannelListItem {
        /// The entry.
        item: ChannelListItem,
    },
    /// LIST completed (323); all accumulated entries.
    ChannelList {
        /// All entries seen.
        items: Vec<ChannelListItem>,
    },

    /// WHOIS completed for a nick (318).
    Whois {
        /// Accumulated WHOIS data.
        whois: WhoisResponse,
    },

    /// An ISUPPORT (005) line was applied.
    Isupport,

    /// SASL authentication succeeded (900).
    SaslLoggedIn {
        /// Account name reported by the server.
        account: Option<String>,
    },
    /// SASL session logged out (901).
    SaslLoggedOut,
    /// SASL failed (904/905/906/907).
    SaslError {
        /// Canonical numeric name (e.g. `err_saslfail`).
        kind: String,
        /// The failure message.
        message: Message,
    },

    /// Server PING (answered automatically).
    Ping {
        /// Ping token.
        server: String,
    },
    /// Server PONG.
    Pong {
        /// Pong token.
        server: String,
    },

    /// Every parsed inbound line.
    Raw {
        /// The parsed message.
        message: Message,
    },
}

/// Fieldless discriminant of [`Event`], used for subscription filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EventKind {
    /// [`Event::Registered`]
    Registered,
    /// [`Event::Connect`]
    Connect,
    /// [`Event::Abort`]
    Abort,
    /// [`Event::Error`]
    Error,
    /// [`Event::NetError`]
    NetError,
    /// [`Event::Notice`]
    Notice,
    /// [`Event::Message`]
    Message,
    /// [`Event::Pm`]
    Pm,
    /// [`Event::Action`]
    Action,
    /// [`Event::Ctcp`]
    Ctcp,
    /// [`Event::CtcpVersion`]
    CtcpVersion,
    /// [`Event::SelfMessage`]
    SelfMessage,
    /// [`Event::Join`]
    Join,
    /// [`Event::Part`]
    Part,
    /// [`Event::Kick`]
    Kick,
    /// [`Event::Kill`]
    Kill,
    /// [`Event::Quit`]
    Quit,
    /// [`Event::Nick`]
    Nick,
    /// [`Event::Invite`]
    Invite,
    /// [`Event::Topic`]
    Topic,
    /// [`Event::Names`]
    Names,
    /// [`Event::ModeAdd`]
    ModeAdd,
    /// [`Event::ModeRemove`]
    ModeRemove,
    /// [`Event::ModeIs`]
    ModeIs,
    /// [`Event::Motd`]
    Motd,
    /// [`Event::ChannelListStart`]
    ChannelListStart,
    /// [`Event::ChannelListItem`]
    ChannelListItem,
    /// [`Event::ChannelList`]
    ChannelList,
    /// [`Event::Whois`]
    Whois,
    /// [`Event::Isupport`]
    Isupport,
    /// [`Event::SaslLoggedIn`]
    SaslLoggedIn,
    /// [`Event::SaslLoggedOut`]
    SaslLoggedOut,
    /// [`Event::SaslError`]
    SaslError,
    /// [`Event::Ping`]
    Ping,
    /// [`Event::Pong`]
    Pong,
    /// [`Event::Raw`]
    Raw,
}

impl Event {
    /// The discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Registered { .. } => EventKind::Registered,
            Event::Connect => EventKind::Connect,
            Event::Abort { .. } => EventKind::Abort,
            Event::Error { .. } => EventKind::Error,
            Event::NetError { .. } => EventKind::NetError,
            Event::Notice { .. } => EventKind::Notice,
            Event::Message { .. } => EventKind::Message,
            Event::Pm { .. } => EventKind::Pm,
            Event::Action { .. } => EventKind::Action,
            Event::Ctcp { .. } => EventKind::Ctcp,
            Event::CtcpVersion { .. } => EventKind::CtcpVersion,
            Event::SelfMessage { .. } => EventKind::SelfMessage,
            Event::Join { .. } => EventKind::Join,
            Event::Part { .. } => EventKind::Part,
            Event::Kick { .. } => EventKind::Kick,
            Event::Kill { .. } => EventKind::Kill,
            Event::Quit { .. } => EventKind::Quit,
            Event::Nick { .. } => EventKind::Nick,
            Event::Invite { .. } => EventKind::Invite,
            Event::Topic { .. } => EventKind::Topic,
            Event::Names { .. } => EventKind::Names,
            Event::ModeAdd { .. } => EventKind::ModeAdd,
            Event::ModeRemove { .. } => EventKind::ModeRemove,
            Event::ModeIs { .. } => EventKind::ModeIs,
            Event::Motd { .. } => EventKind::Motd,
            Event::ChannelListStart => EventKind::ChannelListStart,
            Event::ChannelListItem { .. } => EventKind::ChannelListItem,
            Event::ChannelList { .. } => EventKind::ChannelList,
            Event::Whois { .. } => EventKind::Whois,
            Event::Isupport => EventKind::Isupport,
            Event::SaslLoggedIn { .. } => EventKind::SaslLoggedIn,
            Event::SaslLoggedOut => EventKind::SaslLoggedOut,
            Event::SaslError { .. } => EventKind::SaslError,
            Event::Ping { .. } => EventKind::Ping,
            Event::Pong { .. } => EventKind::Pong,
            Event::Raw { .. } => EventKind::Raw,
        }
    }

    /// The channel this event concerns, for per-channel subscriptions.
    pub fn channel(&self) -> Option<&str> {
        match self {
            Event::Message { channel, .. }
            | Event::Join { channel, .. }
            | Event::Part { channel, .. }
            | Event::Kick { channel, .. }
            | Event::Invite { channel, .. }
            | Event::Topic { channel, .. }
            | Event::Names { channel, .. }
            | Event::ModeAdd { channel, .. }
            | Event::ModeRemove { channel, .. }
            | Event::ModeIs { channel, .. } => Some(channel.as_str()),
            Event::Notice { target, .. } | Event::Action { target, .. } => Some(target.as_str()),
            _ => None,
        }
    }
}

/// Handle identifying one subscription, for [`EventBus::unsubscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    channel: Option<String>,
    once: bool,
    tx: mpsc::UnboundedSender<Event>,
}

/// Fan-out of engine events to embedder subscriptions.
#[derive(Default)]
pub struct EventBus {
    subs: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events, optionally filtered by kind.
    pub fn subscribe(
        &mut self,
        kind: Option<EventKind>,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.add(kind, None, false)
    }

    /// Subscribe to one kind of event on one channel.
    pub fn subscribe_channel(
        &mut self,
        kind: EventKind,
        channel: &str,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.add(Some(kind), Some(channel.to_owned()), false)
    }

    /// Subscribe for a single delivery.
    pub fn once(
        &mut self,
        kind: EventKind,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.add(Some(kind), None, true)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subs.retain(|s| s.id != id);
    }

    fn add(
        &mut self,
        kind: Option<EventKind>,
        channel: Option<String>,
        once: bool,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subs.push(Subscription {
            id,
            kind,
            channel,
            once,
            tx,
        });
        (id, rx)
    }

    /// Deliver an event to every matching subscription.
    ///
    /// Channel filters compare under `casemap`. Closed receivers and
    /// fired one-shots are pruned.
    pub fn emit(&mut self, event: &Event, casemap: CaseMapping) {
        self.subs.retain(|sub| {
            if let Some(kind) = sub.kind {
                if kind != event.kind() {
                    return true;
                }
            }
            if let Some(ref chan) = sub.channel {
                match event.channel() {
                    Some(evchan) if casemap.eq(chan, evchan) => {}
                    _ => return true,
                }
            }

            if sub.tx.send(event.clone()).is_err() {
                return false;
            }
            !sub.once
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_filter() {
        let mut bus = EventBus::new();
        let (_, mut rx) = bus.subscribe(Some(EventKind::Connect));

        bus.emit(&Event::Connect, CaseMapping::Ascii);
        bus.emit(&Event::SaslLoggedOut, CaseMapping::Ascii);

        assert!(matches!(rx.try_recv(), Ok(Event::Connect)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_filter_casemapped() {
        let mut bus = EventBus::new();
        let (_, mut rx) = bus.subscribe_channel(EventKind::Join, "#Test[1]");

        let event = Event::Join {
            channel: "#test{1}".to_owned(),
            nick: "someone".to_owned(),
        };
        bus.emit(&event, CaseMapping::Rfc1459);
        assert!(matches!(rx.try_recv(), Ok(Event::Join { .. })));

        // Ascii mapping treats {} and [] as distinct.
        bus.emit(&event, CaseMapping::Ascii);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_once_fires_single_time() {
        let mut bus = EventBus::new();
        let (_, mut rx) = bus.once(EventKind::Connect);

        bus.emit(&Event::Connect, CaseMapping::Ascii);
        bus.emit(&Event::Connect, CaseMapping::Ascii);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let (id, mut rx) = bus.subscribe(None);
        bus.unsubscribe(id);

        bus.emit(&Event::Connect, CaseMapping::Ascii);
        assert!(rx.try_recv().is_err());
    }
}
