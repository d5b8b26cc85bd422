//! The tokio client: socket ownership, reconnect policy, and the
//! embedder-facing command surface.
//!
//! [`Client`] wraps a [`Session`] with real I/O. It owns the socket it
//! opened (reconnecting per the retry policy when that socket drops) or
//! drives an externally attached stream (never reconnecting it, and
//! reporting `abort(0)` when it closes). Commands arrive through cloned
//! [`Handle`]s and writes leave through the send pipeline, so caller
//! order is preserved end to end.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::config::{Config, IDLE_TIMEOUT};
use crate::conn::{self, IrcStream};
use crate::ctcp::Ctcp;
use crate::error::Result;
use crate::event::{Event, EventBus, EventKind, SubscriptionId};
use crate::line::{EncodingShim, LineCodec};
use crate::pipeline::Pipeline;
use crate::session::{Action, Session};
use crate::split::{effective_budget, split_text};
use crate::state::ClientState;

/// Commands sent from handles to the client task.
enum Request {
    Raw(Vec<String>),
    Say { target: String, text: String },
    Notice { target: String, text: String },
    Action { target: String, text: String },
    Disconnect { message: Option<String> },
}

/// Cloneable command surface for a running [`Client`].
#[derive(Clone)]
pub struct Handle {
    tx: mpsc::UnboundedSender<Request>,
}

impl Handle {
    fn request(&self, req: Request) {
        // A dropped client means there is nobody left to write to.
        let _ = self.tx.send(req);
    }

    /// Send a raw command from parts.
    pub fn send<I, S>(&self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Request::Raw(parts.into_iter().map(Into::into).collect()));
    }

    /// Send message text to a channel or nick, split to fit the wire.
    pub fn say(&self, target: impl Into<String>, text: impl Into<String>) {
        self.request(Request::Say {
            target: target.into(),
            text: text.into(),
        });
    }

    /// Send a NOTICE, split to fit the wire.
    pub fn notice(&self, target: impl Into<String>, text: impl Into<String>) {
        self.request(Request::Notice {
            target: target.into(),
            text: text.into(),
        });
    }

    /// Send a CTCP ACTION (`/me`), split to fit the wire.
    pub fn action(&self, target: impl Into<String>, text: impl Into<String>) {
        self.request(Request::Action {
            target: target.into(),
            text: text.into(),
        });
    }

    /// Join a channel; the argument may carry a key (`"#chan key"`).
    pub fn join(&self, channel: &str) {
        let parts: Vec<String> = std::iter::once("JOIN")
            .chain(channel.split_whitespace())
            .map(str::to_owned)
            .collect();
        self.request(Request::Raw(parts));
    }

    /// Leave a channel.
    pub fn part(&self, channel: &str, message: Option<&str>) {
        let mut parts = vec!["PART".to_owned(), channel.to_owned()];
        if let Some(message) = message {
            parts.push(message.to_owned());
        }
        self.request(Request::Raw(parts));
    }

    /// Request a nick change.
    pub fn nick(&self, nick: &str) {
        self.send(["NICK", nick]);
    }

    /// Query WHOIS for a nick; the reply arrives as [`Event::Whois`].
    pub fn whois(&self, nick: &str) {
        self.send(["WHOIS", nick]);
    }

    /// Request the channel list; replies arrive as channel-list events.
    pub fn list(&self) {
        self.send(["LIST"]);
    }

    /// Send a CTCP request over PRIVMSG.
    pub fn ctcp(&self, target: &str, body: &str) {
        let framed = format!("\u{1}{}\u{1}", body);
        self.send(["PRIVMSG", target, framed.as_str()]);
    }

    /// Send QUIT and close the connection without reconnecting.
    pub fn disconnect(&self, message: Option<&str>) {
        self.request(Request::Disconnect {
            message: message.map(str::to_owned),
        });
    }
}

/// Why a drive over one socket ended.
enum DriveEnd {
    /// Peer closed or the socket failed.
    Closed,
    /// The 180-second inactivity window elapsed.
    IdleTimeout,
    /// The embedder asked to disconnect.
    Requested,
    /// A non-recoverable condition was reported by the session.
    Fatal,
}

/// One IRC connection: session engine, socket, pipeline, and event bus.
pub struct Client {
    session: Session,
    bus: EventBus,
    req_tx: mpsc::UnboundedSender<Request>,
    req_rx: mpsc::UnboundedReceiver<Request>,
    external: Option<Box<dyn IrcStream>>,
}

impl Client {
    /// Create a client with fresh state.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_state(config, ClientState::new())
    }

    /// Create a client over existing state, e.g. to resume a session
    /// persisted by a previous process.
    pub fn with_state(config: Config, state: ClientState) -> Result<Self> {
        let session = Session::new(config, state)?;
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        Ok(Self {
            session,
            bus: EventBus::new(),
            req_tx,
            req_rx,
            external: None,
        })
    }

    /// Create a client over an externally supplied, already-connected
    /// stream. The client never destroys or reconnects such a stream;
    /// when it closes, `abort(0)` is emitted.
    pub fn attach<S>(config: Config, state: ClientState, stream: S) -> Result<Self>
    where
        S: IrcStream + 'static,
    {
        let mut client = Self::with_state(config, state)?;
        client.external = Some(Box::new(stream));
        Ok(client)
    }

    /// A cloneable command handle.
    pub fn handle(&self) -> Handle {
        Handle {
            tx: self.req_tx.clone(),
        }
    }

    /// The tracked session state.
    pub fn state(&self) -> &ClientState {
        self.session.state()
    }

    /// Mutable session state, e.g. to install a flush hook.
    pub fn state_mut(&mut self) -> &mut ClientState {
        self.session.state_mut()
    }

    /// Subscribe to events, optionally filtered by kind.
    pub fn subscribe(
        &mut self,
        kind: Option<EventKind>,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.bus.subscribe(kind)
    }

    /// Subscribe to one kind of event on one channel.
    pub fn subscribe_channel(
        &mut self,
        kind: EventKind,
        channel: &str,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.bus.subscribe_channel(kind, channel)
    }

    /// Subscribe for a single delivery.
    pub fn once(&mut self, kind: EventKind) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        self.bus.once(kind)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }

    /// Drive the connection until disconnect or retry exhaustion,
    /// consuming the client. Returns the final state for reuse.
    pub async fn run(mut self) -> ClientState {
        let owned = self.external.is_none();
        let mut attempt: u32 = 0;

        loop {
            let stream = match self.external.take() {
                Some(stream) => Some(stream),
                None => match conn::open(self.session.config()).await {
                    Ok(stream) => Some(stream),
                    Err(e) => {
                        self.emit(Event::NetError {
                            error: e.to_string(),
                        });
                        None
                    }
                },
            };

            let end = match stream {
                Some(stream) => self.drive(stream).await,
                None => DriveEnd::Closed,
            };
            self.session.on_disconnected();

            match end {
                DriveEnd::Requested | DriveEnd::Fatal => break,
                DriveEnd::Closed | DriveEnd::IdleTimeout => {}
            }

            if !owned {
                self.emit(Event::Abort { retries: 0 });
                break;
            }

            attempt += 1;
            if let Some(max) = self.session.config().retry_count {
                if attempt > max {
                    self.emit(Event::Abort { retries: max });
                    break;
                }
            }
            debug!(attempt, "reconnecting");
            tokio::time::sleep(self.session.config().retry_delay).await;
        }

        self.session.into_state()
    }

    async fn drive(&mut self, stream: Box<dyn IrcStream>) -> DriveEnd {
        let cfg = self.session.config();
        let shim = EncodingShim::new(cfg.encoding.as_deref(), cfg.encoding_fallback.as_deref());
        let flood = cfg.flood_protection.then(|| cfg.flood_delay());

        let framed = Framed::new(stream, LineCodec::new(shim));
        let (sink, mut lines) = framed.split();
        let (pipeline, writer) = Pipeline::spawn(sink, flood);

        let actions = self.session.on_connected();
        let mut end = if self.apply(actions, &pipeline) {
            Some(DriveEnd::Fatal)
        } else {
            None
        };

        let idle = tokio::time::sleep(IDLE_TIMEOUT);
        tokio::pin!(idle);

        enum Tick {
            Line(Option<std::result::Result<String, crate::error::ProtocolError>>),
            Request(Option<Request>),
            Idle,
        }

        while end.is_none() {
            // Resolve the select before touching state, so the pending
            // branch futures release their borrows.
            let tick = tokio::select! {
                line = lines.next() => Tick::Line(line),
                req = self.req_rx.recv() => Tick::Request(req),
                _ = &mut idle => Tick::Idle,
            };

            match tick {
                Tick::Line(Some(Ok(line))) => {
                    idle.as_mut()
                        .reset(tokio::time::Instant::now() + IDLE_TIMEOUT);
                    let actions = self.session.feed_line(&line);
                    if self.apply(actions, &pipeline) {
                        end = Some(DriveEnd::Fatal);
                    }
                }
                Tick::Line(Some(Err(e))) => {
                    self.emit(Event::NetError {
                        error: e.to_string(),
                    });
                    end = Some(DriveEnd::Closed);
                }
                Tick::Line(None) => end = Some(DriveEnd::Closed),
                Tick::Request(Some(req)) => {
                    if self.handle_request(req, &pipeline) {
                        end = Some(DriveEnd::Requested);
                    }
                }
                // self keeps a sender, so recv cannot yield None.
                Tick::Request(None) => {}
                Tick::Idle => {
                    warn!("connection idle for {:?}", IDLE_TIMEOUT);
                    end = Some(DriveEnd::IdleTimeout);
                }
            }
        }

        // Dropping the pipeline lets the writer drain queued lines
        // (QUIT included) before closing the sink.
        drop(pipeline);
        let _ = writer.await;

        end.unwrap_or(DriveEnd::Closed)
    }

    /// Perform queued session actions. Returns true on a fatal action.
    fn apply(&mut self, actions: Vec<Action>, pipeline: &Pipeline) -> bool {
        let mut fatal = false;
        for action in actions {
            match action {
                Action::Send(parts) => {
                    self.session.state_mut().last_send_time = Some(std::time::Instant::now());
                    pipeline.send_parts(&parts);
                }
                Action::Emit(event) => self.emit(event),
                Action::Fatal(err) => {
                    self.emit(Event::NetError {
                        error: err.to_string(),
                    });
                    fatal = true;
                }
            }
        }
        fatal
    }

    /// Handle one embedder request. Returns true when the request ends
    /// the connection.
    fn handle_request(&mut self, req: Request, pipeline: &Pipeline) -> bool {
        match req {
            Request::Raw(parts) => {
                self.session.state_mut().last_send_time = Some(std::time::Instant::now());
                pipeline.send_parts(&parts);
                false
            }
            Request::Say { target, text } => {
                self.send_split(pipeline, "PRIVMSG", &target, &text, None);
                false
            }
            Request::Notice { target, text } => {
                self.send_split(pipeline, "NOTICE", &target, &text, None);
                false
            }
            Request::Action { target, text } => {
                self.send_split(pipeline, "PRIVMSG", &target, &text, Some("ACTION"));
                false
            }
            Request::Disconnect { message } => {
                self.session.request_disconnect();
                let message =
                    message.unwrap_or_else(|| self.session.config().quit_message.clone());
                pipeline.send_parts(&["QUIT".to_owned(), message]);
                pipeline.close();
                true
            }
        }
    }

    /// Split user text against the wire budget and send each piece.
    fn send_split(
        &mut self,
        pipeline: &Pipeline,
        command: &str,
        target: &str,
        text: &str,
        ctcp_kind: Option<&str>,
    ) {
        let state = self.session.state();
        let budget = effective_budget(
            self.session.config().message_split,
            &state.current_nick,
            &state.host_mask,
            target,
        );

        for piece in split_text(text, budget) {
            let body = match ctcp_kind {
                Some(kind) => Ctcp::custom(kind, Some(piece.as_str())).to_string(),
                None => piece.clone(),
            };
            self.session.state_mut().last_send_time = Some(std::time::Instant::now());
            pipeline.send_parts(&[command.to_owned(), target.to_owned(), body]);
            self.emit(Event::SelfMessage {
                target: target.to_owned(),
                text: piece,
            });
        }
    }

    fn emit(&mut self, event: Event) {
        let casemap = self.session.state().casemapping();
        self.bus.emit(&event, casemap);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.session.config())
            .field("state", self.session.state())
            .finish_non_exhaustive()
    }
}
