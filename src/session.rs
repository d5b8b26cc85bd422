//! Sans-IO session engine.
//!
//! [`Session`] consumes inbound lines and produces [`Action`]s: lines to
//! write, events to publish, or a fatal stop. It performs no I/O itself,
//! so the registration flow, SASL, nick-collision recovery, and state
//! tracking are all testable with scripted server lines; the tokio
//! client in [`crate::client`] owns the socket, the timers, and the
//! reconnect policy around it.
//!
//! The flow it drives: connect → `CAP LS 302` → (SASL) → `NICK`/`USER`
//! → 001 → steady state.

use rand::Rng;

use crate::config::Config;
use crate::error::ProtocolError;
use crate::event::{ChannelListItem, Event};
use crate::message::Message;
use crate::response::CommandKind;
use crate::sasl::{self, SaslMechanism};
use crate::state::ClientState;
use crate::track;

/// One step the I/O layer must perform on the engine's behalf.
#[derive(Debug)]
pub enum Action {
    /// Write a line composed from these parts (the send pipeline applies
    /// the trailing-parameter rule to the final part).
    Send(Vec<String>),
    /// Publish an event to subscribers.
    Emit(Event),
    /// Stop the connection; the condition is not recoverable.
    Fatal(ProtocolError),
}

/// Accumulator handed through the dispatch handlers.
#[derive(Debug, Default)]
pub(crate) struct Reactor {
    /// Queued actions, in order.
    pub actions: Vec<Action>,
    /// Whether state changed coherently enough to warrant a flush.
    pub dirty: bool,
}

impl Reactor {
    pub fn send<I, S>(&mut self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions
            .push(Action::Send(parts.into_iter().map(Into::into).collect()));
    }

    pub fn emit(&mut self, event: Event) {
        self.actions.push(Action::Emit(event));
    }

    pub fn touch(&mut self) {
        self.dirty = true;
    }
}

/// The registration and steady-state protocol engine for one connection.
pub struct Session {
    config: Config,
    state: ClientState,
    motd: String,
    channel_list: Vec<ChannelListItem>,
    /// The nick we last sent in response to a collision.
    prev_clash_nick: Option<String>,
    requested_disconnect: bool,
}

impl Session {
    /// Build a session over fresh or reused state.
    ///
    /// Fails immediately when SASL is requested with a mechanism the
    /// engine cannot drive; silently registering unauthenticated is not
    /// an option.
    pub fn new(config: Config, mut state: ClientState) -> Result<Self, ProtocolError> {
        if config.sasl && !config.sasl_type.is_supported() {
            return Err(ProtocolError::SaslUnsupported(
                config.sasl_type.as_str().to_owned(),
            ));
        }

        if !state.registered {
            state.supported.channel.types = config.channel_prefixes.clone();
            if state.current_nick.is_empty() {
                state.current_nick = config.nick.clone();
            }
        }

        Ok(Self {
            config,
            state,
            motd: String::new(),
            channel_list: Vec::new(),
            prev_clash_nick: None,
            requested_disconnect: false,
        })
    }

    /// The session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The tracked state.
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Mutable access to the tracked state.
    pub fn state_mut(&mut self) -> &mut ClientState {
        &mut self.state
    }

    /// Tear down the session, returning the state for reuse.
    pub fn into_state(self) -> ClientState {
        self.state
    }

    /// Mark that the embedder asked to disconnect; subsequent server
    /// `ERROR` lines are expected and not surfaced.
    pub fn request_disconnect(&mut self) {
        self.requested_disconnect = true;
    }

    /// Whether the embedder asked to disconnect.
    pub fn requested_disconnect(&self) -> bool {
        self.requested_disconnect
    }

    /// Actions to perform when the socket connects.
    pub fn on_connected(&mut self) -> Vec<Action> {
        let mut out = Reactor::default();
        out.emit(Event::Connect);

        if let Some(ref webirc) = self.config.webirc {
            let host = webirc.host.clone().unwrap_or_else(|| webirc.ip.clone());
            out.send([
                "WEBIRC".to_owned(),
                webirc.pass.clone(),
                webirc.user.clone(),
                host,
                webirc.ip.clone(),
            ]);
        }
        // With SASL, authentication happens inside CAP negotiation.
        if let Some(ref password) = self.config.password {
            if !self.config.sasl {
                out.send(["PASS", password.as_str()]);
            }
        }
        out.send(["CAP", "LS", "302"]);
        out.send(["NICK", self.config.nick.as_str()]);
        out.send([
            "USER",
            self.config.user_name.as_str(),
            "8",
            "*",
            self.config.real_name.as_str(),
        ]);

        out.actions
    }

    /// Note that the socket went away. Registration never survives the
    /// socket, whatever the close reason was.
    pub fn on_disconnected(&mut self) {
        self.state.registered = false;
        self.state.flush();
    }

    /// Feed one inbound line, producing the actions it warrants.
    pub fn feed_line(&mut self, line: &str) -> Vec<Action> {
        let msg = match Message::parse(line, self.config.strip_colors) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::debug!(%line, %err, "discarding unparseable line");
                return Vec::new();
            }
        };

        let mut out = Reactor::default();
        out.emit(Event::Raw {
            message: msg.clone(),
        });
        self.dispatch(&msg, &mut out);

        if out.dirty {
            self.state.flush();
        }
        out.actions
    }

    fn dispatch(&mut self, msg: &Message, out: &mut Reactor) {
        match msg.command.as_str() {
            "PING" => {
                let token = msg.text().to_owned();
                out.send(["PONG", token.as_str()]);
                out.emit(Event::Ping { server: token });
            }
            "PONG" => {
                out.emit(Event::Pong {
                    server: msg.text().to_owned(),
                });
            }

            "CAP" => self.handle_cap(msg, out),
            "AUTHENTICATE" => self.handle_authenticate(msg, out),

            "rpl_loggedin" => {
                self.state.logged_in = true;
                out.touch();
                out.emit(Event::SaslLoggedIn {
                    account: msg.arg(2).map(str::to_owned),
                });
            }
            "rpl_loggedout" => {
                self.state.logged_in = false;
                out.touch();
                out.emit(Event::SaslLoggedOut);
            }
            "rpl_saslsuccess" => out.send(["CAP", "END"]),
            "err_saslfail" | "err_sasltoolong" | "err_saslaborted" | "err_saslalready" => {
                out.emit(Event::SaslError {
                    kind: msg.command.clone(),
                    message: msg.clone(),
                });
                // No retry on this connection.
                out.send(["CAP", "END"]);
            }

            "rpl_welcome" => self.handle_welcome(msg, out),
            "rpl_isupport" => {
                self.state.apply_isupport(msg);
                out.touch();
                out.emit(Event::Isupport);
            }
            "rpl_myinfo" => {
                if let Some(umodes) = msg.arg(3) {
                    self.state.supported.usermodes = umodes.to_owned();
                }
            }

            "rpl_motdstart" => {
                self.motd = format!("{}\n", msg.text());
            }
            "rpl_motd" => {
                self.motd.push_str(msg.text());
                self.motd.push('\n');
            }
            "rpl_endofmotd" | "err_nomotd" => {
                self.motd.push_str(msg.text());
                self.motd.push('\n');
                out.emit(Event::Motd {
                    motd: std::mem::take(&mut self.motd),
                });
                self.autojoin(out);
            }

            "rpl_liststart" => {
                self.channel_list.clear();
                out.emit(Event::ChannelListStart);
            }
            "rpl_list" => {
                let item = ChannelListItem {
                    name: msg.arg(1).unwrap_or_default().to_owned(),
                    users: msg.arg(2).and_then(|n| n.parse().ok()).unwrap_or(0),
                    topic: msg.arg(3).unwrap_or_default().to_owned(),
                };
                self.channel_list.push(item.clone());
                out.emit(Event::ChannelListItem { item });
            }
            "rpl_listend" => {
                out.emit(Event::ChannelList {
                    items: std::mem::take(&mut self.channel_list),
                });
            }

            "err_nicknameinuse" => self.handle_nick_in_use(msg, out),
            "err_erroneusnickname" | "err_unavailresource" => {
                if self.state.host_mask.is_empty() {
                    // Not registered yet; pick a throwaway nick so the
                    // handshake can proceed.
                    let fallback =
                        format!("enick_{:03}", rand::thread_rng().gen_range(0..1000));
                    self.prev_clash_nick = Some(fallback.clone());
                    out.send(["NICK", fallback.as_str()]);
                } else {
                    out.emit(Event::Error {
                        message: msg.clone(),
                    });
                }
            }

            "ERROR" => {
                if !self.requested_disconnect {
                    out.emit(Event::Error {
                        message: msg.clone(),
                    });
                }
            }

            _ => {
                if !track::apply(&mut self.state, &self.config, msg, out)
                    && msg.kind == CommandKind::Error
                {
                    out.emit(Event::Error {
                        message: msg.clone(),
                    });
                }
            }
        }
    }

    fn handle_cap(&mut self, msg: &Message, out: &mut Reactor) {
        use crate::caps::CapUpdate;

        if msg.arg(1) == Some("NAK") {
            out.send(["CAP", "END"]);
            return;
        }

        match self.state.capabilities.handle(msg) {
            CapUpdate::ServerCapsReady => {
                if self.config.sasl {
                    let mech = self.config.sasl_type.as_str();
                    if !self
                        .state
                        .capabilities
                        .supports_sasl_method(mech, true)
                    {
                        out.actions.push(Action::Fatal(ProtocolError::SaslUnsupported(
                            mech.to_owned(),
                        )));
                        return;
                    }
                }

                let wanted: Vec<String> = self
                    .config
                    .requested_caps()
                    .into_iter()
                    .filter(|c| self.state.capabilities.server_caps().contains(c))
                    .collect();

                if wanted.is_empty() {
                    out.send(["CAP", "END"]);
                } else {
                    out.send(["CAP", "REQ", wanted.join(" ").as_str()]);
                }
                out.touch();
            }
            CapUpdate::UserCapsReady => {
                let sasl_acked = self
                    .state
                    .capabilities
                    .user_caps()
                    .iter()
                    .any(|c| c == "sasl");
                if self.config.sasl && sasl_acked {
                    out.send(["AUTHENTICATE", self.config.sasl_type.as_str()]);
                } else {
                    out.send(["CAP", "END"]);
                }
                out.touch();
            }
            CapUpdate::None => {}
        }
    }

    fn handle_authenticate(&mut self, msg: &Message, out: &mut Reactor) {
        if msg.arg(0) != Some("+") {
            return;
        }
        let payload = match self.config.sasl_type {
            SaslMechanism::External => sasl::encode_external(),
            _ => sasl::encode_plain(
                &self.config.user_name,
                self.config.password.as_deref().unwrap_or(""),
            ),
        };
        for chunk in sasl::chunk_response(&payload) {
            out.send(["AUTHENTICATE", chunk]);
        }
    }

    fn handle_welcome(&mut self, msg: &Message, out: &mut Reactor) {
        self.state.registered = true;
        if let Some(nick) = msg.arg(0) {
            self.state.current_nick = nick.to_owned();
        }
        // The welcome trailing text conventionally ends with our
        // hostmask; a self-WHOIS refines it right after.
        if let Some(mask) = msg.text().split_whitespace().last() {
            self.state.host_mask = mask.to_owned();
        }
        self.prev_clash_nick = None;
        out.touch();
        out.emit(Event::Registered {
            message: msg.clone(),
        });
        out.send(["WHOIS", self.state.current_nick.as_str()]);
    }

    fn handle_nick_in_use(&mut self, msg: &Message, out: &mut Reactor) {
        let rejected = msg.arg(1).unwrap_or_default().to_owned();

        // If the nick the server rejected is not the one we sent, it
        // truncated ours; recompute against the length it enforces.
        let max_len = match self.prev_clash_nick {
            Some(ref prev) if *prev != rejected && !rejected.is_empty() => Some(rejected.len()),
            _ => None,
        };

        let next = self.next_nick(max_len);
        self.prev_clash_nick = Some(next.clone());
        out.send(["NICK", next.as_str()]);
    }

    fn next_nick(&mut self, max_len: Option<usize>) -> String {
        self.state.nick_mod += 1;
        let n = self.state.nick_mod;
        let max_len = max_len.unwrap_or(self.state.supported.nicklength);

        if let Some(ref mut conflict) = self.config.on_nick_conflict {
            return conflict(&self.config.nick, n, max_len);
        }

        let suffix = n.to_string();
        let base: String = self
            .config
            .nick
            .chars()
            .take(max_len.saturating_sub(suffix.len()))
            .collect();
        format!("{}{}", base, suffix)
    }

    fn autojoin(&mut self, out: &mut Reactor) {
        for entry in &self.config.channels {
            // An entry may carry a key: "#chan key".
            let parts: Vec<&str> = std::iter::once("JOIN")
                .chain(entry.split_whitespace())
                .collect();
            out.send(parts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn session(cfg: Config) -> Session {
        Session::new(cfg, ClientState::new()).unwrap()
    }

    fn sent_lines(actions: &[Action]) -> Vec<Vec<String>> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(parts) => Some(parts.clone()),
                _ => None,
            })
            .collect()
    }

    fn emitted(actions: &[Action]) -> Vec<&Event> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_connect_sequence() {
        let mut s = session(Config::new("localhost", "testbot"));
        let actions = s.on_connected();
        assert_eq!(
            sent_lines(&actions),
            vec![
                vec!["CAP", "LS", "302"],
                vec!["NICK", "testbot"],
                vec!["USER", "nodebot", "8", "*", "nodeJS IRC client"],
            ]
        );
        assert!(emitted(&actions)
            .iter()
            .any(|e| e.kind() == EventKind::Connect));
    }

    #[test]
    fn test_pass_skipped_with_sasl() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.password = Some("secret".to_owned());
        cfg.sasl = true;
        let mut s = session(cfg);
        let sends = sent_lines(&s.on_connected());
        assert!(sends.iter().all(|parts| parts[0] != "PASS"));

        let mut cfg = Config::new("localhost", "testbot");
        cfg.password = Some("secret".to_owned());
        let mut s = session(cfg);
        let sends = sent_lines(&s.on_connected());
        assert_eq!(sends[0], vec!["PASS", "secret"]);
    }

    #[test]
    fn test_webirc_first() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.webirc = Some(crate::config::WebIrc {
            pass: "wp".to_owned(),
            user: "gateway".to_owned(),
            ip: "203.0.113.5".to_owned(),
            host: None,
        });
        let mut s = session(cfg);
        let sends = sent_lines(&s.on_connected());
        assert_eq!(
            sends[0],
            vec!["WEBIRC", "wp", "gateway", "203.0.113.5", "203.0.113.5"]
        );
    }

    #[test]
    fn test_registration() {
        let mut s = session(Config::new("localhost", "testbot"));
        let _ = s.on_connected();
        let actions = s.feed_line(
            ":localhost 001 testbot :Welcome to the Internet Relay Chat Network testbot",
        );

        assert!(s.state().registered);
        assert_eq!(s.state().current_nick, "testbot");
        assert_eq!(s.state().host_mask, "testbot");
        assert!(emitted(&actions)
            .iter()
            .any(|e| e.kind() == EventKind::Registered));
        assert!(sent_lines(&actions).contains(&vec!["WHOIS".to_owned(), "testbot".to_owned()]));
    }

    #[test]
    fn test_nick_in_use_suffixes() {
        let mut s = session(Config::new("localhost", "testbot"));
        let _ = s.on_connected();
        let actions = s.feed_line(":localhost 433 * testbot :Nickname is already in use.");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["NICK".to_owned(), "testbot1".to_owned()]]
        );

        let actions = s.feed_line(":localhost 001 testbot1 :Welcome testbot");
        let _ = actions;
        assert_eq!(s.state().current_nick, "testbot1");
        assert_eq!(s.state().host_mask, "testbot");
        assert_eq!(s.state().max_line_length(), 482);
    }

    #[test]
    fn test_nick_conflict_truncates_to_nicklen() {
        let mut cfg = Config::new("localhost", "abcdefghi");
        cfg.nick = "abcdefghi".to_owned();
        let mut s = session(cfg);
        // NICKLEN defaults to 9, so the base loses a char for the digit.
        let actions = s.feed_line(":localhost 433 * abcdefghi :Nickname is already in use.");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["NICK".to_owned(), "abcdefgh1".to_owned()]]
        );
    }

    #[test]
    fn test_nick_conflict_server_truncation() {
        let mut s = session(Config::new("localhost", "abcdefghijklm"));
        let first = s.feed_line(":localhost 433 * abcdefghijklm :Nickname is already in use.");
        // We sent abcdefgh1 (NICKLEN 9 default).
        assert_eq!(sent_lines(&first)[0][1], "abcdefgh1");

        // Server truncates to 8 and reports the rejected nick as such.
        let second = s.feed_line(":localhost 433 * abcdefgh :Nickname is already in use.");
        let next = &sent_lines(&second)[0][1];
        assert_eq!(next.len(), 8);
        assert_eq!(next, "abcdefg2");
    }

    #[test]
    fn test_erroneous_nick_fallback() {
        let mut s = session(Config::new("localhost", "bad nick"));
        let actions = s.feed_line(":localhost 432 * bad :Erroneous nickname");
        let sends = sent_lines(&actions);
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0][0], "NICK");
        assert!(sends[0][1].starts_with("enick_"));
        assert_eq!(sends[0][1].len(), "enick_".len() + 3);
    }

    #[test]
    fn test_cap_end_without_requested_caps() {
        let mut s = session(Config::new("localhost", "testbot"));
        let actions = s.feed_line(":localhost CAP * LS :multi-prefix sasl");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["CAP".to_owned(), "END".to_owned()]]
        );
    }

    #[test]
    fn test_cap_req_and_sasl_flow() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.sasl = true;
        cfg.password = Some("hunter2".to_owned());
        let mut s = session(cfg);

        let actions = s.feed_line(":localhost CAP * LS :sasl=PLAIN,EXTERNAL multi-prefix");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["CAP".to_owned(), "REQ".to_owned(), "sasl".to_owned()]]
        );

        let actions = s.feed_line(":localhost CAP testbot ACK :sasl");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["AUTHENTICATE".to_owned(), "PLAIN".to_owned()]]
        );

        let actions = s.feed_line("AUTHENTICATE +");
        let sends = sent_lines(&actions);
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0][0], "AUTHENTICATE");
        assert_eq!(sends[0][1], sasl::encode_plain("nodebot", "hunter2"));

        let actions = s.feed_line(":localhost 903 testbot :SASL authentication successful");
        assert_eq!(
            sent_lines(&actions),
            vec![vec!["CAP".to_owned(), "END".to_owned()]]
        );

        let actions = s.feed_line(":localhost 900 testbot testbot!n@h acct :You are now logged in as acct");
        assert!(s.state().logged_in);
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, Event::SaslLoggedIn { account } if account.as_deref() == Some("acct"))));
    }

    #[test]
    fn test_sasl_failure_ends_negotiation() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.sasl = true;
        cfg.password = Some("wrong".to_owned());
        let mut s = session(cfg);
        let _ = s.feed_line(":localhost CAP * LS :sasl");
        let _ = s.feed_line(":localhost CAP testbot ACK :sasl");

        let actions = s.feed_line(":localhost 904 testbot :SASL authentication failed");
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, Event::SaslError { kind, .. } if kind == "err_saslfail")));
        assert!(sent_lines(&actions).contains(&vec!["CAP".to_owned(), "END".to_owned()]));
    }

    #[test]
    fn test_sasl_method_unsupported_by_server_is_fatal() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.sasl = true;
        cfg.sasl_type = SaslMechanism::External;
        let mut s = session(cfg);

        let actions = s.feed_line(":localhost CAP * LS :sasl=PLAIN");
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::Fatal(ProtocolError::SaslUnsupported(_)))));
    }

    #[test]
    fn test_sasl_misconfiguration_rejected_locally() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.sasl = true;
        cfg.sasl_type = SaslMechanism::Unknown("SCRAM-SHA-256".to_owned());
        assert!(matches!(
            Session::new(cfg, ClientState::new()),
            Err(ProtocolError::SaslUnsupported(_))
        ));
    }

    #[test]
    fn test_ping_pong() {
        let mut s = session(Config::new("localhost", "testbot"));
        let actions = s.feed_line("PING :irc.example.com");
        assert!(sent_lines(&actions)
            .contains(&vec!["PONG".to_owned(), "irc.example.com".to_owned()]));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, Event::Ping { server } if server == "irc.example.com")));
    }

    #[test]
    fn test_motd_and_autojoin() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.channels = vec!["#alpha".to_owned(), "#beta key".to_owned()];
        let mut s = session(cfg);

        let _ = s.feed_line(":localhost 375 testbot :- localhost Message of the Day -");
        let _ = s.feed_line(":localhost 372 testbot :- Be excellent to each other");
        let actions = s.feed_line(":localhost 376 testbot :End of /MOTD command.");

        let motd = emitted(&actions)
            .into_iter()
            .find_map(|e| match e {
                Event::Motd { motd } => Some(motd.clone()),
                _ => None,
            })
            .unwrap();
        assert!(motd.contains("Be excellent"));

        let sends = sent_lines(&actions);
        assert!(sends.contains(&vec!["JOIN".to_owned(), "#alpha".to_owned()]));
        assert!(sends.contains(&vec![
            "JOIN".to_owned(),
            "#beta".to_owned(),
            "key".to_owned()
        ]));
    }

    #[test]
    fn test_err_nomotd_still_joins() {
        let mut cfg = Config::new("localhost", "testbot");
        cfg.channels = vec!["#alpha".to_owned()];
        let mut s = session(cfg);
        let actions = s.feed_line(":localhost 422 testbot :MOTD File is missing");
        assert!(sent_lines(&actions).contains(&vec!["JOIN".to_owned(), "#alpha".to_owned()]));
    }

    #[test]
    fn test_double_crlf_single_registered() {
        // The codec strips empty lines, but a raw feed of an empty
        // string must not panic or emit anything either.
        let mut s = session(Config::new("localhost", "testbot"));
        let _ = s.feed_line(":localhost 001 testbot :Welcome testbot");
        let actions = s.feed_line("");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_error_numeric_fallthrough() {
        let mut s = session(Config::new("localhost", "testbot"));
        let actions = s.feed_line(":localhost 482 testbot #room :You're not channel operator");
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, Event::Error { .. })));
    }

    #[test]
    fn test_server_error_swallowed_after_disconnect_request() {
        let mut s = session(Config::new("localhost", "testbot"));
        s.request_disconnect();
        let actions = s.feed_line("ERROR :Closing Link");
        assert!(!emitted(&actions)
            .iter()
            .any(|e| matches!(e, Event::Error { .. })));
    }

    #[test]
    fn test_isupport_emitted_per_line() {
        let mut s = session(Config::new("localhost", "testbot"));
        let actions = s.feed_line(
            ":localhost 005 testbot PREFIX=(ov)@+ CHANTYPES=# :are supported by this server",
        );
        assert!(emitted(&actions)
            .iter()
            .any(|e| e.kind() == EventKind::Isupport));
        assert_eq!(s.state().supported.channel.types, "#");
    }

    #[test]
    fn test_channel_list_accumulation() {
        let mut s = session(Config::new("localhost", "testbot"));
        let _ = s.feed_line(":s 321 testbot Channel :Users Name");
        let _ = s.feed_line(":s 322 testbot #a 3 :topic a");
        let _ = s.feed_line(":s 322 testbot #b 5 :topic b");
        let actions = s.feed_line(":s 323 testbot :End of /LIST");

        let items = emitted(&actions)
            .into_iter()
            .find_map(|e| match e {
                Event::ChannelList { items } => Some(items.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "#a");
        assert_eq!(items[1].users, 5);
    }
}
