//! Channel and user state tracking.
//!
//! Applies inbound deltas (JOIN/PART/KICK/QUIT/KILL/NICK/TOPIC/MODE/
//! NAMES, messaging, and the WHOIS family) to [`ClientState`], queueing
//! domain events and any protocol responses (NAMES completion queries
//! the channel modes; CTCP PING is answered in kind).
//!
//! Channel-name lookups go through the casemapped key, so the server's
//! spelling of a channel never splits state.

use crate::config::Config;
use crate::ctcp::{Ctcp, CtcpKind};
use crate::event::Event;
use crate::isupport::ModeClass;
use crate::message::Message;
use crate::session::Reactor;
use crate::state::ClientState;

/// Whether a messaging target names a channel.
fn is_channel(state: &ClientState, target: &str) -> bool {
    target
        .chars()
        .next()
        .is_some_and(|c| state.supported.channel.types.contains(c))
}

/// Apply one inbound message to the tracked state.
///
/// Returns `false` when the command is not a tracking concern, so the
/// session engine can fall through to its own handling.
pub(crate) fn apply(
    state: &mut ClientState,
    cfg: &Config,
    msg: &Message,
    out: &mut Reactor,
) -> bool {
    match msg.command.as_str() {
        "JOIN" => handle_join(state, msg, out),
        "PART" => handle_part(state, msg, out),
        "KICK" => handle_kick(state, cfg, msg, out),
        "QUIT" => handle_departure(state, msg.nick.as_deref(), msg.arg(0), false, out),
        "KILL" => handle_departure(state, msg.arg(0), msg.arg(1), true, out),
        "NICK" => handle_nick(state, msg, out),
        "TOPIC" => handle_topic(state, msg, out),
        "INVITE" => {
            out.emit(Event::Invite {
                channel: msg.arg(1).unwrap_or_default().to_owned(),
                from: msg.nick.clone().unwrap_or_default(),
            });
            true
        }
        "MODE" => handle_mode(state, msg, out),
        "PRIVMSG" => handle_privmsg(state, msg, out),
        "NOTICE" => handle_notice(msg, out),

        "rpl_notopic" => {
            if let Some(chan) = state.chan_mut(msg.arg(1).unwrap_or_default()) {
                chan.topic = None;
            }
            true
        }
        "rpl_topic" => {
            let channel = msg.arg(1).unwrap_or_default().to_owned();
            let topic = msg.arg(2).unwrap_or_default().to_owned();
            state.ensure_chan(&channel).topic = Some(topic.clone());
            out.emit(Event::Topic {
                channel,
                topic,
                by: None,
            });
            true
        }
        "rpl_topicwhotime" => {
            let channel = msg.arg(1).unwrap_or_default().to_owned();
            let by = msg.arg(2).unwrap_or_default().to_owned();
            let chan = state.ensure_chan(&channel);
            chan.topic_by = Some(by.clone());
            let topic = chan.topic.clone().unwrap_or_default();
            out.emit(Event::Topic {
                channel,
                topic,
                by: Some(by),
            });
            true
        }
        "rpl_creationtime" => {
            let channel = msg.arg(1).unwrap_or_default().to_owned();
            state.ensure_chan(&channel).created = msg.arg(2).map(str::to_owned);
            true
        }
        "rpl_channelmodeis" => {
            let channel = msg.arg(1).unwrap_or_default().to_owned();
            let mode = msg.arg(2).unwrap_or_default().to_owned();
            state.ensure_chan(&channel).mode = mode.trim_start_matches('+').to_owned();
            out.emit(Event::ModeIs { channel, mode });
            true
        }
        "rpl_namreply" => handle_namreply(state, msg, out),
        "rpl_endofnames" => handle_endofnames(state, msg, out),

        "rpl_away" => {
            // Accumulated only while a WHOIS for the nick is in flight.
            let nick = msg.arg(1).unwrap_or_default();
            if let Some(entry) = state.whois_data.get_mut(nick) {
                entry.away = msg.arg(2).map(str::to_owned);
            }
            true
        }
        "rpl_whoisuser" => {
            let nick = msg.arg(1).unwrap_or_default().to_owned();
            let user = msg.arg(2).map(str::to_owned);
            let host = msg.arg(3).map(str::to_owned);
            let entry = state.whois_entry(&nick);
            entry.user = user.clone();
            entry.host = host.clone();
            entry.realname = msg.arg(5).map(str::to_owned);
            // Our own WHOIS refines the hostmask used for line budgets.
            if nick == state.current_nick {
                if let (Some(user), Some(host)) = (user, host) {
                    state.host_mask = format!("{}@{}", user, host);
                    out.touch();
                }
            }
            true
        }
        "rpl_whoisserver" => {
            let entry = state.whois_entry(msg.arg(1).unwrap_or_default());
            entry.server = msg.arg(2).map(str::to_owned);
            entry.serverinfo = msg.arg(3).map(str::to_owned);
            true
        }
        "rpl_whoisoperator" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).operator =
                msg.arg(2).map(str::to_owned);
            true
        }
        "rpl_whoisidle" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).idle =
                msg.arg(2).map(str::to_owned);
            true
        }
        "rpl_whoischannels" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).channels = msg
                .text()
                .split_whitespace()
                .map(str::to_owned)
                .collect();
            true
        }
        "rpl_whoisaccount" => {
            let entry = state.whois_entry(msg.arg(1).unwrap_or_default());
            entry.account = msg.arg(2).map(str::to_owned);
            entry.accountinfo = msg.arg(3).map(str::to_owned);
            true
        }
        "rpl_whoisactually" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).real_host =
                msg.arg(2).map(str::to_owned);
            true
        }
        "rpl_whoiscertfp" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).certfp =
                msg.arg(2).map(str::to_owned);
            true
        }
        "rpl_whoissecure" => {
            state.whois_entry(msg.arg(1).unwrap_or_default()).secure = true;
            true
        }
        "rpl_endofwhois" => {
            let nick = msg.arg(1).unwrap_or_default();
            if let Some(whois) = state.whois_data.remove(nick) {
                out.emit(Event::Whois { whois });
            }
            true
        }

        _ => false,
    }
}

fn handle_join(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(0).unwrap_or_default().to_owned();
    let nick = msg.nick.clone().unwrap_or_default();

    if nick == state.current_nick {
        state.ensure_chan(&channel);
        out.touch();
    } else if let Some(chan) = state.chan_mut(&channel) {
        chan.users.insert(nick.clone(), String::new());
        out.touch();
    }

    out.emit(Event::Join { channel, nick });
    true
}

fn handle_part(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(0).unwrap_or_default().to_owned();
    let nick = msg.nick.clone().unwrap_or_default();
    let reason = msg.arg(1).map(str::to_owned);

    if nick == state.current_nick {
        state.remove_chan(&channel);
    } else if let Some(chan) = state.chan_mut(&channel) {
        chan.users.remove(&nick);
    }
    out.touch();

    out.emit(Event::Part {
        channel,
        nick,
        reason,
    });
    true
}

fn handle_kick(state: &mut ClientState, cfg: &Config, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(0).unwrap_or_default().to_owned();
    let victim = msg.arg(1).unwrap_or_default().to_owned();
    let by = msg.nick.clone().unwrap_or_default();
    let reason = msg.arg(2).map(str::to_owned);

    if victim == state.current_nick {
        state.remove_chan(&channel);
        if cfg.auto_rejoin {
            out.send(["JOIN", channel.as_str()]);
        }
    } else if let Some(chan) = state.chan_mut(&channel) {
        chan.users.remove(&victim);
    }
    out.touch();

    out.emit(Event::Kick {
        channel,
        nick: victim,
        by,
        reason,
    });
    true
}

/// Shared removal path for QUIT and KILL.
fn handle_departure(
    state: &mut ClientState,
    nick: Option<&str>,
    reason: Option<&str>,
    kill: bool,
    out: &mut Reactor,
) -> bool {
    let Some(nick) = nick else { return true };
    let mut channels = Vec::new();
    for chan in state.chans.values_mut() {
        if chan.users.remove(nick).is_some() {
            channels.push(chan.server_name.clone());
        }
    }
    out.touch();

    let nick = nick.to_owned();
    let reason = reason.map(str::to_owned);
    out.emit(if kill {
        Event::Kill {
            nick,
            reason,
            channels,
        }
    } else {
        Event::Quit {
            nick,
            reason,
            channels,
        }
    });
    true
}

fn handle_nick(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let Some(old) = msg.nick.clone() else {
        return true;
    };
    let new = msg.arg(0).unwrap_or_default().to_owned();

    if old == state.current_nick {
        state.current_nick = new.clone();
    }

    let mut channels = Vec::new();
    for chan in state.chans.values_mut() {
        if let Some(prefix) = chan.users.remove(&old) {
            chan.users.insert(new.clone(), prefix);
            channels.push(chan.server_name.clone());
        }
    }
    out.touch();

    out.emit(Event::Nick { old, new, channels });
    true
}

fn handle_topic(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(0).unwrap_or_default().to_owned();
    let topic = msg.arg(1).unwrap_or_default().to_owned();
    let by = msg.nick.clone();

    if let Some(chan) = state.chan_mut(&channel) {
        chan.topic = Some(topic.clone());
        chan.topic_by = by.clone();
    }

    out.emit(Event::Topic { channel, topic, by });
    true
}

fn handle_mode(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let target = msg.arg(0).unwrap_or_default().to_owned();
    if !is_channel(state, &target) {
        // User-mode changes are not tracked.
        return true;
    }

    let by = msg.nick.clone().or_else(|| msg.prefix.clone());
    let modeline = msg.arg(1).unwrap_or_default().to_owned();
    let key = state.chan_key(&target);
    let mut params = msg.args.iter().skip(2);
    let mut adding = true;

    for mode in modeline.chars() {
        match mode {
            '+' => {
                adding = true;
                continue;
            }
            '-' => {
                adding = false;
                continue;
            }
            _ => {}
        }

        let prefix = state.prefix_for_mode.get(&mode).copied();
        let class = state.supported.channel.modes.class_of(mode);
        let mut param: Option<String> = None;

        if let Some(chan) = state.chans.get_mut(&key) {
            if let Some(prefix) = prefix {
                // User-prefix mode: the parameter names the member.
                let user = params.next().cloned().unwrap_or_default();
                let prefixes = chan.users.entry(user.clone()).or_default();
                if adding {
                    if !prefixes.contains(prefix) {
                        prefixes.push(prefix);
                    }
                } else {
                    prefixes.retain(|c| c != prefix);
                }
                param = Some(user);
            } else {
                match class {
                    Some(ModeClass::List) => {
                        let value = params.next().cloned().unwrap_or_default();
                        let list = chan.mode_params.entry(mode).or_default();
                        if adding {
                            list.push(value.clone());
                        } else {
                            list.retain(|p| *p != mode.to_string());
                            if list.is_empty() {
                                chan.mode_params.remove(&mode);
                            }
                        }
                        param = Some(value);
                    }
                    Some(ModeClass::AlwaysParam) => {
                        let value = params.next().cloned().unwrap_or_default();
                        if adding {
                            chan.mode_params.insert(mode, vec![value.clone()]);
                        } else {
                            chan.mode_params.remove(&mode);
                        }
                        param = Some(value);
                    }
                    Some(ModeClass::SetParam) => {
                        if adding {
                            let value = params.next().cloned().unwrap_or_default();
                            chan.mode_params.insert(mode, vec![value.clone()]);
                            param = Some(value);
                        } else {
                            chan.mode_params.remove(&mode);
                        }
                    }
                    Some(ModeClass::Flag) | None => {
                        if adding {
                            if !chan.mode.contains(mode) {
                                chan.mode.push(mode);
                            }
                        } else {
                            chan.mode.retain(|c| c != mode);
                        }
                    }
                }
            }
        }

        out.emit(if adding {
            Event::ModeAdd {
                channel: target.clone(),
                by: by.clone(),
                mode,
                param,
            }
        } else {
            Event::ModeRemove {
                channel: target.clone(),
                by: by.clone(),
                mode,
                param,
            }
        });
    }

    out.touch();
    true
}

fn handle_namreply(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(2).unwrap_or_default().to_owned();
    let names = msg.arg(3).unwrap_or_default().to_owned();

    // Collect the known-prefix run up front; `ensure_chan` needs the
    // state borrow afterwards.
    let entries: Vec<(String, String)> = names
        .split_whitespace()
        .map(|token| {
            let split = token
                .char_indices()
                .find(|&(_, c)| !state.mode_for_prefix.contains_key(&c))
                .map_or(token.len(), |(i, _)| i);
            (token[split..].to_owned(), token[..split].to_owned())
        })
        .filter(|(nick, _)| !nick.is_empty())
        .collect();

    let chan = state.ensure_chan(&channel);
    for (nick, prefixes) in entries {
        chan.users.insert(nick, prefixes);
    }
    out.touch();
    true
}

fn handle_endofnames(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let channel = msg.arg(1).unwrap_or_default().to_owned();
    if let Some(chan) = state.chan(&channel) {
        out.emit(Event::Names {
            channel: channel.clone(),
            users: chan.users.clone(),
        });
        out.send(["MODE", channel.as_str()]);
    }
    true
}

fn handle_privmsg(state: &mut ClientState, msg: &Message, out: &mut Reactor) -> bool {
    let from = msg.nick.clone().unwrap_or_default();
    let target = msg.arg(0).unwrap_or_default().to_owned();
    let text = msg.arg(1).unwrap_or_default().to_owned();

    if let Some(ctcp) = Ctcp::parse(&text) {
        handle_ctcp(from, target, &ctcp, true, out);
    } else if is_channel(state, &target) {
        out.emit(Event::Message {
            from,
            channel: target,
            text,
        });
    } else {
        out.emit(Event::Pm { from, text });
    }
    true
}

fn handle_notice(msg: &Message, out: &mut Reactor) -> bool {
    let from = msg.nick.clone();
    let target = msg.arg(0).unwrap_or_default().to_owned();
    let text = msg.arg(1).unwrap_or_default().to_owned();

    if let Some(ctcp) = Ctcp::parse(&text) {
        handle_ctcp(from.unwrap_or_default(), target, &ctcp, false, out);
    } else {
        out.emit(Event::Notice { from, target, text });
    }
    true
}

fn handle_ctcp(
    from: String,
    target: String,
    ctcp: &Ctcp<'_>,
    over_privmsg: bool,
    out: &mut Reactor,
) {
    let body = match ctcp.params {
        Some(params) => format!("{} {}", ctcp.kind, params),
        None => ctcp.kind.to_string(),
    };
    out.emit(Event::Ctcp {
        from: from.clone(),
        target: target.clone(),
        kind: ctcp.kind.clone(),
        text: body,
    });

    match ctcp.kind {
        CtcpKind::Action => {
            out.emit(Event::Action {
                from,
                target,
                text: ctcp.params.unwrap_or_default().to_owned(),
            });
        }
        CtcpKind::Ping if over_privmsg => {
            if let Some(ts) = ctcp.params {
                let reply = Ctcp::ping(ts).to_string();
                out.send(["NOTICE", from.as_str(), reply.as_str()]);
            }
        }
        CtcpKind::Version if over_privmsg => {
            out.emit(Event::CtcpVersion { from, target });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Action;

    fn state_with_prefix() -> ClientState {
        let mut state = ClientState::new();
        state.current_nick = "testbot".to_owned();
        state.apply_isupport(
            &Message::parse(
                ":s 005 testbot PREFIX=(ov)@+ CHANMODES=b,k,l,imnt :are supported by this server",
                false,
            )
            .unwrap(),
        );
        state
    }

    fn run(state: &mut ClientState, cfg: &Config, line: &str) -> Reactor {
        let mut out = Reactor::default();
        let msg = Message::parse(line, false).unwrap();
        assert!(apply(state, cfg, &msg, &mut out));
        out
    }

    fn events(out: &Reactor) -> Vec<&Event> {
        out.actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_self_join_creates_channel() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        assert!(state.chan("#room").is_some());
    }

    #[test]
    fn test_other_join_adds_user() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":alice!a@h JOIN #room");
        assert_eq!(state.chan("#room").unwrap().users.get("alice").unwrap(), "");
    }

    #[test]
    fn test_self_part_removes_channel() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":testbot!u@h PART #room :bye");
        assert!(state.chan("#room").is_none());
    }

    #[test]
    fn test_kick_self_autorejoin() {
        let mut state = state_with_prefix();
        let mut cfg = Config::new("s", "testbot");
        cfg.auto_rejoin = true;
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        let out = run(&mut state, &cfg, ":op!o@h KICK #room testbot :begone");

        assert!(state.chan("#room").is_none());
        assert!(out
            .actions
            .iter()
            .any(|a| matches!(a, Action::Send(parts) if parts == &["JOIN", "#room"])));
    }

    #[test]
    fn test_quit_removes_from_all_channels() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #a");
        run(&mut state, &cfg, ":testbot!u@h JOIN #b");
        run(&mut state, &cfg, ":alice!a@h JOIN #a");
        run(&mut state, &cfg, ":alice!a@h JOIN #b");

        let out = run(&mut state, &cfg, ":alice!a@h QUIT :gone");
        assert!(state.chan("#a").unwrap().users.get("alice").is_none());
        assert!(state.chan("#b").unwrap().users.get("alice").is_none());
        match events(&out)[0] {
            Event::Quit { nick, channels, .. } => {
                assert_eq!(nick, "alice");
                assert_eq!(channels.len(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_nick_change_preserves_prefix() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":alice!a@h JOIN #room");
        run(&mut state, &cfg, ":ChanServ!s@s MODE #room +o alice");
        run(&mut state, &cfg, ":alice!a@h NICK :alice2");

        let chan = state.chan("#room").unwrap();
        assert!(chan.users.get("alice").is_none());
        assert_eq!(chan.users.get("alice2").unwrap(), "@");
    }

    #[test]
    fn test_own_nick_change() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h NICK :testbot2");
        assert_eq!(state.current_nick, "testbot2");
    }

    #[test]
    fn test_prefix_mode_add_remove() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #auditorium");
        run(&mut state, &cfg, ":user!u@h JOIN #auditorium");

        let out = run(&mut state, &cfg, ":ChanServ!s@s MODE #auditorium +o user");
        match events(&out)[0] {
            Event::ModeAdd {
                channel,
                by,
                mode,
                param,
            } => {
                assert_eq!(channel, "#auditorium");
                assert_eq!(by.as_deref(), Some("ChanServ"));
                assert_eq!(*mode, 'o');
                assert_eq!(param.as_deref(), Some("user"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            state.chan("#auditorium").unwrap().users.get("user").unwrap(),
            "@"
        );

        run(&mut state, &cfg, ":ChanServ!s@s MODE #auditorium -o user");
        assert_eq!(
            state.chan("#auditorium").unwrap().users.get("user").unwrap(),
            ""
        );
    }

    #[test]
    fn test_flag_mode_toggle() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");

        let out = run(&mut state, &cfg, ":op!o@h MODE #room +m");
        assert!(state.chan("#room").unwrap().mode.contains('m'));
        assert!(matches!(
            events(&out)[0],
            Event::ModeAdd { mode: 'm', param: None, .. }
        ));

        let out = run(&mut state, &cfg, ":op!o@h MODE #room -m");
        assert!(!state.chan("#room").unwrap().mode.contains('m'));
        assert!(matches!(
            events(&out)[0],
            Event::ModeRemove { mode: 'm', param: None, .. }
        ));
    }

    #[test]
    fn test_mixed_mode_line() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":alice!a@h JOIN #room");

        let out = run(
            &mut state,
            &cfg,
            ":op!o@h MODE #room +mkv secret alice",
        );
        let evs = events(&out);
        assert_eq!(evs.len(), 3);
        let chan = state.chan("#room").unwrap();
        assert!(chan.mode.contains('m'));
        assert_eq!(chan.mode_params.get(&'k').unwrap(), &vec!["secret"]);
        assert_eq!(chan.users.get("alice").unwrap(), "+");
    }

    #[test]
    fn test_set_param_mode_removal_takes_no_param() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":op!o@h MODE #room +l 25");
        assert_eq!(
            state.chan("#room").unwrap().mode_params.get(&'l').unwrap(),
            &vec!["25"]
        );

        let out = run(&mut state, &cfg, ":op!o@h MODE #room -l");
        assert!(state.chan("#room").unwrap().mode_params.get(&'l').is_none());
        assert!(matches!(
            events(&out)[0],
            Event::ModeRemove { mode: 'l', param: None, .. }
        ));
    }

    #[test]
    fn test_list_mode_accumulates() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":testbot!u@h JOIN #room");
        run(&mut state, &cfg, ":op!o@h MODE #room +b *!*@spam.example");
        run(&mut state, &cfg, ":op!o@h MODE #room +b *!*@flood.example");

        assert_eq!(
            state.chan("#room").unwrap().mode_params.get(&'b').unwrap().len(),
            2
        );
    }

    #[test]
    fn test_namreply_keeps_known_prefixes() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":s 353 testbot = #room :@op +voiced plain %unknown");

        let chan = state.chan("#room").unwrap();
        assert_eq!(chan.users.get("op").unwrap(), "@");
        assert_eq!(chan.users.get("voiced").unwrap(), "+");
        assert_eq!(chan.users.get("plain").unwrap(), "");
        // % is not a configured prefix, so it stays part of the nick.
        assert_eq!(chan.users.get("%unknown").unwrap(), "");
    }

    #[test]
    fn test_endofnames_emits_and_queries_modes() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":s 353 testbot = #room :@op");
        let out = run(&mut state, &cfg, ":s 366 testbot #room :End of /NAMES list.");

        assert!(events(&out)
            .iter()
            .any(|e| matches!(e, Event::Names { channel, .. } if channel == "#room")));
        assert!(out
            .actions
            .iter()
            .any(|a| matches!(a, Action::Send(parts) if parts == &["MODE", "#room"])));
    }

    #[test]
    fn test_privmsg_channel_vs_pm() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");

        let out = run(&mut state, &cfg, ":alice!a@h PRIVMSG #room :hi all");
        assert!(matches!(events(&out)[0], Event::Message { .. }));

        let out = run(&mut state, &cfg, ":alice!a@h PRIVMSG testbot :hi you");
        assert!(matches!(events(&out)[0], Event::Pm { .. }));
    }

    #[test]
    fn test_ctcp_action() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        let out = run(
            &mut state,
            &cfg,
            ":alice!a@h PRIVMSG #room :\u{1}ACTION waves\u{1}",
        );
        let evs = events(&out);
        assert!(matches!(evs[0], Event::Ctcp { kind: CtcpKind::Action, .. }));
        assert!(
            matches!(evs[1], Event::Action { from, text, .. } if from == "alice" && text == "waves")
        );
    }

    #[test]
    fn test_ctcp_ping_auto_reply() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        let out = run(
            &mut state,
            &cfg,
            ":alice!a@h PRIVMSG testbot :\u{1}PING 12345\u{1}",
        );
        assert!(out.actions.iter().any(|a| matches!(
            a,
            Action::Send(parts) if parts == &["NOTICE", "alice", "\u{1}PING 12345\u{1}"]
        )));
    }

    #[test]
    fn test_ctcp_version_event() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        let out = run(
            &mut state,
            &cfg,
            ":alice!a@h PRIVMSG testbot :\u{1}VERSION\u{1}",
        );
        assert!(events(&out)
            .iter()
            .any(|e| matches!(e, Event::CtcpVersion { .. })));
    }

    #[test]
    fn test_whois_accumulation() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":s 311 testbot alice ident example.com * :Alice A.");
        run(&mut state, &cfg, ":s 312 testbot alice irc.example.com :The server");
        run(&mut state, &cfg, ":s 319 testbot alice :@#room #other");
        run(&mut state, &cfg, ":s 330 testbot alice alice_acct :is logged in as");

        let out = run(&mut state, &cfg, ":s 318 testbot alice :End of /WHOIS list.");
        match events(&out)[0] {
            Event::Whois { whois } => {
                assert_eq!(whois.nick, "alice");
                assert_eq!(whois.user.as_deref(), Some("ident"));
                assert_eq!(whois.host.as_deref(), Some("example.com"));
                assert_eq!(whois.realname.as_deref(), Some("Alice A."));
                assert_eq!(whois.channels, vec!["@#room", "#other"]);
                assert_eq!(whois.account.as_deref(), Some("alice_acct"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(state.whois_data.is_empty());
    }

    #[test]
    fn test_self_whois_refines_hostmask() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(
            &mut state,
            &cfg,
            ":s 311 testbot testbot ident host.example.com * :A bot",
        );
        assert_eq!(state.host_mask, "ident@host.example.com");
    }

    #[test]
    fn test_topic_tracking() {
        let mut state = state_with_prefix();
        let cfg = Config::new("s", "testbot");
        run(&mut state, &cfg, ":s 332 testbot #room :old topic");
        run(&mut state, &cfg, ":s 333 testbot #room alice :1700000000");
        let chan = state.chan("#room").unwrap();
        assert_eq!(chan.topic.as_deref(), Some("old topic"));
        assert_eq!(chan.topic_by.as_deref(), Some("alice"));

        run(&mut state, &cfg, ":bob!b@h TOPIC #room :new topic");
        let chan = state.chan("#room").unwrap();
        assert_eq!(chan.topic.as_deref(), Some("new topic"));
        assert_eq!(chan.topic_by.as_deref(), Some("bob"));
    }

}
