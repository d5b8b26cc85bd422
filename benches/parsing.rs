//! Benchmarks for wire-line parsing and serialization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skua::Message;

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

/// Message with a user prefix
const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

/// Numeric response
const NUMERIC_RESPONSE: &str =
    ":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

/// An ISUPPORT line with a realistic token load
const ISUPPORT_LINE: &str = ":irc.server.net 005 nickname CHANTYPES=# EXCEPTS INVEX \
     CHANMODES=eIbq,k,flj,CFLMPQScgimnprstuz CHANLIMIT=#:120 PREFIX=(ov)@+ MAXLIST=bqeI:100 \
     NICKLEN=30 TOPICLEN=390 :are supported by this server";

/// A colored PRIVMSG for the stripping path
const COLORED_MESSAGE: &str =
    ":nick!user@host PRIVMSG #channel :\u{3}04red \u{2}bold\u{2} \u{3}09,13green\u{3} done";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    group.bench_function("simple_ping", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(SIMPLE_MESSAGE), false).unwrap();
            black_box(msg)
        })
    });

    group.bench_function("with_prefix", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(PREFIX_MESSAGE), false).unwrap();
            black_box(msg)
        })
    });

    group.bench_function("numeric_response", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(NUMERIC_RESPONSE), false).unwrap();
            black_box(msg)
        })
    });

    group.bench_function("isupport", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(ISUPPORT_LINE), false).unwrap();
            black_box(msg)
        })
    });

    group.bench_function("strip_colors", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(COLORED_MESSAGE), true).unwrap();
            black_box(msg)
        })
    });

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Serialization");

    let simple = Message::parse(SIMPLE_MESSAGE, false).unwrap();
    let with_prefix = Message::parse(PREFIX_MESSAGE, false).unwrap();
    let numeric = Message::parse(NUMERIC_RESPONSE, false).unwrap();

    group.bench_function("simple_ping", |b| {
        b.iter(|| black_box(black_box(&simple).serialize()))
    });

    group.bench_function("with_prefix", |b| {
        b.iter(|| black_box(black_box(&with_prefix).serialize()))
    });

    group.bench_function("numeric_response", |b| {
        b.iter(|| black_box(black_box(&numeric).serialize()))
    });

    group.finish();
}

fn benchmark_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("Round Trip");

    let messages = vec![
        ("simple", SIMPLE_MESSAGE),
        ("prefix", PREFIX_MESSAGE),
        ("numeric", NUMERIC_RESPONSE),
        ("isupport", ISUPPORT_LINE),
    ];

    for (name, msg_str) in messages {
        group.bench_with_input(BenchmarkId::new("parse_serialize", name), msg_str, |b, s| {
            b.iter(|| {
                let msg = Message::parse(black_box(s), false).unwrap();
                black_box(msg.serialize())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_round_trip,
);

criterion_main!(benches);
