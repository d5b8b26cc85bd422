//! Fuzz target for wire-line parsing
//!
//! Feeds randomly generated input to the parser (with and without color
//! stripping) and ensures it never panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    // Only fuzz valid UTF-8 strings to focus on protocol-level issues
    if let Ok(input) = str::from_utf8(data) {
        // Skip empty inputs and very long inputs (over 512 bytes is unusual for IRC)
        if input.is_empty() || input.len() > 512 {
            return;
        }

        // Parsing must never panic, stripped or not
        let _ = skua::Message::parse(input, false);
        let _ = skua::Message::parse(input, true);

        // Splitting arbitrary text must never panic or tear graphemes
        for piece in skua::split_line(input, 16) {
            let _ = piece.len();
        }
    }
});
