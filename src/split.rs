//! Outbound message splitting.
//!
//! A PRIVMSG line relayed by the server carries our full hostmask, so the
//! text budget for one line is `497 - nick - hostmask - target` bytes
//! (512 minus CRLF and the framing punctuation). Splitting iterates
//! extended grapheme clusters so emoji sequences and combining marks are
//! never torn apart, and prefers to break at the last space inside the
//! current chunk.

use unicode_segmentation::UnicodeSegmentation;

/// Byte budget available for message text on one line to `target`.
///
/// `message_split` is the configured ceiling; the hostmask-derived limit
/// wins when it is smaller.
pub fn effective_budget(
    message_split: usize,
    current_nick: &str,
    host_mask: &str,
    target: &str,
) -> usize {
    let wire = 497usize
        .saturating_sub(current_nick.len())
        .saturating_sub(host_mask.len())
        .saturating_sub(target.len());
    message_split.min(wire).max(1)
}

/// Split one line of text into chunks of at most `budget` bytes.
///
/// Grapheme clusters are atomic: a cluster larger than the budget is
/// emitted alone rather than torn. A chunk that would overflow breaks at
/// its last space when one exists (the space becomes the break and is
/// not emitted); otherwise it breaks at the cluster boundary. Splitting
/// is idempotent: re-splitting the output at the same budget returns it
/// unchanged.
pub fn split_line(text: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut chunk = String::new();

    for g in text.graphemes(true) {
        if !chunk.is_empty() && chunk.len() + g.len() > budget {
            // A separator space on the boundary closes the chunk as-is.
            if g == " " {
                pieces.push(std::mem::take(&mut chunk));
                continue;
            }
            if let Some(space) = chunk.rfind(' ') {
                let carry = chunk[space + 1..].to_owned();
                chunk.truncate(space);
                if !chunk.is_empty() {
                    pieces.push(std::mem::take(&mut chunk));
                }
                chunk = carry;
            }
            // The carried tail has no spaces left; if it still cannot
            // take this cluster, it becomes a piece of its own.
            if !chunk.is_empty() && chunk.len() + g.len() > budget {
                pieces.push(std::mem::take(&mut chunk));
            }
        }
        chunk.push_str(g);
    }

    if !chunk.is_empty() {
        pieces.push(chunk);
    }

    pieces
}

/// Split free-form user text into sendable lines.
///
/// The text is first split on CRLF, CR, or LF (empty lines removed),
/// then each line goes through [`split_line`].
pub fn split_text(text: &str, budget: usize) -> Vec<String> {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .flat_map(|line| split_line(line, budget))
        .collect()
}
