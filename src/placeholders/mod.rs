//! Positional placeholder scanning.
//!
//! Prepared statements remember how many values they expect; the count is taken from the
//! rendered text, skipping `?` characters inside quoted literals, identifiers and comments.

mod scanner;

use scanner::{State, close_quote, is_block_comment_end, is_block_comment_start, is_line_comment_start};

/// The placeholder token emitted by every builder.
pub const PLACEHOLDER: &str = "?";

/// `n` comma-separated placeholders: `?, ?, ?`.
#[must_use]
pub fn placeholder_list(n: usize) -> String {
    vec![PLACEHOLDER; n].join(", ")
}

/// Count the positional `?` placeholders of `sql`.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut count = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'?' => count += 1,
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted | State::Backticked => {
                let quote = match state {
                    State::SingleQuoted => b'\'',
                    State::DoubleQuoted => b'"',
                    _ => b'`',
                };
                let (next, closed) = close_quote(bytes, idx, quote);
                idx = next;
                if closed {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    count
}
