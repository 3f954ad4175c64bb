#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    (bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-'))
        || bytes.get(idx) == Some(&b'#')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Closing quote handling shared by the three quoted states. A doubled quote is an escape, and
/// inside string literals so is a backslash (MySQL `'it\'s'`).
/// Returns the index to resume from and whether the quoted run ended.
pub(super) fn close_quote(bytes: &[u8], idx: usize, quote: u8) -> (usize, bool) {
    if bytes[idx] == b'\\' && quote != b'`' {
        return (idx + 1, false);
    }
    if bytes[idx] != quote {
        return (idx, false);
    }
    if bytes.get(idx + 1) == Some(&quote) {
        (idx + 1, false)
    } else {
        (idx, true)
    }
}
