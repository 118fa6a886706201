pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Named placeholders must be followed by whitespace, a comma, a closing paren, or the end.
pub(super) fn is_named_terminator(next: Option<char>) -> bool {
    match next {
        None => true,
        Some(c) => c.is_whitespace() || c == ',' || c == ')',
    }
}

/// Split a parenthesised list body into trimmed tokens on `,` and `)`.
pub(super) fn split_list_tokens(body: &str) -> impl Iterator<Item = &str> {
    body.split([',', ')'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
