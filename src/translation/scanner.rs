use std::ops::Range;

use super::parsers::{is_block_comment_end, is_block_comment_start, is_line_comment_start};

#[derive(Clone, Copy)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

/// Byte ranges of `sql` covered by quoted literals or comments.
///
/// Placeholder matches that start inside one of these ranges are not placeholders.
/// An unterminated literal or comment runs to the end of the text.
pub(super) fn skipped_regions(sql: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let mut regions = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                if b == b'\'' {
                    state = State::SingleQuoted;
                    start = idx;
                } else if b == b'"' {
                    state = State::DoubleQuoted;
                    start = idx;
                } else if is_line_comment_start(bytes, idx) {
                    state = State::LineComment;
                    start = idx;
                    idx += 1;
                } else if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(1);
                    start = idx;
                    idx += 1;
                }
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // skip escaped quote
                    } else {
                        regions.push(start..idx + 1);
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    regions.push(start..idx);
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    idx += 1;
                    if depth == 1 {
                        regions.push(start..idx + 1);
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
        }
        idx += 1;
    }

    if !matches!(state, State::Normal) {
        regions.push(start..bytes.len());
    }
    regions
}

pub(super) fn is_skipped(regions: &[Range<usize>], pos: usize) -> bool {
    regions.iter().any(|region| region.contains(&pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_literals_and_comments() {
        let sql = "select 'a?', x -- ?\n/* @p /* nested */ */ from t";
        let regions = skipped_regions(sql);
        assert_eq!(regions.len(), 3);
        assert_eq!(&sql[regions[0].clone()], "'a?'");
        assert_eq!(&sql[regions[1].clone()], "-- ?");
        assert_eq!(&sql[regions[2].clone()], "/* @p /* nested */ */");
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let sql = "select 'O''Reilly ?' , ?";
        let regions = skipped_regions(sql);
        assert_eq!(&sql[regions[0].clone()], "'O''Reilly ?'");
        assert!(!is_skipped(&regions, sql.len() - 1));
    }

    #[test]
    fn unterminated_literal_runs_to_end() {
        let sql = "select 'abc ?";
        let regions = skipped_regions(sql);
        assert_eq!(regions, vec![7..sql.len()]);
    }
}
