use std::sync::LazyLock;

use regex::Regex;

use super::parsers::is_named_terminator;
use super::scanner::{is_skipped, skipped_regions};
use super::{ParameterDialect, ParameterMatch};

/// Candidate `@identifier` tokens; escape and terminator rules are checked per match.
static NAMED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").expect("named placeholder regex is valid")
});

/// `@name` placeholders, as used by SQL Server and accepted by SQLite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamedDialect;

impl NamedDialect {
    fn matches_from<'s>(sql: &'s str, from: usize) -> impl Iterator<Item = (ParameterMatch, &'s str)> {
        let regions = skipped_regions(sql);
        NAMED_PLACEHOLDER
            .captures_iter(&sql[from..])
            .filter_map(move |caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                let start = from + whole.start();
                let end = from + whole.end();
                // `@@name` is an escape (or a server variable), never a placeholder.
                if start > 0 && sql.as_bytes()[start - 1] == b'@' {
                    return None;
                }
                if !is_named_terminator(sql[end..].chars().next()) {
                    return None;
                }
                if is_skipped(&regions, start) {
                    return None;
                }
                Some((
                    ParameterMatch {
                        start,
                        len: end - start,
                    },
                    name.as_str(),
                ))
            })
    }
}

impl ParameterDialect for NamedDialect {
    fn find_parameter_names(&self, sql: &str) -> Vec<String> {
        Self::matches_from(sql, 0)
            .map(|(_, name)| format!("@{name}"))
            .collect()
    }

    fn next_parameter_match_from(&self, sql: &str, from: usize) -> Option<ParameterMatch> {
        if from > sql.len() {
            return None;
        }
        Self::matches_from(sql, from).map(|(m, _)| m).next()
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("@p{ordinal}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_names_in_order() {
        let sql = "update t set a = @a, b = @b where id = @id";
        assert_eq!(
            NamedDialect.find_parameter_names(sql),
            vec!["@a", "@b", "@id"]
        );
    }

    #[test]
    fn skips_escaped_and_unterminated_tokens() {
        let sql = "select @@version, @x; select @y from t where z = (@z)";
        assert_eq!(NamedDialect.find_parameter_names(sql), vec!["@y", "@z"]);
    }

    #[test]
    fn ignores_literals() {
        let sql = "select '@a ' from t where b = @b";
        assert_eq!(NamedDialect.find_parameter_names(sql), vec!["@b"]);
    }

    #[test]
    fn next_match_reports_span() {
        let sql = "select * from t where a = @abc";
        let m = NamedDialect.next_parameter_match(sql).unwrap();
        assert_eq!(&sql[m.start..m.start + m.len], "@abc");
    }
}
