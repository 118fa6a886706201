use std::sync::LazyLock;

use regex::Regex;

use super::parsers::split_list_tokens;
use super::scanner::{is_skipped, skipped_regions};
use super::{ParameterDialect, ParameterMatch};

static INSERT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*insert\s+into\s+[^(]*\(([^)]*)\)\s*values\s*\((.*)\)")
        .expect("insert statement regex is valid")
});

static INSERT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*insert\s+into\b").expect("insert prefix regex is valid"));

/// `column <op> ?` comparisons outside of INSERT statements.
static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z_][A-Za-z0-9_]*)\s*(?:<>|!=|<=|>=|=|<|>|\blike\b)\s*\?")
        .expect("comparison regex is valid")
});

/// Anonymous `?` placeholders, bound by position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionalDialect;

impl PositionalDialect {
    /// Pair columns with values; an unbalanced token count yields nothing.
    fn insert_parameter_names(sql: &str) -> Vec<String> {
        let Some(caps) = INSERT_STATEMENT.captures(sql) else {
            return Vec::new();
        };
        let tokens: Vec<&str> = caps
            .get(1)
            .map(|m| m.as_str())
            .into_iter()
            .chain(caps.get(2).map(|m| m.as_str()))
            .flat_map(split_list_tokens)
            .collect();
        if tokens.len() % 2 != 0 {
            tracing::debug!(
                tokens = tokens.len(),
                "unbalanced insert column/value lists; no parameters extracted"
            );
            return Vec::new();
        }
        let (columns, values) = tokens.split_at(tokens.len() / 2);
        columns
            .iter()
            .zip(values)
            .filter(|(_, value)| **value == "?")
            .map(|(column, _)| format!("@{column}"))
            .collect()
    }

    fn comparison_parameter_names(sql: &str) -> Vec<String> {
        let regions = skipped_regions(sql);
        COMPARISON
            .captures_iter(sql)
            .filter(|caps| {
                caps.get(0)
                    .is_some_and(|m| !is_skipped(&regions, m.end() - 1))
            })
            .filter_map(|caps| caps.get(1).map(|name| format!("@{}", name.as_str())))
            .collect()
    }
}

impl ParameterDialect for PositionalDialect {
    fn find_parameter_names(&self, sql: &str) -> Vec<String> {
        if INSERT_PREFIX.is_match(sql) {
            Self::insert_parameter_names(sql)
        } else {
            Self::comparison_parameter_names(sql)
        }
    }

    fn next_parameter_match_from(&self, sql: &str, from: usize) -> Option<ParameterMatch> {
        if from > sql.len() {
            return None;
        }
        let regions = skipped_regions(sql);
        sql[from..]
            .match_indices('?')
            .map(|(offset, _)| from + offset)
            .find(|pos| !is_skipped(&regions, *pos))
            .map(|start| ParameterMatch { start, len: 1 })
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_comparisons() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
        assert_eq!(PositionalDialect.find_parameter_names(sql), vec!["@a", "@b"]);
    }

    #[test]
    fn comparison_operators() {
        let sql = "select * from t where a<>? or b >= ? or c LIKE ?";
        assert_eq!(
            PositionalDialect.find_parameter_names(sql),
            vec!["@a", "@b", "@c"]
        );
    }

    #[test]
    fn insert_skips_literal_values() {
        let sql = "INSERT INTO t (c1, c2) VALUES (?, 'lit')";
        assert_eq!(PositionalDialect.find_parameter_names(sql), vec!["@c1"]);
    }

    #[test]
    fn insert_with_leading_whitespace_and_case() {
        let sql = "  insert  INTO people(id,name,age) values(?,?,?)";
        assert_eq!(
            PositionalDialect.find_parameter_names(sql),
            vec!["@id", "@name", "@age"]
        );
    }

    #[test]
    fn insert_keywords_may_span_lines() {
        let sql = "INSERT\n    INTO t (a, b)\nVALUES (?, ?)";
        assert_eq!(PositionalDialect.find_parameter_names(sql), vec!["@a", "@b"]);
    }

    #[test]
    fn unbalanced_insert_yields_nothing() {
        let sql = "INSERT INTO t (c1, c2) VALUES (?)";
        assert!(PositionalDialect.find_parameter_names(sql).is_empty());
    }

    #[test]
    fn next_match_skips_literals() {
        let sql = "select '?' from t where a = ?";
        let m = PositionalDialect.next_parameter_match(sql).unwrap();
        assert_eq!(m.start, sql.len() - 1);
        assert_eq!(m.len, 1);
    }
}
