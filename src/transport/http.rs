//! The HTTP (text) transport and its statement-level format directive.

use crate::transport::{BindExpression, Transport, TransportKind, WireEncoding};
use crate::types::TypeDescriptor;

/// The result format requested by default; its header rows carry column types.
pub const DEFAULT_RESULT_FORMAT: &str = "TabSeparatedWithNamesAndTypes";

/// Leading keywords of statements that produce no result set.
const NO_RESULT_KEYWORDS: &[&str] = &[
    "INSERT", "CREATE", "DROP", "ALTER", "TRUNCATE", "RENAME", "ATTACH", "DETACH", "OPTIMIZE",
    "SYSTEM", "SET", "USE", "GRANT", "REVOKE",
];

#[derive(Debug, Clone)]
pub struct HttpTransport {
    result_format: String,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_result_format(DEFAULT_RESULT_FORMAT)
    }

    pub fn with_result_format(format: impl Into<String>) -> Self {
        Self {
            result_format: format.into(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    fn encoding(&self) -> WireEncoding {
        WireEncoding::Text
    }

    /// Values inside composite literals spell NULL either way.
    fn is_null_token(&self, token: &str) -> bool {
        token == "\\N" || token == "NULL"
    }

    /// TabSeparated spells a NULL field only as `\N`; a bare `NULL` field is
    /// the string itself.
    fn is_null_field(&self, field: &str) -> bool {
        field == "\\N"
    }

    fn result_format(&self) -> Option<&str> {
        Some(&self.result_format)
    }

    // The map constructor is rendered inline by the bind chain.
    fn bind_expression(&self, _descriptor: &TypeDescriptor) -> Option<BindExpression> {
        None
    }
}

/// Appends ` FORMAT <format>` to a statement that returns rows.
///
/// INSERTs, DDL and other statements without a result set are returned
/// unchanged, as are statements that already name a format.
pub fn with_format_directive(statement: &str, format: &str) -> String {
    let trimmed = statement.trim_end().trim_end_matches(';').trim_end();
    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if trimmed.is_empty()
        || ends_with_format_clause(trimmed)
        || NO_RESULT_KEYWORDS.contains(&first_word.as_str())
    {
        return statement.to_string();
    }
    format!("{} FORMAT {}", trimmed, format)
}

/// Whether the statement's last two words, outside string literals, are
/// `FORMAT <identifier>`.
fn ends_with_format_clause(statement: &str) -> bool {
    // (word, touched a string literal)
    let mut words: Vec<(String, bool)> = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quote = false;
    let mut escaped = false;
    for c in statement.chars() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => in_quote = false,
                _ => {}
            }
            current.push(c);
        } else if c.is_whitespace() {
            if !current.is_empty() {
                words.push((std::mem::take(&mut current), quoted));
                quoted = false;
            }
        } else {
            if c == '\'' {
                in_quote = true;
                quoted = true;
            }
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push((current, quoted));
    }

    match words.as_slice() {
        [.., (keyword, false), (name, false)] => {
            keyword.eq_ignore_ascii_case("FORMAT")
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_null_tokens() {
        let t = HttpTransport::new();
        assert!(t.is_null_token("\\N"));
        assert!(t.is_null_token("NULL"));
        assert!(!t.is_null_token("'NULL'"));
        assert!(!t.is_null_token("null"));
        assert!(t.is_null_field("\\N"));
        assert!(!t.is_null_field("NULL"));
        assert_eq!(t.null_token(), "NULL");
        assert_eq!(t.result_format(), Some(DEFAULT_RESULT_FORMAT));
    }

    #[test]
    fn test_format_directive_for_selects() {
        assert_eq!(
            with_format_directive("SELECT 1;", DEFAULT_RESULT_FORMAT),
            "SELECT 1 FORMAT TabSeparatedWithNamesAndTypes"
        );
        assert_eq!(
            with_format_directive("  with x as (select 1) select * from x", "TSV"),
            "  with x as (select 1) select * from x FORMAT TSV"
        );
    }

    #[test]
    fn test_format_directive_skips_insert_ddl_and_existing_format() {
        for statement in [
            "INSERT INTO t VALUES (1)",
            "insert into t format TSV",
            "CREATE TABLE t (x Int8) ENGINE = Memory",
            "DROP TABLE t",
            "ALTER TABLE t DELETE WHERE 1",
            "SELECT 1 FORMAT JSON",
            "select x from t format TabSeparatedWithNamesAndTypes;",
            "",
        ] {
            assert_eq!(with_format_directive(statement, "TSV"), statement);
        }
    }

    #[test]
    fn test_format_directive_ignores_format_outside_trailing_clause() {
        for statement in [
            "SELECT x FROM t WHERE format = 1",
            "SELECT x FROM t ORDER BY format",
            "SELECT format FROM t",
            "SELECT x FROM t WHERE s = 'FORMAT JSON'",
            "SELECT 'a FORMAT' JSON",
        ] {
            assert_eq!(
                with_format_directive(statement, "TSV"),
                format!("{} FORMAT TSV", statement)
            );
        }
    }
}
