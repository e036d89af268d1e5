//! Pure kernels for ClickHouse text escaping.
//!
//! Covers the single-quoted SQL string literal (`'it\'s'`) used for binds and
//! inside composite server output, and the backslash escaping of top-level
//! TabSeparated fields.

use crate::error::CodecError;

//==================================================================================
// 1. Escaping
//==================================================================================

/// Appends `value` to `out` with backslash escaping suitable for a quoted literal.
pub fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
}

/// Renders `value` as a single-quoted, escaped string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    escape_into(&mut out, value);
    out.push('\'');
    out
}

//==================================================================================
// 2. Unescaping
//==================================================================================

/// Decodes the escape sequence whose first byte (after the backslash) is at `at`.
/// Returns the decoded byte and how many input bytes it consumed.
fn unescape_at(bytes: &[u8], at: usize) -> Result<(u8, usize), CodecError> {
    let code = *bytes.get(at).ok_or_else(|| CodecError::LiteralParse {
        position: at.saturating_sub(1),
        message: "dangling backslash at end of input".to_string(),
    })?;
    let decoded = match code {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'0' => b'\0',
        b'b' => 0x08,
        b'f' => 0x0C,
        b'a' => 0x07,
        b'v' => 0x0B,
        b'e' => 0x1B,
        b'x' => {
            let hex = bytes
                .get(at + 1..at + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| CodecError::LiteralParse {
                    position: at,
                    message: "malformed \\x escape".to_string(),
                })?;
            return Ok((hex, 3));
        }
        // `\\`, `\'`, `\"` and any unknown escape decode to the character itself.
        other => other,
    };
    Ok((decoded, 1))
}

fn into_utf8(bytes: Vec<u8>, position: usize) -> Result<String, CodecError> {
    String::from_utf8(bytes).map_err(|e| CodecError::LiteralParse {
        position,
        message: format!("string literal is not valid UTF-8: {}", e),
    })
}

/// Reads a single-quoted literal starting at byte `start` (which must be `'`).
/// Returns the unescaped content and the byte offset just past the closing quote.
pub fn read_quoted(input: &str, start: usize) -> Result<(String, usize), CodecError> {
    let bytes = input.as_bytes();
    if bytes.get(start) != Some(&b'\'') {
        return Err(CodecError::LiteralParse {
            position: start,
            message: "expected opening quote".to_string(),
        });
    }
    let mut out = Vec::new();
    let mut i = start + 1;
    loop {
        match bytes.get(i) {
            None => {
                return Err(CodecError::LiteralParse {
                    position: start,
                    message: "unterminated string literal".to_string(),
                })
            }
            Some(b'\'') => {
                // SQL-style doubled quote inside a literal.
                if bytes.get(i + 1) == Some(&b'\'') {
                    out.push(b'\'');
                    i += 2;
                } else {
                    return Ok((into_utf8(out, start)?, i + 1));
                }
            }
            Some(b'\\') => {
                let (decoded, consumed) = unescape_at(bytes, i + 1)?;
                out.push(decoded);
                i += 1 + consumed;
            }
            Some(&b) => {
                out.push(b);
                i += 1;
            }
        }
    }
}

/// Unescapes a top-level TabSeparated field.
pub fn unescape_tsv(field: &str) -> Result<String, CodecError> {
    if !field.contains('\\') {
        return Ok(field.to_string());
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let (decoded, consumed) = unescape_at(bytes, i + 1)?;
            out.push(decoded);
            i += 1 + consumed;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    into_utf8(out, 0)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_specials() {
        assert_eq!(quote("x"), "'x'");
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b\nc\t"), "'a\\\\b\\nc\\t'");
    }

    #[test]
    fn test_read_quoted_inverts_quote() {
        for original in ["", "plain", "it's", "back\\slash", "tab\tnew\nline", "ünïcødé"] {
            let quoted = quote(original);
            let (decoded, end) = read_quoted(&quoted, 0).unwrap();
            assert_eq!(decoded, original);
            assert_eq!(end, quoted.len());
        }
    }

    #[test]
    fn test_read_quoted_doubled_quote_and_hex() {
        let (decoded, end) = read_quoted("'a''b\\x41', rest", 0).unwrap();
        assert_eq!(decoded, "a'bA");
        assert_eq!(end, 10);
    }

    #[test]
    fn test_read_quoted_unterminated() {
        let err = read_quoted("'abc", 0).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_unescape_tsv() {
        assert_eq!(unescape_tsv("plain text").unwrap(), "plain text");
        assert_eq!(unescape_tsv("a\\tb\\\\c\\n").unwrap(), "a\tb\\c\n");
        assert!(unescape_tsv("dangling\\").is_err());
    }
}
