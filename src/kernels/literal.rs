//! A recursive-descent parser for ClickHouse composite value literals.
//!
//! The grammar covers everything the server emits for composite columns in the
//! text formats, plus the constructor spellings the bind chain produces:
//!
//! ```text
//! value  := quoted | array | tuple | map | call | token
//! array  := '[' [value (',' value)*] ']'
//! tuple  := '(' [value (',' value)*] ')'
//! map    := '{' [value ':' value (',' value ':' value)*] '}'
//! call   := ('map' | 'tuple' | 'array') '(' [value (',' value)*] ')'
//! token  := any run of characters up to a delimiter or whitespace
//! ```
//!
//! The parser produces an untyped [`Literal`] tree; typing happens afterwards in
//! the result processor chain, driven by the column's descriptor.

use std::fmt;

use crate::error::CodecError;
use crate::kernels::text;

/// Nesting deeper than this is rejected instead of risking stack exhaustion.
const MAX_NESTING_DEPTH: usize = 128;

/// An untyped, parsed literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// An unquoted token: a number, `NULL`, `\N`, `inf`, ...
    Token(String),
    /// The unescaped content of a single-quoted string.
    Quoted(String),
    Array(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// Key/value pairs in wire order.
    Map(Vec<(Literal, Literal)>),
}

impl Literal {
    /// A short name for the literal's structural kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Token(_) => "token",
            Literal::Quoted(_) => "quoted string",
            Literal::Array(_) => "array",
            Literal::Tuple(_) => "tuple",
            Literal::Map(_) => "map",
        }
    }

    /// The textual payload of a scalar literal.
    pub fn scalar_text(&self) -> Option<&str> {
        match self {
            Literal::Token(s) | Literal::Quoted(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }
        match self {
            Literal::Token(t) => write!(f, "{}", t),
            Literal::Quoted(s) => write!(f, "{}", text::quote(s)),
            Literal::Array(items) => {
                write!(f, "[")?;
                join(f, items)?;
                write!(f, "]")
            }
            Literal::Tuple(items) => {
                write!(f, "(")?;
                join(f, items)?;
                write!(f, ")")
            }
            Literal::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

//==================================================================================
// 1. Public API
//==================================================================================

/// Parses `input` as exactly one literal; trailing non-whitespace is an error.
pub fn parse(input: &str) -> Result<Literal, CodecError> {
    let mut parser = Parser { input, pos: 0 };
    let literal = parser.value(0)?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(literal)
}

/// Parses `input` if it is exactly one quoted string literal.
pub fn parse_quoted_field(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if !trimmed.starts_with('\'') {
        return None;
    }
    match text::read_quoted(trimmed, 0) {
        Ok((content, end)) if end == trimmed.len() => Some(content),
        _ => None,
    }
}

//==================================================================================
// 2. Parser
//==================================================================================

/// Malformed text anywhere inside a map literal is reported as a map error,
/// however deeply the map is nested.
fn in_map(err: CodecError) -> CodecError {
    match err {
        CodecError::LiteralParse { position, message } => {
            CodecError::MapParse(format!("at byte {}: {}", position, message))
        }
        other => other,
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> CodecError {
        CodecError::LiteralParse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), CodecError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Literal, CodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(self.error("literal nesting is too deep"));
        }
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("expected a value, found end of input")),
            Some(b'\'') => {
                let (content, end) = text::read_quoted(self.input, self.pos)?;
                self.pos = end;
                Ok(Literal::Quoted(content))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(Literal::Array(self.sequence(b']', depth)?))
            }
            Some(b'(') => {
                self.pos += 1;
                Ok(Literal::Tuple(self.sequence(b')', depth)?))
            }
            Some(b'{') => {
                self.pos += 1;
                self.braced_map(depth).map_err(in_map)
            }
            Some(b',' | b']' | b')' | b'}' | b':') => Err(self.error("expected a value")),
            Some(_) => self.token_or_call(depth),
        }
    }

    /// Comma-separated values up to `close`; the opening delimiter is consumed.
    fn sequence(&mut self, close: u8, depth: usize) -> Result<Vec<Literal>, CodecError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => {
                    return Err(self.error(&format!("expected ',' or '{}'", close as char)));
                }
            }
        }
    }

    fn braced_map(&mut self, depth: usize) -> Result<Literal, CodecError> {
        let mut pairs = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Literal::Map(pairs));
        }
        loop {
            let key = self.value(depth + 1)?;
            self.expect(b':')?;
            let value = self.value(depth + 1)?;
            pairs.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Literal::Map(pairs));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    /// The arguments of `map(k1, v1, ...)`; the opening parenthesis is consumed.
    fn map_call(&mut self, start: usize, depth: usize) -> Result<Literal, CodecError> {
        let args = self.sequence(b')', depth)?;
        if args.len() % 2 != 0 {
            return Err(CodecError::LiteralParse {
                position: start,
                message: format!(
                    "map() requires an even number of arguments, got {}",
                    args.len()
                ),
            });
        }
        let mut pairs = Vec::with_capacity(args.len() / 2);
        let mut args = args.into_iter();
        while let (Some(k), Some(v)) = (args.next(), args.next()) {
            pairs.push((k, v));
        }
        Ok(Literal::Map(pairs))
    }

    fn token_or_call(&mut self, depth: usize) -> Result<Literal, CodecError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(
                b,
                b',' | b'[' | b']' | b'(' | b')' | b'{' | b'}' | b':' | b'\'' | b' ' | b'\t' | b'\n' | b'\r'
            ) {
                break;
            }
            self.pos += 1;
        }
        let token = &self.input[start..self.pos];

        if self.peek() != Some(b'(') {
            return Ok(Literal::Token(token.to_string()));
        }
        let function = token.to_ascii_lowercase();
        match function.as_str() {
            "map" => {
                self.pos += 1;
                self.map_call(start, depth).map_err(in_map)
            }
            "tuple" => {
                self.pos += 1;
                Ok(Literal::Tuple(self.sequence(b')', depth)?))
            }
            "array" => {
                self.pos += 1;
                Ok(Literal::Array(self.sequence(b')', depth)?))
            }
            _ => Err(CodecError::LiteralParse {
                position: start,
                message: format!("unsupported function call '{}'", token),
            }),
        }
    }
}
