//! Parsing of ClickHouse type names into [`TypeDescriptor`]s.
//!
//! Argument lists are split on top-level commas while tracking both parenthesis
//! depth and single-quoted strings, so enum names such as `'a, b)'` survive.

use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::CodecError;
use crate::kernels::text;
use crate::types::type_descriptor::{EnumMembers, TypeDescriptor, DEFAULT_DATETIME64_PRECISION};

fn parse_error(msg: impl Into<String>) -> CodecError {
    CodecError::TypeParse(msg.into())
}

// we assume server-normalized identifiers: letters, digits and underscores
fn eat_identifier(input: &str) -> (&str, &str) {
    for (i, c) in input.char_indices() {
        if c.is_alphabetic() || c == '_' || (i > 0 && c.is_numeric()) {
            continue;
        }
        return (&input[..i], &input[i..]);
    }
    (input, "")
}

/// Splits `(a, b(c, d), 'e,f')` into `["a", "b(c, d)", "'e,f'"]`.
fn split_args(input: &str) -> Result<Vec<&str>, CodecError> {
    if !input.starts_with('(') || !input.ends_with(')') {
        return Err(parse_error(format!("malformed arguments to type: '{}'", input)));
    }
    let inner = &input[1..input.len() - 1];
    let mut out = vec![];
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    let mut last_start = 0;
    for (i, c) in inner.char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => in_quote = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_error("mismatched parenthesis"))?;
            }
            ',' if depth == 0 => {
                out.push(inner[last_start..i].trim());
                last_start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_quote {
        return Err(parse_error("mismatched parenthesis or unterminated quote"));
    }
    let tail = inner[last_start..].trim();
    if !tail.is_empty() || !out.is_empty() {
        out.push(tail);
    }
    if out.iter().any(|arg| arg.is_empty()) {
        return Err(parse_error(format!("empty argument in '{}'", input)));
    }
    Ok(out)
}

fn expect_arity(ident: &str, args: &[&str], expected: usize) -> Result<(), CodecError> {
    if args.len() != expected {
        return Err(parse_error(format!(
            "bad arg count for {}, expected {} and got {}",
            ident,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn parse_u8(arg: &str, what: &str) -> Result<u8, CodecError> {
    arg.parse()
        .map_err(|_| parse_error(format!("couldn't parse {}: '{}'", what, arg)))
}

/// Parses a quoted argument that must span the whole input.
fn parse_quoted(arg: &str) -> Result<String, CodecError> {
    match text::read_quoted(arg, 0) {
        Ok((content, end)) if end == arg.len() => Ok(content),
        _ => Err(parse_error(format!("expected a quoted string, got '{}'", arg))),
    }
}

fn parse_timezone(arg: &str) -> Result<Tz, CodecError> {
    let name = parse_quoted(arg)?;
    name.parse::<Tz>()
        .map_err(|e| parse_error(format!("failed to parse timezone '{}': {}", name, e)))
}

/// Parses `'name' = ordinal` entries; entries without `= ordinal` continue the
/// numbering from the previous member (starting at 1).
fn parse_enum_members(args: &[&str]) -> Result<EnumMembers, CodecError> {
    let mut members = Vec::with_capacity(args.len());
    let mut next_ordinal: i16 = 1;
    for arg in args {
        let (name, end) = text::read_quoted(arg, 0)
            .map_err(|_| parse_error(format!("malformed enum member '{}'", arg)))?;
        let rest = arg[end..].trim();
        let ordinal = if rest.is_empty() {
            next_ordinal
        } else {
            let value = rest
                .strip_prefix('=')
                .ok_or_else(|| parse_error(format!("malformed enum member '{}'", arg)))?;
            value
                .trim()
                .parse::<i16>()
                .map_err(|_| parse_error(format!("bad enum ordinal in '{}'", arg)))?
        };
        next_ordinal = ordinal.wrapping_add(1);
        members.push((name, ordinal));
    }
    Ok(EnumMembers::new(members))
}

/// Tuple elements may carry a name: `Tuple(id UInt64, tags Array(String))`.
fn parse_tuple_element(arg: &str) -> Result<TypeDescriptor, CodecError> {
    let (ident, rest) = eat_identifier(arg);
    let is_named = !ident.is_empty()
        && rest.starts_with(char::is_whitespace)
        && !rest.trim_start().starts_with('(');
    if is_named {
        rest.trim().parse()
    } else {
        arg.parse()
    }
}

fn parse_inner(arg: &str) -> Result<Box<TypeDescriptor>, CodecError> {
    Ok(Box::new(arg.parse()?))
}

impl FromStr for TypeDescriptor {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (ident, following) = eat_identifier(s);
        if ident.is_empty() {
            return Err(parse_error(format!("invalid empty identifier for type: '{}'", s)));
        }
        let following = following.trim();
        if following.is_empty() {
            return Ok(match ident {
                "String" => Self::String,
                "Int8" => Self::Int8,
                "Int16" => Self::Int16,
                "Int32" => Self::Int32,
                "Int64" => Self::Int64,
                "Bool" | "UInt8" => Self::UInt8,
                "UInt16" => Self::UInt16,
                "UInt32" => Self::UInt32,
                "UInt64" => Self::UInt64,
                "Float32" => Self::Float32,
                "Float64" => Self::Float64,
                "Date" => Self::Date,
                "DateTime" => Self::DateTime { timezone: None },
                "DateTime64" => Self::DateTime64 {
                    precision: DEFAULT_DATETIME64_PRECISION,
                    timezone: None,
                },
                "UUID" => Self::Uuid,
                _ => return Err(parse_error(format!("invalid type name: '{}'", ident))),
            });
        }

        let args = split_args(following)?;
        Ok(match ident {
            "Decimal" => match args.len() {
                1 => Self::decimal(parse_u8(args[0], "precision")?, 0),
                2 => Self::decimal(parse_u8(args[0], "precision")?, parse_u8(args[1], "scale")?),
                n => {
                    return Err(parse_error(format!(
                        "bad arg count for Decimal, expected 1 or 2 and got {}",
                        n
                    )))
                }
            },
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                expect_arity(ident, &args, 1)?;
                let precision = match ident {
                    "Decimal32" => 9,
                    "Decimal64" => 18,
                    "Decimal128" => 38,
                    _ => 76,
                };
                Self::decimal(precision, parse_u8(args[0], "scale")?)
            }
            "DateTime" => {
                expect_arity(ident, &args, 1)?;
                Self::datetime(Some(parse_timezone(args[0])?))
            }
            "DateTime64" => match args.len() {
                1 => Self::datetime64(parse_u8(args[0], "precision")?, None),
                2 => Self::datetime64(
                    parse_u8(args[0], "precision")?,
                    Some(parse_timezone(args[1])?),
                ),
                n => {
                    return Err(parse_error(format!(
                        "bad arg count for DateTime64, expected 1 or 2 and got {}",
                        n
                    )))
                }
            },
            "Enum8" => Self::Enum8(parse_enum_members(&args)?),
            "Enum16" => Self::Enum16(parse_enum_members(&args)?),
            "LowCardinality" => {
                expect_arity(ident, &args, 1)?;
                Self::LowCardinality(parse_inner(args[0])?)
            }
            "Array" => {
                expect_arity(ident, &args, 1)?;
                Self::Array(parse_inner(args[0])?)
            }
            "Nullable" => {
                expect_arity(ident, &args, 1)?;
                Self::Nullable(parse_inner(args[0])?)
            }
            "Tuple" => Self::Tuple(
                args.iter()
                    .map(|arg| parse_tuple_element(arg))
                    .collect::<Result<_, _>>()?,
            ),
            "Map" => {
                expect_arity(ident, &args, 2)?;
                Self::Map(parse_inner(args[0])?, parse_inner(args[1])?)
            }
            _ => {
                return Err(parse_error(format!(
                    "invalid type with arguments: '{}'",
                    ident
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_round_trip() {
        let names = [
            "String",
            "UInt64",
            "Map(LowCardinality(String), Int32)",
            "Array(Map(String, Array(Nullable(Float64))))",
            "Tuple(String, Int32, UUID)",
            "Decimal(18, 4)",
            "DateTime",
            "DateTime('UTC')",
            "DateTime64(3)",
            "DateTime64(6, 'Europe/Berlin')",
            "Enum8('a' = 1, 'b' = 2)",
            "Enum16('x, y)' = -300, 'it\\'s' = 7)",
            "Nullable(LowCardinality(String))",
        ];
        for name in names {
            let parsed: TypeDescriptor = name.parse().unwrap();
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn test_aliases_and_defaults() {
        assert_eq!("Bool".parse::<TypeDescriptor>().unwrap(), TypeDescriptor::UInt8);
        assert_eq!(
            "Decimal64(4)".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::decimal(18, 4)
        );
        assert_eq!(
            "Decimal(10)".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::decimal(10, 0)
        );
        assert_eq!(
            "DateTime64".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::datetime64(3, None)
        );
        assert_eq!(
            " Array( String ) ".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::array(TypeDescriptor::String)
        );
    }

    #[test]
    fn test_enum_implicit_ordinals() {
        let parsed: TypeDescriptor = "Enum8('a', 'b' = 5, 'c')".parse().unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::Enum8(EnumMembers::new([("a", 1), ("b", 5), ("c", 6)]))
        );
    }

    #[test]
    fn test_named_tuple_elements() {
        let parsed: TypeDescriptor = "Tuple(id UInt64, tags Array(String))".parse().unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::tuple(vec![
                TypeDescriptor::UInt64,
                TypeDescriptor::array(TypeDescriptor::String)
            ])
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "Strin",
            "Array(String",
            "Array(String, Int8)",
            "Map(String)",
            "Decimal(a, 2)",
            "DateTime64(3, 'Mars/Olympus')",
            "DateTime64(3, UTC)",
            "Enum8('a' = x)",
            "Tuple(String,,Int8)",
            "Nested(a String)",
        ] {
            assert!(
                matches!(bad.parse::<TypeDescriptor>(), Err(CodecError::TypeParse(_))),
                "expected TypeParse for {:?}",
                bad
            );
        }
    }
}
