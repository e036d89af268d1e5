//! The result processor chain.
//!
//! Text results are first parsed into an untyped [`Literal`] tree by the
//! recursive-descent parser in `kernels::literal`, then typed here by walking
//! the descriptor. Binary results are read straight off a cursor. Failures in
//! nested elements are wrapped with the element's position or key.

use hashbrown::HashSet;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::CodecError;
use crate::kernels::{binary, leb128, literal, text};
use crate::kernels::literal::Literal;
use crate::primitive;
use crate::processor::{BinaryResultFn, TextResultFn};
use crate::transport::Transport;
use crate::types::{TypeDescriptor, Value};

fn mismatch(expected: &str, found: &Literal) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

//==================================================================================
// 1. Top-Level Field Parsing
//==================================================================================

/// Turns one raw result field into a literal tree for `desc`.
///
/// Composite columns are parsed as full literals. Scalar columns arrive either
/// as a quoted literal or as a TabSeparated-escaped field; both become
/// `Quoted` content, so only the transport's NULL field spelling yields a
/// token the Nullable chain treats as NULL.
pub(crate) fn field_to_literal(
    desc: &TypeDescriptor,
    transport: &dyn Transport,
    field: &str,
) -> Result<Literal, CodecError> {
    if desc.is_nullable() && transport.is_null_field(field) {
        return Ok(Literal::Token(field.to_string()));
    }
    match desc.strip_wrappers() {
        TypeDescriptor::Map(..) => literal::parse(field).map_err(|e| match e {
            CodecError::MapParse(_) => e,
            other => CodecError::MapParse(other.to_string()),
        }),
        TypeDescriptor::Array(_) | TypeDescriptor::Tuple(_) => literal::parse(field),
        _ => match literal::parse_quoted_field(field) {
            Some(content) => Ok(Literal::Quoted(content)),
            None => Ok(Literal::Quoted(text::unescape_tsv(field)?)),
        },
    }
}

//==================================================================================
// 2. Text Chain
//==================================================================================

pub(crate) fn derive_text(desc: &TypeDescriptor, transport: &Arc<dyn Transport>) -> Arc<TextResultFn> {
    match desc {
        TypeDescriptor::LowCardinality(inner) => derive_text(inner, transport),

        TypeDescriptor::Nullable(inner) => {
            let inner = derive_text(inner, transport);
            let transport = Arc::clone(transport);
            Arc::new(move |lit: &Literal| match lit {
                Literal::Token(token) if transport.is_null_token(token) => Ok(Value::Null),
                other => inner(other),
            })
        }

        TypeDescriptor::Array(item) => {
            let item = derive_text(item, transport);
            Arc::new(move |lit: &Literal| {
                let Literal::Array(elements) = lit else {
                    return Err(mismatch("array", lit));
                };
                elements
                    .iter()
                    .enumerate()
                    .map(|(i, e)| item(e).map_err(|err| err.within(format!("element {}", i))))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            })
        }

        TypeDescriptor::Tuple(items) => {
            let elements: Vec<_> = items.iter().map(|t| derive_text(t, transport)).collect();
            Arc::new(move |lit: &Literal| {
                let Literal::Tuple(values) = lit else {
                    return Err(mismatch("tuple", lit));
                };
                if values.len() != elements.len() {
                    return Err(CodecError::ArityMismatch {
                        expected: elements.len(),
                        actual: values.len(),
                    });
                }
                elements
                    .iter()
                    .zip(values)
                    .enumerate()
                    .map(|(i, (element, v))| {
                        element(v).map_err(|err| err.within(format!("element {}", i)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Tuple)
            })
        }

        TypeDescriptor::Map(key, val) => {
            let key = derive_text(key, transport);
            let val = derive_text(val, transport);
            Arc::new(move |lit: &Literal| {
                let Literal::Map(pairs) = lit else {
                    return Err(mismatch("map", lit));
                };
                let mut seen = HashSet::with_capacity(pairs.len());
                let mut decoded = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let typed_key = key(k).map_err(|err| err.within(format!("key {}", k)))?;
                    if !seen.insert(typed_key.to_string()) {
                        return Err(CodecError::DuplicateMapKey(k.to_string())
                            .within(format!("key {}", k)));
                    }
                    let typed_value =
                        val(v).map_err(|err| err.within(format!("value for key {}", k)))?;
                    decoded.push((typed_key, typed_value));
                }
                Ok(Value::Map(decoded))
            })
        }

        scalar => {
            let scalar = scalar.clone();
            Arc::new(move |lit: &Literal| primitive::result_text(&scalar, lit))
        }
    }
}

//==================================================================================
// 3. Binary Chain
//==================================================================================

/// Every encoded element takes at least one byte, so a count larger than the
/// bytes left is corrupt and must not drive an allocation.
fn checked_count(cursor: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
    let count = leb128::decode_len(cursor)?;
    if count > binary::remaining(cursor) {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(count)
}

pub(crate) fn derive_binary(desc: &TypeDescriptor) -> Arc<BinaryResultFn> {
    match desc {
        TypeDescriptor::LowCardinality(inner) => derive_binary(inner),

        TypeDescriptor::Nullable(inner) => {
            let inner = derive_binary(inner);
            Arc::new(move |cursor: &mut Cursor<&[u8]>| {
                match binary::read_fixed::<u8>(cursor)? {
                    1 => Ok(Value::Null),
                    0 => inner(cursor),
                    marker => Err(CodecError::InvalidScalar {
                        type_name: "Nullable marker".to_string(),
                        raw: marker.to_string(),
                    }),
                }
            })
        }

        TypeDescriptor::Array(item) => {
            let item = derive_binary(item);
            Arc::new(move |cursor: &mut Cursor<&[u8]>| {
                let count = checked_count(cursor)?;
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(item(cursor).map_err(|err| err.within(format!("element {}", i)))?);
                }
                Ok(Value::Array(values))
            })
        }

        TypeDescriptor::Tuple(items) => {
            let elements: Vec<_> = items.iter().map(derive_binary).collect();
            Arc::new(move |cursor: &mut Cursor<&[u8]>| {
                let mut values = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    values.push(element(cursor).map_err(|err| err.within(format!("element {}", i)))?);
                }
                Ok(Value::Tuple(values))
            })
        }

        TypeDescriptor::Map(key, val) => {
            let key = derive_binary(key);
            let val = derive_binary(val);
            Arc::new(move |cursor: &mut Cursor<&[u8]>| {
                let count = checked_count(cursor)?;
                let mut seen = HashSet::with_capacity(count);
                let mut decoded = Vec::with_capacity(count);
                for i in 0..count {
                    let typed_key =
                        key(cursor).map_err(|err| err.within(format!("key at index {}", i)))?;
                    let rendered = typed_key.to_string();
                    if !seen.insert(rendered.clone()) {
                        return Err(CodecError::DuplicateMapKey(rendered.clone())
                            .within(format!("key {}", rendered)));
                    }
                    let typed_value = val(cursor)
                        .map_err(|err| err.within(format!("value for key {}", rendered)))?;
                    decoded.push((typed_key, typed_value));
                }
                Ok(Value::Map(decoded))
            })
        }

        scalar => {
            let scalar = scalar.clone();
            Arc::new(move |cursor: &mut Cursor<&[u8]>| primitive::result_binary(&scalar, cursor))
        }
    }
}
