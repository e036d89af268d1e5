//! The bind processor chain.
//!
//! One recursive derive function per wire encoding, with one `match` arm per
//! composite variant. Each arm derives its children once and captures them in
//! the returned closure; scalars delegate to the `primitive` codec.

use hashbrown::HashSet;
use std::sync::Arc;

use crate::error::CodecError;
use crate::kernels::leb128;
use crate::primitive;
use crate::processor::{BinaryBindFn, TextBindFn};
use crate::transport::Transport;
use crate::types::{TypeDescriptor, Value};

fn expected(kind: &str, value: &Value) -> CodecError {
    CodecError::Encoding(format!("expected {} value, got {}", kind, value.kind_name()))
}

fn duplicate_key(key: &Value) -> CodecError {
    CodecError::Encoding(format!("duplicate map key {}", key))
}

//==================================================================================
// 1. Text (SQL literal) Chain
//==================================================================================

pub(crate) fn derive_text(desc: &TypeDescriptor, transport: &Arc<dyn Transport>) -> Arc<TextBindFn> {
    match desc {
        TypeDescriptor::LowCardinality(inner) => derive_text(inner, transport),

        TypeDescriptor::Nullable(inner) => {
            let inner = derive_text(inner, transport);
            let transport = Arc::clone(transport);
            Arc::new(move |value: &Value, out: &mut String| match value {
                Value::Null => {
                    out.push_str(transport.null_token());
                    Ok(())
                }
                other => inner(other, out),
            })
        }

        TypeDescriptor::Array(item) => {
            let item = derive_text(item, transport);
            Arc::new(move |value: &Value, out: &mut String| {
                let Value::Array(items) = value else {
                    return Err(expected("Array", value));
                };
                out.push('[');
                for (i, element) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item(element, out)?;
                }
                out.push(']');
                Ok(())
            })
        }

        TypeDescriptor::Tuple(items) => {
            let elements: Vec<_> = items.iter().map(|t| derive_text(t, transport)).collect();
            Arc::new(move |value: &Value, out: &mut String| {
                let Value::Tuple(values) = value else {
                    return Err(expected("Tuple", value));
                };
                if values.len() != elements.len() {
                    return Err(CodecError::ArityMismatch {
                        expected: elements.len(),
                        actual: values.len(),
                    });
                }
                // `(x)` is just a parenthesized expression; one-element tuples need the call form.
                out.push_str(if elements.len() == 1 { "tuple(" } else { "(" });
                for (i, (element, v)) in elements.iter().zip(values).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    element(v, out)?;
                }
                out.push(')');
                Ok(())
            })
        }

        TypeDescriptor::Map(key, val) => {
            let key = derive_text(key, transport);
            let val = derive_text(val, transport);
            Arc::new(move |value: &Value, out: &mut String| {
                let Value::Map(pairs) = value else {
                    return Err(expected("Map", value));
                };
                let mut seen = HashSet::with_capacity(pairs.len());
                out.push_str("map(");
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let mut rendered_key = String::new();
                    key(k, &mut rendered_key)?;
                    out.push_str(&rendered_key);
                    if !seen.insert(rendered_key) {
                        return Err(duplicate_key(k));
                    }
                    out.push_str(", ");
                    val(v, out)?;
                }
                out.push(')');
                Ok(())
            })
        }

        scalar => {
            let scalar = scalar.clone();
            let transport = Arc::clone(transport);
            Arc::new(move |value: &Value, out: &mut String| {
                primitive::bind_text(&scalar, value, transport.as_ref(), out)
            })
        }
    }
}

//==================================================================================
// 2. Binary (RowBinary) Chain
//==================================================================================

pub(crate) fn derive_binary(desc: &TypeDescriptor) -> Arc<BinaryBindFn> {
    match desc {
        TypeDescriptor::LowCardinality(inner) => derive_binary(inner),

        TypeDescriptor::Nullable(inner) => {
            let inner = derive_binary(inner);
            Arc::new(move |value: &Value, out: &mut Vec<u8>| match value {
                Value::Null => {
                    out.push(1);
                    Ok(())
                }
                other => {
                    out.push(0);
                    inner(other, out)
                }
            })
        }

        TypeDescriptor::Array(item) => {
            let item = derive_binary(item);
            Arc::new(move |value: &Value, out: &mut Vec<u8>| {
                let Value::Array(items) = value else {
                    return Err(expected("Array", value));
                };
                leb128::encode_one(items.len() as u64, out)?;
                items.iter().try_for_each(|element| item(element, out))
            })
        }

        TypeDescriptor::Tuple(items) => {
            let elements: Vec<_> = items.iter().map(derive_binary).collect();
            Arc::new(move |value: &Value, out: &mut Vec<u8>| {
                let Value::Tuple(values) = value else {
                    return Err(expected("Tuple", value));
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
                    .try_for_each(|(element, v)| element(v, out))
            })
        }

        TypeDescriptor::Map(key, val) => {
            let key = derive_binary(key);
            let val = derive_binary(val);
            Arc::new(move |value: &Value, out: &mut Vec<u8>| {
                let Value::Map(pairs) = value else {
                    return Err(expected("Map", value));
                };
                leb128::encode_one(pairs.len() as u64, out)?;
                let mut seen = HashSet::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let start = out.len();
                    key(k, out)?;
                    if !seen.insert(out[start..].to_vec()) {
                        return Err(duplicate_key(k));
                    }
                    val(v, out)?;
                }
                Ok(())
            })
        }

        scalar => {
            let scalar = scalar.clone();
            Arc::new(move |value: &Value, out: &mut Vec<u8>| primitive::bind_binary(&scalar, value, out))
        }
    }
}
