//! The transport adapter boundary.
//!
//! A transport decides how values travel on the wire: as RowBinary bytes
//! (native) or as SQL literal / TabSeparated text (HTTP). Processor derivation
//! never assumes a transport; the active adapter is passed explicitly into every
//! derivation call.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::CodecError;
use crate::kernels::text;
use crate::types::TypeDescriptor;

pub mod http;
pub mod native;

pub use http::HttpTransport;
pub use native::NativeTransport;

//==================================================================================
// I. Wire Vocabulary
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// RowBinary values over the native protocol.
    #[default]
    Native,
    /// SQL literal text for binds, TabSeparated fields for results.
    Http,
}

/// The physical form of a processed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireEncoding {
    Text,
    Binary,
}

impl WireEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            WireEncoding::Text => "text",
            WireEncoding::Binary => "binary",
        }
    }
}

/// A value as it travels to or from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Text(String),
    Binary(Vec<u8>),
}

impl WireValue {
    pub fn encoding(&self) -> WireEncoding {
        match self {
            WireValue::Text(_) => WireEncoding::Text,
            WireValue::Binary(_) => WireEncoding::Binary,
        }
    }

    pub fn as_text(&self) -> Result<&str, CodecError> {
        match self {
            WireValue::Text(s) => Ok(s),
            other => Err(mismatch(WireEncoding::Text, other.encoding())),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8], CodecError> {
        match self {
            WireValue::Binary(b) => Ok(b),
            other => Err(mismatch(WireEncoding::Binary, other.encoding())),
        }
    }

    pub fn into_text(self) -> Result<String, CodecError> {
        match self {
            WireValue::Text(s) => Ok(s),
            other => Err(mismatch(WireEncoding::Text, other.encoding())),
        }
    }
}

pub(crate) fn mismatch(expected: WireEncoding, found: WireEncoding) -> CodecError {
    CodecError::WireEncodingMismatch {
        expected: expected.name(),
        found: found.name(),
    }
}

/// How a bound parameter must be wrapped inside the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindExpression {
    /// Wrap the placeholder in a call to the named SQL function.
    FunctionCall(&'static str),
}

impl BindExpression {
    /// Applies the wrapping to a placeholder, e.g. `{p0:String}` → `map({p0:String})`.
    pub fn wrap(&self, placeholder: &str) -> String {
        match self {
            BindExpression::FunctionCall(function) => format!("{}({})", function, placeholder),
        }
    }
}

//==================================================================================
// II. The Transport Trait
//==================================================================================

/// The conventions a transport contributes to processor derivation.
pub trait Transport: Debug + Send + Sync {
    fn kind(&self) -> TransportKind;

    /// The wire form bind processors produce and result processors consume.
    fn encoding(&self) -> WireEncoding;

    /// Quotes and escapes a string for embedding in statement text.
    fn quote_literal(&self, value: &str) -> String {
        text::quote(value)
    }

    /// The NULL spelling used when rendering text.
    fn null_token(&self) -> &str {
        "NULL"
    }

    /// Whether an unquoted token inside a composite literal means NULL.
    fn is_null_token(&self, token: &str) -> bool {
        token == self.null_token()
    }

    /// Whether a whole top-level result field means NULL.
    fn is_null_field(&self, field: &str) -> bool {
        self.is_null_token(field)
    }

    /// The output format the caller must request so results can be parsed.
    fn result_format(&self) -> Option<&str>;

    /// Wrapping required around a bound parameter of type `descriptor`, if any.
    fn bind_expression(&self, descriptor: &TypeDescriptor) -> Option<BindExpression>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_value_accessors() {
        let text = WireValue::Text("1".to_string());
        assert_eq!(text.as_text().unwrap(), "1");
        assert!(matches!(
            text.as_binary(),
            Err(CodecError::WireEncodingMismatch {
                expected: "binary",
                found: "text"
            })
        ));
        assert_eq!(WireValue::Binary(vec![1]).as_binary().unwrap(), &[1]);
    }

    #[test]
    fn test_bind_expression_wraps_placeholder() {
        let expr = BindExpression::FunctionCall("map");
        assert_eq!(expr.wrap("{p0:String}"), "map({p0:String})");
    }

    #[test]
    fn test_transport_kind_serde() {
        assert_eq!(serde_json::to_string(&TransportKind::Http).unwrap(), "\"http\"");
        let kind: TransportKind = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(kind, TransportKind::Native);
    }
}
