// In: src/error.rs

//! This module defines the single, unified error type for the entire codec.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

/// Convenience alias used by every fallible codec operation.
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    // =========================================================================
    // === Bind (encode) Errors
    // =========================================================================
    /// The host value cannot be represented in the target type or transport.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Unknown enum member: {0}")]
    UnknownEnumMember(String),

    #[error("Tuple arity mismatch: descriptor has {expected} elements, value has {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    // =========================================================================
    // === Result (decode) Errors
    // =========================================================================
    #[error("Failed to parse map literal: {0}")]
    MapParse(String),

    /// A nested element failed to decode under its declared inner type.
    /// `element` names the failing key, value, index or row.
    #[error("Failed to decode {element}: {source}")]
    Decode {
        element: String,
        #[source]
        source: Box<CodecError>,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Malformed literal at byte {position}: {message}")]
    LiteralParse { position: usize, message: String },

    #[error("Invalid {type_name} value: '{raw}'")]
    InvalidScalar { type_name: String, raw: String },

    #[error("Duplicate map key {0}")]
    DuplicateMapKey(String),

    // =========================================================================
    // === Binary Framing Errors
    // =========================================================================
    #[error("Unexpected end of buffer")]
    UnexpectedEof,

    #[error("Trailing bytes after value: {0} byte(s) left unconsumed")]
    TrailingBytes(usize),

    #[error("LEB128 decoding error: {0}")]
    Leb128(String),

    #[error("Wire encoding mismatch: processor expects {expected}, got {found}")]
    WireEncodingMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // =========================================================================
    // === Type Descriptor Errors
    // =========================================================================
    #[error("Failed to parse type name: {0}")]
    TypeParse(String),

    #[error("Invalid type descriptor: {0}")]
    InvalidType(String),

    // =========================================================================
    // === Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g. a config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl CodecError {
    /// Wraps `self` as the cause of a failure on a named nested element.
    pub fn within(self, element: impl Into<String>) -> Self {
        CodecError::Decode {
            element: element.into(),
            source: Box::new(self),
        }
    }

    /// Follows the chain of `Decode` wrappers down to the originating error.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::Decode { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_nests_and_root_cause_unwraps() {
        let err = CodecError::UnexpectedEof.within("element 2").within("row 0");
        assert_eq!(
            err.to_string(),
            "Failed to decode row 0: Failed to decode element 2: Unexpected end of buffer"
        );
        assert!(matches!(err.root_cause(), CodecError::UnexpectedEof));
    }
}
