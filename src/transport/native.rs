//! The native (RowBinary) transport.

use crate::transport::{BindExpression, Transport, TransportKind, WireEncoding};
use crate::types::TypeDescriptor;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransport;

impl NativeTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for NativeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Native
    }

    fn encoding(&self) -> WireEncoding {
        WireEncoding::Binary
    }

    fn result_format(&self) -> Option<&str> {
        None
    }

    /// Map parameters travel as a bound value that the server must rebuild
    /// with the `map` constructor.
    fn bind_expression(&self, descriptor: &TypeDescriptor) -> Option<BindExpression> {
        match descriptor.strip_wrappers() {
            TypeDescriptor::Map(..) => Some(BindExpression::FunctionCall("map")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_wraps_only_maps() {
        let t = NativeTransport::new();
        let map = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Int32);
        assert_eq!(
            t.bind_expression(&TypeDescriptor::nullable(map)),
            Some(BindExpression::FunctionCall("map"))
        );
        assert_eq!(t.bind_expression(&TypeDescriptor::array(TypeDescriptor::String)), None);
        assert_eq!(t.result_format(), None);
        assert!(t.is_null_token("NULL"));
    }
}
