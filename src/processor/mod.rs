//! This module is the public entry point for deriving processors.
//!
//! A processor is a pure function derived once from a `(TypeDescriptor,
//! Transport)` pair: bind processors turn host `Value`s into `WireValue`s,
//! result processors do the inverse. Composite descriptors are handled by
//! recursively composing the processors of their children (see `bind` and
//! `result`); scalars bottom out in the `primitive` codec.
//!
//! Processors hold their composed closures behind `Arc`, so cloning one is
//! cheap and a single derived processor can be shared across threads.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::CodecError;
use crate::kernels::binary;
use crate::kernels::literal::Literal;
use crate::transport::{self, BindExpression, Transport, WireEncoding, WireValue};
use crate::types::{TypeDescriptor, Value};

pub mod bind;
pub mod cache;
pub mod result;

pub use cache::ProcessorCache;

//==================================================================================
// I. Processor Closures
//==================================================================================

pub(crate) type TextBindFn = dyn Fn(&Value, &mut String) -> Result<(), CodecError> + Send + Sync;
pub(crate) type BinaryBindFn = dyn Fn(&Value, &mut Vec<u8>) -> Result<(), CodecError> + Send + Sync;
pub(crate) type TextResultFn = dyn Fn(&Literal) -> Result<Value, CodecError> + Send + Sync;
pub(crate) type BinaryResultFn =
    dyn Fn(&mut Cursor<&[u8]>) -> Result<Value, CodecError> + Send + Sync;

#[derive(Clone)]
enum BindChain {
    Text(Arc<TextBindFn>),
    Binary(Arc<BinaryBindFn>),
}

#[derive(Clone)]
enum ResultChain {
    Text(Arc<TextResultFn>),
    Binary(Arc<BinaryResultFn>),
}

/// Which way a processor converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host value → wire.
    Bind,
    /// Wire → host value.
    Result,
}

//==================================================================================
// II. Bind Processor
//==================================================================================

/// Serializes host values of one declared type.
#[derive(Clone)]
pub struct BindProcessor {
    descriptor: Arc<TypeDescriptor>,
    chain: BindChain,
}

impl BindProcessor {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn encoding(&self) -> WireEncoding {
        match self.chain {
            BindChain::Text(_) => WireEncoding::Text,
            BindChain::Binary(_) => WireEncoding::Binary,
        }
    }

    pub fn process(&self, value: &Value) -> Result<WireValue, CodecError> {
        match &self.chain {
            BindChain::Text(f) => {
                let mut out = String::new();
                f(value, &mut out)?;
                Ok(WireValue::Text(out))
            }
            BindChain::Binary(f) => {
                let mut out = Vec::new();
                f(value, &mut out)?;
                Ok(WireValue::Binary(out))
            }
        }
    }

    /// Returns `true` if both processors share the same derived closure chain.
    pub fn ptr_eq(&self, other: &BindProcessor) -> bool {
        match (&self.chain, &other.chain) {
            (BindChain::Text(a), BindChain::Text(b)) => Arc::ptr_eq(a, b),
            (BindChain::Binary(a), BindChain::Binary(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for BindProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindProcessor")
            .field("descriptor", &self.descriptor.to_string())
            .field("encoding", &self.encoding())
            .finish()
    }
}

//==================================================================================
// III. Result Processor
//==================================================================================

/// Deserializes wire values of one declared type.
#[derive(Clone)]
pub struct ResultProcessor {
    descriptor: Arc<TypeDescriptor>,
    transport: Arc<dyn Transport>,
    chain: ResultChain,
}

impl ResultProcessor {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn encoding(&self) -> WireEncoding {
        match self.chain {
            ResultChain::Text(_) => WireEncoding::Text,
            ResultChain::Binary(_) => WireEncoding::Binary,
        }
    }

    pub fn process(&self, wire: &WireValue) -> Result<Value, CodecError> {
        match (&self.chain, wire) {
            (ResultChain::Text(f), WireValue::Text(field)) => {
                let literal =
                    result::field_to_literal(&self.descriptor, self.transport.as_ref(), field)?;
                f(&literal)
            }
            (ResultChain::Binary(f), WireValue::Binary(bytes)) => {
                let mut cursor = Cursor::new(bytes.as_slice());
                let value = f(&mut cursor)?;
                match binary::remaining(&cursor) {
                    0 => Ok(value),
                    left => Err(CodecError::TrailingBytes(left)),
                }
            }
            (_, other) => Err(transport::mismatch(self.encoding(), other.encoding())),
        }
    }

    pub fn ptr_eq(&self, other: &ResultProcessor) -> bool {
        match (&self.chain, &other.chain) {
            (ResultChain::Text(a), ResultChain::Text(b)) => Arc::ptr_eq(a, b),
            (ResultChain::Binary(a), ResultChain::Binary(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ResultProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultProcessor")
            .field("descriptor", &self.descriptor.to_string())
            .field("encoding", &self.encoding())
            .finish()
    }
}

//==================================================================================
// IV. Direction-Tagged Processor
//==================================================================================

#[derive(Debug, Clone)]
pub enum Processor {
    Bind(BindProcessor),
    Result(ResultProcessor),
}

impl Processor {
    pub fn direction(&self) -> Direction {
        match self {
            Processor::Bind(_) => Direction::Bind,
            Processor::Result(_) => Direction::Result,
        }
    }

    pub fn as_bind(&self) -> Option<&BindProcessor> {
        match self {
            Processor::Bind(p) => Some(p),
            Processor::Result(_) => None,
        }
    }

    pub fn as_result(&self) -> Option<&ResultProcessor> {
        match self {
            Processor::Result(p) => Some(p),
            Processor::Bind(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &Processor) -> bool {
        match (self, other) {
            (Processor::Bind(a), Processor::Bind(b)) => a.ptr_eq(b),
            (Processor::Result(a), Processor::Result(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

//==================================================================================
// V. Public API
//==================================================================================

fn validated(descriptor: &TypeDescriptor) -> Result<Arc<TypeDescriptor>, CodecError> {
    descriptor.validate()?;
    Ok(Arc::new(descriptor.clone()))
}

/// Derives the processor for `descriptor` in `direction` under `transport`.
pub fn processor_for(
    descriptor: &TypeDescriptor,
    direction: Direction,
    transport: &Arc<dyn Transport>,
) -> Result<Processor, CodecError> {
    Ok(match direction {
        Direction::Bind => Processor::Bind(bind_processor(descriptor, transport)?),
        Direction::Result => Processor::Result(result_processor(descriptor, transport)?),
    })
}

pub fn bind_processor(
    descriptor: &TypeDescriptor,
    transport: &Arc<dyn Transport>,
) -> Result<BindProcessor, CodecError> {
    let descriptor = validated(descriptor)?;
    log::debug!(
        "Deriving bind processor for {} ({:?} transport)",
        descriptor,
        transport.kind()
    );
    let chain = match transport.encoding() {
        WireEncoding::Text => BindChain::Text(bind::derive_text(&descriptor, transport)),
        WireEncoding::Binary => BindChain::Binary(bind::derive_binary(&descriptor)),
    };
    Ok(BindProcessor { descriptor, chain })
}

pub fn result_processor(
    descriptor: &TypeDescriptor,
    transport: &Arc<dyn Transport>,
) -> Result<ResultProcessor, CodecError> {
    let descriptor = validated(descriptor)?;
    log::debug!(
        "Deriving result processor for {} ({:?} transport)",
        descriptor,
        transport.kind()
    );
    let chain = match transport.encoding() {
        WireEncoding::Text => ResultChain::Text(result::derive_text(&descriptor, transport)),
        WireEncoding::Binary => ResultChain::Binary(result::derive_binary(&descriptor)),
    };
    Ok(ResultProcessor {
        descriptor,
        transport: Arc::clone(transport),
        chain,
    })
}

/// Derives a processor that always renders an inline SQL literal, whatever
/// the transport's wire encoding.
pub fn literal_processor(
    descriptor: &TypeDescriptor,
    transport: &Arc<dyn Transport>,
) -> Result<BindProcessor, CodecError> {
    let descriptor = validated(descriptor)?;
    let chain = BindChain::Text(bind::derive_text(&descriptor, transport));
    Ok(BindProcessor { descriptor, chain })
}

/// The statement-level wrapping the transport requires for a bound parameter.
pub fn bind_expression(
    descriptor: &TypeDescriptor,
    transport: &dyn Transport,
) -> Option<BindExpression> {
    transport.bind_expression(descriptor)
}
