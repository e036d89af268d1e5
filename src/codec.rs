// In: src/codec.rs

//! The `Codec` façade: one transport plus (optionally) a processor cache.
//!
//! This is the entry point the statement-execution layer uses. It derives
//! processors on demand, reuses them across calls, and offers batch variants
//! that fail as a whole on the first bad row.

use std::sync::Arc;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::processor::{self, BindProcessor, Direction, Processor, ProcessorCache, ResultProcessor};
use crate::transport::{BindExpression, Transport, WireValue};
use crate::types::{TypeDescriptor, Value};

fn wrong_direction(wanted: Direction, found: &Processor) -> CodecError {
    CodecError::InvalidType(format!(
        "expected a {:?} processor, found {:?}",
        wanted,
        found.direction()
    ))
}

#[derive(Debug)]
pub struct Codec {
    transport: Arc<dyn Transport>,
    cache: Option<ProcessorCache>,
}

impl Codec {
    /// A memoizing codec for `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            cache: Some(ProcessorCache::new(Arc::clone(&transport))),
            transport,
        }
    }

    /// A codec that derives a fresh processor for every call.
    pub fn without_cache(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: None,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        let transport = config.build_transport();
        log::info!(
            "Codec configured for {:?} transport (memoize_processors = {})",
            transport.kind(),
            config.memoize_processors
        );
        Ok(if config.memoize_processors {
            Self::new(transport)
        } else {
            Self::without_cache(transport)
        })
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The number of memoized processors (always 0 without a cache).
    pub fn cached_processors(&self) -> usize {
        self.cache.as_ref().map_or(0, ProcessorCache::len)
    }

    pub fn processor(
        &self,
        descriptor: &TypeDescriptor,
        direction: Direction,
    ) -> Result<Processor, CodecError> {
        match &self.cache {
            Some(cache) => cache.get_or_derive(descriptor, direction),
            None => processor::processor_for(descriptor, direction, &self.transport),
        }
    }

    pub fn bind_processor(&self, descriptor: &TypeDescriptor) -> Result<BindProcessor, CodecError> {
        match self.processor(descriptor, Direction::Bind)? {
            Processor::Bind(p) => Ok(p),
            other => Err(wrong_direction(Direction::Bind, &other)),
        }
    }

    pub fn result_processor(&self, descriptor: &TypeDescriptor) -> Result<ResultProcessor, CodecError> {
        match self.processor(descriptor, Direction::Result)? {
            Processor::Result(p) => Ok(p),
            other => Err(wrong_direction(Direction::Result, &other)),
        }
    }

    //==============================================================================
    // Single Values
    //==============================================================================

    pub fn bind(&self, descriptor: &TypeDescriptor, value: &Value) -> Result<WireValue, CodecError> {
        self.bind_processor(descriptor)?.process(value)
    }

    pub fn result(&self, descriptor: &TypeDescriptor, wire: &WireValue) -> Result<Value, CodecError> {
        self.result_processor(descriptor)?.process(wire)
    }

    /// Renders `value` as an inline SQL literal, whatever the transport.
    pub fn literal(&self, descriptor: &TypeDescriptor, value: &Value) -> Result<String, CodecError> {
        processor::literal_processor(descriptor, &self.transport)?
            .process(value)?
            .into_text()
    }

    pub fn bind_expression(&self, descriptor: &TypeDescriptor) -> Option<BindExpression> {
        processor::bind_expression(descriptor, self.transport.as_ref())
    }

    //==============================================================================
    // Batches
    //==============================================================================

    /// Binds every row; the first failure fails the batch and names its row.
    pub fn bind_batch(
        &self,
        descriptor: &TypeDescriptor,
        values: &[Value],
    ) -> Result<Vec<WireValue>, CodecError> {
        let processor = self.bind_processor(descriptor)?;
        values
            .iter()
            .enumerate()
            .map(|(row, value)| {
                processor
                    .process(value)
                    .map_err(|e| e.within(format!("row {}", row)))
            })
            .collect()
    }

    pub fn result_batch(
        &self,
        descriptor: &TypeDescriptor,
        wires: &[WireValue],
    ) -> Result<Vec<Value>, CodecError> {
        let processor = self.result_processor(descriptor)?;
        wires
            .iter()
            .enumerate()
            .map(|(row, wire)| {
                processor
                    .process(wire)
                    .map_err(|e| e.within(format!("row {}", row)))
            })
            .collect()
    }
}
