//! Memoization of derived processors.
//!
//! Derivation is deterministic and side-effect free, so one processor per
//! `(descriptor, direction)` can be shared by every caller of a transport. The
//! map is read-mostly: lookups take a shared lock and only a miss takes the
//! write lock.

use hashbrown::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::CodecError;
use crate::processor::{self, Direction, Processor};
use crate::transport::Transport;
use crate::types::TypeDescriptor;

type CacheKey = (TypeDescriptor, Direction);

/// A concurrency-safe processor cache bound to one transport.
#[derive(Debug)]
pub struct ProcessorCache {
    transport: Arc<dyn Transport>,
    entries: RwLock<HashMap<CacheKey, Processor>>,
}

impl ProcessorCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns the cached processor, deriving and storing it on a miss.
    ///
    /// Two threads missing on the same key may both derive; the first insert
    /// wins and both callers receive that processor.
    pub fn get_or_derive(
        &self,
        descriptor: &TypeDescriptor,
        direction: Direction,
    ) -> Result<Processor, CodecError> {
        let key = (descriptor.clone(), direction);
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = entries.get(&key) {
                return Ok(found.clone());
            }
        }

        log::trace!("Processor cache miss for {} ({:?})", descriptor, direction);
        let derived = processor::processor_for(descriptor, direction, &self.transport)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(key).or_insert(derived).clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
