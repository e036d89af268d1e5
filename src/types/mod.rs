//! This module defines the core, strongly-typed representations shared by every
//! layer of the codec: the declared column type (`TypeDescriptor`) and the
//! host-side value (`Value`).
//!
//! Type names parse from and render to their canonical ClickHouse spelling, so
//! descriptors can be built either programmatically or from server metadata
//! such as `Map(LowCardinality(String), Int32)`.

pub mod parse;
pub mod type_descriptor;
pub mod value;

// Re-export the main types for easier access.
pub use type_descriptor::{EnumMembers, TypeDescriptor};
pub use value::Value;
