//! This file is the root of the `clickhouse_codec` crate.
//!
//! The crate converts between ClickHouse column types and host values, in both
//! directions, for the native (RowBinary) and HTTP (text) transports. Its
//! responsibilities are strictly limited to:
//! 1.  Declaring the top-level modules, leaf-first: byte/text `kernels`, the
//!     `types` model, the scalar `primitive` codec, the `transport` adapters and
//!     the recursive `processor` chains.
//! 2.  Re-exporting the handful of types most callers need.
//!
//! ```ignore
//! use clickhouse_codec::{Codec, HttpTransport, TypeDescriptor, Value};
//! use std::sync::Arc;
//!
//! let codec = Codec::new(Arc::new(HttpTransport::new()));
//! let ty: TypeDescriptor = "Array(String)".parse()?;
//! let wire = codec.bind(&ty, &Value::from(vec!["x", "y"]))?;
//! assert_eq!(wire.as_text()?, "['x', 'y']");
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod codec;
pub mod config;
pub mod error;
pub mod kernels;
pub mod observability;
pub mod primitive;
pub mod processor;
pub mod transport;
pub mod types;

//==================================================================================
// 2. Re-exports
//==================================================================================
pub use codec::Codec;
pub use config::CodecConfig;
pub use error::{CodecError, Result};
pub use processor::{
    bind_expression, bind_processor, literal_processor, processor_for, result_processor,
    BindProcessor, Direction, Processor, ProcessorCache, ResultProcessor,
};
pub use transport::{
    BindExpression, HttpTransport, NativeTransport, Transport, TransportKind, WireEncoding,
    WireValue,
};
pub use types::{EnumMembers, TypeDescriptor, Value};
