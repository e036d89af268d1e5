//! This module collects the pure, stateless byte and text kernels the codec is
//! built on. Kernels know nothing about type descriptors or transports; the
//! `primitive` and `processor` layers compose them.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Binary: variable-length integers for RowBinary length prefixes.
pub mod leb128;
/// Binary: fixed-width little-endian numbers and length-prefixed strings.
pub mod binary;

/// Text: quoting and unescaping of literals and TSV fields.
pub mod text;
/// Text: recursive-descent parser for composite literals.
pub mod literal;
