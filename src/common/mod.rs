//! Cross-layer utilities.

pub mod binary;

pub use binary::{BinaryError, BinaryResult, ByteOrder};
