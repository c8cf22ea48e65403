pub mod byte_order;
pub mod dtype;

// Re-export types for convenience.
pub use crate::types::byte_order::ByteOrder;
pub use crate::types::dtype::{DType, Descr};
