// Re-export the traits and types
pub mod traits;
pub mod alloy_encoder;

// Re-export everything for easy access
pub use traits::*;
pub use alloy_encoder::{encode_aggregate3, AtomicBatchBuilder};
