pub mod abi;
pub mod artifact;
pub mod encoding;
pub mod execution;

// Re-export key types for convenience
pub use artifact::*;
pub use encoding::*;
pub use execution::*;
