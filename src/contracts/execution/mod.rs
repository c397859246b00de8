// Re-export existing traits and implementations
pub mod traits;
pub mod alloy_executor;
pub mod alloy_status;

// Re-export everything for easy access
pub use traits::*;
pub use alloy_executor::AlloyExecutor;
pub use alloy_status::AlloyStatusSource;
