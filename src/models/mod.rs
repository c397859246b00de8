pub mod contract;
pub mod transaction;

pub use contract::*;
pub use transaction::*;
