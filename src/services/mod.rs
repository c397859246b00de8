pub mod confirmation;
pub mod orchestrator;

pub use confirmation::*;
pub use orchestrator::*;
