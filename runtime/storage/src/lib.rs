pub mod store;
pub mod types;

pub use store::StateStore;
pub use types::*;
