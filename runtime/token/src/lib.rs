pub mod accounts;
pub mod host;
pub mod ledger;
pub mod types;

pub use accounts::TokenAccount;
pub use host::{SharedTokenHost, TokenHost, TokenRegistry};
pub use ledger::TokenLedger;
pub use types::*;
