//! Reward distributor engine.
//!
//! A [`Distributor`] pays a fungible reward token to eligible addresses on a
//! cooldown-gated schedule. Eligibility comes from a Merkle-committed
//! allowlist or an owner-maintained stake registry; the token balance lives
//! on a [`got_token::TokenHost`] and "now" comes from a [`BlockClock`].

pub mod access;
pub mod accrual;
pub mod clock;
pub mod custodian;
pub mod distributor;
pub mod eligibility;
pub mod ledger;
pub mod types;

pub use access::AccessControl;
pub use accrual::{amount_due, periods_elapsed, AccrualPolicy, WEIGHT_SCALE};
pub use clock::{BlockClock, ManualClock, WallClock};
pub use custodian::TokenCustodian;
pub use distributor::{Distributor, DistributorConfig, DistributorState};
pub use eligibility::{EligibilityMode, EligibilitySet, StakeRegistry};
pub use ledger::{ClaimLedger, ClaimStatus};
pub use types::*;
