//! Shared value types for the surety ledger: participant identities,
//! collateral amounts and participant records.

pub mod amount;
pub mod identity;
pub mod participant;

pub use amount::*;
pub use identity::*;
pub use participant::*;
