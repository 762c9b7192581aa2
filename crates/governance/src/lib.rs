//! Surety Governance Module
//!
//! Implements the participant lifecycle on top of a [`surety_storage::LedgerStore`]:
//! - sponsor-driven registration, direct while the active population is small
//! - quorum ratification (`votes * 2 >= active`) once it is not
//! - collateral funding that activates participants
//! - the administrator's operational switch that pauses all mutations

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod quorum;

pub use self::config::*;
pub use engine::*;
pub use errors::*;
pub use events::*;
pub use quorum::*;

/// Governance module version (for API introspection)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
