//! Ledger Store for the surety participant registry.
//!
//! Holds participant records and the global flags (administrator, operational
//! switch, caller allow-list). The store enforces *who* may call each primitive
//! and keeps records internally consistent, but carries no registration policy:
//! that lives in the governance engine, which is the only allow-listed caller
//! in a normal deployment.

pub mod access;
pub mod memory;
pub mod sled_backend;
pub mod transition;

pub use access::{check_access, is_allowed, AccessState, Operation};
pub use memory::MemoryLedger;
pub use sled_backend::SledLedger;

use surety_types::{Amount, Genesis, Participant, ParticipantId, ParticipantStatus};

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Caller {0} is not authorized for this operation")]
    Unauthorized(ParticipantId),
    #[error("Contract is paused")]
    ContractPaused,
    #[error("Participant {0} already exists")]
    DuplicateEntry(ParticipantId),
    #[error("Voter {voter} already voted for {participant}")]
    DuplicateVote {
        participant: ParticipantId,
        voter: ParticipantId,
    },
    #[error("Unknown participant {0}")]
    UnknownParticipant(ParticipantId),
    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: ParticipantStatus,
        to: ParticipantStatus,
    },
    #[error("Funding overflow for participant {0}")]
    AmountOverflow(ParticipantId),
    #[error("Ledger has not been initialized")]
    NotInitialized,
    #[error("Ledger already initialized with a different genesis")]
    AlreadyInitialized,
    #[error("Corrupt ledger data: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Ratification rule handed to [`LedgerStore::record_vote`]: given the
/// committed vote count and the active population, whether the record is
/// ratified. The store evaluates it inside the vote's write.
pub type QuorumRule = fn(votes: u64, active: u64) -> bool;

/// Abstract ledger store.
///
/// Mutating primitives take the calling identity first. Participant
/// primitives require an allow-listed caller and an operational ledger;
/// administration primitives require the administrator and ignore the
/// operational flag. Every primitive either commits fully or leaves the store
/// untouched.
pub trait LedgerStore: Send + Sync {
    /// Write the administrator, seed participant and `operational = true`.
    /// Re-running with the same genesis is a no-op.
    fn initialize(&self, genesis: &Genesis) -> Result<()>;

    fn administrator(&self) -> Result<ParticipantId>;

    /// Cumulative funding at which a registered participant becomes active.
    fn activation_threshold(&self) -> Amount;

    fn is_operational(&self) -> Result<bool>;
    fn set_operational(&self, caller: &ParticipantId, operational: bool) -> Result<()>;

    fn is_authorized_caller(&self, identity: &ParticipantId) -> Result<bool>;
    fn authorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()>;
    fn deauthorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId)
        -> Result<()>;

    /// Create a record for `address` with the sponsor's vote. A `pending`
    /// record starts `PendingVote`; otherwise it is `Registered` at once.
    fn register_participant(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        sponsor: &ParticipantId,
        pending: bool,
    ) -> Result<Participant>;

    /// Append `voter` to a pending record. If `quorum` holds for the new vote
    /// count against the current active count, the record moves to
    /// `Registered` in the same write.
    fn record_vote(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        voter: &ParticipantId,
        quorum: QuorumRule,
    ) -> Result<Participant>;

    /// Accumulate collateral, activating a registered record once the total
    /// reaches [`LedgerStore::activation_threshold`].
    fn add_funding(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        amount: Amount,
    ) -> Result<Participant>;

    fn get_participant(&self, address: &ParticipantId) -> Result<Option<Participant>>;
    fn list_participants(&self) -> Result<Vec<Participant>>;
    fn participant_count(&self) -> Result<u64>;
    /// Number of `Active` participants, maintained alongside activations.
    fn active_count(&self) -> Result<u64>;
}
