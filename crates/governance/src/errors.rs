//! Error types for the Governance module

use surety_storage::StorageError;
use surety_types::{Amount, ParticipantId};
use thiserror::Error;

/// Errors that can occur in the Governance module
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Mutating call while the operational flag is off
    #[error("Contract is paused")]
    ContractPaused,

    /// Sponsor or voter has not posted the minimum funding
    #[error("Participant not yet funded: {0}")]
    NotFunded(ParticipantId),

    /// Single contribution below the configured minimum
    #[error("Insufficient funds: {amount} is below the minimum contribution of {minimum}")]
    InsufficientFunds { amount: Amount, minimum: Amount },

    /// Candidate already past the vote stage
    #[error("Participant already registered: {0}")]
    AlreadyRegistered(ParticipantId),

    #[error("Voter {voter} already voted for {candidate}")]
    DuplicateVote {
        candidate: ParticipantId,
        voter: ParticipantId,
    },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// Funding attempted before the participant was ratified
    #[error("Participant awaiting ratification: {0}")]
    AwaitingRatification(ParticipantId),

    #[error("Caller not authorized: {0}")]
    Unauthorized(ParticipantId),

    /// Configuration source error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ledger store error
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for GovernanceError {
    /// Rejections the engine also raises itself keep the engine variant, so
    /// callers match one name whichever layer refused the call.
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unauthorized(id) => GovernanceError::Unauthorized(id),
            StorageError::ContractPaused => GovernanceError::ContractPaused,
            StorageError::DuplicateEntry(id) => GovernanceError::AlreadyRegistered(id),
            StorageError::DuplicateVote { participant, voter } => GovernanceError::DuplicateVote {
                candidate: participant,
                voter,
            },
            StorageError::UnknownParticipant(id) => GovernanceError::UnknownParticipant(id),
            other => GovernanceError::Storage(other),
        }
    }
}

/// Flattened error category, independent of which layer rejected the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    ContractPaused,
    NotFunded,
    InsufficientFunds,
    DuplicateEntry,
    DuplicateVote,
    UnknownParticipant,
    AwaitingRatification,
    InvalidTransition,
    AmountOverflow,
    NotInitialized,
    AlreadyInitialized,
    Configuration,
    Storage,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::ContractPaused => ErrorKind::ContractPaused,
            GovernanceError::NotFunded(_) => ErrorKind::NotFunded,
            GovernanceError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            GovernanceError::AlreadyRegistered(_) => ErrorKind::DuplicateEntry,
            GovernanceError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            GovernanceError::UnknownParticipant(_) => ErrorKind::UnknownParticipant,
            GovernanceError::AwaitingRatification(_) => ErrorKind::AwaitingRatification,
            GovernanceError::Unauthorized(_) => ErrorKind::Unauthorized,
            GovernanceError::Config(_) | GovernanceError::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            GovernanceError::Storage(err) => match err {
                StorageError::Unauthorized(_) => ErrorKind::Unauthorized,
                StorageError::ContractPaused => ErrorKind::ContractPaused,
                StorageError::DuplicateEntry(_) => ErrorKind::DuplicateEntry,
                StorageError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
                StorageError::UnknownParticipant(_) => ErrorKind::UnknownParticipant,
                StorageError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                StorageError::AmountOverflow(_) => ErrorKind::AmountOverflow,
                StorageError::NotInitialized => ErrorKind::NotInitialized,
                StorageError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
                StorageError::Database(_)
                | StorageError::Serialization(_)
                | StorageError::Corrupt(_) => ErrorKind::Storage,
            },
        }
    }
}

/// Result type for Governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_rejections_map_to_engine_variants() {
        let id = ParticipantId::from_label("x");
        assert!(matches!(
            GovernanceError::from(StorageError::Unauthorized(id)),
            GovernanceError::Unauthorized(got) if got == id
        ));
        assert!(matches!(
            GovernanceError::from(StorageError::DuplicateEntry(id)),
            GovernanceError::AlreadyRegistered(got) if got == id
        ));
        assert!(matches!(
            GovernanceError::from(StorageError::NotInitialized),
            GovernanceError::Storage(StorageError::NotInitialized)
        ));
    }

    #[test]
    fn storage_errors_keep_their_kind() {
        let paused = GovernanceError::from(StorageError::ContractPaused);
        assert_eq!(paused.kind(), ErrorKind::ContractPaused);
        assert_eq!(GovernanceError::ContractPaused.kind(), ErrorKind::ContractPaused);

        let id = ParticipantId::from_label("x");
        assert_eq!(
            GovernanceError::from(StorageError::Unauthorized(id)).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            GovernanceError::AlreadyRegistered(id).kind(),
            GovernanceError::from(StorageError::DuplicateEntry(id)).kind()
        );
    }
}
