//! Caller authorization for ledger primitives.
//!
//! Every mutating primitive runs [`check_access`] before it touches state. The
//! decision is a pure function of the caller, the operation and a snapshot of
//! the ledger's access state, so both backends apply exactly the same rules.

use crate::StorageError;
use surety_types::ParticipantId;

/// Mutating primitives exposed by a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RegisterParticipant,
    RecordVote,
    AddFunding,
    SetOperational,
    AuthorizeCaller,
    DeauthorizeCaller,
}

impl Operation {
    /// Administration primitives are reserved for the deploying identity.
    pub fn requires_administrator(self) -> bool {
        matches!(
            self,
            Operation::SetOperational | Operation::AuthorizeCaller | Operation::DeauthorizeCaller
        )
    }

    /// Administration stays reachable while paused so the flag can always be
    /// switched back.
    pub fn gated_by_operational_flag(self) -> bool {
        !self.requires_administrator()
    }
}

/// Snapshot of the ledger state that access decisions depend on.
#[derive(Debug, Clone, Copy)]
pub struct AccessState<'a> {
    pub administrator: &'a ParticipantId,
    /// Whether the caller is on the allow-list
    pub caller_authorized: bool,
    pub operational: bool,
}

/// `(caller, operation) -> allowed`, ignoring the operational flag.
pub fn is_allowed(caller: &ParticipantId, operation: Operation, state: &AccessState<'_>) -> bool {
    if operation.requires_administrator() {
        caller == state.administrator
    } else {
        state.caller_authorized
    }
}

/// Full admission check: identity first, then the operational flag.
pub fn check_access(
    caller: &ParticipantId,
    operation: Operation,
    state: &AccessState<'_>,
) -> Result<(), StorageError> {
    if !is_allowed(caller, operation, state) {
        tracing::warn!(caller = %caller, ?operation, "ledger access denied");
        return Err(StorageError::Unauthorized(*caller));
    }
    if operation.gated_by_operational_flag() && !state.operational {
        return Err(StorageError::ContractPaused);
    }
    Ok(())
}
