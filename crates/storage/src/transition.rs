//! Record-level state transitions.
//!
//! Each function takes the current record and returns the next one without
//! touching storage. Backends validate with these, then commit the result in a
//! single write, so a rejected call never leaves a half-updated record.

use crate::{QuorumRule, StorageError};
use surety_types::{Amount, Participant, ParticipantId, ParticipantStatus};

/// Build the record for a new registration.
pub fn new_registration(
    existing: Option<&Participant>,
    address: ParticipantId,
    sponsor: ParticipantId,
    pending: bool,
) -> Result<Participant, StorageError> {
    if existing.is_some() {
        return Err(StorageError::DuplicateEntry(address));
    }
    Ok(Participant::sponsored(address, sponsor, pending))
}

/// Append a vote to a pending record and ratify it if `quorum` holds for the
/// new count against `active`.
pub fn with_vote(
    record: &Participant,
    voter: ParticipantId,
    active: u64,
    quorum: QuorumRule,
) -> Result<Participant, StorageError> {
    if !record.is_pending_vote() {
        return Err(StorageError::InvalidTransition {
            from: record.status,
            to: ParticipantStatus::Registered,
        });
    }
    if record.votes.contains(&voter) {
        return Err(StorageError::DuplicateVote {
            participant: record.address,
            voter,
        });
    }

    let mut next = record.clone();
    next.votes.insert(voter);
    if quorum(next.vote_count() as u64, active) {
        next.status = ParticipantStatus::Registered;
    }
    Ok(next)
}

/// Accumulate collateral. Returns the next record and whether this deposit
/// activated it.
///
/// Only a `Registered` record activates; pending records just accumulate.
pub fn with_funding(
    record: &Participant,
    amount: Amount,
    activation_threshold: Amount,
) -> Result<(Participant, bool), StorageError> {
    let total = record
        .funded_amount
        .checked_add(amount)
        .ok_or(StorageError::AmountOverflow(record.address))?;

    let mut next = record.clone();
    next.funded_amount = total;

    let activated =
        record.status == ParticipantStatus::Registered && total >= activation_threshold;
    if activated {
        next.status = ParticipantStatus::Active;
    }
    Ok((next, activated))
}
