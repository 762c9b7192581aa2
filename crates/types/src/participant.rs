use crate::{Amount, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle stage of a participant.
///
/// Stages only ever move forward. `Unregistered` is what queries report for an
/// identity with no record; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Unregistered,
    /// Waiting for enough sponsor votes to be ratified
    PendingVote,
    /// Ratified, collateral not yet complete
    Registered,
    /// Funded; may sponsor and vote
    Active,
}

impl ParticipantStatus {
    /// Whether moving from `self` to `next` is a legal forward step.
    pub fn can_advance_to(self, next: ParticipantStatus) -> bool {
        matches!(
            (self, next),
            (ParticipantStatus::PendingVote, ParticipantStatus::Registered)
                | (ParticipantStatus::Registered, ParticipantStatus::Active)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantStatus::Unregistered => "unregistered",
            ParticipantStatus::PendingVote => "pending_vote",
            ParticipantStatus::Registered => "registered",
            ParticipantStatus::Active => "active",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant record as held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: ParticipantId,
    pub status: ParticipantStatus,
    /// Distinct sponsors that endorsed the registration
    pub votes: BTreeSet<ParticipantId>,
    pub funded_amount: Amount,
    /// Who first registered this participant (`None` for the seed)
    pub sponsor: Option<ParticipantId>,
}

impl Participant {
    /// Seed record created at initialization: registered without a vote.
    pub fn seeded(address: ParticipantId) -> Self {
        Self {
            address,
            status: ParticipantStatus::Registered,
            votes: BTreeSet::new(),
            funded_amount: Amount::ZERO,
            sponsor: None,
        }
    }

    /// Record created by a sponsor. A pending record counts the sponsor's
    /// endorsement as its first vote.
    pub fn sponsored(address: ParticipantId, sponsor: ParticipantId, pending: bool) -> Self {
        let mut votes = BTreeSet::new();
        votes.insert(sponsor);
        Self {
            address,
            status: if pending {
                ParticipantStatus::PendingVote
            } else {
                ParticipantStatus::Registered
            },
            votes,
            funded_amount: Amount::ZERO,
            sponsor: Some(sponsor),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    pub fn is_pending_vote(&self) -> bool {
        self.status == ParticipantStatus::PendingVote
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}

/// Parameters fixed when a ledger is first initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Deploying identity; the only one allowed to toggle the operational flag
    /// and administer the caller allow-list
    pub administrator: ParticipantId,
    pub seed_participant: ParticipantId,
}

impl Genesis {
    pub fn new(administrator: ParticipantId, seed_participant: ParticipantId) -> Self {
        Self {
            administrator,
            seed_participant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use ParticipantStatus::*;
        assert!(PendingVote.can_advance_to(Registered));
        assert!(Registered.can_advance_to(Active));
        assert!(!Active.can_advance_to(Registered));
        assert!(!PendingVote.can_advance_to(Active));
        assert!(!Registered.can_advance_to(PendingVote));
        assert!(!Unregistered.can_advance_to(Registered));
    }

    #[test]
    fn sponsored_pending_record_counts_sponsor_vote() {
        let sponsor = ParticipantId::from_label("sponsor");
        let p = Participant::sponsored(ParticipantId::from_label("candidate"), sponsor, true);
        assert!(p.is_pending_vote());
        assert_eq!(p.vote_count(), 1);
        assert!(p.votes.contains(&sponsor));
        assert_eq!(p.sponsor, Some(sponsor));
    }

    #[test]
    fn seed_record_has_no_votes_or_funding() {
        let p = Participant::seeded(ParticipantId::from_label("seed"));
        assert_eq!(p.status, ParticipantStatus::Registered);
        assert!(p.votes.is_empty());
        assert!(p.funded_amount.is_zero());
        assert!(p.sponsor.is_none());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let p = Participant::sponsored(
            ParticipantId::from_label("candidate"),
            ParticipantId::from_label("sponsor"),
            false,
        );
        let json = serde_json::to_vec(&p).unwrap();
        let back: Participant = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, p);
    }
}
