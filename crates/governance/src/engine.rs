//! Governance engine: registration, ratification votes, funding and the
//! operational switch.
//!
//! The engine is the only allow-listed caller of the ledger's participant
//! primitives. Every mutating call runs under one writer lock, so the sponsor
//! check, the quorum evaluation and the final write all see the same
//! population. Each call ends in at most one ledger write, which either
//! commits or fails without side effects.

use crate::config::GovernanceConfig;
use crate::errors::{GovernanceError, Result};
use crate::events::{EventJournal, EventKind, GovernanceEvent};
use crate::quorum::{quorum_reached, required_votes, requires_vote};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use surety_storage::{LedgerStore, StorageError};
use surety_types::{Amount, Genesis, Participant, ParticipantId, ParticipantStatus};
use tracing::{debug, info};

/// Result of a registration attempt or vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationOutcome {
    /// Registered without a vote (population below the multiparty threshold)
    Registered,
    /// Waiting for more votes
    Pending { votes: u64, required: u64 },
    /// This call supplied the deciding vote
    Ratified { votes: u64 },
}

/// Result of a funding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingOutcome {
    pub total: Amount,
    pub status: ParticipantStatus,
    /// Whether this deposit activated the participant
    pub activated: bool,
}

pub struct GovernanceEngine<S: LedgerStore> {
    store: Arc<S>,
    identity: ParticipantId,
    config: GovernanceConfig,
    write_lock: Mutex<()>,
    journal: EventJournal,
}

impl<S: LedgerStore> GovernanceEngine<S> {
    /// Build an engine acting as `identity` on an initialized store.
    ///
    /// The store's activation threshold must equal `config.min_funding`.
    pub fn new(store: Arc<S>, identity: ParticipantId, config: GovernanceConfig) -> Result<Self> {
        config.validate()?;
        if store.activation_threshold() != config.min_funding() {
            return Err(GovernanceError::InvalidConfig(format!(
                "ledger activates at {} but min_funding is {}",
                store.activation_threshold(),
                config.min_funding()
            )));
        }
        // Fails fast on an uninitialized store.
        store.administrator()?;

        let journal = EventJournal::new(config.event_capacity);
        Ok(Self {
            store,
            identity,
            config,
            write_lock: Mutex::new(()),
            journal,
        })
    }

    /// Deployment path: initialize `store` from `genesis`, allow-list
    /// `identity` on behalf of the administrator, then build the engine.
    pub fn bootstrap(
        store: Arc<S>,
        genesis: &Genesis,
        identity: ParticipantId,
        config: GovernanceConfig,
    ) -> Result<Self> {
        store.initialize(genesis)?;
        store.authorize_caller(&genesis.administrator, &identity)?;
        let engine = Self::new(store, identity, config)?;
        engine.journal.record(EventKind::CallerAuthorized { identity });
        Ok(engine)
    }

    pub fn identity(&self) -> &ParticipantId {
        &self.identity
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Toggle the operational flag. Administrator only; works while paused.
    pub fn set_operating_status(&self, caller: &ParticipantId, operational: bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.store.set_operational(caller, operational)?;
        info!(caller = %caller, operational, "operating status changed");
        self.journal
            .record(EventKind::OperatingStatusChanged { operational });
        Ok(())
    }

    /// Allow-list `identity` on the ledger. Administrator only.
    pub fn authorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.store.authorize_caller(caller, identity)?;
        self.journal.record(EventKind::CallerAuthorized {
            identity: *identity,
        });
        Ok(())
    }

    pub fn deauthorize_caller(
        &self,
        caller: &ParticipantId,
        identity: &ParticipantId,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.store.deauthorize_caller(caller, identity)?;
        self.journal.record(EventKind::CallerDeauthorized {
            identity: *identity,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Participant workflow
    // ------------------------------------------------------------------

    /// Register `candidate` on behalf of an active `sponsor`.
    ///
    /// Calling this for a candidate that is already pending counts as the
    /// sponsor's vote for it.
    pub fn register_participant(
        &self,
        sponsor: &ParticipantId,
        candidate: &ParticipantId,
    ) -> Result<RegistrationOutcome> {
        let _guard = self.write_lock.lock();
        self.ensure_operational()?;
        self.ensure_active(sponsor)?;

        match self.store.get_participant(candidate)? {
            None => self.admit_new(sponsor, candidate),
            Some(record) if record.is_pending_vote() => self.cast_vote(sponsor, &record),
            Some(_) => {
                debug!(candidate = %candidate, "registration rejected: already registered");
                Err(GovernanceError::AlreadyRegistered(*candidate))
            }
        }
    }

    /// Vote for a pending candidate.
    pub fn vote(
        &self,
        voter: &ParticipantId,
        candidate: &ParticipantId,
    ) -> Result<RegistrationOutcome> {
        let _guard = self.write_lock.lock();
        self.ensure_operational()?;
        self.ensure_active(voter)?;

        let record = self
            .store
            .get_participant(candidate)?
            .ok_or(GovernanceError::UnknownParticipant(*candidate))?;
        if !record.is_pending_vote() {
            return Err(GovernanceError::AlreadyRegistered(*candidate));
        }
        self.cast_vote(voter, &record)
    }

    /// Post collateral for `participant`.
    ///
    /// Contributions below `min_contribution` are rejected outright. Anything
    /// above the activation threshold is kept; no change is returned.
    pub fn fund(&self, participant: &ParticipantId, amount: Amount) -> Result<FundingOutcome> {
        let _guard = self.write_lock.lock();
        self.ensure_operational()?;

        let minimum = self.config.min_contribution();
        if amount < minimum {
            debug!(participant = %participant, %amount, "funding rejected: below minimum");
            return Err(GovernanceError::InsufficientFunds { amount, minimum });
        }

        let record = self
            .store
            .get_participant(participant)?
            .ok_or(GovernanceError::UnknownParticipant(*participant))?;
        if record.is_pending_vote() {
            return Err(GovernanceError::AwaitingRatification(*participant));
        }

        let updated = self.store.add_funding(&self.identity, participant, amount)?;
        let activated = !record.is_active() && updated.is_active();

        self.journal.record(EventKind::FundingReceived {
            participant: *participant,
            amount,
            total: updated.funded_amount,
        });
        if activated {
            info!(participant = %participant, total = %updated.funded_amount, "participant activated");
            self.journal.record(EventKind::ParticipantActivated {
                participant: *participant,
                total: updated.funded_amount,
            });
        }

        Ok(FundingOutcome {
            total: updated.funded_amount,
            status: updated.status,
            activated,
        })
    }

    fn admit_new(
        &self,
        sponsor: &ParticipantId,
        candidate: &ParticipantId,
    ) -> Result<RegistrationOutcome> {
        let active = self.store.active_count()?;

        if !requires_vote(active, self.config.multiparty_threshold) {
            self.store
                .register_participant(&self.identity, candidate, sponsor, false)?;
            info!(candidate = %candidate, sponsor = %sponsor, active, "participant registered");
            self.journal.record(EventKind::ParticipantRegistered {
                participant: *candidate,
                sponsor: *sponsor,
            });
            return Ok(RegistrationOutcome::Registered);
        }

        // The sponsor's endorsement is the first vote; with a small active
        // population it can already carry the quorum.
        if quorum_reached(1, active) {
            self.store
                .register_participant(&self.identity, candidate, sponsor, false)?;
            info!(candidate = %candidate, sponsor = %sponsor, active, "participant ratified on registration");
            self.journal.record(EventKind::ParticipantRatified {
                participant: *candidate,
                votes: 1,
                active,
            });
            return Ok(RegistrationOutcome::Ratified { votes: 1 });
        }

        self.store
            .register_participant(&self.identity, candidate, sponsor, true)?;
        let required = required_votes(active);
        info!(candidate = %candidate, sponsor = %sponsor, active, required, "participant pending vote");
        self.journal.record(EventKind::ParticipantPending {
            participant: *candidate,
            sponsor: *sponsor,
            required_votes: required,
        });
        Ok(RegistrationOutcome::Pending { votes: 1, required })
    }

    fn cast_vote(&self, voter: &ParticipantId, record: &Participant) -> Result<RegistrationOutcome> {
        if record.votes.contains(voter) {
            debug!(candidate = %record.address, voter = %voter, "vote rejected: duplicate");
            return Err(GovernanceError::DuplicateVote {
                candidate: record.address,
                voter: *voter,
            });
        }

        // Ratification is decided inside the store's write, against the
        // committed votes and active count.
        let updated = self
            .store
            .record_vote(&self.identity, &record.address, voter, quorum_reached)
            .map_err(|err| match err {
                StorageError::InvalidTransition { .. } => {
                    GovernanceError::AlreadyRegistered(record.address)
                }
                other => other.into(),
            })?;
        let votes = updated.vote_count() as u64;
        let ratify = !updated.is_pending_vote();
        let active = self.store.active_count()?;

        self.journal.record(EventKind::VoteRecorded {
            participant: record.address,
            voter: *voter,
            votes,
        });

        if ratify {
            info!(candidate = %record.address, votes, active, "participant ratified");
            self.journal.record(EventKind::ParticipantRatified {
                participant: record.address,
                votes,
                active,
            });
            Ok(RegistrationOutcome::Ratified { votes })
        } else {
            Ok(RegistrationOutcome::Pending {
                votes,
                required: required_votes(active),
            })
        }
    }

    fn ensure_operational(&self) -> Result<()> {
        if self.store.is_operational()? {
            Ok(())
        } else {
            debug!("call rejected: contract paused");
            Err(GovernanceError::ContractPaused)
        }
    }

    fn ensure_active(&self, identity: &ParticipantId) -> Result<()> {
        match self.store.get_participant(identity)? {
            Some(record) if record.is_active() => Ok(()),
            _ => {
                debug!(identity = %identity, "call rejected: not funded");
                Err(GovernanceError::NotFunded(*identity))
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_operational(&self) -> Result<bool> {
        Ok(self.store.is_operational()?)
    }

    pub fn participant(&self, address: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.store.get_participant(address)?)
    }

    pub fn status_of(&self, address: &ParticipantId) -> Result<ParticipantStatus> {
        Ok(self
            .participant(address)?
            .map(|p| p.status)
            .unwrap_or(ParticipantStatus::Unregistered))
    }

    pub fn is_participant(&self, address: &ParticipantId) -> Result<bool> {
        Ok(self.status_of(address)? != ParticipantStatus::Unregistered)
    }

    pub fn is_active(&self, address: &ParticipantId) -> Result<bool> {
        Ok(self.status_of(address)? == ParticipantStatus::Active)
    }

    pub fn is_pending_vote(&self, address: &ParticipantId) -> Result<bool> {
        Ok(self.status_of(address)? == ParticipantStatus::PendingVote)
    }

    /// Registered past the vote stage (`Registered` or `Active`).
    pub fn is_voted(&self, address: &ParticipantId) -> Result<bool> {
        Ok(matches!(
            self.status_of(address)?,
            ParticipantStatus::Registered | ParticipantStatus::Active
        ))
    }

    pub fn votes_for(&self, address: &ParticipantId) -> Result<Vec<ParticipantId>> {
        Ok(self
            .participant(address)?
            .map(|p| p.votes.into_iter().collect())
            .unwrap_or_default())
    }

    pub fn funded_amount(&self, address: &ParticipantId) -> Result<Amount> {
        Ok(self
            .participant(address)?
            .map(|p| p.funded_amount)
            .unwrap_or(Amount::ZERO))
    }

    pub fn active_count(&self) -> Result<u64> {
        Ok(self.store.active_count()?)
    }

    /// Votes a pending candidate would need at the current population.
    pub fn required_votes(&self) -> Result<u64> {
        Ok(required_votes(self.store.active_count()?))
    }

    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.journal.snapshot()
    }

    pub fn events_since(&self, sequence: u64) -> Vec<GovernanceEvent> {
        self.journal.since(sequence)
    }
}
