use crate::access::{check_access, AccessState, Operation};
use crate::{transition, LedgerStore, QuorumRule, Result, StorageError};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use surety_types::{Amount, Genesis, Participant, ParticipantId};

#[derive(Debug, Default)]
struct LedgerState {
    genesis: Option<Genesis>,
    operational: bool,
    participants: HashMap<ParticipantId, Participant>,
    authorized: HashSet<ParticipantId>,
    active_count: u64,
}

impl LedgerState {
    fn administrator(&self) -> Result<&ParticipantId> {
        self.genesis
            .as_ref()
            .map(|g| &g.administrator)
            .ok_or(StorageError::NotInitialized)
    }

    fn admit(&self, caller: &ParticipantId, operation: Operation) -> Result<()> {
        let state = AccessState {
            administrator: self.administrator()?,
            caller_authorized: self.authorized.contains(caller),
            operational: self.operational,
        };
        check_access(caller, operation, &state)
    }

    fn record(&self, address: &ParticipantId) -> Result<&Participant> {
        self.participants
            .get(address)
            .ok_or(StorageError::UnknownParticipant(*address))
    }
}

/// In-memory backend.
///
/// The whole ledger sits behind one `RwLock`: a writer validates and commits
/// while holding it, so readers only ever see committed state.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    activation_threshold: Amount,
}

impl MemoryLedger {
    pub fn new(activation_threshold: Amount) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            activation_threshold,
        }
    }

    /// Create and initialize in one step.
    pub fn with_genesis(genesis: &Genesis, activation_threshold: Amount) -> Result<Self> {
        let ledger = Self::new(activation_threshold);
        ledger.initialize(genesis)?;
        Ok(ledger)
    }
}

impl LedgerStore for MemoryLedger {
    fn initialize(&self, genesis: &Genesis) -> Result<()> {
        let mut state = self.state.write();
        match &state.genesis {
            Some(existing) if existing == genesis => return Ok(()),
            Some(_) => return Err(StorageError::AlreadyInitialized),
            None => {}
        }
        state.participants.insert(
            genesis.seed_participant,
            Participant::seeded(genesis.seed_participant),
        );
        state.operational = true;
        state.genesis = Some(genesis.clone());
        tracing::info!(
            administrator = %genesis.administrator,
            seed = %genesis.seed_participant,
            "Initialized in-memory ledger"
        );
        Ok(())
    }

    fn administrator(&self) -> Result<ParticipantId> {
        self.state.read().administrator().copied()
    }

    fn activation_threshold(&self) -> Amount {
        self.activation_threshold
    }

    fn is_operational(&self) -> Result<bool> {
        let state = self.state.read();
        state.administrator()?;
        Ok(state.operational)
    }

    fn set_operational(&self, caller: &ParticipantId, operational: bool) -> Result<()> {
        let mut state = self.state.write();
        state.admit(caller, Operation::SetOperational)?;
        state.operational = operational;
        Ok(())
    }

    fn is_authorized_caller(&self, identity: &ParticipantId) -> Result<bool> {
        Ok(self.state.read().authorized.contains(identity))
    }

    fn authorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()> {
        let mut state = self.state.write();
        state.admit(caller, Operation::AuthorizeCaller)?;
        state.authorized.insert(*identity);
        Ok(())
    }

    fn deauthorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()> {
        let mut state = self.state.write();
        state.admit(caller, Operation::DeauthorizeCaller)?;
        state.authorized.remove(identity);
        Ok(())
    }

    fn register_participant(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        sponsor: &ParticipantId,
        pending: bool,
    ) -> Result<Participant> {
        let mut state = self.state.write();
        state.admit(caller, Operation::RegisterParticipant)?;
        let record = transition::new_registration(
            state.participants.get(address),
            *address,
            *sponsor,
            pending,
        )?;
        state.participants.insert(*address, record.clone());
        Ok(record)
    }

    fn record_vote(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        voter: &ParticipantId,
        quorum: QuorumRule,
    ) -> Result<Participant> {
        let mut state = self.state.write();
        state.admit(caller, Operation::RecordVote)?;
        let next =
            transition::with_vote(state.record(address)?, *voter, state.active_count, quorum)?;
        state.participants.insert(*address, next.clone());
        Ok(next)
    }

    fn add_funding(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        amount: Amount,
    ) -> Result<Participant> {
        let mut state = self.state.write();
        state.admit(caller, Operation::AddFunding)?;
        let (next, activated) =
            transition::with_funding(state.record(address)?, amount, self.activation_threshold)?;
        state.participants.insert(*address, next.clone());
        if activated {
            state.active_count += 1;
        }
        Ok(next)
    }

    fn get_participant(&self, address: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.state.read().participants.get(address).cloned())
    }

    fn list_participants(&self) -> Result<Vec<Participant>> {
        let mut all: Vec<Participant> = self.state.read().participants.values().cloned().collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(all)
    }

    fn participant_count(&self) -> Result<u64> {
        Ok(self.state.read().participants.len() as u64)
    }

    fn active_count(&self) -> Result<u64> {
        Ok(self.state.read().active_count)
    }
}
