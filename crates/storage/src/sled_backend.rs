use crate::access::{check_access, AccessState, Operation};
use crate::{transition, LedgerStore, QuorumRule, Result, StorageError};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use surety_types::{Amount, Genesis, Participant, ParticipantId, ID_BYTES};

const KEY_ADMINISTRATOR: &[u8] = b"administrator";
const KEY_SEED: &[u8] = b"seed_participant";
const KEY_OPERATIONAL: &[u8] = b"operational";
const KEY_ACTIVE_COUNT: &[u8] = b"active_count";

type TxResult<T> = std::result::Result<T, ConflictableTransactionError<StorageError>>;

fn abort<T>(err: StorageError) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err))
}

/// Lift a plain storage result into a transaction body.
fn tx<T>(result: Result<T>) -> TxResult<T> {
    result.map_err(ConflictableTransactionError::Abort)
}

fn decode_id(bytes: &[u8]) -> Result<ParticipantId> {
    let raw: [u8; ID_BYTES] = bytes
        .try_into()
        .map_err(|_| StorageError::Corrupt(format!("identity of {} bytes", bytes.len())))?;
    Ok(ParticipantId(raw))
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::Corrupt(format!("counter of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

fn decode_participant(bytes: &[u8]) -> Result<Participant> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_participant(record: &Participant) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Sled-backed implementation.
///
/// Records live in the `participants` tree keyed by raw identity bytes; global
/// flags live in `metadata`; the allow-list is the key set of
/// `authorized_callers`. Every mutating primitive is one transaction across the
/// three trees, so access checks and writes see the same snapshot.
pub struct SledLedger {
    db: Db,
    participants: Tree,
    metadata: Tree,
    authorized: Tree,
    activation_threshold: Amount,
}

impl SledLedger {
    pub fn open<P: AsRef<Path>>(path: P, activation_threshold: Amount) -> Result<Self> {
        Self::from_db(sled::open(path)?, activation_threshold)
    }

    /// Ledger backed by a throwaway database, removed on drop.
    pub fn temporary(activation_threshold: Amount) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, activation_threshold)
    }

    fn from_db(db: Db, activation_threshold: Amount) -> Result<Self> {
        let participants = db.open_tree("participants")?;
        let metadata = db.open_tree("metadata")?;
        let authorized = db.open_tree("authorized_callers")?;
        Ok(Self {
            db,
            participants,
            metadata,
            authorized,
            activation_threshold,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn transact<T, F>(&self, body: F) -> Result<T>
    where
        F: Fn(&TransactionalTree, &TransactionalTree, &TransactionalTree) -> TxResult<T>,
    {
        (&self.participants, &self.metadata, &self.authorized)
            .transaction(|(participants, metadata, authorized)| {
                body(participants, metadata, authorized)
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::Database(err),
            })
    }
}

/// Access check against the transaction's view of metadata and allow-list.
fn admit(
    metadata: &TransactionalTree,
    authorized: &TransactionalTree,
    caller: &ParticipantId,
    operation: Operation,
) -> TxResult<()> {
    let administrator = match metadata.get(KEY_ADMINISTRATOR)? {
        Some(bytes) => tx(decode_id(&bytes))?,
        None => return abort(StorageError::NotInitialized),
    };
    let operational = metadata
        .get(KEY_OPERATIONAL)?
        .map(|v| v.first() == Some(&1))
        .unwrap_or(false);
    let state = AccessState {
        administrator: &administrator,
        caller_authorized: authorized.get(caller.as_bytes())?.is_some(),
        operational,
    };
    tx(check_access(caller, operation, &state))
}

fn load_record(participants: &TransactionalTree, address: &ParticipantId) -> TxResult<Participant> {
    match participants.get(address.as_bytes())? {
        Some(bytes) => tx(decode_participant(&bytes)),
        None => abort(StorageError::UnknownParticipant(*address)),
    }
}

fn load_active_count(metadata: &TransactionalTree) -> TxResult<u64> {
    match metadata.get(KEY_ACTIVE_COUNT)? {
        Some(bytes) => tx(decode_u64(&bytes)),
        None => Ok(0),
    }
}

fn store_record(participants: &TransactionalTree, record: &Participant) -> TxResult<()> {
    participants.insert(
        &record.address.as_bytes()[..],
        tx(encode_participant(record))?,
    )?;
    Ok(())
}

impl LedgerStore for SledLedger {
    fn initialize(&self, genesis: &Genesis) -> Result<()> {
        let created = self.transact(|participants, metadata, _| {
            if let Some(existing) = metadata.get(KEY_ADMINISTRATOR)? {
                let administrator = tx(decode_id(&existing))?;
                let seed = match metadata.get(KEY_SEED)? {
                    Some(bytes) => tx(decode_id(&bytes))?,
                    None => return abort(StorageError::Corrupt("missing seed participant".into())),
                };
                if administrator == genesis.administrator && seed == genesis.seed_participant {
                    return Ok(false);
                }
                return abort(StorageError::AlreadyInitialized);
            }

            metadata.insert(KEY_ADMINISTRATOR, &genesis.administrator.as_bytes()[..])?;
            metadata.insert(KEY_SEED, &genesis.seed_participant.as_bytes()[..])?;
            metadata.insert(KEY_OPERATIONAL, &[1u8][..])?;
            metadata.insert(KEY_ACTIVE_COUNT, &0u64.to_be_bytes()[..])?;
            store_record(participants, &Participant::seeded(genesis.seed_participant))?;
            Ok(true)
        })?;

        if created {
            tracing::info!(
                administrator = %genesis.administrator,
                seed = %genesis.seed_participant,
                "Initialized sled ledger"
            );
        }
        Ok(())
    }

    fn administrator(&self) -> Result<ParticipantId> {
        match self.metadata.get(KEY_ADMINISTRATOR)? {
            Some(bytes) => decode_id(&bytes),
            None => Err(StorageError::NotInitialized),
        }
    }

    fn activation_threshold(&self) -> Amount {
        self.activation_threshold
    }

    fn is_operational(&self) -> Result<bool> {
        self.administrator()?;
        Ok(self
            .metadata
            .get(KEY_OPERATIONAL)?
            .map(|v| v.first() == Some(&1))
            .unwrap_or(false))
    }

    fn set_operational(&self, caller: &ParticipantId, operational: bool) -> Result<()> {
        self.transact(|_, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::SetOperational)?;
            metadata.insert(KEY_OPERATIONAL, &[operational as u8][..])?;
            Ok(())
        })
    }

    fn is_authorized_caller(&self, identity: &ParticipantId) -> Result<bool> {
        Ok(self.authorized.contains_key(identity.as_bytes())?)
    }

    fn authorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()> {
        self.transact(|_, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::AuthorizeCaller)?;
            authorized.insert(&identity.as_bytes()[..], Vec::<u8>::new())?;
            Ok(())
        })
    }

    fn deauthorize_caller(&self, caller: &ParticipantId, identity: &ParticipantId) -> Result<()> {
        self.transact(|_, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::DeauthorizeCaller)?;
            authorized.remove(&identity.as_bytes()[..])?;
            Ok(())
        })
    }

    fn register_participant(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        sponsor: &ParticipantId,
        pending: bool,
    ) -> Result<Participant> {
        self.transact(|participants, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::RegisterParticipant)?;
            let existing = match participants.get(address.as_bytes())? {
                Some(bytes) => Some(tx(decode_participant(&bytes))?),
                None => None,
            };
            let record = tx(transition::new_registration(
                existing.as_ref(),
                *address,
                *sponsor,
                pending,
            ))?;
            store_record(participants, &record)?;
            Ok(record)
        })
    }

    fn record_vote(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        voter: &ParticipantId,
        quorum: QuorumRule,
    ) -> Result<Participant> {
        self.transact(|participants, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::RecordVote)?;
            let current = load_record(participants, address)?;
            let active = load_active_count(metadata)?;
            let next = tx(transition::with_vote(&current, *voter, active, quorum))?;
            store_record(participants, &next)?;
            Ok(next)
        })
    }

    fn add_funding(
        &self,
        caller: &ParticipantId,
        address: &ParticipantId,
        amount: Amount,
    ) -> Result<Participant> {
        let threshold = self.activation_threshold;
        self.transact(|participants, metadata, authorized| {
            admit(metadata, authorized, caller, Operation::AddFunding)?;
            let current = load_record(participants, address)?;
            let (next, activated) = tx(transition::with_funding(&current, amount, threshold))?;
            store_record(participants, &next)?;
            if activated {
                let count = load_active_count(metadata)?;
                metadata.insert(KEY_ACTIVE_COUNT, &(count + 1).to_be_bytes()[..])?;
            }
            Ok(next)
        })
    }

    fn get_participant(&self, address: &ParticipantId) -> Result<Option<Participant>> {
        self.participants
            .get(address.as_bytes())?
            .map(|v| decode_participant(&v))
            .transpose()
    }

    fn list_participants(&self) -> Result<Vec<Participant>> {
        self.participants
            .iter()
            .map(|entry| {
                let (_, v) = entry?;
                decode_participant(&v)
            })
            .collect()
    }

    fn participant_count(&self) -> Result<u64> {
        Ok(self.participants.len() as u64)
    }

    fn active_count(&self) -> Result<u64> {
        match self.metadata.get(KEY_ACTIVE_COUNT)? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }
}
