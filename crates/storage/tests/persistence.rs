use proptest::prelude::*;
use surety_storage::{LedgerStore, MemoryLedger, SledLedger, StorageError};
use surety_types::{Amount, Genesis, ParticipantId, ParticipantStatus};
use tempfile::TempDir;

fn ids() -> (ParticipantId, ParticipantId, ParticipantId) {
    (
        ParticipantId::from_label("admin"),
        ParticipantId::from_label("engine"),
        ParticipantId::from_label("seed"),
    )
}

#[test]
fn sled_restart_restores_records_and_flags() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().to_path_buf();
    let (admin, engine, seed) = ids();
    let candidate = ParticipantId::from_label("candidate");

    {
        let ledger = SledLedger::open(&path, Amount(10)).expect("sled ledger");
        ledger.initialize(&Genesis::new(admin, seed)).expect("init");
        ledger.authorize_caller(&admin, &engine).unwrap();
        ledger.add_funding(&engine, &seed, Amount(12)).unwrap();
        ledger
            .register_participant(&engine, &candidate, &seed, true)
            .unwrap();
        ledger.set_operational(&admin, false).unwrap();
        ledger.flush().unwrap();
    }

    let ledger = SledLedger::open(&path, Amount(10)).expect("reopen");
    // Same genesis on restart is accepted.
    ledger.initialize(&Genesis::new(admin, seed)).expect("re-init");

    assert!(!ledger.is_operational().unwrap());
    assert!(ledger.is_authorized_caller(&engine).unwrap());
    assert_eq!(ledger.active_count().unwrap(), 1);

    let seed_record = ledger.get_participant(&seed).unwrap().unwrap();
    assert_eq!(seed_record.status, ParticipantStatus::Active);
    assert_eq!(seed_record.funded_amount, Amount(12));

    let pending = ledger.get_participant(&candidate).unwrap().unwrap();
    assert_eq!(pending.status, ParticipantStatus::PendingVote);
    assert!(pending.votes.contains(&seed));
    assert_eq!(pending.sponsor, Some(seed));
}

#[test]
fn sled_rejects_foreign_genesis_after_restart() {
    let dir = TempDir::new().expect("temp dir");
    let (admin, _, seed) = ids();
    {
        let ledger = SledLedger::open(dir.path(), Amount(10)).unwrap();
        ledger.initialize(&Genesis::new(admin, seed)).unwrap();
        ledger.flush().unwrap();
    }
    let ledger = SledLedger::open(dir.path(), Amount(10)).unwrap();
    let other = Genesis::new(ParticipantId::from_label("other-admin"), seed);
    assert!(matches!(
        ledger.initialize(&other),
        Err(StorageError::AlreadyInitialized)
    ));
    assert_eq!(ledger.administrator().unwrap(), admin);
}

proptest! {
    #[test]
    fn registration_succeeds_at_most_once(
        labels in prop::collection::vec("[a-z]{1,6}", 1..30),
    ) {
        let (admin, engine, seed) = ids();
        let ledger = MemoryLedger::with_genesis(&Genesis::new(admin, seed), Amount(10)).unwrap();
        ledger.authorize_caller(&admin, &engine).unwrap();

        let mut seen = std::collections::HashSet::new();
        seen.insert(seed);
        for label in labels {
            let id = ParticipantId::from_label(&label);
            let result = ledger.register_participant(&engine, &id, &seed, false);
            if seen.insert(id) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(StorageError::DuplicateEntry(dup)) if dup == id));
            }
        }
        prop_assert_eq!(ledger.participant_count().unwrap(), seen.len() as u64);
    }

    #[test]
    fn active_count_tracks_activations(
        deposits in prop::collection::vec((0usize..4, 1u128..8), 1..40),
    ) {
        let (admin, engine, seed) = ids();
        let ledger = MemoryLedger::with_genesis(&Genesis::new(admin, seed), Amount(10)).unwrap();
        ledger.authorize_caller(&admin, &engine).unwrap();

        let mut members = vec![seed];
        for n in 0..3 {
            let id = ParticipantId::from_label(&format!("member-{n}"));
            ledger.register_participant(&engine, &id, &seed, false).unwrap();
            members.push(id);
        }

        for (who, amount) in deposits {
            ledger.add_funding(&engine, &members[who], Amount(amount)).unwrap();
        }

        let active = ledger
            .list_participants()
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active())
            .count() as u64;
        prop_assert_eq!(ledger.active_count().unwrap(), active);
        for p in ledger.list_participants().unwrap() {
            prop_assert_eq!(p.is_active(), p.funded_amount >= Amount(10));
        }
    }
}
