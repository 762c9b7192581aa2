#![allow(dead_code)]

use std::sync::Arc;
use surety_governance::{GovernanceConfig, GovernanceEngine};
use surety_storage::MemoryLedger;
use surety_types::{Amount, Genesis, ParticipantId};
use tracing_subscriber::EnvFilter;

pub const MIN_FUNDING: Amount = Amount::new(10);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn admin() -> ParticipantId {
    ParticipantId::from_label("owner")
}

pub fn engine_identity() -> ParticipantId {
    ParticipantId::from_label("governance-engine")
}

/// `airline(1)` is the seed participant.
pub fn airline(n: u32) -> ParticipantId {
    ParticipantId::from_label(&format!("airline-{n}"))
}

pub fn engine_with(config: GovernanceConfig) -> GovernanceEngine<MemoryLedger> {
    init_tracing();
    let store = Arc::new(MemoryLedger::new(config.min_funding()));
    GovernanceEngine::bootstrap(
        store,
        &Genesis::new(admin(), airline(1)),
        engine_identity(),
        config,
    )
    .expect("bootstrap engine")
}

pub fn engine() -> GovernanceEngine<MemoryLedger> {
    engine_with(GovernanceConfig::default())
}

/// Seed funded, airlines 2..=n registered directly and funded.
pub fn engine_with_active(n: u32) -> GovernanceEngine<MemoryLedger> {
    let engine = engine();
    engine.fund(&airline(1), MIN_FUNDING).expect("fund seed");
    for i in 2..=n {
        engine
            .register_participant(&airline(1), &airline(i))
            .expect("register");
        engine.fund(&airline(i), MIN_FUNDING).expect("fund");
    }
    engine
}
