//! In-memory journal of committed governance actions.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use surety_types::{Amount, ParticipantId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Registered without a vote
    ParticipantRegistered {
        participant: ParticipantId,
        sponsor: ParticipantId,
    },
    ParticipantPending {
        participant: ParticipantId,
        sponsor: ParticipantId,
        required_votes: u64,
    },
    VoteRecorded {
        participant: ParticipantId,
        voter: ParticipantId,
        votes: u64,
    },
    ParticipantRatified {
        participant: ParticipantId,
        votes: u64,
        active: u64,
    },
    FundingReceived {
        participant: ParticipantId,
        amount: Amount,
        total: Amount,
    },
    ParticipantActivated {
        participant: ParticipantId,
        total: Amount,
    },
    OperatingStatusChanged {
        operational: bool,
    },
    CallerAuthorized {
        identity: ParticipantId,
    },
    CallerDeauthorized {
        identity: ParticipantId,
    },
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEvent {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug)]
struct JournalState {
    next_sequence: u64,
    entries: VecDeque<GovernanceEvent>,
}

/// Bounded event journal; the oldest entries are dropped first.
#[derive(Debug)]
pub struct EventJournal {
    capacity: usize,
    state: Mutex<JournalState>,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(JournalState {
                next_sequence: 0,
                entries: VecDeque::new(),
            }),
        }
    }

    pub fn record(&self, kind: EventKind) -> u64 {
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        tracing::info!(sequence, event = ?kind, "governance event");

        if self.capacity == 0 {
            return sequence;
        }
        if state.entries.len() == self.capacity {
            state.entries.pop_front();
        }
        state.entries.push_back(GovernanceEvent {
            sequence,
            recorded_at: Utc::now(),
            kind,
        });
        sequence
    }

    pub fn snapshot(&self) -> Vec<GovernanceEvent> {
        self.state.lock().entries.iter().cloned().collect()
    }

    /// Events with a sequence number of at least `sequence`.
    pub fn since(&self, sequence: u64) -> Vec<GovernanceEvent> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.sequence >= sequence)
            .cloned()
            .collect()
    }
}
