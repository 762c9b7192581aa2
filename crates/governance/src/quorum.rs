//! Quorum arithmetic for ratifying pending participants.
//!
//! The denominator is the live count of active participants, so callers must
//! recompute at every vote instead of caching a threshold.

/// A candidate is ratified once its distinct votes are at least half of the
/// active population: `votes * 2 >= active`.
pub fn quorum_reached(votes: u64, active: u64) -> bool {
    votes.saturating_mul(2) >= active
}

/// Votes a pending candidate needs with `active` participants, i.e. the
/// smallest `v` for which [`quorum_reached`] holds.
pub fn required_votes(active: u64) -> u64 {
    active.div_ceil(2)
}

/// Whether a new registration must go through a vote.
pub fn requires_vote(active: u64, multiparty_threshold: u64) -> bool {
    active >= multiparty_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn half_of_four_is_two() {
        assert!(!quorum_reached(1, 4));
        assert!(quorum_reached(2, 4));
        assert_eq!(required_votes(4), 2);
    }

    #[test]
    fn odd_populations_round_up() {
        assert!(!quorum_reached(2, 5));
        assert!(quorum_reached(3, 5));
        assert_eq!(required_votes(5), 3);
        assert_eq!(required_votes(1), 1);
    }

    #[test]
    fn fifth_candidate_needs_a_vote() {
        assert!(!requires_vote(3, 4));
        assert!(requires_vote(4, 4));
    }

    proptest! {
        #[test]
        fn required_votes_is_minimal(active in 0u64..10_000) {
            let needed = required_votes(active);
            prop_assert!(quorum_reached(needed, active));
            if needed > 0 {
                prop_assert!(!quorum_reached(needed - 1, active));
            }
        }
    }
}
