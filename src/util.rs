// Copyright 2026 The meek-stv Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#[cfg(test)]
pub mod testing {
    //! Shared invariant checks for engine tests.

    use crate::report::Log;
    use crate::types::{CandidateState, Election};

    /// Asserts that two floats are within `tol` of each other.
    pub fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual} (tolerance {tol})"
        );
    }

    /// Verifies that in every round, the distributed votes plus the
    /// exhausted weight add up to the circulating ballot weight.
    pub fn check_vote_conservation(election: &Election, log: &Log) {
        for i in 0..log.num_rounds() {
            let entry = log.round(i);
            let votes: f64 = entry.snapshot.iter().map(|c| c.votes).sum();
            assert_close(
                votes + entry.exhausted,
                election.circulating_weight() as f64,
                1e-6,
            );
        }
    }

    /// Verifies the transfer-attribution conservation contracts: what the
    /// recipients and the exhausted pool gained after an event matches what
    /// its source gave up.
    pub fn check_transfer_conservation(log: &Log) {
        for i in 1..log.num_rounds() {
            let prev = log.round(i - 1);
            let cur = log.round(i);
            if let Some(defeated) = &prev.defeated {
                let received: f64 = cur.elimination_received.values().sum();
                assert_close(
                    received + cur.elimination_exhausted_delta,
                    prev.candidate(defeated.index).votes,
                    1e-2,
                );
            }
            if !prev.elected.is_empty() {
                let drop: f64 = prev
                    .elected
                    .iter()
                    .map(|e| {
                        (prev.candidate(e.index).votes - cur.candidate(e.index).votes).max(0.0)
                    })
                    .sum();
                let received: f64 = cur.surplus_received.values().sum();
                assert_close(received + cur.surplus_exhausted_delta, drop, 1e-2);
            }
        }
    }

    /// Verifies that keep factors never increase from one round to the next.
    pub fn check_monotonic_keep_factors(log: &Log) {
        for i in 1..log.num_rounds() {
            let prev = log.round(i - 1);
            for c in &log.round(i).snapshot {
                assert!(
                    c.keep_factor <= prev.candidate(c.index).keep_factor,
                    "keep factor of candidate {} grew in round {i}",
                    c.index
                );
            }
        }
    }

    /// Verifies terminal completeness: every candidate ends Elected,
    /// Defeated or Withdrawn, withdrawn candidates are untouched, and the
    /// winner list holds exactly the elected candidates, one per seat.
    pub fn check_terminal_states(election: &Election, log: &Log) {
        let results = log.results();
        assert_eq!(results.len(), election.num_candidates);
        for c in results {
            match c.state {
                CandidateState::Elected | CandidateState::Defeated => {
                    assert!(!election.withdrawn.contains(&c.index));
                }
                CandidateState::Withdrawn => {
                    assert!(election.withdrawn.contains(&c.index));
                }
                CandidateState::Hopeful => panic!("candidate {} left hopeful", c.index),
            }
        }

        let mut winners = log.winners();
        assert_eq!(winners.len(), election.num_seats);
        winners.sort_unstable();
        winners.dedup();
        assert_eq!(winners.len(), election.num_seats);
        for &w in &winners {
            assert_eq!(results.iter().find(|c| c.index == w).unwrap().state, CandidateState::Elected);
        }
    }
}
