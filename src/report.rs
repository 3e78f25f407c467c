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

//! Per-round audit log of a count: immutable round snapshots, plus the
//! attribution of vote movements to the election and elimination events of
//! the previous round.

use crate::types::{Candidate, CandidateState};
use std::collections::BTreeMap;

/// One round of the count. Filled in while its round runs and immutable
/// afterwards, with a single documented exception: the last entry's snapshot
/// is refreshed once after final completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Round number, starting at 0.
    pub round: usize,
    /// Quota a hopeful candidate must reach this round to be elected.
    pub threshold: f64,
    /// Sum of votes across all candidates this round.
    pub total_votes: f64,
    /// Ballot weight that ran out of ranked candidates this round.
    pub exhausted: f64,
    /// Value copy of every candidate at the end of the round. Resolve
    /// candidates by [`Candidate::index`], never by position.
    pub snapshot: Vec<Candidate>,
    /// Candidates newly elected this round, as value copies taken at the
    /// moment of election.
    pub elected: Vec<Candidate>,
    /// Candidate eliminated this round, if any. At most one elimination
    /// happens per round.
    pub defeated: Option<Candidate>,
    /// Votes gained per candidate since the previous round, recorded when
    /// that round elected at least one candidate. Keyed by candidate index;
    /// only positive deltas appear.
    pub surplus_received: BTreeMap<usize, f64>,
    /// Growth of the exhausted pool attributed to surplus redistribution.
    pub surplus_exhausted_delta: f64,
    /// Votes gained per candidate since the previous round, recorded when
    /// that round eliminated a candidate. The eliminated candidate is the
    /// source of the movement and never appears as a recipient.
    pub elimination_received: BTreeMap<usize, f64>,
    /// Growth of the exhausted pool attributed to the elimination.
    pub elimination_exhausted_delta: f64,
}

impl LogEntry {
    fn new(round: usize) -> Self {
        LogEntry {
            round,
            threshold: 0.0,
            total_votes: 0.0,
            exhausted: 0.0,
            snapshot: Vec::new(),
            elected: Vec::new(),
            defeated: None,
            surplus_received: BTreeMap::new(),
            surplus_exhausted_delta: 0.0,
            elimination_received: BTreeMap::new(),
            elimination_exhausted_delta: 0.0,
        }
    }

    /// Returns the snapshot entry of the candidate with the given index.
    /// Panics if the snapshot doesn't contain it.
    pub fn candidate(&self, index: usize) -> &Candidate {
        self.snapshot
            .iter()
            .find(|c| c.index == index)
            .unwrap_or_else(|| panic!("candidate {index} missing from round {} snapshot", self.round))
    }

    /// Attributes this round's vote movements to the previous round's
    /// events, comparing the two snapshots by stable candidate index.
    pub(crate) fn attribute_transfers(&mut self, prev: &LogEntry) {
        if !prev.elected.is_empty() {
            for c in &self.snapshot {
                let delta = c.votes - prev.candidate(c.index).votes;
                if delta > 0.0 {
                    self.surplus_received.insert(c.index, delta);
                }
            }
            self.surplus_exhausted_delta = self.exhausted - prev.exhausted;
        }
        if let Some(defeated) = &prev.defeated {
            for c in &self.snapshot {
                if c.index == defeated.index {
                    continue;
                }
                let delta = c.votes - prev.candidate(c.index).votes;
                if delta > 0.0 {
                    self.elimination_received.insert(c.index, delta);
                }
            }
            self.elimination_exhausted_delta = self.exhausted - prev.exhausted;
        }
    }
}

/// Append-only log of the rounds of a count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Log {
    pub(crate) fn new() -> Self {
        Log::default()
    }

    /// Number of rounds the count ran.
    pub fn num_rounds(&self) -> usize {
        self.entries.len()
    }

    /// Entry for the given round. Panics if the count never reached it.
    pub fn round(&self, i: usize) -> &LogEntry {
        assert!(i < self.entries.len(), "count didn't reach round {i}");
        &self.entries[i]
    }

    /// The most recent entry.
    pub fn last(&self) -> &LogEntry {
        self.entries.last().expect("log has no entries")
    }

    /// Final candidate states, from the last entry's snapshot.
    pub fn results(&self) -> &[Candidate] {
        &self.last().snapshot
    }

    /// Indices of the elected candidates in the final snapshot.
    pub fn winners(&self) -> Vec<usize> {
        self.results()
            .iter()
            .filter(|c| c.state == CandidateState::Elected)
            .map(|c| c.index)
            .collect()
    }

    /// Allocates the entry for the given round.
    pub(crate) fn add(&mut self, round: usize) {
        self.entries.push(LogEntry::new(round));
    }

    pub(crate) fn last_mut(&mut self) -> &mut LogEntry {
        self.entries.last_mut().expect("log has no entries")
    }

    /// Runs transfer attribution for the entry being filled, against the
    /// entry of the previous round. No-op on the first round.
    pub(crate) fn attribute_last(&mut self) {
        let n = self.entries.len();
        if n < 2 {
            return;
        }
        let (prev, cur) = self.entries.split_at_mut(n - 1);
        cur[0].attribute_transfers(prev.last().unwrap());
    }

    /// One-time refresh of the last entry's snapshot after completion, so
    /// the log ends with every candidate in a terminal state. This is the
    /// only write ever made to an already-completed entry.
    pub(crate) fn refresh_final_snapshot(&mut self, candidates: &[Candidate]) {
        self.last_mut().snapshot = candidates.to_vec();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::assert_close;

    fn snapshot_candidate(index: usize, state: CandidateState, votes: f64) -> Candidate {
        Candidate {
            index,
            name: format!("candidate-{index}"),
            state,
            keep_factor: 1.0,
            votes,
            surplus: 0.0,
        }
    }

    fn entry_with_snapshot(round: usize, votes: &[f64]) -> LogEntry {
        let mut entry = LogEntry::new(round);
        entry.snapshot = votes
            .iter()
            .enumerate()
            .map(|(i, &v)| snapshot_candidate(i, CandidateState::Hopeful, v))
            .collect();
        entry
    }

    #[test]
    fn test_round_access() {
        let mut log = Log::new();
        log.add(0);
        log.add(1);
        assert_eq!(log.num_rounds(), 2);
        assert_eq!(log.round(0).round, 0);
        assert_eq!(log.round(1).round, 1);
        assert_eq!(log.last().round, 1);
    }

    #[test]
    #[should_panic(expected = "count didn't reach round 2")]
    fn test_round_access_unreached() {
        let mut log = Log::new();
        log.add(0);
        log.add(1);
        log.round(2);
    }

    #[test]
    fn test_candidate_resolved_by_index() {
        let mut entry = entry_with_snapshot(0, &[1.0, 2.0, 3.0]);
        // Reorder the snapshot: lookups must still key on the stable index.
        entry.snapshot.reverse();
        assert_eq!(entry.candidate(0).votes, 1.0);
        assert_eq!(entry.candidate(2).votes, 3.0);
    }

    #[test]
    #[should_panic(expected = "candidate 7 missing from round 0 snapshot")]
    fn test_candidate_missing() {
        entry_with_snapshot(0, &[1.0]).candidate(7);
    }

    #[test]
    fn test_attribute_surplus_transfers() {
        let mut prev = entry_with_snapshot(3, &[4.0, 2.0, 1.0]);
        prev.snapshot[0].state = CandidateState::Elected;
        prev.elected = vec![prev.snapshot[0].clone()];
        prev.exhausted = 0.5;

        let mut cur = entry_with_snapshot(4, &[3.0, 2.75, 1.15]);
        cur.exhausted = 0.6;
        cur.attribute_transfers(&prev);

        assert_eq!(cur.surplus_received.len(), 2);
        assert_close(cur.surplus_received[&1], 0.75, 1e-9);
        assert_close(cur.surplus_received[&2], 0.15, 1e-9);
        assert_close(cur.surplus_exhausted_delta, 0.1, 1e-9);
        assert!(cur.elimination_received.is_empty());
        assert_eq!(cur.elimination_exhausted_delta, 0.0);
    }

    #[test]
    fn test_attribute_elimination_transfers() {
        let mut prev = entry_with_snapshot(2, &[2.0, 1.25, 3.0]);
        prev.defeated = Some(prev.snapshot[1].clone());

        // The defeated candidate still shows a positive count until its keep
        // factor zeroes out; it must not be recorded as its own recipient.
        let mut cur = entry_with_snapshot(3, &[3.0, 1.5, 3.0]);
        cur.exhausted = 0.25;
        cur.attribute_transfers(&prev);

        assert_eq!(cur.elimination_received.len(), 1);
        assert_close(cur.elimination_received[&0], 1.0, 1e-9);
        assert_close(cur.elimination_exhausted_delta, 0.25, 1e-9);
        assert!(cur.surplus_received.is_empty());
    }

    #[test]
    fn test_attribute_first_round_is_noop() {
        let mut log = Log::new();
        log.add(0);
        log.last_mut().snapshot = entry_with_snapshot(0, &[1.0]).snapshot;
        log.attribute_last();
        assert!(log.round(0).surplus_received.is_empty());
        assert!(log.round(0).elimination_received.is_empty());
    }

    #[test]
    fn test_winners_from_final_snapshot() {
        let mut log = Log::new();
        log.add(0);
        let final_states = vec![
            snapshot_candidate(0, CandidateState::Elected, 3.0),
            snapshot_candidate(1, CandidateState::Defeated, 0.0),
            snapshot_candidate(2, CandidateState::Elected, 2.5),
            snapshot_candidate(3, CandidateState::Withdrawn, 0.0),
        ];
        log.refresh_final_snapshot(&final_states);
        assert_eq!(log.winners(), vec![0, 2]);
        assert_eq!(log.results().len(), 4);
    }

    #[test]
    fn test_refresh_final_snapshot_only_touches_last_entry() {
        let mut log = Log::new();
        log.add(0);
        log.last_mut().snapshot = vec![snapshot_candidate(0, CandidateState::Hopeful, 1.0)];
        log.add(1);
        log.refresh_final_snapshot(&[snapshot_candidate(0, CandidateState::Elected, 1.0)]);
        assert_eq!(log.round(0).snapshot[0].state, CandidateState::Hopeful);
        assert_eq!(log.round(1).snapshot[0].state, CandidateState::Elected);
    }
}
