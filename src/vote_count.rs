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

//! Module to count votes, based on input ballots and the current keep factor
//! values.

use crate::types::{Ballot, Election};
use log::trace;

/// Result of one vote-distribution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteCount {
    /// Sum of votes for each candidate.
    pub sum: Vec<f64>,
    /// Ballot weight that ran out of ranked candidates during this pass.
    pub exhausted: f64,
}

impl VoteCount {
    /// Distributes every circulating ballot over the candidates, based on the
    /// given keep factors. Inert ballots are skipped: their weight never
    /// entered circulation and is not counted as exhausted.
    pub fn count_votes(election: &Election, keep_factors: &[f64]) -> Self {
        assert_eq!(keep_factors.len(), election.num_candidates);
        let mut count = VoteCount {
            sum: vec![0.0; election.num_candidates],
            exhausted: 0.0,
        };
        for (i, ballot) in election.ballots.iter().enumerate() {
            if ballot.is_inert(&election.withdrawn) {
                trace!("Skipping inert ballot {i}");
                continue;
            }
            count.process_ballot(keep_factors, i, ballot);
        }
        count
    }

    /// Processes one ballot: walks its preferences in order, letting each
    /// candidate retain `remaining * keep_factor`, until the weight is used
    /// up or the ranking runs out. Whatever weight is left is exhausted.
    fn process_ballot(&mut self, keep_factors: &[f64], i: usize, ballot: &Ballot) {
        trace!("Processing ballot {i} = {ballot:?}");
        let mut w = ballot.weight as f64;
        for &c in &ballot.preferences {
            let v = w * keep_factors[c];
            self.sum[c] += v;
            w -= v;
            if w <= 0.0 {
                break;
            }
        }
        if w > 0.0 {
            trace!("  Exhausted voting power = {w}");
            self.exhausted += w;
        }
    }

    /// Sum of votes across all candidates.
    pub fn total_votes(&self) -> f64 {
        self.sum.iter().sum()
    }

    /// Droop-style quota for this round: the total votes divided by one more
    /// than the number of seats. The divisor is fixed across the whole count;
    /// it does not shrink as candidates are elected.
    pub fn threshold(&self, election: &Election) -> f64 {
        self.total_votes() / (1.0 + election.num_seats as f64)
    }

    /// Total surplus: the sum over all candidates of the votes received
    /// beyond the threshold, counting only positive excesses.
    pub fn surplus(&self, threshold: f64) -> f64 {
        self.sum.iter().map(|&v| (v - threshold).max(0.0)).sum()
    }
}
