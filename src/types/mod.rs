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

//! Types to represent an election.

mod ballot;

pub use ballot::Ballot;
use std::collections::BTreeSet;

/// Election input, representing a parsed ballot file. Immutable for the
/// duration of a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Election {
    /// Name of the election.
    pub title: String,
    /// Number of candidates.
    pub num_candidates: usize,
    /// Number of elected seats.
    pub num_seats: usize,
    /// Total ballot weight cast in the election.
    pub num_ballots: usize,
    /// Indices of candidates that withdrew before the count.
    pub withdrawn: BTreeSet<usize>,
    /// Candidate names, indexed by candidate.
    pub candidate_names: Vec<String>,
    /// Ballots that were cast in this election.
    pub ballots: Vec<Ballot>,
}

impl Election {
    /// Returns a new builder.
    pub fn builder() -> ElectionBuilder {
        ElectionBuilder::default()
    }

    /// Total weight of inert ballots, i.e. ballots that are empty or rank
    /// only withdrawn candidates. This weight never enters circulation and is
    /// not part of any round's exhausted total.
    pub fn inert_weight(&self) -> usize {
        self.ballots
            .iter()
            .filter(|b| b.is_inert(&self.withdrawn))
            .map(|b| b.weight)
            .sum()
    }

    /// Total weight of the ballots that circulate during a count.
    pub fn circulating_weight(&self) -> usize {
        self.num_ballots - self.inert_weight()
    }
}

/// Builder for the [`Election`] type.
#[derive(Default)]
pub struct ElectionBuilder {
    title: Option<String>,
    num_seats: Option<usize>,
    withdrawn: BTreeSet<usize>,
    candidate_names: Vec<String>,
    ballots: Vec<Ballot>,
}

impl ElectionBuilder {
    /// Build the [`Election`] object, checking that every withdrawn and
    /// ballot preference index refers to a declared candidate.
    pub fn build(self) -> Election {
        let num_candidates = self.candidate_names.len();
        assert!(num_candidates > 0, "election has no candidates");
        for &i in &self.withdrawn {
            assert!(i < num_candidates, "withdrawn candidate {i} out of range");
        }
        for ballot in &self.ballots {
            ballot.validate();
            for &c in &ballot.preferences {
                assert!(c < num_candidates, "ballot preference {c} out of range");
            }
        }
        let num_ballots = self.ballots.iter().map(|b| b.weight).sum();
        Election {
            title: self.title.unwrap(),
            num_candidates,
            num_seats: self.num_seats.unwrap(),
            num_ballots,
            withdrawn: self.withdrawn,
            candidate_names: self.candidate_names,
            ballots: self.ballots,
        }
    }

    /// Sets the name of the election.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    /// Sets the number of elected seats.
    pub fn num_seats(mut self, num_seats: usize) -> Self {
        self.num_seats = Some(num_seats);
        self
    }

    /// Sets the indices of withdrawn candidates.
    pub fn withdrawn(mut self, withdrawn: impl IntoIterator<Item = usize>) -> Self {
        self.withdrawn = withdrawn.into_iter().collect();
        self
    }

    /// Sets the list of candidate names, which also determines the number of
    /// candidates.
    pub fn candidate_names(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.candidate_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the list of ballots in the election.
    pub fn ballots(mut self, ballots: impl Into<Vec<Ballot>>) -> Self {
        self.ballots = ballots.into();
        self
    }
}

/// Lifecycle state of a candidate during a count. Every transition site
/// matches exhaustively on this, so an invalid transition (electing a
/// withdrawn candidate, eliminating an elected one) cannot compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// Candidate that can still be either elected or defeated.
    Hopeful,
    /// Candidate that withdrew before the count. Terminal: never changes
    /// state, never retains votes.
    Withdrawn,
    /// Candidate that was eliminated.
    Defeated,
    /// Candidate that was elected to a seat.
    Elected,
}

/// Per-candidate state evolved by the engine round over round. Also the value
/// type of the per-round snapshots published in the count log.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Stable identity, assigned once at initialization and never reused or
    /// reordered. Cross-round attribution keys on this, never on position in
    /// a snapshot.
    pub index: usize,
    /// Full name, used to output results.
    pub name: String,
    /// Lifecycle state.
    pub state: CandidateState,
    /// Fraction of incoming ballot weight this candidate retains, in [0, 1].
    pub keep_factor: f64,
    /// Votes accumulated this round, recomputed from scratch every round.
    pub votes: f64,
    /// Votes retained beyond the threshold, `max(votes - threshold, 0)`.
    pub surplus: f64,
}

impl Candidate {
    /// Initial registry entry for the candidate at `index`: withdrawn
    /// candidates start terminal with a keep factor of 0, everyone else
    /// hopeful with a keep factor of 1.
    pub fn new(index: usize, name: impl Into<String>, is_withdrawn: bool) -> Self {
        let (state, keep_factor) = if is_withdrawn {
            (CandidateState::Withdrawn, 0.0)
        } else {
            (CandidateState::Hopeful, 1.0)
        };
        Candidate {
            index,
            name: name.into(),
            state,
            keep_factor,
            votes: 0.0,
            surplus: 0.0,
        }
    }
}
