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

//! Meek-method counting engine: the iterative round loop that distributes
//! votes, elects candidates reaching the quota, eliminates the weakest
//! hopeful when the surplus converges, and writes the per-round audit log.

use crate::report::Log;
use crate::trace::{Event, LogSink, TraceSink};
use crate::types::{Candidate, CandidateState, Election};
use crate::vote_count::VoteCount;
use log::{debug, info};

/// Strategy picking the candidate to defeat among hopefuls tied for the
/// lowest vote total.
///
/// The Meek reference method defines a tie-break over the history of earlier
/// rounds; this crate does not implement it, and whether the shipped
/// [`IndexOrder`] default is adequate for all inputs is an open question.
pub trait TieBreaker {
    /// Picks the candidate to defeat. `tied` is non-empty, sorted by
    /// ascending index, and holds the hopeful candidates sharing the lowest
    /// vote total. Implementations must return one of its elements and be
    /// deterministic.
    fn pick(&self, tied: &[usize]) -> usize;
}

/// Default tie-break: defeat the tied candidate with the lowest index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOrder;

impl TieBreaker for IndexOrder {
    fn pick(&self, tied: &[usize]) -> usize {
        tied[0]
    }
}

/// Parameters of a count.
pub struct CountOptions<'a> {
    /// Base-10 logarithm of the convergence epsilon:
    /// `omega = 10^-omega_exponent`.
    pub omega_exponent: u32,
    /// Hard cap on the number of rounds before the count is force-completed
    /// and reported as non-converged.
    pub max_rounds: usize,
    /// Strategy for elimination ties.
    pub tie_breaker: &'a dyn TieBreaker,
}

impl Default for CountOptions<'static> {
    fn default() -> Self {
        CountOptions {
            omega_exponent: 7,
            max_rounds: 50,
            tie_breaker: &IndexOrder,
        }
    }
}

/// Errors surfaced by a count.
#[derive(Debug, thiserror::Error)]
pub enum CountError {
    /// The round cap was exhausted before the termination predicate held.
    /// The carried log was force-completed and remains auditable, but must
    /// not be taken for a clean tabulation.
    #[error("count did not converge within {max_rounds} rounds")]
    NonConvergence {
        /// The configured round cap.
        max_rounds: usize,
        /// The force-completed audit log.
        log: Box<Log>,
    },
}

/// Counts an election with default options, tracing through the `log`
/// facade.
pub fn count(election: &Election) -> Result<Log, CountError> {
    count_with(election, &CountOptions::default(), &mut LogSink)
}

/// Counts an election with explicit options and trace sink.
///
/// The initialization round always runs; afterwards the termination
/// predicate is evaluated between rounds. On termination every remaining
/// candidate is forced into a terminal state and the last entry's snapshot
/// is refreshed to reflect that.
pub fn count_with(
    election: &Election,
    options: &CountOptions,
    sink: &mut dyn TraceSink,
) -> Result<Log, CountError> {
    let mut state = State::new(election, options);
    let mut log = Log::new();

    let mut round = 0;
    loop {
        log.add(round);
        state.run_round(round, &mut log, options.tie_breaker, sink);
        round += 1;
        if state.count_complete() {
            break;
        }
        if round >= options.max_rounds {
            state.complete();
            log.refresh_final_snapshot(&state.candidates);
            sink.record(Event::CountComplete {
                rounds: round,
                converged: false,
            });
            return Err(CountError::NonConvergence {
                max_rounds: options.max_rounds,
                log: Box::new(log),
            });
        }
    }

    state.complete();
    log.refresh_final_snapshot(&state.candidates);
    sink.record(Event::CountComplete {
        rounds: round,
        converged: true,
    });
    Ok(log)
}

/// Running state while computing the election results.
struct State<'e> {
    /// Election input.
    election: &'e Election,
    /// Mutable per-candidate registry, indexed by candidate.
    candidates: Vec<Candidate>,
    /// Convergence epsilon for the elimination trigger.
    omega: f64,
    /// Total surplus observed in the previous round.
    prev_surplus: f64,
}

impl<'e> State<'e> {
    fn new(election: &'e Election, options: &CountOptions) -> State<'e> {
        State {
            election,
            candidates: (0..election.num_candidates)
                .map(|i| {
                    Candidate::new(
                        i,
                        election.candidate_names[i].clone(),
                        election.withdrawn.contains(&i),
                    )
                })
                .collect(),
            omega: 10f64.powi(-(options.omega_exponent as i32)),
            prev_surplus: 0.0,
        }
    }

    fn count_state(&self, state: CandidateState) -> usize {
        self.candidates.iter().filter(|c| c.state == state).count()
    }

    /// Termination predicate: all seats are filled, or so few candidates
    /// remain that everyone still hopeful is guaranteed a seat.
    fn count_complete(&self) -> bool {
        let elected = self.count_state(CandidateState::Elected);
        let hopeful = self.count_state(CandidateState::Hopeful);
        debug!("Checking if count is complete: elected={elected}, hopeful={hopeful}");
        elected >= self.election.num_seats || elected + hopeful <= self.election.num_seats
    }

    /// Runs one round: redistributes all ballots, elects every hopeful at or
    /// above the threshold, and otherwise eliminates the lowest hopeful once
    /// the total surplus has converged below omega or stopped shrinking.
    fn run_round(
        &mut self,
        round: usize,
        log: &mut Log,
        tie_breaker: &dyn TieBreaker,
        sink: &mut dyn TraceSink,
    ) {
        sink.record(Event::RoundBegun { round });

        // Recompute every candidate's votes from scratch.
        let keep_factors: Vec<f64> = self.candidates.iter().map(|c| c.keep_factor).collect();
        let count = VoteCount::count_votes(self.election, &keep_factors);
        for c in &mut self.candidates {
            c.votes = count.sum[c.index];
        }
        let total_votes = count.total_votes();
        sink.record(Event::VotesDistributed {
            round,
            total_votes,
            exhausted: count.exhausted,
        });

        let threshold = count.threshold(self.election);
        sink.record(Event::ThresholdComputed { round, threshold });

        {
            let entry = log.last_mut();
            entry.threshold = threshold;
            entry.total_votes = total_votes;
            entry.exhausted = count.exhausted;
        }

        // Election pass: each hopeful reaching the threshold is elected and
        // gets the surplus-retention update, applied exactly once here.
        let mut newly_elected = Vec::new();
        for c in &mut self.candidates {
            match c.state {
                CandidateState::Hopeful if c.votes >= threshold => {
                    c.state = CandidateState::Elected;
                    c.keep_factor = c.keep_factor * threshold / c.votes;
                    sink.record(Event::CandidateElected {
                        round,
                        candidate: c.index,
                        votes: c.votes,
                        keep_factor: c.keep_factor,
                    });
                    newly_elected.push(c.clone());
                }
                CandidateState::Hopeful
                | CandidateState::Withdrawn
                | CandidateState::Defeated
                | CandidateState::Elected => (),
            }
            c.surplus = (c.votes - threshold).max(0.0);
        }

        assert!(
            self.count_state(CandidateState::Elected) <= self.election.num_seats,
            "elected more candidates than seats in round {round}"
        );

        // Publish the snapshot (value copies, never live references) and
        // attribute the movement since the previous round to its events.
        {
            let entry = log.last_mut();
            entry.snapshot = self.candidates.clone();
            entry.elected = newly_elected.clone();
        }
        log.attribute_last();

        let surplus = count.surplus(threshold);

        // An election round ends here; elimination only happens in rounds
        // that elect nobody.
        if newly_elected.is_empty() {
            let converged = surplus < self.omega;
            let stalled = round > 0 && surplus >= self.prev_surplus;
            if converged || stalled {
                let defeated = self.next_defeated_candidate(tie_breaker);
                let c = &mut self.candidates[defeated];
                match c.state {
                    CandidateState::Hopeful => {
                        c.state = CandidateState::Defeated;
                        c.keep_factor = 0.0;
                    }
                    CandidateState::Withdrawn
                    | CandidateState::Defeated
                    | CandidateState::Elected => {
                        panic!("cannot eliminate candidate {defeated} in state {:?}", c.state)
                    }
                }
                sink.record(Event::CandidateDefeated {
                    round,
                    candidate: defeated,
                    votes: c.votes,
                });
                log.last_mut().defeated = Some(self.candidates[defeated].clone());
            }
        }

        self.prev_surplus = surplus;
    }

    /// Picks the hopeful candidate with the lowest vote total, delegating
    /// exact ties to the tie-break strategy.
    fn next_defeated_candidate(&self, tie_breaker: &dyn TieBreaker) -> usize {
        let min_votes = self
            .candidates
            .iter()
            .filter(|c| c.state == CandidateState::Hopeful)
            .map(|c| c.votes)
            .min_by(|x, y| x.partial_cmp(y).unwrap())
            .expect("no hopeful candidate available for elimination");
        let tied: Vec<usize> = self
            .candidates
            .iter()
            .filter(|c| c.state == CandidateState::Hopeful && c.votes == min_votes)
            .map(|c| c.index)
            .collect();
        debug!("Lowest vote: {min_votes}, tied candidates: {tied:?}");

        let pick = tie_breaker.pick(&tied);
        assert!(
            tied.contains(&pick),
            "tie-break strategy picked candidate {pick} outside the tie set {tied:?}"
        );
        pick
    }

    /// Forces every candidate into a terminal state: elects remaining
    /// hopefuls in ascending index order until the seats are filled, then
    /// defeats everyone still hopeful. Withdrawn candidates are left as they
    /// are.
    fn complete(&mut self) {
        let mut elected = self.count_state(CandidateState::Elected);
        for c in &mut self.candidates {
            match c.state {
                CandidateState::Hopeful if elected < self.election.num_seats => {
                    c.state = CandidateState::Elected;
                    elected += 1;
                    info!("Electing remaining candidate {}", c.index);
                }
                CandidateState::Hopeful => {
                    c.state = CandidateState::Defeated;
                    c.keep_factor = 0.0;
                    info!("Defeating remaining candidate {}", c.index);
                }
                CandidateState::Withdrawn | CandidateState::Defeated | CandidateState::Elected => {
                }
            }
        }
    }
}
