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

//! Structured trace of engine actions. The engine itself performs no I/O:
//! every observable step is emitted as an [`Event`] through an injectable
//! [`TraceSink`], and the default sink forwards to the `log` facade.

use log::{debug, info, warn};

/// One observable action taken by the counting engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A counting round began.
    RoundBegun {
        /// Round number, starting at 0.
        round: usize,
    },
    /// The vote-distribution pass of a round finished.
    VotesDistributed {
        /// Round number.
        round: usize,
        /// Sum of votes across all candidates.
        total_votes: f64,
        /// Ballot weight that ran out of ranked candidates.
        exhausted: f64,
    },
    /// The quota for a round was computed.
    ThresholdComputed {
        /// Round number.
        round: usize,
        /// The quota a hopeful candidate must reach.
        threshold: f64,
    },
    /// A hopeful candidate reached the threshold and was elected.
    CandidateElected {
        /// Round number.
        round: usize,
        /// Index of the elected candidate.
        candidate: usize,
        /// The candidate's votes at the moment of election.
        votes: f64,
        /// The keep factor after the surplus-retention update.
        keep_factor: f64,
    },
    /// The lowest hopeful candidate was eliminated.
    CandidateDefeated {
        /// Round number.
        round: usize,
        /// Index of the eliminated candidate.
        candidate: usize,
        /// The candidate's votes at the moment of elimination.
        votes: f64,
    },
    /// The count terminated.
    CountComplete {
        /// Number of rounds that ran.
        rounds: usize,
        /// False when the round safety cap forced completion.
        converged: bool,
    },
}

/// Receiver for engine trace events.
pub trait TraceSink {
    /// Records one event.
    fn record(&mut self, event: Event);
}

/// Sink that forwards every event to the `log` facade.
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&mut self, event: Event) {
        match event {
            Event::RoundBegun { round } => debug!("Round {round} begun"),
            Event::VotesDistributed {
                round,
                total_votes,
                exhausted,
            } => debug!("Round {round}: {total_votes} votes distributed, {exhausted} exhausted"),
            Event::ThresholdComputed { round, threshold } => {
                debug!("Round {round}: threshold {threshold}")
            }
            Event::CandidateElected {
                round,
                candidate,
                votes,
                keep_factor,
            } => info!(
                "Elected in round {round}: candidate {candidate} with {votes} votes, keep factor now {keep_factor}"
            ),
            Event::CandidateDefeated {
                round,
                candidate,
                votes,
            } => info!("Defeated in round {round}: candidate {candidate} with {votes} votes"),
            Event::CountComplete { rounds, converged } => {
                if converged {
                    info!("Count complete after {rounds} rounds")
                } else {
                    warn!("Count failed to converge within {rounds} rounds; completion was forced")
                }
            }
        }
    }
}

/// Sink that discards every event.
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _event: Event) {}
}

/// Sink that collects events for inspection in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub events: Vec<Event>,
}

#[cfg(test)]
impl TraceSink for RecordingSink {
    fn record(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sinks_accept_events() {
        let event = Event::RoundBegun { round: 3 };
        LogSink.record(event.clone());
        NullSink.record(event.clone());

        let mut recording = RecordingSink::default();
        recording.record(event.clone());
        recording.record(Event::CountComplete {
            rounds: 4,
            converged: true,
        });
        assert_eq!(recording.events.len(), 2);
        assert_eq!(recording.events[0], event);
    }
}
