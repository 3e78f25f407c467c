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

//! Meek-method Single Transferable Vote tabulation.
//!
//! The engine repeatedly redistributes weighted ranked ballots over the
//! candidates: every candidate retains a *keep factor* share of the weight
//! reaching it, candidates at or above the round's quota are elected (and
//! shed their surplus through a reduced keep factor), and the weakest
//! hopeful is eliminated once the total surplus converges. Every round is
//! appended to an audit [`Log`] that also attributes the vote movement
//! between consecutive rounds to the event that caused it.
//!
//! ```
//! use meek_stv::types::{Ballot, Election};
//!
//! let election = Election::builder()
//!     .title("Board seats")
//!     .num_seats(2)
//!     .candidate_names(["alice", "bob", "carol"])
//!     .ballots([
//!         Ballot::new(3, [0, 1]),
//!         Ballot::new(2, [1]),
//!         Ballot::new(1, [2, 0]),
//!     ])
//!     .build();
//! let log = meek_stv::count(&election).unwrap();
//! assert_eq!(log.winners(), vec![0, 1]);
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod meek;
pub mod parse;
pub mod report;
pub mod trace;
pub mod types;
mod util;
pub mod vote_count;

pub use meek::{count, count_with, CountError, CountOptions};
pub use report::{Log, LogEntry};
