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

//! Types to represent ballots in an election.

use std::collections::BTreeSet;

/// Ballot cast in the election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    /// Number of electors that have cast this exact ranking.
    pub weight: usize,
    /// Ranked candidate indices, highest preference first. Indices are
    /// distinct and 0-based.
    pub preferences: Vec<usize>,
}

impl Ballot {
    /// Constructs a new ballot.
    pub fn new(weight: usize, preferences: impl Into<Vec<usize>>) -> Self {
        Ballot {
            weight,
            preferences: preferences.into(),
        }
    }

    /// Returns whether this ballot ranks no candidate at all.
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    /// Returns whether every candidate ranked on this ballot has withdrawn.
    /// An empty ballot ranks nobody and returns false.
    pub fn all_withdrawn(&self, withdrawn: &BTreeSet<usize>) -> bool {
        !self.is_empty() && self.preferences.iter().all(|c| withdrawn.contains(c))
    }

    /// Returns whether this ballot can never reach a live candidate, i.e. it
    /// is empty or ranks only withdrawn candidates. Inert ballots never enter
    /// circulation: their weight counts towards the election's baseline
    /// exhausted weight, not towards any round's exhausted total.
    pub fn is_inert(&self, withdrawn: &BTreeSet<usize>) -> bool {
        self.is_empty() || self.all_withdrawn(withdrawn)
    }

    /// Checks that a ballot is valid, i.e. that no candidate appears twice in
    /// the ballot.
    pub fn validate(&self) {
        let mut all = self.preferences.clone();
        all.sort_unstable();
        let len = all.len();
        all.dedup();
        assert_eq!(len, all.len(), "duplicate candidate in ballot");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn withdrawn(indices: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        indices.into_iter().collect()
    }

    #[test]
    fn test_is_empty() {
        assert!(Ballot::new(1, []).is_empty());
        assert!(!Ballot::new(1, [0]).is_empty());
    }

    #[test]
    fn test_all_withdrawn() {
        let set = withdrawn([1, 2]);
        assert!(Ballot::new(1, [1, 2]).all_withdrawn(&set));
        assert!(Ballot::new(1, [2]).all_withdrawn(&set));
        assert!(!Ballot::new(1, [0, 1]).all_withdrawn(&set));
        assert!(!Ballot::new(1, []).all_withdrawn(&set));
    }

    #[test]
    fn test_is_inert() {
        let set = withdrawn([1]);
        assert!(Ballot::new(1, []).is_inert(&set));
        assert!(Ballot::new(1, [1]).is_inert(&set));
        assert!(!Ballot::new(1, [1, 0]).is_inert(&set));
    }

    #[test]
    fn test_validate() {
        Ballot::new(1, [0, 3, 2]).validate();
        Ballot::new(0, []).validate();
    }

    #[test]
    #[should_panic(expected = "duplicate candidate in ballot")]
    fn test_validate_duplicate() {
        Ballot::new(1, [0, 3, 0]).validate();
    }
}
