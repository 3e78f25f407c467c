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

//! Module to parse STV ballot files.
//!
//! The format is line-oriented: a header `<candidates> <seats>`, an optional
//! line of negative 1-based withdrawn indices, one line per ballot
//! (`<weight> <preference...> 0`, preferences 1-based), a lone `0`
//! terminator, one candidate name per line, and the election title on the
//! last line.

use crate::types::{Ballot, Election};
use log::{info, warn};
use regex::Regex;
use std::io::BufRead;

/// Errors produced while parsing a ballot file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The file ended before the expected section.
    #[error("unexpected end of file, expected {0}")]
    UnexpectedEof(&'static str),
    /// A line did not match the shape expected at its position.
    #[error("malformed {kind} on line {number}: {line:?}")]
    MalformedLine {
        /// What the line was expected to contain.
        kind: &'static str,
        /// 1-based line number.
        number: usize,
        /// The offending line.
        line: String,
    },
    /// The header declared no candidates or no seats.
    #[error("election must have at least one candidate and one seat")]
    EmptyElection,
    /// The header declared more seats than candidates.
    #[error("{num_seats} seats exceed {num_candidates} candidates")]
    TooManySeats {
        /// Declared number of seats.
        num_seats: usize,
        /// Declared number of candidates.
        num_candidates: usize,
    },
    /// A candidate reference was outside `[1, num_candidates]`.
    #[error("candidate index {index} out of range on line {number} ({num_candidates} candidates)")]
    IndexOutOfRange {
        /// The 1-based index as written in the file.
        index: usize,
        /// 1-based line number.
        number: usize,
        /// Declared number of candidates.
        num_candidates: usize,
    },
    /// A ballot ranked the same candidate twice.
    #[error("duplicate candidate index {index} in ballot on line {number}")]
    DuplicatePreference {
        /// The 1-based index as written in the file.
        index: usize,
        /// 1-based line number.
        number: usize,
    },
    /// The tail of the file did not contain one name per candidate plus a
    /// title.
    #[error("expected {expected} candidate names and a title, found {found} lines")]
    BadNameCount {
        /// Declared number of candidates.
        expected: usize,
        /// Number of trailing lines found.
        found: usize,
    },
}

/// Parses a ballot file into an election input.
pub fn parse_election(input: impl BufRead) -> Result<Election, ParseError> {
    let re_header = Regex::new(r"^([0-9]+) +([0-9]+)$").unwrap();
    let re_withdrawn = Regex::new(r"^-[0-9]+(?: +-[0-9]+)*$").unwrap();
    let re_ballot = Regex::new(r"^([0-9]+)((?: +[0-9]+)*) +0$").unwrap();

    let mut lines = input.lines().enumerate().peekable();

    let (n, header) = lines.next().ok_or(ParseError::UnexpectedEof("header"))?;
    let (number, header) = (n + 1, header?);
    let cap = re_header
        .captures(header.trim())
        .ok_or_else(|| ParseError::MalformedLine {
            kind: "header",
            number,
            line: header.clone(),
        })?;
    let num_candidates: usize = cap[1].parse().unwrap();
    let num_seats: usize = cap[2].parse().unwrap();
    if num_candidates == 0 || num_seats == 0 {
        return Err(ParseError::EmptyElection);
    }
    if num_seats > num_candidates {
        return Err(ParseError::TooManySeats {
            num_seats,
            num_candidates,
        });
    }
    info!("{num_seats} seats / {num_candidates} candidates");

    // Converts a 1-based candidate reference to a 0-based index.
    let resolve = |index: usize, number: usize| -> Result<usize, ParseError> {
        if index == 0 || index > num_candidates {
            return Err(ParseError::IndexOutOfRange {
                index,
                number,
                num_candidates,
            });
        }
        Ok(index - 1)
    };

    // The withdrawn line, if present, lists negated 1-based indices.
    let mut withdrawn = Vec::new();
    let withdrawn_line = match lines.peek() {
        Some((n, Ok(line))) if re_withdrawn.is_match(line.trim()) => {
            Some((n + 1, line.trim().to_owned()))
        }
        _ => None,
    };
    if let Some((number, line)) = withdrawn_line {
        for item in line.split_whitespace() {
            let index: usize = item[1..].parse().unwrap();
            withdrawn.push(resolve(index, number)?);
        }
        info!("Withdrawn candidates: {withdrawn:?}");
        lines.next();
    }

    // Ballot lines, until the lone `0` terminator.
    let mut ballots = Vec::new();
    loop {
        let (n, line) = lines
            .next()
            .ok_or(ParseError::UnexpectedEof("ballot line or terminator"))?;
        let number = n + 1;
        let line = line?;
        if line.trim() == "0" {
            break;
        }
        let cap = re_ballot
            .captures(line.trim())
            .ok_or_else(|| ParseError::MalformedLine {
                kind: "ballot",
                number,
                line: line.clone(),
            })?;
        let weight: usize = cap[1].parse().unwrap();
        let mut preferences = Vec::new();
        for item in cap[2].split_whitespace() {
            let index: usize = item.parse().unwrap();
            if index == 0 {
                // Stray ranking separator, skipped like the ballot terminator.
                warn!("Ignored zero candidate reference on line {number}");
                continue;
            }
            let candidate = resolve(index, number)?;
            if preferences.contains(&candidate) {
                return Err(ParseError::DuplicatePreference { index, number });
            }
            preferences.push(candidate);
        }
        ballots.push(Ballot::new(weight, preferences));
    }
    info!("Number of ballots: {}", ballots.len());

    // The tail: one name per candidate, then the election title.
    let mut tail = Vec::new();
    for (_, line) in lines {
        tail.push(line?);
    }
    if tail.len() != num_candidates + 1 {
        return Err(ParseError::BadNameCount {
            expected: num_candidates,
            found: tail.len(),
        });
    }
    let title = tail.pop().unwrap();
    info!("Election title: {title}");

    Ok(Election::builder()
        .title(&title)
        .num_seats(num_seats)
        .withdrawn(withdrawn)
        .candidate_names(tail)
        .ballots(ballots)
        .build())
}
