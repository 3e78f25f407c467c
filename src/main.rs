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

//! Command-line tabulator for Meek STV ballot files.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use clap::Parser;
use meek_stv::meek::{count_with, CountError, CountOptions, IndexOrder};
use meek_stv::parse::parse_election;
use meek_stv::report::{Log, LogEntry};
use meek_stv::trace::LogSink;
use meek_stv::types::{CandidateState, Election};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;

/// Tabulates the winners of a Meek STV election from a ballot file.
#[derive(Parser, Debug, PartialEq, Eq)]
struct Cli {
    /// Path to the ballot file, or "-" to read from standard input.
    ballots: String,

    /// Base-10 logarithm of the convergence epsilon "omega", i.e.
    /// `omega = 10^-omega_exponent`.
    #[arg(long, default_value_t = 7)]
    omega_exponent: u32,

    /// Hard cap on the number of counting rounds before the count is
    /// force-completed and reported as non-converged.
    #[arg(long, default_value_t = 50)]
    max_rounds: usize,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let election = match read_election(&cli.ballots) {
        Ok(election) => election,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = CountOptions {
        omega_exponent: cli.omega_exponent,
        max_rounds: cli.max_rounds,
        tie_breaker: &IndexOrder,
    };

    let mut stdout = io::stdout().lock();
    match count_with(&election, &options, &mut LogSink) {
        Ok(log) => {
            write_report(&mut stdout, &election, &log).unwrap();
            ExitCode::SUCCESS
        }
        Err(CountError::NonConvergence { max_rounds, log }) => {
            write_report(&mut stdout, &election, &log).unwrap();
            eprintln!("error: count did not converge within {max_rounds} rounds");
            ExitCode::FAILURE
        }
    }
}

/// Reads and parses the ballot file, or standard input for `-`.
fn read_election(path: &str) -> Result<Election, Box<dyn std::error::Error>> {
    let election = if path == "-" {
        parse_election(io::stdin().lock())?
    } else {
        parse_election(BufReader::new(File::open(path)?))?
    };
    Ok(election)
}

/// Writes the round-by-round report and the winner summary.
fn write_report(out: &mut impl Write, election: &Election, log: &Log) -> io::Result<()> {
    writeln!(out, "Election: {}", election.title)?;
    writeln!(out, "Seats: {}", election.num_seats)?;
    writeln!(out, "Ballots: {}", election.num_ballots)?;

    for i in 0..log.num_rounds() {
        let entry = log.round(i);
        writeln!(out, "Round {}:", entry.round + 1)?;
        writeln!(
            out,
            "\tThreshold: {:.2} ({:.2}%)",
            entry.threshold,
            percentage(entry.threshold, entry.total_votes)
        )?;
        writeln!(out, "\tVotes: {:.2}", entry.total_votes)?;
        writeln!(out, "\tExhausted: {:.2}", entry.exhausted)?;
        for c in &entry.snapshot {
            writeln!(
                out,
                "\t{} {}\tkeep={:.2}\tvotes={:.2}",
                status_label(c.state),
                c.name,
                c.keep_factor,
                c.votes
            )?;
        }
        for c in &entry.elected {
            writeln!(out, "\tElected: {} with {:.2} votes", c.name, c.votes)?;
        }
        if let Some(c) = &entry.defeated {
            writeln!(out, "\tEliminated: {}", c.name)?;
        }
        write_transfers(out, entry, "Surplus transfers", &entry.surplus_received, entry.surplus_exhausted_delta)?;
        write_transfers(
            out,
            entry,
            "Elimination transfers",
            &entry.elimination_received,
            entry.elimination_exhausted_delta,
        )?;
        writeln!(out, "-------------------------")?;
    }

    // Winner summary, strongest first.
    let mut results = log.results().to_vec();
    results.sort_by(|a, b| b.votes.partial_cmp(&a.votes).unwrap());
    writeln!(out, "Winners:")?;
    for c in &results {
        if c.state == CandidateState::Elected {
            writeln!(out, "- {} ({:.2})", c.name, c.votes)?;
        }
    }
    Ok(())
}

/// Writes one transfer map, resolving recipient names through the snapshot.
fn write_transfers(
    out: &mut impl Write,
    entry: &LogEntry,
    label: &str,
    received: &std::collections::BTreeMap<usize, f64>,
    exhausted_delta: f64,
) -> io::Result<()> {
    if received.is_empty() {
        return Ok(());
    }
    write!(out, "\t{label}:")?;
    for (&index, &delta) in received {
        write!(out, " {} +{:.2}", entry.candidate(index).name, delta)?;
    }
    writeln!(out, ", exhausted +{exhausted_delta:.2}")?;
    Ok(())
}

fn percentage(x: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    x / total * 100.0
}

fn status_label(state: CandidateState) -> &'static str {
    match state {
        CandidateState::Hopeful => "Hopeful: ",
        CandidateState::Withdrawn => "Withdrawn:",
        CandidateState::Defeated => "Defeated:",
        CandidateState::Elected => "Elected: ",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::error::ErrorKind;
    use meek_stv::types::Ballot;

    #[test]
    fn test_parse_incomplete() {
        let error = Cli::try_parse_from(["meek-stv"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_help() {
        let error = Cli::try_parse_from(["meek-stv", "--help"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["meek-stv", "ballots.txt"]).unwrap();
        assert_eq!(
            cli,
            Cli {
                ballots: "ballots.txt".to_owned(),
                omega_exponent: 7,
                max_rounds: 50,
            }
        );
    }

    #[test]
    fn test_parse_full() {
        let cli = Cli::try_parse_from([
            "meek-stv",
            "-",
            "--omega-exponent=9",
            "--max-rounds=20",
        ])
        .unwrap();
        assert_eq!(
            cli,
            Cli {
                ballots: "-".to_owned(),
                omega_exponent: 9,
                max_rounds: 20,
            }
        );
    }

    #[test]
    fn test_write_report() {
        let election = Election::builder()
            .title("TwoSeats")
            .num_seats(2)
            .candidate_names(["choice-A", "choice-B"])
            .ballots([Ballot::new(1, [0]), Ballot::new(1, [1])])
            .build();
        let log = meek_stv::count(&election).unwrap();

        let mut buf = Vec::new();
        write_report(&mut buf, &election, &log).unwrap();
        let report = String::from_utf8(buf).unwrap();

        assert!(report.starts_with("Election: TwoSeats\n"));
        assert!(report.contains("Round 1:\n\tThreshold: 0.67 (33.33%)\n"));
        assert!(report.contains("\tElected: choice-A with 1.00 votes\n"));
        assert!(report.contains("\tElected: choice-B with 1.00 votes\n"));
        assert!(report.contains("Winners:\n- choice-A (1.00)\n- choice-B (1.00)\n"));
    }
}
