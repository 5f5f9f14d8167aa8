//! Persisted run traces.
//!
//! An [`ActionRecord`] holds everything needed to re-run a game: the seed,
//! the effective actions of every tick and the result the run ended with.
//!
//! ## Text format
//!
//! Single-agent:
//!
//! ```text
//! <seed> <win 1|0> <score> <ticks>
//! ACTION_RIGHT
//! ACTION_NIL
//! ...
//! ```
//!
//! Multi-agent:
//!
//! ```text
//! <seed> <ticks>
//! <score p0> <score p1> ...
//! <win p0> <win p1> ...
//! <action p0> <action p1> ...      one line per tick
//! ```
//!
//! Missing trailing entries on a multi-agent action line are `ACTION_NIL`,
//! missing scores and win flags are 0. Trailing blank lines are ignored.
//! Anything else that does not fit is a `TraceFormat` error naming the line.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::core::{Action, ActionSet, HarnessError, PlayerId, Result};

/// Final result a replay must reproduce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedResult {
    /// Per-player win flags.
    pub wins: Vec<bool>,
    /// Per-player final scores.
    pub scores: Vec<f64>,
    /// Ticks applied in the run.
    pub tick_count: u32,
}

/// One recorded run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seed: u64,
    pub player_count: usize,
    /// Effective actions per tick, one entry per player.
    pub ticks: Vec<ActionSet>,
    pub result: RecordedResult,
}

impl ActionRecord {
    /// Build and validate a record.
    pub fn new(
        seed: u64,
        player_count: usize,
        ticks: Vec<ActionSet>,
        result: RecordedResult,
    ) -> Result<Self> {
        let record = Self {
            seed,
            player_count,
            ticks,
            result,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the record is self-consistent.
    ///
    /// The action count must equal the tick count, or exceed it by one for
    /// traces that log a trailing terminal tick.
    pub fn validate(&self) -> Result<()> {
        if self.player_count == 0 || self.player_count > 255 {
            return Err(HarnessError::trace(1, format!("invalid player count {}", self.player_count)));
        }
        if self.result.scores.len() != self.player_count || self.result.wins.len() != self.player_count {
            return Err(HarnessError::trace(
                1,
                format!(
                    "result lists {} scores and {} win flags for {} players",
                    self.result.scores.len(),
                    self.result.wins.len(),
                    self.player_count
                ),
            ));
        }
        let expected = self.result.tick_count as usize;
        if self.ticks.len() != expected && self.ticks.len() != expected + 1 {
            return Err(HarnessError::trace(
                1,
                format!("{} recorded ticks for a tick count of {expected}", self.ticks.len()),
            ));
        }
        if let Some(i) = self.ticks.iter().position(|t| t.len() != self.player_count) {
            return Err(HarnessError::trace(
                self.first_action_line() + i,
                format!("expected {} actions", self.player_count),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_single_agent(&self) -> bool {
        self.player_count == 1
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// One player's actions in tick order.
    #[must_use]
    pub fn player_actions(&self, player: PlayerId) -> Vec<Action> {
        self.ticks
            .iter()
            .map(|tick| tick.get(player.index()).copied().unwrap_or_default())
            .collect()
    }

    /// Widen the record to `player_count` slots. Players the trace does not
    /// mention score 0, do not win and play `ACTION_NIL` every tick.
    /// Never narrows.
    #[must_use]
    pub fn padded_to(&self, player_count: usize) -> Self {
        let mut record = self.clone();
        if player_count <= record.player_count {
            return record;
        }
        record.player_count = player_count;
        record.result.scores.resize(player_count, 0.0);
        record.result.wins.resize(player_count, false);
        for tick in &mut record.ticks {
            tick.resize(player_count, Action::Nil);
        }
        record
    }

    fn first_action_line(&self) -> usize {
        if self.is_single_agent() {
            2
        } else {
            4
        }
    }

    /// Render in the text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.is_single_agent() {
            let _ = writeln!(
                out,
                "{} {} {} {}",
                self.seed,
                u8::from(self.result.wins.first().copied().unwrap_or(false)),
                self.result.scores.first().copied().unwrap_or(0.0),
                self.result.tick_count
            );
            for tick in &self.ticks {
                let _ = writeln!(out, "{}", tick.first().copied().unwrap_or_default());
            }
        } else {
            let _ = writeln!(out, "{} {}", self.seed, self.result.tick_count);
            let _ = writeln!(out, "{}", join(self.result.scores.iter()));
            let _ = writeln!(out, "{}", join(self.result.wins.iter().map(|w| u8::from(*w))));
            for tick in &self.ticks {
                let _ = writeln!(out, "{}", join(tick.iter()));
            }
        }
        out
    }

    /// Parse the text format.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let end = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |i| i + 1);
        let lines = &lines[..end];

        let header = lines.first().ok_or_else(|| HarnessError::trace(1, "empty trace"))?;
        let fields: Vec<&str> = header.split_whitespace().collect();
        let record = match fields.len() {
            4 => parse_single(&fields, &lines[1..])?,
            2 => parse_multi(&fields, &lines[1..])?,
            n => {
                return Err(HarnessError::trace(
                    1,
                    format!("header has {n} fields, expected 4 (single agent) or 2 (multi agent)"),
                ))
            }
        };
        record.validate()?;
        Ok(record)
    }

    /// Write the text format to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Read the text format from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: Self = bincode::deserialize(bytes)?;
        record.validate()?;
        Ok(record)
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(" ")
}

fn number<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| HarnessError::trace(line, format!("invalid {what} `{token}`")))
}

fn flag(token: &str, line: usize) -> Result<bool> {
    match token {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(HarnessError::trace(line, format!("invalid win flag `{token}`, expected 1 or 0"))),
    }
}

fn action(token: &str, line: usize) -> Result<Action> {
    token
        .parse()
        .map_err(|err: crate::core::UnknownAction| HarnessError::trace(line, err.to_string()))
}

fn parse_single(header: &[&str], body: &[&str]) -> Result<ActionRecord> {
    let seed = number(header[0], 1, "seed")?;
    let win = flag(header[1], 1)?;
    let score = number(header[2], 1, "score")?;
    let tick_count = number(header[3], 1, "tick count")?;

    let ticks = body
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let line = i + 2;
            let mut tokens = text.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (Some(token), None) => Ok(smallvec::smallvec![action(token, line)?]),
                (None, _) => Err(HarnessError::trace(line, "missing action")),
                (Some(_), Some(_)) => Err(HarnessError::trace(line, "expected one action")),
            }
        })
        .collect::<Result<Vec<ActionSet>>>()?;

    Ok(ActionRecord {
        seed,
        player_count: 1,
        ticks,
        result: RecordedResult {
            wins: vec![win],
            scores: vec![score],
            tick_count,
        },
    })
}

fn parse_multi(header: &[&str], body: &[&str]) -> Result<ActionRecord> {
    let seed = number(header[0], 1, "seed")?;
    let tick_count = number(header[1], 1, "tick count")?;

    let score_line = body.first().ok_or_else(|| HarnessError::trace(2, "missing score line"))?;
    let win_line = body.get(1).ok_or_else(|| HarnessError::trace(3, "missing win line"))?;

    let mut scores = score_line
        .split_whitespace()
        .map(|t| number::<f64>(t, 2, "score"))
        .collect::<Result<Vec<_>>>()?;
    let mut wins = win_line
        .split_whitespace()
        .map(|t| flag(t, 3))
        .collect::<Result<Vec<_>>>()?;

    let player_count = scores.len().max(wins.len());
    if player_count < 2 {
        return Err(HarnessError::trace(2, "multi-agent trace needs at least two players"));
    }
    scores.resize(player_count, 0.0);
    wins.resize(player_count, false);

    let ticks = body[2..]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let line = i + 4;
            let mut tick = text
                .split_whitespace()
                .map(|t| action(t, line))
                .collect::<Result<ActionSet>>()?;
            if tick.len() > player_count {
                return Err(HarnessError::trace(
                    line,
                    format!("{} actions for {player_count} players", tick.len()),
                ));
            }
            tick.resize(player_count, Action::Nil);
            Ok(tick)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ActionRecord {
        seed,
        player_count,
        ticks,
        result: RecordedResult {
            wins,
            scores,
            tick_count,
        },
    })
}
