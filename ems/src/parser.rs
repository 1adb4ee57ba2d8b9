// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The external parser façade (C6).
//!
//! spec.md treats tokenization as an oracle supplied elsewhere; no crate
//! in this workspace's stack is a drop-in `.jobs`-grammar lexer, so this
//! module is that oracle, kept narrow and opaque on purpose: a
//! `CommandReader` owns the shared parsing cursor, `next_command` advances
//! it by exactly one line and returns a `Command` tag, and the
//! `parse_*` methods are thin typed accessors over whatever line
//! `next_command` just read. Both halves are meant to be called back to
//! back, under the caller's command mutex — that's the contract the
//! original's fd-oracle had, and this keeps it.

use std::io::BufRead;

use crate::error::{EmsError, Result};

/// Coordinate lists longer than this in a single `RESERVE` are a parse
/// error rather than a silent truncation (spec.md's open question on
/// overlong reservations).
pub const MAX_RESERVATION_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Reserve,
    Show,
    List,
    Wait,
    Barrier,
    Help,
    Invalid(String),
    Empty,
    Eoc,
}

pub struct CommandReader<R> {
    lines: std::io::Lines<R>,
    /// Whitespace-split tokens following the command keyword on the most
    /// recently read line, consumed by the matching `parse_*` call.
    args: Vec<String>,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R) -> Self { Self { lines: reader.lines(), args: Vec::new() } }

    /// Advance the cursor by one line and classify it.
    pub fn next_command(&mut self) -> Result<Command> {
        let Some(line) = self.lines.next() else {
            return Ok(Command::Eoc);
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            self.args.clear();
            return Ok(Command::Empty);
        }

        let mut tokens = trimmed.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        self.args = tokens.map(str::to_owned).collect();

        Ok(match keyword {
            "CREATE" => Command::Create,
            "RESERVE" => Command::Reserve,
            "SHOW" => Command::Show,
            "LIST" => Command::List,
            "WAIT" => Command::Wait,
            "BARRIER" => Command::Barrier,
            "HELP" => Command::Help,
            other => Command::Invalid(other.to_owned()),
        })
    }

    /// `CREATE <id> <rows> <cols>`.
    pub fn parse_create(&self) -> Result<(u32, usize, usize)> {
        match self.args.as_slice() {
            [id, rows, cols] => {
                let id = parse_u32(id)?;
                let rows = parse_usize(rows)?;
                let cols = parse_usize(cols)?;
                Ok((id, rows, cols))
            }
            _ => Err(EmsError::InvalidCommand("CREATE <id> <rows> <cols>".into())),
        }
    }

    /// `RESERVE <id> [(x1,y1) (x2,y2) ...]`. Coordinates are 1-indexed in
    /// the script and converted to 0-indexed here.
    pub fn parse_reserve(&self) -> Result<(u32, Vec<(usize, usize)>)> {
        let [id, rest @ ..] = self.args.as_slice() else {
            return Err(EmsError::InvalidCommand("RESERVE <id> [(x,y) ...]".into()));
        };
        let id = parse_u32(id)?;
        if rest.len() > MAX_RESERVATION_SIZE {
            return Err(EmsError::InvalidCommand(format!(
                "RESERVE coordinate list exceeds {MAX_RESERVATION_SIZE} entries"
            )));
        }
        let mut coords = Vec::with_capacity(rest.len());
        for token in rest {
            coords.push(parse_coord(token)?);
        }
        Ok((id, coords))
    }

    /// `SHOW <id>`.
    pub fn parse_show(&self) -> Result<u32> {
        match self.args.as_slice() {
            [id] => parse_u32(id),
            _ => Err(EmsError::InvalidCommand("SHOW <id>".into())),
        }
    }

    /// `WAIT <delay_ms> [<thread_id>]`.
    pub fn parse_wait(&self) -> Result<(u32, Option<usize>)> {
        match self.args.as_slice() {
            [delay] => Ok((parse_u32(delay)?, None)),
            [delay, target] => Ok((parse_u32(delay)?, Some(parse_usize(target)?))),
            _ => Err(EmsError::InvalidCommand("WAIT <delay_ms> [<thread_id>]".into())),
        }
    }
}

fn parse_u32(token: &str) -> Result<u32> {
    token.parse().map_err(|_| EmsError::InvalidCommand(format!("expected a number, got {token:?}")))
}

fn parse_usize(token: &str) -> Result<usize> {
    token.parse().map_err(|_| EmsError::InvalidCommand(format!("expected a number, got {token:?}")))
}

/// Parses `(x,y)`, converting from the script's 1-indexed coordinates to
/// 0-indexed ones.
fn parse_coord(token: &str) -> Result<(usize, usize)> {
    let inner = token
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| EmsError::InvalidCommand(format!("expected (x,y), got {token:?}")))?;
    let (x, y) = inner
        .split_once(',')
        .ok_or_else(|| EmsError::InvalidCommand(format!("expected (x,y), got {token:?}")))?;
    let x: usize = parse_usize(x)?;
    let y: usize = parse_usize(y)?;
    let (x, y) = (
        x.checked_sub(1).ok_or_else(|| EmsError::InvalidCommand("coordinates are 1-indexed".into()))?,
        y.checked_sub(1).ok_or_else(|| EmsError::InvalidCommand("coordinates are 1-indexed".into()))?,
    );
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use test_case::test_case;

    use super::*;

    fn reader(text: &str) -> CommandReader<Cursor<&[u8]>> {
        CommandReader::new(Cursor::new(text.as_bytes()))
    }

    #[test_case("CREATE 1 2 2", Command::Create)]
    #[test_case("RESERVE 1 (1,1)", Command::Reserve)]
    #[test_case("SHOW 1", Command::Show)]
    #[test_case("LIST", Command::List)]
    #[test_case("WAIT 10", Command::Wait)]
    #[test_case("BARRIER", Command::Barrier)]
    #[test_case("HELP", Command::Help)]
    #[test_case("", Command::Empty)]
    #[test_case("# a comment", Command::Empty)]
    #[test_case("BOGUS", Command::Invalid("BOGUS".into()))]
    fn classifies_one_line(line: &str, expected: Command) {
        let mut r = reader(&format!("{line}\n"));
        assert_eq!(r.next_command().unwrap(), expected);
    }

    #[test]
    fn recognizes_every_keyword() {
        let mut r = reader("CREATE 1 2 2\nRESERVE 1 (1,1)\nSHOW 1\nLIST\nWAIT 10\nBARRIER\nHELP\n\n# a comment\nBOGUS\n");
        assert_eq!(r.next_command().unwrap(), Command::Create);
        assert_eq!(r.next_command().unwrap(), Command::Reserve);
        assert_eq!(r.next_command().unwrap(), Command::Show);
        assert_eq!(r.next_command().unwrap(), Command::List);
        assert_eq!(r.next_command().unwrap(), Command::Wait);
        assert_eq!(r.next_command().unwrap(), Command::Barrier);
        assert_eq!(r.next_command().unwrap(), Command::Help);
        assert_eq!(r.next_command().unwrap(), Command::Empty);
        assert_eq!(r.next_command().unwrap(), Command::Empty);
        assert_eq!(r.next_command().unwrap(), Command::Invalid("BOGUS".into()));
        assert_eq!(r.next_command().unwrap(), Command::Eoc);
    }

    #[test]
    fn parse_create_reads_triple() {
        let mut r = reader("CREATE 7 3 4\n");
        r.next_command().unwrap();
        assert_eq!(r.parse_create().unwrap(), (7, 3, 4));
    }

    #[test]
    fn parse_reserve_converts_to_zero_indexed() {
        let mut r = reader("RESERVE 1 (1,1) (2,2)\n");
        r.next_command().unwrap();
        let (id, coords) = r.parse_reserve().unwrap();
        assert_eq!(id, 1);
        assert_eq!(coords, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn parse_reserve_rejects_bad_coordinate() {
        let mut r = reader("RESERVE 1 (1,1) garbage\n");
        r.next_command().unwrap();
        assert!(r.parse_reserve().is_err());
    }

    #[test]
    fn parse_wait_with_and_without_target() {
        let mut r = reader("WAIT 100 2\nWAIT 50\n");
        r.next_command().unwrap();
        assert_eq!(r.parse_wait().unwrap(), (100, Some(2)));
        r.next_command().unwrap();
        assert_eq!(r.parse_wait().unwrap(), (50, None));
    }

    #[test]
    fn parse_create_with_wrong_arity_errors() {
        let mut r = reader("CREATE 1 2\n");
        r.next_command().unwrap();
        assert!(r.parse_create().is_err());
    }
}
