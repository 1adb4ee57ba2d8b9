// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A single fixed-shape seat grid (C1).
//!
//! `rows`/`cols`/`id` are immutable for the lifetime of the `Event`; only
//! the seat buffer itself is mutable, guarded by its own reader/writer
//! lock. `reserve` is the one operation that needs care: it marks seats as
//! it walks the coordinate list (rather than scanning first, then
//! committing) so the artificial delay between consecutive seat accesses
//! is observable — a two-phase version would halve the number of delays a
//! timing test sees. Correctness under the exclusive write lock is
//! unaffected either way; on any failure every tentatively-marked seat is
//! rolled back to free, in reverse order, before the lock is released.

use std::io::Write;
use std::sync::RwLock;

use crate::delay;
use crate::error::{EmsError, Result};

/// `0` means free; any other value is the id of the reservation that
/// claimed the seat.
pub type SeatState = u32;

pub const FREE: SeatState = 0;

#[derive(Debug)]
pub struct Event {
    id: u32,
    rows: usize,
    cols: usize,
    seats: RwLock<Vec<SeatState>>,
}

impl Event {
    pub fn new(id: u32, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(EmsError::InvalidShape);
        }
        let len = rows.checked_mul(cols).ok_or(EmsError::InvalidShape)?;
        Ok(Self { id, rows, cols, seats: RwLock::new(vec![FREE; len]) })
    }

    #[must_use]
    pub fn id(&self) -> u32 { self.id }

    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) { (self.rows, self.cols) }

    fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.rows && y < self.cols { Some(x * self.cols + y) } else { None }
    }

    /// Read a single cell. Takes the reader lock only for the duration of
    /// the read.
    pub fn seat(&self, x: usize, y: usize) -> Result<SeatState> {
        let idx = self
            .index_of(x, y)
            .ok_or(EmsError::OutOfBounds { x, y, rows: self.rows, cols: self.cols })?;
        let guard = self.seats.read().map_err(|_| EmsError::LockAcquire("event seats".into()))?;
        Ok(guard[idx])
    }

    /// Atomically reserve every coordinate in `coords`, stamping each with
    /// `rid`. Either all transition `FREE -> rid` or none do.
    pub fn reserve(&self, coords: &[(usize, usize)], rid: u32, delay_ms: u32) -> Result<()> {
        let mut guard = self.seats.write().map_err(|_| EmsError::LockAcquire("event seats".into()))?;
        let mut marked: Vec<usize> = Vec::with_capacity(coords.len());

        let result = (|| -> Result<()> {
            for (pos, &(x, y)) in coords.iter().enumerate() {
                if pos > 0 {
                    delay::apply(delay_ms);
                }
                let idx = self
                    .index_of(x, y)
                    .ok_or(EmsError::OutOfBounds { x, y, rows: self.rows, cols: self.cols })?;
                if guard[idx] != FREE {
                    return Err(EmsError::AlreadyReserved { x, y });
                }
                guard[idx] = rid;
                marked.push(idx);
            }
            Ok(())
        })();

        if result.is_err() {
            for idx in marked.into_iter().rev() {
                guard[idx] = FREE;
            }
        }
        result
    }

    /// Write `rows` lines of `cols` space-separated decimal seat values to
    /// `sink`, pacing successive seat reads with the artificial delay.
    pub fn write_show(&self, sink: &mut impl Write, delay_ms: u32) -> Result<()> {
        let guard = self.seats.read().map_err(|_| EmsError::LockAcquire("event seats".into()))?;
        let mut out = String::with_capacity(guard.len() * 2 + self.rows);
        let mut first = true;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if !first {
                    delay::apply(delay_ms);
                }
                first = false;
                if col > 0 {
                    out.push(' ');
                }
                out.push_str(&guard[row * self.cols + col].to_string());
            }
            out.push('\n');
        }
        drop(guard);
        sink.write_all(out.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_rejects_zero_shape() {
        assert!(matches!(Event::new(1, 0, 2), Err(EmsError::InvalidShape)));
        assert!(matches!(Event::new(1, 2, 0), Err(EmsError::InvalidShape)));
    }

    #[test]
    fn new_rejects_overflowing_shape() {
        assert!(matches!(Event::new(1, usize::MAX, 2), Err(EmsError::InvalidShape)));
    }

    #[test]
    fn reserve_then_show_matches_scenario_one() {
        let event = Event::new(1, 2, 2).unwrap();
        event.reserve(&[(0, 0), (0, 1)], 1, 0).unwrap();
        let mut buf = Vec::new();
        event.write_show(&mut buf, 0).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1 1\n0 0\n");
    }

    #[test]
    fn double_reserve_fails_and_first_wins() {
        let event = Event::new(1, 2, 2).unwrap();
        event.reserve(&[(0, 0)], 1, 0).unwrap();
        let err = event.reserve(&[(0, 0)], 2, 0).unwrap_err();
        assert!(matches!(err, EmsError::AlreadyReserved { x: 0, y: 0 }));
        assert_eq!(event.seat(0, 0).unwrap(), 1);
    }

    #[test]
    fn out_of_bounds_reserve_leaves_event_untouched() {
        let event = Event::new(1, 1, 1).unwrap();
        let before = event.seat(0, 0).unwrap();
        let err = event.reserve(&[(0, 0), (5, 5)], 1, 0).unwrap_err();
        assert!(matches!(err, EmsError::OutOfBounds { .. }));
        assert_eq!(event.seat(0, 0).unwrap(), before);
    }

    #[test]
    fn partial_reserve_rolls_back_on_later_failure() {
        let event = Event::new(1, 1, 3).unwrap();
        event.reserve(&[(0, 2)], 9, 0).unwrap();
        let err = event.reserve(&[(0, 0), (0, 1), (0, 2)], 1, 0).unwrap_err();
        assert!(matches!(err, EmsError::AlreadyReserved { x: 0, y: 2 }));
        assert_eq!(event.seat(0, 0).unwrap(), FREE);
        assert_eq!(event.seat(0, 1).unwrap(), FREE);
        assert_eq!(event.seat(0, 2).unwrap(), 9);
    }

    #[test]
    fn concurrent_reserve_exactly_one_winner() {
        let event = std::sync::Arc::new(Event::new(1, 1, 2).unwrap());
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let event = std::sync::Arc::clone(&event);
                    scope.spawn(move || event.reserve(&[(0, 0), (0, 1)], i + 1, 0).is_ok())
                })
                .collect();
            let wins = handles.into_iter().filter(|h| h.join().unwrap()).count();
            assert_eq!(wins, 1);
        });
        let winner = event.seat(0, 0).unwrap();
        assert_eq!(event.seat(0, 1).unwrap(), winner);
        assert_ne!(winner, FREE);
    }
}
