// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The artificial per-operation delay knob.
//!
//! Out of scope per the spec beyond "it's a sleep" — this is that sleep.
//! Centralized here so every call site (seat access inside `Event`,
//! `Ems::wait`) goes through the same place, which is what the
//! concurrency properties (P1, P6) are measured against.

use std::time::Duration;

/// Sleep for `ms` milliseconds. A no-op for `0`, which is the default and
/// keeps tests fast.
pub fn apply(ms: u32) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
