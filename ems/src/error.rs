// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error taxonomy for the event store and everything built on top of it.
//!
//! One enum covers every kind named in the spec: setup, validation,
//! lookup, seat-level, concurrency-primitive and I/O errors. Setup
//! variants are fatal to the process that hits them; everything else is
//! reported on the diagnostic channel and the caller moves on to the next
//! command.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmsError {
    #[error("event store already initialized")]
    AlreadyInitialized,

    #[error("event store not initialized")]
    NotInitialized,

    #[error("failed to open job directory {path:?}: {source}")]
    DirectoryOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid shape: rows and cols must be >= 1 and rows*cols must not overflow")]
    InvalidShape,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("no event with id {0}")]
    NoSuchEvent(u32),

    #[error("event {0} already exists")]
    DuplicateId(u32),

    #[error("coordinate ({x}, {y}) is out of bounds for a {rows}x{cols} event")]
    OutOfBounds { x: usize, y: usize, rows: usize, cols: usize },

    #[error("seat ({x}, {y}) is already reserved")]
    AlreadyReserved { x: usize, y: usize },

    #[error("failed to acquire lock: {0}")]
    LockAcquire(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EmsError>;
