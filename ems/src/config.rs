// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The CLI surface (C7), built with the same `clap::Parser` derive this
//! workspace's other binaries use.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{EmsError, Result};

#[derive(Debug, Clone, Parser)]
#[command(name = "ems", about = "Batch processor for seat-reservation command scripts")]
pub struct Config {
    /// Artificial per-seat-access delay, in milliseconds.
    #[arg(short = 'd', long = "delay", default_value_t = 0)]
    pub state_access_delay_ms: u32,

    /// Directory to scan for `.jobs` files.
    #[arg(short = 'p', long = "path", default_value = ".")]
    pub path: PathBuf,

    /// Maximum number of concurrent job-file child processes.
    #[arg(short = 'm', long = "max-proc", default_value_t = 20)]
    pub max_proc: usize,

    /// Worker threads spawned per job-file child.
    #[arg(short = 't', long = "max-threads", default_value_t = 2)]
    pub max_threads: usize,

    /// Internal: process a single job file directly instead of scanning
    /// `path`. Set by the dispatcher's re-exec of its own binary; not part
    /// of the documented CLI surface.
    #[arg(long = "job-file", hide = true)]
    pub job_file: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_proc < 1 {
            return Err(EmsError::InvalidConfig("max_proc must be >= 1".into()));
        }
        if self.max_threads < 1 {
            return Err(EmsError::InvalidConfig("max_threads must be >= 1".into()));
        }
        Ok(())
    }
}
