// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The process fan-out (C5): one child process per `.jobs` file, bounded
//! at `max_proc` concurrent children.
//!
//! `std` has no `fork()`. The child role is played by re-executing this
//! same binary (`std::env::current_exe`) with the hidden `--job-file`
//! flag, handed off via `std::process::Command` — the same primitive
//! `giti`'s branch subcommands use to shell out to `git`. Reaping "one
//! arbitrary finished child" (what `wait()` gives the original) is played
//! by polling every live `Child` with `try_wait` and taking the first
//! one ready, since `std` has no blocking wait-on-any-child.

use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{EmsError, Result};

const REAP_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug)]
pub struct Dispatcher {
    config: Config,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: Config) -> Self { Self { config } }

    /// Scans `config.path`, fans a child out per `.jobs` file found,
    /// never exceeding `max_proc` live children, and reaps everything
    /// before returning.
    pub fn run(&self) -> Result<()> {
        let exe = std::env::current_exe()?;
        let jobs = self.discover_jobs()?;
        let mut children: Vec<Child> = Vec::new();

        for job in jobs {
            if children.len() >= self.config.max_proc {
                reap_one(&mut children)?;
            }
            info!(job = %job.display(), "spawning child");
            let child = std::process::Command::new(&exe)
                .arg("--delay")
                .arg(self.config.state_access_delay_ms.to_string())
                .arg("--max-threads")
                .arg(self.config.max_threads.to_string())
                .arg("--job-file")
                .arg(&job)
                .spawn()
                .map_err(|source| EmsError::DirectoryOpen { path: job.clone(), source })?;
            children.push(child);
        }

        for mut child in children {
            log_exit(child.wait());
        }
        Ok(())
    }

    /// Enumerates regular, non-hidden `.jobs` files directly under
    /// `config.path` (one level deep, matching the original's flat
    /// directory scan).
    fn discover_jobs(&self) -> Result<Vec<PathBuf>> {
        std::fs::read_dir(&self.config.path)
            .map_err(|source| EmsError::DirectoryOpen { path: self.config.path.clone(), source })?;

        let mut jobs: Vec<PathBuf> = WalkDir::new(&self.config.path)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                entry.file_type().is_file() && !name.starts_with('.') && name.ends_with(".jobs")
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();
        jobs.sort();
        Ok(jobs)
    }
}

/// Replaces a job's `.jobs` suffix with `.out` for its output file.
#[must_use]
pub fn output_path_for(job_file: &std::path::Path) -> PathBuf { job_file.with_extension("out") }

fn reap_one(children: &mut Vec<Child>) -> Result<()> {
    loop {
        if let Some(pos) = children.iter_mut().position(|c| matches!(c.try_wait(), Ok(Some(_)))) {
            let mut child = children.remove(pos);
            log_exit(child.wait());
            return Ok(());
        }
        std::thread::sleep(REAP_POLL_INTERVAL);
    }
}

fn log_exit(status: std::io::Result<std::process::ExitStatus>) {
    match status {
        Ok(status) if status.success() => info!("child exited cleanly"),
        Ok(status) => warn!(?status, "child exited with a failure"),
        Err(e) => warn!(error = %e, "failed to wait for child"),
    }
}
