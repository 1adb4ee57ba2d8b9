// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! CLI entry point. Runs in one of two roles depending on `--job-file`:
//! the documented role (scan `--path`, dispatch one child per `.jobs`
//! file) or the hidden internal role the dispatcher re-execs into (drive
//! a single job file's worker pool). Both roles share the same `Config`
//! parse and validation so a setup mistake fails the same way in either
//! one.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use clap::Parser;
use ems::{Config, Dispatcher, Ems, WorkerPool};
use miette::IntoDiagnostic;

fn main() -> miette::Result<()> {
    let config = Config::parse();
    ems::logging::init();
    config.validate().into_diagnostic()?;

    if let Some(job_file) = config.job_file.clone() {
        run_job_file(&config, &job_file)
    } else {
        Dispatcher::new(config).run().into_diagnostic()
    }
}

/// Drives one `.jobs` file's worker pool against a fresh, process-local
/// `Ems` store and writes its `.out` file alongside it.
fn run_job_file(config: &Config, job_file: &Path) -> miette::Result<()> {
    let input = File::open(job_file).into_diagnostic()?;
    let output_path = ems::dispatcher::output_path_for(job_file);
    let output = File::create(&output_path).into_diagnostic()?;
    let mut writer = BufWriter::new(output);

    let store = Ems::new();
    store.init(config.state_access_delay_ms).into_diagnostic()?;
    let pool = WorkerPool::new(config.max_threads);
    pool.run(&store, BufReader::new(input), &mut writer).into_diagnostic()?;
    writer.flush().into_diagnostic()?;
    store.terminate().into_diagnostic()?;
    Ok(())
}
