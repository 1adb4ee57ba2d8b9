// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Logging init (C9): a `tracing_subscriber::fmt` subscriber writing to
//! stderr, so a job's `.out` file stays pristine program output. This is
//! a deliberately smaller cousin of `tui`'s `DynLayer`/file-sink logging
//! stack — a batch CLI needs one stream, not a switchable display/file
//! pair.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Safe to call once per process; a
/// second call (e.g. in a test harness) is a no-op rather than a panic.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
