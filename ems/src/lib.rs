// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

//! Event Management Store: a concurrent batch processor for fixed-shape
//! 2D seat-reservation command scripts.
//!
//! A process-wide [`ops::Ems`] store owns an [`registry::EventRegistry`]
//! of [`event::Event`] grids; a [`worker::WorkerPool`] drives one job
//! file's command stream against it; a [`dispatcher::Dispatcher`] fans a
//! directory of job files out across child processes.

pub mod config;
pub mod delay;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod logging;
pub mod ops;
pub mod parser;
pub mod registry;
pub mod worker;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{EmsError, Result};
pub use ops::Ems;
pub use worker::WorkerPool;
