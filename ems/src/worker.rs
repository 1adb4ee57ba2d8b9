// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The per-job worker team (C4): a fixed number of threads sharing one
//! command stream, serialized at the parsing boundary by a single
//! command mutex, coordinating deferred delays through a wait queue and
//! cooperative re-entry through a barrier flag.
//!
//! The command mutex guards the parsing cursor, the wait queue and the
//! barrier flag together — exactly the grouping the original's global
//! mutex protected. A second, narrower mutex guards only the output
//! sink: `SHOW` holds the command mutex across its write (so no other
//! worker can even reach the parsing boundary meanwhile), but `LIST`
//! releases the command mutex before writing, so without a dedicated
//! sink lock a concurrent `SHOW`/`LIST` pair could interleave their
//! bytes. Section 5 of the design notes explicitly allows this as an
//! alternative to holding the command mutex across every write.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::error::{EmsError, Result};
use crate::ops::Ems;
use crate::parser::{Command, CommandReader};

const HELP_TEXT: &str = "\
Commands:
  CREATE <id> <rows> <cols>
  RESERVE <id> [(x,y) ...]
  SHOW <id>
  LIST
  WAIT <delay_ms> [<thread_id>]
  BARRIER
  HELP
";

struct Shared<R> {
    reader: CommandReader<R>,
    wait_queue: Vec<u32>,
    barrier_flag: bool,
}

struct JobContext<R, W> {
    state: Mutex<Shared<R>>,
    sink: Mutex<W>,
}

impl<R: BufRead, W: Write> JobContext<R, W> {
    fn new(reader: R, sink: W, max_threads: usize) -> Self {
        Self {
            state: Mutex::new(Shared {
                reader: CommandReader::new(reader),
                wait_queue: vec![0; max_threads],
                barrier_flag: false,
            }),
            sink: Mutex::new(sink),
        }
    }

    fn reset_for_round(&self) -> Result<()> {
        let mut guard = self.lock_state()?;
        guard.barrier_flag = false;
        guard.wait_queue.iter_mut().for_each(|slot| *slot = 0);
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, Shared<R>>> {
        self.state.lock().map_err(|_| EmsError::LockAcquire("job command mutex".into()))
    }

    fn lock_sink(&self) -> Result<std::sync::MutexGuard<'_, W>> {
        self.sink.lock().map_err(|_| EmsError::LockAcquire("job output sink".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    EndOfCommands,
    Barrier,
}

fn report(context: &str, err: EmsError) { warn!(%context, error = %err, "command failed"); }

/// One worker's run through the shared command stream until it hits
/// `EOC` or `BARRIER`.
fn worker_loop<R: BufRead, W: Write>(id: usize, ctx: &JobContext<R, W>, ems: &Ems) -> Result<WorkerExit> {
    loop {
        let mut guard = ctx.lock_state()?;
        let local_wait = std::mem::replace(&mut guard.wait_queue[id], 0);

        if guard.barrier_flag {
            drop(guard);
            if local_wait > 0 {
                crate::delay::apply(local_wait);
            }
            return Ok(WorkerExit::Barrier);
        }

        let command = guard.reader.next_command()?;
        match command {
            Command::Create => {
                let parsed = guard.reader.parse_create();
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                match parsed.and_then(|(id, rows, cols)| ems.create(id, rows, cols)) {
                    Ok(()) => {}
                    Err(e) => report("CREATE", e),
                }
            }
            Command::Reserve => {
                let parsed = guard.reader.parse_reserve();
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                match parsed.and_then(|(id, coords)| ems.reserve(id, &coords)) {
                    Ok(rid) => debug!(rid, "reserved"),
                    Err(e) => report("RESERVE", e),
                }
            }
            Command::Show => {
                let parsed = guard.reader.parse_show();
                let result = match parsed {
                    Ok(event_id) => {
                        let mut sink = ctx.lock_sink()?;
                        ems.show(event_id, &mut *sink)
                    }
                    Err(e) => Err(e),
                };
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                if let Err(e) = result {
                    report("SHOW", e);
                }
            }
            Command::List => {
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                let mut sink = ctx.lock_sink()?;
                if let Err(e) = ems.list(&mut *sink) {
                    report("LIST", e);
                }
            }
            Command::Wait => {
                let parsed = guard.reader.parse_wait();
                let mut direct_sleep = None;
                match parsed {
                    Ok((delay, Some(target))) if target != id && target < guard.wait_queue.len() => {
                        guard.wait_queue[target] += delay;
                    }
                    Ok((_, Some(target))) if target >= guard.wait_queue.len() => {
                        drop(guard);
                        report("WAIT", EmsError::InvalidCommand(format!("no such worker {target}")));
                        if local_wait > 0 {
                            crate::delay::apply(local_wait);
                        }
                        continue;
                    }
                    Ok((delay, _)) => direct_sleep = Some(delay),
                    Err(e) => {
                        drop(guard);
                        report("WAIT", e);
                        if local_wait > 0 {
                            crate::delay::apply(local_wait);
                        }
                        continue;
                    }
                }
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                if let Some(ms) = direct_sleep {
                    crate::delay::apply(ms);
                }
            }
            Command::Barrier => {
                guard.barrier_flag = true;
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                return Ok(WorkerExit::Barrier);
            }
            Command::Help => {
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                eprint!("{HELP_TEXT}");
            }
            Command::Invalid(token) => {
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                report("parse", EmsError::InvalidCommand(token));
            }
            Command::Empty => {
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
            }
            Command::Eoc => {
                drop(guard);
                if local_wait > 0 {
                    crate::delay::apply(local_wait);
                }
                return Ok(WorkerExit::EndOfCommands);
            }
        }
    }
}

/// Runs the spawn → join → restart-if-barrier loop for one job file.
#[derive(Debug)]
pub struct WorkerPool {
    max_threads: usize,
}

impl WorkerPool {
    #[must_use]
    pub fn new(max_threads: usize) -> Self { Self { max_threads } }

    pub fn run<R, W>(&self, ems: &Ems, reader: R, sink: W) -> Result<()>
    where
        R: BufRead + Send,
        W: Write + Send,
    {
        let ctx = JobContext::new(reader, sink, self.max_threads);
        loop {
            ctx.reset_for_round()?;
            let mut saw_barrier = false;
            std::thread::scope(|scope| -> Result<()> {
                let mut handles = Vec::with_capacity(self.max_threads);
                for id in 0..self.max_threads {
                    let ctx = &ctx;
                    handles.push(scope.spawn(move || worker_loop(id, ctx, ems)));
                }
                for handle in handles {
                    match handle.join() {
                        Ok(Ok(WorkerExit::Barrier)) => saw_barrier = true,
                        Ok(Ok(WorkerExit::EndOfCommands)) => {}
                        Ok(Err(e)) => warn!(error = %e, "worker exited on a lock failure"),
                        Err(_) => warn!("worker thread panicked"),
                    }
                }
                Ok(())
            })?;
            if saw_barrier {
                info!("barrier reached, respawning worker team");
                continue;
            }
            break;
        }
        Ok(())
    }
}
