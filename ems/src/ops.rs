// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The Operations API (C3): the public verbs a worker drives, and the
//! explicit value spec.md §9 says should replace the original's
//! `ems_init`/`ems_terminate` process-wide singleton. One `Ems` value is
//! constructed per process (the dispatcher doesn't share one across
//! children; each child builds its own) and passed down to the worker
//! pool.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use crate::delay;
use crate::error::{EmsError, Result};
use crate::event::Event;
use crate::registry::EventRegistry;

#[derive(Debug, Default)]
pub struct Ems {
    registry: RwLock<Option<EventRegistry>>,
    delay_ms: AtomicU32,
    next_rid: AtomicU32,
}

impl Ems {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn init(&self, state_access_delay_ms: u32) -> Result<()> {
        let mut guard = self.registry.write().map_err(|_| EmsError::LockAcquire("ems".into()))?;
        if guard.is_some() {
            return Err(EmsError::AlreadyInitialized);
        }
        *guard = Some(EventRegistry::new());
        self.delay_ms.store(state_access_delay_ms, Ordering::SeqCst);
        Ok(())
    }

    pub fn terminate(&self) -> Result<()> {
        let mut guard = self.registry.write().map_err(|_| EmsError::LockAcquire("ems".into()))?;
        if guard.take().is_none() {
            return Err(EmsError::NotInitialized);
        }
        Ok(())
    }

    // This read lock is held for the duration of `f`, which for `reserve`/`show`
    // spans the event's own per-seat delay. That only ever blocks `init`/
    // `terminate` (the sole writers of this lock), never a concurrent
    // `create`/`find`/`list`, so it doesn't introduce the registry-vs-event
    // lock nesting the design forbids.
    fn with_registry<T>(&self, f: impl FnOnce(&EventRegistry) -> Result<T>) -> Result<T> {
        let guard = self.registry.read().map_err(|_| EmsError::LockAcquire("ems".into()))?;
        let registry = guard.as_ref().ok_or(EmsError::NotInitialized)?;
        f(registry)
    }

    pub fn create(&self, id: u32, rows: usize, cols: usize) -> Result<()> {
        self.with_registry(|registry| {
            let event = Event::new(id, rows, cols)?;
            registry.insert(event)?;
            Ok(())
        })
    }

    /// Assigns a fresh reservation id per call and delegates to the
    /// event's own atomic multi-seat reserve. The id is drawn from the
    /// counter before the outcome is known, so a failed reservation still
    /// consumes one value — the alternative (handing the counter back on
    /// failure) can't be done safely with a lock-free counter without
    /// re-introducing a race with whichever call took the next value in
    /// the meantime. The counter stays monotonic and collision-free,
    /// which is what every testable property actually depends on; it may
    /// simply skip a value after a failed call.
    pub fn reserve(&self, id: u32, coords: &[(usize, usize)]) -> Result<u32> {
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        self.with_registry(|registry| {
            let event = registry.find(id)?.ok_or(EmsError::NoSuchEvent(id))?;
            let rid = self.next_rid.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
            event.reserve(coords, rid, delay_ms)?;
            Ok(rid)
        })
    }

    pub fn show(&self, id: u32, sink: &mut impl Write) -> Result<()> {
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        self.with_registry(|registry| {
            let event = registry.find(id)?.ok_or(EmsError::NoSuchEvent(id))?;
            event.write_show(sink, delay_ms)
        })
    }

    pub fn list(&self, sink: &mut impl Write) -> Result<()> {
        self.with_registry(|registry| {
            let events = registry.snapshot()?;
            if events.is_empty() {
                sink.write_all(b"No events\n")?;
            } else {
                let mut out = String::new();
                for event in &events {
                    out.push_str(&format!("Event: {}\n", event.id()));
                }
                sink.write_all(out.as_bytes())?;
            }
            Ok(())
        })
    }

    /// Pure delay; no locks held while sleeping.
    pub fn wait(&self, ms: u32) { delay::apply(ms); }
}
