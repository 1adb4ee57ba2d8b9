// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The concurrent collection of events (C2).
//!
//! Insertion order is preserved for `LIST`. A linear scan by id is fine at
//! this scale (spec calls out "dozens of events in realistic inputs");
//! the registry lock guards only the collection's shape, never an
//! individual event's seats — those are guarded by the event's own lock,
//! acquired only after the registry lock has been released.

use std::sync::{Arc, RwLock};

use crate::error::{EmsError, Result};
use crate::event::Event;

#[derive(Debug, Default)]
pub struct EventRegistry {
    events: RwLock<Vec<Arc<Event>>>,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, event: Event) -> Result<Arc<Event>> {
        let mut guard = self.events.write().map_err(|_| EmsError::LockAcquire("registry".into()))?;
        if guard.iter().any(|e| e.id() == event.id()) {
            return Err(EmsError::DuplicateId(event.id()));
        }
        let event = Arc::new(event);
        guard.push(Arc::clone(&event));
        Ok(event)
    }

    pub fn find(&self, id: u32) -> Result<Option<Arc<Event>>> {
        let guard = self.events.read().map_err(|_| EmsError::LockAcquire("registry".into()))?;
        Ok(guard.iter().find(|e| e.id() == id).map(Arc::clone))
    }

    /// Snapshot of the current registry contents in insertion order, for
    /// read-only iteration by `LIST`. Held under the reader lock for the
    /// duration of the clone so a concurrent insert can't corrupt it.
    pub fn snapshot(&self) -> Result<Vec<Arc<Event>>> {
        let guard = self.events.read().map_err(|_| EmsError::LockAcquire("registry".into()))?;
        Ok(guard.clone())
    }
}
