//! Build tickets for discarding stale tree builds
//!
//! A session hands out one ticket per build. Issuing a new ticket makes
//! every older ticket stale, and cooperative builds stop at the next chunk
//! boundary once their ticket is stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic build counter owned by a session
#[derive(Debug, Clone, Default)]
pub struct BuildGeneration {
    current: Arc<AtomicU64>,
}

impl BuildGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new build, invalidating all outstanding tickets
    pub fn next_ticket(&self) -> BuildTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        BuildTicket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Ticket for the build generation in progress, without starting a new one
    pub fn current_ticket(&self) -> BuildTicket {
        BuildTicket {
            generation: self.current.load(Ordering::SeqCst),
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidate outstanding tickets without starting a build
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// Permission for one build to deliver its result
#[derive(Debug, Clone)]
pub struct BuildTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl BuildTicket {
    /// A ticket not tied to any session; it never goes stale
    pub fn detached() -> Self {
        Self {
            generation: 0,
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}
