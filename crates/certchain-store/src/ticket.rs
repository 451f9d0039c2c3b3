//! Write tickets.
//!
//! A [`WriteTicket`] is shared between the caller waiting on a `put` and the
//! thread performing it. Exactly one side wins: the writer claims the ticket
//! immediately before the write becomes visible (the rename, or the index
//! insert), or the caller abandons it after its deadline. An abandoned
//! ticket is never claimed, so a caller that abandoned a write knows it
//! will not land.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const PENDING: u8 = 0;
const CLAIMED: u8 = 1;
const ABANDONED: u8 = 2;

/// Shared decision point for one `put`.
#[derive(Debug, Clone, Default)]
pub struct WriteTicket {
    state: Arc<AtomicU8>,
}

impl WriteTicket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer side. Returns `false` if the ticket was abandoned; the write
    /// must then not become visible.
    pub fn claim(&self) -> bool {
        match self
            .state
            .compare_exchange(PENDING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == CLAIMED,
        }
    }

    /// Caller side. Returns `false` if the writer already claimed the
    /// ticket; the write is then past the point of no return.
    pub fn abandon(&self) -> bool {
        match self
            .state
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == ABANDONED,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED
    }
}
