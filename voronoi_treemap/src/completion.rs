// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Completion tracking: processed counts, a single-winner finish flag and a
//! single-fire completion event.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::AbortReason;

/// How a computation ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Every node was processed.
    Completed,
    /// The computation stopped early.
    Aborted(AbortReason),
}

impl Outcome {
    /// True when every node was processed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The abort reason, if the computation stopped early.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Self::Completed => None,
            Self::Aborted(reason) => Some(reason),
        }
    }
}

/// A one-shot event carrying the [`Outcome`].
///
/// The first [`fire`](Self::fire) stores the outcome and wakes every waiter; later calls
/// are ignored. Waiters that wake spuriously re-check the slot and keep waiting.
#[derive(Debug, Default)]
pub(crate) struct CompletionEvent {
    slot: Mutex<Option<Outcome>>,
    cond: Condvar,
}

impl CompletionEvent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store `outcome` if nothing was stored yet. Returns whether this call stored it.
    pub(crate) fn fire(&self, outcome: Outcome) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        self.cond.notify_all();
        true
    }

    pub(crate) fn get(&self) -> Option<Outcome> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Block until the event fires.
    pub(crate) fn wait(&self) -> Outcome {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self.cond.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block until the event fires or `timeout` elapses.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let start = Instant::now();
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(outcome) = slot.as_ref() {
                return Some(outcome.clone());
            }
            let remaining = timeout.checked_sub(start.elapsed())?;
            let (guard, _) = self
                .cond
                .wait_timeout(slot, remaining)
                .unwrap_or_else(|e| e.into_inner());
            slot = guard;
        }
    }
}

/// Counts processed nodes against the tree size and elects the single finisher.
#[derive(Debug)]
pub(crate) struct CompletionTracker {
    total: usize,
    processed: AtomicUsize,
    finished: AtomicBool,
    event: CompletionEvent,
}

impl CompletionTracker {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            event: CompletionEvent::new(),
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    /// Record `count` more processed nodes and return the new total.
    pub(crate) fn mark_processed(&self, count: usize) -> usize {
        self.processed.fetch_add(count, Ordering::AcqRel) + count
    }

    pub(crate) fn all_processed(&self) -> bool {
        self.processed() >= self.total
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Claim the right to finish. Exactly one caller ever gets `true`.
    pub(crate) fn try_finish(&self) -> bool {
        self.finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn event(&self) -> &CompletionEvent {
        &self.event
    }
}
